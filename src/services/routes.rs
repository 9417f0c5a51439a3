//! Route catalog and per-user route grants.
//!
//! The catalog (`/api/routes`) fails open to [`fallback_routes`]. Grants live
//! under `/api/admin/user-routes`. After every grant mutation the caller gets
//! a [`RouteAssignments`] view rebuilt from freshly fetched catalog and grant
//! lists, never a locally patched copy.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;

use super::Backend;
use crate::core::RequestOptions;
use crate::core::models::{Route, UserRoute};
use crate::error::{EukError, Result};

const CATALOG_PATH: &str = "/api/routes";
const USER_ROUTES_PATH: &str = "/api/admin/user-routes";

const CATALOG_TTL: Duration = Duration::from_secs(300);
const USER_ROUTES_TTL: Duration = Duration::from_secs(30);

/// Cache scope of the grant lists. Does not match the catalog key.
const USER_ROUTES_SCOPE: &str = "user-routes";

/// Grant level used when assigning without an explicit one.
pub const DEFAULT_GRANT_LEVEL: u8 = 1;

/// The route catalog shown while `/api/routes` is unavailable or empty.
#[must_use]
pub fn fallback_routes() -> Vec<Route> {
    const CREATED: &str = "2024-01-15T10:30:00";
    [
        (1, "euk/kategorije", "Kategorije", "Upravljanje kategorijama predmeta", "EUK"),
        (2, "euk/predmeti", "Predmeti", "Upravljanje predmetima", "EUK"),
        (3, "euk/ugrozena-lica", "Ugrožena lica", "Upravljanje ugroženim licima", "EUK"),
        (4, "euk/stampanje", "Štampanje", "Štampanje dokumenata", "EUK"),
        (5, "reports", "Izveštaji", "Generisanje izveštaja", "REPORTS"),
        (6, "analytics", "Analitika", "Analitika sistema", "ANALYTICS"),
        (7, "settings", "Podešavanja", "Korisnička podešavanja", "SETTINGS"),
        (8, "profile", "Profil", "Korisnički profil", "PROFILE"),
    ]
    .into_iter()
    .map(|(id, ruta, naziv, opis, sekcija)| Route {
        id,
        ruta: ruta.to_string(),
        naziv: naziv.to_string(),
        opis: opis.to_string(),
        sekcija: sekcija.to_string(),
        aktivna: true,
        datum_kreiranja: Some(CREATED.to_string()),
    })
    .collect()
}

/// A catalog route granted to a user, with the grant level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedRoute {
    pub route: Route,
    pub nivo_dozvola: Option<u8>,
}

/// Assigned vs. available routes for one user.
///
/// Derived, read-only: rebuild it from the two source lists instead of
/// editing it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAssignments {
    pub user_id: i64,
    pub assigned: Vec<AssignedRoute>,
    /// Active catalog routes the user does not have.
    pub available: Vec<Route>,
}

impl RouteAssignments {
    /// Join the catalog with a user's grants.
    ///
    /// Grants for routes missing from the catalog still appear as assigned,
    /// described by their path alone.
    #[must_use]
    pub fn derive(user_id: i64, catalog: &[Route], grants: &[UserRoute]) -> Self {
        let by_id: HashMap<i64, &Route> = catalog.iter().map(|r| (r.id, r)).collect();

        let assigned: Vec<AssignedRoute> = grants
            .iter()
            .filter(|g| g.user_id == user_id)
            .map(|g| AssignedRoute {
                route: by_id.get(&g.route_id).map_or_else(
                    || Route {
                        id: g.route_id,
                        ruta: g.route.clone(),
                        naziv: g.route.clone(),
                        opis: String::new(),
                        sekcija: String::new(),
                        aktivna: true,
                        datum_kreiranja: None,
                    },
                    |r| (*r).clone(),
                ),
                nivo_dozvola: g.nivo_dozvola,
            })
            .collect();

        let available = catalog
            .iter()
            .filter(|r| r.aktivna && !assigned.iter().any(|a| a.route.id == r.id))
            .cloned()
            .collect();

        Self {
            user_id,
            assigned,
            available,
        }
    }

    #[must_use]
    pub fn has_route(&self, route_id: i64) -> bool {
        self.assigned.iter().any(|a| a.route.id == route_id)
    }
}

pub struct Routes<'a> {
    backend: &'a Backend,
}

impl<'a> Routes<'a> {
    pub(crate) const fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// The route catalog.
    ///
    /// # Errors
    ///
    /// Under the fallback policy backend failures and an empty catalog both
    /// yield [`fallback_routes`]; otherwise failures propagate.
    pub async fn get_routes(&self) -> Result<Vec<Route>> {
        let fallback = self.backend.policies().routes.is_fallback();
        let result: Result<Vec<Route>> = self
            .backend
            .call_page(CATALOG_PATH, RequestOptions::get().cached(CATALOG_TTL), None)
            .await
            .map(|page| page.items);

        match result {
            Ok(routes) if routes.is_empty() && fallback => {
                tracing::warn!("route catalog is empty, using built-in routes");
                Ok(fallback_routes())
            }
            Ok(routes) => Ok(routes),
            Err(err) if err.is_backend_failure() && fallback => {
                tracing::warn!(code = err.error_code(), error = %err, "route catalog unavailable, using built-in routes");
                Ok(fallback_routes())
            }
            Err(err) => Err(err),
        }
    }

    /// Routes granted to `user_id`.
    ///
    /// # Errors
    ///
    /// Under the fallback policy backend failures yield an empty list.
    pub async fn user_routes(&self, user_id: i64) -> Result<Vec<UserRoute>> {
        let path = format!("{USER_ROUTES_PATH}/{user_id}");
        let result = self
            .backend
            .call_page(&path, RequestOptions::get().cached(USER_ROUTES_TTL), None)
            .await
            .map(|page| page.items);

        match result {
            Err(err) if err.is_backend_failure() && self.backend.policies().user_routes.is_fallback() => {
                tracing::warn!(user_id, code = err.error_code(), error = %err, "user routes unavailable, assuming none");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Fresh [`RouteAssignments`] for `user_id`.
    ///
    /// # Errors
    ///
    /// Propagates failures that the endpoint policies do not absorb.
    pub async fn assignments(&self, user_id: i64) -> Result<RouteAssignments> {
        let catalog = self.get_routes().await?;
        let grants = self.user_routes(user_id).await?;
        Ok(RouteAssignments::derive(user_id, &catalog, &grants))
    }

    /// Grant `route_id` to `user_id`.
    ///
    /// # Errors
    ///
    /// Rejects levels outside 1..=5; write failures propagate.
    pub async fn assign(&self, user_id: i64, route_id: i64, level: u8) -> Result<RouteAssignments> {
        validate_level(level)?;
        let body = json!({ "userId": user_id, "routeId": route_id, "nivoDozvola": level });
        self.backend
            .call(USER_ROUTES_PATH, RequestOptions::post(body))
            .await?;
        self.after_write(user_id).await
    }

    /// Change the grant level of an existing grant.
    ///
    /// # Errors
    ///
    /// Rejects levels outside 1..=5; write failures propagate.
    pub async fn update_level(
        &self,
        user_id: i64,
        route_id: i64,
        level: u8,
    ) -> Result<RouteAssignments> {
        validate_level(level)?;
        self.backend
            .call(
                &format!("{USER_ROUTES_PATH}/{user_id}/{route_id}"),
                RequestOptions::put(json!({ "nivoDozvola": level })),
            )
            .await?;
        self.after_write(user_id).await
    }

    /// Remove a grant.
    ///
    /// # Errors
    ///
    /// Write failures propagate.
    pub async fn revoke(&self, user_id: i64, route_id: i64) -> Result<RouteAssignments> {
        self.backend
            .call(
                &format!("{USER_ROUTES_PATH}/{user_id}/{route_id}"),
                RequestOptions::delete(),
            )
            .await?;
        self.after_write(user_id).await
    }

    /// Whether `user_id` may open `route_id`.
    ///
    /// # Errors
    ///
    /// Propagates failures; a non-boolean answer is invalid JSON.
    pub async fn check_access(&self, user_id: i64, route_id: i64) -> Result<bool> {
        let path = format!("/api/user-routes/{user_id}/check/{route_id}");
        let value = self.backend.call(&path, RequestOptions::get()).await?;
        value
            .as_bool()
            .or_else(|| value.get("hasAccess").and_then(serde_json::Value::as_bool))
            .ok_or_else(|| EukError::InvalidJson {
                url: self.backend.client().url_for(&path),
                message: format!("očekivana logička vrednost, dobijeno: {value}"),
            })
    }

    async fn after_write(&self, user_id: i64) -> Result<RouteAssignments> {
        let removed = self.backend.client().invalidate(USER_ROUTES_SCOPE);
        tracing::info!(user_id, removed, "user route caches cleared after write");
        self.assignments(user_id).await
    }
}

fn validate_level(level: u8) -> Result<()> {
    if (1..=5).contains(&level) {
        Ok(())
    } else {
        Err(EukError::validation(
            "nivoDozvola",
            format!("nivo dozvole mora biti između 1 i 5 (dobijeno {level})"),
        ))
    }
}
