//! User administration (`/api/admin/users`).
//!
//! The list fails open to a small built-in directory when the users policy is
//! [`OnUnavailable::Fallback`](crate::core::OnUnavailable::Fallback). Writes
//! never do: they use the write retry budget, surface every error and bust
//! every cached key containing `"users"` on success.

use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use super::{Backend, with_query};
use crate::core::models::{User, UserFilter};
use crate::core::{Page, RequestOptions};
use crate::error::{EukError, Result};

const PATH: &str = "/api/admin/users";
const LIST_TTL: Duration = Duration::from_secs(30);

/// Substring that identifies every user-related cache entry.
pub const USERS_CACHE_SCOPE: &str = "users";

/// Roles the backend accepts.
pub const ROLES: [&str; 5] = ["ADMIN", "OBRADJIVAC", "POTPISNIK", "KORISNIK", "USER"];

/// Valid access levels (`nivoPristupa`).
pub const ACCESS_LEVELS: std::ops::RangeInclusive<u8> = 1..=5;

pub struct Users<'a> {
    backend: &'a Backend,
}

impl<'a> Users<'a> {
    pub(crate) const fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// One page of users. `page` is 0-based on the wire.
    ///
    /// # Errors
    ///
    /// Rejects a zero page size. Backend failures yield the built-in
    /// directory under the fallback policy and propagate otherwise.
    pub async fn list(&self, page: u32, size: u32, filter: &UserFilter) -> Result<Page<User>> {
        if size == 0 {
            return Err(EukError::validation("size", "veličina strane mora biti veća od 0"));
        }
        let path = with_query(
            PATH,
            &[
                ("page", Some(page.to_string())),
                ("size", Some(size.to_string())),
                ("role", filter.role.clone()),
                ("isActive", filter.is_active.map(|b| b.to_string())),
                ("search", filter.search.clone()),
            ],
        );

        match self
            .backend
            .call_page(&path, RequestOptions::get().cached(LIST_TTL), Some(size))
            .await
        {
            Ok(page) => Ok(page),
            Err(err) if err.is_backend_failure() && self.backend.policies().users.is_fallback() => {
                tracing::warn!(code = err.error_code(), error = %err, "user list unavailable, using built-in directory");
                Ok(fallback_page(filter))
            }
            Err(err) => Err(err),
        }
    }

    /// # Errors
    ///
    /// Propagates every failure, including the failing URL for 5xx.
    pub async fn approve(&self, id: i64) -> Result<()> {
        self.write(&format!("{PATH}/{id}/approve"), RequestOptions::post_empty())
            .await
    }

    /// # Errors
    ///
    /// Propagates every failure.
    pub async fn reject(&self, id: i64) -> Result<()> {
        self.write(&format!("{PATH}/{id}/reject"), RequestOptions::post_empty())
            .await
    }

    /// # Errors
    ///
    /// Propagates every failure.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.write(&format!("{PATH}/{id}"), RequestOptions::delete())
            .await
    }

    /// # Errors
    ///
    /// Rejects unknown roles before any request; propagates backend failures.
    pub async fn set_role(&self, id: i64, role: &str) -> Result<()> {
        let role = normalize_role(role)?;
        self.write(
            &format!("{PATH}/{id}/role"),
            RequestOptions::put(json!({ "role": role })),
        )
        .await
    }

    /// # Errors
    ///
    /// Rejects levels outside 1..=5 before any request; propagates backend failures.
    pub async fn set_level(&self, id: i64, level: u8) -> Result<()> {
        if !ACCESS_LEVELS.contains(&level) {
            return Err(EukError::validation(
                "nivoPristupa",
                format!("nivo pristupa mora biti između 1 i 5 (dobijeno {level})"),
            ));
        }
        self.write(
            &format!("{PATH}/{id}/level"),
            RequestOptions::put(json!({ "nivoPristupa": level })),
        )
        .await
    }

    async fn write(&self, path: &str, options: RequestOptions) -> Result<()> {
        self.backend.call(path, options).await?;
        let removed = self.backend.client().invalidate(USERS_CACHE_SCOPE);
        tracing::info!(path, removed, "user caches cleared after write");
        Ok(())
    }
}

/// Uppercase and check a role name.
///
/// # Errors
///
/// Returns [`EukError::Validation`] for a role outside [`ROLES`].
pub fn normalize_role(role: &str) -> Result<String> {
    let upper = role.trim().to_uppercase();
    if ROLES.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(EukError::validation(
            "role",
            format!("nepoznata uloga '{role}' (dozvoljeno: {})", ROLES.join(", ")),
        ))
    }
}

/// The built-in user directory shown while the backend is unavailable.
#[must_use]
pub fn fallback_users() -> Vec<User> {
    let now = Utc::now().to_rfc3339();
    let user = |id: i64, username: &str, first: &str, last: &str, email: &str, role: &str, level: u8| User {
        id,
        username: username.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        is_active: true,
        nivo_pristupa: Some(level),
        created_at: Some(now.clone()),
        updated_at: Some(now.clone()),
    };
    vec![
        user(1, "admin", "Admin", "User", "admin@euk.rs", "ADMIN", 5),
        user(2, "marko.petrovic", "Marko", "Petrović", "marko@euk.rs", "OBRADJIVAC", 3),
        user(3, "ana.nikolic", "Ana", "Nikolić", "ana@euk.rs", "POTPISNIK", 2),
    ]
}

fn fallback_page(filter: &UserFilter) -> Page<User> {
    let search = filter.search.as_deref().map(str::to_lowercase);
    let items: Vec<User> = fallback_users()
        .into_iter()
        .filter(|u| filter.role.as_deref().is_none_or(|r| u.role.eq_ignore_ascii_case(r)))
        .filter(|u| filter.is_active.is_none_or(|a| u.is_active == a))
        .filter(|u| {
            search.as_deref().is_none_or(|s| {
                u.username.to_lowercase().contains(s) || u.full_name().to_lowercase().contains(s)
            })
        })
        .collect();
    let total = items.len() as u64;
    Page {
        items,
        total,
        total_pages: u64::from(total > 0),
    }
}
