//! Cases (`/api/euk/predmeti`).

use std::time::Duration;

use super::{Backend, with_query};
use crate::core::models::Predmet;
use crate::core::{Page, RequestOptions};
use crate::error::{EukError, Result};

const PATH: &str = "/api/euk/predmeti";
const LIST_TTL: Duration = Duration::from_secs(30);

/// Paging and filters for the case list. `page` is 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredmetQuery {
    pub page: u32,
    pub size: u32,
    pub status: Option<String>,
    pub prioritet: Option<String>,
    pub kategorija_id: Option<i64>,
    pub search: Option<String>,
}

impl Default for PredmetQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            status: None,
            prioritet: None,
            kategorija_id: None,
            search: None,
        }
    }
}

impl PredmetQuery {
    fn to_path(&self) -> String {
        with_query(
            PATH,
            &[
                ("page", Some(self.page.to_string())),
                ("size", Some(self.size.to_string())),
                ("status", self.status.clone()),
                ("prioritet", self.prioritet.clone()),
                ("kategorijaId", self.kategorija_id.map(|id| id.to_string())),
                ("search", self.search.clone()),
            ],
        )
    }
}

pub struct Predmeti<'a> {
    backend: &'a Backend,
}

impl<'a> Predmeti<'a> {
    pub(crate) const fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// # Errors
    ///
    /// Rejects a zero page size; propagates backend failures.
    pub async fn list(&self, query: &PredmetQuery) -> Result<Page<Predmet>> {
        if query.size == 0 {
            return Err(EukError::validation("size", "veličina strane mora biti veća od 0"));
        }
        self.backend
            .call_page(
                &query.to_path(),
                RequestOptions::get().cached(LIST_TTL),
                Some(query.size),
            )
            .await
    }

    /// # Errors
    ///
    /// [`EukError::NotFound`] for an unknown id.
    pub async fn get(&self, id: i64) -> Result<Predmet> {
        self.backend
            .call_as(&format!("{PATH}/{id}"), RequestOptions::get())
            .await
    }

    /// # Errors
    ///
    /// Rejects a case without a title; propagates backend failures.
    pub async fn create(&self, predmet: &Predmet) -> Result<Predmet> {
        validate(predmet)?;
        let body = serde_json::to_value(predmet)?;
        let created = self
            .backend
            .call_as(PATH, RequestOptions::post(body))
            .await?;
        self.invalidate();
        Ok(created)
    }

    /// # Errors
    ///
    /// Rejects a case without a title; propagates backend failures.
    pub async fn update(&self, id: i64, predmet: &Predmet) -> Result<Predmet> {
        validate(predmet)?;
        let body = serde_json::to_value(predmet)?;
        let updated = self
            .backend
            .call_as(&format!("{PATH}/{id}"), RequestOptions::put(body))
            .await?;
        self.invalidate();
        Ok(updated)
    }

    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.backend
            .call(&format!("{PATH}/{id}"), RequestOptions::delete())
            .await?;
        self.invalidate();
        Ok(())
    }

    fn invalidate(&self) {
        let removed = self.backend.client().invalidate("predmeti");
        tracing::info!(removed, "case caches cleared after write");
    }
}

fn validate(predmet: &Predmet) -> Result<()> {
    if predmet.naziv_predmeta.trim().is_empty() {
        return Err(EukError::validation("nazivPredmeta", "naziv predmeta je obavezan"));
    }
    Ok(())
}
