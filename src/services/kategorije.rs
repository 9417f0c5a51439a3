//! Case categories (`/api/euk/kategorije`).

use std::time::Duration;

use serde_json::json;

use super::Backend;
use crate::core::RequestOptions;
use crate::core::models::Kategorija;
use crate::error::{EukError, Result};

const PATH: &str = "/api/euk/kategorije";

/// Categories change rarely; cache the full list briefly.
const LIST_TTL: Duration = Duration::from_secs(60);

pub struct Kategorije<'a> {
    backend: &'a Backend,
}

impl<'a> Kategorije<'a> {
    pub(crate) const fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Propagates any backend failure.
    pub async fn list(&self) -> Result<Vec<Kategorija>> {
        let page = self
            .backend
            .call_page(PATH, RequestOptions::get().cached(LIST_TTL), None)
            .await?;
        Ok(page.items)
    }

    /// # Errors
    ///
    /// Rejects an empty name before any request; propagates backend failures.
    pub async fn create(&self, naziv: &str) -> Result<Kategorija> {
        let naziv = validate_naziv(naziv)?;
        let created = self
            .backend
            .call_as(PATH, RequestOptions::post(json!({ "naziv": naziv })))
            .await?;
        self.invalidate();
        Ok(created)
    }

    /// # Errors
    ///
    /// Rejects an empty name before any request; propagates backend failures.
    pub async fn update(&self, id: i64, naziv: &str) -> Result<Kategorija> {
        let naziv = validate_naziv(naziv)?;
        let updated = self
            .backend
            .call_as(
                &format!("{PATH}/{id}"),
                RequestOptions::put(json!({ "naziv": naziv })),
            )
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
        let removed = self.backend.client().invalidate("kategorije");
        tracing::info!(removed, "category caches cleared after write");
    }
}

fn validate_naziv(naziv: &str) -> Result<&str> {
    let trimmed = naziv.trim();
    if trimmed.is_empty() {
        return Err(EukError::validation("naziv", "naziv kategorije je obavezan"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_naziv() {
        assert_eq!(validate_naziv("  Hitno ").unwrap(), "Hitno");
        assert!(matches!(
            validate_naziv("   "),
            Err(EukError::Validation { .. })
        ));
    }
}
