//! Beneficiaries in both schema variants.
//!
//! - T1: `/api/euk/ugrozena-lica-t1`, with an advanced filter search.
//! - T2: `/api/euk/ugrozena-lica-t2`, with a record count.

use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Backend, with_query};
use crate::core::models::{TemplateKind, UgrozenoLiceT1, UgrozenoLiceT2};
use crate::core::{Page, RequestOptions};
use crate::error::{EukError, Result};

const LIST_TTL: Duration = Duration::from_secs(30);

/// Page size the T1 filter search uses when the caller does not choose one.
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 50;

/// A beneficiary record of one schema variant.
pub trait LiceRecord: Serialize + DeserializeOwned + Send + Sync {
    const KIND: TemplateKind;

    fn redni_broj(&self) -> &str;
    fn ime(&self) -> &str;
    fn prezime(&self) -> &str;
    fn jmbg(&self) -> &str;
}

macro_rules! impl_lice_record {
    ($ty:ty, $kind:expr) => {
        impl LiceRecord for $ty {
            const KIND: TemplateKind = $kind;

            fn redni_broj(&self) -> &str {
                &self.redni_broj
            }
            fn ime(&self) -> &str {
                &self.ime
            }
            fn prezime(&self) -> &str {
                &self.prezime
            }
            fn jmbg(&self) -> &str {
                &self.jmbg
            }
        }
    };
}

impl_lice_record!(UgrozenoLiceT1, TemplateKind::T1);
impl_lice_record!(UgrozenoLiceT2, TemplateKind::T2);

/// Check the fields the backend requires before sending a record.
///
/// # Errors
///
/// Returns [`EukError::Validation`] naming the first offending field.
pub fn validate_record<R: LiceRecord>(record: &R) -> Result<()> {
    let required = [
        ("redniBroj", record.redni_broj(), "redni broj je obavezan"),
        ("ime", record.ime(), "ime je obavezno"),
        ("prezime", record.prezime(), "prezime je obavezno"),
        ("jmbg", record.jmbg(), "JMBG je obavezan"),
    ];
    for (field, value, message) in required {
        if value.trim().is_empty() {
            return Err(EukError::validation(field, message));
        }
    }
    let jmbg = record.jmbg();
    if jmbg.chars().count() != 13 {
        return Err(EukError::validation("jmbg", "JMBG mora imati tačno 13 cifara"));
    }
    if !jmbg.chars().all(|c| c.is_ascii_digit()) {
        return Err(EukError::validation("jmbg", "JMBG mora sadržavati samo cifre"));
    }
    Ok(())
}

/// Filters of the T1 advanced search. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct T1SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ed_broj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prezime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grad_opstina: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osnov_statusa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broj_racuna: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jmbg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redni_broj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptt_broj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datum_od: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datum_do: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iznos_od: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iznos_do: Option<f64>,
}

pub struct UgrozenaLica<'a, R> {
    backend: &'a Backend,
    _record: PhantomData<R>,
}

impl<'a, R: LiceRecord> UgrozenaLica<'a, R> {
    pub(crate) const fn new(backend: &'a Backend) -> Self {
        Self {
            backend,
            _record: PhantomData,
        }
    }

    fn path() -> &'static str {
        R::KIND.collection_path()
    }

    /// One page of records. `page` is 0-based.
    ///
    /// # Errors
    ///
    /// Rejects a zero page size; propagates backend failures.
    pub async fn list(&self, page: u32, size: u32) -> Result<Page<R>> {
        if size == 0 {
            return Err(EukError::validation("size", "veličina strane mora biti veća od 0"));
        }
        let path = with_query(
            Self::path(),
            &[
                ("page", Some(page.to_string())),
                ("size", Some(size.to_string())),
            ],
        );
        self.backend
            .call_page(&path, RequestOptions::get().cached(LIST_TTL), Some(size))
            .await
    }

    /// # Errors
    ///
    /// [`EukError::NotFound`] for an unknown id.
    pub async fn get(&self, id: i64) -> Result<R> {
        self.backend
            .call_as(&format!("{}/{id}", Self::path()), RequestOptions::get())
            .await
    }

    /// # Errors
    ///
    /// Validation errors before any request; backend failures otherwise.
    pub async fn create(&self, record: &R) -> Result<R> {
        validate_record(record)?;
        let body = serde_json::to_value(record)?;
        let created = self
            .backend
            .call_as(Self::path(), RequestOptions::post(body))
            .await?;
        self.invalidate();
        Ok(created)
    }

    /// # Errors
    ///
    /// Validation errors before any request; backend failures otherwise.
    pub async fn update(&self, id: i64, record: &R) -> Result<R> {
        validate_record(record)?;
        let body = serde_json::to_value(record)?;
        let updated = self
            .backend
            .call_as(&format!("{}/{id}", Self::path()), RequestOptions::put(body))
            .await?;
        self.invalidate();
        Ok(updated)
    }

    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.backend
            .call(&format!("{}/{id}", Self::path()), RequestOptions::delete())
            .await?;
        self.invalidate();
        Ok(())
    }

    fn invalidate(&self) {
        let needle = Self::path().trim_start_matches("/api/euk/");
        let removed = self.backend.client().invalidate(needle);
        tracing::info!(kind = %R::KIND, removed, "beneficiary caches cleared after write");
    }
}

impl UgrozenaLica<'_, UgrozenoLiceT1> {
    /// Advanced T1 search (`POST .../search/filters`).
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn search(
        &self,
        filters: &T1SearchFilters,
        page: u32,
        size: u32,
    ) -> Result<Page<UgrozenoLiceT1>> {
        let size = if size == 0 { DEFAULT_SEARCH_PAGE_SIZE } else { size };
        let path = with_query(
            &format!("{}/search/filters", Self::path()),
            &[
                ("page", Some(page.to_string())),
                ("size", Some(size.to_string())),
            ],
        );
        let body = serde_json::to_value(filters)?;
        // Read-only despite POST; keep the read retry budget.
        self.backend
            .call_page(&path, RequestOptions::post(body).retries(1), Some(size))
            .await
    }
}

impl UgrozenaLica<'_, UgrozenoLiceT2> {
    /// Number of T2 records.
    ///
    /// # Errors
    ///
    /// Propagates backend failures; a non-numeric answer is invalid JSON.
    pub async fn count(&self) -> Result<u64> {
        let path = format!("{}/count", Self::path());
        let value = self
            .backend
            .call(&path, RequestOptions::get().cached(LIST_TTL))
            .await?;
        let count = value
            .as_u64()
            .or_else(|| value.get("count").and_then(serde_json::Value::as_u64));
        count.ok_or_else(|| EukError::InvalidJson {
            url: self.backend.client().url_for(&path),
            message: format!("očekivan broj, dobijeno: {value}"),
        })
    }
}
