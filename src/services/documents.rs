//! Envelope and register PDF generation.
//!
//! Each document kind is a POST taking `{templateType, ugrozenaLica}` and
//! answering with a PDF whose name arrives in `Content-Disposition`. The
//! bytes are written to disk atomically.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

use super::Backend;
use super::ugrozena_lica::LiceRecord;
use crate::core::Download;
use crate::core::models::TemplateKind;
use crate::core::request::DEFAULT_WRITE_RETRIES;
use crate::error::{EukError, Result};
use crate::util::fs::write_atomic;

/// `filename*=` (RFC 5987) or `filename=`, quoted or bare.
static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename(\*)?\s*=\s*(?:"([^"]*)"|'([^']*)'|([^;\n]*))"#)
        .unwrap()
});

/// Which document to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Envelope front side with the recipient address.
    EnvelopeFront,
    /// Envelope back side with the sender.
    EnvelopeBack,
    /// Delivery register listing every recipient.
    Register,
}

impl DocumentKind {
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::EnvelopeFront => "/api/envelope/generate-pdf",
            Self::EnvelopeBack => "/api/envelope/generate-back-pdf",
            Self::Register => "/api/spisak/generate-pdf",
        }
    }

    /// File name used when the server does not supply one.
    #[must_use]
    pub fn default_filename(self, template: TemplateKind) -> String {
        let stem = match self {
            Self::EnvelopeFront => "koverte",
            Self::EnvelopeBack => "koverte_poledjina",
            Self::Register => "spisak",
        };
        format!("{stem}_{template}.pdf")
    }
}

/// A document written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedDocument {
    pub path: PathBuf,
    pub bytes: usize,
}

pub struct Documents<'a> {
    backend: &'a Backend,
}

impl<'a> Documents<'a> {
    pub(crate) const fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Ask the backend to render `kind` for `records`.
    ///
    /// # Errors
    ///
    /// Rejects an empty record list before any request; propagates backend
    /// failures.
    pub async fn generate<R: LiceRecord>(&self, kind: DocumentKind, records: &[R]) -> Result<Download> {
        let records = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()?;
        self.generate_raw(kind, R::KIND, records).await
    }

    /// [`generate`](Self::generate) for records already in wire form.
    ///
    /// # Errors
    ///
    /// As [`generate`](Self::generate).
    pub async fn generate_raw(
        &self,
        kind: DocumentKind,
        template: TemplateKind,
        records: Vec<Value>,
    ) -> Result<Download> {
        if records.is_empty() {
            return Err(EukError::validation(
                "ugrozenaLica",
                "izaberite bar jedno ugroženo lice za štampu",
            ));
        }
        let token = self.backend.require_token()?;
        let count = records.len();
        let body = json!({ "templateType": template, "ugrozenaLica": records });

        tracing::info!(endpoint = kind.endpoint(), %template, count, "generating document");
        self.backend
            .client()
            .download(kind.endpoint(), body, Some(token), DEFAULT_WRITE_RETRIES)
            .await
    }

    /// Generate and save into `out_dir`, named after the server's file name.
    ///
    /// # Errors
    ///
    /// As [`generate_raw`](Self::generate_raw), plus I/O errors.
    pub async fn generate_to_dir(
        &self,
        kind: DocumentKind,
        template: TemplateKind,
        records: Vec<Value>,
        out_dir: &Path,
    ) -> Result<SavedDocument> {
        let download = self.generate_raw(kind, template, records).await?;
        save(&download, out_dir, &kind.default_filename(template))
    }
}

/// Extract the file name from a `Content-Disposition` header.
///
/// Prefers `filename*` over `filename`, percent-decodes the value and strips
/// any directory components.
#[must_use]
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for caps in FILENAME_RE.captures_iter(header) {
        let raw = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str())
            .trim();
        if caps.get(1).is_some() {
            // charset'lang'value
            let value = raw.splitn(3, '\'').nth(2).unwrap_or(raw);
            extended.get_or_insert_with(|| value.to_string());
        } else {
            plain.get_or_insert_with(|| raw.to_string());
        }
    }

    let raw = extended.or(plain)?;
    let decoded = urlencoding::decode(&raw).map_or_else(|_| raw.clone(), |d| d.into_owned());
    sanitize_filename(&decoded)
}

fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() || base == "." || base == ".." {
        None
    } else {
        Some(base.to_string())
    }
}

/// Write a download into `out_dir`.
///
/// # Errors
///
/// Returns I/O errors from creating the directory or writing the file.
pub fn save(download: &Download, out_dir: &Path, default_name: &str) -> Result<SavedDocument> {
    let name = download
        .content_disposition
        .as_deref()
        .and_then(content_disposition_filename)
        .unwrap_or_else(|| default_name.to_string());
    let path = out_dir.join(name);
    write_atomic(&path, &download.bytes)?;
    tracing::info!(path = %path.display(), bytes = download.bytes.len(), "document saved");
    Ok(SavedDocument {
        path,
        bytes: download.bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_quoted_and_bare_filenames() {
        assert_eq!(
            content_disposition_filename(r#"attachment; filename="koverte_T1.pdf""#).as_deref(),
            Some("koverte_T1.pdf")
        );
        assert_eq!(
            content_disposition_filename("attachment; filename=spisak.pdf; size=10").as_deref(),
            Some("spisak.pdf")
        );
        assert_eq!(
            content_disposition_filename("attachment; filename='a b.pdf'").as_deref(),
            Some("a b.pdf")
        );
    }

    #[test]
    fn test_percent_encoded_and_extended_filenames() {
        assert_eq!(
            content_disposition_filename("attachment; filename=\"ugro%C5%BEena%20lica.pdf\"")
                .as_deref(),
            Some("ugrožena lica.pdf")
        );
        assert_eq!(
            content_disposition_filename(
                "attachment; filename=\"fallback.pdf\"; filename*=UTF-8''%C5%A0tampa.pdf"
            )
            .as_deref(),
            Some("Štampa.pdf")
        );
    }

    #[test]
    fn test_filename_is_stripped_of_directories() {
        assert_eq!(
            content_disposition_filename("attachment; filename=\"../../etc/passwd\"").as_deref(),
            Some("passwd")
        );
        assert_eq!(content_disposition_filename("attachment; filename=\"\""), None);
        assert_eq!(content_disposition_filename("inline"), None);
    }

    #[test]
    fn test_save_uses_server_name_or_default() {
        let dir = TempDir::new().unwrap();
        let named = Download {
            content_disposition: Some("attachment; filename=\"spisak_T2.pdf\"".to_string()),
            content_type: Some("application/pdf".to_string()),
            bytes: b"%PDF-1.4".to_vec(),
        };
        let saved = save(&named, dir.path(), "x.pdf").unwrap();
        assert_eq!(saved.path, dir.path().join("spisak_T2.pdf"));
        assert_eq!(saved.bytes, 8);

        let anonymous = Download {
            content_disposition: None,
            ..named
        };
        let default = DocumentKind::EnvelopeBack.default_filename(TemplateKind::T1);
        let saved = save(&anonymous, dir.path(), &default).unwrap();
        assert_eq!(saved.path, dir.path().join("koverte_poledjina_T1.pdf"));
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"%PDF-1.4");
    }
}
