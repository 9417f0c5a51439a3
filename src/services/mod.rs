//! Typed endpoint services on top of [`ApiClient`].
//!
//! A [`Backend`] bundles the shared client, the caller's bearer token and the
//! per-endpoint fail-open policies. Each service is a thin borrowed view on
//! it:
//!
//! ```no_run
//! # async fn demo(backend: euk::services::Backend) -> euk::Result<()> {
//! let kategorije = backend.kategorije().list().await?;
//! let page = backend.users().list(0, 20, &Default::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod documents;
pub mod kategorije;
pub mod license;
pub mod predmeti;
pub mod routes;
pub mod ugrozena_lica;
pub mod users;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::{ApiClient, EndpointPolicies, Page, RequestOptions};
use crate::error::{EukError, Result};

pub use documents::{DocumentKind, Documents, SavedDocument};
pub use kategorije::Kategorije;
pub use license::License;
pub use predmeti::Predmeti;
pub use routes::{RouteAssignments, Routes};
pub use ugrozena_lica::{LiceRecord, T1SearchFilters, UgrozenaLica};
pub use users::Users;

/// Authenticated access to the backend.
#[derive(Debug, Clone)]
pub struct Backend {
    client: ApiClient,
    token: Option<String>,
    policies: EndpointPolicies,
}

impl Backend {
    #[must_use]
    pub fn new(client: ApiClient, token: Option<String>) -> Self {
        Self {
            client,
            token,
            policies: EndpointPolicies::default(),
        }
    }

    #[must_use]
    pub const fn with_policies(mut self, policies: EndpointPolicies) -> Self {
        self.policies = policies;
        self
    }

    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub const fn policies(&self) -> &EndpointPolicies {
        &self.policies
    }

    /// The bearer token, required by every admin and EUK endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`EukError::TokenMissing`] when no session is available.
    pub fn require_token(&self) -> Result<&str> {
        self.token().ok_or(EukError::TokenMissing)
    }

    #[must_use]
    pub const fn kategorije(&self) -> Kategorije<'_> {
        Kategorije::new(self)
    }

    #[must_use]
    pub const fn predmeti(&self) -> Predmeti<'_> {
        Predmeti::new(self)
    }

    /// Beneficiaries of the schema variant `R`.
    #[must_use]
    pub const fn lica<R: LiceRecord>(&self) -> UgrozenaLica<'_, R> {
        UgrozenaLica::new(self)
    }

    #[must_use]
    pub const fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    #[must_use]
    pub const fn routes(&self) -> Routes<'_> {
        Routes::new(self)
    }

    #[must_use]
    pub const fn license(&self) -> License<'_> {
        License::new(self)
    }

    #[must_use]
    pub const fn documents(&self) -> Documents<'_> {
        Documents::new(self)
    }

    /// Authenticated request returning raw JSON.
    pub(crate) async fn call(&self, path: &str, options: RequestOptions) -> Result<Value> {
        let token = self.require_token()?;
        self.client.request(path, options, Some(token)).await
    }

    /// Authenticated request deserialized into `T`.
    pub(crate) async fn call_as<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let value = self.call(path, options).await?;
        self.decode(path, value)
    }

    /// Authenticated list request normalized into a [`Page`].
    pub(crate) async fn call_page<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
        page_size: Option<u32>,
    ) -> Result<Page<T>> {
        let value = self.call(path, options).await?;
        Page::from_value(value, page_size).map_err(|e| self.invalid_json(path, &e))
    }

    pub(crate) fn decode<T: DeserializeOwned>(&self, path: &str, value: Value) -> Result<T> {
        serde_json::from_value(value).map_err(|e| self.invalid_json(path, &e))
    }

    fn invalid_json(&self, path: &str, err: &serde_json::Error) -> EukError {
        EukError::InvalidJson {
            url: self.client.url_for(path),
            message: err.to_string(),
        }
    }
}

/// Append percent-encoded query parameters to `path`, skipping `None` values.
#[must_use]
pub fn with_query(path: &str, params: &[(&str, Option<String>)]) -> String {
    let query: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| format!("{key}={}", urlencoding::encode(v)))
        })
        .collect();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", query.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClientConfig;

    #[test]
    fn test_with_query_encodes_and_skips_none() {
        let path = with_query(
            "/api/admin/users",
            &[
                ("page", Some("0".to_string())),
                ("size", Some("20".to_string())),
                ("role", None),
                ("search", Some("Petrović M".to_string())),
            ],
        );
        assert_eq!(
            path,
            "/api/admin/users?page=0&size=20&search=Petrovi%C4%87%20M"
        );
        assert_eq!(with_query("/api/routes", &[("x", None)]), "/api/routes");
    }

    #[tokio::test]
    async fn test_call_without_token_is_token_missing() {
        let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:9")).unwrap();
        let backend = Backend::new(client, None);
        let err = backend
            .call("/api/euk/kategorije", RequestOptions::get())
            .await
            .unwrap_err();
        assert!(matches!(err, EukError::TokenMissing));
    }
}
