//! HTTP client utilities.
//!
//! Builds the shared reqwest client and classifies transport failures and
//! non-2xx statuses into [`EukError`]s.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, StatusCode};

use crate::error::{EukError, Result};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend used when running against a local development server.
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:8080";

/// Backend used in production when no explicit URL is configured.
pub const PRODUCTION_BASE_URL: &str = "https://euk.onrender.com";

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("euk/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| EukError::Config(format!("HTTP klijent: {e}")))
}

/// Join a base URL and a backend-relative path without doubling slashes.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Classify a transport failure (no HTTP response was received).
#[must_use]
pub fn classify_transport_error(err: &reqwest::Error, url: &str, timeout: Duration) -> EukError {
    if err.is_timeout() {
        EukError::Timeout {
            url: url.to_string(),
            seconds: timeout.as_secs(),
        }
    } else {
        EukError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Classify a non-2xx response.
///
/// `attempts` is the number of network attempts made for this logical
/// request, reported on the transient variants. `body` is the raw response
/// text; its `message` or `error` field becomes the message of generic errors.
#[must_use]
pub fn classify_status(status: StatusCode, url: &str, body: &str, attempts: u32) -> EukError {
    let url = url.to_string();
    match status.as_u16() {
        401 => EukError::SessionExpired { url },
        403 => EukError::Forbidden { url },
        404 => EukError::NotFound { url },
        429 => EukError::RateLimited { url, attempts },
        code if status.is_server_error() => EukError::ServerError {
            url,
            status: code,
            attempts,
        },
        code => EukError::Http {
            url,
            status: code,
            message: backend_message(body).unwrap_or_else(|| {
                format!(
                    "HTTP {code}: {}",
                    status.canonical_reason().unwrap_or("Unknown")
                )
            }),
        },
    }
}

/// Extract the backend-provided `message` (or `error`) field from an error body.
fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|field| value.get(field).and_then(|v| v.as_str()))
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_handles_slashes() {
        assert_eq!(
            join_url("http://localhost:8080/", "/api/euk/kategorije"),
            "http://localhost:8080/api/euk/kategorije"
        );
        assert_eq!(
            join_url("http://localhost:8080", "api/routes"),
            "http://localhost:8080/api/routes"
        );
    }

    #[test]
    fn test_classify_known_statuses() {
        let url = "http://x/api";
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, url, "", 1),
            EukError::SessionExpired { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, url, "", 1),
            EukError::Forbidden { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, url, "", 1),
            EukError::NotFound { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, url, "", 3),
            EukError::RateLimited { attempts: 3, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, url, "", 2),
            EukError::ServerError { status: 502, .. }
        ));
    }

    #[test]
    fn test_generic_error_prefers_backend_message() {
        let err = classify_status(
            StatusCode::CONFLICT,
            "http://x/api/global-license/create",
            r#"{"message":"Globalna licenca već postoji."}"#,
            1,
        );
        assert_eq!(err.to_string(), "Globalna licenca već postoji.");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_generic_error_falls_back_to_error_field_then_template() {
        let err = classify_status(StatusCode::BAD_REQUEST, "u", r#"{"error":"los zahtev"}"#, 1);
        assert_eq!(err.to_string(), "los zahtev");

        let err = classify_status(StatusCode::BAD_REQUEST, "u", "<html>oops</html>", 1);
        assert_eq!(err.to_string(), "HTTP 400: Bad Request");
    }
}
