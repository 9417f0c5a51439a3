//! Error types for euk.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Errors are classified from HTTP semantics into categories:
//! - **Validation**: malformed caller input caught before any network I/O
//! - **Authentication**: missing or expired session (401)
//! - **Authorization**: caller lacks privilege (403)
//! - **NotFound**: resource or endpoint absent (404)
//! - **RateLimit**: backend throttling (429), retried with backoff
//! - **Server**: 5xx responses, retried with backoff
//! - **Network**: connection refused, DNS, offline, timeouts
//! - **Response**: 2xx responses whose body is not valid JSON
//! - **Configuration**: config file or environment problems
//! - **Internal**: I/O, serialization and unclassified failures
//!
//! Display strings are the Serbian user-facing messages shown by the console.
//! Each error has a stable code (e.g., `EUK-A001`) for programmatic handling.
//!
//! `EukError` is `Clone`: every caller joined to a deduplicated in-flight
//! request observes the same error value.

pub mod suggestions;

use std::sync::Arc;
use thiserror::Error;

pub use suggestions::FixSuggestion;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller input rejected before any request was sent.
    Validation,
    /// Session missing or expired.
    Authentication,
    /// Caller lacks the privilege for the resource.
    Authorization,
    /// Resource or endpoint absent.
    NotFound,
    /// Backend rate limiting.
    RateLimit,
    /// Backend failure (5xx or unexpected status).
    Server,
    /// Transport failure (connection, DNS, timeout).
    Network,
    /// Corrupt response body.
    Response,
    /// Configuration issues.
    Configuration,
    /// Internal errors.
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Validation error",
            Self::Authentication => "Authentication error",
            Self::Authorization => "Authorization error",
            Self::NotFound => "Not found",
            Self::RateLimit => "Rate limited",
            Self::Server => "Server error",
            Self::Network => "Network error",
            Self::Response => "Response error",
            Self::Configuration => "Configuration error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Validation => "V",
            Self::Authentication => "A",
            Self::Authorization => "Z",
            Self::NotFound => "F",
            Self::RateLimit => "R",
            Self::Server => "S",
            Self::Network => "N",
            Self::Response => "P",
            Self::Configuration => "C",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Recovery
// =============================================================================

/// The action a user interface should offer next to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Session is gone; offer "log in again" rather than a plain retry.
    Relogin,
    /// Transient failure; offer a retry affordance.
    Retry,
    /// Nothing the user can do from here.
    None,
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes for the `euk` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Not logged in, session expired or access denied
    AuthError = 2,
    /// Invalid input or configuration
    InputError = 3,
    /// Backend unreachable or timed out
    Unavailable = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for euk operations.
#[derive(Error, Debug, Clone)]
pub enum EukError {
    // ==========================================================================
    // Validation (Category: Validation)
    // ==========================================================================
    /// Caller input rejected before any network I/O.
    #[error("Neispravan unos ({field}): {message}")]
    Validation { field: String, message: String },

    // ==========================================================================
    // Authentication / authorization
    // ==========================================================================
    /// No bearer token available for an authenticated call.
    #[error("Niste prijavljeni. Prijavite se pre nastavka rada.")]
    TokenMissing,

    /// 401 from the backend.
    #[error("Vaša sesija je istekla. Molimo ulogujte se ponovo.")]
    SessionExpired { url: String },

    /// 403 from the backend.
    #[error("Nemate dozvolu za pristup ovom resursu.")]
    Forbidden { url: String },

    /// 404 from the backend.
    #[error("Traženi resurs nije pronađen.")]
    NotFound { url: String },

    // ==========================================================================
    // Transient backend failures
    // ==========================================================================
    /// 429 after the retry budget was exhausted.
    #[error("Previše zahteva. Molimo sačekajte malo pre ponovnog pokušaja.")]
    RateLimited { url: String, attempts: u32 },

    /// 5xx after the retry budget was exhausted.
    #[error("Endpoint nije implementiran ili je greška na serveru (HTTP {status}): {url}")]
    ServerError { url: String, status: u16, attempts: u32 },

    /// Any other non-2xx status.
    #[error("{message}")]
    Http {
        url: String,
        status: u16,
        message: String,
    },

    // ==========================================================================
    // Transport (Category: Network)
    // ==========================================================================
    /// Connection refused, DNS failure, offline.
    #[error("Greška mreže. Proverite internet konekciju. ({url}: {message})")]
    Network { url: String, message: String },

    /// Transport-level timeout.
    #[error("Zahtev je istekao nakon {seconds}s: {url}")]
    Timeout { url: String, seconds: u64 },

    // ==========================================================================
    // Response corruption (Category: Response)
    // ==========================================================================
    /// 2xx status but the body is not valid JSON.
    #[error("Neispravan JSON odgovor od servera ({url}): {message}")]
    InvalidJson { url: String, message: String },

    // ==========================================================================
    // Configuration errors (Category: Configuration)
    // ==========================================================================
    /// Generic configuration error.
    #[error("Greška u konfiguraciji: {0}")]
    Config(String),

    /// Error parsing configuration file.
    #[error("Greška pri čitanju konfiguracije {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("Neispravna vrednost za '{key}' ({value}): {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    // ==========================================================================
    // Internal errors (Category: Internal)
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O greška: {0}")]
    Io(#[source] Arc<std::io::Error>),

    /// JSON serialization/deserialization failed.
    #[error("JSON greška: {0}")]
    Json(#[source] Arc<serde_json::Error>),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(Arc<anyhow::Error>),
}

impl From<std::io::Error> for EukError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for EukError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}

impl From<anyhow::Error> for EukError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(Arc::new(err))
    }
}

impl EukError {
    /// Shorthand for a validation error on `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Map error to a process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::TokenMissing | Self::SessionExpired { .. } | Self::Forbidden { .. } => {
                ExitCode::AuthError
            }

            Self::Validation { .. }
            | Self::Config(_)
            | Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. } => ExitCode::InputError,

            Self::Network { .. } | Self::Timeout { .. } | Self::RateLimited { .. } => {
                ExitCode::Unavailable
            }

            Self::NotFound { .. }
            | Self::ServerError { .. }
            | Self::Http { .. }
            | Self::InvalidJson { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::TokenMissing | Self::SessionExpired { .. } => ErrorCategory::Authentication,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::ServerError { .. } | Self::Http { .. } => ErrorCategory::Server,
            Self::Network { .. } | Self::Timeout { .. } => ErrorCategory::Network,
            Self::InvalidJson { .. } => ErrorCategory::Response,
            Self::Config(_) | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                ErrorCategory::Configuration
            }
            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `EUK-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "EUK-V001",

            Self::TokenMissing => "EUK-A001",
            Self::SessionExpired { .. } => "EUK-A002",

            Self::Forbidden { .. } => "EUK-Z001",
            Self::NotFound { .. } => "EUK-F001",
            Self::RateLimited { .. } => "EUK-R001",

            Self::ServerError { .. } => "EUK-S001",
            Self::Http { .. } => "EUK-S099",

            Self::Network { .. } => "EUK-N001",
            Self::Timeout { .. } => "EUK-N002",

            Self::InvalidJson { .. } => "EUK-P001",

            Self::Config(_) => "EUK-C001",
            Self::ConfigParse { .. } => "EUK-C002",
            Self::ConfigInvalid { .. } => "EUK-C003",

            Self::Io(_) => "EUK-X001",
            Self::Json(_) => "EUK-X002",
            Self::Other(_) => "EUK-X099",
        }
    }

    /// Whether the access layer retries this failure with backoff.
    ///
    /// Only rate limiting and server errors qualify. Connection failures and
    /// 401/403/404 surface immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::ServerError { .. })
    }

    /// Whether the error originated from the backend or the transport to it,
    /// as opposed to local input or configuration.
    ///
    /// Fail-open call sites substitute fallback data only for these.
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired { .. }
                | Self::Forbidden { .. }
                | Self::NotFound { .. }
                | Self::RateLimited { .. }
                | Self::ServerError { .. }
                | Self::Http { .. }
                | Self::Network { .. }
                | Self::Timeout { .. }
                | Self::InvalidJson { .. }
        )
    }

    /// HTTP status that produced this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::ServerError { status, .. } | Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// URL of the failing request, if the error came from one.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::SessionExpired { url }
            | Self::Forbidden { url }
            | Self::NotFound { url }
            | Self::RateLimited { url, .. }
            | Self::ServerError { url, .. }
            | Self::Http { url, .. }
            | Self::Network { url, .. }
            | Self::Timeout { url, .. }
            | Self::InvalidJson { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Which affordance the console shows next to this error.
    #[must_use]
    pub const fn recovery(&self) -> Recovery {
        match self {
            Self::TokenMissing | Self::SessionExpired { .. } => Recovery::Relogin,
            Self::RateLimited { .. }
            | Self::ServerError { .. }
            | Self::Network { .. }
            | Self::Timeout { .. } => Recovery::Retry,
            _ => Recovery::None,
        }
    }

    /// Returns actionable fix suggestions for this error.
    #[must_use]
    pub fn fix_suggestions(&self) -> Vec<FixSuggestion> {
        match self {
            Self::TokenMissing | Self::SessionExpired { .. } => suggestions::relogin_suggestions(),
            Self::Forbidden { url } => suggestions::forbidden_suggestions(url),
            Self::NotFound { url } => suggestions::not_found_suggestions(url),
            Self::RateLimited { attempts, .. } => suggestions::rate_limited_suggestions(*attempts),
            Self::ServerError { url, status, .. } => {
                suggestions::server_error_suggestions(url, *status)
            }
            Self::Network { url, .. } | Self::Timeout { url, .. } => {
                suggestions::network_suggestions(url)
            }
            Self::InvalidJson { url, .. } => suggestions::invalid_json_suggestions(url),
            Self::Config(_) | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                suggestions::config_suggestions()
            }
            Self::Validation { .. }
            | Self::Http { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => Vec::new(),
        }
    }
}

/// Result type alias for euk operations.
pub type Result<T> = std::result::Result<T, EukError>;
