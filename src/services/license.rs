//! Global software license (`/api/global-license`).
//!
//! The status check is fail-open: when the backend cannot answer, the
//! console assumes a license valid for another 365 days rather than locking
//! users out. The substitute is cached so a degraded backend is not hammered:
//! five minutes after 403/404 (the endpoint is deliberately closed or absent),
//! one minute after anything else.

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Value, json};

use super::Backend;
use crate::core::RequestOptions;
use crate::core::models::{GlobalLicenseCheck, GlobalLicenseInfo, GlobalLicenseResponse, NewGlobalLicense};
use crate::error::{EukError, Result};

const STATUS_PATH: &str = "/api/global-license/status";
const CHECK_PATH: &str = "/api/global-license/check";
const ACTIVE_PATH: &str = "/api/global-license/active";
const CREATE_PATH: &str = "/api/global-license/create";
const EXTEND_PATH: &str = "/api/global-license/extend";
const DEACTIVATE_PATH: &str = "/api/global-license/admin/deactivate-expired";

const LICENSE_SCOPE: &str = "global-license";

const STATUS_TTL: Duration = Duration::from_secs(300);
const CHECK_TTL: Duration = Duration::from_secs(300);
const ACTIVE_TTL: Duration = Duration::from_secs(600);
const FALLBACK_TTL_CLOSED: Duration = Duration::from_secs(300);
const FALLBACK_TTL_TRANSIENT: Duration = Duration::from_secs(60);

/// Retry budget for license reads.
const LICENSE_RETRIES: u32 = 3;

/// Days of validity assumed when the status cannot be checked.
pub const FALLBACK_VALIDITY_DAYS: i64 = 365;

/// A license expiring within this many days is "expiring soon".
pub const EXPIRING_SOON_DAYS: i64 = 30;

const INVALID_LICENSE_MESSAGE: &str = "Лиценца није важећа";
const FALLBACK_MESSAGE: &str = "Лиценца је важећа";

pub struct License<'a> {
    backend: &'a Backend,
}

impl<'a> License<'a> {
    pub(crate) const fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Current license status, failing open.
    ///
    /// Works without a session; the token is sent when available.
    ///
    /// # Errors
    ///
    /// Only local errors (e.g. an empty token) and, under the throw policy,
    /// backend failures.
    pub async fn check_global_license_status(&self) -> Result<GlobalLicenseInfo> {
        let client = self.backend.client();
        let token = self.backend.token();
        let options = RequestOptions::get()
            .cached(STATUS_TTL)
            .retries(LICENSE_RETRIES);

        let result = client
            .request(STATUS_PATH, options, token)
            .await
            .and_then(|value| self.backend.decode::<GlobalLicenseInfo>(STATUS_PATH, value));

        match result {
            Ok(info) => Ok(normalize(info)),
            Err(err) if err.is_backend_failure() && self.backend.policies().license_status.is_fallback() => {
                let ttl = match err.status() {
                    Some(403 | 404) => FALLBACK_TTL_CLOSED,
                    _ => FALLBACK_TTL_TRANSIENT,
                };
                tracing::warn!(
                    code = err.error_code(),
                    error = %err,
                    ttl_secs = ttl.as_secs(),
                    "license status unavailable, assuming valid license"
                );
                let info = fallback_license(Utc::now());
                client.cache_put(STATUS_PATH, token, serde_json::to_value(&info)?, ttl);
                Ok(info)
            }
            Err(err) => Err(err),
        }
    }

    /// Strict validity check.
    ///
    /// # Errors
    ///
    /// Propagates every failure.
    pub async fn check_global_license(&self) -> Result<GlobalLicenseCheck> {
        let value = self
            .backend
            .client()
            .request(
                CHECK_PATH,
                RequestOptions::get().cached(CHECK_TTL).retries(LICENSE_RETRIES),
                self.backend.token(),
            )
            .await?;
        let mut check: GlobalLicenseCheck = self.backend.decode(CHECK_PATH, value)?;
        if check.message.is_empty() {
            check.message = INVALID_LICENSE_MESSAGE.to_string();
        }
        Ok(check)
    }

    /// The active license record.
    ///
    /// # Errors
    ///
    /// Propagates every failure.
    pub async fn get_active_global_license(&self) -> Result<GlobalLicenseResponse> {
        let value = self
            .backend
            .client()
            .request(
                ACTIVE_PATH,
                RequestOptions::get().cached(ACTIVE_TTL).retries(LICENSE_RETRIES),
                self.backend.token(),
            )
            .await?;
        self.backend.decode(ACTIVE_PATH, value)
    }

    /// Create the global license (admin).
    ///
    /// # Errors
    ///
    /// Validation errors before any request; a second license is reported as
    /// "already exists".
    pub async fn create(&self, license: &NewGlobalLicense) -> Result<Value> {
        if license.license_key.trim().is_empty() {
            return Err(EukError::validation("licenseKey", "ključ licence je obavezan"));
        }
        if license.end_date <= license.start_date {
            return Err(EukError::validation(
                "endDate",
                "datum isteka mora biti posle datuma početka",
            ));
        }
        let body = serde_json::to_value(license)?;
        let result = self
            .backend
            .call(CREATE_PATH, RequestOptions::post(body))
            .await
            .map_err(|err| match err {
                EukError::Http { url, status: 409, .. } => EukError::Http {
                    url,
                    status: 409,
                    message: "Globalna licenca već postoji.".to_string(),
                },
                other => other,
            })?;
        self.invalidate();
        Ok(result)
    }

    /// Move the end date of the active license (admin).
    ///
    /// # Errors
    ///
    /// Rejects a date in the past; propagates backend failures.
    pub async fn extend(&self, new_end_date: DateTime<Utc>) -> Result<Value> {
        if new_end_date <= Utc::now() {
            return Err(EukError::validation(
                "newEndDate",
                "novi datum isteka mora biti u budućnosti",
            ));
        }
        let result = self
            .backend
            .call(
                EXTEND_PATH,
                RequestOptions::post(json!({ "newEndDate": new_end_date })),
            )
            .await?;
        self.invalidate();
        Ok(result)
    }

    /// Deactivate every expired license (admin).
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn deactivate_expired(&self) -> Result<Value> {
        let result = self
            .backend
            .call(DEACTIVATE_PATH, RequestOptions::post_empty())
            .await?;
        self.invalidate();
        Ok(result)
    }

    fn invalidate(&self) {
        let removed = self.backend.client().invalidate(LICENSE_SCOPE);
        tracing::info!(removed, "license caches cleared after write");
    }
}

/// The optimistic status assumed when the backend cannot be asked.
#[must_use]
pub fn fallback_license(now: DateTime<Utc>) -> GlobalLicenseInfo {
    GlobalLicenseInfo {
        has_valid_license: true,
        end_date: (now + chrono::Duration::days(FALLBACK_VALIDITY_DAYS)).to_rfc3339(),
        days_until_expiry: FALLBACK_VALIDITY_DAYS,
        is_expiring_soon: false,
        message: FALLBACK_MESSAGE.to_string(),
        notification_sent: false,
    }
}

fn normalize(mut info: GlobalLicenseInfo) -> GlobalLicenseInfo {
    if info.message.trim().is_empty() {
        info.message = INVALID_LICENSE_MESSAGE.to_string();
    }
    info
}

#[must_use]
pub const fn is_expired(info: &GlobalLicenseInfo) -> bool {
    !info.has_valid_license
}

#[must_use]
pub const fn is_expiring_soon(info: &GlobalLicenseInfo) -> bool {
    info.is_expiring_soon || info.days_until_expiry <= EXPIRING_SOON_DAYS
}

const MONTHS: [&str; 12] = [
    "januar", "februar", "mart", "april", "maj", "jun", "jul", "avgust", "septembar", "oktobar",
    "novembar", "decembar",
];

/// Render a backend date as `15. januar 2027.`.
#[must_use]
pub fn format_end_date(end_date: &str) -> String {
    parse_date(end_date).map_or_else(
        || "Nepoznat datum".to_string(),
        |date| {
            format!(
                "{}. {} {}.",
                date.day(),
                MONTHS[date.month0() as usize],
                date.year()
            )
        },
    )
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|d| d.date())
                .ok()
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

/// One-line summary of the license state for the console.
#[must_use]
pub fn status_message(info: &GlobalLicenseInfo) -> String {
    if is_expired(info) {
        return "Globalna licenca je istekla. Kontaktirajte administratora za produženje licence."
            .to_string();
    }
    let end = format_end_date(&info.end_date);
    if is_expiring_soon(info) {
        return format!(
            "Globalna licenca će isteći za {} dana ({end}).",
            info.days_until_expiry
        );
    }
    if info.notification_sent {
        return format!(
            "Imate obaveštenje o globalnoj licenci. Globalna licenca je važeća do {end}."
        );
    }
    format!("Globalna licenca je važeća do {end}.")
}
