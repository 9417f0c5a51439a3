//! Test utilities for euk.
//!
//! Provides shared helpers, test data factories, and assertion macros
//! for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use euk::test_utils::*;
//!
//! let server = wiremock::MockServer::start().await;
//! let backend = make_test_backend(&server.uri());
//! let kategorije = backend.kategorije().list().await?;
//!
//! let dir = TestDir::new();
//! dir.create_file("config.toml", &make_test_config_toml("http://localhost:8080"));
//! ```

use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use serde_json::{Map, Value, json};

use crate::core::models::{
    GlobalLicenseInfo, Kategorija, Predmet, Route, UgrozenoLiceT1, UgrozenoLiceT2, User,
    UserRoute,
};
use crate::core::{ApiClient, ClientConfig, EndpointPolicies};
use crate::services::Backend;

/// Bearer token used by every test backend.
pub const TEST_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.test-session";

// =============================================================================
// Client Factories
// =============================================================================

/// Client settings for tests: no throttle, millisecond backoff.
#[must_use]
pub fn make_test_client_config(base_url: &str) -> ClientConfig {
    ClientConfig::new(base_url)
        .with_timeout(Duration::from_secs(5))
        .with_min_interval(Duration::ZERO)
        .with_backoff_base(Duration::from_millis(1))
}

/// A fresh, isolated [`ApiClient`] pointed at `base_url`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn make_test_client(base_url: &str) -> ApiClient {
    ApiClient::new(make_test_client_config(base_url)).expect("Failed to build test client")
}

/// A [`Backend`] with [`TEST_TOKEN`] and the default (fail-open) policies.
#[must_use]
pub fn make_test_backend(base_url: &str) -> Backend {
    Backend::new(make_test_client(base_url), Some(TEST_TOKEN.to_string()))
}

/// A [`Backend`] where every endpoint fails closed.
#[must_use]
pub fn make_strict_test_backend(base_url: &str) -> Backend {
    make_test_backend(base_url).with_policies(EndpointPolicies::strict())
}

/// A [`Backend`] without a session.
#[must_use]
pub fn make_anonymous_test_backend(base_url: &str) -> Backend {
    Backend::new(make_test_client(base_url), None)
}

// =============================================================================
// Test Data Factories
// =============================================================================

/// A stored category.
#[must_use]
pub fn make_test_kategorija(id: i64, naziv: &str) -> Kategorija {
    Kategorija {
        kategorija_id: Some(id),
        ..Kategorija::new(naziv)
    }
}

/// A stored case in category 1.
#[must_use]
pub fn make_test_predmet(id: i64) -> Predmet {
    Predmet {
        predmet_id: Some(id),
        naziv_predmeta: format!("Predmet {id}"),
        status: "АКТИВАН".to_string(),
        odgovorna_osoba: "Jovana Petrović".to_string(),
        prioritet: "СРЕДЊИ".to_string(),
        rok_za_zavrsetak: Some("2026-12-31".to_string()),
        kategorija_id: Some(1),
        kategorija_naziv: Some("Energetski ugroženi".to_string()),
        broj_ugrozenih_lica: Some(2),
        datum_kreiranja: Some("2026-01-15T09:30:00".to_string()),
        extra: Map::new(),
    }
}

/// A valid T1 beneficiary.
#[must_use]
pub fn make_test_lice_t1(id: i64) -> UgrozenoLiceT1 {
    UgrozenoLiceT1 {
        ugrozeno_lice_id: Some(id),
        redni_broj: id.to_string(),
        ime: "Marko".to_string(),
        prezime: "Marković".to_string(),
        jmbg: "0101990710123".to_string(),
        ptt_broj: Some("11000".to_string()),
        grad_opstina: Some("Beograd".to_string()),
        mesto: Some("Vračar".to_string()),
        ulica_i_broj: Some("Njegoševa 12".to_string()),
        osnov_statusa: Some("MP".to_string()),
        ed_broj: Some("ED-100".to_string()),
        broj_racuna: None,
        extra: Map::new(),
    }
}

/// A valid T2 beneficiary.
#[must_use]
pub fn make_test_lice_t2(id: i64) -> UgrozenoLiceT2 {
    UgrozenoLiceT2 {
        ugrozeno_lice_id: Some(id),
        redni_broj: id.to_string(),
        ime: "Ana".to_string(),
        prezime: "Anić".to_string(),
        jmbg: "1505985715000".to_string(),
        ptt_broj: Some("21000".to_string()),
        grad_opstina: Some("Novi Sad".to_string()),
        mesto: Some("Liman".to_string()),
        ulica_i_broj: Some("Bulevar 7".to_string()),
        ed_broj: Some("ED-200".to_string()),
        pok_vazenja_resenja_o_statusu: Some("2027-01-01".to_string()),
        created_at: None,
        updated_at: None,
        extra: Map::new(),
    }
}

/// An active user with role `OBRADJIVAC`.
#[must_use]
pub fn make_test_user(id: i64, username: &str) -> User {
    User {
        id,
        username: username.to_string(),
        first_name: "Petar".to_string(),
        last_name: "Petrović".to_string(),
        email: format!("{username}@euk.rs"),
        role: "OBRADJIVAC".to_string(),
        is_active: true,
        nivo_pristupa: Some(2),
        created_at: None,
        updated_at: None,
    }
}

/// An active catalog route.
#[must_use]
pub fn make_test_route(id: i64, ruta: &str) -> Route {
    Route {
        id,
        ruta: ruta.to_string(),
        naziv: ruta.rsplit('/').next().unwrap_or(ruta).to_string(),
        opis: String::new(),
        sekcija: "EUK".to_string(),
        aktivna: true,
        datum_kreiranja: None,
    }
}

/// A grant of `route_id` to `user_id`.
#[must_use]
pub fn make_test_user_route(user_id: i64, route_id: i64, ruta: &str) -> UserRoute {
    UserRoute {
        id: None,
        user_id,
        route_id,
        route: ruta.to_string(),
        nivo_dozvola: Some(1),
    }
}

/// A valid license expiring in `days`.
#[must_use]
pub fn make_test_license_info(days: i64) -> GlobalLicenseInfo {
    GlobalLicenseInfo {
        has_valid_license: true,
        end_date: (Utc::now() + TimeDelta::days(days)).to_rfc3339(),
        days_until_expiry: days,
        is_expiring_soon: days <= 30,
        message: "Лиценца је важећа".to_string(),
        notification_sent: false,
    }
}

/// A Spring-style page body wrapping `items`.
#[must_use]
pub fn make_test_page_json(items: Vec<Value>, total: u64, page: u32, size: u32) -> Value {
    let pages = if size == 0 {
        0
    } else {
        total.div_ceil(u64::from(size))
    };
    json!({
        "content": items,
        "totalElements": total,
        "totalPages": pages,
        "number": page,
        "size": size,
    })
}

/// A config file pointing the console at `base_url`.
#[must_use]
pub fn make_test_config_toml(base_url: &str) -> String {
    format!(
        r#"[api]
base_url = "{base_url}"
environment = "development"
timeout_seconds = 5
min_interval_ms = 0
backoff_base_ms = 1

[endpoints]
license_status = "fallback"
routes = "fallback"
users = "throw"
user_routes = "fallback"

[output]
color = false
pretty = false
"#
    )
}

// =============================================================================
// Temp Directory Utilities
// =============================================================================

/// A temporary directory for tests with automatic cleanup.
///
/// ```rust,ignore
/// use euk::test_utils::TestDir;
///
/// let dir = TestDir::new();
/// dir.create_file("lica.json", "[]");
/// assert!(dir.file_exists("lica.json"));
/// ```
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with the given content, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
        path
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_exists(&self, name: &str) -> bool {
        self.inner.path().join(name).exists()
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string does NOT contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

/// Assert that a string is valid JSON.
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {
        let json = $json;
        if let Err(e) = serde_json::from_str::<serde_json::Value>(json) {
            panic!("Expected valid JSON, but parsing failed: {}\n\nJSON string:\n{}", e, json);
        }
    };
}

/// Assert that a string has no ANSI escape codes.
#[macro_export]
macro_rules! assert_no_ansi_codes {
    ($text:expr) => {
        let text = $text;
        assert!(
            !$crate::test_utils::has_ansi_codes(text),
            "Expected no ANSI codes in:\n{:?}",
            text
        );
    };
}

// =============================================================================
// Test Helpers
// =============================================================================

#[must_use]
pub fn has_ansi_codes(text: &str) -> bool {
    text.contains('\x1b')
}

/// Strip ANSI escape codes from a string.
#[must_use]
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}
