//! Data transfer objects for the EUK backend.
//!
//! All structs use camelCase on the wire. Records whose schema the backend
//! extends over time keep unknown fields in a flattened `extra` map so they
//! survive a read-modify-write round trip.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// EUK records
// =============================================================================

/// A case category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kategorija {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kategorija_id: Option<i64>,
    pub naziv: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Kategorija {
    #[must_use]
    pub fn new(naziv: impl Into<String>) -> Self {
        Self {
            kategorija_id: None,
            naziv: naziv.into(),
            extra: Map::new(),
        }
    }
}

/// A case.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Predmet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predmet_id: Option<i64>,
    pub naziv_predmeta: String,
    pub status: String,
    pub odgovorna_osoba: String,
    pub prioritet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rok_za_zavrsetak: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kategorija_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kategorija_naziv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broj_ugrozenih_lica: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datum_kreiranja: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Beneficiary, schema variant T1.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UgrozenoLiceT1 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ugrozeno_lice_id: Option<i64>,
    pub redni_broj: String,
    pub ime: String,
    pub prezime: String,
    pub jmbg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptt_broj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grad_opstina: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ulica_i_broj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osnov_statusa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ed_broj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broj_racuna: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Beneficiary, schema variant T2.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UgrozenoLiceT2 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ugrozeno_lice_id: Option<i64>,
    pub redni_broj: String,
    pub ime: String,
    pub prezime: String,
    pub jmbg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptt_broj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grad_opstina: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ulica_i_broj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ed_broj: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pok_vazenja_resenja_o_statusu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Beneficiary schema variant, also the document template identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    T1,
    T2,
}

impl TemplateKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::T1 => "T1",
            Self::T2 => "T2",
        }
    }

    /// Backend collection for this schema variant.
    #[must_use]
    pub const fn collection_path(self) -> &'static str {
        match self {
            Self::T1 => "/api/euk/ugrozena-lica-t1",
            Self::T2 => "/api/euk/ugrozena-lica-t2",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "T1" => Ok(Self::T1),
            "T2" => Ok(Self::T2),
            other => Err(format!("nepoznat šablon '{other}' (očekivano T1 ili T2)")),
        }
    }
}

// =============================================================================
// Users and routes
// =============================================================================

/// A console user as seen by the admin screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nivo_pristupa: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Filters for the admin user list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

/// An entry of the route catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: i64,
    pub ruta: String,
    pub naziv: String,
    #[serde(default)]
    pub opis: String,
    #[serde(default)]
    pub sekcija: String,
    #[serde(default = "default_true")]
    pub aktivna: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum_kreiranja: Option<String>,
}

const fn default_true() -> bool {
    true
}

/// A route granted to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: i64,
    pub route_id: i64,
    /// Route path, e.g. `euk/predmeti`.
    #[serde(default)]
    pub route: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nivo_dozvola: Option<u8>,
}

// =============================================================================
// Global license
// =============================================================================

/// Answer of `GET /api/global-license/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLicenseInfo {
    #[serde(default)]
    pub has_valid_license: bool,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub days_until_expiry: i64,
    #[serde(default)]
    pub is_expiring_soon: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub notification_sent: bool,
}

/// Answer of `GET /api/global-license/check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLicenseCheck {
    pub has_valid_license: bool,
    #[serde(default)]
    pub message: String,
}

/// A stored global license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLicense {
    pub id: i64,
    pub license_key: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub notification_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Envelope of `GET /api/global-license/active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalLicenseResponse {
    pub success: bool,
    pub license: GlobalLicense,
}

/// Body of `POST /api/global-license/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGlobalLicense {
    pub license_key: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}
