//! Fail-open / fail-closed policy per endpoint.
//!
//! A few read-heavy, non-critical endpoints keep the console usable when the
//! backend is degraded by substituting built-in fallback data. Every other
//! call, and every write, surfaces its error.

use serde::{Deserialize, Serialize};

/// What a service does when its endpoint fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnUnavailable {
    /// Substitute fallback data and log a warning.
    Fallback,
    /// Propagate the error.
    #[default]
    Throw,
}

impl OnUnavailable {
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fallback" => Some(Self::Fallback),
            "throw" => Some(Self::Throw),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Throw => "throw",
        }
    }

    #[must_use]
    pub const fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// Policies for the endpoints that support a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPolicies {
    /// `GET /api/global-license/status`
    pub license_status: OnUnavailable,
    /// `GET /api/routes`
    pub routes: OnUnavailable,
    /// `GET /api/admin/users`
    pub users: OnUnavailable,
    /// `GET /api/admin/user-routes/{userId}`
    pub user_routes: OnUnavailable,
}

impl Default for EndpointPolicies {
    fn default() -> Self {
        Self {
            license_status: OnUnavailable::Fallback,
            routes: OnUnavailable::Fallback,
            users: OnUnavailable::Fallback,
            user_routes: OnUnavailable::Fallback,
        }
    }
}

impl EndpointPolicies {
    /// Every endpoint fails closed.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            license_status: OnUnavailable::Throw,
            routes: OnUnavailable::Throw,
            users: OnUnavailable::Throw,
            user_routes: OnUnavailable::Throw,
        }
    }
}
