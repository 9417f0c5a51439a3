//! Persisted bearer token.
//!
//! `euk login` writes the token to `session.json` in the data directory;
//! `euk logout` removes it. `EUK_TOKEN` and `--token` take precedence over
//! the saved file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EukError, Result};
use crate::util::fs::write_atomic;

/// Environment variable carrying a bearer token.
pub const ENV_TOKEN: &str = "EUK_TOKEN";

/// A saved login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

/// The session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved session.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&content)?;
        if session.token.trim().is_empty() {
            tracing::debug!(path = %self.path.display(), "ignoring session file with empty token");
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Save `token`, replacing any previous session.
    ///
    /// # Errors
    /// Rejects an empty token; returns I/O errors from writing the file.
    pub fn save(&self, token: &str) -> Result<Session> {
        let token = token.trim();
        if token.is_empty() {
            return Err(EukError::validation("token", "token ne sme biti prazan"));
        }
        let session = Session {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let content = serde_json::to_vec_pretty(&session)?;
        write_atomic(&self.path, &content)?;
        restrict_permissions(&self.path)?;
        tracing::info!(path = %self.path.display(), "session saved");
        Ok(session)
    }

    /// Remove the saved session. Returns whether one existed.
    ///
    /// # Errors
    /// Returns I/O errors other than "not found".
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "session removed");
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
