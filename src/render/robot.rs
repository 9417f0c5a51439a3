//! Machine-readable JSON output.
//!
//! Every command result is wrapped in the same envelope so scripts can
//! check `command` and read `data` without knowing the human layout.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// Schema version of the JSON envelope.
pub const SCHEMA_VERSION: &str = "euk.v1";

/// The JSON envelope around a command result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<'a, T: Serialize> {
    pub schema_version: &'static str,
    pub command: &'a str,
    pub generated_at: DateTime<Utc>,
    pub data: &'a T,
}

impl<'a, T: Serialize> RobotOutput<'a, T> {
    #[must_use]
    pub fn new(command: &'a str, data: &'a T) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            command,
            generated_at: Utc::now(),
            data,
        }
    }
}

/// Render `data` inside the envelope.
///
/// # Errors
/// Returns an error if `data` cannot be serialized.
pub fn render_json<T: Serialize>(command: &str, data: &T, pretty: bool) -> Result<String> {
    let output = RobotOutput::new(command, data);
    if pretty {
        Ok(serde_json::to_string_pretty(&output)?)
    } else {
        Ok(serde_json::to_string(&output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn envelope_wraps_data() {
        let out = render_json("kategorije list", &json!([{"naziv": "Hitno"}]), false).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["command"], "kategorije list");
        assert_eq!(value["data"][0]["naziv"], "Hitno");
        assert!(value["generatedAt"].is_string());
        assert!(!out.contains('\n'));
    }

    #[test]
    fn pretty_output_is_multiline() {
        let out = render_json("logout", &json!({"removed": true}), true).unwrap();
        assert!(out.contains('\n'));
    }
}
