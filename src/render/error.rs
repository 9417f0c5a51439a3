//! Error rendering for euk.
//!
//! Human output shows the message, the error code, fix commands and the
//! context behind them. JSON output carries the same data in a stable shape
//! for scripts.

use colored::Colorize;

use crate::cli::args::OutputFormat;
use crate::error::{EukError, FixSuggestion, Recovery};

// =============================================================================
// Public API
// =============================================================================

/// Render an error for the selected output format.
#[must_use]
pub fn render_error(error: &EukError, format: OutputFormat, color: bool, pretty: bool) -> String {
    match format {
        OutputFormat::Json => render_error_json(error, pretty),
        OutputFormat::Human if color => render_styled(error),
        OutputFormat::Human => render_simple(error),
    }
}

/// Render error as structured JSON for machine consumption.
#[must_use]
pub fn render_error_json(error: &EukError, pretty: bool) -> String {
    let error_json = ErrorJson::from_error(error);
    let rendered = if pretty {
        serde_json::to_string_pretty(&error_json)
    } else {
        serde_json::to_string(&error_json)
    };
    rendered.unwrap_or_else(|_| render_simple(error))
}

// =============================================================================
// Terminal Rendering
// =============================================================================

fn render_styled(error: &EukError) -> String {
    let suggestions = error.fix_suggestions();
    let mut lines = vec![format!(
        "{} {} {}",
        "Greška:".red().bold(),
        error.to_string().red(),
        format!("[{}]", error.error_code()).dimmed()
    )];

    if !suggestions.is_empty() {
        lines.push(String::new());
        lines.extend(suggestion_lines(&suggestions, |cmd| cmd.cyan().to_string()));
    }
    if let Some(hint) = recovery_hint(error.recovery()) {
        lines.push(String::new());
        lines.push(hint.yellow().to_string());
    }
    lines.join("\n")
}

fn render_simple(error: &EukError) -> String {
    let suggestions = error.fix_suggestions();
    let mut lines = vec![format!("Greška [{}]: {}", error.error_code(), error)];
    lines.extend(suggestion_lines(&suggestions, str::to_string));
    if let Some(hint) = recovery_hint(error.recovery()) {
        lines.push(hint.to_string());
    }
    lines.join("\n")
}

fn suggestion_lines(
    suggestions: &[FixSuggestion],
    style_cmd: impl Fn(&str) -> String,
) -> Vec<String> {
    let mut lines = Vec::new();
    for suggestion in suggestions {
        for (i, cmd) in suggestion.commands.iter().enumerate() {
            let prefix = if i == 0 { "Rešenje:" } else { "    ili:" };
            lines.push(format!("{prefix} {}", style_cmd(cmd)));
        }
        if !suggestion.context.is_empty() {
            lines.push(format!("  {}", suggestion.context));
        }
        if let Some(prevention) = &suggestion.prevention {
            lines.push(format!("  Savet: {prevention}"));
        }
    }
    lines
}

const fn recovery_hint(recovery: Recovery) -> Option<&'static str> {
    match recovery {
        Recovery::Relogin => Some("Prijavite se ponovo: euk login <TOKEN>"),
        Recovery::Retry => Some("Pokušajte ponovo za nekoliko trenutaka."),
        Recovery::None => None,
    }
}

// =============================================================================
// JSON Rendering
// =============================================================================

/// JSON representation of an error for machine consumption.
#[derive(serde::Serialize)]
struct ErrorJson {
    error_code: &'static str,
    category: String,
    message: String,
    is_retryable: bool,
    recovery: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    suggestions: Vec<SuggestionJson>,
}

#[derive(serde::Serialize)]
struct SuggestionJson {
    commands: Vec<String>,
    context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prevention: Option<String>,
}

impl ErrorJson {
    fn from_error(error: &EukError) -> Self {
        Self {
            error_code: error.error_code(),
            category: error.category().to_string(),
            message: error.to_string(),
            is_retryable: error.is_retryable(),
            recovery: match error.recovery() {
                Recovery::Relogin => "relogin",
                Recovery::Retry => "retry",
                Recovery::None => "none",
            },
            status: error.status(),
            url: error.url().map(String::from),
            suggestions: error
                .fix_suggestions()
                .into_iter()
                .map(|s| SuggestionJson {
                    commands: s.commands,
                    context: s.context,
                    prevention: s.prevention,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_no_ansi(s: &str) {
        assert!(!s.contains("\x1b["), "Contains ANSI codes: {s}");
    }

    fn approve_failure() -> EukError {
        EukError::ServerError {
            url: "http://localhost:8080/api/admin/users/7/approve".to_string(),
            status: 500,
            attempts: 4,
        }
    }

    #[test]
    fn simple_render_includes_code_and_url() {
        let output = render_error(&approve_failure(), OutputFormat::Human, false, false);
        assert!(output.starts_with("Greška [EUK-S001]:"));
        assert!(output.contains("/api/admin/users/7/approve"));
        assert!(output.contains("Pokušajte ponovo"));
        assert_no_ansi(&output);
    }

    #[test]
    fn session_errors_offer_relogin() {
        let err = EukError::SessionExpired {
            url: "http://localhost:8080/api/euk/predmeti".to_string(),
        };
        let output = render_error(&err, OutputFormat::Human, false, false);
        assert!(output.contains("euk login"));
        assert!(output.contains("Vaša sesija je istekla"));
    }

    #[test]
    fn json_render_is_structured() {
        let output = render_error(&approve_failure(), OutputFormat::Json, false, false);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["error_code"], "EUK-S001");
        assert_eq!(value["status"], 500);
        assert_eq!(value["recovery"], "retry");
        assert_eq!(value["is_retryable"], true);
        assert!(value["url"].as_str().unwrap().ends_with("/7/approve"));
    }

    #[test]
    fn json_render_omits_absent_fields() {
        let err = EukError::validation("naziv", "naziv je obavezan");
        let output = render_error_json(&err, true);
        assert!(output.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(value.get("status").is_none());
        assert!(value.get("url").is_none());
        assert_eq!(value["recovery"], "none");
    }
}
