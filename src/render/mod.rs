//! Output rendering for human and JSON modes.

pub mod error;
pub mod human;
pub mod robot;

use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::error::Result;

pub use error::render_error;

/// How command results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub format: OutputFormat,
    pub pretty: bool,
    pub color: bool,
}

impl Output {
    #[must_use]
    pub const fn new(format: OutputFormat, pretty: bool, color: bool) -> Self {
        Self {
            format,
            pretty,
            color,
        }
    }

    /// Render `data` as JSON, or with `human` for terminals.
    ///
    /// # Errors
    /// Returns an error if JSON serialization fails.
    pub fn render<T: Serialize>(
        &self,
        command: &str,
        data: &T,
        human: impl FnOnce(&T, bool) -> String,
    ) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(human(data, self.color)),
            OutputFormat::Json => robot::render_json(command, data, self.pretty),
        }
    }
}
