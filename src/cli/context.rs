//! Per-invocation state shared by command handlers.

use crate::core::ApiClient;
use crate::error::Result;
use crate::render::Output;
use crate::services::Backend;
use crate::storage::ResolvedConfig;
use crate::util::should_use_color;

/// Resolved config, backend handle and output settings for one command.
#[derive(Debug)]
pub struct Context {
    pub config: ResolvedConfig,
    pub backend: Backend,
    pub output: Output,
}

impl Context {
    /// Build the backend client from `config`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ResolvedConfig) -> Result<Self> {
        let client = ApiClient::new(config.client_config())?;
        let backend = Backend::new(client, config.token.clone()).with_policies(config.policies);
        let output = Output::new(config.format, config.pretty, should_use_color(config.no_color));
        Ok(Self {
            config,
            backend,
            output,
        })
    }
}
