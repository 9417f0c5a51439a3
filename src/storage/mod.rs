//! Storage for configuration and the saved session.

pub mod config;
pub mod paths;
pub mod session;

pub use config::{
    Config, ConfigSource, ConfigSources, ConfigSummary, Environment, ResolvedConfig, ENV_API_URL, ENV_CONFIG,
    ENV_ENVIRONMENT, ENV_MIN_INTERVAL, ENV_NO_COLOR, ENV_NO_COLOR_STD, ENV_PRETTY, ENV_TIMEOUT,
};
pub use paths::AppPaths;
pub use session::{ENV_TOKEN, Session, SessionStore};
