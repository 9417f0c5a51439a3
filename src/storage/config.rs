//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/euk/config.toml`
//! - macOS: `~/Library/Application Support/rs.euk.euk/config.toml`
//! - Windows: `%APPDATA%/euk/euk/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file (the saved session, for the token)
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `EUK_API_URL`: Backend base URL
//! - `EUK_ENV`: `development` or `production`
//! - `EUK_TIMEOUT`: Request timeout in seconds
//! - `EUK_MIN_INTERVAL_MS`: Minimum spacing between requests
//! - `EUK_TOKEN`: Bearer token
//! - `EUK_NO_COLOR` or `NO_COLOR`: Disable colors (1, true, yes)
//! - `EUK_PRETTY`: Pretty-print JSON output (1, true, yes)
//! - `EUK_CONFIG`: Override config file path
//!
//! ## Example
//!
//! ```toml
//! [api]
//! environment = "production"
//! timeout_seconds = 15
//!
//! [endpoints]
//! users = "throw"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use super::session::{ENV_TOKEN, SessionStore};
use crate::cli::args::{Cli, EnvironmentArg, OutputFormat};
use crate::core::ClientConfig;
use crate::core::EndpointPolicies;
use crate::core::http::{DEVELOPMENT_BASE_URL, PRODUCTION_BASE_URL};
use crate::core::request::token_prefix;
use crate::error::{EukError, Result};
use crate::util::fs::write_atomic;

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable for the backend base URL.
pub const ENV_API_URL: &str = "EUK_API_URL";
/// Environment variable selecting the backend environment.
pub const ENV_ENVIRONMENT: &str = "EUK_ENV";
/// Environment variable for timeout in seconds.
pub const ENV_TIMEOUT: &str = "EUK_TIMEOUT";
/// Environment variable for the minimum request spacing in milliseconds.
pub const ENV_MIN_INTERVAL: &str = "EUK_MIN_INTERVAL_MS";
/// Environment variable to disable colors.
pub const ENV_NO_COLOR: &str = "EUK_NO_COLOR";
/// Standard environment variable to disable colors.
pub const ENV_NO_COLOR_STD: &str = "NO_COLOR";
/// Environment variable for pretty JSON output.
pub const ENV_PRETTY: &str = "EUK_PRETTY";
/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "EUK_CONFIG";

const MAX_TIMEOUT_SECONDS: u64 = 300;

// =============================================================================
// Environment
// =============================================================================

/// Which backend deployment to talk to when no URL is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::Development => DEVELOPMENT_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

impl From<EnvironmentArg> for Environment {
    fn from(arg: EnvironmentArg) -> Self {
        match arg {
            EnvironmentArg::Development => Self::Development,
            EnvironmentArg::Production => Self::Production,
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub environment: Environment,
    pub timeout: Duration,
    pub min_interval: Duration,
    pub backoff_base: Duration,
    /// Bearer token, if any source supplied one.
    pub token: Option<String>,
    pub policies: EndpointPolicies,
    pub format: OutputFormat,
    pub pretty: bool,
    pub no_color: bool,
    pub verbose: bool,
    /// Config file that was consulted (it may not exist).
    pub config_path: PathBuf,
    /// Where `login` saves the token.
    pub session_path: PathBuf,
    /// Source of each setting for debugging.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSources {
    pub base_url: ConfigSource,
    pub environment: ConfigSource,
    pub timeout: ConfigSource,
    pub min_interval: ConfigSource,
    pub token: ConfigSource,
    pub format: ConfigSource,
    pub pretty: ConfigSource,
    pub no_color: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Token from the saved session.
    Session,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Session => write!(f, "saved session"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// What `euk config` prints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub base_url: String,
    pub environment: Environment,
    pub timeout_seconds: u64,
    pub min_interval_ms: u64,
    /// First characters of the token only.
    pub token: Option<String>,
    pub policies: EndpointPolicies,
    pub config_path: PathBuf,
    pub session_path: PathBuf,
    pub sources: ConfigSources,
}

/// Environment lookup, injectable for tests.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

impl ResolvedConfig {
    /// Resolve final configuration from CLI args, the process environment,
    /// the config file and the saved session.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is invalid, or any
    /// resolved value is invalid.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        Self::resolve_with(cli, &AppPaths::new(), &env)
    }

    /// [`resolve`](Self::resolve) against explicit paths and environment.
    ///
    /// # Errors
    ///
    /// As [`resolve`](Self::resolve).
    pub fn resolve_with(cli: &Cli, paths: &AppPaths, env: EnvLookup<'_>) -> Result<Self> {
        let config_path = env(ENV_CONFIG).map_or_else(|| paths.config_file(), PathBuf::from);
        let config = Config::load_from(&config_path)?;
        config.validate()?;

        let session_path = paths.session_file();
        let stored_token = match SessionStore::new(&session_path).load() {
            Ok(session) => session.map(|s| s.token),
            Err(err) => {
                tracing::warn!(path = %session_path.display(), error = %err, "ignoring unreadable session file");
                None
            }
        };

        let mut sources = ConfigSources::default();

        let environment = Self::resolve_environment(cli, &config, env, &mut sources.environment)?;
        let base_url =
            Self::resolve_base_url(cli, &config, environment, env, &mut sources.base_url);
        validate_base_url(&base_url)?;
        let timeout = Self::resolve_timeout(cli, &config, env, &mut sources.timeout)?;
        let min_interval = Self::resolve_min_interval(&config, env, &mut sources.min_interval)?;
        let token = Self::resolve_token(cli, env, stored_token, &mut sources.token);
        let format = Self::resolve_format(cli, &config, &mut sources.format)?;
        let pretty = Self::resolve_pretty(cli, &config, env, &mut sources.pretty);
        let no_color = Self::resolve_no_color(cli, &config, env, &mut sources.no_color);

        Ok(Self {
            base_url,
            environment,
            timeout,
            min_interval,
            backoff_base: Duration::from_millis(config.api.backoff_base_ms),
            token,
            policies: config.endpoints,
            format,
            pretty,
            no_color,
            verbose: cli.verbose,
            config_path,
            session_path,
            sources,
        })
    }

    /// Serializable view for `euk config`, with the token masked.
    #[must_use]
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            base_url: self.base_url.clone(),
            environment: self.environment,
            timeout_seconds: self.timeout.as_secs(),
            min_interval_ms: u64::try_from(self.min_interval.as_millis()).unwrap_or(u64::MAX),
            token: self
                .token
                .as_deref()
                .map(|t| format!("{}…", token_prefix(Some(t)))),
            policies: self.policies,
            config_path: self.config_path.clone(),
            session_path: self.session_path.clone(),
            sources: self.sources.clone(),
        }
    }

    /// Settings for the backend client.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone())
            .with_timeout(self.timeout)
            .with_min_interval(self.min_interval)
            .with_backoff_base(self.backoff_base)
    }

    fn resolve_environment(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> Result<Environment> {
        if let Some(arg) = cli.environment {
            *source = ConfigSource::Cli;
            return Ok(arg.into());
        }

        if let Some(raw) = env(ENV_ENVIRONMENT) {
            *source = ConfigSource::Env;
            return Environment::parse(&raw).ok_or_else(|| EukError::ConfigInvalid {
                key: ENV_ENVIRONMENT.to_string(),
                value: raw,
                message: "očekivano development ili production".to_string(),
            });
        }

        *source = if config.api.environment == Environment::default() {
            ConfigSource::Default
        } else {
            ConfigSource::ConfigFile
        };
        Ok(config.api.environment)
    }

    fn resolve_base_url(
        cli: &Cli,
        config: &Config,
        environment: Environment,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> String {
        // 1. CLI flag
        if let Some(url) = &cli.api_url {
            *source = ConfigSource::Cli;
            return url.trim().to_string();
        }

        // 2. Environment variable
        if let Some(url) = env(ENV_API_URL) {
            *source = ConfigSource::Env;
            return url.trim().to_string();
        }

        // 3. Config file
        if let Some(url) = &config.api.base_url {
            *source = ConfigSource::ConfigFile;
            return url.trim().to_string();
        }

        // 4. Default for the selected environment
        *source = ConfigSource::Default;
        environment.default_base_url().to_string()
    }

    fn resolve_timeout(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> Result<Duration> {
        let (seconds, origin) = if let Some(seconds) = cli.timeout {
            (seconds, ConfigSource::Cli)
        } else if let Some(raw) = env(ENV_TIMEOUT) {
            (parse_number(ENV_TIMEOUT, &raw)?, ConfigSource::Env)
        } else {
            (config.api.timeout_seconds, ConfigSource::ConfigFile)
        };

        validate_timeout(seconds)?;
        *source = origin;
        Ok(Duration::from_secs(seconds))
    }

    fn resolve_min_interval(
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> Result<Duration> {
        if let Some(raw) = env(ENV_MIN_INTERVAL) {
            *source = ConfigSource::Env;
            return Ok(Duration::from_millis(parse_number(ENV_MIN_INTERVAL, &raw)?));
        }
        *source = ConfigSource::ConfigFile;
        Ok(Duration::from_millis(config.api.min_interval_ms))
    }

    fn resolve_token(
        cli: &Cli,
        env: EnvLookup<'_>,
        stored: Option<String>,
        source: &mut ConfigSource,
    ) -> Option<String> {
        if let Some(token) = &cli.token {
            *source = ConfigSource::Cli;
            return Some(token.clone());
        }

        if let Some(token) = env(ENV_TOKEN).filter(|t| !t.trim().is_empty()) {
            *source = ConfigSource::Env;
            return Some(token);
        }

        if let Some(token) = stored {
            *source = ConfigSource::Session;
            return Some(token);
        }

        *source = ConfigSource::Default;
        None
    }

    fn resolve_format(
        cli: &Cli,
        config: &Config,
        source: &mut ConfigSource,
    ) -> Result<OutputFormat> {
        // clap always supplies a value, so only a non-default one counts as explicit
        let from_cli = cli.effective_format();
        if from_cli != OutputFormat::Human {
            *source = ConfigSource::Cli;
            return Ok(from_cli);
        }

        if let Some(format) = &config.output.format {
            *source = ConfigSource::ConfigFile;
            return parse_format(format);
        }

        *source = ConfigSource::Default;
        Ok(OutputFormat::Human)
    }

    fn resolve_pretty(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> bool {
        if cli.pretty {
            *source = ConfigSource::Cli;
            return true;
        }
        if is_truthy(env(ENV_PRETTY).as_deref()) {
            *source = ConfigSource::Env;
            return true;
        }
        if config.output.pretty {
            *source = ConfigSource::ConfigFile;
            return true;
        }
        *source = ConfigSource::Default;
        false
    }

    fn resolve_no_color(
        cli: &Cli,
        config: &Config,
        env: EnvLookup<'_>,
        source: &mut ConfigSource,
    ) -> bool {
        if cli.no_color {
            *source = ConfigSource::Cli;
            return true;
        }
        if is_truthy(env(ENV_NO_COLOR).as_deref()) || env(ENV_NO_COLOR_STD).is_some() {
            *source = ConfigSource::Env;
            return true;
        }
        // Inverted: color = false means no_color
        if !config.output.color {
            *source = ConfigSource::ConfigFile;
            return true;
        }
        *source = ConfigSource::Default;
        false
    }
}

fn is_truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| EukError::ConfigInvalid {
        key: key.to_string(),
        value: raw.to_string(),
        message: "očekivan ceo broj".to_string(),
    })
}

fn parse_format(s: &str) -> Result<OutputFormat> {
    match s.trim().to_lowercase().as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        _ => Err(EukError::ConfigInvalid {
            key: "output.format".to_string(),
            value: s.to_string(),
            message: "dozvoljeno: human, json".to_string(),
        }),
    }
}

fn validate_timeout(seconds: u64) -> Result<()> {
    if seconds == 0 || seconds > MAX_TIMEOUT_SECONDS {
        return Err(EukError::ConfigInvalid {
            key: "api.timeout_seconds".to_string(),
            value: seconds.to_string(),
            message: format!("mora biti između 1 i {MAX_TIMEOUT_SECONDS} sekundi"),
        });
    }
    Ok(())
}

/// Reject empty URLs and anything that is not http(s).
///
/// # Errors
/// Returns [`EukError::ConfigInvalid`] describing the problem.
pub fn validate_base_url(url: &str) -> Result<()> {
    let invalid = |message: &str| EukError::ConfigInvalid {
        key: "api.base_url".to_string(),
        value: url.to_string(),
        message: message.to_string(),
    };

    if url.trim().is_empty() {
        return Err(invalid("adresa servera ne sme biti prazna"));
    }
    let parsed = reqwest::Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("dozvoljene šeme su http i https"));
    }
    Ok(())
}

// =============================================================================
// Config File
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings.
    pub api: ApiConfig,
    /// Fail-open policy per endpoint.
    pub endpoints: EndpointPolicies,
    /// Output settings.
    pub output: OutputConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Explicit base URL; overrides the environment default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub environment: Environment,
    pub timeout_seconds: u64,
    pub min_interval_ms: u64,
    pub backoff_base_ms: u64,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format (human, json).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Whether to use colors in output.
    pub color: bool,
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            environment: Environment::Development,
            timeout_seconds: 10,
            min_interval_ms: 500,
            backoff_base_ms: 1000,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            pretty: false,
        }
    }
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error only if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| EukError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save configuration to the default config file path.
    ///
    /// # Errors
    /// Returns serialization or I/O errors.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    /// Returns serialization or I/O errors.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EukError::Config(format!("Failed to serialize config: {e}")))?;
        write_atomic(path, content.as_bytes())?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    /// Get the config file path, honouring `EUK_CONFIG`.
    #[must_use]
    pub fn config_path() -> PathBuf {
        std::env::var(ENV_CONFIG).map_or_else(|_| AppPaths::new().config_file(), PathBuf::from)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Rejects an empty or non-http(s) base URL, a timeout outside 1-300
    /// seconds and an unknown output format.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.api.base_url {
            validate_base_url(url)?;
        }
        validate_timeout(self.api.timeout_seconds)?;
        if let Some(format) = &self.output.format {
            parse_format(format)?;
        }
        Ok(())
    }
}
