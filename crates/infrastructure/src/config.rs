//! Harness settings.
//!
//! Settings are layered, later layers winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`vouch.toml` in the working directory)
//! 3. `VOUCH_*` environment variables, e.g. `VOUCH_BASE_URL`,
//!    `VOUCH_TIMEOUT_MS`, `VOUCH_USER_AGENT`

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::adapters::DEFAULT_USER_AGENT;

/// Service the bundled company suite targets by default.
pub const DEFAULT_BASE_URL: &str = "https://api-desafio-qa.onrender.com";

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Settings file looked up by [`HarnessConfig::load`].
pub const CONFIG_FILE: &str = "vouch.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "VOUCH";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or a value had the wrong type.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// Configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A zero timeout would fail every request.
    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
}

/// Settings shared by every scenario in a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HarnessConfig {
    /// Base URL of the service under test, without a trailing path.
    pub base_url: String,
    /// Default per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Loads defaults, then `vouch.toml` if present, then the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Some(Path::new(CONFIG_FILE)))
    }

    /// Like [`load`](Self::load) with an explicit settings file. A missing
    /// file is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed or a value is invalid.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layered(file, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_layered(file: Option<&Path>, env: config::Environment) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("timeout_ms", DEFAULT_TIMEOUT_MS)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?;

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings: Self = builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        tracing::debug!(
            base_url = %settings.base_url,
            timeout_ms = settings.timeout_ms,
            "settings loaded"
        );
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        self.base_url().map(|_| ())
    }

    /// Default per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed base URL.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBaseUrl` unless the value is an absolute http(s) URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }

    /// Base URL as a string with any trailing slash removed, ready for
    /// `format!("{base}/company")`.
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
