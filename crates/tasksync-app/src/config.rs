//! Client configuration loaded from `tasksync.toml` and the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tasksync_core::id::OwnerId;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "tasksync.toml";
/// Environment variable overriding `owner_id`.
pub const ENV_OWNER_ID: &str = "TASKSYNC_OWNER_ID";
/// Environment variable overriding `api.base_url`.
pub const ENV_BASE_URL: &str = "TASKSYNC_BASE_URL";
/// Service used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://mate.academy/students-api";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NOTICE_MS: u64 = 3000;

/// Configuration problems.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// Offending file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse {}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Parser failure.
        #[source]
        source: toml::de::Error,
    },
    /// No usable owner id was configured.
    #[error("owner id is not configured (set owner_id in {CONFIG_FILE} or {ENV_OWNER_ID})")]
    MissingOwner,
    /// An owner id override could not be parsed.
    #[error("invalid owner id '{0}'")]
    InvalidOwner(String),
    /// The base URL is blank.
    #[error("api.base_url must not be empty")]
    EmptyBaseUrl,
    /// A timeout was configured as zero.
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Owner every task is scoped to.
    #[serde(default)]
    pub owner_id: Option<u64>,
    /// Remote service settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Notification settings.
    #[serde(default)]
    pub notice: NoticeConfig,
}

/// `[api]` block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Service root; `/todos` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[notice]` block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NoticeConfig {
    /// How long an error notification stays visible.
    #[serde(default = "default_notice_ms")]
    pub timeout_ms: u64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_NOTICE_MS,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_notice_ms() -> u64 {
    DEFAULT_NOTICE_MS
}

impl ClientConfig {
    /// Load configuration from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TASKSYNC_OWNER_ID` and `TASKSYNC_BASE_URL` from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidOwner`] when the owner override is not a number.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let mut fetch = |key: &'static str| env::var(key).ok();
        self.with_env_from(&mut fetch)
    }

    fn with_env_from(
        mut self,
        fetch: &mut impl FnMut(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(owner) = env_value(ENV_OWNER_ID, fetch) {
            let parsed = owner
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidOwner(owner.clone()))?;
            self.owner_id = Some(parsed);
        }
        if let Some(base_url) = env_value(ENV_BASE_URL, fetch) {
            self.api.base_url = base_url;
        }
        Ok(self)
    }

    /// Check the invariants the rest of the client relies on.
    ///
    /// # Errors
    /// Rejects a blank base URL and zero timeouts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("api.timeout_secs"));
        }
        if self.notice.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("notice.timeout_ms"));
        }
        Ok(())
    }

    /// Configured owner.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingOwner`] when no non-zero owner id is set.
    pub fn owner(&self) -> Result<OwnerId, ConfigError> {
        self.owner_id
            .and_then(OwnerId::new)
            .ok_or(ConfigError::MissingOwner)
    }

    /// Per-request timeout for the HTTP client.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Lifetime of an error notification.
    #[must_use]
    pub const fn notice_timeout(&self) -> Duration {
        Duration::from_millis(self.notice.timeout_ms)
    }
}

fn env_value(
    key: &'static str,
    fetch: &mut impl FnMut(&'static str) -> Option<String>,
) -> Option<String> {
    fetch(key).filter(|value| !value.trim().is_empty())
}
