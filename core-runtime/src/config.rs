//! # Core Configuration Module
//!
//! Settings for the catalog sync: Discogs account and API access, the local
//! store location, the scheduler interval and logging.
//!
//! ## Overview
//!
//! A [`CoreConfig`] is built either through [`CoreConfig::builder`] or from the
//! process environment with [`CoreConfig::from_env`]. Both paths end in
//! [`CoreConfig::validate`], so an out-of-range value fails at start-up with an
//! actionable message instead of surfacing halfway through a sync run.
//!
//! Discogs credentials are *not* validated. A missing username or token shows
//! up as an authentication or not-found failure on the first request.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, DiscogsConfig};
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/var/lib/dissonant/catalog.db")
//!     .discogs(DiscogsConfig::new("my-user", "my-token"))
//!     .sync_interval(Duration::from_secs(6 * 60 * 60))
//!     .build()?;
//! ```
//!
//! ## Environment
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DISCOGS_USERNAME` | empty |
//! | `DISCOGS_TOKEN` | empty |
//! | `DISCOGS_API_URL` | `https://api.discogs.com` |
//! | `DISCOGS_USER_AGENT` | `DissonantSync/<version>` |
//! | `DISCOGS_PER_PAGE` | `100` |
//! | `DISCOGS_REQUEST_INTERVAL_MS` | `1100` |
//! | `DISCOGS_MAX_PAGES` | unset (all pages) |
//! | `DISSONANT_DATABASE_PATH` | `dissonant.db` |
//! | `DISSONANT_SYNC_INTERVAL_SECS` | `86400` |
//! | `DISSONANT_LOG_LEVEL` | `info` |
//! | `DISSONANT_LOG_FORMAT` | `pretty` in debug builds, `json` in release |

use crate::error::{Error, Result};
use crate::logging::{parse_log_level, LogFormat};
use bridge_traits::time::LogLevel;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.discogs.com";
pub const DEFAULT_PER_PAGE: u32 = 100;
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 1100;
pub const MAX_REQUEST_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_DATABASE_PATH: &str = "dissonant.db";

pub fn default_user_agent() -> String {
    format!("DissonantSync/{}", env!("CARGO_PKG_VERSION"))
}

/// Discogs account and API access settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DiscogsConfig {
    /// Account whose collection is synced
    pub username: String,
    /// Personal access token, sent as the `token` query parameter
    pub token: String,
    pub api_base_url: String,
    /// Discogs rejects requests without an identifying user agent.
    pub user_agent: String,
    /// Collection page size (1..=100)
    pub per_page: u32,
    /// Minimum spacing between two upstream requests
    pub request_interval_ms: u64,
    /// Stop listing after this many pages. `None` lists the whole collection.
    pub max_pages: Option<u32>,
}

impl DiscogsConfig {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_request_interval_ms(mut self, interval_ms: u64) -> Self {
        self.request_interval_ms = interval_ms;
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    /// Both username and token are present.
    pub fn has_credentials(&self) -> bool {
        !self.username.trim().is_empty() && !self.token.trim().is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.api_base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Discogs API URL must start with http:// or https://, got '{}'",
                self.api_base_url
            )));
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::Config(
                "Discogs user agent cannot be empty; Discogs rejects anonymous clients".to_string(),
            ));
        }

        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(Error::Config(format!(
                "Discogs page size must be between 1 and {}, got {}",
                MAX_PER_PAGE, self.per_page
            )));
        }

        if self.request_interval_ms == 0 {
            return Err(Error::Config(
                "Request interval must be greater than 0ms".to_string(),
            ));
        }

        if self.request_interval_ms > MAX_REQUEST_INTERVAL_MS {
            return Err(Error::Config(format!(
                "Request interval exceeds maximum of 60 seconds ({}ms)",
                MAX_REQUEST_INTERVAL_MS
            )));
        }

        if self.max_pages == Some(0) {
            return Err(Error::Config(
                "Max pages must be at least 1 when set".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for DiscogsConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            token: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: default_user_agent(),
            per_page: DEFAULT_PER_PAGE,
            request_interval_ms: DEFAULT_REQUEST_INTERVAL_MS,
            max_pages: None,
        }
    }
}

impl fmt::Debug for DiscogsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscogsConfig")
            .field("username", &self.username)
            .field(
                "token",
                &if self.token.is_empty() {
                    "<unset>"
                } else {
                    "[REDACTED]"
                },
            )
            .field("api_base_url", &self.api_base_url)
            .field("user_agent", &self.user_agent)
            .field("per_page", &self.per_page)
            .field("request_interval_ms", &self.request_interval_ms)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

/// Core configuration for the catalog sync service.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Time between two scheduled sync runs
    pub sync_interval: Duration,

    pub discogs: DiscogsConfig,

    pub log_level: LogLevel,

    pub log_format: LogFormat,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Load configuration from the process environment.
    ///
    /// Unset variables fall back to their defaults; values that are set but
    /// cannot be parsed are a configuration error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut discogs = DiscogsConfig::new(
            get("DISCOGS_USERNAME").unwrap_or_default(),
            get("DISCOGS_TOKEN").unwrap_or_default(),
        );
        if let Some(url) = get("DISCOGS_API_URL") {
            discogs.api_base_url = url;
        }
        if let Some(user_agent) = get("DISCOGS_USER_AGENT") {
            discogs.user_agent = user_agent;
        }
        if let Some(per_page) = get("DISCOGS_PER_PAGE") {
            discogs.per_page = parse_number("DISCOGS_PER_PAGE", &per_page)?;
        }
        if let Some(interval) = get("DISCOGS_REQUEST_INTERVAL_MS") {
            discogs.request_interval_ms = parse_number("DISCOGS_REQUEST_INTERVAL_MS", &interval)?;
        }
        if let Some(max_pages) = get("DISCOGS_MAX_PAGES") {
            discogs.max_pages = Some(parse_number("DISCOGS_MAX_PAGES", &max_pages)?);
        }

        let mut builder = CoreConfig::builder().discogs(discogs);

        if let Some(path) = get("DISSONANT_DATABASE_PATH") {
            builder = builder.database_path(path);
        }
        if let Some(secs) = get("DISSONANT_SYNC_INTERVAL_SECS") {
            let secs: u64 = parse_number("DISSONANT_SYNC_INTERVAL_SECS", &secs)?;
            builder = builder.sync_interval(Duration::from_secs(secs));
        }
        if let Some(level) = get("DISSONANT_LOG_LEVEL") {
            builder = builder.log_level(parse_log_level(&level)?);
        }
        if let Some(format) = get("DISSONANT_LOG_FORMAT") {
            builder = builder.log_format(format.parse()?);
        }

        builder.build()
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config(
                "Database path cannot be empty. Set DISSONANT_DATABASE_PATH or use .database_path()"
                    .to_string(),
            ));
        }

        if self.sync_interval.is_zero() {
            return Err(Error::Config(
                "Sync interval must be greater than zero".to_string(),
            ));
        }

        self.discogs.validate()
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Config(format!("{} has invalid value '{}': {}", key, value, e)))
}

/// Builder for [`CoreConfig`]
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    sync_interval: Option<Duration>,
    discogs: Option<DiscogsConfig>,
    log_level: Option<LogLevel>,
    log_format: Option<LogFormat>,
}

impl CoreConfigBuilder {
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    pub fn discogs(mut self, discogs: DiscogsConfig) -> Self {
        self.discogs = Some(discogs);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    /// Builds the final `CoreConfig`, filling defaults and validating.
    pub fn build(self) -> Result<CoreConfig> {
        let config = CoreConfig {
            database_path: self
                .database_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            sync_interval: self.sync_interval.unwrap_or(DEFAULT_SYNC_INTERVAL),
            discogs: self.discogs.unwrap_or_default(),
            log_level: self.log_level.unwrap_or(LogLevel::Info),
            log_format: self.log_format.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
