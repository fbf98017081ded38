use std::env;
use std::time::Duration;

use trivia_core::model::BatchSize;
use url::Url;

use crate::error::ConfigError;

pub const BASE_URL_ENV: &str = "TRIVIA_BASE_URL";
pub const BATCH_SIZE_ENV: &str = "TRIVIA_BATCH_SIZE";
pub const TIMEOUT_ENV: &str = "TRIVIA_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where the question service lives and how the client talks to it.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub batch_size: BatchSize,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build a config for the given base URL with default batch size and timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL does not parse or is not http(s).
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            batch_size: BatchSize::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Read `TRIVIA_BASE_URL`, `TRIVIA_BATCH_SIZE` and `TRIVIA_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reads values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let set = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = set(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = set(BATCH_SIZE_ENV) {
            let size: u32 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidBatchSize(raw.clone()))?;
            config.batch_size = BatchSize::new(size)?;
        }

        if let Some(raw) = set(TIMEOUT_ENV) {
            let secs: u64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.clone()))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Replace the base URL, keeping the other settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL does not parse or is not http(s).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: BatchSize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Endpoint paths are joined relative to the base, so it must end in `/`.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|source| ConfigError::InvalidBaseUrl {
        raw: raw.to_owned(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(raw.to_owned()));
    }
    Ok(url)
}
