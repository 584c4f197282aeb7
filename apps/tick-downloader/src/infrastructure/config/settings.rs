//! Downloader Configuration Settings
//!
//! Configuration types for the tick downloader, loaded from environment variables.

use std::time::Duration;

use crate::domain::trades::{ApiVersion, PageLimits, V1_PAGE_LIMIT, V2_PAGE_LIMIT};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Trades API credentials.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(api_key: String) -> Self {
        Self { api_key }
    }

    /// Get the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum attempts per page, including the first.
    pub retry_max_attempts: u32,
    /// Initial retry delay.
    pub retry_initial_backoff: Duration,
    /// Maximum retry delay.
    pub retry_max_backoff: Duration,
    /// Retry delay multiplier for exponential backoff.
    pub retry_multiplier: f64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry_max_attempts: 3,
            retry_initial_backoff: Duration::from_millis(500),
            retry_max_backoff: Duration::from_secs(10),
            retry_multiplier: 2.0,
        }
    }
}

/// Complete downloader configuration.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// API credentials.
    pub credentials: Credentials,
    /// API base URL.
    pub base_url: String,
    /// API version to page through.
    pub api_version: ApiVersion,
    /// Per-version page-size ceilings.
    pub page_limits: PageLimits,
    /// HTTP client settings.
    pub http: HttpSettings,
}

impl DownloaderConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing, the
    /// API version is unknown, a page limit is zero, or the retry multiplier
    /// is below 1.0 or not finite.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("POLYGON_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("POLYGON_API_KEY".to_string()))?;

        if api_key.is_empty() {
            return Err(ConfigError::EmptyValue("POLYGON_API_KEY".to_string()));
        }

        let base_url =
            std::env::var("POLYGON_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let api_version = parse_api_version(std::env::var("POLYGON_API_VERSION").ok())?;

        let page_limits = PageLimits {
            v1: parse_env_usize("TICK_DOWNLOADER_V1_PAGE_LIMIT", V1_PAGE_LIMIT),
            v2: parse_env_usize("TICK_DOWNLOADER_V2_PAGE_LIMIT", V2_PAGE_LIMIT),
        };

        if page_limits.v1 == 0 {
            return Err(ConfigError::InvalidValue(
                "TICK_DOWNLOADER_V1_PAGE_LIMIT".to_string(),
            ));
        }
        if page_limits.v2 == 0 {
            return Err(ConfigError::InvalidValue(
                "TICK_DOWNLOADER_V2_PAGE_LIMIT".to_string(),
            ));
        }

        let http = HttpSettings {
            timeout: parse_env_duration_secs(
                "TICK_DOWNLOADER_HTTP_TIMEOUT_SECS",
                HttpSettings::default().timeout,
            ),
            retry_max_attempts: parse_env_u32(
                "TICK_DOWNLOADER_RETRY_MAX_ATTEMPTS",
                HttpSettings::default().retry_max_attempts,
            ),
            retry_initial_backoff: parse_env_duration_millis(
                "TICK_DOWNLOADER_RETRY_INITIAL_MS",
                HttpSettings::default().retry_initial_backoff,
            ),
            retry_max_backoff: parse_env_duration_millis(
                "TICK_DOWNLOADER_RETRY_MAX_MS",
                HttpSettings::default().retry_max_backoff,
            ),
            retry_multiplier: validate_retry_multiplier(parse_env_f64(
                "TICK_DOWNLOADER_RETRY_MULTIPLIER",
                HttpSettings::default().retry_multiplier,
            ))?,
        };

        Ok(Self {
            credentials: Credentials::new(api_key),
            base_url,
            api_version,
            page_limits,
            http,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable holds an unusable value.
    #[error("environment variable {0} has an invalid value")]
    InvalidValue(String),
}

fn parse_api_version(value: Option<String>) -> Result<ApiVersion, ConfigError> {
    value.map_or(Ok(ApiVersion::default()), |v| {
        ApiVersion::from_str_case_insensitive(&v)
            .ok_or_else(|| ConfigError::InvalidValue("POLYGON_API_VERSION".to_string()))
    })
}

fn validate_retry_multiplier(multiplier: f64) -> Result<f64, ConfigError> {
    if multiplier.is_finite() && multiplier >= 1.0 {
        Ok(multiplier)
    } else {
        Err(ConfigError::InvalidValue(
            "TICK_DOWNLOADER_RETRY_MULTIPLIER".to_string(),
        ))
    }
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
