//! HTTP transport for the historical trades API, with retry logic.
//!
//! Implements `TradeTransport` over reqwest. Retries rate limits (429),
//! retryable statuses (408, 5xx) and network errors with jittered
//! exponential backoff. Whatever status remains after the last attempt is
//! returned to the caller unchanged, so the schema adapter can report it.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};

use crate::application::ports::{PageRequest, RawResponse, TradeTransport, TransportError};
use crate::domain::trades::ApiVersion;
use crate::infrastructure::config::{DEFAULT_BASE_URL, DownloaderConfig};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Jitter factor as a fraction (0.1 = ±10%).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

/// HTTP transport configuration.
#[derive(Clone)]
pub struct PolygonHttpConfig {
    /// API key sent as the `apiKey` query parameter.
    pub api_key: String,
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry behaviour.
    pub retry: RetryConfig,
}

impl PolygonHttpConfig {
    /// Create a configuration against the default host.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl From<&DownloaderConfig> for PolygonHttpConfig {
    fn from(config: &DownloaderConfig) -> Self {
        Self {
            api_key: config.credentials.api_key().to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.http.timeout,
            retry: RetryConfig {
                max_attempts: config.http.retry_max_attempts,
                initial_backoff: config.http.retry_initial_backoff,
                max_backoff: config.http.retry_max_backoff,
                multiplier: config.http.retry_multiplier,
                jitter_factor: RetryConfig::default().jitter_factor,
            },
        }
    }
}

impl std::fmt::Debug for PolygonHttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonHttpConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Path of the trades endpoint for a request.
///
/// The ticker is uppercased; the API answers lowercase tickers with an
/// empty tick array.
#[must_use]
pub fn endpoint_path(request: &PageRequest) -> String {
    let ticker = request.ticker.to_uppercase();
    let date = request.wire_date();
    match request.version {
        ApiVersion::V1 => format!("/v1/historic/trades/{ticker}/{date}"),
        ApiVersion::V2 => format!("/v2/ticks/stocks/trades/{ticker}/{date}"),
    }
}

/// reqwest-backed `TradeTransport`.
#[derive(Debug, Clone)]
pub struct PolygonHttpTransport {
    client: Client,
    config: PolygonHttpConfig,
}

impl PolygonHttpTransport {
    /// Create a transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the client cannot be built.
    pub fn new(config: PolygonHttpConfig) -> Result<Self, TransportError> {
        if config.api_key.is_empty() {
            return Err(TransportError::network("API key is empty"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::network(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl TradeTransport for PolygonHttpTransport {
    async fn fetch(&self, request: &PageRequest) -> Result<RawResponse, TransportError> {
        let path = endpoint_path(request);
        let url = format!("{}{path}", self.config.base_url);
        let offset = request.cursor.value().to_string();
        let limit = request.limit.to_string();
        let mut backoff = ExponentialBackoff::new(&self.config.retry);

        loop {
            let result = self
                .client
                .get(&url)
                .query(&[
                    ("offset", offset.as_str()),
                    ("limit", limit.as_str()),
                    ("apiKey", self.config.api_key.as_str()),
                ])
                .send()
                .await;

            let response = match result {
                Ok(resp) => resp,
                Err(e) => {
                    // reqwest errors carry the URL, which carries the key
                    let e = e.without_url();
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %e,
                            path = %path,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt,
                            "Network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(TransportError::network(format!(
                        "{e} (after {} attempts)",
                        backoff.attempt
                    )));
                }
            };

            let status = response.status();
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());

            let delay = match categorize_status(status) {
                ErrorCategory::Success | ErrorCategory::NonRetryable => None,
                ErrorCategory::RateLimited => {
                    // consume an attempt even when the server names the delay
                    backoff
                        .next_backoff()
                        .map(|d| retry_after.map_or(d, Duration::from_secs))
                }
                ErrorCategory::Retryable => backoff.next_backoff(),
            };

            if let Some(delay) = delay {
                tracing::warn!(
                    status = status.as_u16(),
                    path = %path,
                    delay_ms = delay.as_millis(),
                    attempt = backoff.attempt,
                    "Retryable status, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError {
                    status: Some(status.as_u16()),
                    message: e.without_url().to_string(),
                })?;

            return Ok(RawResponse::new(status.as_u16(), body.to_vec()));
        }
    }
}

/// Error category for determining retry behavior.
#[derive(Debug, PartialEq, Eq)]
enum ErrorCategory {
    Success,
    RateLimited,
    Retryable,
    NonRetryable,
}

/// Categorize HTTP status code for retry handling.
const fn categorize_status(status: StatusCode) -> ErrorCategory {
    match status.as_u16() {
        200..=299 => ErrorCategory::Success,
        429 => ErrorCategory::RateLimited,
        408 | 500 | 502 | 503 | 504 => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
    }
}

/// Exponential backoff calculator.
struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    jitter_factor: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
            jitter_factor: config.jitter_factor,
        }
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let backoff = self.current_backoff;
        let next = (self.current_backoff.as_secs_f64() * self.multiplier)
            .min(self.max_backoff.as_secs_f64());
        // negative products fall back to no delay
        self.current_backoff = Duration::try_from_secs_f64(next).unwrap_or(Duration::ZERO);

        Some(self.apply_jitter(backoff))
    }

    fn apply_jitter(&self, duration: Duration) -> Duration {
        if self.jitter_factor <= 0.0 {
            return duration;
        }

        #[allow(clippy::cast_precision_loss)]
        let base_millis = duration.as_millis() as f64;
        let jitter_range = base_millis * self.jitter_factor;
        let jitter: f64 = rand::rng().random_range(-jitter_range..=jitter_range);
        let adjusted_millis = (base_millis + jitter).max(1.0);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let adjusted_u64 = adjusted_millis as u64;
        Duration::from_millis(adjusted_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_case::test_case;

    use crate::domain::trades::Cursor;

    fn request(version: ApiVersion) -> PageRequest {
        PageRequest {
            ticker: "aapl".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 1, 5).unwrap(),
            cursor: Cursor::START,
            version,
            limit: 50_000,
        }
    }

    fn no_jitter(max_attempts: u32, initial: Duration, max: Duration, multiplier: f64) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_backoff: initial,
            max_backoff: max,
            multiplier,
            jitter_factor: 0.0,
        }
    }

    #[test]
    fn v1_endpoint_path() {
        assert_eq!(
            endpoint_path(&request(ApiVersion::V1)),
            "/v1/historic/trades/AAPL/2021-1-5"
        );
    }

    #[test]
    fn v2_endpoint_path() {
        assert_eq!(
            endpoint_path(&request(ApiVersion::V2)),
            "/v2/ticks/stocks/trades/AAPL/2021-01-05"
        );
    }

    #[test_case(StatusCode::OK, ErrorCategory::Success ; "ok")]
    #[test_case(StatusCode::TOO_MANY_REQUESTS, ErrorCategory::RateLimited ; "rate limited")]
    #[test_case(StatusCode::REQUEST_TIMEOUT, ErrorCategory::Retryable ; "request timeout")]
    #[test_case(StatusCode::INTERNAL_SERVER_ERROR, ErrorCategory::Retryable ; "internal error")]
    #[test_case(StatusCode::BAD_GATEWAY, ErrorCategory::Retryable ; "bad gateway")]
    #[test_case(StatusCode::SERVICE_UNAVAILABLE, ErrorCategory::Retryable ; "unavailable")]
    #[test_case(StatusCode::BAD_REQUEST, ErrorCategory::NonRetryable ; "bad request")]
    #[test_case(StatusCode::UNAUTHORIZED, ErrorCategory::NonRetryable ; "unauthorized")]
    #[test_case(StatusCode::NOT_FOUND, ErrorCategory::NonRetryable ; "not found")]
    fn categorize(status: StatusCode, expected: ErrorCategory) {
        assert_eq!(categorize_status(status), expected);
    }

    #[test]
    fn exponential_backoff_increments() {
        let config = no_jitter(5, Duration::from_millis(100), Duration::from_secs(10), 2.0);
        let mut backoff = ExponentialBackoff::new(&config);

        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(400)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(800)));
        // attempt 5 >= max_attempts 5
        assert_eq!(backoff.next_backoff(), None);
    }

    #[test]
    fn exponential_backoff_respects_max() {
        let config = no_jitter(10, Duration::from_secs(1), Duration::from_secs(5), 10.0);
        let mut backoff = ExponentialBackoff::new(&config);

        backoff.next_backoff();
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(5)));
    }

    #[test_case(-1.0 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    #[test_case(f64::INFINITY ; "infinite")]
    fn backoff_multiplier_out_of_range_does_not_panic(multiplier: f64) {
        let config = no_jitter(4, Duration::from_millis(100), Duration::from_secs(1), multiplier);
        let mut backoff = ExponentialBackoff::new(&config);

        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
        let second = backoff.next_backoff().unwrap();
        assert!(second <= Duration::from_secs(1));
        assert!(backoff.next_backoff().is_some());
        assert_eq!(backoff.next_backoff(), None);
    }

    #[test]
    fn jitter_stays_within_range() {
        let config = RetryConfig {
            jitter_factor: 0.1,
            ..no_jitter(100, Duration::from_millis(1000), Duration::from_millis(1000), 1.0)
        };
        let mut backoff = ExponentialBackoff::new(&config);
        for _ in 0..50 {
            let delay = backoff.next_backoff().unwrap();
            assert!(delay >= Duration::from_millis(900));
            assert!(delay <= Duration::from_millis(1100));
        }
    }

    #[test]
    fn empty_api_key_rejected() {
        let err = PolygonHttpTransport::new(PolygonHttpConfig::new("")).unwrap_err();
        assert!(err.message.contains("API key"));
    }

    #[test]
    fn config_debug_redacts_key() {
        let config = PolygonHttpConfig::new("secret-key").with_base_url("http://localhost:1/");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(config.base_url, "http://localhost:1");
    }
}
