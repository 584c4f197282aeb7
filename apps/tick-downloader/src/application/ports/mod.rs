//! Port Interfaces
//!
//! Contracts for the collaborators the retrieval engine depends on.
//! Infrastructure adapters implement them; tests substitute in-memory fakes.
//!
//! ## Driven Ports (Outbound)
//!
//! - `TradeTransport`: one blocking-per-call page fetch from the trades API
//! - `VenueTimeZones`: market-hours lookup of a venue's time zone
//! - `TapeResolver`: exchange id to tape label mapping

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::domain::trades::{ApiVersion, Cursor, SecurityType};

// =============================================================================
// Transport
// =============================================================================

/// Parameters of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Ticker as given by the caller.
    pub ticker: String,
    /// Trade date.
    pub date: NaiveDate,
    /// Offset to resume from.
    pub cursor: Cursor,
    /// API version to call.
    pub version: ApiVersion,
    /// Requested page size.
    pub limit: usize,
}

impl PageRequest {
    /// Trade date in the version's wire format.
    #[must_use]
    pub fn wire_date(&self) -> String {
        self.version.format_date(self.date)
    }
}

/// Response body and final HTTP status of a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 OK with the given body.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Network-level failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    /// HTTP status, if the failure happened after a response arrived.
    pub status: Option<u16>,
    /// Description.
    pub message: String,
}

impl TransportError {
    /// Failure without a status code (connect, timeout, TLS).
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

/// Fetches one page of historical trades.
///
/// Authentication, retry/backoff and timeouts are the implementation's
/// concern. The retrieval engine calls `fetch` at most once at a time per
/// stream and never retries.
#[async_trait]
pub trait TradeTransport: Send + Sync {
    /// Fetch the page starting at `request.cursor`.
    async fn fetch(&self, request: &PageRequest) -> Result<RawResponse, TransportError>;
}

// =============================================================================
// Venue Time Zones
// =============================================================================

/// The market-hours lookup does not know the venue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no time zone for {ticker} on market {market} ({security_type:?})")]
pub struct VenueLookupError {
    /// Market that was looked up.
    pub market: String,
    /// Ticker that was looked up.
    pub ticker: String,
    /// Asset class that was looked up.
    pub security_type: SecurityType,
}

/// Resolves the time zone a venue reports its data in.
pub trait VenueTimeZones: Send + Sync {
    /// Time zone for the instrument's venue.
    ///
    /// # Errors
    ///
    /// Returns `VenueLookupError` if the venue is unknown.
    fn time_zone(
        &self,
        market: &str,
        ticker: &str,
        security_type: SecurityType,
    ) -> Result<Tz, VenueLookupError>;
}

// =============================================================================
// Tape Resolver
// =============================================================================

/// The exchange table has no entry for the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown exchange id: {0}")]
pub struct UnknownExchangeId(pub i32);

/// Maps exchange identifiers to tape/venue labels.
pub trait TapeResolver: Send + Sync {
    /// Label for the exchange id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownExchangeId` for ids missing from the table.
    fn resolve_tape(&self, exchange_id: i32) -> Result<String, UnknownExchangeId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_response_success_range() {
        assert!(RawResponse::ok("{}").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(199, "").is_success());
        assert!(!RawResponse::new(404, "").is_success());
        assert!(!RawResponse::new(500, "").is_success());
    }

    #[test]
    fn page_request_wire_date_follows_version() {
        let mut request = PageRequest {
            ticker: "aapl".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 3, 9).unwrap(),
            cursor: Cursor::START,
            version: ApiVersion::V1,
            limit: 50_000,
        };
        assert_eq!(request.wire_date(), "2021-3-9");
        request.version = ApiVersion::V2;
        assert_eq!(request.wire_date(), "2021-03-09");
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::network("connection reset");
        assert_eq!(err.to_string(), "transport error: connection reset");
        assert_eq!(err.status, None);
    }
}
