//! Trade Tick Types
//!
//! Version-neutral trade records produced by the schema adapters, the
//! pagination cursor, and the normalized tick handed to consumers.
//!
//! # Lifecycle
//!
//! ```text
//! wire body ──► RawPage { RawTradeRecord.. } ──► NormalizedTick
//!                    │
//!                    └── last_timestamp() ──► Cursor (next request)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// API Version
// =============================================================================

/// Version of the historical trades API.
///
/// Selects the schema adapter, the page-size ceiling and the wire date format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// `v1/historic/trades` - millisecond timestamps, flat `ticks` array.
    V1,
    /// `v2/ticks/stocks/trades` - nanosecond SIP timestamps, `results` array.
    #[default]
    V2,
}

impl ApiVersion {
    /// Parse version from string. Returns `None` for unknown versions.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "v1" | "1" => Some(Self::V1),
            "v2" | "2" => Some(Self::V2),
            _ => None,
        }
    }

    /// Version label used in logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }

    /// Native unit of this version's trade timestamps.
    #[must_use]
    pub const fn timestamp_unit(&self) -> TimestampUnit {
        match self {
            Self::V1 => TimestampUnit::Milliseconds,
            Self::V2 => TimestampUnit::Nanoseconds,
        }
    }

    /// Format a trade date the way this version's endpoint expects it.
    ///
    /// V1 takes `yyyy-M-d` (no zero padding), V2 takes `yyyy-MM-dd`.
    #[must_use]
    pub fn format_date(&self, date: NaiveDate) -> String {
        match self {
            Self::V1 => date.format("%Y-%-m-%-d").to_string(),
            Self::V2 => date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of a raw epoch timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimestampUnit {
    /// Epoch milliseconds.
    Milliseconds,
    /// Epoch nanoseconds.
    Nanoseconds,
}

// =============================================================================
// Page Limits
// =============================================================================

/// Largest page the V1 endpoint returns.
pub const V1_PAGE_LIMIT: usize = 50_000;

/// Largest page the V2 endpoint returns.
pub const V2_PAGE_LIMIT: usize = 50_000;

/// Per-version page-size ceilings.
///
/// A page shorter than its version's ceiling is the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Ceiling for V1 requests.
    pub v1: usize,
    /// Ceiling for V2 requests.
    pub v2: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            v1: V1_PAGE_LIMIT,
            v2: V2_PAGE_LIMIT,
        }
    }
}

impl PageLimits {
    /// Use the same ceiling for both versions.
    #[must_use]
    pub const fn uniform(limit: usize) -> Self {
        Self {
            v1: limit,
            v2: limit,
        }
    }

    /// Ceiling for the given version.
    #[must_use]
    pub const fn for_version(&self, version: ApiVersion) -> usize {
        match version {
            ApiVersion::V1 => self.v1,
            ApiVersion::V2 => self.v2,
        }
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Pagination cursor.
///
/// Holds the raw timestamp of the last record seen, in the version's native
/// unit. It is sent back to the API as `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Cursor(i64);

impl Cursor {
    /// Start of the trade date.
    pub const START: Self = Self(0);

    /// Create a cursor from a raw timestamp.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw offset value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Raw Records
// =============================================================================

/// A single trade in version-neutral form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTradeRecord {
    timestamp_raw: i64,
    timestamp_unit: TimestampUnit,
    price: Decimal,
    size: i64,
    exchange_id: i32,
    conditions: Vec<i32>,
}

impl RawTradeRecord {
    /// Create a record.
    #[must_use]
    pub const fn new(
        timestamp_raw: i64,
        timestamp_unit: TimestampUnit,
        price: Decimal,
        size: i64,
        exchange_id: i32,
        conditions: Vec<i32>,
    ) -> Self {
        Self {
            timestamp_raw,
            timestamp_unit,
            price,
            size,
            exchange_id,
            conditions,
        }
    }

    /// Raw epoch timestamp.
    #[must_use]
    pub const fn timestamp_raw(&self) -> i64 {
        self.timestamp_raw
    }

    /// Unit of `timestamp_raw`.
    #[must_use]
    pub const fn timestamp_unit(&self) -> TimestampUnit {
        self.timestamp_unit
    }

    /// Trade price.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Trade size.
    #[must_use]
    pub const fn size(&self) -> i64 {
        self.size
    }

    /// Numeric exchange identifier.
    #[must_use]
    pub const fn exchange_id(&self) -> i32 {
        self.exchange_id
    }

    /// Sale condition codes.
    #[must_use]
    pub fn conditions(&self) -> &[i32] {
        &self.conditions
    }
}

/// Envelope fields that differ between versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMetadata {
    /// V1 envelope.
    V1 {
        /// Request status string (e.g. "success").
        status: Option<String>,
        /// Symbol evaluated by the API.
        symbol: Option<String>,
        /// Day evaluated by the API.
        day: Option<String>,
        /// Query latency in milliseconds.
        latency_ms: Option<i64>,
    },
    /// V2 envelope.
    V2 {
        /// Whether the query succeeded.
        success: Option<bool>,
        /// Ticker evaluated by the API.
        ticker: Option<String>,
        /// Number of results the API reports.
        results_count: Option<i64>,
        /// Query latency in milliseconds.
        db_latency_ms: Option<i64>,
    },
}

/// One decoded page of trades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    version: ApiVersion,
    records: Vec<RawTradeRecord>,
    metadata: PageMetadata,
}

impl RawPage {
    /// Create a page.
    #[must_use]
    pub const fn new(
        version: ApiVersion,
        records: Vec<RawTradeRecord>,
        metadata: PageMetadata,
    ) -> Self {
        Self {
            version,
            records,
            metadata,
        }
    }

    /// Version this page was decoded with.
    #[must_use]
    pub const fn version(&self) -> ApiVersion {
        self.version
    }

    /// Records in the order the API returned them.
    #[must_use]
    pub fn records(&self) -> &[RawTradeRecord] {
        &self.records
    }

    /// Take ownership of the records.
    #[must_use]
    pub fn into_records(self) -> Vec<RawTradeRecord> {
        self.records
    }

    /// Version-specific envelope fields.
    #[must_use]
    pub const fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    /// Largest raw timestamp on the page.
    ///
    /// Differs from `last_timestamp` only when the API returns records out
    /// of order. Pagination never advances from this value.
    #[must_use]
    pub fn max_timestamp(&self) -> Option<i64> {
        self.records.iter().map(RawTradeRecord::timestamp_raw).max()
    }

    /// Raw timestamp of the last record.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<i64> {
        self.records.last().map(RawTradeRecord::timestamp_raw)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the page has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// Request
// =============================================================================

/// Asset class of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityType {
    /// Listed equity.
    #[default]
    Equity,
    /// Spot foreign exchange.
    Forex,
    /// Crypto asset.
    Crypto,
    /// Listed option.
    Option,
    /// Listed future.
    Future,
}

impl SecurityType {
    /// Parse security type from string. Unknown values fall back to equity.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "forex" | "fx" => Self::Forex,
            "crypto" => Self::Crypto,
            "option" => Self::Option,
            "future" => Self::Future,
            _ => Self::Equity,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Forex => "forex",
            Self::Crypto => "crypto",
            Self::Option => "option",
            Self::Future => "future",
        }
    }
}

/// Instrument identity used for venue lookup and the request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instrument {
    /// Ticker as the caller spelled it.
    pub ticker: String,
    /// Market identifier (e.g. "usa").
    pub market: String,
    /// Asset class.
    pub security_type: SecurityType,
}

impl Instrument {
    /// Create an instrument.
    #[must_use]
    pub fn new(
        ticker: impl Into<String>,
        market: impl Into<String>,
        security_type: SecurityType,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            market: market.into(),
            security_type,
        }
    }

    /// US-listed equity.
    #[must_use]
    pub fn us_equity(ticker: impl Into<String>) -> Self {
        Self::new(ticker, "usa", SecurityType::Equity)
    }
}

/// Parameters of one retrieval: one instrument, one trade date, one API version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    /// Instrument to download.
    pub instrument: Instrument,
    /// Trade date (UTC).
    pub trade_date: NaiveDate,
    /// API version to page through.
    pub api_version: ApiVersion,
}

impl RetrievalRequest {
    /// Create a request.
    #[must_use]
    pub const fn new(instrument: Instrument, trade_date: NaiveDate, api_version: ApiVersion) -> Self {
        Self {
            instrument,
            trade_date,
            api_version,
        }
    }
}

// =============================================================================
// Normalized Output
// =============================================================================

/// A trade tick normalized to absolute and venue-local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedTick {
    /// Absolute trade time (UTC, millisecond resolution).
    pub instant: DateTime<Utc>,
    /// Trade time in the venue's time zone.
    pub local_time: DateTime<Tz>,
    /// Trade price.
    pub price: Decimal,
    /// Trade size.
    pub quantity: i64,
    /// Tape/venue label.
    pub venue_label: String,
    /// Sale condition codes, comma separated.
    pub sale_condition: String,
}
