//! Historical Trades Wire Types
//!
//! Envelope and record types for the two versions of the historical trades
//! endpoint. They mirror the JSON schemas and carry no logic.
//!
//! # V1 (`/v1/historic/trades/{symbol}/{date}`)
//!
//! ```json
//! {
//!   "day": "2021-01-05",
//!   "map": {"c1": "condition1", "e": "exchange", "t": "timestamp"},
//!   "msLatency": 8,
//!   "status": "success",
//!   "symbol": "AAPL",
//!   "ticks": [
//!     {"c1": 14, "c2": 12, "c3": 0, "c4": 0, "e": 12, "p": 131.0, "s": 100, "t": 1609840800012}
//!   ],
//!   "type": "trades"
//! }
//! ```
//!
//! # V2 (`/v2/ticks/stocks/trades/{ticker}/{date}`)
//!
//! ```json
//! {
//!   "results": [
//!     {"t": 1609840800012345678, "y": 1609840800012000000, "q": 2991, "i": "52983525029461",
//!      "x": 12, "s": 100, "c": [14, 41], "p": 131.0, "z": 3}
//!   ],
//!   "success": true,
//!   "map": {},
//!   "ticker": "AAPL",
//!   "results_count": 1,
//!   "db_latency": 12
//! }
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// V1
// =============================================================================

/// V1 historic trades envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricTradesV1 {
    /// Day evaluated by the API.
    #[serde(default)]
    pub day: Option<String>,

    /// Map of short keys to descriptive names.
    #[serde(default)]
    pub map: Option<serde_json::Value>,

    /// Query latency in milliseconds.
    #[serde(default, rename = "msLatency", alias = "latency")]
    pub latency: Option<i64>,

    /// Response status.
    #[serde(default)]
    pub status: Option<String>,

    /// Symbol evaluated by the API.
    #[serde(default)]
    pub symbol: Option<String>,

    /// Trades. `null` or absent when there is nothing left.
    #[serde(default)]
    pub ticks: Option<Vec<TradeV1>>,

    /// Tick type (always "trades").
    #[serde(default, rename = "type")]
    pub tick_type: Option<String>,
}

/// V1 trade record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeV1 {
    /// Condition 1.
    #[serde(default)]
    pub c1: i32,

    /// Condition 2.
    #[serde(default)]
    pub c2: i32,

    /// Condition 3.
    #[serde(default)]
    pub c3: i32,

    /// Condition 4.
    #[serde(default)]
    pub c4: i32,

    /// Exchange id.
    #[serde(rename = "e")]
    pub exchange: i32,

    /// Price.
    #[serde(rename = "p")]
    pub price: Decimal,

    /// Size.
    #[serde(rename = "s")]
    pub size: i64,

    /// Epoch milliseconds.
    #[serde(rename = "t")]
    pub timestamp: i64,
}

impl TradeV1 {
    /// Non-zero condition codes in `c1..c4` order.
    #[must_use]
    pub fn conditions(&self) -> Vec<i32> {
        [self.c1, self.c2, self.c3, self.c4]
            .into_iter()
            .filter(|c| *c != 0)
            .collect()
    }
}

// =============================================================================
// V2
// =============================================================================

/// V2 historic trades envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricTradesV2 {
    /// Trades. Absent, `null` or empty when there is nothing left.
    #[serde(default)]
    pub results: Option<Vec<TradeV2>>,

    /// Whether the query executed successfully.
    #[serde(default)]
    pub success: Option<bool>,

    /// Map of short keys to descriptive names.
    #[serde(default)]
    pub map: Option<serde_json::Value>,

    /// Ticker evaluated by the API.
    #[serde(default)]
    pub ticker: Option<String>,

    /// Number of results in this response.
    #[serde(default)]
    pub results_count: Option<i64>,

    /// Query latency in milliseconds.
    #[serde(default)]
    pub db_latency: Option<i64>,
}

/// V2 trade record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeV2 {
    /// SIP timestamp, epoch nanoseconds.
    #[serde(rename = "t")]
    pub sip_timestamp: i64,

    /// Participant/exchange timestamp, epoch nanoseconds.
    #[serde(default, rename = "y", skip_serializing_if = "Option::is_none")]
    pub participant_timestamp: Option<i64>,

    /// Trade reporting facility timestamp, epoch nanoseconds.
    #[serde(default, rename = "f", skip_serializing_if = "Option::is_none")]
    pub trf_timestamp: Option<i64>,

    /// Sequence number.
    #[serde(default, rename = "q", skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,

    /// Trade id.
    #[serde(default, rename = "i", skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<String>,

    /// Exchange id.
    #[serde(rename = "x")]
    pub exchange: i32,

    /// Size.
    #[serde(rename = "s")]
    pub size: i64,

    /// Price.
    #[serde(rename = "p")]
    pub price: Decimal,

    /// Sale conditions.
    #[serde(default, rename = "c")]
    pub conditions: Option<Vec<i32>>,

    /// Tape (1, 2 = CTA, 3 = UTP).
    #[serde(default, rename = "z", skip_serializing_if = "Option::is_none")]
    pub tape: Option<i32>,
}
