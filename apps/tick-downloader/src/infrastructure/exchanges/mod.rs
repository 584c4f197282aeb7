//! Exchange Table
//!
//! Maps numeric exchange ids reported on trades to tape labels.
//!
//! The built-in table covers the legacy US equity exchange ids. A table can
//! also be loaded from exchange metadata JSON:
//!
//! ```json
//! [
//!   {"id": 12, "infrastructure": "exchange", "market": "equities",
//!    "mic": "XNAS", "name": "Nasdaq", "tape": "T", "code": "Q"}
//! ]
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::application::ports::{TapeResolver, UnknownExchangeId};

/// One exchange entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeInfo {
    /// Numeric id used on trades.
    pub id: i32,
    /// Tape label emitted on ticks.
    pub tape: String,
    /// ISO 10383 market identifier code, if the venue has one.
    pub mic: Option<String>,
    /// Display name.
    pub name: String,
}

/// Legacy US equity exchange ids: `(id, tape, mic, name)`.
const LEGACY_EQUITY_EXCHANGES: &[(i32, &str, Option<&str>, &str)] = &[
    (1, "A", Some("XASE"), "NYSE American"),
    (2, "B", Some("XBOS"), "Nasdaq BX"),
    (3, "C", Some("XCIS"), "NYSE National"),
    (4, "D", Some("XADF"), "FINRA Alternative Display Facility"),
    (5, "E", None, "Market Independent"),
    (6, "I", Some("XISE"), "Nasdaq ISE"),
    (7, "J", Some("EDGA"), "Cboe EDGA"),
    (8, "K", Some("EDGX"), "Cboe EDGX"),
    (9, "M", Some("XCHI"), "NYSE Chicago"),
    (10, "N", Some("XNYS"), "New York Stock Exchange"),
    (11, "P", Some("ARCX"), "NYSE Arca"),
    (12, "T", Some("XNAS"), "Nasdaq"),
    (13, "S", None, "Consolidated Tape System"),
    (15, "V", Some("IEXG"), "Investors Exchange"),
    (16, "W", Some("CBSX"), "Cboe Stock Exchange"),
    (17, "X", Some("XPHL"), "Nasdaq PSX"),
    (18, "Y", Some("BATY"), "Cboe BYX"),
    (19, "Z", Some("BATS"), "Cboe BZX"),
];

/// Error loading an exchange table.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeTableError {
    /// Body is not a JSON array of exchange entries.
    #[error("invalid exchange metadata: {0}")]
    Parse(#[from] serde_json::Error),

    /// The same id appears twice.
    #[error("duplicate exchange id: {0}")]
    DuplicateId(i32),
}

/// Exchange metadata entry as published by the reference endpoint.
///
/// `infrastructure` and `market` are accepted and ignored.
#[derive(Debug, Deserialize)]
struct ExchangeRecord {
    id: i32,
    #[serde(default)]
    mic: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tape: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Static exchange id to tape lookup.
#[derive(Debug, Clone)]
pub struct ExchangeTable {
    by_id: HashMap<i32, ExchangeInfo>,
}

impl Default for ExchangeTable {
    fn default() -> Self {
        Self::legacy_equities()
    }
}

impl ExchangeTable {
    /// Built-in table of legacy US equity exchange ids.
    #[must_use]
    pub fn legacy_equities() -> Self {
        let by_id = LEGACY_EQUITY_EXCHANGES
            .iter()
            .map(|&(id, tape, mic, name)| {
                (
                    id,
                    ExchangeInfo {
                        id,
                        tape: tape.to_string(),
                        mic: mic.map(str::to_string),
                        name: name.to_string(),
                    },
                )
            })
            .collect();
        Self { by_id }
    }

    /// Build a table from exchange metadata JSON.
    ///
    /// The label is the entry's `tape`, falling back to `code`. Entries with
    /// neither are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not parse or an id repeats.
    pub fn from_json(body: &[u8]) -> Result<Self, ExchangeTableError> {
        let records: Vec<ExchangeRecord> = serde_json::from_slice(body)?;
        let mut by_id = HashMap::with_capacity(records.len());

        for record in records {
            let label = record
                .tape
                .filter(|t| !t.is_empty())
                .or_else(|| record.code.filter(|c| !c.is_empty()));

            let Some(tape) = label else {
                tracing::debug!(id = record.id, "Exchange entry has no tape or code, skipping");
                continue;
            };

            let info = ExchangeInfo {
                id: record.id,
                tape,
                mic: record.mic,
                name: record.name.unwrap_or_default(),
            };

            if by_id.insert(record.id, info).is_some() {
                return Err(ExchangeTableError::DuplicateId(record.id));
            }
        }

        Ok(Self { by_id })
    }

    /// Entry for an id.
    #[must_use]
    pub fn get(&self, exchange_id: i32) -> Option<&ExchangeInfo> {
        self.by_id.get(&exchange_id)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl TapeResolver for ExchangeTable {
    fn resolve_tape(&self, exchange_id: i32) -> Result<String, UnknownExchangeId> {
        self.get(exchange_id)
            .map(|info| info.tape.clone())
            .ok_or(UnknownExchangeId(exchange_id))
    }
}
