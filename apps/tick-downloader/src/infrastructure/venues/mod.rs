//! Market Hours Table
//!
//! Static market to IANA time zone lookup, with per-ticker overrides.
//! The zone is the one a venue reports its data in, which for spot forex
//! feeds is New York rather than UTC.

use std::collections::HashMap;

use chrono_tz::Tz;

use crate::application::ports::{VenueLookupError, VenueTimeZones};
use crate::domain::trades::SecurityType;

const DEFAULT_MARKETS: &[(&str, Tz)] = &[
    ("usa", Tz::America__New_York),
    ("nyse", Tz::America__New_York),
    ("binance", Tz::UTC),
    ("oanda", Tz::America__New_York),
    ("fxcm", Tz::America__New_York),
    ("cme", Tz::America__Chicago),
];

/// `VenueTimeZones` backed by in-memory tables.
///
/// Markets are matched case-insensitively. Overrides are keyed by market and
/// uppercased ticker and win over the market entry.
#[derive(Debug, Clone)]
pub struct MarketHoursTable {
    markets: HashMap<String, Tz>,
    overrides: HashMap<(String, String), Tz>,
}

impl Default for MarketHoursTable {
    fn default() -> Self {
        let markets = DEFAULT_MARKETS
            .iter()
            .map(|&(market, tz)| (market.to_string(), tz))
            .collect();
        Self {
            markets,
            overrides: HashMap::new(),
        }
    }
}

impl MarketHoursTable {
    /// Table with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            markets: HashMap::new(),
            overrides: HashMap::new(),
        }
    }

    /// Add or replace a market entry.
    #[must_use]
    pub fn with_market(mut self, market: &str, tz: Tz) -> Self {
        self.markets.insert(market.to_lowercase(), tz);
        self
    }

    /// Add or replace a per-ticker override.
    #[must_use]
    pub fn with_override(mut self, market: &str, ticker: &str, tz: Tz) -> Self {
        self.overrides
            .insert((market.to_lowercase(), ticker.to_uppercase()), tz);
        self
    }
}

impl VenueTimeZones for MarketHoursTable {
    fn time_zone(
        &self,
        market: &str,
        ticker: &str,
        security_type: SecurityType,
    ) -> Result<Tz, VenueLookupError> {
        let market_key = market.to_lowercase();

        if let Some(tz) = self
            .overrides
            .get(&(market_key.clone(), ticker.to_uppercase()))
        {
            return Ok(*tz);
        }

        self.markets
            .get(&market_key)
            .copied()
            .ok_or_else(|| VenueLookupError {
                market: market.to_string(),
                ticker: ticker.to_string(),
                security_type,
            })
    }
}
