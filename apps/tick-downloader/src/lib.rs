#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call,
        clippy::cast_possible_wrap
    )
)]

//! Tick Downloader - Historical Trade Retrieval
//!
//! Pages through a versioned historical trades API for one instrument and
//! one trade date, and exposes the result as a lazy stream of ticks
//! normalized to absolute and venue-local time.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Trade types and time normalization
//!   - `trades`: Raw records, pages, cursor, normalized ticks
//!   - `time`: ms/ns epoch conversion and time zone localization
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Transport, venue time zone and tape resolver interfaces
//!   - `services`: Pagination state machine and lazy tick producer
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `polygon`: V1/V2 wire types, schema adapters, HTTP transport
//!   - `exchanges`: Exchange id to tape table
//!   - `venues`: Market to time zone table
//!   - `config`: Environment configuration
//!   - `metrics`, `telemetry`: Observability
//!
//! # Data Flow
//!
//! ```text
//! RetrievalRequest
//!       │
//!       ▼
//! TickProducer ── PageRequest(cursor) ──► TradeTransport ──► RawResponse
//!       ▲                                                        │
//!       │                                             decode_page (V1 | V2)
//!       │                                                        ▼
//! NormalizedTick ◄── normalize (time, tape) ◄── PaginationState ◄── RawPage
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Trade types with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// Retrieval errors.
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::trades::{
    ApiVersion, Cursor, Instrument, NormalizedTick, PageLimits, PageMetadata, RawPage,
    RawTradeRecord, RetrievalRequest, SecurityType, TimestampUnit, V1_PAGE_LIMIT, V2_PAGE_LIMIT,
};

// Ports
pub use application::ports::{
    PageRequest, RawResponse, TapeResolver, TradeTransport, TransportError, UnknownExchangeId,
    VenueLookupError, VenueTimeZones,
};

// Services
pub use application::services::{PageOutcome, PaginationState, TickProducer, TickStream};

// Errors
pub use error::RetrievalError;

// Infrastructure config
pub use infrastructure::config::{ConfigError, Credentials, DownloaderConfig, HttpSettings};

// Default adapters
pub use infrastructure::exchanges::{ExchangeInfo, ExchangeTable, ExchangeTableError};
pub use infrastructure::polygon::{PolygonHttpConfig, PolygonHttpTransport, RetryConfig};
pub use infrastructure::venues::MarketHoursTable;

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
