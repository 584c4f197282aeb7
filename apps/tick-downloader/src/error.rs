//! Retrieval errors.
//!
//! Every failure ends the tick stream at the next requested element.
//! Nothing in the retrieval core retries.
//!
//! | Variant | Origin | Scope |
//! |---------|--------|-------|
//! | `TransportFailure` | network, non-2xx status | current page |
//! | `MalformedResponse` | body does not match the version's schema | current page |
//! | `UnknownVenue` | market-hours lookup | whole retrieval, before any fetch |
//! | `UnknownExchangeId` | exchange table | current page, no ticks yielded from it |
//! | `CursorStalled` | full page that does not advance the cursor | whole retrieval |

use thiserror::Error;

use crate::application::ports::{TransportError, UnknownExchangeId, VenueLookupError};
use crate::domain::trades::{ApiVersion, Cursor};

/// Errors surfaced by the tick stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    /// Network or HTTP-level failure.
    #[error("transport failure (status {status:?}): {message}")]
    TransportFailure {
        /// HTTP status, if a response arrived.
        status: Option<u16>,
        /// Description.
        message: String,
    },

    /// Body does not match the declared version's schema.
    #[error("malformed {version} response: {reason}")]
    MalformedResponse {
        /// Version the body was decoded as.
        version: ApiVersion,
        /// What did not match.
        reason: String,
    },

    /// No time zone is known for the instrument's venue.
    #[error("unknown venue for {ticker} on market {market}")]
    UnknownVenue {
        /// Market that was looked up.
        market: String,
        /// Ticker that was looked up.
        ticker: String,
    },

    /// Exchange id missing from the tape table.
    #[error("unknown exchange id: {0}")]
    UnknownExchangeId(i32),

    /// A full page did not move the cursor forward.
    #[error("cursor stalled at {cursor}: full page did not advance pagination")]
    CursorStalled {
        /// Cursor the page was requested with.
        cursor: Cursor,
    },
}

impl RetrievalError {
    /// Short label for logs and metric labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TransportFailure { .. } => "transport_failure",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::UnknownVenue { .. } => "unknown_venue",
            Self::UnknownExchangeId(_) => "unknown_exchange_id",
            Self::CursorStalled { .. } => "cursor_stalled",
        }
    }

    /// Build a `MalformedResponse`.
    #[must_use]
    pub fn malformed(version: ApiVersion, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            version,
            reason: reason.into(),
        }
    }
}

impl From<TransportError> for RetrievalError {
    fn from(err: TransportError) -> Self {
        Self::TransportFailure {
            status: err.status,
            message: err.message,
        }
    }
}

impl From<VenueLookupError> for RetrievalError {
    fn from(err: VenueLookupError) -> Self {
        Self::UnknownVenue {
            market: err.market,
            ticker: err.ticker,
        }
    }
}

impl From<UnknownExchangeId> for RetrievalError {
    fn from(err: UnknownExchangeId) -> Self {
        Self::UnknownExchangeId(err.0)
    }
}
