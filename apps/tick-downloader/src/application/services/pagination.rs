//! Pagination State Machine
//!
//! Decides, page by page, whether to request another page and from which
//! cursor.
//!
//! ```text
//!            full page, last ts > cursor
//!          ┌─────────────────────────────┐
//!          ▼                             │
//!   Active { cursor } ───────────────────┘
//!          │
//!          │ zero records, or len < ceiling
//!          ▼
//!      Exhausted
//! ```
//!
//! The next cursor is the last record's raw timestamp, not `+1`, so the
//! first record of the next page can repeat the last one of this page.
//! That duplicate is passed through.

use crate::domain::trades::{Cursor, RawPage, RawTradeRecord};
use crate::error::RetrievalError;

/// Where a retrieval stands between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    /// Another page will be requested from `cursor`.
    Active {
        /// Offset for the next request.
        cursor: Cursor,
    },
    /// No further requests.
    Exhausted,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::start()
    }
}

/// Records to forward from one page and the state after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    /// Records in received order.
    pub records: Vec<RawTradeRecord>,
    /// State for the next step.
    pub next: PaginationState,
}

impl PaginationState {
    /// State at the start of a trade date.
    #[must_use]
    pub const fn start() -> Self {
        Self::Active {
            cursor: Cursor::START,
        }
    }

    /// Cursor for the next request, if any.
    #[must_use]
    pub const fn cursor(&self) -> Option<Cursor> {
        match self {
            Self::Active { cursor } => Some(*cursor),
            Self::Exhausted => None,
        }
    }

    /// Whether pagination is finished.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Apply a fetched page.
    ///
    /// # Errors
    ///
    /// Returns `CursorStalled` for a full page whose last timestamp does not
    /// move past the cursor it was requested with.
    pub fn advance(self, page: RawPage, ceiling: usize) -> Result<PageOutcome, RetrievalError> {
        let Self::Active { cursor } = self else {
            return Ok(PageOutcome {
                records: Vec::new(),
                next: Self::Exhausted,
            });
        };

        let Some(last) = page.last_timestamp() else {
            return Ok(PageOutcome {
                records: Vec::new(),
                next: Self::Exhausted,
            });
        };

        if page.len() < ceiling {
            return Ok(PageOutcome {
                records: page.into_records(),
                next: Self::Exhausted,
            });
        }

        if last <= cursor.value() {
            return Err(RetrievalError::CursorStalled { cursor });
        }

        if let Some(max) = page.max_timestamp()
            && max != last
        {
            tracing::debug!(
                cursor = %cursor,
                last,
                max,
                "Page records are out of order, advancing from last record"
            );
        }

        Ok(PageOutcome {
            records: page.into_records(),
            next: Self::Active {
                cursor: Cursor::new(last),
            },
        })
    }
}
