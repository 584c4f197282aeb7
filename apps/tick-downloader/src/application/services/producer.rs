//! Lazy Tick Producer
//!
//! Exposes one retrieval (instrument, trade date, API version) as a finite
//! `Stream` of normalized ticks.
//!
//! # Flow
//!
//! ```text
//! ticks(request)
//!   │ venue time zone (once, before any fetch)
//!   ▼
//! try_unfold(PaginationState) ── fetch ─► decode ─► advance ─► normalize page
//!   │                                                              │
//!   └──────────────────── try_flatten ◄── Vec<NormalizedTick> ◄────┘
//! ```
//!
//! A page is fetched only when the consumer asks for the tick after the
//! last one already yielded, and is normalized completely before any of its
//! ticks are handed out. Dropping the stream stops the retrieval. The first
//! error is yielded and ends the stream.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use chrono_tz::Tz;
use futures::stream::{self, Stream, TryStreamExt};
use tracing::Instrument;

use crate::application::ports::{PageRequest, TapeResolver, TradeTransport, VenueTimeZones};
use crate::application::services::pagination::PaginationState;
use crate::domain::time;
use crate::domain::trades::{
    ApiVersion, NormalizedTick, PageLimits, RawTradeRecord, RetrievalRequest,
};
use crate::error::RetrievalError;
use crate::infrastructure::metrics;
use crate::infrastructure::polygon::codec::decode_page;

/// Stream of normalized ticks for one retrieval.
pub type TickStream = Pin<Box<dyn Stream<Item = Result<NormalizedTick, RetrievalError>> + Send>>;

/// Builds tick streams from shared, read-only collaborators.
pub struct TickProducer<T, Z, R> {
    transport: Arc<T>,
    venues: Arc<Z>,
    tapes: Arc<R>,
    limits: PageLimits,
}

impl<T, Z, R> Clone for TickProducer<T, Z, R> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            venues: Arc::clone(&self.venues),
            tapes: Arc::clone(&self.tapes),
            limits: self.limits,
        }
    }
}

impl<T, Z, R> TickProducer<T, Z, R>
where
    T: TradeTransport + 'static,
    Z: VenueTimeZones + 'static,
    R: TapeResolver + 'static,
{
    /// Create a producer.
    #[must_use]
    pub const fn new(transport: Arc<T>, venues: Arc<Z>, tapes: Arc<R>, limits: PageLimits) -> Self {
        Self {
            transport,
            venues,
            tapes,
            limits,
        }
    }

    /// Stream the ticks of one retrieval.
    ///
    /// Every call starts a fresh retrieval from cursor 0. Nothing is fetched
    /// until the stream is polled.
    #[must_use]
    pub fn ticks(&self, request: RetrievalRequest) -> TickStream {
        let span = tracing::info_span!(
            "retrieval",
            ticker = %request.instrument.ticker,
            date = %request.trade_date,
            version = %request.api_version,
        );

        let instrument = &request.instrument;
        let tz = match self.venues.time_zone(
            &instrument.market,
            &instrument.ticker,
            instrument.security_type,
        ) {
            Ok(tz) => tz,
            Err(e) => {
                let err = RetrievalError::from(e);
                span.in_scope(|| tracing::warn!(error = %err, "Venue lookup failed"));
                metrics::record_retrieval_error(err.kind());
                return Box::pin(stream::once(async move { Err::<NormalizedTick, _>(err) }));
            }
        };

        let version = request.api_version;
        let retrieval = Arc::new(Retrieval {
            transport: Arc::clone(&self.transport),
            tapes: Arc::clone(&self.tapes),
            ticker: request.instrument.ticker,
            date: request.trade_date,
            version: request.api_version,
            ceiling: self.limits.for_version(request.api_version),
            tz,
        });

        let pages = stream::try_unfold(Progress::default(), move |progress| {
            let retrieval = Arc::clone(&retrieval);
            let span = span.clone();
            async move { retrieval.next_page(progress).await }.instrument(span)
        });

        Box::pin(
            pages
                .map_ok(|ticks| stream::iter(ticks.into_iter().map(Ok::<_, RetrievalError>)))
                .try_flatten()
                .inspect_ok(move |_| metrics::record_tick_emitted(version)),
        )
    }

    /// Drain a retrieval into memory.
    ///
    /// # Errors
    ///
    /// Returns the first error the stream yields. Ticks yielded before it
    /// are discarded.
    pub async fn collect_ticks(
        &self,
        request: RetrievalRequest,
    ) -> Result<Vec<NormalizedTick>, RetrievalError> {
        self.ticks(request).try_collect().await
    }
}

/// Per-stream counters threaded through `try_unfold`.
#[derive(Debug, Clone, Copy, Default)]
struct Progress {
    state: PaginationState,
    pages: u64,
    ticks: u64,
}

/// Immutable context of one retrieval.
struct Retrieval<T, R> {
    transport: Arc<T>,
    tapes: Arc<R>,
    ticker: String,
    date: NaiveDate,
    version: ApiVersion,
    ceiling: usize,
    tz: Tz,
}

impl<T: TradeTransport, R: TapeResolver> Retrieval<T, R> {
    async fn next_page(
        &self,
        progress: Progress,
    ) -> Result<Option<(Vec<NormalizedTick>, Progress)>, RetrievalError> {
        let result = self.fetch_next(progress).await;
        if let Err(ref e) = result {
            tracing::warn!(
                error = %e,
                kind = e.kind(),
                pages = progress.pages,
                ticks = progress.ticks,
                "Retrieval failed"
            );
            metrics::record_retrieval_error(e.kind());
        }
        result
    }

    async fn fetch_next(
        &self,
        mut progress: Progress,
    ) -> Result<Option<(Vec<NormalizedTick>, Progress)>, RetrievalError> {
        let Some(cursor) = progress.state.cursor() else {
            tracing::info!(
                pages = progress.pages,
                ticks = progress.ticks,
                "Retrieval complete"
            );
            return Ok(None);
        };

        let request = PageRequest {
            ticker: self.ticker.clone(),
            date: self.date,
            cursor,
            version: self.version,
            limit: self.ceiling,
        };

        let started = Instant::now();
        let response = self.transport.fetch(&request).await?;
        metrics::record_page_fetch_duration(self.version, started.elapsed());

        let page = decode_page(self.version, &response)?;
        let records = page.len();
        metrics::record_page_fetched(self.version);

        let outcome = progress.state.advance(page, self.ceiling)?;
        let ticks = self.normalize_page(&outcome.records)?;

        tracing::debug!(cursor = %cursor, records, "Page fetched");

        progress.state = outcome.next;
        progress.pages += 1;
        progress.ticks += ticks.len() as u64;

        Ok(Some((ticks, progress)))
    }

    fn normalize_page(
        &self,
        records: &[RawTradeRecord],
    ) -> Result<Vec<NormalizedTick>, RetrievalError> {
        records
            .iter()
            .map(|record| self.normalize(record))
            .collect()
    }

    fn normalize(&self, record: &RawTradeRecord) -> Result<NormalizedTick, RetrievalError> {
        let instant = time::to_instant(record.timestamp_raw(), record.timestamp_unit())
            .map_err(|e| RetrievalError::malformed(self.version, e.to_string()))?;
        let venue_label = self.tapes.resolve_tape(record.exchange_id())?;

        Ok(NormalizedTick {
            instant,
            local_time: time::localize(instant, self.tz),
            price: record.price(),
            quantity: record.size(),
            venue_label,
            sale_condition: sale_condition(record.conditions()),
        })
    }
}

/// Condition codes joined with commas, empty when there are none.
fn sale_condition(conditions: &[i32]) -> String {
    conditions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
