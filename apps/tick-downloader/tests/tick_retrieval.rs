//! Tick Retrieval Integration Tests
//!
//! Drives `TickProducer` end to end with in-memory transports: pagination,
//! termination, cursor values, normalization across API versions and
//! error propagation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use futures::StreamExt;
use serde_json::json;

use tick_downloader::{
    ApiVersion, Cursor, ExchangeTable, Instrument, MarketHoursTable, PageLimits, PageRequest,
    RawResponse, RetrievalError, RetrievalRequest, SecurityType, TickProducer, TradeTransport,
    TransportError,
};

// =============================================================================
// Fakes
// =============================================================================

/// Replays canned responses and records every request.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<RawResponse>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<RawResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn cursors(&self) -> Vec<i64> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.cursor.value())
            .collect()
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TradeTransport for ScriptedTransport {
    async fn fetch(&self, request: &PageRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::network("no scripted response left"))
    }
}

/// Serves an endless day: every request gets a full V2 page past the cursor.
struct EndlessTransport {
    page_size: i64,
    calls: AtomicUsize,
}

#[async_trait]
impl TradeTransport for EndlessTransport {
    async fn fetch(&self, request: &PageRequest) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let start = request.cursor.value();
        let stamps: Vec<i64> = (1..=self.page_size).map(|i| start + i * 1_000_000).collect();
        Ok(RawResponse::ok(v2_body(&stamps, 10)))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn v2_body(stamps: &[i64], exchange: i32) -> String {
    let results: Vec<_> = stamps
        .iter()
        .map(|t| json!({"t": t, "x": exchange, "s": 1, "p": 1.5, "c": [37]}))
        .collect();
    json!({"results": results, "success": true, "results_count": stamps.len()}).to_string()
}

fn v1_body(stamps: &[i64], exchange: i32) -> String {
    let ticks: Vec<_> = stamps
        .iter()
        .map(|t| json!({"c1": 0, "c2": 0, "c3": 0, "c4": 0, "e": exchange, "p": 1.5, "s": 1, "t": t}))
        .collect();
    json!({"status": "success", "symbol": "AAPL", "ticks": ticks, "type": "trades"}).to_string()
}

fn producer<T: TradeTransport + 'static>(
    transport: Arc<T>,
    ceiling: usize,
) -> TickProducer<T, MarketHoursTable, ExchangeTable> {
    TickProducer::new(
        transport,
        Arc::new(MarketHoursTable::default()),
        Arc::new(ExchangeTable::default()),
        PageLimits::uniform(ceiling),
    )
}

fn trade_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 5).unwrap()
}

fn equity(version: ApiVersion) -> RetrievalRequest {
    RetrievalRequest::new(Instrument::us_equity("AAPL"), trade_date(), version)
}

fn millis(ms: i64) -> DateTime<chrono::Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn full_page_then_single_record_page_yields_four_ticks() {
    let transport = ScriptedTransport::new(vec![
        RawResponse::ok(v2_body(&[100_000_000, 200_000_000, 200_000_000], 19)),
        RawResponse::ok(v2_body(&[250_000_000], 19)),
    ]);
    let request = RetrievalRequest::new(
        Instrument::new("ETHUSDT", "binance", SecurityType::Crypto),
        trade_date(),
        ApiVersion::V2,
    );

    let ticks = producer(Arc::clone(&transport), 3)
        .collect_ticks(request)
        .await
        .unwrap();

    assert_eq!(ticks.len(), 4);
    let instants: Vec<_> = ticks.iter().map(|t| t.instant).collect();
    assert_eq!(
        instants,
        vec![millis(100), millis(200), millis(200), millis(250)]
    );
    assert!(ticks.iter().all(|t| t.local_time.timezone() == Tz::UTC));
    assert!(ticks.iter().all(|t| t.venue_label == "Z"));
    assert_eq!(transport.cursors(), vec![0, 200_000_000]);
}

#[tokio::test]
async fn short_page_ends_without_another_fetch() {
    let transport = ScriptedTransport::new(vec![RawResponse::ok(v2_body(
        &[1_000_000, 2_000_000],
        10,
    ))]);

    let ticks = producer(Arc::clone(&transport), 3)
        .collect_ticks(equity(ApiVersion::V2))
        .await
        .unwrap();

    assert_eq!(ticks.len(), 2);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn empty_page_ends_cleanly() {
    let transport = ScriptedTransport::new(vec![
        RawResponse::ok(v2_body(&[1_000_000, 2_000_000, 3_000_000], 10)),
        RawResponse::ok(r#"{"results":[],"success":true}"#),
    ]);

    let mut stream = producer(Arc::clone(&transport), 3).ticks(equity(ApiVersion::V2));
    let mut count = 0;
    while let Some(tick) = stream.next().await {
        tick.unwrap();
        count += 1;
    }

    assert_eq!(count, 3);
    assert_eq!(transport.cursors(), vec![0, 3_000_000]);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn v1_cursor_is_last_millisecond_timestamp() {
    let transport = ScriptedTransport::new(vec![
        RawResponse::ok(v1_body(&[1_609_855_200_000, 1_609_855_200_005], 12)),
        RawResponse::ok(v1_body(&[1_609_855_200_009, 1_609_855_200_007], 12)),
        RawResponse::ok(r#"{"status":"success","ticks":null}"#),
    ]);

    let ticks = producer(Arc::clone(&transport), 2)
        .collect_ticks(equity(ApiVersion::V1))
        .await
        .unwrap();

    assert_eq!(ticks.len(), 4);
    // last record, not the largest
    assert_eq!(
        transport.cursors(),
        vec![0, 1_609_855_200_005, 1_609_855_200_007]
    );
    let requests = transport.requests.lock().unwrap();
    assert!(requests.iter().all(|r| r.wire_date() == "2021-1-5"));
    assert!(requests.iter().all(|r| r.limit == 2));
}

#[tokio::test]
async fn boundary_duplicate_is_passed_through() {
    let transport = ScriptedTransport::new(vec![
        RawResponse::ok(v2_body(&[1_000_000, 2_000_000], 10)),
        RawResponse::ok(v2_body(&[2_000_000], 10)),
    ]);

    let ticks = producer(transport, 2)
        .collect_ticks(equity(ApiVersion::V2))
        .await
        .unwrap();

    assert_eq!(ticks.len(), 3);
    assert_eq!(ticks[1].instant, ticks[2].instant);
}

#[tokio::test]
async fn full_page_that_repeats_cursor_stalls() {
    let transport = ScriptedTransport::new(vec![
        RawResponse::ok(v2_body(&[1_000_000, 2_000_000], 10)),
        RawResponse::ok(v2_body(&[2_000_000, 2_000_000], 10)),
    ]);

    let mut stream = producer(Arc::clone(&transport), 2).ticks(equity(ApiVersion::V2));
    assert!(stream.next().await.unwrap().is_ok());
    assert!(stream.next().await.unwrap().is_ok());
    assert_eq!(
        stream.next().await.unwrap(),
        Err(RetrievalError::CursorStalled {
            cursor: Cursor::new(2_000_000)
        })
    );
    assert!(stream.next().await.is_none());
    assert_eq!(transport.calls(), 2);
}

// =============================================================================
// Normalization
// =============================================================================

#[tokio::test]
async fn same_trade_in_both_versions_gives_same_tick() {
    let v1 = ScriptedTransport::new(vec![RawResponse::ok(v1_body(&[1_609_459_200_000], 10))]);
    let v2 = ScriptedTransport::new(vec![RawResponse::ok(
        json!({"results": [{"t": 1_609_459_200_000_000_000_i64, "x": 10, "s": 1, "p": 1.5}]})
            .to_string(),
    )]);

    let a = producer(v1, 3).collect_ticks(equity(ApiVersion::V1)).await.unwrap();
    let b = producer(v2, 3).collect_ticks(equity(ApiVersion::V2)).await.unwrap();

    assert_eq!(a, b);
    assert_eq!(a[0].instant, millis(1_609_459_200_000));
    assert_eq!(a[0].local_time.timezone(), Tz::America__New_York);
    assert_eq!(a[0].venue_label, "N");
}

#[tokio::test]
async fn nanoseconds_truncate_to_milliseconds() {
    let transport = ScriptedTransport::new(vec![RawResponse::ok(v2_body(
        &[1_609_459_200_123_999_999],
        10,
    ))]);

    let ticks = producer(transport, 3)
        .collect_ticks(equity(ApiVersion::V2))
        .await
        .unwrap();

    assert_eq!(ticks[0].instant, millis(1_609_459_200_123));
    assert_eq!(ticks[0].sale_condition, "37");
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn unknown_exchange_fails_whole_page() {
    let transport = ScriptedTransport::new(vec![
        RawResponse::ok(v2_body(&[1_000_000, 2_000_000], 10)),
        RawResponse::ok(
            json!({"results": [
                {"t": 3_000_000, "x": 10, "s": 1, "p": 1.5},
                {"t": 4_000_000, "x": 999, "s": 1, "p": 1.5}
            ]})
            .to_string(),
        ),
    ]);

    let items: Vec<_> = producer(transport, 2)
        .ticks(equity(ApiVersion::V2))
        .collect()
        .await;

    // two ticks from page one, then the error; nothing from page two
    assert_eq!(items.len(), 3);
    assert!(items[0].is_ok() && items[1].is_ok());
    assert_eq!(items[2], Err(RetrievalError::UnknownExchangeId(999)));
}

#[tokio::test]
async fn unknown_venue_issues_no_fetch() {
    let transport = ScriptedTransport::new(vec![]);
    let request = RetrievalRequest::new(
        Instrument::new("XYZ", "mars", SecurityType::Equity),
        trade_date(),
        ApiVersion::V2,
    );

    let mut stream = producer(Arc::clone(&transport), 3).ticks(request);
    assert_eq!(
        stream.next().await.unwrap(),
        Err(RetrievalError::UnknownVenue {
            market: "mars".to_string(),
            ticker: "XYZ".to_string(),
        })
    );
    assert!(stream.next().await.is_none());
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn non_success_status_is_transport_failure() {
    let transport = ScriptedTransport::new(vec![RawResponse::new(503, "busy")]);

    let err = producer(transport, 3)
        .collect_ticks(equity(ApiVersion::V1))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RetrievalError::TransportFailure {
            status: Some(503),
            message: "busy".to_string(),
        }
    );
}

#[tokio::test]
async fn transport_error_passes_through() {
    let transport = ScriptedTransport::new(vec![]);

    let err = producer(transport, 3)
        .collect_ticks(equity(ApiVersion::V2))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RetrievalError::TransportFailure { status: None, .. }
    ));
}

// =============================================================================
// Laziness
// =============================================================================

#[tokio::test]
async fn abandoning_stream_stops_fetching() {
    let transport = Arc::new(EndlessTransport {
        page_size: 3,
        calls: AtomicUsize::new(0),
    });

    let taken: Vec<_> = producer(Arc::clone(&transport), 3)
        .ticks(equity(ApiVersion::V2))
        .take(4)
        .collect()
        .await;

    assert_eq!(taken.len(), 4);
    assert!(taken.iter().all(Result::is_ok));
    // 3 ticks from the first page, 1 from the second
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn restarting_fetches_from_cursor_zero() {
    let transport = ScriptedTransport::new(vec![
        RawResponse::ok(v2_body(&[1_000_000, 2_000_000], 10)),
        RawResponse::ok(v2_body(&[1_000_000], 10)),
    ]);
    let producer = producer(Arc::clone(&transport), 2);

    let mut first = producer.ticks(equity(ApiVersion::V2));
    assert!(first.next().await.unwrap().is_ok());
    drop(first);

    let mut second = producer.ticks(equity(ApiVersion::V2));
    assert!(second.next().await.unwrap().is_ok());

    assert_eq!(transport.cursors(), vec![0, 0]);
}
