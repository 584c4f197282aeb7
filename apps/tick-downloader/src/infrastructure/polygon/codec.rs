//! Schema Adapters
//!
//! Decode a raw historical trades response into a version-neutral `RawPage`.
//! Each version has its own pure decoder; `decode_page` picks one by
//! `ApiVersion` after checking the HTTP status.
//!
//! - **V1**: flat `ticks` array, millisecond timestamps, conditions `c1..c4`
//! - **V2**: `results` array with short keys, nanosecond SIP timestamps
//!
//! An absent or `null` trade array is an empty page, which the pagination
//! loop treats as normal completion.

use crate::application::ports::RawResponse;
use crate::domain::trades::{ApiVersion, PageMetadata, RawPage, RawTradeRecord, TimestampUnit};
use crate::error::RetrievalError;

use super::messages::{HistoricTradesV1, HistoricTradesV2};

/// Longest body excerpt carried in a transport failure message.
const BODY_EXCERPT_LEN: usize = 200;

/// Decode a response for the given version.
///
/// # Errors
///
/// - `TransportFailure` for non-2xx statuses. The body is not parsed.
/// - `MalformedResponse` if the body does not match the version's schema.
pub fn decode_page(version: ApiVersion, response: &RawResponse) -> Result<RawPage, RetrievalError> {
    if !response.is_success() {
        return Err(RetrievalError::TransportFailure {
            status: Some(response.status),
            message: body_excerpt(&response.body),
        });
    }

    match version {
        ApiVersion::V1 => decode_v1(&response.body),
        ApiVersion::V2 => decode_v2(&response.body),
    }
}

/// Decode a V1 body.
///
/// # Errors
///
/// Returns `MalformedResponse` if the body is not a V1 envelope.
pub fn decode_v1(body: &[u8]) -> Result<RawPage, RetrievalError> {
    let envelope: HistoricTradesV1 = serde_json::from_slice(body)
        .map_err(|e| RetrievalError::malformed(ApiVersion::V1, e.to_string()))?;

    let records = envelope
        .ticks
        .unwrap_or_default()
        .into_iter()
        .map(|trade| {
            let conditions = trade.conditions();
            RawTradeRecord::new(
                trade.timestamp,
                TimestampUnit::Milliseconds,
                trade.price,
                trade.size,
                trade.exchange,
                conditions,
            )
        })
        .collect();

    let metadata = PageMetadata::V1 {
        status: envelope.status,
        symbol: envelope.symbol,
        day: envelope.day,
        latency_ms: envelope.latency,
    };

    Ok(RawPage::new(ApiVersion::V1, records, metadata))
}

/// Decode a V2 body.
///
/// # Errors
///
/// Returns `MalformedResponse` if the body is not a V2 envelope.
pub fn decode_v2(body: &[u8]) -> Result<RawPage, RetrievalError> {
    let envelope: HistoricTradesV2 = serde_json::from_slice(body)
        .map_err(|e| RetrievalError::malformed(ApiVersion::V2, e.to_string()))?;

    if envelope.success == Some(false) {
        tracing::warn!(
            ticker = envelope.ticker.as_deref().unwrap_or_default(),
            "v2 response reported success=false"
        );
    }

    let records = envelope
        .results
        .unwrap_or_default()
        .into_iter()
        .map(|trade| {
            RawTradeRecord::new(
                trade.sip_timestamp,
                TimestampUnit::Nanoseconds,
                trade.price,
                trade.size,
                trade.exchange,
                trade.conditions.unwrap_or_default(),
            )
        })
        .collect();

    let metadata = PageMetadata::V2 {
        success: envelope.success,
        ticker: envelope.ticker,
        results_count: envelope.results_count,
        db_latency_ms: envelope.db_latency,
    };

    Ok(RawPage::new(ApiVersion::V2, records, metadata))
}

fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(BODY_EXCERPT_LEN).collect()
}
