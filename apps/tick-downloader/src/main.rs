//! Tick Downloader Binary
//!
//! Downloads one trade date of ticks for one instrument and writes them to
//! stdout as JSON lines. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! tick-downloader <TICKER> <YYYY-MM-DD> [market] [security-type]
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `POLYGON_API_KEY`: API key
//!
//! ## Optional
//! - `POLYGON_BASE_URL`: API host (default: <https://api.polygon.io>)
//! - `POLYGON_API_VERSION`: v1 | v2 (default: v2)
//! - `TICK_DOWNLOADER_V1_PAGE_LIMIT`: V1 page-size ceiling (default: 50000)
//! - `TICK_DOWNLOADER_V2_PAGE_LIMIT`: V2 page-size ceiling (default: 50000)
//! - `TICK_DOWNLOADER_HTTP_TIMEOUT_SECS`: Request timeout (default: 30)
//! - `TICK_DOWNLOADER_RETRY_MAX_ATTEMPTS`: Attempts per page (default: 3)
//! - `TICK_DOWNLOADER_RETRY_INITIAL_MS`: First retry delay (default: 500)
//! - `TICK_DOWNLOADER_RETRY_MAX_MS`: Retry delay cap (default: 10000)
//! - `TICK_DOWNLOADER_RETRY_MULTIPLIER`: Backoff multiplier (default: 2.0)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use futures::StreamExt;
use tick_downloader::infrastructure::telemetry;
use tick_downloader::{
    DownloaderConfig, ExchangeTable, Instrument, MarketHoursTable, PolygonHttpConfig,
    PolygonHttpTransport, RetrievalRequest, SecurityType, TickProducer, init_metrics,
};

const USAGE: &str = "usage: tick-downloader <TICKER> <YYYY-MM-DD> [market] [security-type]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let _telemetry_guard = telemetry::init();

    let metrics = init_metrics().context("failed to install metrics recorder")?;

    let request_args = parse_args(std::env::args().skip(1))?;
    let config = DownloaderConfig::from_env()?;
    log_config(&config);

    let transport = PolygonHttpTransport::new(PolygonHttpConfig::from(&config))?;
    let producer = TickProducer::new(
        Arc::new(transport),
        Arc::new(MarketHoursTable::default()),
        Arc::new(ExchangeTable::default()),
        config.page_limits,
    );

    let request = RetrievalRequest::new(
        request_args.instrument,
        request_args.trade_date,
        config.api_version,
    );

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let mut ticks = producer.ticks(request);
    let mut written: u64 = 0;

    while let Some(tick) = ticks.next().await {
        let tick = tick?;
        serde_json::to_writer(&mut out, &tick)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;

    tracing::info!(ticks = written, "Download finished");
    tracing::debug!(metrics = %metrics.render(), "Final metrics");

    Ok(())
}

/// Positional arguments.
#[derive(Debug)]
struct RequestArgs {
    instrument: Instrument,
    trade_date: NaiveDate,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<RequestArgs> {
    let Some(ticker) = args.next() else {
        bail!(USAGE);
    };
    let Some(date) = args.next() else {
        bail!(USAGE);
    };

    let trade_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .with_context(|| format!("invalid trade date '{date}', expected YYYY-MM-DD"))?;
    let market = args.next().unwrap_or_else(|| "usa".to_string());
    let security_type = args
        .next()
        .map(|s| SecurityType::from_str_case_insensitive(&s))
        .unwrap_or_default();

    Ok(RequestArgs {
        instrument: Instrument::new(ticker, market, security_type),
        trade_date,
    })
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &DownloaderConfig) {
    tracing::info!(
        base_url = %config.base_url,
        api_version = config.api_version.as_str(),
        v1_page_limit = config.page_limits.v1,
        v2_page_limit = config.page_limits.v2,
        "Configuration loaded"
    );
    tracing::debug!(
        timeout_secs = config.http.timeout.as_secs(),
        retry_max_attempts = config.http.retry_max_attempts,
        "HTTP settings"
    );
}

/// Load .env file from any ancestor directory.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(ToString::to_string).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_ticker_and_date_with_defaults() {
        let parsed = parse_args(args(&["AAPL", "2021-01-05"])).unwrap();
        assert_eq!(parsed.instrument, Instrument::us_equity("AAPL"));
        assert_eq!(parsed.trade_date, NaiveDate::from_ymd_opt(2021, 1, 5).unwrap());
    }

    #[test]
    fn parses_market_and_security_type() {
        let parsed = parse_args(args(&["ETHUSDT", "2021-01-05", "binance", "crypto"])).unwrap();
        assert_eq!(parsed.instrument.market, "binance");
        assert_eq!(parsed.instrument.security_type, SecurityType::Crypto);
    }

    #[test]
    fn rejects_missing_date() {
        assert!(parse_args(args(&["AAPL"])).is_err());
    }

    #[test]
    fn rejects_bad_date() {
        let err = parse_args(args(&["AAPL", "01/05/2021"])).unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }
}
