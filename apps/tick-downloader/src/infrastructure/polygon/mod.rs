//! Historical Trades API Adapters
//!
//! - **messages**: wire envelopes for V1 and V2
//! - **codec**: schema adapters from wire body to `RawPage`
//! - **http**: reqwest transport with retry

pub mod codec;
pub mod http;
pub mod messages;

pub use codec::{decode_page, decode_v1, decode_v2};
pub use http::{PolygonHttpConfig, PolygonHttpTransport, RetryConfig, endpoint_path};
pub use messages::{HistoricTradesV1, HistoricTradesV2, TradeV1, TradeV2};
