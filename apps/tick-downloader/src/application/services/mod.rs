//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `PaginationState`: Cursor and termination decisions between pages
//! - `TickProducer`: Lazy tick stream over transport, venue and tape ports

pub mod pagination;
pub mod producer;

pub use pagination::{PageOutcome, PaginationState};
pub use producer::{TickProducer, TickStream};
