//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for external systems (trades API, venue and tape lookups).
pub mod ports;

/// Application services for pagination and tick production.
pub mod services;
