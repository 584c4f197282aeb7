//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// Historical trades API adapters (wire types, schema adapters, HTTP transport).
pub mod polygon;

/// Exchange id to tape table.
pub mod exchanges;

/// Market to time zone table.
pub mod venues;

/// Configuration loading.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Tracing subscriber and OpenTelemetry integration.
pub mod telemetry;
