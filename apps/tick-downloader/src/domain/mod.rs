//! Domain Layer - Trade records and time normalization.
//!
//! This layer contains the version-neutral trade types and the pure
//! timestamp conversions. Nothing here performs I/O.

/// Raw and normalized trade types, cursor and request parameters.
pub mod trades;

/// Epoch timestamp conversion and venue localization.
pub mod time;
