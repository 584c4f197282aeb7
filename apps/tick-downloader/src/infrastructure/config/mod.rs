//! Configuration Module
//!
//! Configuration loading for the tick downloader.

mod settings;

pub use settings::{ConfigError, Credentials, DEFAULT_BASE_URL, DownloaderConfig, HttpSettings};
