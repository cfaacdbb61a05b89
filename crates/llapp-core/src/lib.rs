//! LLApp Core Library
//!
//! Shared configuration, errors and logging setup for the offline cache
//! controller and the page interaction helpers.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, OfflineConfig, PageConfig, DEFAULT_CACHE_NAME, DEFAULT_MANIFEST};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, LogConfig, LogFormat};
