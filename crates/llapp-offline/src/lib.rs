//! # LLApp Offline
//!
//! Offline cache controller for the LLApp web application.
//!
//! ## Features
//!
//! - **Lifecycle**: install, activate and fetch hooks run as async handlers
//! - **Cache API**: versioned cache generations with all-or-nothing population
//! - **Clients API**: open pages are claimed by the active worker
//! - **Fetch Interception**: cache first, then network, then the cached root document
//!
//! ## Architecture
//!
//! ```text
//! WorkerEnvironment
//!     ├── WorkerRegistration
//!     │       ├── installing (Worker)
//!     │       ├── waiting (Worker)
//!     │       └── active (Worker)
//!     ├── Clients
//!     └── CacheStorage
//!             └── Cache (one per generation)
//!                     └── Request URL → CacheEntry
//!
//! OfflineCacheController<N: Network>
//!     install  → fetch AssetManifest, commit to Cache
//!     activate → delete stale generations, claim clients
//!     fetch    → Cache | Network | offline fallback
//! ```

use thiserror::Error;

pub mod cache;
pub mod controller;
pub mod manifest;
pub mod network;
pub mod registration;

pub use cache::{Cache, CacheEntry, CacheStorage};
pub use controller::{
    ActivationReport, FetchOutcome, InstallReport, LifecycleEvent, LifecycleHook,
    LifecycleReply, OfflineCacheController, OfflineEvent, WorkerEnvironment,
};
pub use manifest::AssetManifest;
pub use network::{FetchRequest, FetchResponse, HttpNetwork, Network, ResponseSource};
pub use registration::{Client, Clients, Worker, WorkerId, WorkerRegistration, WorkerState};

/// Errors that can occur in offline cache operations.
#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Install of cache {cache_name} failed: {reason}")]
    InstallFailed { cache_name: String, reason: String },

    #[error("State error: {0}")]
    State(String),

    #[error("No cached offline fallback for {url}")]
    OfflineFallbackMissing { url: String },

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] llapp_core::CoreError),
}

impl OfflineError {
    /// Whether a live fetch failure of this kind triggers the offline fallback.
    pub fn is_network(&self) -> bool {
        matches!(self, OfflineError::Network(_))
    }
}

/// Result type alias for offline operations.
pub type Result<T> = std::result::Result<T, OfflineError>;
