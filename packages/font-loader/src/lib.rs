//! Dynamic web font loading and caching for vector editors
//!
//! This crate decides when and how remotely hosted font families are made
//! available to an editor:
//! - Lightweight preview stylesheets for font pickers
//! - Full variant stylesheets plus binary payloads for text editing
//! - A priority queue with bounded concurrent loads
//! - Retry with exponential backoff, error records and user notifications
//! - Web-safe fallbacks and an offline mode
//!
//! # Architecture
//!
//! [`FontSubsystem`] owns every component and is the only type most callers
//! need. The font catalog, stylesheet injection and binary download are
//! collaborators supplied through the traits in [`providers`]; the
//! `font-net` crate has HTTP implementations of them.
//!
//! Load calls never fail. Progress is observed through
//! [`FontSubsystem::is_loaded`], [`FontSubsystem::is_loading`] and the error
//! queries, while a background task polls connectivity and sweeps unused
//! stylesheets.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use font_loader::{FontSubsystemBuilder, FontStyle};
//! # use font_loader::providers::{BinaryFetcher, FontCatalog, StylesheetInjector};
//!
//! # async fn example(
//! #     catalog: Arc<dyn FontCatalog>,
//! #     injector: Arc<dyn StylesheetInjector>,
//! #     fetcher: Arc<dyn BinaryFetcher>,
//! # ) -> Result<(), font_loader::LoaderError> {
//! // Initialize logging (optional, for development)
//! let _ = env_logger::try_init();
//!
//! let fonts = FontSubsystemBuilder::new(catalog, injector, fetcher).build()?;
//!
//! fonts.load_for_preview("Lobster").await;
//! fonts.load_for_text_editing("Roboto").await;
//!
//! if fonts.is_registered("Roboto") {
//!     let bold = fonts.get_binary("Roboto", 700, FontStyle::Normal).await;
//!     log::info!("Roboto bold: {:?} bytes", bold.map(|b| b.len()));
//! } else {
//!     log::info!("Rendering with {}", fonts.get_fallback_font("Roboto"));
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod cache;
mod config;
mod coordinator;
mod error;
mod format;
mod network;
pub mod providers;
mod registry;
mod subsystem;
mod types;
pub mod variants;

// Public API exports
pub use builder::FontSubsystemBuilder;
pub use cache::{
    BinaryCache, BinaryCacheEntry, BinaryCacheStats, ResourceHandle, StylesheetResourceTracker,
    StylesheetTracker, SweepPolicy, TrackerInfo,
};
pub use config::FontLoaderConfig;
pub use coordinator::{
    Backoff, FailedLoad, FontLoadCoordinator, LoadQueue, LoadQueueItem, QueuePush,
};
pub use error::fallback::{fallback_postscript_name, resolve_fallback};
pub use error::report::user_friendly_message;
pub use error::{
    ErrorCategory, ErrorHandler, ErrorId, ErrorReport, ErrorSeverity, FontError, LoaderError,
    LoaderResult, RecoveryAction, UserNotification,
};
pub use format::{FontFormat, validate_font_data};
pub use network::{NetworkSnapshot, NetworkStateMonitor};
pub use providers::{CatalogEntry, ConnectionInfo};
pub use registry::{FontRegistry, RegisteredVariant};
pub use subsystem::{FontSubsystem, RecoveryOutcome};
pub use types::{
    DEFAULT_FONT_WEIGHT, FontDescriptor, FontIdentity, FontLoadStatus, FontStyle, LoadOptions,
    LoadPriority, LoadPurpose,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::providers::{
        BinaryFetcher, ConnectivityProbe, FontCatalog, FontDetector, HistoryStore,
        StylesheetHandle, StylesheetInjector, UsageScanner,
    };
    pub use super::{
        CatalogEntry, ConnectionInfo, ErrorSeverity, FontDescriptor, FontError, FontIdentity,
        FontLoadStatus, FontLoaderConfig, FontStyle, FontSubsystem, FontSubsystemBuilder,
        LoadOptions, LoadPriority, LoadPurpose, LoaderError, LoaderResult, RecoveryAction,
    };
}

/// Defaults of [`FontLoaderConfig`]
pub mod constants {
    /// Maximum concurrent family loads
    pub const MAX_CONCURRENT_LOADS: usize = 5;

    /// Attempts per family load and per binary fetch
    pub const MAX_RETRY_ATTEMPTS: u32 = 3;

    /// First retry delay, doubled per attempt
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;

    pub const RETRY_JITTER_MAX_MS: u64 = 1000;

    pub const RETRY_MAX_DELAY_MS: u64 = 10_000;

    /// Timeout of every catalog, stylesheet and binary request
    pub const FONT_LOAD_TIMEOUT_SECONDS: u64 = 10;

    /// Settle time before draining the queue after a terminal load
    pub const QUEUE_PROCESS_DELAY_MS: u64 = 100;

    /// Binary payloads are refetched after a day
    pub const BINARY_CACHE_EXPIRY_SECONDS: u64 = 24 * 60 * 60;

    pub const NETWORK_CHECK_INTERVAL_SECONDS: u64 = 30;

    pub const NETWORK_STALENESS_SECONDS: u64 = 5 * 60;

    pub const STYLESHEET_CLEANUP_INTERVAL_SECONDS: u64 = 5 * 60;

    pub const STYLESHEET_MAX_AGE_SECONDS: u64 = 5 * 60;

    pub const PREVIEW_TTL_SECONDS: u64 = 10 * 60;

    /// Idle time after which rarely used stylesheets are dropped
    pub const IDLE_TTL_SECONDS: u64 = 30 * 60;

    pub const FONT_HISTORY_MAX_SIZE: usize = 5;

    pub const RECENT_ERRORS_CAPACITY: usize = 10;

    pub const INITIAL_USAGE_COUNT: u32 = 1;

    /// Minimum font file size (4 bytes for signature)
    pub const MIN_FONT_FILE_SIZE: usize = 4;

    /// Maximum font file size (50MB)
    pub const MAX_FONT_FILE_SIZE: usize = 50 * 1024 * 1024;

    pub const STYLESHEET_ENDPOINT: &str = "https://fonts.googleapis.com/css2";
}
