use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single loader operation
///
/// These never escape [`crate::FontSubsystem::load_with_options`]; the coordinator turns them
/// into [`crate::FontError`] records through the error handler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoaderError {
    /// Transport failure while talking to a font host
    #[error("Network error: {0}")]
    Network(String),

    /// No network connection available
    #[error("No network connection available")]
    Offline,

    /// A fetch did not complete within the request timeout
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// The catalog service failed to answer
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The family is not published by the catalog
    #[error("Font {0} not found in catalog")]
    NotInCatalog(String),

    /// The catalog entry is unusable (no variants, no files)
    #[error("Invalid catalog entry for {family}: {reason}")]
    InvalidCatalogEntry { family: String, reason: String },

    /// The stylesheet resource could not be installed
    #[error("Stylesheet failed to load for {family}: {reason}")]
    Stylesheet { family: String, reason: String },

    /// Downloaded payload is not a font
    #[error("Invalid font data: {0}")]
    InvalidFontData(String),

    /// Downloaded payload exceeds the configured size ceiling
    #[error("Font payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Internal cache failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Family string rejected before any work was done
    #[error("Invalid font family: {0:?}")]
    InvalidFamily(String),

    /// Invalid URL format or parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Error taxonomy shared by [`LoaderError`] and [`crate::FontError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Network,
    FontLoading,
    Api,
    Cache,
    UserInput,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::FontLoading => "font-loading",
            ErrorCategory::Api => "api",
            ErrorCategory::Cache => "cache",
            ErrorCategory::UserInput => "user-input",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error severity levels driving the notification policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
        }
    }
}

impl LoaderError {
    /// Classify by the failing operation
    pub fn category(&self) -> ErrorCategory {
        match self {
            LoaderError::Network(_) => ErrorCategory::Network,
            LoaderError::Offline => ErrorCategory::Network,
            LoaderError::Timeout(_) => ErrorCategory::Network,
            LoaderError::Catalog(_) => ErrorCategory::Api,
            LoaderError::NotInCatalog(_) => ErrorCategory::FontLoading,
            LoaderError::InvalidCatalogEntry { .. } => ErrorCategory::Api,
            LoaderError::Stylesheet { .. } => ErrorCategory::FontLoading,
            LoaderError::InvalidFontData(_) => ErrorCategory::FontLoading,
            LoaderError::PayloadTooLarge { .. } => ErrorCategory::FontLoading,
            LoaderError::Cache(_) => ErrorCategory::Cache,
            LoaderError::InvalidFamily(_) => ErrorCategory::UserInput,
            LoaderError::InvalidUrl(_) => ErrorCategory::Api,
            LoaderError::Config(_) => ErrorCategory::UserInput,
        }
    }

    /// Check if retrying the same operation can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            LoaderError::Network(_) => true,
            LoaderError::Offline => true,
            LoaderError::Timeout(_) => true,
            LoaderError::Catalog(_) => true,
            LoaderError::NotInCatalog(_) => true,
            LoaderError::Stylesheet { .. } => true,
            LoaderError::Cache(_) => true,
            LoaderError::InvalidCatalogEntry { .. } => false,
            LoaderError::InvalidFontData(_) => false,
            LoaderError::PayloadTooLarge { .. } => false,
            LoaderError::InvalidFamily(_) => false,
            LoaderError::InvalidUrl(_) => false,
            LoaderError::Config(_) => false,
        }
    }

    #[inline]
    pub fn is_network(&self) -> bool {
        self.category() == ErrorCategory::Network
    }
}
