//! Collaborators the subsystem consumes but does not own
//!
//! Every trait is object safe and stored as `Arc<dyn Trait>`; async methods
//! return [`BoxFuture`] so implementations can live in other crates.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::LoaderResult;

/// Catalog record of one family
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub family: String,
    pub variants: Vec<String>,
    /// Variant token to binary download URL
    #[serde(default)]
    pub files: HashMap<String, String>,
}

impl CatalogEntry {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            ..Self::default()
        }
    }

    pub fn with_variant(mut self, token: impl Into<String>, url: impl Into<String>) -> Self {
        let token = token.into();
        self.files.insert(token.clone(), url.into());
        self.variants.push(token);
        self
    }

    /// Download URL for a resolved token, falling back through the `regular`/`400` alias
    pub fn file_for(&self, token: &str) -> Option<&str> {
        let alias = match token {
            "regular" => Some("400"),
            "400" => Some("regular"),
            "italic" => Some("400italic"),
            "400italic" => Some("italic"),
            _ => None,
        };

        self.files
            .get(token)
            .or_else(|| alias.and_then(|alias| self.files.get(alias)))
            .map(String::as_str)
    }
}

/// Resolves a family to its variants and download URLs
pub trait FontCatalog: Send + Sync {
    fn find_font<'a>(&'a self, family: &'a str) -> BoxFuture<'a, LoaderResult<Option<CatalogEntry>>>;
}

/// Decides which families are not remotely hosted
pub trait FontDetector: Send + Sync {
    fn is_local_font(&self, family: &str) -> bool;
    fn is_icon_font(&self, family: &str) -> bool;
}

/// Families shipped with every platform
pub const WEB_SAFE_FONTS: &[&str] = &[
    "Arial",
    "Arial Black",
    "Comic Sans MS",
    "Courier New",
    "Georgia",
    "Helvetica",
    "Impact",
    "Lucida Console",
    "Lucida Sans Unicode",
    "Palatino Linotype",
    "Tahoma",
    "Times New Roman",
    "Trebuchet MS",
    "Verdana",
];

/// Treats the web-safe families as local and anything named `*icons*` as an icon font
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSafeFontDetector;

impl FontDetector for WebSafeFontDetector {
    fn is_local_font(&self, family: &str) -> bool {
        let family = normalize_family(family);
        WEB_SAFE_FONTS
            .iter()
            .any(|safe| safe.eq_ignore_ascii_case(family))
    }

    fn is_icon_font(&self, family: &str) -> bool {
        normalize_family(family).to_lowercase().contains("icons")
    }
}

/// Scans the live render surface for families in use
pub trait UsageScanner: Send + Sync {
    fn currently_rendered_families(&self) -> HashSet<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUsageScanner;

impl UsageScanner for NoopUsageScanner {
    fn currently_rendered_families(&self) -> HashSet<String> {
        HashSet::new()
    }
}

/// Persistent font usage history
pub trait HistoryStore: Send + Sync {
    fn get_history(&self) -> Vec<String>;
    fn set_history(&self, history: Vec<String>);
}

/// History kept in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    history: Mutex<Vec<String>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn get_history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    fn set_history(&self, history: Vec<String>) {
        *self.history.lock() = history;
    }
}

/// Resource installed by a [`StylesheetInjector`]
pub trait StylesheetHandle: Send + Sync {
    /// Release the underlying resource; called at most once
    fn release(&mut self);
}

/// Installs stylesheet resources that make a family renderable
pub trait StylesheetInjector: Send + Sync {
    fn inject<'a>(
        &'a self,
        family: &'a str,
        url: &'a url::Url,
    ) -> BoxFuture<'a, LoaderResult<Box<dyn StylesheetHandle>>>;
}

/// Downloads binary font payloads
pub trait BinaryFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, LoaderResult<Bytes>>;
}

/// Snapshot of the platform's connectivity signals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub online: bool,
    /// Effective connection type, `4g`, `3g`, `2g`, `slow-2g` or empty if unknown
    pub effective_type: String,
}

impl ConnectionInfo {
    pub fn online() -> Self {
        Self {
            online: true,
            effective_type: "4g".to_string(),
        }
    }

    pub fn offline() -> Self {
        Self {
            online: false,
            effective_type: String::new(),
        }
    }

    pub fn with_effective_type(mut self, effective_type: impl Into<String>) -> Self {
        self.effective_type = effective_type.into();
        self
    }
}

pub trait ConnectivityProbe: Send + Sync {
    fn probe(&self) -> ConnectionInfo;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeOnline;

impl ConnectivityProbe for AssumeOnline {
    fn probe(&self) -> ConnectionInfo {
        ConnectionInfo::online()
    }
}

/// Strip surrounding whitespace and CSS quotes from a family string
pub fn normalize_family(family: &str) -> &str {
    family
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_safe_detection_is_case_insensitive() {
        let detector = WebSafeFontDetector;
        assert!(detector.is_local_font("arial"));
        assert!(detector.is_local_font("\"Times New Roman\""));
        assert!(!detector.is_local_font("Roboto"));
        assert!(!detector.is_local_font("Arial Narrow"));
    }

    #[test]
    fn icon_fonts_are_detected_by_name() {
        let detector = WebSafeFontDetector;
        assert!(detector.is_icon_font("Material Icons"));
        assert!(detector.is_icon_font("Material Symbols Outlined Icons"));
        assert!(!detector.is_icon_font("Roboto"));
    }

    #[test]
    fn catalog_files_fall_back_through_regular_alias() {
        let entry = CatalogEntry::new("Roboto")
            .with_variant("400", "https://fonts.example/roboto-400.ttf")
            .with_variant("700", "https://fonts.example/roboto-700.ttf");
        assert_eq!(entry.file_for("regular"), Some("https://fonts.example/roboto-400.ttf"));
        assert_eq!(entry.file_for("700"), Some("https://fonts.example/roboto-700.ttf"));
        assert_eq!(entry.file_for("900"), None);
    }

    #[test]
    fn memory_history_round_trips() {
        let store = MemoryHistoryStore::new();
        store.set_history(vec!["Lato".into(), "Roboto".into()]);
        assert_eq!(store.get_history(), vec!["Lato", "Roboto"]);
    }

    #[test]
    fn normalize_strips_quotes() {
        assert_eq!(normalize_family("  'Open Sans' "), "Open Sans");
        assert_eq!(normalize_family("Lato"), "Lato");
    }
}
