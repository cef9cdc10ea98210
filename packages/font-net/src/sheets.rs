use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use font_loader::providers::StylesheetHandle;
use parking_lot::Mutex;
use url::Url;

/// Stylesheet text installed for one family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledStylesheet {
    pub family: String,
    pub url: Url,
    pub css: String,
    generation: u64,
}

/// Shared set of installed stylesheets; the renderer reads, handles remove
#[derive(Debug, Clone, Default)]
pub struct StyleSheets {
    inner: Arc<Mutex<HashMap<String, InstalledStylesheet>>>,
    next_generation: Arc<AtomicU64>,
}

impl StyleSheets {
    /// Install `css` for `family`, replacing any previous sheet
    pub(crate) fn install(&self, family: &str, url: Url, css: String) -> SheetHandle {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.inner.lock().insert(
            family.to_string(),
            InstalledStylesheet {
                family: family.to_string(),
                url,
                css,
                generation,
            },
        );

        SheetHandle {
            sheets: self.clone(),
            family: family.to_string(),
            generation,
        }
    }

    pub fn get(&self, family: &str) -> Option<InstalledStylesheet> {
        self.inner.lock().get(family).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Every installed sheet, concatenated in family order
    pub fn combined_css(&self) -> String {
        let inner = self.inner.lock();
        let mut families: Vec<&String> = inner.keys().collect();
        families.sort();
        families
            .into_iter()
            .filter_map(|family| inner.get(family))
            .map(|sheet| sheet.css.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn remove(&self, family: &str, generation: u64) {
        let mut inner = self.inner.lock();
        // A newer sheet for the family may already have replaced this one
        if inner.get(family).is_some_and(|sheet| sheet.generation == generation) {
            inner.remove(family);
        }
    }
}

/// Keeps one installed sheet alive until released
pub(crate) struct SheetHandle {
    sheets: StyleSheets,
    family: String,
    generation: u64,
}

impl StylesheetHandle for SheetHandle {
    fn release(&mut self) {
        self.sheets.remove(&self.family, self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(query: &str) -> Url {
        Url::parse(&format!("https://fonts.googleapis.com/css2?{query}")).unwrap()
    }

    #[test]
    fn stale_handle_does_not_remove_replacement() {
        let sheets = StyleSheets::default();
        let mut preview = sheets.install("Roboto", url("family=Roboto:wght@400"), "a".into());
        let mut full = sheets.install("Roboto", url("family=Roboto:ital,wght@0,400"), "b".into());

        preview.release();
        assert_eq!(sheets.get("Roboto").map(|sheet| sheet.css), Some("b".to_string()));

        full.release();
        assert!(sheets.is_empty());
    }

    #[test]
    fn combined_css_is_ordered_by_family() {
        let sheets = StyleSheets::default();
        let _b = sheets.install("Lobster", url("family=Lobster"), "lobster".into());
        let _a = sheets.install("Inter", url("family=Inter"), "inter".into());
        assert_eq!(sheets.combined_css(), "inter\nlobster");
        assert_eq!(sheets.len(), 2);
    }
}
