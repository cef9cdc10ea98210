use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::providers::{HistoryStore, normalize_family};
use crate::types::{FontDescriptor, FontIdentity, FontStyle};

/// Face registered after its binary payload loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredVariant {
    pub identity: FontIdentity,
    pub postscript_name: String,
    pub display_style: String,
}

impl RegisteredVariant {
    pub fn new(identity: FontIdentity) -> Self {
        Self {
            postscript_name: postscript_name(&identity.family, identity.weight, identity.style),
            display_style: display_style(identity.weight, identity.style),
            identity,
        }
    }
}

/// CSS weight name, `Regular` for 400
pub fn weight_name(weight: u16) -> &'static str {
    match weight {
        0..=149 => "Thin",
        150..=249 => "ExtraLight",
        250..=349 => "Light",
        350..=449 => "Regular",
        450..=549 => "Medium",
        550..=649 => "SemiBold",
        650..=749 => "Bold",
        750..=849 => "ExtraBold",
        _ => "Black",
    }
}

/// `Open Sans` 700 italic becomes `OpenSans-BoldItalic`
pub fn postscript_name(family: &str, weight: u16, style: FontStyle) -> String {
    let base: String = family.chars().filter(|c| !c.is_whitespace()).collect();
    let suffix = match (weight_name(weight), style) {
        ("Regular", FontStyle::Normal) => "Regular".to_string(),
        ("Regular", FontStyle::Italic) => "Italic".to_string(),
        (name, FontStyle::Normal) => name.to_string(),
        (name, FontStyle::Italic) => format!("{name}Italic"),
    };
    format!("{base}-{suffix}")
}

/// Human-readable style, `Bold Italic`, `Regular`, `Italic`
pub fn display_style(weight: u16, style: FontStyle) -> String {
    match (weight_name(weight), style) {
        ("Regular", FontStyle::Normal) => "Regular".to_string(),
        ("Regular", FontStyle::Italic) => "Italic".to_string(),
        (name, FontStyle::Normal) => spaced(name),
        (name, FontStyle::Italic) => format!("{} Italic", spaced(name)),
    }
}

fn spaced(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Families whose binaries loaded, plus the recency history
pub struct FontRegistry {
    variants: Mutex<HashMap<String, BTreeMap<String, RegisteredVariant>>>,
    history: Arc<dyn HistoryStore>,
    history_capacity: usize,
}

impl FontRegistry {
    pub fn new(history: Arc<dyn HistoryStore>, history_capacity: usize) -> Self {
        Self {
            variants: Mutex::new(HashMap::new()),
            history,
            history_capacity,
        }
    }

    /// Register a loaded face; `false` if it was already registered
    pub fn register(&self, identity: FontIdentity) -> bool {
        let variant = RegisteredVariant::new(identity);
        let mut variants = self.variants.lock();
        let family = variants.entry(variant.identity.family.clone()).or_default();

        if family.contains_key(&variant.identity.cache_key()) {
            return false;
        }

        log::debug!("Registered {} as {}", variant.identity, variant.postscript_name);
        family.insert(variant.identity.cache_key(), variant);
        true
    }

    pub fn is_registered(&self, family: &str) -> bool {
        self.variants
            .lock()
            .get(family)
            .is_some_and(|variants| !variants.is_empty())
    }

    pub fn variants(&self, family: &str) -> Vec<RegisteredVariant> {
        self.variants
            .lock()
            .get(family)
            .map(|variants| variants.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn registered_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .variants
            .lock()
            .iter()
            .filter(|(_, variants)| !variants.is_empty())
            .map(|(family, _)| family.clone())
            .collect();
        families.sort();
        families
    }

    /// Most recently used families first
    pub fn history(&self) -> Vec<String> {
        let mut history = self.history.get_history();
        history.truncate(self.history_capacity);
        history
    }

    /// Move `font` to the front of the history; no-op without a family
    pub fn add_to_history(&self, font: &FontDescriptor) {
        let Some(family) = font.family.as_deref().map(normalize_family) else {
            return;
        };
        if family.is_empty() {
            return;
        }

        let mut history = self.history.get_history();
        history.retain(|existing| existing != family);
        history.insert(0, family.to_string());
        history.truncate(self.history_capacity);
        self.history.set_history(history);
    }
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry")
            .field("families", &self.registered_families())
            .field("history_capacity", &self.history_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryHistoryStore;

    fn registry() -> FontRegistry {
        FontRegistry::new(Arc::new(MemoryHistoryStore::new()), 5)
    }

    #[test]
    fn postscript_names_follow_weight_names() {
        assert_eq!(postscript_name("Open Sans", 700, FontStyle::Italic), "OpenSans-BoldItalic");
        assert_eq!(postscript_name("Lato", 400, FontStyle::Normal), "Lato-Regular");
        assert_eq!(postscript_name("Lato", 400, FontStyle::Italic), "Lato-Italic");
        assert_eq!(postscript_name("Inter", 100, FontStyle::Normal), "Inter-Thin");
        assert_eq!(postscript_name("Inter", 900, FontStyle::Normal), "Inter-Black");
    }

    #[test]
    fn display_styles_are_spaced() {
        assert_eq!(display_style(700, FontStyle::Italic), "Bold Italic");
        assert_eq!(display_style(600, FontStyle::Normal), "Semi Bold");
        assert_eq!(display_style(400, FontStyle::Normal), "Regular");
    }

    #[test]
    fn register_is_idempotent_per_face() {
        let registry = registry();
        assert!(!registry.is_registered("Lato"));
        assert!(registry.register(FontIdentity::regular("Lato")));
        assert!(!registry.register(FontIdentity::regular("Lato")));
        assert!(registry.register(FontIdentity::new("Lato", 700, FontStyle::Normal)));
        assert!(registry.is_registered("Lato"));
        assert_eq!(registry.variants("Lato").len(), 2);
        assert_eq!(registry.registered_families(), vec!["Lato"]);
    }

    #[test]
    fn history_moves_existing_entry_to_front() {
        let registry = registry();
        for family in ["A", "B", "C"] {
            registry.add_to_history(&FontDescriptor::family(family));
        }
        registry.add_to_history(&FontDescriptor::family("A"));
        assert_eq!(registry.history(), vec!["A", "C", "B"]);
    }

    #[test]
    fn history_is_capped() {
        let registry = registry();
        for family in ["A", "B", "C", "D", "E", "F"] {
            registry.add_to_history(&FontDescriptor::family(family));
        }
        assert_eq!(registry.history(), vec!["F", "E", "D", "C", "B"]);
    }

    #[test]
    fn descriptor_without_family_is_ignored() {
        let registry = registry();
        registry.add_to_history(&FontDescriptor::default());
        assert!(registry.history().is_empty());
    }
}
