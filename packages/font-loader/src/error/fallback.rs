//! Web-safe substitutes for families that cannot be loaded

use std::collections::HashMap;

/// Fallback used when nothing more specific matches
pub const DEFAULT_FALLBACK: &str = "Arial";
pub const SERIF_FALLBACK: &str = "Times New Roman";
pub const MONOSPACE_FALLBACK: &str = "Courier New";
pub const DISPLAY_FALLBACK: &str = "Arial Black";
pub const HANDWRITING_FALLBACK: &str = "Comic Sans MS";

/// Well-known catalog families and their closest web-safe substitute
pub const EXPLICIT_FALLBACKS: &[(&str, &str)] = &[
    ("Courier Prime", MONOSPACE_FALLBACK),
    ("Crimson Text", SERIF_FALLBACK),
    ("JetBrains Mono", MONOSPACE_FALLBACK),
    ("Lato", DEFAULT_FALLBACK),
    ("Merriweather", SERIF_FALLBACK),
    ("Montserrat", DEFAULT_FALLBACK),
    ("Nunito", DEFAULT_FALLBACK),
    ("Open Sans", DEFAULT_FALLBACK),
    ("Oswald", DISPLAY_FALLBACK),
    ("Playfair Display", SERIF_FALLBACK),
    ("Poppins", DEFAULT_FALLBACK),
    ("PT Serif", SERIF_FALLBACK),
    ("Raleway", DEFAULT_FALLBACK),
    ("Roboto", DEFAULT_FALLBACK),
    ("Source Code Pro", MONOSPACE_FALLBACK),
    ("Source Sans Pro", DEFAULT_FALLBACK),
    ("Ubuntu", DEFAULT_FALLBACK),
];

/// Name fragments of script and handwriting families
const HANDWRITING_KEYWORDS: &[&str] = &["script", "handwriting"];

/// Catalog handwriting families whose names carry no handwriting keyword
pub const HANDWRITING_FAMILIES: &[&str] = &[
    "Caveat",
    "Great Vibes",
    "Indie Flower",
    "Kalam",
    "Pacifico",
    "Sacramento",
    "Satisfy",
    "Shadows Into Light",
];

const FALLBACK_POSTSCRIPT_NAMES: &[(&str, &str)] = &[
    (DEFAULT_FALLBACK, "ArialMT"),
    (DISPLAY_FALLBACK, "Arial-Black"),
    (MONOSPACE_FALLBACK, "CourierNewPSMT"),
    (SERIF_FALLBACK, "TimesNewRomanPSMT"),
    (HANDWRITING_FALLBACK, "ComicSansMS"),
];

/// Look a family up in the explicit table
pub fn explicit_fallback(family: &str) -> Option<&'static str> {
    EXPLICIT_FALLBACKS
        .iter()
        .find(|(name, _)| *name == family)
        .map(|(_, fallback)| *fallback)
}

/// Category heuristics: name keywords, then the known handwriting families
pub fn heuristic_fallback(family: &str) -> Option<&'static str> {
    let lower = family.to_lowercase();

    if lower.contains("serif") && !lower.contains("sans") {
        return Some(SERIF_FALLBACK);
    }

    if lower.contains("mono") || lower.contains("code") {
        return Some(MONOSPACE_FALLBACK);
    }

    if lower.contains("display") || lower.contains("black") {
        return Some(DISPLAY_FALLBACK);
    }

    if HANDWRITING_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
        || HANDWRITING_FAMILIES.contains(&family)
    {
        return Some(HANDWRITING_FALLBACK);
    }

    None
}

/// Resolve a fallback: offline table, explicit table, heuristics, default
pub fn resolve_fallback(family: &str, offline_fallbacks: Option<&HashMap<String, String>>) -> String {
    if let Some(cached) = offline_fallbacks.and_then(|table| table.get(family)) {
        return cached.clone();
    }

    explicit_fallback(family)
        .or_else(|| heuristic_fallback(family))
        .unwrap_or(DEFAULT_FALLBACK)
        .to_string()
}

/// Table seeded into offline mode
pub fn offline_fallback_table() -> HashMap<String, String> {
    EXPLICIT_FALLBACKS
        .iter()
        .map(|(name, fallback)| (name.to_string(), fallback.to_string()))
        .collect()
}

/// PostScript name of a web-safe fallback family
pub fn fallback_postscript_name(fallback: &str) -> &'static str {
    let family = fallback.split(',').next().unwrap_or(fallback).trim();
    FALLBACK_POSTSCRIPT_NAMES
        .iter()
        .find(|(name, _)| *name == family)
        .map(|(_, postscript)| *postscript)
        .unwrap_or("ArialMT")
}
