//! Variant tokens, best-match resolution and stylesheet request URLs
//!
//! Catalog variants are tokens such as `regular`, `italic`, `700` or
//! `300italic`. A requested `(weight, style)` is mapped onto the closest
//! available token by walking a fixed weight order, first within the
//! requested style and then across to the opposite style.

use std::collections::BTreeSet;
use std::collections::HashSet;

use url::Url;

use crate::error::{LoaderError, LoaderResult};
use crate::types::{DEFAULT_FONT_WEIGHT, FontStyle};

/// Weights tried in order when the exact variant is missing
pub const WEIGHT_FALLBACK_ORDER: [u16; 9] = [400, 500, 300, 600, 200, 700, 100, 800, 900];

/// Token naming `(weight, style)` in catalog form
pub fn variant_token(weight: u16, style: FontStyle) -> String {
    match (weight, style) {
        (DEFAULT_FONT_WEIGHT, FontStyle::Normal) => "regular".to_string(),
        (DEFAULT_FONT_WEIGHT, FontStyle::Italic) => "italic".to_string(),
        (weight, FontStyle::Normal) => weight.to_string(),
        (weight, FontStyle::Italic) => format!("{weight}italic"),
    }
}

/// Parse a catalog token back into `(weight, style)`
pub fn parse_variant(token: &str) -> Option<(u16, FontStyle)> {
    match token {
        "regular" => return Some((DEFAULT_FONT_WEIGHT, FontStyle::Normal)),
        "italic" => return Some((DEFAULT_FONT_WEIGHT, FontStyle::Italic)),
        _ => {}
    }

    let (digits, style) = match token.strip_suffix("italic") {
        Some(digits) => (digits, FontStyle::Italic),
        None => (token, FontStyle::Normal),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let weight: u16 = digits.parse().ok()?;
    (1..=1000).contains(&weight).then_some((weight, style))
}

/// Normalize catalog tokens into the set the resolver searches
///
/// `regular` and `400` provide each other, as do `italic` and `400italic`;
/// unrecognised tokens are dropped.
pub fn discover_available_variants<I, S>(tokens: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut available = HashSet::new();
    for token in tokens {
        let token = token.as_ref().trim();
        match token {
            "regular" | "400" => {
                available.insert("regular".to_string());
                available.insert("400".to_string());
            }
            "italic" | "400italic" => {
                available.insert("italic".to_string());
                available.insert("400italic".to_string());
            }
            other if parse_variant(other).is_some() => {
                available.insert(other.to_string());
            }
            other => log::debug!("Ignoring unrecognised variant token {:?}", other),
        }
    }
    available
}

/// Best available variant for `(weight, style)`, or `None` for an empty set
pub fn resolve(available: &HashSet<String>, weight: u16, style: FontStyle) -> Option<String> {
    let exact = variant_token(weight, style);
    if available.contains(&exact) {
        return Some(exact);
    }

    if let Some(found) = walk_fallback_order(available, style) {
        return Some(found);
    }

    let crossed = walk_fallback_order(available, style.opposite())?;
    log::warn!(
        "No {} variant available near weight {}, substituting {} style ({})",
        style,
        weight,
        style.opposite(),
        crossed
    );
    Some(crossed)
}

fn walk_fallback_order(available: &HashSet<String>, style: FontStyle) -> Option<String> {
    WEIGHT_FALLBACK_ORDER
        .iter()
        .map(|&weight| variant_token(weight, style))
        .find(|token| available.contains(token))
}

/// `Open Sans` becomes `Open+Sans`
fn encode_family(family: &str) -> String {
    family.trim().split_whitespace().collect::<Vec<_>>().join("+")
}

fn parse_request_url(endpoint: &str, query: String) -> LoaderResult<Url> {
    let raw = format!("{}?{}&display=swap", endpoint, query);
    Url::parse(&raw).map_err(LoaderError::from)
}

/// Single-variant stylesheet request used for previews
pub fn preview_stylesheet_url(
    endpoint: &str,
    family: &str,
    weight: u16,
    style: FontStyle,
) -> LoaderResult<Url> {
    let family = encode_family(family);
    let query = match style {
        FontStyle::Normal => format!("family={family}:wght@{weight}"),
        FontStyle::Italic => format!("family={family}:ital,wght@1,{weight}"),
    };
    parse_request_url(endpoint, query)
}

/// Combined stylesheet request spanning every given variant
///
/// Axis tuples are sorted by `(italic, weight)` and deduplicated.
pub fn combined_stylesheet_url<'a, I>(endpoint: &str, family: &str, variants: I) -> LoaderResult<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let tuples: BTreeSet<(u8, u16)> = variants
        .into_iter()
        .filter_map(parse_variant)
        .map(|(weight, style)| (u8::from(style.is_italic()), weight))
        .collect();

    if tuples.is_empty() {
        return Err(LoaderError::InvalidCatalogEntry {
            family: family.to_string(),
            reason: "no usable variants".to_string(),
        });
    }

    let axes = tuples
        .iter()
        .map(|(ital, weight)| format!("{ital},{weight}"))
        .collect::<Vec<_>>()
        .join(";");

    let query = format!("family={}:ital,wght@{}", encode_family(family), axes);
    parse_request_url(endpoint, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "https://fonts.googleapis.com/css2";

    fn set(tokens: &[&str]) -> HashSet<String> {
        discover_available_variants(tokens.iter().copied())
    }

    #[test]
    fn tokens_follow_catalog_convention() {
        assert_eq!(variant_token(400, FontStyle::Normal), "regular");
        assert_eq!(variant_token(400, FontStyle::Italic), "italic");
        assert_eq!(variant_token(700, FontStyle::Normal), "700");
        assert_eq!(variant_token(300, FontStyle::Italic), "300italic");
    }

    #[test]
    fn parse_accepts_catalog_tokens_only() {
        assert_eq!(parse_variant("regular"), Some((400, FontStyle::Normal)));
        assert_eq!(parse_variant("700italic"), Some((700, FontStyle::Italic)));
        assert_eq!(parse_variant("900"), Some((900, FontStyle::Normal)));
        assert_eq!(parse_variant("bold"), None);
        assert_eq!(parse_variant("italic700"), None);
        assert_eq!(parse_variant(""), None);
    }

    #[test]
    fn discovery_adds_numeric_aliases() {
        let available = set(&["regular", "italic", "700", "menu"]);
        assert!(available.contains("400"));
        assert!(available.contains("400italic"));
        assert!(available.contains("700"));
        assert!(!available.contains("menu"));
    }

    #[test]
    fn numeric_regular_tokens_resolve_at_400() {
        let upright = set(&["400"]);
        assert!(upright.contains("regular"));
        assert_eq!(resolve(&upright, 400, FontStyle::Normal).as_deref(), Some("regular"));

        let italic = set(&["400italic"]);
        assert_eq!(resolve(&italic, 400, FontStyle::Italic).as_deref(), Some("italic"));

        let mixed = set(&["400", "700"]);
        assert_eq!(resolve(&mixed, 400, FontStyle::Normal).as_deref(), Some("regular"));
        assert_eq!(resolve(&mixed, 700, FontStyle::Normal).as_deref(), Some("700"));
    }

    #[test]
    fn exact_match_wins() {
        let available = set(&["regular", "700", "700italic"]);
        assert_eq!(
            resolve(&available, 700, FontStyle::Italic).as_deref(),
            Some("700italic")
        );
    }

    #[test]
    fn fallback_prefers_proximity_to_regular() {
        let available: HashSet<String> = ["regular", "700"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            resolve(&available, 500, FontStyle::Normal).as_deref(),
            Some("regular")
        );
    }

    #[test]
    fn fallback_walks_fixed_order() {
        let available = set(&["300", "600", "800"]);
        assert_eq!(resolve(&available, 900, FontStyle::Normal).as_deref(), Some("300"));
    }

    #[test]
    fn crosses_style_only_when_needed() {
        let available = set(&["italic", "700italic"]);
        assert_eq!(resolve(&available, 700, FontStyle::Normal).as_deref(), Some("italic"));

        let upright = set(&["700"]);
        assert_eq!(resolve(&upright, 400, FontStyle::Italic).as_deref(), Some("700"));
    }

    #[test]
    fn empty_set_resolves_to_none() {
        assert_eq!(resolve(&HashSet::new(), 400, FontStyle::Normal), None);
    }

    #[test]
    fn preview_urls_carry_one_axis_tuple() {
        let url = preview_stylesheet_url(ENDPOINT, "Open Sans", 400, FontStyle::Normal).unwrap();
        assert_eq!(
            url.as_str(),
            "https://fonts.googleapis.com/css2?family=Open+Sans:wght@400&display=swap"
        );

        let italic = preview_stylesheet_url(ENDPOINT, "Lato", 400, FontStyle::Italic).unwrap();
        assert!(italic.as_str().contains("family=Lato:ital,wght@1,400"));
    }

    #[test]
    fn combined_url_sorts_and_dedupes_axes() {
        let url = combined_stylesheet_url(
            ENDPOINT,
            "Roboto",
            ["italic", "700", "regular", "400", "300italic"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://fonts.googleapis.com/css2?family=Roboto:ital,wght@0,400;0,700;1,300;1,400&display=swap"
        );
    }

    #[test]
    fn combined_url_rejects_empty_variant_list() {
        let err = combined_stylesheet_url(ENDPOINT, "Roboto", ["menu"]).unwrap_err();
        assert!(matches!(err, LoaderError::InvalidCatalogEntry { .. }));
    }
}
