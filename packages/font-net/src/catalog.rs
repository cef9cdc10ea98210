use std::collections::HashMap;

use font_loader::LoaderResult;
use font_loader::providers::{CatalogEntry, FontCatalog};
use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use crate::{Provider, ProviderError};

/// Catalog listing in the web fonts API shape: `{"items": [{family, variants, files}]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub items: Vec<CatalogEntry>,
}

impl CatalogDocument {
    fn into_index(self) -> HashMap<String, CatalogEntry> {
        self.items
            .into_iter()
            .map(|entry| (entry.family.to_lowercase(), entry))
            .collect()
    }
}

/// Font catalog backed by a JSON listing, downloaded on first lookup
///
/// A failed download leaves the catalog empty so the next lookup tries again.
pub struct JsonCatalog {
    client: Client,
    source: Option<Url>,
    entries: OnceCell<HashMap<String, CatalogEntry>>,
}

impl JsonCatalog {
    pub fn new(provider: &Provider, source: Url) -> Self {
        Self {
            client: provider.client().clone(),
            source: Some(source),
            entries: OnceCell::new(),
        }
    }

    /// Catalog over an already loaded listing
    pub fn from_document(document: CatalogDocument) -> Self {
        Self {
            client: Client::new(),
            source: None,
            entries: OnceCell::new_with(Some(document.into_index())),
        }
    }

    pub fn parse(json: &str) -> Result<Self, ProviderError> {
        Ok(Self::from_document(serde_json::from_str(json)?))
    }

    async fn entries(&self) -> Result<&HashMap<String, CatalogEntry>, ProviderError> {
        self.entries.get_or_try_init(|| self.fetch_listing()).await
    }

    async fn fetch_listing(&self) -> Result<HashMap<String, CatalogEntry>, ProviderError> {
        let Some(source) = &self.source else {
            return Ok(HashMap::new());
        };
        let bytes = Provider::fetch_inner(&self.client, source).await?;
        let document: CatalogDocument = serde_json::from_slice(&bytes)?;
        log::info!("Loaded font catalog with {} families", document.items.len());
        Ok(document.into_index())
    }

    /// Number of families, if the listing has been loaded
    pub fn len(&self) -> Option<usize> {
        self.entries.get().map(HashMap::len)
    }
}

impl FontCatalog for JsonCatalog {
    fn find_font<'a>(
        &'a self,
        family: &'a str,
    ) -> BoxFuture<'a, LoaderResult<Option<CatalogEntry>>> {
        Box::pin(async move {
            let entries = self.entries().await?;
            Ok(entries.get(&family.to_lowercase()).cloned())
        })
    }
}

impl std::fmt::Debug for JsonCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonCatalog")
            .field("source", &self.source)
            .field("families", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "kind": "webfonts#webfontList",
        "items": [
            {
                "family": "Roboto",
                "category": "sans-serif",
                "variants": ["regular", "italic", "700"],
                "files": {
                    "regular": "https://fonts.gstatic.com/s/roboto/v30/regular.ttf",
                    "700": "https://fonts.gstatic.com/s/roboto/v30/700.ttf"
                }
            },
            { "family": "Lobster", "variants": ["regular"] }
        ]
    }"#;

    #[tokio::test]
    async fn lookup_ignores_case() {
        let catalog = JsonCatalog::parse(LISTING).unwrap();
        let entry = catalog.find_font("roboto").await.unwrap().unwrap();

        assert_eq!(entry.family, "Roboto");
        assert_eq!(entry.variants, vec!["regular", "italic", "700"]);
        assert_eq!(
            entry.file_for("400"),
            Some("https://fonts.gstatic.com/s/roboto/v30/regular.ttf")
        );
        assert_eq!(catalog.len(), Some(2));
    }

    #[tokio::test]
    async fn unknown_family_is_absent() {
        let catalog = JsonCatalog::parse(LISTING).unwrap();
        assert!(catalog.find_font("Comic Neue").await.unwrap().is_none());
        // Entries without files still resolve
        let lobster = catalog.find_font("Lobster").await.unwrap().unwrap();
        assert!(lobster.files.is_empty());
    }

    #[tokio::test]
    async fn listing_is_fetched_from_data_url() {
        let provider = Provider::with_client(Client::new());
        let source = Url::parse(
            "data:application/json,%7B%22items%22:%5B%7B%22family%22:%22Inter%22,%22variants%22:%5B%22regular%22%5D%7D%5D%7D",
        )
        .unwrap();
        let catalog = JsonCatalog::new(&provider, source);
        assert_eq!(catalog.len(), None);

        assert!(catalog.find_font("Inter").await.unwrap().is_some());
        assert_eq!(catalog.len(), Some(1));
    }

    #[test]
    fn malformed_listing_is_an_error() {
        assert!(matches!(
            JsonCatalog::parse("{\"items\": 3}"),
            Err(ProviderError::Json(_))
        ));
    }
}
