//! Networking (HTTP, filesystem, Data URIs) for font-loader
//!
//! Provides implementations of the [`font_loader::providers`] collaborator traits:
//! - [`Provider`] downloads font binaries and stylesheets
//! - [`JsonCatalog`] answers family lookups from a catalog document
//! - [`StyleSheets`] holds the stylesheet text of every installed family

mod catalog;
mod error;
mod sheets;

use std::sync::Arc;

use bytes::Bytes;
use data_url::DataUrl;
use font_loader::{LoaderError, LoaderResult};
use font_loader::providers::{BinaryFetcher, StylesheetHandle, StylesheetInjector};
use futures_util::future::BoxFuture;
use reqwest::Client;
use url::Url;

pub use catalog::{CatalogDocument, JsonCatalog};
pub use error::ProviderError;
pub use sheets::{InstalledStylesheet, StyleSheets};

const USER_AGENT: &str = concat!("font-loader/", env!("CARGO_PKG_VERSION"));

/// Fetches `http(s)`, `file` and `data` URLs, and installs stylesheets into [`StyleSheets`]
#[derive(Clone)]
pub struct Provider {
    client: Client,
    sheets: StyleSheets,
}

impl Provider {
    pub fn new() -> Result<Self, ProviderError> {
        let builder = Client::builder().user_agent(USER_AGENT);
        #[cfg(feature = "cookies")]
        let builder = builder.cookie_store(true);

        Ok(Self::with_client(builder.build()?))
    }

    /// Use a preconfigured client, e.g. with proxies or custom roots
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            sheets: StyleSheets::default(),
        }
    }

    pub fn shared() -> Result<Arc<Self>, ProviderError> {
        Ok(Arc::new(Self::new()?))
    }

    /// Installed stylesheets, for the renderer to read
    pub fn sheets(&self) -> &StyleSheets {
        &self.sheets
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) async fn fetch_inner(client: &Client, url: &Url) -> Result<Bytes, ProviderError> {
        Ok(match url.scheme() {
            "data" => {
                let data_url = DataUrl::process(url.as_str())?;
                let decoded = data_url.decode_to_vec()?;
                Bytes::from(decoded.0)
            }
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| ProviderError::UnsupportedUrl(url.to_string()))?;
                Bytes::from(tokio::fs::read(path).await?)
            }
            "http" | "https" => {
                let response = client
                    .get(url.clone())
                    .send()
                    .await?
                    .error_for_status()?;
                response.bytes().await?
            }
            _ => return Err(ProviderError::UnsupportedUrl(url.to_string())),
        })
    }

    async fn fetch_logged(&self, url: &Url) -> Result<Bytes, ProviderError> {
        #[cfg(feature = "tracing")]
        tracing::debug!("Fetching {}", url);

        let result = Self::fetch_inner(&self.client, url).await;
        match &result {
            Ok(bytes) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(url = %url, bytes = bytes.len(), "Fetched");
                #[cfg(not(feature = "tracing"))]
                log::debug!("Fetched {} ({} bytes)", url, bytes.len());
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(url = %url, error = %e, "Font fetch failed");
                #[cfg(not(feature = "tracing"))]
                log::warn!("Error fetching {url}: {e}");
            }
        }
        result
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("sheets", &self.sheets.len())
            .finish_non_exhaustive()
    }
}

impl BinaryFetcher for Provider {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, LoaderResult<Bytes>> {
        Box::pin(async move {
            let url = Url::parse(url)?;
            Ok(self.fetch_logged(&url).await?)
        })
    }
}

impl StylesheetInjector for Provider {
    fn inject<'a>(
        &'a self,
        family: &'a str,
        url: &'a Url,
    ) -> BoxFuture<'a, LoaderResult<Box<dyn StylesheetHandle>>> {
        Box::pin(async move {
            let bytes = self.fetch_logged(url).await?;
            let invalid = |reason: &str| LoaderError::Stylesheet {
                family: family.to_string(),
                reason: reason.to_string(),
            };
            let css = String::from_utf8(bytes.to_vec()).map_err(|_| invalid("not UTF-8"))?;
            if !css.contains("@font-face") {
                return Err(invalid("no @font-face rule"));
            }

            let handle: Box<dyn StylesheetHandle> =
                Box::new(self.sheets.install(family, url.clone(), css));
            Ok(handle)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Provider {
        Provider::with_client(Client::new())
    }

    #[tokio::test]
    async fn fetches_data_urls() {
        let provider = provider();
        let bytes = provider
            .fetch("data:font/woff2;base64,d09GMmFiY2Q=")
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"wOF2abcd");
    }

    #[tokio::test]
    async fn fetches_file_urls() {
        let path = std::env::temp_dir().join(format!("font-net-{}.ttf", std::process::id()));
        std::fs::write(&path, [0x00, 0x01, 0x00, 0x00, 0x42]).unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let bytes = provider().fetch(url.as_str()).await.unwrap();
        assert_eq!(bytes.len(), 5);
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn rejects_unsupported_schemes() {
        let err = provider().fetch("ftp://fonts.example/a.ttf").await.unwrap_err();
        assert!(matches!(err, font_loader::LoaderError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn injected_stylesheet_lives_until_released() {
        let provider = provider();
        let url = Url::parse("data:text/css,@font-face%20%7Bfont-family:Lobster%7D").unwrap();

        let mut handle = provider.inject("Lobster", &url).await.unwrap();
        let installed = provider.sheets().get("Lobster").unwrap();
        assert!(installed.css.contains("font-family:Lobster"));
        assert_eq!(installed.url, url);

        handle.release();
        assert!(provider.sheets().get("Lobster").is_none());
    }

    #[tokio::test]
    async fn stylesheet_without_font_face_is_rejected() {
        let url = Url::parse("data:text/css,body%20%7B%7D").unwrap();
        let err = provider().inject("Lobster", &url).await.err().unwrap();
        assert!(matches!(err, font_loader::LoaderError::Stylesheet { .. }));
    }
}
