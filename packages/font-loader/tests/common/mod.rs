//! In-memory collaborators shared by the scenario tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use font_loader::prelude::*;
use font_loader::providers::StylesheetHandle;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;

/// Catalog serving fixed entries, with optional latency and injected failures
#[derive(Default)]
pub struct FakeCatalog {
    entries: Mutex<HashMap<String, CatalogEntry>>,
    failing: Mutex<HashMap<String, LoaderError>>,
    latency: Mutex<Duration>,
    pub lookups: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Publish `family` with the given variant tokens and a file per token
    pub fn publish(&self, family: &str, variants: &[&str]) {
        let entry = variants.iter().fold(CatalogEntry::new(family), |entry, token| {
            entry.with_variant(*token, file_url(family, token))
        });
        self.entries.lock().insert(family.to_string(), entry);
    }

    pub fn publish_entry(&self, entry: CatalogEntry) {
        self.entries.lock().insert(entry.family.clone(), entry);
    }

    pub fn fail(&self, family: &str, error: LoaderError) {
        self.failing.lock().insert(family.to_string(), error);
    }

    pub fn heal(&self, family: &str) {
        self.failing.lock().remove(family);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }
}

impl FontCatalog for FakeCatalog {
    fn find_font<'a>(&'a self, family: &'a str) -> BoxFuture<'a, LoaderResult<Option<CatalogEntry>>> {
        Box::pin(async move {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let latency = *self.latency.lock();
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }

            if let Some(error) = self.failing.lock().get(family).cloned() {
                return Err(error);
            }
            Ok(self.entries.lock().get(family).cloned())
        })
    }
}

pub fn file_url(family: &str, token: &str) -> String {
    format!(
        "https://fonts.example/{}-{}.woff2",
        family.replace(' ', ""),
        token
    )
}

struct CountingHandle {
    released: Arc<AtomicUsize>,
}

impl StylesheetHandle for CountingHandle {
    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every injected stylesheet URL and counts releases
#[derive(Default)]
pub struct FakeInjector {
    pub urls: Mutex<Vec<String>>,
    pub released: Arc<AtomicUsize>,
}

impl FakeInjector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn injected(&self) -> usize {
        self.urls.lock().len()
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl StylesheetInjector for FakeInjector {
    fn inject<'a>(
        &'a self,
        _family: &'a str,
        url: &'a url::Url,
    ) -> BoxFuture<'a, LoaderResult<Box<dyn StylesheetHandle>>> {
        Box::pin(async move {
            self.urls.lock().push(url.to_string());
            let handle: Box<dyn StylesheetHandle> = Box::new(CountingHandle {
                released: Arc::clone(&self.released),
            });
            Ok(handle)
        })
    }
}

/// Serves a WOFF2-signed payload for any URL not marked broken or hung
#[derive(Default)]
pub struct FakeFetcher {
    broken: Mutex<HashSet<String>>,
    hung: Mutex<HashSet<String>>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn break_url(&self, url: String) {
        self.broken.lock().insert(url);
    }

    /// Never answer for `url` within any sane timeout
    pub fn hang_url(&self, url: String) {
        self.hung.lock().insert(url);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().len()
    }
}

impl BinaryFetcher for FakeFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, LoaderResult<Bytes>> {
        Box::pin(async move {
            self.fetched.lock().push(url.to_string());
            let hung = self.hung.lock().contains(url);
            if hung {
                tokio::time::sleep(Duration::from_secs(60 * 60)).await;
            }
            if self.broken.lock().contains(url) {
                return Err(LoaderError::Network(format!("connection reset: {}", url)));
            }
            let mut payload = b"wOF2".to_vec();
            payload.extend_from_slice(url.as_bytes());
            Ok(Bytes::from(payload))
        })
    }
}

pub struct SwitchProbe(Mutex<ConnectionInfo>);

impl SwitchProbe {
    pub fn new(info: ConnectionInfo) -> Arc<Self> {
        Arc::new(Self(Mutex::new(info)))
    }

    pub fn set(&self, info: ConnectionInfo) {
        *self.0.lock() = info;
    }
}

impl ConnectivityProbe for SwitchProbe {
    fn probe(&self) -> ConnectionInfo {
        self.0.lock().clone()
    }
}

#[derive(Default)]
pub struct FixedUsage(pub Mutex<HashSet<String>>);

impl FixedUsage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn show(&self, family: &str) {
        self.0.lock().insert(format!("\"{}\"", family));
    }
}

impl UsageScanner for FixedUsage {
    fn currently_rendered_families(&self) -> HashSet<String> {
        self.0.lock().clone()
    }
}

/// Everything a scenario needs to poke at
pub struct Harness {
    pub fonts: Arc<FontSubsystem>,
    pub catalog: Arc<FakeCatalog>,
    pub injector: Arc<FakeInjector>,
    pub fetcher: Arc<FakeFetcher>,
    pub probe: Arc<SwitchProbe>,
    pub usage: Arc<FixedUsage>,
}

pub struct HarnessBuilder {
    config: FontLoaderConfig,
    connection: ConnectionInfo,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            config: FontLoaderConfig::default().without_background_tasks(),
            connection: ConnectionInfo::online(),
        }
    }

    pub fn offline(mut self) -> Self {
        self.connection = ConnectionInfo::offline();
        self
    }

    pub fn with_background_tasks(mut self) -> Self {
        self.config.background_tasks = true;
        self
    }

    pub fn configure(mut self, f: impl FnOnce(FontLoaderConfig) -> FontLoaderConfig) -> Self {
        self.config = f(self.config);
        self
    }

    pub fn build(self) -> Harness {
        let catalog = FakeCatalog::new();
        for family in ["Roboto", "Lobster", "Open Sans", "Great Vibes"] {
            catalog.publish(family, &["regular", "italic", "700", "700italic"]);
        }
        let injector = FakeInjector::new();
        let fetcher = FakeFetcher::new();
        let probe = SwitchProbe::new(self.connection);
        let usage = FixedUsage::new();

        let fonts = FontSubsystemBuilder::new(catalog.clone(), injector.clone(), fetcher.clone())
            .with_connectivity_probe(probe.clone())
            .with_usage_scanner(usage.clone())
            .with_config(self.config)
            .build()
            .expect("valid test configuration");

        Harness {
            fonts: Arc::new(fonts),
            catalog,
            injector,
            fetcher,
            probe,
            usage,
        }
    }
}

pub fn harness() -> Harness {
    HarnessBuilder::new().build()
}

/// Let spawned tasks run up to their next suspension point
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
