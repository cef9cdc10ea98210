use std::sync::Arc;

use crate::cache::{BinaryCache, StylesheetResourceTracker};
use crate::config::FontLoaderConfig;
use crate::coordinator::{Collaborators, FontLoadCoordinator};
use crate::error::{ErrorHandler, LoaderError, LoaderResult};
use crate::network::NetworkStateMonitor;
use crate::providers::{
    AssumeOnline, BinaryFetcher, ConnectivityProbe, FontCatalog, FontDetector, HistoryStore,
    MemoryHistoryStore, NoopUsageScanner, StylesheetInjector, UsageScanner, WebSafeFontDetector,
};
use crate::registry::FontRegistry;
use crate::subsystem::{FontSubsystem, SubsystemParts};

/// Fluent builder wiring collaborators into a [`FontSubsystem`]
///
/// The catalog, the stylesheet injector and the binary fetcher are required;
/// everything else has an in-process default.
pub struct FontSubsystemBuilder {
    catalog: Arc<dyn FontCatalog>,
    injector: Arc<dyn StylesheetInjector>,
    fetcher: Arc<dyn BinaryFetcher>,
    detector: Arc<dyn FontDetector>,
    usage_scanner: Arc<dyn UsageScanner>,
    history_store: Arc<dyn HistoryStore>,
    connectivity: Arc<dyn ConnectivityProbe>,
    config: FontLoaderConfig,
}

impl FontSubsystemBuilder {
    pub fn new(
        catalog: Arc<dyn FontCatalog>,
        injector: Arc<dyn StylesheetInjector>,
        fetcher: Arc<dyn BinaryFetcher>,
    ) -> Self {
        Self {
            catalog,
            injector,
            fetcher,
            detector: Arc::new(WebSafeFontDetector),
            usage_scanner: Arc::new(NoopUsageScanner),
            history_store: Arc::new(MemoryHistoryStore::new()),
            connectivity: Arc::new(AssumeOnline),
            config: FontLoaderConfig::default(),
        }
    }

    #[inline]
    pub fn with_detector(mut self, detector: Arc<dyn FontDetector>) -> Self {
        self.detector = detector;
        self
    }

    #[inline]
    pub fn with_usage_scanner(mut self, scanner: Arc<dyn UsageScanner>) -> Self {
        self.usage_scanner = scanner;
        self
    }

    #[inline]
    pub fn with_history_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history_store = store;
        self
    }

    #[inline]
    pub fn with_connectivity_probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.connectivity = probe;
        self
    }

    #[inline]
    pub fn with_config(mut self, config: FontLoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate configuration before building
    pub fn validate(&self) -> LoaderResult<()> {
        self.config.validate()
    }

    /// Build the subsystem, spawning its maintenance task when enabled
    ///
    /// # Errors
    /// Returns `LoaderError::Config` for an invalid configuration, or when
    /// background tasks are enabled outside a tokio runtime.
    pub fn build(self) -> LoaderResult<FontSubsystem> {
        self.validate()?;

        let runtime = if self.config.background_tasks {
            Some(tokio::runtime::Handle::try_current().map_err(|_| {
                LoaderError::Config(
                    "Background tasks require a running tokio runtime".to_string(),
                )
            })?)
        } else {
            None
        };

        let config = self.config;
        let network = Arc::new(NetworkStateMonitor::new(
            self.connectivity,
            config.network_staleness,
        ));
        let binaries = Arc::new(BinaryCache::new(config.binary_cache_expiry));
        let stylesheets = Arc::new(StylesheetResourceTracker::new());
        let errors = Arc::new(ErrorHandler::new(config.recent_errors_capacity));
        let registry = Arc::new(FontRegistry::new(
            self.history_store,
            config.history_capacity,
        ));

        let coordinator = Arc::new(FontLoadCoordinator::new(
            config.clone(),
            Collaborators {
                catalog: self.catalog,
                detector: self.detector,
                injector: self.injector,
                fetcher: self.fetcher,
                network: Arc::clone(&network),
                binaries: Arc::clone(&binaries),
                stylesheets: Arc::clone(&stylesheets),
                errors: Arc::clone(&errors),
                registry: Arc::clone(&registry),
            },
        ));

        let mut subsystem = FontSubsystem::from_parts(SubsystemParts {
            config,
            coordinator,
            network,
            binaries,
            stylesheets,
            errors,
            registry,
            usage: self.usage_scanner,
        });

        if let Some(runtime) = runtime {
            subsystem.start_maintenance(&runtime);
        }

        log::debug!("Font subsystem ready");
        Ok(subsystem)
    }
}

impl std::fmt::Debug for FontSubsystemBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSubsystemBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
