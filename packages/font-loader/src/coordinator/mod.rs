//! Admission control, the pending queue and retry orchestration
//!
//! A family moves through `idle → queued → active → loaded | failed`. At most
//! `max_concurrent_loads` families are active at once; everything else waits
//! in a priority queue that is drained whenever a load reaches a terminal
//! state or the network comes back.

mod backoff;
mod queue;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::time::Instant;
use url::Url;

pub use backoff::Backoff;
pub use queue::{LoadQueue, LoadQueueItem, QueuePush};

use crate::cache::{BinaryCache, ResourceHandle, StylesheetResourceTracker, StylesheetTracker};
use crate::config::FontLoaderConfig;
use crate::error::report::user_friendly_message;
use crate::error::{ErrorHandler, ErrorId, ErrorReport, ErrorSeverity, LoaderError, LoaderResult};
use crate::format::validate_font_data;
use crate::network::NetworkStateMonitor;
use crate::providers::{
    BinaryFetcher, CatalogEntry, FontCatalog, FontDetector, StylesheetInjector, normalize_family,
};
use crate::registry::FontRegistry;
use crate::types::{
    DEFAULT_FONT_WEIGHT, FontIdentity, FontLoadStatus, FontStyle, LoadOptions, LoadPurpose,
};
use crate::variants::{
    combined_stylesheet_url, discover_available_variants, parse_variant, preview_stylesheet_url,
    resolve, variant_token,
};

/// Bookkeeping of a family whose load exhausted its attempts
#[derive(Debug, Clone, PartialEq)]
pub struct FailedLoad {
    pub count: u32,
    pub error: LoaderError,
    pub error_id: ErrorId,
    pub purpose: LoadPurpose,
    pub fallback: String,
    pub last_attempt: Instant,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    queue: LoadQueue,
    active: HashSet<String>,
    loaded: HashMap<String, LoadPurpose>,
    failed: HashMap<String, FailedLoad>,
}

/// Components the coordinator drives
pub(crate) struct Collaborators {
    pub catalog: Arc<dyn FontCatalog>,
    pub detector: Arc<dyn FontDetector>,
    pub injector: Arc<dyn StylesheetInjector>,
    pub fetcher: Arc<dyn BinaryFetcher>,
    pub network: Arc<NetworkStateMonitor>,
    pub binaries: Arc<BinaryCache>,
    pub stylesheets: Arc<StylesheetResourceTracker>,
    pub errors: Arc<ErrorHandler>,
    pub registry: Arc<FontRegistry>,
}

/// The scheduler behind every load request
pub struct FontLoadCoordinator {
    config: FontLoaderConfig,
    backoff: Backoff,
    catalog: Arc<dyn FontCatalog>,
    detector: Arc<dyn FontDetector>,
    injector: Arc<dyn StylesheetInjector>,
    fetcher: Arc<dyn BinaryFetcher>,
    network: Arc<NetworkStateMonitor>,
    binaries: Arc<BinaryCache>,
    stylesheets: Arc<StylesheetResourceTracker>,
    errors: Arc<ErrorHandler>,
    registry: Arc<FontRegistry>,
    state: Mutex<CoordinatorState>,
}

impl FontLoadCoordinator {
    pub(crate) fn new(config: FontLoaderConfig, parts: Collaborators) -> Self {
        let backoff = Backoff {
            base: config.retry_base_delay,
            jitter: config.retry_jitter_max,
            max: config.retry_max_delay,
        };

        Self {
            config,
            backoff,
            catalog: parts.catalog,
            detector: parts.detector,
            injector: parts.injector,
            fetcher: parts.fetcher,
            network: parts.network,
            binaries: parts.binaries,
            stylesheets: parts.stylesheets,
            errors: parts.errors,
            registry: parts.registry,
            state: Mutex::new(CoordinatorState::default()),
        }
    }

    /// Request a family; never fails, outcomes are observed through status queries
    ///
    /// Returns once the request is queued, skipped, or has run to a terminal state.
    pub async fn load(self: &Arc<Self>, family: &str, options: LoadOptions) {
        let family = normalize_family(family);
        if family.is_empty() {
            self.errors.report(
                ErrorReport::from_loader_error(&LoaderError::InvalidFamily(family.to_string()))
                    .with_severity(ErrorSeverity::Low),
            );
            return;
        }

        if self.admit(family, options) {
            self.run_load(family.to_string(), options.purpose).await;
        }
    }

    /// Admission decision; `true` means the caller now owns the active slot for `family`
    fn admit(self: &Arc<Self>, family: &str, options: LoadOptions) -> bool {
        let available = self.network_available();
        let mut state = self.state.lock();

        if state.active.contains(family) {
            log::debug!("{} is already loading, ignoring {} request", family, options.purpose);
            return false;
        }

        if !options.force_reload {
            if let Some(&loaded) = state.loaded.get(family) {
                let upgrade =
                    loaded == LoadPurpose::Preview && options.purpose == LoadPurpose::TextEditing;
                if !upgrade {
                    return false;
                }
                log::debug!("Upgrading {} from preview to text editing", family);
            }
        }

        if self.detector.is_local_font(family) || self.detector.is_icon_font(family) {
            log::debug!("Skipping {}: not a remotely hosted font", family);
            return false;
        }

        if !available || state.active.len() >= self.config.max_concurrent_loads {
            let pushed = state.queue.push(LoadQueueItem {
                family: family.to_string(),
                priority: options.priority,
                purpose: options.purpose,
            });
            match pushed {
                QueuePush::Added => log::debug!(
                    "Queued {} ({:?}, {}), {} pending",
                    family,
                    options.priority,
                    options.purpose,
                    state.queue.len()
                ),
                QueuePush::Upgraded => log::debug!(
                    "Upgraded queued load of {} with {:?} {} request",
                    family,
                    options.priority,
                    options.purpose
                ),
                QueuePush::Unchanged => {}
            }
            return false;
        }

        state.queue.remove(family);
        state.active.insert(family.to_string());
        true
    }

    /// Run an admitted load to its terminal state, then schedule a queue drain
    async fn run_load(self: &Arc<Self>, family: String, purpose: LoadPurpose) {
        let outcome = self.perform_load(&family, purpose).await;
        let tracked_purpose = self
            .stylesheets
            .get(&family)
            .map(|tracker| tracker.purpose)
            .unwrap_or(purpose);

        {
            let mut state = self.state.lock();
            state.active.remove(&family);
            match outcome {
                Ok(()) => {
                    state.loaded.insert(family.clone(), tracked_purpose);
                    state.failed.remove(&family);
                }
                Err(failed) => {
                    state.failed.insert(family.clone(), failed);
                }
            }
        }

        self.schedule_queue_drain();
    }

    async fn perform_load(&self, family: &str, purpose: LoadPurpose) -> Result<(), FailedLoad> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.attempt_load(family, purpose).await {
                Ok(()) => {
                    log::info!("Loaded {} for {}", family, purpose);
                    return Ok(());
                }
                Err(error) => error,
            };

            if attempt >= self.config.max_retry_attempts || !error.is_recoverable() {
                return Err(self.fail_terminally(family, purpose, error, attempt));
            }

            self.errors.report(
                ErrorReport::from_loader_error(&error)
                    .with_family(family)
                    .with_severity(ErrorSeverity::Medium)
                    .with_retry_count(attempt),
            );

            let delay = self.backoff.delay(attempt);
            log::warn!(
                "Loading {} failed (attempt {}/{}), retrying in {:?}: {}",
                family,
                attempt,
                self.config.max_retry_attempts,
                delay,
                error
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn fail_terminally(
        &self,
        family: &str,
        purpose: LoadPurpose,
        error: LoaderError,
        attempts: u32,
    ) -> FailedLoad {
        let fallback = self.errors.fallback_for(family);
        let error_id = self.errors.report(
            ErrorReport::from_loader_error(&error)
                .with_family(family)
                .with_severity(ErrorSeverity::High)
                .with_retry_count(attempts)
                .with_user_message(user_friendly_message(error.category(), Some(family))),
        );

        log::error!(
            "Giving up on {} after {} attempt(s), falling back to {}: {}",
            family,
            attempts,
            fallback,
            error
        );

        if error.is_network() && !self.errors.is_offline_mode() {
            self.errors.enable_offline_mode();
        }

        FailedLoad {
            count: attempts,
            error,
            error_id,
            purpose,
            fallback,
            last_attempt: Instant::now(),
        }
    }

    async fn attempt_load(&self, family: &str, purpose: LoadPurpose) -> LoaderResult<()> {
        if !self.network.is_available() {
            return Err(LoaderError::Offline);
        }

        let entry = self.find_catalog_entry(family).await?;
        let available = discover_available_variants(&entry.variants);
        let endpoint = self.config.stylesheet_endpoint.as_str();

        let url = if purpose == LoadPurpose::Preview {
            let token = resolve(&available, DEFAULT_FONT_WEIGHT, FontStyle::Normal)
                .and_then(|token| parse_variant(&token))
                .ok_or_else(|| LoaderError::InvalidCatalogEntry {
                    family: family.to_string(),
                    reason: "no suitable variant".to_string(),
                })?;
            preview_stylesheet_url(endpoint, family, token.0, token.1)?
        } else {
            combined_stylesheet_url(endpoint, family, available.iter().map(String::as_str))?
        };

        self.install_stylesheet(family, url, purpose).await?;

        if purpose.needs_binaries() {
            self.load_variant_binaries(family, &entry, &available).await;
        }

        Ok(())
    }

    /// Inject or reuse the family's stylesheet, keeping one tracker entry per family
    async fn install_stylesheet(
        &self,
        family: &str,
        url: Url,
        purpose: LoadPurpose,
    ) -> LoaderResult<()> {
        if let Some(existing) = self.stylesheets.get(family) {
            let covered = existing.purpose != LoadPurpose::Preview && purpose == LoadPurpose::Preview;
            if existing.url == url || covered {
                self.stylesheets.touch(family);
                self.stylesheets.promote(family, purpose);
                return Ok(());
            }
        }

        let handle = self
            .with_timeout(self.injector.inject(family, &url))
            .await
            .map_err(|error| match error {
                LoaderError::Timeout(_) | LoaderError::Offline | LoaderError::Network(_) => error,
                other => LoaderError::Stylesheet {
                    family: family.to_string(),
                    reason: other.to_string(),
                },
            })?;
        let handle = ResourceHandle::new(handle);

        if let Err(handle) = self
            .stylesheets
            .replace_handle(family, handle, url.clone(), purpose)
        {
            self.stylesheets
                .add(family, StylesheetTracker::new(handle, purpose, url));
        }
        Ok(())
    }

    /// Fetch every variant concurrently and register the ones that arrive
    async fn load_variant_binaries(
        &self,
        family: &str,
        entry: &CatalogEntry,
        available: &HashSet<String>,
    ) {
        let faces: HashSet<(u16, FontStyle)> = available
            .iter()
            .filter_map(|token| parse_variant(token))
            .collect();

        let fetches = faces.into_iter().map(|(weight, style)| async move {
            let identity = FontIdentity::new(family, weight, style);
            let result = self.fetch_face(&identity, entry).await;
            (identity, result)
        });

        let mut registered = 0;
        for (identity, result) in join_all(fetches).await {
            match result {
                Ok(_) => {
                    self.registry.register(identity);
                    registered += 1;
                }
                Err(error) => log::warn!("Failed to load binary for {}: {}", identity, error),
            }
        }
        log::debug!("Registered {} variant(s) of {}", registered, family);
    }

    /// Payload of an exact catalog face, through the cache
    async fn fetch_face(&self, identity: &FontIdentity, entry: &CatalogEntry) -> LoaderResult<Bytes> {
        if let Some(buffer) = self.binaries.get(identity) {
            return Ok(buffer);
        }

        let token = variant_token(identity.weight, identity.style);
        let url = entry
            .file_for(&token)
            .ok_or_else(|| LoaderError::InvalidCatalogEntry {
                family: identity.family.clone(),
                reason: format!("no file for variant {}", token),
            })?;

        let buffer = self.fetch_with_retries(url).await?;
        self.binaries.put(identity.clone(), buffer.clone());
        Ok(buffer)
    }

    /// Binary payload for the face closest to `(weight, style)`
    ///
    /// The buffer is cached under the requested identity, so a later call
    /// with the same arguments is served from the cache.
    pub async fn load_binary(
        self: &Arc<Self>,
        family: &str,
        weight: u16,
        style: FontStyle,
    ) -> Option<Bytes> {
        let family = normalize_family(family);
        let identity = FontIdentity::new(family, weight, style);
        if let Some(buffer) = self.binaries.get(&identity) {
            return Some(buffer);
        }

        if !self.network_available() {
            log::debug!("Offline, no binary for {}", identity);
            return None;
        }

        if self.detector.is_icon_font(family) || self.detector.is_local_font(family) {
            return None;
        }

        match self.fetch_resolved_binary(&identity).await {
            Ok((resolved, buffer)) => {
                self.binaries.put(identity, buffer.clone());
                self.registry.register(resolved);
                Some(buffer)
            }
            Err(error) => {
                self.errors.report(
                    ErrorReport::from_loader_error(&error)
                        .with_family(family)
                        .with_severity(ErrorSeverity::Medium),
                );
                None
            }
        }
    }

    async fn fetch_resolved_binary(
        &self,
        identity: &FontIdentity,
    ) -> LoaderResult<(FontIdentity, Bytes)> {
        let entry = self.find_catalog_entry(&identity.family).await?;
        let available = discover_available_variants(&entry.variants);
        let token = resolve(&available, identity.weight, identity.style).ok_or_else(|| {
            LoaderError::InvalidCatalogEntry {
                family: identity.family.clone(),
                reason: "no variants".to_string(),
            }
        })?;

        let url = entry
            .file_for(&token)
            .ok_or_else(|| LoaderError::InvalidCatalogEntry {
                family: identity.family.clone(),
                reason: format!("no file for variant {}", token),
            })?;

        let (weight, style) = parse_variant(&token).unwrap_or((identity.weight, identity.style));
        let buffer = self.fetch_with_retries(url).await?;
        Ok((FontIdentity::new(identity.family.clone(), weight, style), buffer))
    }

    async fn fetch_with_retries(&self, url: &str) -> LoaderResult<Bytes> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.fetch_once(url).await {
                Ok(buffer) => return Ok(buffer),
                Err(error) => error,
            };

            if attempt >= self.config.max_retry_attempts || !error.is_recoverable() {
                return Err(error);
            }

            let delay = self.backoff.delay(attempt);
            log::warn!(
                "Binary fetch {} failed (attempt {}), retrying in {:?}: {}",
                url,
                attempt,
                delay,
                error
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn fetch_once(&self, url: &str) -> LoaderResult<Bytes> {
        let buffer = self.with_timeout(self.fetcher.fetch(url)).await?;
        validate_font_data(&buffer, self.config.max_binary_size)?;
        Ok(buffer)
    }

    async fn find_catalog_entry(&self, family: &str) -> LoaderResult<CatalogEntry> {
        let entry = self
            .with_timeout(self.catalog.find_font(family))
            .await?
            .ok_or_else(|| LoaderError::NotInCatalog(family.to_string()))?;

        if entry.variants.is_empty() {
            return Err(LoaderError::InvalidCatalogEntry {
                family: family.to_string(),
                reason: "no variants".to_string(),
            });
        }
        Ok(entry)
    }

    async fn with_timeout<T, F>(&self, fut: F) -> LoaderResult<T>
    where
        F: Future<Output = LoaderResult<T>>,
    {
        let timeout = self.config.request_timeout;
        tokio::time::timeout(timeout, fut)
            .await
            .unwrap_or_else(|_| Err(LoaderError::Timeout(timeout_millis(timeout))))
    }

    fn schedule_queue_drain(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let delay = self.config.queue_process_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.process_queue();
        });
    }

    /// Move queued families into free active slots
    pub fn process_queue(self: &Arc<Self>) {
        if !self.network_available() {
            let pending = self.state.lock().queue.len();
            if pending > 0 {
                log::debug!("Network unavailable, {} load(s) stay queued", pending);
            }
            return;
        }

        loop {
            let item = {
                let mut state = self.state.lock();
                if state.active.len() >= self.config.max_concurrent_loads {
                    break;
                }
                let Some(item) = state.queue.pop() else {
                    break;
                };
                state.active.insert(item.family.clone());
                item
            };

            log::debug!("Dispatching queued load for {}", item.family);
            let this = Arc::clone(self);
            tokio::spawn(async move {
                this.run_load(item.family, item.purpose).await;
            });
        }
    }

    /// Availability check that also reacts to a recovery noticed on a stale re-probe
    ///
    /// Every stale re-probe goes through here so the recovery transition always
    /// leaves offline mode and drains the queue.
    pub fn network_available(self: &Arc<Self>) -> bool {
        if self.network.refresh_if_stale() {
            self.on_network_recovered();
        }
        self.network.is_available()
    }

    /// Leave offline mode and drain the queue after connectivity returns
    pub fn on_network_recovered(self: &Arc<Self>) {
        log::info!("Network available again, resuming queued font loads");
        if self.errors.is_offline_mode() {
            self.errors.disable_offline_mode();
        }
        self.process_queue();
    }

    /// Forget families whose stylesheets were evicted so a later request reloads them
    pub(crate) fn forget_loaded(&self, families: &[String]) {
        if families.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        for family in families {
            state.loaded.remove(family);
        }
    }

    /// Retry a failed family once its backoff window has passed
    ///
    /// Returns `false` without doing anything when the family has not failed
    /// or the window is still open.
    pub async fn retry_failed(self: &Arc<Self>, family: &str) -> bool {
        let family = normalize_family(family);
        let purpose = {
            let state = self.state.lock();
            match state.failed.get(family) {
                Some(failed) if failed.last_attempt.elapsed() >= self.backoff.base_delay(failed.count) => {
                    failed.purpose
                }
                Some(_) => {
                    log::debug!("Retry of {} requested before its backoff elapsed", family);
                    return false;
                }
                None => return false,
            }
        };

        log::info!("Retrying failed font {}", family);
        let options = LoadOptions::default().with_purpose(purpose).force_reload();
        self.load(family, options).await;
        true
    }

    pub fn status(&self, family: &str) -> FontLoadStatus {
        let state = self.state.lock();
        if state.active.contains(family) {
            FontLoadStatus::Active
        } else if state.queue.contains(family) {
            FontLoadStatus::Queued
        } else if state.loaded.contains_key(family) {
            FontLoadStatus::Loaded
        } else if state.failed.contains_key(family) {
            FontLoadStatus::Failed
        } else {
            FontLoadStatus::Idle
        }
    }

    pub fn is_loaded(&self, family: &str) -> bool {
        self.state.lock().loaded.contains_key(family)
    }

    pub fn is_loading(&self, family: &str) -> bool {
        let state = self.state.lock();
        state.active.contains(family) || state.queue.contains(family)
    }

    pub fn loaded_purpose(&self, family: &str) -> Option<LoadPurpose> {
        self.state.lock().loaded.get(family).copied()
    }

    pub fn failed_load(&self, family: &str) -> Option<FailedLoad> {
        self.state.lock().failed.get(family).cloned()
    }

    pub fn active_count(&self) -> usize {
        self.state.lock().active.len()
    }

    pub fn active_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self.state.lock().active.iter().cloned().collect();
        families.sort();
        families
    }

    pub fn queued_families(&self) -> Vec<String> {
        self.state.lock().queue.families()
    }

    pub fn loaded_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self.state.lock().loaded.keys().cloned().collect();
        families.sort();
        families
    }
}

/// Whole milliseconds of `timeout`, saturating at `u64::MAX`
fn timeout_millis(timeout: std::time::Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for FontLoadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontLoadCoordinator")
            .field("state", &*self.state.lock())
            .field("max_concurrent_loads", &self.config.max_concurrent_loads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::timeout_millis;

    #[test]
    fn timeout_millis_saturates() {
        assert_eq!(timeout_millis(Duration::from_secs(10)), 10_000);
        assert_eq!(timeout_millis(Duration::from_micros(1_500)), 1);
        assert_eq!(timeout_millis(Duration::MAX), u64::MAX);
    }
}
