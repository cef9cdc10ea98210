use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cache::{
    BinaryCache, BinaryCacheStats, StylesheetResourceTracker, SweepPolicy, TrackerInfo,
};
use crate::config::FontLoaderConfig;
use crate::coordinator::{FailedLoad, FontLoadCoordinator};
use crate::error::fallback::fallback_postscript_name;
use crate::error::{ErrorHandler, ErrorId, FontError, RecoveryAction, UserNotification};
use crate::network::{NetworkSnapshot, NetworkStateMonitor};
use crate::providers::{ConnectionInfo, UsageScanner, normalize_family};
use crate::registry::{FontRegistry, RegisteredVariant};
use crate::types::{FontDescriptor, FontLoadStatus, FontStyle, LoadOptions, LoadPurpose};

/// What [`FontSubsystem::recover`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The family load was re-run
    Retried { family: String, loaded: bool },
    /// Family to render with instead
    Fallback { family: String, fallback: String },
    OfflineModeEnabled,
    Dismissed,
    /// The action is not offered for this error, or the error is unknown
    NotApplicable,
}

/// Single entry point for loading, querying and recovering fonts
///
/// Owns every component and wires them by constructor injection. Build one
/// with [`crate::FontSubsystemBuilder`].
pub struct FontSubsystem {
    config: FontLoaderConfig,
    coordinator: Arc<FontLoadCoordinator>,
    network: Arc<NetworkStateMonitor>,
    binaries: Arc<BinaryCache>,
    stylesheets: Arc<StylesheetResourceTracker>,
    errors: Arc<ErrorHandler>,
    registry: Arc<FontRegistry>,
    usage: Arc<dyn UsageScanner>,
    maintenance: Option<JoinHandle<()>>,
}

pub(crate) struct SubsystemParts {
    pub config: FontLoaderConfig,
    pub coordinator: Arc<FontLoadCoordinator>,
    pub network: Arc<NetworkStateMonitor>,
    pub binaries: Arc<BinaryCache>,
    pub stylesheets: Arc<StylesheetResourceTracker>,
    pub errors: Arc<ErrorHandler>,
    pub registry: Arc<FontRegistry>,
    pub usage: Arc<dyn UsageScanner>,
}

impl FontSubsystem {
    pub(crate) fn from_parts(parts: SubsystemParts) -> Self {
        Self {
            config: parts.config,
            coordinator: parts.coordinator,
            network: parts.network,
            binaries: parts.binaries,
            stylesheets: parts.stylesheets,
            errors: parts.errors,
            registry: parts.registry,
            usage: parts.usage,
            maintenance: None,
        }
    }

    /// Spawn the network refresh / stylesheet sweep task on the current runtime
    pub(crate) fn start_maintenance(&mut self, runtime: &tokio::runtime::Handle) {
        let task = MaintenanceTask {
            coordinator: Arc::clone(&self.coordinator),
            network: Arc::clone(&self.network),
            stylesheets: Arc::clone(&self.stylesheets),
            usage: Arc::clone(&self.usage),
            config: self.config.clone(),
        };
        self.maintenance = Some(runtime.spawn(task.run()));
    }

    pub async fn load_for_preview(&self, family: &str) {
        self.coordinator.load(family, LoadOptions::preview()).await;
    }

    pub async fn load_for_text_editing(&self, family: &str) {
        self.coordinator.load(family, LoadOptions::text_editing()).await;
    }

    pub async fn load_with_options(&self, family: &str, options: LoadOptions) {
        self.coordinator.load(family, options).await;
    }

    pub fn is_loaded(&self, family: &str) -> bool {
        self.coordinator.is_loaded(normalize_family(family))
    }

    pub fn is_loading(&self, family: &str) -> bool {
        self.coordinator.is_loading(normalize_family(family))
    }

    pub fn is_registered(&self, family: &str) -> bool {
        self.registry.is_registered(normalize_family(family))
    }

    pub fn status(&self, family: &str) -> FontLoadStatus {
        self.coordinator.status(normalize_family(family))
    }

    pub fn loaded_purpose(&self, family: &str) -> Option<LoadPurpose> {
        self.coordinator.loaded_purpose(normalize_family(family))
    }

    pub fn failed_load(&self, family: &str) -> Option<FailedLoad> {
        self.coordinator.failed_load(normalize_family(family))
    }

    pub fn loaded_families(&self) -> Vec<String> {
        self.coordinator.loaded_families()
    }

    pub fn registered_families(&self) -> Vec<String> {
        self.registry.registered_families()
    }

    pub fn registered_variants(&self, family: &str) -> Vec<RegisteredVariant> {
        self.registry.variants(normalize_family(family))
    }

    pub fn active_families(&self) -> Vec<String> {
        self.coordinator.active_families()
    }

    pub fn queued_families(&self) -> Vec<String> {
        self.coordinator.queued_families()
    }

    /// Web-safe family to render with when `family` is unavailable
    pub fn get_fallback_font(&self, family: &str) -> String {
        self.errors.fallback_for(normalize_family(family))
    }

    /// PostScript name of the fallback for `family`
    pub fn get_fallback_postscript_name(&self, family: &str) -> &'static str {
        fallback_postscript_name(&self.get_fallback_font(family))
    }

    pub async fn get_binary(&self, family: &str, weight: u16, style: FontStyle) -> Option<Bytes> {
        self.coordinator.load_binary(family, weight, style).await
    }

    pub async fn retry_failed(&self, family: &str) -> bool {
        self.coordinator.retry_failed(family).await
    }

    pub fn add_to_history(&self, font: &FontDescriptor) {
        self.registry.add_to_history(font);
    }

    pub fn history(&self) -> Vec<String> {
        self.registry.history()
    }

    /// Carry out one of the recovery options offered for an error
    pub async fn recover(&self, id: &ErrorId, action: RecoveryAction) -> RecoveryOutcome {
        if !self.errors.recovery_options(id).contains(&action) {
            return RecoveryOutcome::NotApplicable;
        }
        let family = self.errors.error(id).and_then(|error| error.family);

        match (action, family) {
            (RecoveryAction::Retry, Some(family)) => {
                self.errors.clear(id);
                let purpose = self
                    .coordinator
                    .failed_load(&family)
                    .map(|failed| failed.purpose)
                    .unwrap_or_default();
                let options = LoadOptions::default().with_purpose(purpose).force_reload();
                self.coordinator.load(&family, options).await;
                let loaded = self.coordinator.is_loaded(&family);
                RecoveryOutcome::Retried { family, loaded }
            }
            (RecoveryAction::UseFallback, Some(family)) => {
                self.errors.clear(id);
                let fallback = self.errors.fallback_for(&family);
                RecoveryOutcome::Fallback { family, fallback }
            }
            (RecoveryAction::EnableOfflineMode, _) => {
                self.errors.clear(id);
                if !self.errors.is_offline_mode() {
                    self.errors.enable_offline_mode();
                }
                RecoveryOutcome::OfflineModeEnabled
            }
            (RecoveryAction::Dismiss, _) => {
                self.errors.clear(id);
                self.errors.dismiss_notification();
                RecoveryOutcome::Dismissed
            }
            _ => RecoveryOutcome::NotApplicable,
        }
    }

    pub fn recovery_options(&self, id: &ErrorId) -> Vec<RecoveryAction> {
        self.errors.recovery_options(id)
    }

    pub fn recent_errors(&self) -> Vec<FontError> {
        self.errors.recent_errors()
    }

    pub fn errors_for(&self, family: &str) -> Vec<FontError> {
        self.errors.errors_for(normalize_family(family))
    }

    pub fn notification(&self) -> Option<UserNotification> {
        self.errors.notification()
    }

    pub fn dismiss_notification(&self) {
        self.errors.dismiss_notification();
    }

    pub fn clear_errors(&self) {
        self.errors.clear_all();
    }

    pub fn is_offline_mode(&self) -> bool {
        self.errors.is_offline_mode()
    }

    /// Re-probes a stale state first; a recovery noticed here drains the queue
    pub fn is_network_available(&self) -> bool {
        self.coordinator.network_available()
    }

    pub fn network_snapshot(&self) -> NetworkSnapshot {
        self.network.snapshot()
    }

    /// Observe availability transitions
    pub fn subscribe_network(&self) -> watch::Receiver<bool> {
        self.network.subscribe()
    }

    /// Re-probe connectivity now; drains the queue on recovery
    pub fn refresh_network(&self) -> bool {
        let recovered = self.network.refresh();
        if recovered {
            self.coordinator.on_network_recovered();
        }
        recovered
    }

    /// Feed an online/offline/connection-change event from the host platform
    pub fn apply_connection(&self, info: ConnectionInfo) -> bool {
        let recovered = self.network.apply(info);
        if recovered {
            self.coordinator.on_network_recovered();
        }
        recovered
    }

    /// Run one stylesheet cleanup pass now
    pub fn sweep_stylesheets(&self) -> Vec<String> {
        sweep(
            &self.coordinator,
            &self.stylesheets,
            self.usage.as_ref(),
            &self.config,
        )
    }

    pub fn stylesheet(&self, family: &str) -> Option<TrackerInfo> {
        self.stylesheets.get(normalize_family(family))
    }

    pub fn stylesheet_count(&self) -> usize {
        self.stylesheets.len()
    }

    pub fn binary_cache_stats(&self) -> BinaryCacheStats {
        self.binaries.stats()
    }

    pub fn clear_binary_cache(&self) {
        self.binaries.clear();
    }

    pub fn config(&self) -> &FontLoaderConfig {
        &self.config
    }
}

impl Drop for FontSubsystem {
    fn drop(&mut self) {
        if let Some(task) = self.maintenance.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for FontSubsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSubsystem")
            .field("coordinator", &self.coordinator)
            .field("network", &self.network)
            .field("stylesheets", &self.stylesheets.len())
            .field("binaries", &self.binaries.stats())
            .field("maintenance", &self.maintenance.is_some())
            .finish()
    }
}

fn sweep(
    coordinator: &FontLoadCoordinator,
    stylesheets: &StylesheetResourceTracker,
    usage: &dyn UsageScanner,
    config: &FontLoaderConfig,
) -> Vec<String> {
    let in_use: HashSet<String> = usage
        .currently_rendered_families()
        .iter()
        .map(|family| normalize_family(family).to_string())
        .collect();

    let policy = SweepPolicy {
        max_age: config.stylesheet_max_age,
        preview_ttl: config.preview_ttl,
        idle_ttl: config.idle_ttl,
    };
    let evicted = stylesheets.sweep(policy, &in_use);
    coordinator.forget_loaded(&evicted);
    evicted
}

/// Background timers: connectivity polling and stylesheet cleanup
struct MaintenanceTask {
    coordinator: Arc<FontLoadCoordinator>,
    network: Arc<NetworkStateMonitor>,
    stylesheets: Arc<StylesheetResourceTracker>,
    usage: Arc<dyn UsageScanner>,
    config: FontLoaderConfig,
}

impl MaintenanceTask {
    async fn run(self) {
        let start = tokio::time::Instant::now();
        let mut network_tick = tokio::time::interval_at(
            start + self.config.network_check_interval,
            self.config.network_check_interval,
        );
        let mut sweep_tick = tokio::time::interval_at(
            start + self.config.stylesheet_cleanup_interval,
            self.config.stylesheet_cleanup_interval,
        );
        network_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::debug!("Font maintenance task started");
        loop {
            tokio::select! {
                _ = network_tick.tick() => {
                    if self.network.refresh() {
                        self.coordinator.on_network_recovered();
                    }
                }
                _ = sweep_tick.tick() => {
                    sweep(
                        &self.coordinator,
                        &self.stylesheets,
                        self.usage.as_ref(),
                        &self.config,
                    );
                }
            }
        }
    }
}
