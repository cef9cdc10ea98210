use std::collections::{HashMap, HashSet};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::constants::INITIAL_USAGE_COUNT;
use crate::providers::StylesheetHandle;
use crate::types::LoadPurpose;

/// Owns an injected stylesheet and releases it exactly once
pub struct ResourceHandle {
    inner: Option<Box<dyn StylesheetHandle>>,
}

impl ResourceHandle {
    pub fn new(handle: Box<dyn StylesheetHandle>) -> Self {
        Self {
            inner: Some(handle),
        }
    }

    pub fn release(&mut self) {
        if let Some(mut handle) = self.inner.take() {
            handle.release();
        }
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Live stylesheet of one family
#[derive(Debug)]
pub struct StylesheetTracker {
    pub handle: ResourceHandle,
    pub purpose: LoadPurpose,
    pub last_used: Instant,
    pub usage_count: u32,
    pub url: Url,
}

impl StylesheetTracker {
    pub fn new(handle: ResourceHandle, purpose: LoadPurpose, url: Url) -> Self {
        Self {
            handle,
            purpose,
            last_used: Instant::now(),
            usage_count: INITIAL_USAGE_COUNT,
            url,
        }
    }

    fn touch(&mut self) {
        self.last_used = Instant::now();
        self.usage_count = self.usage_count.saturating_add(1);
    }
}

/// Copy of a tracker's bookkeeping, without the handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerInfo {
    pub family: String,
    pub purpose: LoadPurpose,
    pub last_used: Instant,
    pub usage_count: u32,
    pub url: Url,
}

/// Eviction thresholds applied by [`StylesheetResourceTracker::sweep`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPolicy {
    pub max_age: Duration,
    pub preview_ttl: Duration,
    pub idle_ttl: Duration,
}

impl SweepPolicy {
    fn should_evict(&self, tracker: &StylesheetTracker, idle: Duration) -> bool {
        match tracker.purpose {
            LoadPurpose::TextEditing => false,
            _ if idle > self.max_age => true,
            LoadPurpose::Preview if idle > self.preview_ttl => true,
            _ => tracker.usage_count < 2 && idle > self.idle_ttl,
        }
    }
}

/// One injected stylesheet per family, evicted by usage-aware sweeps
#[derive(Debug, Default)]
pub struct StylesheetResourceTracker {
    trackers: Mutex<HashMap<String, StylesheetTracker>>,
}

impl StylesheetResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, family: &str) -> Option<TrackerInfo> {
        self.trackers.lock().get(family).map(|tracker| TrackerInfo {
            family: family.to_string(),
            purpose: tracker.purpose,
            last_used: tracker.last_used,
            usage_count: tracker.usage_count,
            url: tracker.url.clone(),
        })
    }

    pub fn contains(&self, family: &str) -> bool {
        self.trackers.lock().contains_key(family)
    }

    /// Track a family; an existing entry is released first
    pub fn add(&self, family: impl Into<String>, tracker: StylesheetTracker) {
        let previous = self.trackers.lock().insert(family.into(), tracker);
        if let Some(mut previous) = previous {
            previous.handle.release();
        }
    }

    /// Bump `last_used` and `usage_count`; `false` when untracked
    pub fn touch(&self, family: &str) -> bool {
        match self.trackers.lock().get_mut(family) {
            Some(tracker) => {
                tracker.touch();
                true
            }
            None => false,
        }
    }

    /// Upgrade a preview entry to text editing; never downgrades
    pub fn promote(&self, family: &str, purpose: LoadPurpose) -> bool {
        let mut trackers = self.trackers.lock();
        let Some(tracker) = trackers.get_mut(family) else {
            return false;
        };

        if tracker.purpose == LoadPurpose::TextEditing || purpose != LoadPurpose::TextEditing {
            return false;
        }

        log::debug!("Promoting stylesheet for {} from {} to {}", family, tracker.purpose, purpose);
        tracker.purpose = purpose;
        tracker.touch();
        true
    }

    /// Swap in a new resource for an existing entry, keeping its usage history
    ///
    /// The old handle is released after the new one is installed. Returns the
    /// handle back when the family is not tracked.
    pub fn replace_handle(
        &self,
        family: &str,
        handle: ResourceHandle,
        url: Url,
        purpose: LoadPurpose,
    ) -> Result<(), ResourceHandle> {
        let old = {
            let mut trackers = self.trackers.lock();
            let Some(tracker) = trackers.get_mut(family) else {
                return Err(handle);
            };

            if tracker.purpose != LoadPurpose::TextEditing {
                tracker.purpose = purpose;
            }
            tracker.url = url;
            tracker.touch();
            std::mem::replace(&mut tracker.handle, handle)
        };

        drop(old);
        Ok(())
    }

    /// Release the resource and forget the family
    pub fn remove(&self, family: &str) -> bool {
        let removed = self.trackers.lock().remove(family);
        match removed {
            Some(mut tracker) => {
                tracker.handle.release();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.trackers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.lock().is_empty()
    }

    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = self.trackers.lock().keys().cloned().collect();
        families.sort();
        families
    }

    /// Evict idle stylesheets; returns the evicted families
    ///
    /// Families in `in_use` are refreshed instead of evicted, and text-editing
    /// entries are never evicted.
    pub fn sweep(&self, policy: SweepPolicy, in_use: &HashSet<String>) -> Vec<String> {
        let now = Instant::now();
        let mut evicted = Vec::new();

        let mut trackers = self.trackers.lock();
        trackers.retain(|family, tracker| {
            if in_use.contains(family) {
                tracker.touch();
                return true;
            }

            let idle = now.saturating_duration_since(tracker.last_used);
            if policy.should_evict(tracker, idle) {
                tracker.handle.release();
                evicted.push(family.clone());
                return false;
            }
            true
        });
        drop(trackers);

        if !evicted.is_empty() {
            evicted.sort();
            log::info!("Cleaned up {} unused font stylesheets: {:?}", evicted.len(), evicted);
        }
        evicted
    }
}
