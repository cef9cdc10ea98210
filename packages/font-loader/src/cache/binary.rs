use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::types::FontIdentity;

/// Cached payload of one face
#[derive(Debug, Clone)]
pub struct BinaryCacheEntry {
    pub identity: FontIdentity,
    pub buffer: Bytes,
    pub fetched_at: Instant,
}

impl BinaryCacheEntry {
    #[inline]
    pub fn is_expired(&self, expiry: Duration) -> bool {
        self.fetched_at.elapsed() > expiry
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryCacheStats {
    /// Live (unexpired) entries
    pub count: usize,
    /// Bytes held by live entries
    pub total_bytes: usize,
    /// Entries past expiry still waiting to be overwritten
    pub expired: usize,
}

/// Decoded font buffers keyed by `family|weight|style`
///
/// Expiry is checked lazily on read; an expired entry stays in the map until
/// the next successful fetch overwrites it.
#[derive(Debug)]
pub struct BinaryCache {
    entries: Mutex<HashMap<String, BinaryCacheEntry>>,
    expiry: Duration,
}

impl BinaryCache {
    pub fn new(expiry: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            expiry,
        }
    }

    pub fn get(&self, identity: &FontIdentity) -> Option<Bytes> {
        let entries = self.entries.lock();
        let entry = entries.get(&identity.cache_key())?;
        if entry.is_expired(self.expiry) {
            log::debug!("Binary cache entry for {} expired", identity);
            return None;
        }
        Some(entry.buffer.clone())
    }

    /// Store a buffer; last write wins
    pub fn put(&self, identity: FontIdentity, buffer: Bytes) {
        let key = identity.cache_key();
        let entry = BinaryCacheEntry {
            identity,
            buffer,
            fetched_at: Instant::now(),
        };
        self.entries.lock().insert(key, entry);
    }

    pub fn contains(&self, identity: &FontIdentity) -> bool {
        self.get(identity).is_some()
    }

    pub fn stats(&self) -> BinaryCacheStats {
        let entries = self.entries.lock();
        entries
            .values()
            .fold(BinaryCacheStats::default(), |mut stats, entry| {
                if entry.is_expired(self.expiry) {
                    stats.expired += 1;
                } else {
                    stats.count += 1;
                    stats.total_bytes += entry.buffer.len();
                }
                stats
            })
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let dropped = entries.len();
        entries.clear();
        log::info!("Cleared {} binary font cache entries", dropped);
    }

    #[inline]
    pub fn expiry(&self) -> Duration {
        self.expiry
    }
}
