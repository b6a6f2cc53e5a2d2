//! Generic expiring key-value cache.
//!
//! A read-through accelerator for expensive derived views. The cache is an
//! optimization, never a source of truth: consumers must tolerate a total
//! miss by falling through to the store or the remote source. Entries are
//! only trusted while `now - stored_at < ttl`; an expired entry is treated
//! as absent and never served stale.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use time::{OffsetDateTime, UtcOffset};
use tracing::debug;

/// A cached value with its storage time and time-to-live.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The cached data.
    pub data: T,
    /// When the entry was stored.
    pub stored_at: OffsetDateTime,
    /// How long the entry stays trustworthy.
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn age(&self, now: OffsetDateTime) -> Duration {
        let secs = (now - self.stored_at).as_seconds_f64();
        Duration::from_secs_f64(secs.max(0.0))
    }

    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.age(now) > self.ttl
    }
}

/// String-keyed TTL cache with daily and periodic refresh policy helpers.
pub struct ExpiringCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    /// Offset used for "same calendar day" checks.
    offset: UtcOffset,
}

impl<T: Clone> ExpiringCache<T> {
    /// Create a cache using UTC for calendar-day checks.
    pub fn new() -> Self {
        Self::with_offset(UtcOffset::UTC)
    }

    /// Create a cache that evaluates calendar-day freshness in the given
    /// local offset.
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            offset,
        }
    }

    /// Store a value under a key with the given time-to-live.
    pub fn put(&self, key: impl Into<String>, data: T, ttl: Duration) {
        let key = key.into();
        debug!("Caching {} (ttl {:?})", key, ttl);
        self.entries.lock().unwrap().insert(
            key,
            CacheEntry {
                data,
                stored_at: OffsetDateTime::now_utc(),
                ttl,
            },
        );
    }

    /// Get a value if present and unexpired.
    ///
    /// An expired entry is evicted and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.lock().unwrap();

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                debug!("Cache expired: {}", key);
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    /// Remove one entry.
    pub fn invalidate(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    /// Remove every entry whose key matches the predicate. Returns the
    /// number of entries removed.
    pub fn invalidate_pattern<F: Fn(&str) -> bool>(&self, matcher: F) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !matcher(key));
        before - entries.len()
    }

    /// True only if the entry was stored on the same calendar day as "now"
    /// in the cache's configured offset.
    ///
    /// Independent of the numeric TTL; used for once-per-day refresh
    /// strategies.
    pub fn is_fresh_today(&self, key: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) => {
                let today = OffsetDateTime::now_utc().to_offset(self.offset).date();
                entry.stored_at.to_offset(self.offset).date() == today
            }
            None => false,
        }
    }

    /// True if the entry is absent or older than the given age in hours.
    ///
    /// Independent of hard expiry; used for periodic background refresh.
    pub fn should_refresh(&self, key: &str, minimum_age_hours: f64) -> bool {
        let entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) => {
                let age_hours =
                    entry.age(OffsetDateTime::now_utc()).as_secs_f64() / 3600.0;
                age_hours >= minimum_age_hours
            }
            None => true,
        }
    }

    /// Number of physically stored entries, expired ones included.
    /// Diagnostic only.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// All stored keys, expired ones included. Diagnostic only.
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    /// Age and TTL of an entry, expired ones included. Diagnostic only.
    pub fn entry_info(&self, key: &str) -> Option<(Duration, Duration)> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map(|entry| (entry.age(OffsetDateTime::now_utc()), entry.ttl))
    }

    #[cfg(test)]
    fn backdate(&self, key: &str, by: time::Duration) {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(key) {
            entry.stored_at -= by;
        }
    }
}

impl<T: Clone> Default for ExpiringCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
