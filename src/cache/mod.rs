//! Time-limited cache over a persistent key/value store
//!
//! Every failure is logged and degrades to a cache miss; callers never see
//! an error from this module.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

/// Key holding the default hero image
pub const HERO_IMAGE_KEY: &str = "synth-hero-image";

/// Default lifetime of a cache entry
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Stored record; `timestamp` is Unix milliseconds at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: String,
    pub timestamp: i64,
}

/// Time source, replaceable in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(by) = ChronoDuration::from_std(by) {
            let mut now = self.now.write();
            if let Some(next) = now.checked_add_signed(by) {
                *now = next;
            }
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Cache whose entries expire `ttl` after they were written
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { store, ttl, clock }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value under `key`, removing the entry if it has expired
    pub fn get(&self, key: &str) -> Option<String> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                self.evict(key);
                return None;
            }
        };

        let age_ms = self.clock.now().timestamp_millis().saturating_sub(entry.timestamp);
        if age_ms > self.ttl.as_millis() as i64 {
            debug!(key = %key, age_ms, "Cache entry expired");
            self.evict(key);
            return None;
        }

        Some(entry.value)
    }

    /// Store `value` under `key` with a fresh timestamp
    pub fn set(&self, key: &str, value: &str) {
        let entry = CacheEntry {
            value: value.to_string(),
            timestamp: self.clock.now().timestamp_millis(),
        };

        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Could not encode cache entry");
                return;
            }
        };

        if let Err(e) = self.store.set(key, &raw) {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    fn evict(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!(key = %key, error = %e, "Could not remove cache entry");
        }
    }
}
