//! C2 TTL Cache: a generic keyed store with absolute expiry, shared by both
//! aggregators. Safe for many concurrent readers and writers; eviction on
//! expired read is atomic per-key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Injectable time source, mandatory per spec §4.1 so cache-expiry tests do
/// not depend on real wall-clock sleeps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The default clock, backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock whose value is set explicitly by the caller, used by tests that
/// exercise cache expiry (spec testable scenarios S1/S2) without sleeping.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<std::sync::Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Arc::new(std::sync::Mutex::new(now)) }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap();
        *guard = *guard + by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Generic TTL-bounded cache. One instance per aggregator (spec §4.1: "cache
/// entries are exclusively owned by the owning aggregator").
pub struct TtlCache<V: Clone + Send + Sync> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            clock,
        }
    }

    /// Store a value under `key`, stamping `expiresAt = now + ttl`.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    pub async fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = self.clock.now() + chrono::Duration::from_std(ttl).unwrap_or_default();
        let mut guard = self.entries.write().await;
        guard.insert(key.into(), Entry { value, expires_at });
    }

    /// Return the value iff `now < expiresAt`; otherwise evict and return
    /// `None`.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let guard = self.entries.read().await;
            if let Some(entry) = guard.get(key) {
                if now < entry.expires_at {
                    return Some(entry.value.clone());
                }
            } else {
                return None;
            }
        }
        // Expired: take the write lock to evict.
        let mut guard = self.entries.write().await;
        guard.remove(key);
        None
    }

    /// Return the value and its age, useful to the aggregator's `maxAge`
    /// freshness check (distinct from hard TTL expiry).
    pub async fn get_with_age(&self, key: &str) -> Option<(V, chrono::Duration)> {
        let now = self.clock.now();
        let guard = self.entries.read().await;
        let entry = guard.get(key)?;
        if now >= entry.expires_at {
            return None;
        }
        let ttl_start = entry.expires_at - chrono::Duration::from_std(self.default_ttl).unwrap_or_default();
        Some((entry.value.clone(), now - ttl_start))
    }

    pub async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Deterministically compose a cache key from its parts (spec §4.1
/// `generateKey`).
pub fn generate_key(parts: &[&str]) -> String {
    parts.join("|")
}
