//! In-memory key/value cache with per-entry expiry.
//!
//! Expired entries are dropped lazily when read, and in bulk by `sweep()`,
//! which `spawn_sweeper` runs on an interval. The map lives behind a mutex
//! so clones handed to different actix workers see the same entries.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// TTL applied by `set` when the caller passes `None`.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct Entry<V> {
    value: V,
    /// `None` when `now + ttl` does not fit in an `Instant`; such entries
    /// only leave through `delete`, `clear` or a later `set`.
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

pub struct TtlCache<K, V> {
    entries: Arc<Mutex<HashMap<K, Entry<V>>>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            default_ttl: self.default_ttl,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            default_ttl,
            clock,
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let expires_at = self.clock.now().checked_add(ttl.unwrap_or(self.default_ttl));
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(key, Entry { value, expires_at });
    }

    /// Return the live value for `key`. An expired entry is removed and
    /// reported as missing.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match map.get(key) {
            Some(entry) if entry.is_expired(now) => {
                map.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Remove `key`. Returns true if an entry (live or stale) was present.
    pub fn delete(&self, key: &K) -> bool {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.clear();
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = map.len();
        map.retain(|_, entry| !entry.is_expired(now));
        before - map.len()
    }

    /// Number of stored entries, including ones that expired but were not
    /// swept yet.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Run `sweep` every `interval` on the actix runtime.
    pub fn spawn_sweeper(&self, name: &'static str, interval: Duration) {
        let cache = self.clone();
        actix_web::rt::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = cache.sweep();
                if removed > 0 {
                    log::debug!("Cache {name}: swept {removed} expired entries");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_cache() -> (ManualClock, TtlCache<String, i32>) {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(DEFAULT_TTL, Arc::new(clock.clone()));
        (clock, cache)
    }

    #[test]
    fn get_right_after_set_returns_value() {
        let (_clock, cache) = manual_cache();
        cache.set("a".into(), 1, Some(Duration::from_millis(100)));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn zero_ttl_is_readable_at_the_same_instant() {
        let (clock, cache) = manual_cache();
        cache.set("a".into(), 1, Some(Duration::ZERO));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[test]
    fn expires_after_ttl_and_is_removed_on_read() {
        let (clock, cache) = manual_cache();
        cache.set("a".into(), 1, Some(Duration::from_millis(100)));

        clock.advance(Duration::from_millis(50));
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        clock.advance(Duration::from_millis(100));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn default_ttl_is_five_minutes() {
        let (clock, cache) = manual_cache();
        cache.set("a".into(), 7, None);
        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get(&"a".to_string()), Some(7));
        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[test]
    fn delete_hides_live_and_stale_entries() {
        let (clock, cache) = manual_cache();
        cache.set("live".into(), 1, None);
        cache.set("stale".into(), 2, Some(Duration::from_millis(10)));
        clock.advance(Duration::from_millis(20));

        assert!(cache.delete(&"live".to_string()));
        assert!(cache.delete(&"stale".to_string()));
        assert!(!cache.delete(&"missing".to_string()));
        assert_eq!(cache.get(&"live".to_string()), None);
        assert_eq!(cache.get(&"stale".to_string()), None);
    }

    #[test]
    fn clear_empties_everything() {
        let (_clock, cache) = manual_cache();
        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            cache.set(key.to_string(), i as i32, None);
        }
        cache.clear();
        assert!(cache.is_empty());
        for key in ["a", "b", "c"] {
            assert_eq!(cache.get(&key.to_string()), None);
        }
    }

    #[test]
    fn set_replaces_value_and_expiry() {
        let (clock, cache) = manual_cache();
        cache.set("a".into(), 1, Some(Duration::from_millis(10)));
        cache.set("a".into(), 2, Some(Duration::from_secs(10)));
        clock.advance(Duration::from_millis(20));
        assert_eq!(cache.get(&"a".to_string()), Some(2));
    }

    #[test]
    fn sweep_removes_only_expired() {
        let (clock, cache) = manual_cache();
        cache.set("short".into(), 1, Some(Duration::from_millis(10)));
        cache.set("long".into(), 2, Some(Duration::from_secs(10)));
        clock.advance(Duration::from_millis(20));

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"long".to_string()), Some(2));
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let (clock, cache) = manual_cache();
        cache.set("a".into(), 1, Some(Duration::MAX));
        clock.advance(Duration::from_secs(86_400 * 365));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.sweep(), 0);
        assert!(cache.delete(&"a".to_string()));

        let forever = TtlCache::<u8, u8>::new(Duration::from_secs(u64::MAX));
        forever.set(1, 1, None);
        assert_eq!(forever.get(&1), Some(1));
    }

    #[test]
    fn clones_share_entries() {
        let (_clock, cache) = manual_cache();
        let other = cache.clone();
        cache.set("a".into(), 1, None);
        assert_eq!(other.get(&"a".to_string()), Some(1));
        other.clear();
        assert!(cache.is_empty());
    }
}
