use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Time-bounded cache shared between the quote path and background jobs.
///
/// Readers clone the stored value out, so a read racing a write sees
/// either the previous or the new value in full. Expiry is checked
/// against a caller-supplied instant, which keeps lookups deterministic
/// for a fixed calculation context.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Cached value for `key`, or None when absent or expired at `now`.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let entries = self.entries.read().ok()?;
        entries.get(key).and_then(|entry| {
            if entry.expires_at > now {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    pub fn set(&self, key: K, value: V, now: DateTime<Utc>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key,
                CacheEntry {
                    value,
                    expires_at: now + self.ttl,
                },
            );
        }
    }

    /// Drop a single entry, forcing the next read to recompute.
    pub fn invalidate(&self, key: &K) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    /// Drop every entry already expired at `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| entry.expires_at > now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_value_before_expiry() {
        let cache: TtlCache<&str, f64> = TtlCache::new(Duration::seconds(60));
        let now = Utc::now();

        cache.set("k", 1.5, now);
        assert_eq!(cache.get(&"k", now), Some(1.5));
        assert_eq!(cache.get(&"k", now + Duration::seconds(59)), Some(1.5));
    }

    #[test]
    fn test_get_misses_after_expiry() {
        let cache: TtlCache<&str, f64> = TtlCache::new(Duration::seconds(60));
        let now = Utc::now();

        cache.set("k", 1.5, now);
        assert_eq!(cache.get(&"k", now + Duration::seconds(60)), None);
        assert_eq!(cache.get(&"k", now + Duration::seconds(120)), None);
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache: TtlCache<&str, f64> = TtlCache::new(Duration::seconds(60));
        let now = Utc::now();

        cache.set("k", 1.5, now);
        cache.invalidate(&"k");
        assert_eq!(cache.get(&"k", now), None);
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let cache: TtlCache<&str, f64> = TtlCache::new(Duration::seconds(60));
        let now = Utc::now();

        cache.set("k", 1.0, now);
        cache.set("k", 2.0, now);
        assert_eq!(cache.get(&"k", now), Some(2.0));
    }

    #[test]
    fn test_purge_expired_keeps_live_entries() {
        let cache: TtlCache<&str, f64> = TtlCache::new(Duration::seconds(60));
        let now = Utc::now();

        cache.set("old", 1.0, now - Duration::seconds(120));
        cache.set("live", 2.0, now);
        cache.purge_expired(now);

        assert_eq!(cache.get(&"old", now), None);
        assert_eq!(cache.get(&"live", now), Some(2.0));
    }
}
