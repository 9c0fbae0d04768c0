//! Bounded TTL caches for the two search paths (spec §4.3 "Caching").

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// A thread-safe, bounded, TTL-evicting cache.
///
/// Eviction when full: expired entries first, else the oldest by insertion
/// time. Not an LRU — access doesn't refresh position, matching the
/// teacher's "TTL cache" used for short-lived lookups elsewhere in this
/// workspace (no read-side bookkeeping needed for a 10-minute TTL).
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, value: V) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            self.evict_one(&mut entries);
        }
        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    fn evict_one(&self, entries: &mut HashMap<String, Entry<V>>) {
        let expired_key = entries
            .iter()
            .find(|(_, entry)| entry.inserted_at.elapsed() >= self.ttl)
            .map(|(key, _)| key.clone());

        let victim = expired_key.or_else(|| {
            entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone())
        });

        if let Some(victim) = victim {
            entries.remove(&victim);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_retrieves_a_value() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(600), 4);
        cache.insert("a".to_string(), "value-a".to_string());
        assert_eq!(cache.get("a"), Some("value-a".to_string()));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn expired_entries_are_treated_as_absent() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_millis(1), 4);
        cache.insert("a".to_string(), 1);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn evicts_oldest_when_full_and_nothing_expired() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(600), 2);
        cache.insert("first".to_string(), 1);
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("second".to_string(), 2);
        cache.insert("third".to_string(), 3);
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(2));
        assert_eq!(cache.get("third"), Some(3));
    }
}
