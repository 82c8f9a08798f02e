use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Time-boxed response cache keyed by source URL.
///
/// Replaces the implicit process-global cache the original dashboard hung
/// off its data loader: each entry records what was fetched and when, and
/// staleness is a pure function of an injected clock so the TTL behavior
/// is testable without sleeping.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: HashMap<String, Entry<V>>,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

impl<V> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// True when there is no entry for `url` or its TTL has elapsed.
    pub fn is_stale(&self, url: &str, now: Instant) -> bool {
        match self.entries.get(url) {
            Some(entry) => now.duration_since(entry.fetched_at) >= self.ttl,
            None => true,
        }
    }

    /// The cached value for `url`, if present and still within its TTL.
    pub fn get_fresh(&self, url: &str, now: Instant) -> Option<&V> {
        let entry = self.entries.get(url)?;
        if now.duration_since(entry.fetched_at) >= self.ttl {
            return None;
        }
        Some(&entry.value)
    }

    pub fn put(&mut self, url: &str, value: V, now: Instant) {
        self.entries.insert(
            url.to_string(),
            Entry {
                value,
                fetched_at: now,
            },
        );
    }
}
