use crate::error::CacheError;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const STATS_NAMESPACE: &str = "attendance:stats:";

pub fn day_stats_key(date: NaiveDate) -> String {
    format!("{}today:{}", STATS_NAMESPACE, date.format("%Y-%m-%d"))
}

pub fn stats_namespace_pattern() -> String {
    format!("{}*", STATS_NAMESPACE)
}

/// Byte-oriented key/value store with per-entry expiry.
///
/// Callers treat every error as non-fatal: reads fall back to the database
/// and writes are skipped.
pub trait StatsCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
    fn delete(&self, key: &str) -> Result<(), CacheError>;
    /// Live keys matching a glob where `*` matches any run of characters.
    fn list_keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
}

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))
    }
}

impl StatsCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        match entries.get(key) {
            Some(e) if e.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(e) => Ok(Some(e.value.clone())),
            None => Ok(None),
        }
    }

    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn list_keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        entries.retain(|_, e| !e.is_expired(now));
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

fn glob_match(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(head) = parts.next() else {
        return key.is_empty();
    };
    let Some(mut rest) = key.strip_prefix(head) else {
        return false;
    };
    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        return rest.is_empty();
    };
    for piece in middle {
        match rest.find(piece) {
            Some(at) => rest = &rest[at + piece.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
