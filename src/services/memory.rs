//! In-process cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::Cache;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// A [`Cache`] kept in memory. Clones share the same entries.
///
/// Expired entries are dropped lazily, on the next `get` of their key.
#[derive(Clone, Default)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let now = Instant::now();
        if let Some(entry) = self.inner.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.inner.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> anyhow::Result<()> {
        let expires_at = Instant::now() + ttl;
        self.inner.insert(key.to_owned(), Entry { value, expires_at });
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.inner.remove(key);
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        self.inner.clear();
        Ok(())
    }
}
