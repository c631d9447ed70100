use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::entry::CachedEntry;
use crate::key::CacheKey;

/// Thread-safe response cache.
///
/// Readers share the lock; `set` and `clear` take it exclusively. The map
/// itself never leaves this type, only clones of its entries do.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    inner: RwLock<HashMap<CacheKey, CachedEntry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedEntry> {
        self.read().get(key).cloned()
    }

    /// Stores an independent copy of `headers` and `body`, replacing any
    /// previous entry for `key`.
    pub fn set(&self, key: CacheKey, status: StatusCode, headers: &HeaderMap, body: &[u8]) {
        let entry = CachedEntry::new(status, headers.clone(), Bytes::copy_from_slice(body));
        self.write().insert(key, entry);
    }

    /// Drops every entry at once.
    pub fn clear(&self) {
        *self.write() = HashMap::new();
    }

    pub fn size(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // A panic while holding the lock cannot leave a half-written entry
    // (inserts and swaps are single moves), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, CachedEntry>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, CachedEntry>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
