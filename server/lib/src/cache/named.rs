use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{lock_cache, CacheKeySpace, CacheStats, MultiKeyCache};
use crate::entry::DirectoryEntry;
use crate::utils::duration_from_epoch_now;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Name,
    Id,
}

impl<E: DirectoryEntry> CacheKeySpace<E> for NamedKey {
    const ALL: &'static [Self] = &[NamedKey::Name, NamedKey::Id];

    fn index(self) -> usize {
        self as usize
    }

    fn case_insensitive(self) -> bool {
        self == NamedKey::Name
    }

    fn derive_keys(self, value: &E) -> Vec<String> {
        match self {
            NamedKey::Name => vec![value.get_name().to_string()],
            NamedKey::Id => vec![value.get_id().to_string()],
        }
    }
}

/// Entries that are only ever looked up by name or id, such as classes of
/// service and servers.
#[derive(Debug)]
pub struct NamedEntryCache<E> {
    name: &'static str,
    inner: Mutex<MultiKeyCache<E, NamedKey>>,
}

impl<E: DirectoryEntry> NamedEntryCache<E> {
    pub fn new(name: &'static str, capacity: NonZeroUsize, ttl: Duration) -> Self {
        NamedEntryCache {
            name,
            inner: Mutex::new(MultiKeyCache::new(capacity, ttl)),
        }
    }

    pub fn get_at(&self, space: NamedKey, key: &str, ct: Duration) -> Option<Arc<E>> {
        lock_cache(&self.inner).get_at(space, key, ct)
    }

    pub fn get_by_name(&self, key: &str) -> Option<Arc<E>> {
        self.get_at(NamedKey::Name, key, duration_from_epoch_now())
    }

    pub fn get_by_id(&self, key: &str) -> Option<Arc<E>> {
        self.get_at(NamedKey::Id, key, duration_from_epoch_now())
    }

    pub fn put(&self, entry: Arc<E>) {
        self.put_at(entry, duration_from_epoch_now())
    }

    pub fn put_at(&self, entry: Arc<E>, ct: Duration) {
        lock_cache(&self.inner).put_at(entry, ct)
    }

    pub fn remove(&self, entry: &E) -> bool {
        lock_cache(&self.inner).remove(entry)
    }

    pub fn remove_by_key(&self, space: NamedKey, key: &str) -> Option<Arc<E>> {
        lock_cache(&self.inner).remove_by_key(space, key)
    }

    pub fn clear(&self) {
        lock_cache(&self.inner).clear()
    }

    pub fn size(&self) -> usize {
        lock_cache(&self.inner).len()
    }

    pub fn hit_rate(&self) -> f64 {
        lock_cache(&self.inner).hit_rate()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = lock_cache(&self.inner);
        CacheStats {
            name: self.name,
            size: inner.len(),
            negative_size: 0,
            hit_rate: inner.hit_rate(),
        }
    }
}
