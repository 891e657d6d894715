use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashMap;
use lru::LruCache;

use super::{normalise_key, CacheKeySpace, HitRateCounter};
use crate::prelude::*;
use crate::utils::{duration_from_epoch_now, expiry_from, is_expired};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct EntryHandle(u64);

/// A cached value with its expiry and every key that currently reaches it.
#[derive(Debug)]
pub struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Option<Duration>,
    keys: Vec<(usize, AttrString)>,
}

impl<V> CacheEntry<V> {
    pub fn value(&self) -> &Arc<V> {
        &self.value
    }

    pub fn expires_at(&self) -> Option<Duration> {
        self.expires_at
    }

    pub fn is_stale(&self, ct: Duration) -> bool {
        is_expired(self.expires_at, ct)
    }
}

/// Entries live once in an arena. Each key space has its own LRU index from
/// key to arena handle, so an entry stays cached as long as at least one of its
/// keys survives LRU eviction, and is dropped with its last key.
pub struct MultiKeyCache<V, K> {
    ttl: Duration,
    entries: HashMap<EntryHandle, CacheEntry<V>>,
    indexes: Vec<LruCache<AttrString, EntryHandle>>,
    next_handle: u64,
    hit_rate: HitRateCounter,
    _space: PhantomData<K>,
}

impl<V, K> fmt::Debug for MultiKeyCache<V, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiKeyCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.len())
            .field("hit_rate", &self.hit_rate)
            .finish()
    }
}

impl<V, K: CacheKeySpace<V>> MultiKeyCache<V, K> {
    /// `capacity` bounds each key space. A zero `ttl` never expires entries.
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        MultiKeyCache {
            ttl,
            entries: HashMap::new(),
            indexes: K::ALL.iter().map(|_| LruCache::new(capacity)).collect(),
            next_handle: 0,
            hit_rate: HitRateCounter::default(),
            _space: PhantomData,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of distinct entries, however many keys each has.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hit_rate(&self) -> f64 {
        self.hit_rate.average()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.indexes.iter_mut().for_each(|idx| idx.clear());
    }

    fn derive(value: &V) -> Vec<(usize, AttrString)> {
        let mut keys = Vec::new();
        for space in K::ALL.iter() {
            for key in space.derive_keys(value) {
                if key.is_empty() {
                    continue;
                }
                let pair = (space.index(), normalise_key(*space, &key));
                if !keys.contains(&pair) {
                    keys.push(pair);
                }
            }
        }
        keys
    }

    pub fn put(&mut self, value: Arc<V>) {
        self.put_at(value, duration_from_epoch_now())
    }

    /// Insert `value` under every key it derives. Whatever those keys pointed
    /// at before is removed entirely first.
    pub fn put_at(&mut self, value: Arc<V>, ct: Duration) {
        let keys = Self::derive(&value);
        if keys.is_empty() {
            cache_debug!("not caching an entry without any keys");
            return;
        }

        let replaced = self.remove_keys(&keys);
        if replaced > 0 {
            cache_trace!(replaced, "replaced existing cache entries");
        }

        let handle = EntryHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.entries.insert(
            handle,
            CacheEntry {
                value,
                expires_at: expiry_from(ct, self.ttl),
                keys: keys.clone(),
            },
        );

        for (idx, key) in keys {
            if let Some((evicted_key, evicted)) = self.indexes[idx].push(key, handle) {
                self.unlink(idx, &evicted_key, evicted);
            }
        }
    }

    pub fn get(&mut self, space: K, key: &str) -> Option<Arc<V>> {
        self.get_at(space, key, duration_from_epoch_now())
    }

    /// Look up by one key. A stale entry is evicted under all of its keys and
    /// reported as a miss.
    pub fn get_at(&mut self, space: K, key: &str, ct: Duration) -> Option<Arc<V>> {
        let idx = space.index();
        let nkey = normalise_key(space, key);

        let Some(handle) = self.indexes[idx].get(&nkey).copied() else {
            self.hit_rate.record(false);
            return None;
        };

        let fresh = self
            .entries
            .get(&handle)
            .map(|e| (!e.is_stale(ct)).then(|| e.value.clone()));

        match fresh {
            Some(Some(value)) => {
                self.hit_rate.record(true);
                Some(value)
            }
            Some(None) => {
                cache_trace!(?space, key = %nkey, "evicting stale cache entry");
                self.remove_handle(handle);
                self.hit_rate.record(false);
                None
            }
            None => {
                cache_debug!(?space, key = %nkey, "dropping dangling cache key");
                self.indexes[idx].pop(&nkey);
                self.hit_rate.record(false);
                None
            }
        }
    }

    /// Inspect an entry without touching LRU order, expiry or the hit rate.
    pub fn peek_entry(&self, space: K, key: &str) -> Option<&CacheEntry<V>> {
        let nkey = normalise_key(space, key);
        self.indexes[space.index()]
            .peek(&nkey)
            .and_then(|handle| self.entries.get(handle))
    }

    /// Number of keys currently held in one key space.
    pub fn keys_len(&self, space: K) -> usize {
        self.indexes[space.index()].len()
    }

    /// Remove whatever is reachable from any key `value` derives.
    pub fn remove(&mut self, value: &V) -> bool {
        let keys = Self::derive(value);
        self.remove_keys(&keys) > 0
    }

    /// Remove the entry reachable from a single key, with all of its keys.
    pub fn remove_by_key(&mut self, space: K, key: &str) -> Option<Arc<V>> {
        let nkey = normalise_key(space, key);
        let handle = self.indexes[space.index()].peek(&nkey).copied()?;
        let value = self.entries.get(&handle).map(|e| e.value.clone());
        self.remove_handle(handle);
        value
    }

    fn remove_keys(&mut self, keys: &[(usize, AttrString)]) -> usize {
        let handles: BTreeSet<EntryHandle> = keys
            .iter()
            .filter_map(|(idx, key)| self.indexes[*idx].peek(key).copied())
            .collect();
        handles
            .into_iter()
            .filter(|handle| self.remove_handle(*handle))
            .count()
    }

    fn remove_handle(&mut self, handle: EntryHandle) -> bool {
        let Some(entry) = self.entries.remove(&handle) else {
            return false;
        };
        for (idx, key) in entry.keys.iter() {
            if self.indexes[*idx].peek(key) == Some(&handle) {
                self.indexes[*idx].pop(key);
            }
        }
        true
    }

    // An LRU index pushed `key` out. The entry survives while it has other keys.
    fn unlink(&mut self, idx: usize, key: &AttrString, handle: EntryHandle) {
        let now_empty = match self.entries.get_mut(&handle) {
            Some(entry) => {
                entry.keys.retain(|(i, k)| !(*i == idx && k == key));
                entry.keys.is_empty()
            }
            None => false,
        };
        if now_empty {
            cache_trace!(key = %key, "evicted last key of cache entry");
            self.entries.remove(&handle);
        }
    }
}
