use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;

use super::{normalise_key, CacheKeySpace};
use crate::prelude::*;
use crate::utils::{duration_from_epoch_now, expiry_from, is_expired};

/// Remembers keys that were looked up and found to not exist. Each key space
/// has its own bounded LRU of key to expiry time.
pub struct NegativeCache<V, K> {
    enabled: bool,
    ttl: Duration,
    indexes: Vec<LruCache<AttrString, Option<Duration>>>,
    _space: PhantomData<fn(&V) -> K>,
}

impl<V, K> fmt::Debug for NegativeCache<V, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegativeCache")
            .field("enabled", &self.enabled)
            .field("ttl", &self.ttl)
            .field(
                "size",
                &self.indexes.iter().map(|idx| idx.len()).sum::<usize>(),
            )
            .finish()
    }
}

impl<V, K: CacheKeySpace<V>> NegativeCache<V, K> {
    pub fn new(enabled: bool, capacity: NonZeroUsize, ttl: Duration) -> Self {
        NegativeCache {
            enabled,
            ttl,
            indexes: K::ALL.iter().map(|_| LruCache::new(capacity)).collect(),
            _space: PhantomData,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling drops everything remembered so far.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.clear();
        }
        self.enabled = enabled;
    }

    pub fn put(&mut self, space: K, key: &str) {
        self.put_at(space, key, duration_from_epoch_now())
    }

    pub fn put_at(&mut self, space: K, key: &str, ct: Duration) {
        if !self.enabled || key.is_empty() {
            return;
        }
        let nkey = normalise_key(space, key);
        cache_trace!(?space, key = %nkey, "caching negative lookup");
        self.indexes[space.index()].push(nkey, expiry_from(ct, self.ttl));
    }

    pub fn get(&mut self, space: K, key: &str) -> bool {
        self.get_at(space, key, duration_from_epoch_now())
    }

    /// True if `key` is known not to exist. A stale record is dropped.
    pub fn get_at(&mut self, space: K, key: &str, ct: Duration) -> bool {
        if !self.enabled {
            return false;
        }
        let nkey = normalise_key(space, key);
        let idx = &mut self.indexes[space.index()];
        match idx.get(&nkey).copied() {
            Some(expires_at) if is_expired(expires_at, ct) => {
                cache_trace!(?space, key = %nkey, "evicting stale negative entry");
                idx.pop(&nkey);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn remove(&mut self, space: K, key: &str) -> bool {
        let nkey = normalise_key(space, key);
        self.indexes[space.index()].pop(&nkey).is_some()
    }

    /// Forget the looked up `(space, key)` and every key `value` can be found
    /// by, now that it exists.
    pub fn clean(&mut self, space: K, key: &str, value: &V) {
        self.remove(space, key);
        for s in K::ALL.iter() {
            for k in s.derive_keys(value) {
                self.remove(*s, &k);
            }
        }
    }

    pub fn clear(&mut self) {
        self.indexes.iter_mut().for_each(|idx| idx.clear());
    }

    pub fn len(&self) -> usize {
        self.indexes.iter().map(|idx| idx.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(String);

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum NKey {
        Name,
        Alias,
    }

    impl CacheKeySpace<Named> for NKey {
        const ALL: &'static [Self] = &[NKey::Name, NKey::Alias];

        fn index(self) -> usize {
            self as usize
        }

        fn case_insensitive(self) -> bool {
            true
        }

        fn derive_keys(self, value: &Named) -> Vec<String> {
            match self {
                NKey::Name => vec![value.0.clone()],
                NKey::Alias => vec![format!("alias.{}", value.0)],
            }
        }
    }

    const CT: Duration = Duration::from_secs(50);

    fn cache(enabled: bool) -> NegativeCache<Named, NKey> {
        NegativeCache::new(
            enabled,
            NonZeroUsize::new(4).expect("zero"),
            Duration::from_secs(10),
        )
    }

    #[test]
    fn test_negative_put_get_expire() {
        let mut c = cache(true);
        c.put_at(NKey::Name, "Missing.com", CT);
        assert!(c.get_at(NKey::Name, "missing.com", CT));
        assert!(!c.get_at(NKey::Alias, "missing.com", CT));
        assert_eq!(c.len(), 1);

        assert!(c.get_at(NKey::Name, "missing.com", CT + Duration::from_secs(10)));
        let later = CT + Duration::from_secs(10) + Duration::from_nanos(1);
        assert!(!c.get_at(NKey::Name, "missing.com", later));
        assert!(c.is_empty());
    }

    #[test]
    fn test_negative_disabled() {
        let mut c = cache(false);
        c.put_at(NKey::Name, "missing.com", CT);
        assert!(!c.get_at(NKey::Name, "missing.com", CT));
        assert!(c.is_empty());

        let mut c = cache(true);
        c.put_at(NKey::Name, "missing.com", CT);
        c.set_enabled(false);
        assert!(c.is_empty());
        c.set_enabled(true);
        assert!(!c.get_at(NKey::Name, "missing.com", CT));
    }

    #[test]
    fn test_negative_clean() {
        let mut c = cache(true);
        c.put_at(NKey::Name, "example.com", CT);
        c.put_at(NKey::Alias, "alias.example.com", CT);
        c.put_at(NKey::Alias, "lookup-key", CT);
        c.put_at(NKey::Name, "other.com", CT);
        assert_eq!(c.len(), 4);

        c.clean(NKey::Alias, "LOOKUP-KEY", &Named("example.com".to_string()));
        assert_eq!(c.len(), 1);
        assert!(c.get_at(NKey::Name, "other.com", CT));
    }
}
