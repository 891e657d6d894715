use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{lock_cache, CacheKeySpace, CacheStats, MultiKeyCache, NegativeCache};
use crate::entry::DirectoryEntry;
use crate::prelude::*;
use crate::utils::duration_from_epoch_now;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainKey {
    Name,
    Id,
    VirtualHostname,
    ForeignName,
    Krb5Realm,
}

impl<E: DirectoryEntry> CacheKeySpace<E> for DomainKey {
    const ALL: &'static [Self] = &[
        DomainKey::Name,
        DomainKey::Id,
        DomainKey::VirtualHostname,
        DomainKey::ForeignName,
        DomainKey::Krb5Realm,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn case_insensitive(self) -> bool {
        matches!(self, DomainKey::Name | DomainKey::VirtualHostname)
    }

    fn derive_keys(self, value: &E) -> Vec<String> {
        let values = match self {
            DomainKey::Name => vec![value.get_name()],
            DomainKey::Id => vec![value.get_id()],
            DomainKey::VirtualHostname => value.get_multi_attr(ATTR_VIRTUAL_HOSTNAME),
            DomainKey::ForeignName => value.get_multi_attr(ATTR_FOREIGN_NAME),
            DomainKey::Krb5Realm => value.get_attr(ATTR_KRB5_REALM).into_iter().collect(),
        };
        values.into_iter().map(str::to_string).collect()
    }
}

/// Which halves of the domain cache a lookup consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GetFromDomainCacheOption {
    PositiveOnly,
    NegativeOnly,
    #[default]
    Both,
}

/// The outcome of a domain cache lookup.
#[derive(Debug, Clone)]
pub enum CacheLookup<E> {
    Found(Arc<E>),
    /// The domain is known not to exist.
    NotFound,
    /// Nothing is known; ask the directory.
    Miss,
}

impl<E> CacheLookup<E> {
    pub fn found(self) -> Option<Arc<E>> {
        match self {
            CacheLookup::Found(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheLookup::NotFound)
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, CacheLookup::Miss)
    }
}

#[derive(Debug)]
struct DomainCacheInner<E> {
    positive: MultiKeyCache<E, DomainKey>,
    negative: NegativeCache<E, DomainKey>,
}

/// Domains by name, id, virtual hostname, foreign name and kerberos realm,
/// with a negative cache for lookups that found nothing.
#[derive(Debug)]
pub struct DomainCache<E> {
    inner: Mutex<DomainCacheInner<E>>,
}

impl<E: DirectoryEntry> DomainCache<E> {
    pub fn new(
        capacity: NonZeroUsize,
        ttl: Duration,
        negative_enabled: bool,
        negative_capacity: NonZeroUsize,
        negative_ttl: Duration,
    ) -> Self {
        DomainCache {
            inner: Mutex::new(DomainCacheInner {
                positive: MultiKeyCache::new(capacity, ttl),
                negative: NegativeCache::new(negative_enabled, negative_capacity, negative_ttl),
            }),
        }
    }

    pub fn get(&self, space: DomainKey, key: &str, mode: GetFromDomainCacheOption) -> CacheLookup<E> {
        self.get_at(space, key, mode, duration_from_epoch_now())
    }

    pub fn get_at(
        &self,
        space: DomainKey,
        key: &str,
        mode: GetFromDomainCacheOption,
        ct: Duration,
    ) -> CacheLookup<E> {
        let mut inner = lock_cache(&self.inner);

        if mode != GetFromDomainCacheOption::NegativeOnly {
            if let Some(e) = inner.positive.get_at(space, key, ct) {
                return CacheLookup::Found(e);
            }
        }
        if mode != GetFromDomainCacheOption::PositiveOnly && inner.negative.get_at(space, key, ct)
        {
            return CacheLookup::NotFound;
        }
        CacheLookup::Miss
    }

    pub fn get_by_name(&self, key: &str) -> CacheLookup<E> {
        self.get(DomainKey::Name, key, GetFromDomainCacheOption::Both)
    }

    pub fn get_by_id(&self, key: &str) -> CacheLookup<E> {
        self.get(DomainKey::Id, key, GetFromDomainCacheOption::Both)
    }

    pub fn get_by_virtual_hostname(&self, key: &str) -> CacheLookup<E> {
        self.get(DomainKey::VirtualHostname, key, GetFromDomainCacheOption::Both)
    }

    pub fn get_by_foreign_name(&self, key: &str) -> CacheLookup<E> {
        self.get(DomainKey::ForeignName, key, GetFromDomainCacheOption::Both)
    }

    pub fn get_by_krb5_realm(&self, key: &str) -> CacheLookup<E> {
        self.get(DomainKey::Krb5Realm, key, GetFromDomainCacheOption::Both)
    }

    pub fn put(&self, space: DomainKey, key: &str, entry: Option<Arc<E>>) {
        self.put_at(space, key, entry, duration_from_epoch_now())
    }

    /// Record the result of looking up `key`. `Some` caches the domain (and
    /// forgets any negative record it contradicts); `None` records that the
    /// key does not exist and drops any domain still cached under it.
    pub fn put_at(&self, space: DomainKey, key: &str, entry: Option<Arc<E>>, ct: Duration) {
        let mut inner = lock_cache(&self.inner);
        match entry {
            Some(e) => {
                inner.negative.clean(space, key, &e);
                inner.positive.put_at(e, ct);
            }
            None => {
                if inner.positive.remove_by_key(space, key).is_some() {
                    cache_debug!(?space, %key, "domain no longer exists, evicted");
                }
                inner.negative.put_at(space, key, ct);
            }
        }
    }

    pub fn remove(&self, entry: &E) -> bool {
        lock_cache(&self.inner).positive.remove(entry)
    }

    pub fn remove_by_key(&self, space: DomainKey, key: &str) -> Option<Arc<E>> {
        lock_cache(&self.inner).positive.remove_by_key(space, key)
    }

    pub fn remove_negative(&self, space: DomainKey, key: &str) -> bool {
        lock_cache(&self.inner).negative.remove(space, key)
    }

    pub fn clear(&self) {
        let mut inner = lock_cache(&self.inner);
        inner.positive.clear();
        inner.negative.clear();
    }

    pub fn size(&self) -> usize {
        lock_cache(&self.inner).positive.len()
    }

    pub fn negative_size(&self) -> usize {
        lock_cache(&self.inner).negative.len()
    }

    pub fn hit_rate(&self) -> f64 {
        lock_cache(&self.inner).positive.hit_rate()
    }

    pub fn is_negative_enabled(&self) -> bool {
        lock_cache(&self.inner).negative.is_enabled()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = lock_cache(&self.inner);
        CacheStats {
            name: "domain",
            size: inner.positive.len(),
            negative_size: inner.negative.len(),
            hit_rate: inner.positive.hit_rate(),
        }
    }
}
