use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{lock_cache, CacheKeySpace, CacheStats, MultiKeyCache};
use crate::entry::DirectoryEntry;
use crate::prelude::*;
use crate::utils::duration_from_epoch_now;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKey {
    Name,
    Id,
    ForeignPrincipal,
}

impl FromStr for AccountKey {
    type Err = OperationError;

    /// Accounts can be addressed in more ways than the cache indexes, for
    /// example by kerberos principal. Those are rejected here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(AccountKey::Name),
            "id" => Ok(AccountKey::Id),
            "foreignPrincipal" => Ok(AccountKey::ForeignPrincipal),
            other => Err(OperationError::UnsupportedCacheKey(other.to_string())),
        }
    }
}

impl<E: DirectoryEntry> CacheKeySpace<E> for AccountKey {
    const ALL: &'static [Self] = &[AccountKey::Name, AccountKey::Id, AccountKey::ForeignPrincipal];

    fn index(self) -> usize {
        self as usize
    }

    fn case_insensitive(self) -> bool {
        self == AccountKey::Name
    }

    fn derive_keys(self, value: &E) -> Vec<String> {
        match self {
            AccountKey::Name => vec![value.get_name().to_string()],
            AccountKey::Id => vec![value.get_id().to_string()],
            AccountKey::ForeignPrincipal => value
                .get_multi_attr(ATTR_FOREIGN_PRINCIPAL)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Accounts by name, id and foreign principal.
#[derive(Debug)]
pub struct AccountCache<E> {
    inner: Mutex<MultiKeyCache<E, AccountKey>>,
}

impl<E: DirectoryEntry> AccountCache<E> {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        AccountCache {
            inner: Mutex::new(MultiKeyCache::new(capacity, ttl)),
        }
    }

    pub fn get(&self, space: AccountKey, key: &str) -> Option<Arc<E>> {
        self.get_at(space, key, duration_from_epoch_now())
    }

    pub fn get_at(&self, space: AccountKey, key: &str, ct: Duration) -> Option<Arc<E>> {
        lock_cache(&self.inner).get_at(space, key, ct)
    }

    /// Look up by a key type given by name.
    pub fn get_by(&self, key_type: &str, key: &str) -> Result<Option<Arc<E>>, OperationError> {
        let space = key_type.parse::<AccountKey>().map_err(|e| {
            cache_debug!(%key_type, "unsupported account cache key");
            e
        })?;
        Ok(self.get(space, key))
    }

    pub fn get_by_name(&self, key: &str) -> Option<Arc<E>> {
        self.get(AccountKey::Name, key)
    }

    pub fn get_by_id(&self, key: &str) -> Option<Arc<E>> {
        self.get(AccountKey::Id, key)
    }

    pub fn get_by_foreign_principal(&self, key: &str) -> Option<Arc<E>> {
        self.get(AccountKey::ForeignPrincipal, key)
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

    pub fn remove_by_key(&self, space: AccountKey, key: &str) -> Option<Arc<E>> {
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
            name: "account",
            size: inner.len(),
            negative_size: 0,
            hit_rate: inner.hit_rate(),
        }
    }
}
