//! Bounded, time-expiring caches of directory entries.
//!
//! Every cache here indexes one shared entry under several keys at once (an
//! account by name, id and foreign principal, a domain by name, id, each of its
//! virtual hostnames and so on). Lookups by any key return the same
//! `Arc`, and removing or replacing the entry drops every key that points at it.
//! Each index is an LRU bounded to the configured size. Entries expire a fixed
//! time after insertion; an expired entry is evicted when a lookup finds it.
//!
//! The domain cache also remembers lookups that found nothing, so repeated
//! queries for a domain that does not exist stay cheap.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::prelude::*;

mod account;
mod domain;
mod hitrate;
mod multikey;
mod named;
mod negative;

pub use self::account::{AccountCache, AccountKey};
pub use self::domain::{CacheLookup, DomainCache, DomainKey, GetFromDomainCacheOption};
pub use self::hitrate::HitRateCounter;
pub use self::multikey::{CacheEntry, MultiKeyCache};
pub use self::named::{NamedEntryCache, NamedKey};
pub use self::negative::NegativeCache;

/// One way of addressing an entry in a cache. `derive_keys` extracts the key
/// values an entry is reachable by in this key space.
pub trait CacheKeySpace<V>: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    /// Position of this key space in [`ALL`](Self::ALL).
    fn index(self) -> usize;

    /// Keys in this space are compared without regard to case.
    fn case_insensitive(self) -> bool;

    fn derive_keys(self, value: &V) -> Vec<String>;
}

pub(crate) fn normalise_key<V, K: CacheKeySpace<V>>(space: K, key: &str) -> AttrString {
    if space.case_insensitive() {
        AttrString::from(key.to_lowercase())
    } else {
        AttrString::from(key)
    }
}

/// Lock a cache, recovering the guard if a previous holder panicked. Every
/// cache operation leaves the indexes consistent before it can panic.
pub(crate) fn lock_cache<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|e: PoisonError<_>| {
        admin_warn!("recovering poisoned cache lock");
        e.into_inner()
    })
}

/// A point in time view of one cache, for diagnostics.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CacheStats {
    pub name: &'static str,
    pub size: usize,
    pub negative_size: usize,
    pub hit_rate: f64,
}
