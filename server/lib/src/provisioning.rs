//! The provisioning layer owns one attribute manager and one set of entry
//! caches for the lifetime of the process. Directory lookups consult the caches
//! first, and every write goes through the manager before the cached copy is
//! replaced.

use std::sync::Arc;

use crate::cache::{
    AccountCache, AccountKey, CacheStats, DomainCache, DomainKey, NamedEntryCache, NamedKey,
};
use crate::callbacks::{CallbackContext, CallbackRegistry};
use crate::config::CacheConfig;
use crate::entry::{DirectoryEntry, DirectoryEntryMut, Entry};
use crate::manager::AttributeManager;
use crate::prelude::*;
use crate::schema::AttributeSchema;
use crate::value::{AttrMods, EntryClass};

/// The entry caches, sized from a [`CacheConfig`].
#[derive(Debug)]
pub struct ProvisioningCache<E = Entry> {
    accounts: AccountCache<E>,
    domains: DomainCache<E>,
    cos: NamedEntryCache<E>,
    servers: NamedEntryCache<E>,
}

impl<E: DirectoryEntry> ProvisioningCache<E> {
    pub fn new(config: &CacheConfig) -> Result<Self, OperationError> {
        config.validate()?;
        Ok(ProvisioningCache {
            accounts: AccountCache::new(
                CacheConfig::capacity("account_maxsize", config.account_maxsize)?,
                config.account_ttl(),
            ),
            domains: DomainCache::new(
                CacheConfig::capacity("domain_maxsize", config.domain_maxsize)?,
                config.domain_ttl(),
                config.domain_nx_enabled,
                CacheConfig::capacity("domain_nx_maxsize", config.domain_nx_maxsize)?,
                config.domain_nx_ttl(),
            ),
            cos: NamedEntryCache::new(
                "cos",
                CacheConfig::capacity("cos_maxsize", config.cos_maxsize)?,
                config.cos_ttl(),
            ),
            servers: NamedEntryCache::new(
                "server",
                CacheConfig::capacity("server_maxsize", config.server_maxsize)?,
                config.server_ttl(),
            ),
        })
    }

    pub fn accounts(&self) -> &AccountCache<E> {
        &self.accounts
    }

    pub fn domains(&self) -> &DomainCache<E> {
        &self.domains
    }

    pub fn cos(&self) -> &NamedEntryCache<E> {
        &self.cos
    }

    pub fn servers(&self) -> &NamedEntryCache<E> {
        &self.servers
    }

    /// Drop cached entries. With no selectors the whole cache for
    /// `entry_type` is cleared, otherwise only the selected entries are.
    #[instrument(level = "debug", skip(self, selectors), fields(selected = selectors.map(|s| s.len())))]
    pub fn flush(
        &self,
        entry_type: CacheEntryType,
        selectors: Option<&[CacheEntrySelector]>,
    ) -> Result<(), OperationError> {
        let Some(selectors) = selectors else {
            match entry_type {
                CacheEntryType::Account => self.accounts.clear(),
                CacheEntryType::Domain => self.domains.clear(),
                CacheEntryType::Cos => self.cos.clear(),
                CacheEntryType::Server => self.servers.clear(),
                CacheEntryType::Config => {
                    admin_debug!("configuration is not cached, nothing to flush");
                }
            }
            admin_info!(%entry_type, "flushed cache");
            return Ok(());
        };

        for sel in selectors {
            let removed = match (entry_type, sel.by) {
                (CacheEntryType::Account, CacheEntryBy::Id) => {
                    self.accounts.remove_by_key(AccountKey::Id, &sel.key).is_some()
                }
                (CacheEntryType::Account, CacheEntryBy::Name) => {
                    self.accounts.remove_by_key(AccountKey::Name, &sel.key).is_some()
                }
                (CacheEntryType::Domain, by) => {
                    let space = match by {
                        CacheEntryBy::Id => DomainKey::Id,
                        CacheEntryBy::Name => DomainKey::Name,
                    };
                    let positive = self.domains.remove_by_key(space, &sel.key).is_some();
                    self.domains.remove_negative(space, &sel.key) || positive
                }
                (CacheEntryType::Cos, by) => self
                    .cos
                    .remove_by_key(named_key(by), &sel.key)
                    .is_some(),
                (CacheEntryType::Server, by) => self
                    .servers
                    .remove_by_key(named_key(by), &sel.key)
                    .is_some(),
                (CacheEntryType::Config, _) => {
                    admin_error!("config flush does not take entry selectors");
                    return Err(OperationError::InvalidRequest(
                        "config cache flush does not accept entries".to_string(),
                    ));
                }
            };
            cache_debug!(%entry_type, key = %sel.key, removed, "flushed cache entry");
        }
        Ok(())
    }

    /// Drop an account from the cache, for example after it was deleted or
    /// renamed.
    pub fn remove_from_cache(&self, account: &E) -> bool {
        self.accounts.remove(account)
    }

    pub fn stats(&self) -> Vec<CacheStats> {
        vec![
            self.accounts.stats(),
            self.domains.stats(),
            self.cos.stats(),
            self.servers.stats(),
        ]
    }
}

fn named_key(by: CacheEntryBy) -> NamedKey {
    match by {
        CacheEntryBy::Id => NamedKey::Id,
        CacheEntryBy::Name => NamedKey::Name,
    }
}

/// The process wide pairing of schema validation and caches.
#[derive(Debug)]
pub struct Provisioning<E = Entry> {
    manager: AttributeManager,
    caches: ProvisioningCache<E>,
}

impl<E: DirectoryEntryMut + Clone> Provisioning<E> {
    pub fn new(
        config: &CacheConfig,
        schema: AttributeSchema,
        callbacks: &CallbackRegistry,
    ) -> Result<Self, OperationError> {
        let manager =
            AttributeManager::new(Arc::new(schema), callbacks, config.validation_policy())?;
        let caches = ProvisioningCache::new(config)?;
        admin_info!(attrs = manager.schema().len(), "provisioning started");
        Ok(Provisioning { manager, caches })
    }

    pub fn manager(&self) -> &AttributeManager {
        &self.manager
    }

    pub fn caches(&self) -> &ProvisioningCache<E> {
        &self.caches
    }

    /// Validate and apply `attrs` to a copy of `entry`. On success the copy
    /// replaces `entry` in whichever cache holds entries of its class.
    #[instrument(level = "debug", skip_all, fields(id = entry.get_id()))]
    pub fn modify_entry(
        &self,
        entry: &E,
        attrs: &AttrMods,
        ctx: &mut CallbackContext,
    ) -> Result<Arc<E>, OperationError> {
        let mut updated = entry.clone();
        self.manager
            .apply_modify(attrs, &mut updated, ctx, true)?;
        let updated = Arc::new(updated);

        match entry.get_class() {
            EntryClass::Account => {
                self.caches.accounts.remove(entry);
                self.caches.accounts.put(updated.clone());
            }
            EntryClass::Domain => {
                self.caches.domains.remove(entry);
                self.caches
                    .domains
                    .put(DomainKey::Id, updated.get_id(), Some(updated.clone()));
            }
            EntryClass::Cos => {
                self.caches.cos.remove(entry);
                self.caches.cos.put(updated.clone());
            }
            EntryClass::Server => {
                self.caches.servers.remove(entry);
                self.caches.servers.put(updated.clone());
            }
            _ => {}
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AttrValue;

    fn caches() -> ProvisioningCache<Entry> {
        ProvisioningCache::new(&CacheConfig::default()).expect("failed to build caches")
    }

    fn domain(id: &str, name: &str) -> Arc<Entry> {
        Arc::new(Entry::with_id(EntryClass::Domain, id, name))
    }

    #[test]
    fn test_flush_whole_cache() {
        let c = caches();
        c.accounts()
            .put(Arc::new(Entry::with_id(EntryClass::Account, "a-1", "alice")));
        c.domains()
            .put(DomainKey::Name, "example.com", Some(domain("d-1", "example.com")));
        c.domains().put(DomainKey::Name, "missing.org", None);

        assert!(c.flush(CacheEntryType::Account, None).is_ok());
        assert_eq!(c.accounts().size(), 0);
        assert_eq!(c.domains().size(), 1);

        assert!(c.flush(CacheEntryType::Domain, None).is_ok());
        assert_eq!(c.domains().size(), 0);
        assert_eq!(c.domains().negative_size(), 0);

        assert!(c.flush(CacheEntryType::Config, None).is_ok());
    }

    #[test]
    fn test_flush_selected_entries() {
        let c = caches();
        c.domains()
            .put(DomainKey::Name, "example.com", Some(domain("d-1", "example.com")));
        c.domains()
            .put(DomainKey::Name, "example.org", Some(domain("d-2", "example.org")));
        c.domains().put(DomainKey::Name, "missing.org", None);
        c.cos()
            .put(Arc::new(Entry::with_id(EntryClass::Cos, "c-1", "default")));

        let sel = [
            CacheEntrySelector::by_id("d-1"),
            CacheEntrySelector::by_name("MISSING.ORG"),
        ];
        assert!(c.flush(CacheEntryType::Domain, Some(&sel[..])).is_ok());
        assert_eq!(c.domains().size(), 1);
        assert_eq!(c.domains().negative_size(), 0);
        assert!(c.domains().get_by_name("example.org").found().is_some());

        assert!(c
            .flush(CacheEntryType::Cos, Some(&[CacheEntrySelector::by_name("Default")][..]))
            .is_ok());
        assert_eq!(c.cos().size(), 0);

        // Unknown keys are not an error.
        assert!(c
            .flush(CacheEntryType::Server, Some(&[CacheEntrySelector::by_id("nope")][..]))
            .is_ok());
    }

    #[test]
    fn test_flush_config_with_selectors() {
        let c = caches();
        assert_eq!(
            c.flush(
                CacheEntryType::Config,
                Some(&[CacheEntrySelector::by_name("x")][..])
            ),
            Err(OperationError::InvalidRequest(String::new()))
        );
    }

    #[test]
    fn test_remove_from_cache_and_stats() {
        let c = caches();
        let a = Arc::new(
            Entry::with_id(EntryClass::Account, "a-1", "alice")
                .with_attr(ATTR_FOREIGN_PRINCIPAL, &["ad:alice"]),
        );
        c.accounts().put(a.clone());
        assert!(c.accounts().get_by_foreign_principal("ad:alice").is_some());
        assert!(c.remove_from_cache(&a));
        assert!(c.accounts().get_by_id("a-1").is_none());

        let stats = c.stats();
        let names: Vec<_> = stats.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["account", "domain", "cos", "server"]);
        assert_eq!(stats[0].hit_rate, 50.0);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let config = CacheConfig {
            domain_nx_maxsize: 0,
            ..Default::default()
        };
        assert_eq!(
            ProvisioningCache::<Entry>::new(&config).map(|_| ()),
            Err(OperationError::InvalidConfiguration(String::new()))
        );
    }

    #[test]
    fn test_modify_entry_refreshes_cache() {
        sketching::test_init();
        let schema = AttributeSchema::from_json(
            r#"{ "attrs": [ { "name": "description", "type": "string", "max": 8 } ] }"#,
        )
        .expect("invalid schema");
        let p: Provisioning<Entry> =
            Provisioning::new(&CacheConfig::default(), schema, &CallbackRegistry::new())
                .expect("failed to start");

        let alice = Entry::with_id(EntryClass::Account, "a-1", "alice");
        p.caches().accounts().put(Arc::new(alice.clone()));

        let mut attrs = AttrMods::new();
        attrs.insert("description".to_string(), Some(AttrValue::from("hello")));
        let mut ctx = CallbackContext::modify();
        let updated = p
            .modify_entry(&alice, &attrs, &mut ctx)
            .expect("modify failed");
        let cached = p.caches().accounts().get_by_id("a-1").expect("missing");
        assert!(Arc::ptr_eq(&cached, &updated));
        assert_eq!(cached.get_attr("description"), Some("hello"));

        attrs.insert(
            "description".to_string(),
            Some(AttrValue::from("far too long")),
        );
        assert!(p.modify_entry(&alice, &attrs, &mut ctx).is_err());
        let cached = p.caches().accounts().get_by_id("a-1").expect("missing");
        assert_eq!(cached.get_attr("description"), Some("hello"));
    }
}
