//! Names and defaults that both sides of the provisioning boundary need to agree on.

/// The immutable identifier of every directory entry.
pub const ATTR_ID: &str = "id";
/// The primary name of an entry. For accounts this is the full address.
pub const ATTR_NAME: &str = "name";
/// Multi-valued foreign principals of an account, eg `ad:jdoe`.
pub const ATTR_FOREIGN_PRINCIPAL: &str = "foreignPrincipal";
/// Multi-valued virtual hostnames that resolve to a domain.
pub const ATTR_VIRTUAL_HOSTNAME: &str = "virtualHostname";
/// Multi-valued foreign names that resolve to a domain, eg `app:example`.
pub const ATTR_FOREIGN_NAME: &str = "foreignName";
/// The single kerberos realm of a domain.
pub const ATTR_KRB5_REALM: &str = "authKerberos5Realm";

pub const DEFAULT_ACCOUNT_CACHE_MAXSIZE: usize = 20000;
pub const DEFAULT_DOMAIN_CACHE_MAXSIZE: usize = 500;
pub const DEFAULT_DOMAIN_NX_CACHE_MAXSIZE: usize = 500;
pub const DEFAULT_COS_CACHE_MAXSIZE: usize = 100;
pub const DEFAULT_SERVER_CACHE_MAXSIZE: usize = 100;
/// Seconds. Fifteen minutes matches the directory's own replication interval.
pub const DEFAULT_CACHE_MAXAGE: u64 = 900;
