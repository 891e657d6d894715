//! The dirprovd provisioning library. This implements the attribute schema and
//! validation engine that every write to the directory passes through, and the
//! bounded, expiring caches of accounts, domains, classes of service and
//! servers that sit in front of directory lookups.

#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::manual_let_else)]
#![allow(clippy::unreachable)]

#[macro_use]
extern crate tracing;
#[macro_use]
extern crate lazy_static;

pub mod cache;
pub mod callbacks;
pub mod config;
pub mod entry;
pub mod manager;
pub mod provisioning;
pub mod schema;
pub mod utils;
pub mod value;

/// A prelude of imports that should be imported by all other modules
/// to help make imports cleaner.
pub mod prelude {
    pub use dirprov_proto::attribute::{AttrString, Attribute};
    pub use dirprov_proto::constants::*;
    pub use dirprov_proto::internal::{
        CacheEntryBy, CacheEntrySelector, CacheEntryType, CallbackError, OperationError,
        SchemaError,
    };
    pub use sketching::{
        admin_debug, admin_error, admin_info, admin_warn, cache_debug, cache_trace,
        callback_error, callback_warn, schema_error, schema_info, schema_warn,
        tagged_event, EventTag,
    };

    pub use crate::cache::{CacheLookup, GetFromDomainCacheOption};
    pub use crate::callbacks::{AttributeCallback, CallbackContext, CallbackRegistry};
    pub use crate::config::CacheConfig;
    pub use crate::entry::{DirectoryEntry, DirectoryEntryMut};
    pub use crate::manager::AttributeManager;
    pub use crate::provisioning::{Provisioning, ProvisioningCache};
    pub use crate::schema::{AttributeSchema, SchemaLoader, ValidationPolicy};
    pub use crate::value::{AttrMods, AttrValue};
}
