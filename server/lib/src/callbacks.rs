//! Callbacks let an attribute run custom logic around a modification, for
//! example to reject a value that is well formed but conflicts with the rest of
//! the entry, or to trigger follow-up work once the change has been applied.
//!
//! Callbacks are registered by id in a [`CallbackRegistry`] at startup. Schema
//! definitions refer to them by that id; the
//! [`AttributeManager`](crate::manager::AttributeManager) resolves the
//! references when it is constructed.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::entry::DirectoryEntry;
use crate::prelude::*;
use crate::value::{AttrMods, AttrValue};

/// State shared by every callback invocation within one create or modify.
#[derive(Debug, Default)]
pub struct CallbackContext {
    is_create: bool,
    done: BTreeSet<AttrString>,
    data: HashMap<AttrString, String>,
}

impl CallbackContext {
    pub fn create() -> Self {
        CallbackContext {
            is_create: true,
            ..Default::default()
        }
    }

    pub fn modify() -> Self {
        CallbackContext::default()
    }

    pub fn is_create(&self) -> bool {
        self.is_create
    }

    /// Returns true if `key` was already marked done, otherwise marks it.
    /// Lets a callback bound to several attributes do its work only once.
    pub fn is_done_and_set_if_not(&mut self, key: &str) -> bool {
        !self.done.insert(AttrString::from(key))
    }

    pub fn set_data(&mut self, key: &str, value: String) {
        self.data.insert(AttrString::from(key), value);
    }

    pub fn get_data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

pub trait AttributeCallback: Send + Sync {
    fn id(&self) -> &'static str;

    /// Inspect a candidate value before anything is applied. `entry` is `None`
    /// during a create.
    fn pre_modify(
        &self,
        ctx: &mut CallbackContext,
        attr: &str,
        value: Option<&AttrValue>,
        attrs: &AttrMods,
        entry: Option<&dyn DirectoryEntry>,
    ) -> Result<(), CallbackError>;

    /// Runs after the modification was applied. Failures are logged and never
    /// undo the change.
    fn post_modify(
        &self,
        _ctx: &mut CallbackContext,
        _attr: &str,
        _entry: &dyn DirectoryEntry,
    ) -> Result<(), CallbackError> {
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct CallbackRegistry {
    callbacks: HashMap<AttrString, Arc<dyn AttributeCallback>>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.callbacks.keys().map(|k| k.as_str()).collect();
        ids.sort_unstable();
        f.debug_struct("CallbackRegistry").field("ids", &ids).finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callback: Arc<dyn AttributeCallback>) -> Result<(), OperationError> {
        let id = AttrString::from(callback.id());
        if self.callbacks.contains_key(&id) {
            admin_error!(%id, "callback registered twice");
            return Err(OperationError::InvalidRequest(format!(
                "callback {} is already registered",
                id
            )));
        }
        admin_debug!(%id, "registered attribute callback");
        self.callbacks.insert(id, callback);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn AttributeCallback>> {
        self.callbacks.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
