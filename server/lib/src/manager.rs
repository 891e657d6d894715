//! The [`AttributeManager`] is the entry point for validating a batch of
//! attribute changes against the schema before they are written, and for
//! running the per-attribute callbacks around the write.
//!
//! A modification runs in three steps:
//!
//! * `pre_modify` validates every attribute in the batch and runs the
//!   pre-modify callbacks. Any failure aborts the whole batch.
//! * The caller (or [`AttributeManager::apply_modify`]) applies the batch.
//! * `post_modify` runs the post-modify callbacks. These can no longer fail the
//!   operation, so errors are only logged.

use std::collections::HashMap;
use std::sync::Arc;

use crate::callbacks::{AttributeCallback, CallbackContext, CallbackRegistry};
use crate::entry::{DirectoryEntry, DirectoryEntryMut};
use crate::prelude::*;
use crate::schema::{AttributeSchema, ValidationPolicy};
use crate::value::{AttrMods, AttrValue};

pub struct AttributeManager {
    schema: Arc<AttributeSchema>,
    // Keyed by the lower cased attribute name.
    callbacks: HashMap<AttrString, Arc<dyn AttributeCallback>>,
    policy: ValidationPolicy,
}

impl std::fmt::Debug for AttributeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeManager")
            .field("attrs", &self.schema.len())
            .field("callbacks", &self.callbacks.len())
            .field("policy", &self.policy)
            .finish()
    }
}

/// `+name` and `-name` address the same attribute as `name`.
fn strip_modifier(name: &str) -> &str {
    name.strip_prefix('+')
        .or_else(|| name.strip_prefix('-'))
        .unwrap_or(name)
}

impl AttributeManager {
    /// Bind a schema to its callbacks. Fails if the schema names a callback
    /// that was never registered.
    pub fn new(
        schema: Arc<AttributeSchema>,
        registry: &CallbackRegistry,
        policy: ValidationPolicy,
    ) -> Result<Self, OperationError> {
        let mut callbacks = HashMap::new();
        let mut missing = Vec::new();

        for ai in schema.iter() {
            let Some(id) = ai.callback.as_ref() else {
                continue;
            };
            match registry.get(id) {
                Some(cb) => {
                    callbacks.insert(AttrString::from(ai.name.to_lowercase()), cb);
                }
                None => missing.push(format!("{} -> {}", ai.name, id)),
            }
        }

        if !missing.is_empty() {
            missing.sort();
            let missing = missing.join(", ");
            admin_error!(%missing, "schema references unregistered callbacks");
            return Err(OperationError::InvalidSchemaState(format!(
                "unregistered callbacks: {}",
                missing
            )));
        }

        Ok(AttributeManager {
            schema,
            callbacks,
            policy,
        })
    }

    pub fn schema(&self) -> &Arc<AttributeSchema> {
        &self.schema
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn has_callback(&self, attr: &str) -> bool {
        self.callbacks
            .contains_key(&AttrString::from(attr.to_lowercase()))
    }

    fn callback_for(&self, attr: &str) -> Option<&Arc<dyn AttributeCallback>> {
        self.callbacks.get(&AttrString::from(attr.to_lowercase()))
    }

    /// Validate a single value. Unlike `pre_modify`, an attribute unknown to
    /// the schema is an error here.
    pub fn check_value(
        &self,
        name: &str,
        value: Option<&AttrValue>,
        check_immutable: bool,
    ) -> Result<(), OperationError> {
        let ai = self
            .schema
            .get_attribute_info(name)
            .ok_or_else(|| SchemaError::InvalidAttributeName(name.to_string()))?;
        ai.check_value(value, check_immutable, &self.policy)
            .map_err(OperationError::from)
    }

    pub fn pre_modify(
        &self,
        attrs: &AttrMods,
        entry: Option<&dyn DirectoryEntry>,
        ctx: &mut CallbackContext,
        check_immutable: bool,
    ) -> Result<(), OperationError> {
        self.pre_modify_with(attrs, entry, ctx, check_immutable, true)
    }

    /// As [`pre_modify`](Self::pre_modify), with control over whether callbacks
    /// run. Attributes unknown to the schema are skipped with a warning.
    #[instrument(level = "debug", skip_all, fields(create = ctx.is_create(), attrs = attrs.len()))]
    pub fn pre_modify_with(
        &self,
        attrs: &AttrMods,
        entry: Option<&dyn DirectoryEntry>,
        ctx: &mut CallbackContext,
        check_immutable: bool,
        allow_callback: bool,
    ) -> Result<(), OperationError> {
        for (raw_name, value) in attrs.iter() {
            let name = strip_modifier(raw_name);
            if name.is_empty() {
                admin_error!(attr = %raw_name, "empty attribute name in modification");
                return Err(SchemaError::InvalidAttributeName(raw_name.clone()).into());
            }

            let Some(ai) = self.schema.get_attribute_info(name) else {
                admin_warn!(attr = %name, "attribute is not in the schema, skipping validation");
                continue;
            };

            if let Some(since) = ai.deprecated_since.as_ref() {
                admin_warn!(
                    attr = %name,
                    %since,
                    desc = ai.deprecate_desc.as_deref().unwrap_or_default(),
                    "modifying deprecated attribute"
                );
            }

            ai.check_value(value.as_ref(), check_immutable, &self.policy)
                .map_err(|e| {
                    admin_info!(%e, "rejected attribute value");
                    OperationError::from(e)
                })?;

            if allow_callback {
                if let Some(cb) = self.callback_for(name) {
                    cb.pre_modify(ctx, name, value.as_ref(), attrs, entry)
                        .map_err(|e| {
                            callback_error!(callback = cb.id(), %e, "pre modify callback rejected change");
                            OperationError::from(e)
                        })?;
                }
            }
        }
        Ok(())
    }

    pub fn post_modify(&self, attrs: &AttrMods, entry: &dyn DirectoryEntry, ctx: &mut CallbackContext) {
        self.post_modify_with(attrs, entry, ctx, true)
    }

    #[instrument(level = "debug", skip_all, fields(create = ctx.is_create()))]
    pub fn post_modify_with(
        &self,
        attrs: &AttrMods,
        entry: &dyn DirectoryEntry,
        ctx: &mut CallbackContext,
        allow_callback: bool,
    ) {
        if !allow_callback {
            return;
        }
        for raw_name in attrs.keys() {
            let name = strip_modifier(raw_name);
            let Some(cb) = self.callback_for(name) else {
                continue;
            };
            if let Err(e) = cb.post_modify(ctx, name, entry) {
                callback_warn!(callback = cb.id(), %e, "post modify callback failed");
            }
        }
    }

    /// Validate and then apply `attrs` to `entry`. Nothing is applied unless
    /// every attribute passes.
    pub fn apply_modify<E: DirectoryEntryMut>(
        &self,
        attrs: &AttrMods,
        entry: &mut E,
        ctx: &mut CallbackContext,
        check_immutable: bool,
    ) -> Result<(), OperationError> {
        self.pre_modify(attrs, Some(&*entry as &dyn DirectoryEntry), ctx, check_immutable)?;
        for (name, value) in attrs.iter() {
            entry.apply_attr(name, value.as_ref());
        }
        self.post_modify(attrs, &*entry, ctx);
        Ok(())
    }
}
