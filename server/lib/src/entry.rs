//! Entries are the unit the provisioning engine validates and caches. The engine
//! itself never owns the directory's storage format, so it only talks to
//! entries through the [`DirectoryEntry`] and [`DirectoryEntryMut`] traits. The
//! concrete [`Entry`] type here is an in-memory implementation that is good
//! enough for the caches, the tests and any caller without its own storage.
//!
//! An [`Entry`] is a collection of attribute-value sets:
//!
//! ```text
//! Entry {
//!   "id": ["0d7c2d0e-..."],
//!   "name": ["example.com"],
//!   "virtualHostname": ["www.example.com", "mail.example.com"],
//! };
//! ```
//!
//! Attribute names are matched case-insensitively. An attribute with zero values
//! is removed.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::prelude::*;
use crate::value::{AttrValue, EntryClass};

/// Read access to a directory entry.
pub trait DirectoryEntry: Send + Sync {
    /// The stable, unique identifier of this entry.
    fn get_id(&self) -> &str;

    fn get_name(&self) -> &str;

    fn get_class(&self) -> EntryClass;

    /// All values of an attribute, in insertion order. Empty if unset.
    fn get_multi_attr(&self, attr: &str) -> Vec<&str>;

    /// The first value of an attribute.
    fn get_attr(&self, attr: &str) -> Option<&str> {
        self.get_multi_attr(attr).into_iter().next()
    }
}

/// Write access to a directory entry, used when a validated modification is
/// applied.
pub trait DirectoryEntryMut: DirectoryEntry {
    /// Replace every value of `attr`. An empty list unsets it.
    fn set_attr(&mut self, attr: &str, values: Vec<String>);

    /// Add values to `attr`, skipping ones already present.
    fn add_attr_values(&mut self, attr: &str, values: Vec<String>);

    /// Remove the given values from `attr`.
    fn remove_attr_values(&mut self, attr: &str, values: &[String]);

    /// Apply one entry of a modification batch. A `+` prefix adds values, a
    /// `-` prefix removes them, and a bare name replaces the attribute.
    fn apply_attr(&mut self, name: &str, value: Option<&AttrValue>) {
        let values = value.map(AttrValue::to_vec).unwrap_or_default();
        if let Some(attr) = name.strip_prefix('+') {
            self.add_attr_values(attr, values);
        } else if let Some(attr) = name.strip_prefix('-') {
            if values.is_empty() {
                self.set_attr(attr, Vec::new());
            } else {
                self.remove_attr_values(attr, &values);
            }
        } else {
            self.set_attr(name, values);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    id: String,
    name: String,
    class: EntryClass,
    // Keys are folded to lower case.
    attrs: BTreeMap<AttrString, Vec<String>>,
}

impl Entry {
    /// A new entry with a freshly generated id.
    pub fn new(class: EntryClass, name: &str) -> Self {
        Self::with_id(class, &Uuid::new_v4().to_string(), name)
    }

    pub fn with_id(class: EntryClass, id: &str, name: &str) -> Self {
        Entry {
            id: id.to_string(),
            name: name.to_string(),
            class,
            attrs: BTreeMap::new(),
        }
    }

    /// Builder style helper, mostly for tests and fixtures.
    pub fn with_attr(mut self, attr: &str, values: &[&str]) -> Self {
        self.set_attr(attr, values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn attr_names(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(|k| k.as_str())
    }

    fn fold(attr: &str) -> AttrString {
        AttrString::from(attr.to_lowercase())
    }
}

impl DirectoryEntry for Entry {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_class(&self) -> EntryClass {
        self.class
    }

    fn get_multi_attr(&self, attr: &str) -> Vec<&str> {
        match Attribute::from_str(attr) {
            Attribute::Id => vec![self.id.as_str()],
            Attribute::Name => vec![self.name.as_str()],
            _ => self
                .attrs
                .get(&Self::fold(attr))
                .map(|vs| vs.iter().map(String::as_str).collect())
                .unwrap_or_default(),
        }
    }
}

impl DirectoryEntryMut for Entry {
    fn set_attr(&mut self, attr: &str, values: Vec<String>) {
        match Attribute::from_str(attr) {
            Attribute::Name => {
                if let Some(name) = values.into_iter().next() {
                    self.name = name;
                }
                return;
            }
            Attribute::Id => {
                admin_warn!(id = %self.id, "refusing to change the id of an entry");
                return;
            }
            _ => {}
        }
        let key = Self::fold(attr);
        if values.is_empty() {
            self.attrs.remove(&key);
        } else {
            self.attrs.insert(key, values);
        }
    }

    fn add_attr_values(&mut self, attr: &str, values: Vec<String>) {
        if matches!(Attribute::from_str(attr), Attribute::Name | Attribute::Id) {
            return self.set_attr(attr, values);
        }
        if values.is_empty() {
            return;
        }
        let current = self.attrs.entry(Self::fold(attr)).or_default();
        for v in values {
            if !current.contains(&v) {
                current.push(v);
            }
        }
    }

    fn remove_attr_values(&mut self, attr: &str, values: &[String]) {
        let key = Self::fold(attr);
        let now_empty = match self.attrs.get_mut(&key) {
            Some(current) => {
                current.retain(|v| !values.contains(v));
                current.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.attrs.remove(&key);
        }
    }
}
