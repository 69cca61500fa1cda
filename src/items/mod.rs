// src/items/mod.rs

//! Work items and the upstream source they are loaded from.
//!
//! - [`WorkItem`] is the immutable unit of work handed to the engine.
//! - [`loader`] reads items from a CSV file of `name,description,value`
//!   records. Loading happens entirely before the run starts.

pub mod loader;

use std::collections::BTreeMap;
use std::fmt;

pub use loader::{load_items, ItemRecord, LoadOptions};

/// Stable identity of a work item within one run (its input position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub usize);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One unit of work.
///
/// The engine only reads `label` (forwarded to the progress sink); `payload`
/// is carried through untouched for the task implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    id: ItemId,
    label: String,
    payload: BTreeMap<String, String>,
}

impl WorkItem {
    pub fn new(id: ItemId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            payload: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn payload(&self) -> &BTreeMap<String, String> {
        &self.payload
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).map(String::as_str)
    }
}
