//! Lazy per-entity fact cache.
//!
//! The first symbol lookup for an entity key pulls every known field
//! for that key from the [`FactSource`] in one shot; later lookups hit
//! memory. A condition with no symbols never touches the source.
//! The cache is created and discarded within a single row's
//! processing, never shared across rows or runs.

use std::collections::HashMap;

use crate::symbols::Field;
use crate::value::Value;

/// Supplies the freshly computed row state for one entity key.
pub trait FactSource {
    /// All known fields for `key`, or `None` if the key is unknown.
    fn facts(&self, key: &str) -> Option<HashMap<Field, Value>>;
}

#[derive(Debug, Default)]
pub struct EvalCache {
    entries: HashMap<String, HashMap<Field, Value>>,
}

impl EvalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate facts for a key, bypassing the source.
    pub fn insert(&mut self, key: impl Into<String>, facts: HashMap<Field, Value>) {
        self.entries.insert(key.into(), facts);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Resolve one field for `key`, populating the key's whole entry
    /// from the source on first access.
    pub fn lookup(
        &mut self,
        key: &str,
        field: Field,
        source: &dyn FactSource,
    ) -> Option<Value> {
        if !self.entries.contains_key(key) {
            if let Some(facts) = source.facts(key) {
                self.entries.insert(key.to_string(), facts);
            }
        }
        self.entries.get(key)?.get(&field).cloned()
    }
}
