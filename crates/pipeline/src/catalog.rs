//! EventCatalog - construction-time dispatch table for declared events
//!
//! The declarative catalog is resolved into a plain lookup table when the
//! pipeline is built; there is no runtime method generation. An empty
//! catalog disables the check and allows free-form events.

use std::collections::HashMap;

use contracts::{EventDef, EventKey};

/// Declared events, keyed by `area::name`.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    entries: HashMap<EventKey, EventDef>,
}

impl EventCatalog {
    /// Resolve a list of declarations into a lookup table. Later
    /// duplicates silently win; config validation rejects them upstream.
    pub fn from_defs(defs: Vec<EventDef>) -> Self {
        let entries = defs
            .into_iter()
            .map(|def| (EventKey::compose(&def.area, &def.name), def))
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether `(area, name)` was declared.
    pub fn contains(&self, area: &str, name: &str) -> bool {
        let key = format!("{area}::{name}");
        self.entries.contains_key(key.as_str())
    }

    /// All declared entries.
    pub fn defs(&self) -> impl Iterator<Item = &EventDef> {
        self.entries.values()
    }
}
