//! In-memory backend.
//!
//! Tables are `IndexMap`s behind `tokio::sync::RwLock`, so listings keep
//! insertion order and writes are serialized per table.

mod repositories;

use indexmap::IndexMap;
use medbridge_core::generate_id;
use tokio::sync::RwLock;

/// How a [`MemoryStore`] assigns identifiers to new records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Random UUIDs, used for canonical records at the hub.
    #[default]
    Uuid,
    /// `1`, `2`, `3`... per table, used for local records at intake.
    Sequential,
}

#[derive(Debug)]
pub(crate) struct Table<T> {
    pub(crate) rows: IndexMap<String, T>,
    next_seq: u64,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            rows: IndexMap::new(),
            next_seq: 1,
        }
    }

    pub(crate) fn next_id(&mut self, strategy: IdStrategy) -> String {
        match strategy {
            IdStrategy::Uuid => generate_id(),
            IdStrategy::Sequential => {
                let id = self.next_seq;
                self.next_seq += 1;
                id.to_string()
            }
        }
    }
}

/// Process-local store implementing every repository trait.
#[derive(Debug)]
pub struct MemoryStore {
    pub(crate) ids: IdStrategy,
    pub(crate) patients: RwLock<Table<medbridge_core::Patient>>,
    pub(crate) practitioners: RwLock<Table<medbridge_core::Practitioner>>,
    pub(crate) encounters: RwLock<Table<medbridge_core::Encounter>>,
    pub(crate) messages: RwLock<Table<medbridge_core::Hl7MessageRecord>>,
}

impl MemoryStore {
    pub fn new(ids: IdStrategy) -> Self {
        Self {
            ids,
            patients: RwLock::new(Table::new()),
            practitioners: RwLock::new(Table::new()),
            encounters: RwLock::new(Table::new()),
            messages: RwLock::new(Table::new()),
        }
    }

    pub fn id_strategy(&self) -> IdStrategy {
        self.ids
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(IdStrategy::default())
    }
}
