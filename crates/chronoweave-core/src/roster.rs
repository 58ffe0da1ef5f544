//! Read-only roster lookups.
//!
//! The NPC roster and the narrative-thread roster are owned by other
//! systems. This layer only asks whether an id exists, when validating.

use std::collections::HashMap;

use uuid::Uuid;

/// A read-only roster of ids.
pub trait Roster: Send + Sync {
    /// Returns `true` if `id` is on the roster.
    fn exists(&self, id: Uuid) -> bool;

    /// A short description of `id`, if it is on the roster.
    fn describe(&self, id: Uuid) -> Option<String>;
}

/// A roster backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoster {
    entries: HashMap<Uuid, String>,
}

impl InMemoryRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    #[must_use]
    pub fn with_entry(mut self, id: Uuid, description: impl Into<String>) -> Self {
        self.entries.insert(id, description.into());
        self
    }

    /// Builds a roster from bare ids, described by their id string.
    pub fn from_ids(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            entries: ids.into_iter().map(|id| (id, id.to_string())).collect(),
        }
    }
}

impl Roster for InMemoryRoster {
    fn exists(&self, id: Uuid) -> bool {
        self.entries.contains_key(&id)
    }

    fn describe(&self, id: Uuid) -> Option<String> {
        self.entries.get(&id).cloned()
    }
}
