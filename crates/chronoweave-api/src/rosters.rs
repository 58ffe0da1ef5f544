//! Roster file loading.
//!
//! The NPC and thread rosters belong to other services. The API server
//! takes a YAML snapshot of their ids at startup so validation can flag
//! dangling references.

use std::collections::HashMap;
use std::path::Path;

use chronoweave_core::config::ConfigError;
use chronoweave_core::roster::InMemoryRoster;
use serde::Deserialize;
use uuid::Uuid;

/// On-disk shape of a roster snapshot.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RosterFile {
    /// NPC ids with short descriptions.
    pub npcs: HashMap<Uuid, String>,
    /// Narrative thread ids with short descriptions.
    pub threads: HashMap<Uuid, String>,
}

impl RosterFile {
    /// Parses a roster snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a roster snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`RosterFile::from_yaml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    /// Splits the snapshot into `(npcs, threads)` rosters.
    #[must_use]
    pub fn into_rosters(self) -> (InMemoryRoster, InMemoryRoster) {
        (into_roster(self.npcs), into_roster(self.threads))
    }
}

fn into_roster(entries: HashMap<Uuid, String>) -> InMemoryRoster {
    entries
        .into_iter()
        .fold(InMemoryRoster::new(), |roster, (id, description)| {
            roster.with_entry(id, description)
        })
}

#[cfg(test)]
mod tests {
    use chronoweave_core::roster::Roster;

    use super::*;

    #[test]
    fn test_snapshot_splits_into_rosters() {
        let npc = Uuid::new_v4();
        let thread = Uuid::new_v4();
        let yaml = format!("npcs:\n  {npc}: Mira the lamplighter\nthreads:\n  {thread}: The flooded archive\n");

        let (npcs, threads) = RosterFile::from_yaml_str(&yaml).unwrap().into_rosters();

        assert_eq!(npcs.describe(npc).as_deref(), Some("Mira the lamplighter"));
        assert!(threads.exists(thread));
        assert!(!npcs.exists(thread));
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let (npcs, threads) = RosterFile::from_yaml_str("{}").unwrap().into_rosters();
        assert!(!npcs.exists(Uuid::new_v4()));
        assert!(!threads.exists(Uuid::new_v4()));
    }
}
