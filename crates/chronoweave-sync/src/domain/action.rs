//! The player action submitted with each turn.

use std::collections::BTreeSet;

use chronoweave_consequence::domain::choice::TriggeringChoice;
use chronoweave_core::world::{ActorId, DynamicsType, MemoryType, TensionType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request to form a relationship web.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebRequest {
    /// Display name of the group.
    pub group_name: String,
    /// Members, the player optionally among them.
    pub member_ids: BTreeSet<ActorId>,
    /// Social shape of the group.
    pub dynamics_type: DynamicsType,
}

/// A request to open a romantic tension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensionRequest {
    /// Kind of tension.
    pub tension_type: TensionType,
    /// Actors involved.
    pub involved_actor_ids: BTreeSet<ActorId>,
    /// Whether the player starts out drawn in.
    #[serde(default)]
    pub player_involved: bool,
    /// Starting level, clamped into range.
    #[serde(default)]
    pub initial_level: i32,
}

/// A jealousy trigger between two actors sharing a tension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JealousyRequest {
    /// The jealous actor.
    pub jealous_actor_id: ActorId,
    /// The object of the jealousy.
    pub target_actor_id: ActorId,
    /// What happened.
    pub description: String,
}

/// A memory the protagonist forms this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRequest {
    /// Category.
    pub memory_type: MemoryType,
    /// What is remembered.
    pub content: String,
    /// Initial retention, clamped into range.
    pub retention_strength: i32,
}

/// Everything a player action asks of the engines this turn.
///
/// Every field is optional on the wire; an empty action still matures due
/// chains and runs validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerAction {
    /// What the player did, in prose.
    pub description: String,
    /// Free-form markers the loop predicate may react to.
    pub flags: BTreeSet<String>,
    /// A consequential choice that schedules a new chain.
    pub choice: Option<TriggeringChoice>,
    /// Webs to form.
    pub form_webs: Vec<WebRequest>,
    /// Tensions to open.
    pub new_tensions: Vec<TensionRequest>,
    /// Jealousy triggers, applied in order.
    pub jealousy_triggers: Vec<JealousyRequest>,
    /// Webs to resolve.
    pub resolve_webs: Vec<Uuid>,
    /// Tensions to resolve.
    pub resolve_tensions: Vec<Uuid>,
    /// Arms loop mechanics with this trigger description.
    pub activate_loop: Option<String>,
    /// Memories to record.
    pub memories: Vec<MemoryRequest>,
    /// Stability to restore.
    pub stability_restoration: Option<i32>,
    /// Whether memories may survive a loop fired this turn.
    pub preserve_memories: bool,
}

impl Default for PlayerAction {
    fn default() -> Self {
        Self {
            description: String::new(),
            flags: BTreeSet::new(),
            choice: None,
            form_webs: Vec::new(),
            new_tensions: Vec::new(),
            jealousy_triggers: Vec::new(),
            resolve_webs: Vec::new(),
            resolve_tensions: Vec::new(),
            activate_loop: None,
            memories: Vec::new(),
            stability_restoration: None,
            preserve_memories: true,
        }
    }
}

impl PlayerAction {
    /// An action with only a description.
    #[must_use]
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Adds a flag.
    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    /// Returns `true` if the action carries `flag`.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }
}
