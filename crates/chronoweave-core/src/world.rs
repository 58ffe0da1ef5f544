//! The World Model aggregate and the structures it owns.
//!
//! The World Model is owned by the caller and passed through the turn
//! pipeline by value. Actors and narrative threads are referenced by id only;
//! their rosters live outside this layer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an NPC (or the player) in the external actor roster.
pub type ActorId = Uuid;

/// Identifier of a narrative thread in the external thread roster.
pub type ThreadId = Uuid;

/// Monotonic turn number supplied by the caller.
pub type TurnId = u64;

/// Lower bound of every `[0, 100]` level.
pub const LEVEL_MIN: i32 = 0;

/// Upper bound of every `[0, 100]` level.
pub const LEVEL_MAX: i32 = 100;

/// Clamps a level into `[LEVEL_MIN, LEVEL_MAX]`.
#[must_use]
pub fn clamp_level(value: i32) -> i32 {
    value.clamp(LEVEL_MIN, LEVEL_MAX)
}

/// A scheduled, decaying effect of a player choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceChain {
    /// Chain identifier.
    pub id: Uuid,
    /// What caused this chain.
    pub origin_description: String,
    /// Depth in the chain tree; 0 is a root.
    pub chain_level: u32,
    /// Strength in `[0, 1]`.
    pub magnitude: f64,
    /// Narrative threads touched when the chain manifests.
    pub affected_thread_ids: BTreeSet<ThreadId>,
    /// Actors whose relationships shift when the chain manifests.
    #[serde(default)]
    pub affected_actor_ids: BTreeSet<ActorId>,
    /// Declared relationship shift before scaling by magnitude.
    #[serde(default)]
    pub relationship_delta: i32,
    /// The chain this one branched from, if any.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Inactive chains have manifested and are archival.
    pub is_active: bool,
    /// Turn the chain was scheduled on.
    #[serde(default)]
    pub created_at_turn: TurnId,
    /// Turn on (or after) which the chain matures.
    pub manifest_at_turn: TurnId,
}

impl ConsequenceChain {
    /// Returns `true` if the chain is active and scheduled at or before `turn`.
    #[must_use]
    pub fn is_due(&self, turn: TurnId) -> bool {
        self.is_active && self.manifest_at_turn <= turn
    }
}

/// A relationship shift emitted by the Consequence Engine and consumed by
/// the Relationship Engine in the same turn. Coupling between the two runs in
/// this direction only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEvent {
    /// The actor whose relationships shift.
    pub actor_id: ActorId,
    /// Positive for goodwill, negative for hostility.
    pub delta: i32,
    /// What caused the shift.
    pub reason: String,
}

/// The social shape of a relationship web.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicsType {
    /// Members cooperate toward a shared aim.
    Alliance,
    /// Members compete.
    Rivalry,
    /// Two or three members bound by competing affection.
    LoveTriangle,
    /// One member guides the others.
    Mentorship,
}

/// A named group of actors with aggregate cohesion and conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipWeb {
    /// Web identifier.
    pub id: Uuid,
    /// Display name of the group.
    pub group_name: String,
    /// Members (2 to 6), the player optionally among them.
    pub member_ids: BTreeSet<ActorId>,
    /// Social shape of the group.
    pub dynamics_type: DynamicsType,
    /// Cohesion in `[0, 100]`.
    pub cohesion_level: i32,
    /// Conflict in `[0, 100]`.
    pub conflict_level: i32,
    /// Terminal flag; resolved webs are kept for causal history.
    #[serde(default)]
    pub is_resolved: bool,
}

/// The kind of romantic tension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensionType {
    /// One-sided affection.
    Unrequited,
    /// Competing affection among three (or two plus the player).
    LoveTriangle,
    /// Rivals drawn to each other.
    RivalryRomance,
}

/// A tracked emotional conflict among two or three actors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomanticTension {
    /// Tension identifier.
    pub id: Uuid,
    /// Kind of tension.
    pub tension_type: TensionType,
    /// Actors involved (2 to 3).
    pub involved_actor_ids: BTreeSet<ActorId>,
    /// Whether the player is drawn into the tension.
    pub player_involved: bool,
    /// Tension in `[0, 100]`.
    pub tension_level: i32,
    /// Triggering descriptions, oldest first.
    pub complications: Vec<String>,
    /// Terminal flag; resolved tensions are never removed.
    #[serde(default)]
    pub is_resolved: bool,
}

impl RomanticTension {
    /// Returns `true` if `actor_id` is involved in this tension.
    #[must_use]
    pub fn involves(&self, actor_id: ActorId) -> bool {
        self.involved_actor_ids.contains(&actor_id)
    }
}

/// How much the protagonist understands about the loop. Ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtagonistAwareness {
    /// No idea anything repeats.
    Unaware,
    /// Déjà vu.
    Suspecting,
    /// Knows the loop exists.
    Aware,
    /// Can steer the loop.
    Mastered,
}

impl ProtagonistAwareness {
    /// Zero-based position in the escalation order.
    #[must_use]
    pub fn rank(self) -> usize {
        match self {
            Self::Unaware => 0,
            Self::Suspecting => 1,
            Self::Aware => 2,
            Self::Mastered => 3,
        }
    }

    /// The next awareness step, saturating at `Mastered`.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Unaware => Self::Suspecting,
            Self::Suspecting => Self::Aware,
            Self::Aware | Self::Mastered => Self::Mastered,
        }
    }
}

/// Loop state; absent from the World Model until loop mechanics activate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalState {
    /// Monotonic iteration counter, starting at 0.
    pub current_iteration: u32,
    /// Completed rollbacks.
    pub total_loops: u32,
    /// Never decreases.
    pub protagonist_awareness: ProtagonistAwareness,
    /// Stability in `[0, 100]`; only restoration events raise it.
    pub temporal_stability_level: i32,
    /// Whether the loop is armed.
    pub loop_mechanics_active: bool,
    /// The event that armed the loop.
    #[serde(default)]
    pub activation_trigger: String,
}

/// Category of a retained memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// Something that happened.
    Event,
    /// Something learned about another actor.
    Relationship,
    /// A discovered secret.
    Revelation,
    /// The memory of a rollback itself.
    LoopEcho,
}

/// A memory that may survive a rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Category.
    pub memory_type: MemoryType,
    /// What is remembered.
    pub content: String,
    /// Retention in `[0, 100]`.
    pub retention_strength: i32,
    /// Turn the memory was formed on.
    pub turn_id: TurnId,
}

/// Kind of lasting psychological scarring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    /// Wounds from repeated loss.
    Trauma,
    /// Resolve to break the loop.
    Determination,
    /// Distrust of a world that repeats.
    Paranoia,
    /// Clinging to those remembered across loops.
    Attachment,
}

/// Accumulated psychological effect; exempt from rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsychologicalEffect {
    /// Effect identifier.
    pub id: Uuid,
    /// Kind of effect.
    pub effect_type: EffectType,
    /// Intensity in `[0, 100]`.
    pub intensity: i32,
    /// How the effect has shown itself, oldest first.
    pub manifestations: Vec<String>,
}

/// The reset-scope portion of a World Model, captured for later rollback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopCheckpoint {
    /// Turn the snapshot was taken on; play resumes here after a rollback.
    pub captured_at_turn: TurnId,
    /// Chains at capture time.
    pub consequence_chains: Vec<ConsequenceChain>,
    /// Webs at capture time.
    pub relationship_webs: Vec<RelationshipWeb>,
    /// Tensions at capture time.
    pub romantic_tensions: Vec<RomanticTension>,
}

impl LoopCheckpoint {
    /// Snapshots the reset-scope fields of `world`.
    #[must_use]
    pub fn capture(world: &WorldModel, turn: TurnId) -> Self {
        Self {
            captured_at_turn: turn,
            consequence_chains: world.consequence_chains.clone(),
            relationship_webs: world.relationship_webs.clone(),
            romantic_tensions: world.romantic_tensions.clone(),
        }
    }

    /// Replaces the reset-scope fields of `world` with this snapshot. Temporal
    /// state, memories, psychological effects and the checkpoint itself are
    /// left untouched.
    pub fn restore_into(self, world: &mut WorldModel) {
        world.consequence_chains = self.consequence_chains;
        world.relationship_webs = self.relationship_webs;
        world.romantic_tensions = self.romantic_tensions;
    }
}

/// The aggregate root shared by every engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldModel {
    /// The player's actor id, a valid member and tension reference without
    /// being in the NPC roster.
    pub player_id: Option<ActorId>,
    /// All chains, active and archived.
    pub consequence_chains: Vec<ConsequenceChain>,
    /// All webs, resolved ones included.
    pub relationship_webs: Vec<RelationshipWeb>,
    /// All tensions, resolved ones included.
    pub romantic_tensions: Vec<RomanticTension>,
    /// Loop state, once activated.
    pub temporal_state: Option<TemporalState>,
    /// Memories eligible to survive rollback.
    pub retained_memories: Vec<MemoryEntry>,
    /// Scarring that survives every rollback.
    pub psychological_effects: Vec<PsychologicalEffect>,
    /// The snapshot a rollback returns to.
    pub loop_checkpoint: Option<LoopCheckpoint>,
}

impl WorldModel {
    /// Creates an empty world for the given player.
    #[must_use]
    pub fn new(player_id: Option<ActorId>) -> Self {
        Self {
            player_id,
            ..Self::default()
        }
    }

    /// Returns `true` once loop mechanics have been armed.
    #[must_use]
    pub fn loop_mechanics_active(&self) -> bool {
        self.temporal_state
            .as_ref()
            .is_some_and(|state| state.loop_mechanics_active)
    }

    /// Active chains, in storage order.
    pub fn active_chains(&self) -> impl Iterator<Item = &ConsequenceChain> {
        self.consequence_chains.iter().filter(|c| c.is_active)
    }

    /// Looks up a tension by id.
    #[must_use]
    pub fn tension(&self, id: Uuid) -> Option<&RomanticTension> {
        self.romantic_tensions.iter().find(|t| t.id == id)
    }

    /// Looks up a web by id.
    #[must_use]
    pub fn web(&self, id: Uuid) -> Option<&RelationshipWeb> {
        self.relationship_webs.iter().find(|w| w.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(manifest_at_turn: TurnId, is_active: bool) -> ConsequenceChain {
        ConsequenceChain {
            id: Uuid::new_v4(),
            origin_description: "spared the smuggler".to_owned(),
            chain_level: 0,
            magnitude: 0.5,
            affected_thread_ids: BTreeSet::new(),
            affected_actor_ids: BTreeSet::new(),
            relationship_delta: 0,
            parent_id: None,
            is_active,
            created_at_turn: 0,
            manifest_at_turn,
        }
    }

    fn memory(strength: i32) -> MemoryEntry {
        MemoryEntry {
            memory_type: MemoryType::Event,
            content: "the bell tolled twice".to_owned(),
            retention_strength: strength,
            turn_id: 4,
        }
    }

    #[test]
    fn test_clamp_level_bounds() {
        assert_eq!(clamp_level(-5), 0);
        assert_eq!(clamp_level(42), 42);
        assert_eq!(clamp_level(140), 100);
    }

    #[test]
    fn test_chain_is_due_only_when_active_and_scheduled() {
        assert!(chain(3, true).is_due(3));
        assert!(chain(3, true).is_due(5));
        assert!(!chain(3, true).is_due(2));
        assert!(!chain(3, false).is_due(3));
    }

    #[test]
    fn test_awareness_is_ordered_and_saturates() {
        assert!(ProtagonistAwareness::Unaware < ProtagonistAwareness::Suspecting);
        assert!(ProtagonistAwareness::Aware < ProtagonistAwareness::Mastered);
        assert_eq!(
            ProtagonistAwareness::Mastered.next(),
            ProtagonistAwareness::Mastered
        );
        assert_eq!(ProtagonistAwareness::Suspecting.rank(), 1);
    }

    #[test]
    fn test_restore_replaces_reset_scope_and_keeps_persistent_fields() {
        let mut world = WorldModel::new(Some(Uuid::new_v4()));
        world.consequence_chains.push(chain(2, true));
        let checkpoint = LoopCheckpoint::capture(&world, 1);

        world.consequence_chains.push(chain(9, true));
        world.retained_memories.push(memory(80));
        world.psychological_effects.push(PsychologicalEffect {
            id: Uuid::new_v4(),
            effect_type: EffectType::Trauma,
            intensity: 10,
            manifestations: vec!["flinches at bells".to_owned()],
        });

        checkpoint.clone().restore_into(&mut world);

        assert_eq!(world.consequence_chains, checkpoint.consequence_chains);
        assert_eq!(world.retained_memories.len(), 1);
        assert_eq!(world.psychological_effects.len(), 1);
    }

    #[test]
    fn test_world_model_deserializes_with_missing_fields() {
        let world: WorldModel = serde_json::from_str("{}").unwrap();
        assert!(world.temporal_state.is_none());
        assert!(!world.loop_mechanics_active());
    }
}
