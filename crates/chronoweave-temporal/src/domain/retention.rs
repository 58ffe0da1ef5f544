//! Pure rollback rules: memory selection, awareness escalation,
//! psychological scarring and checkpoint application.
//!
//! Nothing here touches the generator or the journal, so every step of a
//! rollback can be tested in isolation.

use chronoweave_core::world::{
    EffectType, LoopCheckpoint, MemoryEntry, MemoryType, ProtagonistAwareness, WorldModel,
    clamp_level,
};

/// Memories left after a rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySelection {
    /// Survivors, in their original order, already decayed.
    pub kept: Vec<MemoryEntry>,
    /// How many memories were lost.
    pub discarded: usize,
}

/// Keeps every memory strictly stronger than `threshold` and decays the
/// survivors by `decay`, saturating at zero.
#[must_use]
pub fn select_memories(memories: Vec<MemoryEntry>, threshold: i32, decay: i32) -> MemorySelection {
    let total = memories.len();
    let kept: Vec<MemoryEntry> = memories
        .into_iter()
        .filter(|m| m.retention_strength > threshold)
        .map(|mut m| {
            m.retention_strength = clamp_level(m.retention_strength.saturating_sub(decay.max(0)));
            m
        })
        .collect();
    MemorySelection {
        discarded: total - kept.len(),
        kept,
    }
}

/// Awareness after the loop that brought the count to `total_loops`.
///
/// The target rank is the number of thresholds already reached; awareness
/// moves at most one step toward it and never regresses.
#[must_use]
pub fn advance_awareness(
    current: ProtagonistAwareness,
    total_loops: u32,
    thresholds: &[u32],
) -> ProtagonistAwareness {
    let reached = thresholds.iter().filter(|&&t| total_loops >= t).count();
    if reached > current.rank() {
        current.next()
    } else {
        current
    }
}

/// Which scar a rollback leaves.
///
/// A strong surviving relationship memory turns the loop into attachment;
/// otherwise the kind of scar follows how much the protagonist understands.
#[must_use]
pub fn effect_type_for(
    awareness: ProtagonistAwareness,
    retained: &[MemoryEntry],
    attachment_memory_strength: i32,
) -> EffectType {
    let attached = retained.iter().any(|m| {
        m.memory_type == MemoryType::Relationship
            && m.retention_strength >= attachment_memory_strength
    });
    if attached {
        return EffectType::Attachment;
    }
    match awareness {
        ProtagonistAwareness::Unaware => EffectType::Trauma,
        ProtagonistAwareness::Suspecting => EffectType::Paranoia,
        ProtagonistAwareness::Aware | ProtagonistAwareness::Mastered => EffectType::Determination,
    }
}

/// Intensity a rollback adds: proportional to the cumulative loop count.
#[must_use]
pub fn intensity_gain(total_loops: u32, intensity_per_loop: i32) -> i32 {
    let loops = i32::try_from(total_loops).unwrap_or(i32::MAX);
    clamp_level(intensity_per_loop.saturating_mul(loops))
}

/// Replaces the reset-scope fields of `world` with the checkpoint, keeping
/// temporal state, memories and psychological effects.
#[must_use]
pub fn apply_checkpoint(mut world: WorldModel, checkpoint: LoopCheckpoint) -> WorldModel {
    checkpoint.restore_into(&mut world);
    world
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chronoweave_core::world::{ConsequenceChain, PsychologicalEffect};
    use uuid::Uuid;

    use super::*;

    fn memory(memory_type: MemoryType, strength: i32) -> MemoryEntry {
        MemoryEntry {
            memory_type,
            content: "the ferryman's warning".to_owned(),
            retention_strength: strength,
            turn_id: 3,
        }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let selection = select_memories(
            vec![
                memory(MemoryType::Event, 30),
                memory(MemoryType::Event, 31),
            ],
            30,
            15,
        );
        assert_eq!(selection.kept.len(), 1);
        assert_eq!(selection.kept[0].retention_strength, 16);
        assert_eq!(selection.discarded, 1);
    }

    #[test]
    fn test_decay_saturates_at_zero() {
        let selection = select_memories(vec![memory(MemoryType::Revelation, 12)], 10, 40);
        assert_eq!(selection.kept[0].retention_strength, 0);
    }

    #[test]
    fn test_strong_memory_survives_three_rollbacks() {
        let mut memories = vec![memory(MemoryType::Event, 100)];
        for _ in 0..3 {
            let selection = select_memories(memories, 30, 20);
            assert_eq!(selection.kept.len(), 1);
            memories = selection.kept;
        }
        assert_eq!(memories[0].retention_strength, 40);
    }

    #[test]
    fn test_weak_memory_is_lost_on_first_rollback() {
        let selection = select_memories(vec![memory(MemoryType::Event, 5)], 30, 10);
        assert!(selection.kept.is_empty());
        assert_eq!(selection.discarded, 1);
    }

    #[test]
    fn test_awareness_follows_thresholds() {
        let thresholds = [2, 4, 7];
        let mut awareness = ProtagonistAwareness::Unaware;
        let mut seen = Vec::new();
        for total_loops in 1..=8 {
            awareness = advance_awareness(awareness, total_loops, &thresholds);
            seen.push(awareness);
        }
        assert_eq!(seen[0], ProtagonistAwareness::Unaware);
        assert_eq!(seen[1], ProtagonistAwareness::Suspecting);
        assert_eq!(seen[3], ProtagonistAwareness::Aware);
        assert_eq!(seen[6], ProtagonistAwareness::Mastered);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_awareness_moves_one_step_at_a_time() {
        let awareness = advance_awareness(ProtagonistAwareness::Unaware, 9, &[2, 4, 7]);
        assert_eq!(awareness, ProtagonistAwareness::Suspecting);
    }

    #[test]
    fn test_awareness_never_regresses() {
        let awareness = advance_awareness(ProtagonistAwareness::Aware, 1, &[2, 4, 7]);
        assert_eq!(awareness, ProtagonistAwareness::Aware);
    }

    #[test]
    fn test_effect_type_by_awareness() {
        assert_eq!(
            effect_type_for(ProtagonistAwareness::Unaware, &[], 50),
            EffectType::Trauma
        );
        assert_eq!(
            effect_type_for(ProtagonistAwareness::Suspecting, &[], 50),
            EffectType::Paranoia
        );
        assert_eq!(
            effect_type_for(ProtagonistAwareness::Mastered, &[], 50),
            EffectType::Determination
        );
    }

    #[test]
    fn test_strong_relationship_memory_means_attachment() {
        let retained = [
            memory(MemoryType::Relationship, 50),
            memory(MemoryType::Event, 90),
        ];
        assert_eq!(
            effect_type_for(ProtagonistAwareness::Unaware, &retained, 50),
            EffectType::Attachment
        );
        let faded = [memory(MemoryType::Relationship, 49)];
        assert_eq!(
            effect_type_for(ProtagonistAwareness::Unaware, &faded, 50),
            EffectType::Trauma
        );
    }

    #[test]
    fn test_intensity_gain_is_proportional_and_clamped() {
        assert_eq!(intensity_gain(1, 5), 5);
        assert_eq!(intensity_gain(4, 5), 20);
        assert_eq!(intensity_gain(u32::MAX, 5), 100);
    }

    #[test]
    fn test_apply_checkpoint_replaces_only_reset_scope() {
        let mut world = WorldModel::new(Some(Uuid::new_v4()));
        let checkpoint = LoopCheckpoint::capture(&world, 2);
        world.consequence_chains.push(ConsequenceChain {
            id: Uuid::new_v4(),
            origin_description: "burned the bridge".to_owned(),
            chain_level: 0,
            magnitude: 0.4,
            affected_thread_ids: BTreeSet::new(),
            affected_actor_ids: BTreeSet::new(),
            relationship_delta: 0,
            parent_id: None,
            is_active: true,
            created_at_turn: 3,
            manifest_at_turn: 5,
        });
        world.retained_memories.push(memory(MemoryType::LoopEcho, 60));
        world.psychological_effects.push(PsychologicalEffect {
            id: Uuid::new_v4(),
            effect_type: EffectType::Trauma,
            intensity: 5,
            manifestations: Vec::new(),
        });

        let restored = apply_checkpoint(world.clone(), checkpoint);

        assert!(restored.consequence_chains.is_empty());
        assert_eq!(restored.retained_memories, world.retained_memories);
        assert_eq!(restored.psychological_effects, world.psychological_effects);
        assert_eq!(restored.player_id, world.player_id);
    }
}
