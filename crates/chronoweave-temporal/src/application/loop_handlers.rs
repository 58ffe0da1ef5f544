//! Loop lifecycle handlers.
//!
//! `initialize_loop` arms loop mechanics once per session. `trigger_loop`
//! performs a rollback: it advances the counters, filters memories,
//! escalates awareness, spends stability, scars the protagonist and finally
//! re-applies the checkpoint the caller hands in. The engine never captures
//! or stores checkpoints itself.

use std::time::Duration;

use chronoweave_core::config::TemporalConfig;
use chronoweave_core::error::HardError;
use chronoweave_core::event::{TurnEventKind, TurnJournal};
use chronoweave_core::generation::{
    ContentGenerator, Generated, PSYCHOLOGICAL_MANIFESTATION, generate_text_or_fallback,
};
use chronoweave_core::world::{
    EffectType, LoopCheckpoint, MemoryEntry, MemoryType, ProtagonistAwareness,
    PsychologicalEffect, TemporalState, TurnId, WorldModel, LEVEL_MAX, clamp_level,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::phase::{TemporalPhase, phase};
use crate::domain::retention::{
    advance_awareness, apply_checkpoint, effect_type_for, intensity_gain, select_memories,
};

/// What a rollback did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Iteration after the rollback.
    pub iteration: u32,
    /// Completed rollbacks, this one included.
    pub total_loops: u32,
    /// Awareness after the rollback.
    pub awareness: ProtagonistAwareness,
    /// Stability after the rollback.
    pub stability: i32,
    /// Memories that survived.
    pub memories_kept: usize,
    /// Memories that were lost.
    pub memories_discarded: usize,
    /// The effect that was created or deepened.
    pub effect_id: Uuid,
    /// Its type.
    pub effect_type: EffectType,
    /// How the effect showed itself this loop.
    pub manifestation: Generated,
    /// Turn play resumes on, if a checkpoint was applied.
    pub resume_turn: Option<TurnId>,
}

impl LoopOutcome {
    /// Returns `true` if reset-scope state was rolled back.
    #[must_use]
    pub fn checkpoint_applied(&self) -> bool {
        self.resume_turn.is_some()
    }
}

/// Arms loop mechanics. Stability starts full.
///
/// A state that exists but was disarmed keeps its counters and awareness.
///
/// # Errors
///
/// Returns `HardError::AlreadyActive` if loop mechanics are already armed.
/// The world is unchanged on error.
pub fn initialize_loop(
    trigger_event: &str,
    world: &mut WorldModel,
    journal: &mut TurnJournal,
) -> Result<TemporalState, HardError> {
    if phase(world) != TemporalPhase::Dormant {
        return Err(HardError::AlreadyActive);
    }

    let state = world.temporal_state.get_or_insert_with(|| TemporalState {
        current_iteration: 0,
        total_loops: 0,
        protagonist_awareness: ProtagonistAwareness::Unaware,
        temporal_stability_level: LEVEL_MAX,
        loop_mechanics_active: false,
        activation_trigger: String::new(),
    });
    state.loop_mechanics_active = true;
    trigger_event.clone_into(&mut state.activation_trigger);

    info!(trigger = trigger_event, "loop mechanics armed");
    journal.record(TurnEventKind::LoopInitialized {
        trigger: trigger_event.to_owned(),
    });
    Ok(state.clone())
}

/// Rolls the world back.
///
/// Effects apply in a fixed order: counters, memory selection plus a
/// loop-echo memory, awareness, stability, the psychological effect, and
/// last the checkpoint. With `preserve_memories` false every memory is
/// lost. Without a checkpoint the reset-scope state is left as it is and
/// `resume_turn` is `None`.
///
/// # Errors
///
/// Returns `HardError::LoopNotActive` if loop mechanics are dormant. The
/// world is unchanged on error.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(world, checkpoint, generator, config, journal))]
pub async fn trigger_loop(
    reason: &str,
    world: &mut WorldModel,
    checkpoint: Option<LoopCheckpoint>,
    preserve_memories: bool,
    generator: &dyn ContentGenerator,
    config: &TemporalConfig,
    timeout: Duration,
    journal: &mut TurnJournal,
) -> Result<LoopOutcome, HardError> {
    let Some(mut state) = world
        .temporal_state
        .clone()
        .filter(|s| s.loop_mechanics_active)
    else {
        return Err(HardError::LoopNotActive);
    };
    debug!(phase = ?TemporalPhase::Looping, "rollback started");

    state.total_loops = state.total_loops.saturating_add(1);
    state.current_iteration = state.current_iteration.saturating_add(1);

    let memories = if preserve_memories {
        world.retained_memories.clone()
    } else {
        Vec::new()
    };
    let discarded_up_front = world.retained_memories.len() - memories.len();
    let selection = select_memories(memories, config.retention_threshold, config.retention_decay);
    let memories_kept = selection.kept.len();
    let memories_discarded = selection.discarded + discarded_up_front;
    let mut retained = selection.kept;
    retained.push(MemoryEntry {
        memory_type: MemoryType::LoopEcho,
        content: reason.to_owned(),
        retention_strength: clamp_level(config.loop_echo_strength),
        turn_id: journal.turn_id(),
    });

    state.protagonist_awareness = advance_awareness(
        state.protagonist_awareness,
        state.total_loops,
        &config.awareness_thresholds,
    );
    state.temporal_stability_level = clamp_level(
        state
            .temporal_stability_level
            .saturating_sub(config.stability_cost.max(0)),
    );

    let effect_type = effect_type_for(
        state.protagonist_awareness,
        &retained,
        config.attachment_memory_strength,
    );
    let gain = intensity_gain(state.total_loops, config.intensity_per_loop);
    let context = format!(
        "The protagonist relives the loop.\nreason: {reason}\nloop: {}\nawareness: {:?}\nstability: {}\neffect: {effect_type:?}\nremembered: {}",
        state.total_loops,
        state.protagonist_awareness,
        state.temporal_stability_level,
        retained
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    );
    let fallback = fallback_manifestation(effect_type, state.total_loops, reason);
    let manifestation = generate_text_or_fallback(
        generator,
        &context,
        &PSYCHOLOGICAL_MANIFESTATION,
        timeout,
        fallback,
    )
    .await;

    let effect_id = match world
        .psychological_effects
        .iter_mut()
        .find(|e| e.effect_type == effect_type)
    {
        Some(effect) => {
            effect.intensity = clamp_level(effect.intensity.saturating_add(gain));
            effect.manifestations.push(manifestation.text.clone());
            effect.id
        }
        None => {
            let effect = PsychologicalEffect {
                id: Uuid::new_v4(),
                effect_type,
                intensity: gain,
                manifestations: vec![manifestation.text.clone()],
            };
            let id = effect.id;
            world.psychological_effects.push(effect);
            id
        }
    };

    world.retained_memories = retained;
    let outcome = LoopOutcome {
        iteration: state.current_iteration,
        total_loops: state.total_loops,
        awareness: state.protagonist_awareness,
        stability: state.temporal_stability_level,
        memories_kept,
        memories_discarded,
        effect_id,
        effect_type,
        manifestation,
        resume_turn: checkpoint.as_ref().map(|c| c.captured_at_turn),
    };
    world.temporal_state = Some(state);
    if let Some(checkpoint) = checkpoint {
        *world = apply_checkpoint(std::mem::take(world), checkpoint);
    }

    info!(
        total_loops = outcome.total_loops,
        awareness = ?outcome.awareness,
        stability = outcome.stability,
        memories_kept,
        memories_discarded,
        "loop triggered"
    );
    journal.record(TurnEventKind::LoopTriggered {
        reason: reason.to_owned(),
        iteration: outcome.iteration,
        awareness: outcome.awareness,
        memories_kept,
        memories_discarded,
    });
    Ok(outcome)
}

fn fallback_manifestation(effect_type: EffectType, total_loops: u32, reason: &str) -> String {
    let feeling = match effect_type {
        EffectType::Trauma => "an old wound reopens",
        EffectType::Determination => "resolve hardens",
        EffectType::Paranoia => "every face looks rehearsed",
        EffectType::Attachment => "a familiar face is impossible to let go",
    };
    format!("Loop {total_loops}: {feeling} ({reason}).")
}

/// Raises temporal stability by `amount`, clamped. This is the only way
/// stability ever rises; a negative amount restores nothing.
///
/// # Errors
///
/// Returns `HardError::LoopNotActive` if loop mechanics are dormant.
pub fn restore_stability(
    amount: i32,
    world: &mut WorldModel,
    journal: &mut TurnJournal,
) -> Result<i32, HardError> {
    let state = world
        .temporal_state
        .as_mut()
        .filter(|s| s.loop_mechanics_active)
        .ok_or(HardError::LoopNotActive)?;
    state.temporal_stability_level =
        clamp_level(state.temporal_stability_level.saturating_add(amount.max(0)));

    let stability = state.temporal_stability_level;
    info!(stability, "temporal stability restored");
    journal.record(TurnEventKind::StabilityRestored { stability });
    Ok(stability)
}

/// Records a memory that may survive the next rollback. Strength is
/// clamped into range.
pub fn record_memory(
    memory_type: MemoryType,
    content: &str,
    retention_strength: i32,
    world: &mut WorldModel,
    journal: &mut TurnJournal,
) -> MemoryEntry {
    let entry = MemoryEntry {
        memory_type,
        content: content.to_owned(),
        retention_strength: clamp_level(retention_strength),
        turn_id: journal.turn_id(),
    };
    debug!(?memory_type, retention_strength = entry.retention_strength, "memory recorded");
    journal.record(TurnEventKind::MemoryRecorded { memory_type });
    world.retained_memories.push(entry.clone());
    entry
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chronoweave_core::world::{ConsequenceChain, RelationshipWeb, DynamicsType};
    use chronoweave_test_support::{FailingGenerator, ScriptedGenerator, fixed_clock};

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn journal() -> TurnJournal {
        TurnJournal::new(6, Uuid::new_v4(), &fixed_clock())
    }

    fn armed_world() -> WorldModel {
        let mut world = WorldModel::new(Some(Uuid::new_v4()));
        initialize_loop("the clock tower struck thirteen", &mut world, &mut journal()).unwrap();
        world
    }

    async fn rollback(world: &mut WorldModel, config: &TemporalConfig) -> LoopOutcome {
        trigger_loop(
            "the protagonist drowned",
            world,
            None,
            true,
            &FailingGenerator::default(),
            config,
            TIMEOUT,
            &mut journal(),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_initialize_arms_loop_with_full_stability() {
        let mut world = WorldModel::default();
        let mut journal = journal();

        let state = initialize_loop("the clock tower", &mut world, &mut journal).unwrap();

        assert!(state.loop_mechanics_active);
        assert!(world.loop_mechanics_active());
        assert_eq!(state.temporal_stability_level, 100);
        assert_eq!(state.current_iteration, 0);
        assert_eq!(state.activation_trigger, "the clock tower");
        assert_eq!(journal.events().len(), 1);
    }

    #[test]
    fn test_initialize_twice_fails_and_leaves_state_unchanged() {
        let mut world = armed_world();
        let before = world.clone();

        let result = initialize_loop("a second bell", &mut world, &mut journal());

        assert_eq!(result, Err(HardError::AlreadyActive));
        assert_eq!(world, before);
    }

    #[tokio::test]
    async fn test_trigger_on_dormant_world_fails() {
        let mut world = WorldModel::default();

        let result = trigger_loop(
            "too soon",
            &mut world,
            None,
            true,
            &ScriptedGenerator::new(),
            &TemporalConfig::default(),
            TIMEOUT,
            &mut journal(),
        )
        .await;

        assert_eq!(result, Err(HardError::LoopNotActive));
        assert_eq!(world, WorldModel::default());
    }

    #[tokio::test]
    async fn test_loops_are_monotonic() {
        let mut world = armed_world();
        let config = TemporalConfig::default();
        let mut previous = world.temporal_state.clone().unwrap();

        for _ in 0..8 {
            rollback(&mut world, &config).await;
            let state = world.temporal_state.clone().unwrap();
            assert_eq!(state.total_loops, previous.total_loops + 1);
            assert_eq!(state.current_iteration, previous.current_iteration + 1);
            assert!(state.protagonist_awareness >= previous.protagonist_awareness);
            assert!(state.temporal_stability_level <= previous.temporal_stability_level);
            previous = state;
        }
        assert_eq!(previous.protagonist_awareness, ProtagonistAwareness::Mastered);
        assert_eq!(previous.temporal_stability_level, 20);
    }

    #[tokio::test]
    async fn test_strong_memory_survives_three_loops() {
        let mut world = armed_world();
        record_memory(MemoryType::Revelation, "the mayor is the thief", 100, &mut world, &mut journal());
        let config = TemporalConfig {
            retention_decay: 20,
            ..TemporalConfig::default()
        };

        for _ in 0..3 {
            rollback(&mut world, &config).await;
        }

        let revelation = world
            .retained_memories
            .iter()
            .find(|m| m.memory_type == MemoryType::Revelation)
            .unwrap();
        assert_eq!(revelation.retention_strength, 40);
    }

    #[tokio::test]
    async fn test_weak_memory_is_discarded_after_one_loop() {
        let mut world = armed_world();
        record_memory(MemoryType::Event, "a stranger's cough", 5, &mut world, &mut journal());
        let config = TemporalConfig {
            retention_decay: 10,
            ..TemporalConfig::default()
        };

        let outcome = rollback(&mut world, &config).await;

        assert_eq!(outcome.memories_kept, 0);
        assert_eq!(outcome.memories_discarded, 1);
        assert_eq!(world.retained_memories.len(), 1);
        assert_eq!(world.retained_memories[0].memory_type, MemoryType::LoopEcho);
        assert_eq!(world.retained_memories[0].content, "the protagonist drowned");
        assert_eq!(world.retained_memories[0].retention_strength, 60);
    }

    #[tokio::test]
    async fn test_not_preserving_memories_discards_all() {
        let mut world = armed_world();
        record_memory(MemoryType::Event, "the lighthouse keeper's name", 95, &mut world, &mut journal());

        let outcome = trigger_loop(
            "reset by choice",
            &mut world,
            None,
            false,
            &FailingGenerator::default(),
            &TemporalConfig::default(),
            TIMEOUT,
            &mut journal(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.memories_kept, 0);
        assert_eq!(outcome.memories_discarded, 1);
        assert!(
            world
                .retained_memories
                .iter()
                .all(|m| m.memory_type == MemoryType::LoopEcho)
        );
    }

    #[tokio::test]
    async fn test_effect_accumulates_across_loops() {
        let mut world = armed_world();
        let config = TemporalConfig::default();

        let first = rollback(&mut world, &config).await;
        assert_eq!(first.effect_type, EffectType::Trauma);
        assert!(first.manifestation.fell_back());
        assert_eq!(world.psychological_effects[0].intensity, 5);

        // awareness reaches suspecting on loop two, so paranoia begins
        let second = rollback(&mut world, &config).await;
        assert_eq!(second.effect_type, EffectType::Paranoia);
        assert_eq!(world.psychological_effects.len(), 2);

        let third = rollback(&mut world, &config).await;
        assert_eq!(third.effect_id, second.effect_id);
        let paranoia = world
            .psychological_effects
            .iter()
            .find(|e| e.effect_type == EffectType::Paranoia)
            .unwrap();
        assert_eq!(paranoia.intensity, 10 + 15);
        assert_eq!(paranoia.manifestations.len(), 2);
    }

    #[tokio::test]
    async fn test_manifestation_comes_from_generator() {
        let mut world = armed_world();
        let generator = ScriptedGenerator::new()
            .respond(&PSYCHOLOGICAL_MANIFESTATION, "Her hands shake at the sound of water.");

        let outcome = trigger_loop(
            "the protagonist drowned",
            &mut world,
            None,
            true,
            &generator,
            &TemporalConfig::default(),
            TIMEOUT,
            &mut journal(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.manifestation.text, "Her hands shake at the sound of water.");
        assert_eq!(
            world.psychological_effects[0].manifestations,
            vec!["Her hands shake at the sound of water.".to_owned()]
        );
        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.contains("the protagonist drowned"));
    }

    #[tokio::test]
    async fn test_checkpoint_resets_chains_and_webs_but_not_effects() {
        let mut world = armed_world();
        let checkpoint = LoopCheckpoint::capture(&world, 2);
        world.consequence_chains.push(ConsequenceChain {
            id: Uuid::new_v4(),
            origin_description: "opened the sealed door".to_owned(),
            chain_level: 0,
            magnitude: 0.9,
            affected_thread_ids: BTreeSet::new(),
            affected_actor_ids: BTreeSet::new(),
            relationship_delta: 0,
            parent_id: None,
            is_active: true,
            created_at_turn: 5,
            manifest_at_turn: 7,
        });
        world.relationship_webs.push(RelationshipWeb {
            id: Uuid::new_v4(),
            group_name: "the drowned choir".to_owned(),
            member_ids: (0..3).map(|_| Uuid::new_v4()).collect(),
            dynamics_type: DynamicsType::Alliance,
            cohesion_level: 60,
            conflict_level: 20,
            is_resolved: false,
        });

        let outcome = trigger_loop(
            "the door opened",
            &mut world,
            Some(checkpoint),
            true,
            &FailingGenerator::default(),
            &TemporalConfig::default(),
            TIMEOUT,
            &mut journal(),
        )
        .await
        .unwrap();

        assert!(outcome.checkpoint_applied());
        assert_eq!(outcome.resume_turn, Some(2));
        assert!(world.consequence_chains.is_empty());
        assert!(world.relationship_webs.is_empty());
        assert_eq!(world.psychological_effects.len(), 1);
        assert_eq!(world.temporal_state.as_ref().unwrap().total_loops, 1);
    }

    #[test]
    fn test_restore_stability_is_clamped_and_requires_active_loop() {
        let mut dormant = WorldModel::default();
        assert_eq!(
            restore_stability(10, &mut dormant, &mut journal()),
            Err(HardError::LoopNotActive)
        );

        let mut world = armed_world();
        world.temporal_state.as_mut().unwrap().temporal_stability_level = 70;
        assert_eq!(restore_stability(50, &mut world, &mut journal()), Ok(100));
        assert_eq!(restore_stability(-30, &mut world, &mut journal()), Ok(100));
    }

    #[test]
    fn test_record_memory_clamps_strength() {
        let mut world = WorldModel::default();
        let entry = record_memory(MemoryType::Relationship, "Tomas kept the promise", 150, &mut world, &mut journal());
        assert_eq!(entry.retention_strength, 100);
        assert_eq!(entry.turn_id, 6);
        assert_eq!(world.retained_memories, vec![entry]);
    }
}
