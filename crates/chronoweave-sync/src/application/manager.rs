//! The Synchronization Manager.
//!
//! One turn runs strictly in this order:
//!
//! 1. Consequence: mature due chains, narrate them, schedule the action's
//!    chain.
//! 2. Relationship: form webs and tensions, fold in the relationship events
//!    from step 1, apply jealousy, resolve what the action resolves.
//! 3. Temporal: arm the loop (capturing the checkpoint), record memories,
//!    restore stability, then ask the loop predicate.
//! 4. Validation.
//!
//! Every step works on a clone of the caller's World Model. A `HardError`
//! at any step discards the clone and hands back the original.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chronoweave_consequence::application::chain_handlers::{
    create_chain, mature_chains, narrate_maturation,
};
use chronoweave_core::clock::Clock;
use chronoweave_core::config::SimulationConfig;
use chronoweave_core::diagnostics::{ErrorReport, Warning};
use chronoweave_core::error::HardError;
use chronoweave_core::event::{TurnEvent, TurnEventKind, TurnJournal};
use chronoweave_core::generation::{ContentGenerator, Generated, OfflineGenerator};
use chronoweave_core::rng::DeterministicRng;
use chronoweave_core::roster::{InMemoryRoster, Roster};
use chronoweave_core::world::{LoopCheckpoint, TurnId, WorldModel};
use chronoweave_relationship::application::tension_handlers::{
    create_tension, resolve_tension, trigger_jealousy,
};
use chronoweave_relationship::application::web_handlers::{
    apply_relationship_events, create_web, resolve_web,
};
use chronoweave_temporal::application::loop_handlers::{
    initialize_loop, record_memory, restore_stability, trigger_loop,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::action::PlayerAction;
use crate::domain::trigger::{LoopTrigger, NeverLoop};
use crate::domain::validation::{Rosters, validate_consistency};

/// Generated prose for the caller to surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeHook {
    /// Output shape the text was requested as.
    pub shape: String,
    /// The text.
    pub text: String,
    /// Whether deterministic fallback text was used.
    pub fell_back: bool,
}

impl From<&Generated> for NarrativeHook {
    fn from(generated: &Generated) -> Self {
        Self {
            shape: generated.shape.to_owned(),
            text: generated.text.clone(),
            fell_back: generated.fell_back(),
        }
    }
}

/// The outcome of a turn or a validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    /// The advanced World Model, or the input unchanged when `errors` is
    /// non-empty.
    pub world: WorldModel,
    /// Recoverable problems.
    pub warnings: Vec<Warning>,
    /// The error that rejected the turn, if any.
    pub errors: Vec<ErrorReport>,
    /// Journal of every state change, in order.
    pub events: Vec<TurnEvent>,
    /// Prose for the caller to surface.
    pub narrative_hooks: Vec<NarrativeHook>,
    /// Turn play resumes on after a loop.
    pub resume_turn: Option<TurnId>,
}

impl SyncResult {
    /// Returns `true` if the turn was rejected.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        !self.errors.is_empty()
    }

    fn rejected(world: WorldModel, err: &HardError) -> Self {
        Self {
            world,
            warnings: Vec::new(),
            errors: vec![ErrorReport::from(err)],
            events: Vec::new(),
            narrative_hooks: Vec::new(),
            resume_turn: None,
        }
    }
}

/// Everything a successful pipeline run produced besides the world.
#[derive(Default)]
struct TurnOutput {
    warnings: Vec<Warning>,
    narrative_hooks: Vec<NarrativeHook>,
    resume_turn: Option<TurnId>,
}

impl TurnOutput {
    fn surface(&mut self, generated: &Generated) {
        self.narrative_hooks.push(NarrativeHook::from(generated));
        if let Some(warning) = generated.warning() {
            self.warnings.push(warning);
        }
    }
}

/// Runs turns through every engine.
pub struct SynchronizationManager {
    config: SimulationConfig,
    generator: Arc<dyn ContentGenerator>,
    npc_roster: Arc<dyn Roster>,
    thread_roster: Arc<dyn Roster>,
    loop_trigger: Arc<dyn LoopTrigger>,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    clock: Arc<dyn Clock>,
}

impl SynchronizationManager {
    /// Creates a manager with an offline generator, empty rosters and a
    /// predicate that never loops.
    #[must_use]
    pub fn new(
        config: SimulationConfig,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            generator: Arc::new(OfflineGenerator),
            npc_roster: Arc::new(InMemoryRoster::new()),
            thread_roster: Arc::new(InMemoryRoster::new()),
            loop_trigger: Arc::new(NeverLoop),
            rng,
            clock,
        }
    }

    /// Sets the content generator.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Sets the NPC and thread rosters references are checked against.
    #[must_use]
    pub fn with_rosters(mut self, npcs: Arc<dyn Roster>, threads: Arc<dyn Roster>) -> Self {
        self.npc_roster = npcs;
        self.thread_roster = threads;
        self
    }

    /// Sets the loop predicate.
    #[must_use]
    pub fn with_loop_trigger(mut self, loop_trigger: Arc<dyn LoopTrigger>) -> Self {
        self.loop_trigger = loop_trigger;
        self
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.config.generation.timeout_ms)
    }

    fn rosters(&self) -> Rosters<'_> {
        Rosters {
            npcs: self.npc_roster.as_ref(),
            threads: self.thread_roster.as_ref(),
        }
    }

    /// Applies `action` to `world` for `current_turn`.
    ///
    /// Never fails: a rejected turn comes back with the input World Model
    /// and one error report.
    #[instrument(skip(self, action, world), fields(turn = current_turn))]
    pub async fn process_turn(
        &self,
        action: &PlayerAction,
        world: WorldModel,
        current_turn: TurnId,
    ) -> SyncResult {
        let mut journal = TurnJournal::new(current_turn, Uuid::new_v4(), self.clock.as_ref());
        let mut working = world.clone();

        match self
            .run_pipeline(action, &mut working, current_turn, &mut journal)
            .await
        {
            Ok(output) => {
                info!(
                    events = journal.events().len(),
                    warnings = output.warnings.len(),
                    looped = output.resume_turn.is_some(),
                    "turn processed"
                );
                SyncResult {
                    world: working,
                    warnings: output.warnings,
                    errors: Vec::new(),
                    events: journal.into_events(),
                    narrative_hooks: output.narrative_hooks,
                    resume_turn: output.resume_turn,
                }
            }
            Err(err) => {
                warn!(code = err.code(), error = %err, "turn rejected");
                SyncResult::rejected(world, &err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        action: &PlayerAction,
        world: &mut WorldModel,
        current_turn: TurnId,
        journal: &mut TurnJournal,
    ) -> Result<TurnOutput, HardError> {
        let mut output = TurnOutput::default();
        let timeout = self.generation_timeout();

        // Consequence
        let report = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            mature_chains(
                current_turn,
                world,
                &mut *rng,
                &self.config.consequence,
                journal,
            )
        };
        for narration in narrate_maturation(
            &report,
            self.thread_roster.as_ref(),
            self.generator.as_ref(),
            timeout,
        )
        .await
        {
            output.surface(&narration);
        }
        if let Some(choice) = &action.choice {
            create_chain(
                &choice.description,
                choice,
                world,
                current_turn,
                &self.config.consequence,
                journal,
            );
        }

        // Relationship
        for request in &action.form_webs {
            create_web(
                &request.group_name,
                request.member_ids.clone(),
                request.dynamics_type,
                world,
                journal,
            )?;
        }
        for request in &action.new_tensions {
            create_tension(
                request.tension_type,
                request.involved_actor_ids.clone(),
                request.player_involved,
                request.initial_level,
                world,
                journal,
            )?;
        }
        apply_relationship_events(&report.relationship_events, world, journal);
        for request in &action.jealousy_triggers {
            let outcome = trigger_jealousy(
                request.jealous_actor_id,
                request.target_actor_id,
                &request.description,
                world,
                self.generator.as_ref(),
                &self.config.relationship,
                timeout,
                journal,
            )
            .await?;
            if let Some(hook) = &outcome.narrative_hook {
                output.surface(hook);
            }
        }
        for &web_id in &action.resolve_webs {
            resolve_web(web_id, world, journal)?;
        }
        for &tension_id in &action.resolve_tensions {
            resolve_tension(tension_id, world, journal)?;
        }

        // Temporal
        if let Some(trigger) = &action.activate_loop {
            initialize_loop(trigger, world, journal)?;
            world.loop_checkpoint = Some(LoopCheckpoint::capture(world, current_turn));
            journal.record(TurnEventKind::CheckpointCaptured {
                turn_id: current_turn,
            });
        }
        for memory in &action.memories {
            record_memory(
                memory.memory_type,
                &memory.content,
                memory.retention_strength,
                world,
                journal,
            );
        }
        if let Some(amount) = action.stability_restoration {
            restore_stability(amount, world, journal)?;
        }
        if let Some(reason) = self.loop_trigger.should_loop(action, world) {
            if world.loop_mechanics_active() {
                let checkpoint = world.loop_checkpoint.clone();
                if checkpoint.is_none() {
                    warn!("loop fired without a checkpoint; keeping current state");
                    output.warnings.push(Warning::MissingCheckpoint);
                }
                let outcome = trigger_loop(
                    &reason,
                    world,
                    checkpoint,
                    action.preserve_memories,
                    self.generator.as_ref(),
                    &self.config.temporal,
                    timeout,
                    journal,
                )
                .await?;
                output.surface(&outcome.manifestation);
                output.resume_turn = outcome.resume_turn;
            } else {
                warn!(%reason, "loop predicate fired while loop mechanics are dormant");
                output.warnings.push(Warning::LoopTriggerIgnored { reason });
            }
        }

        // Validation
        output
            .warnings
            .extend(validate_consistency(world, self.rosters(), self.config.consequence.max_chain_depth)?);
        Ok(output)
    }

    /// Validates and repairs `world` without applying any action.
    ///
    /// # Errors
    ///
    /// Returns `HardError::InvalidComposition` for an impossible love
    /// triangle. The world is unchanged on error.
    pub fn validate_consistency(&self, world: &mut WorldModel) -> Result<Vec<Warning>, HardError> {
        validate_consistency(world, self.rosters(), self.config.consequence.max_chain_depth)
    }

    /// A validation-only pass. Idempotent: a second pass over its output
    /// returns the same World Model and no additional warnings.
    #[must_use]
    pub fn synchronize_all_systems(&self, world: WorldModel) -> SyncResult {
        let mut working = world.clone();
        match self.validate_consistency(&mut working) {
            Ok(warnings) => SyncResult {
                world: working,
                warnings,
                errors: Vec::new(),
                events: Vec::new(),
                narrative_hooks: Vec::new(),
                resume_turn: None,
            },
            Err(err) => {
                warn!(code = err.code(), error = %err, "synchronization rejected");
                SyncResult::rejected(world, &err)
            }
        }
    }
}
