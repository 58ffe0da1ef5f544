//! Chain lifecycle handlers.
//!
//! `create_chain` schedules a root chain, `mature_chains` manifests due
//! chains and branches them, and `narrate_maturation` asks the content
//! generator to describe what manifested. Branching is synchronous and takes
//! the RNG; narration is the only part that awaits.

use std::time::Duration;

use chronoweave_core::config::ConsequenceConfig;
use chronoweave_core::event::{TurnEventKind, TurnJournal};
use chronoweave_core::generation::{
    CHAIN_MANIFESTATION, ContentGenerator, Generated, generate_text_or_fallback,
};
use chronoweave_core::rng::DeterministicRng;
use chronoweave_core::roster::Roster;
use chronoweave_core::world::{ConsequenceChain, RelationshipEvent, TurnId, WorldModel};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::branching::{
    child_magnitude, count_children, delay_for_level, magnitude_for, scaled_delta,
};
use crate::domain::choice::TriggeringChoice;

/// What happened when due chains matured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaturationReport {
    /// Chains that manifested this turn, as they are after deactivation.
    pub matured: Vec<ConsequenceChain>,
    /// Children spawned by those chains.
    pub spawned: Vec<ConsequenceChain>,
    /// Relationship shifts for the Relationship Engine to consume.
    pub relationship_events: Vec<RelationshipEvent>,
}

impl MaturationReport {
    /// Returns `true` if nothing matured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matured.is_empty()
    }
}

/// Schedules a root chain for `choice` and adds it to the world.
///
/// Magnitude is a deterministic function of the choice's risk and moral
/// weight; the chain manifests `delay_for_level(0)` turns after
/// `current_turn`, saturating at `TurnId::MAX`.
pub fn create_chain(
    origin_description: &str,
    choice: &TriggeringChoice,
    world: &mut WorldModel,
    current_turn: TurnId,
    config: &ConsequenceConfig,
    journal: &mut TurnJournal,
) -> ConsequenceChain {
    let magnitude = magnitude_for(choice.risk, choice.moral_weight, config);
    let chain = ConsequenceChain {
        id: Uuid::new_v4(),
        origin_description: origin_description.to_owned(),
        chain_level: 0,
        magnitude,
        affected_thread_ids: choice.affected_thread_ids.clone(),
        affected_actor_ids: choice.affected_actor_ids.clone(),
        relationship_delta: choice.relationship_delta,
        parent_id: None,
        is_active: true,
        created_at_turn: current_turn,
        manifest_at_turn: current_turn.saturating_add(delay_for_level(0, config)),
    };

    info!(
        chain_id = %chain.id,
        magnitude,
        manifest_at_turn = chain.manifest_at_turn,
        "consequence chain scheduled"
    );
    journal.record(TurnEventKind::ChainCreated {
        chain_id: chain.id,
        magnitude,
        manifest_at_turn: chain.manifest_at_turn,
    });

    world.consequence_chains.push(chain.clone());
    chain
}

/// Matures every active chain due at `current_turn`.
///
/// Each due chain is marked inactive and may spawn children one level
/// deeper with decayed magnitude. Chains at the depth cap never branch.
/// Children are added after all due chains are processed, so a child never
/// matures in the call that spawned it.
pub fn mature_chains(
    current_turn: TurnId,
    world: &mut WorldModel,
    rng: &mut dyn DeterministicRng,
    config: &ConsequenceConfig,
    journal: &mut TurnJournal,
) -> MaturationReport {
    let mut report = MaturationReport::default();

    for chain in &mut world.consequence_chains {
        if !chain.is_due(current_turn) {
            continue;
        }
        chain.is_active = false;

        let children = count_children(chain.magnitude, chain.chain_level, config, rng);
        let mut child_ids = Vec::new();
        for _ in 0..children {
            let child = spawn_child(chain, current_turn, config);
            child_ids.push(child.id);
            report.spawned.push(child);
        }

        for actor_id in &chain.affected_actor_ids {
            let delta = scaled_delta(chain.relationship_delta, chain.magnitude);
            if delta != 0 {
                report.relationship_events.push(RelationshipEvent {
                    actor_id: *actor_id,
                    delta,
                    reason: chain.origin_description.clone(),
                });
            }
        }

        debug!(
            chain_id = %chain.id,
            chain_level = chain.chain_level,
            children,
            "consequence chain matured"
        );
        journal.record(TurnEventKind::ChainMatured {
            chain_id: chain.id,
            child_ids,
        });
        report.matured.push(chain.clone());
    }

    if !report.is_empty() {
        info!(
            turn = current_turn,
            matured = report.matured.len(),
            spawned = report.spawned.len(),
            "consequence chains matured"
        );
    }
    world
        .consequence_chains
        .extend(report.spawned.iter().cloned());
    report
}

fn spawn_child(
    parent: &ConsequenceChain,
    current_turn: TurnId,
    config: &ConsequenceConfig,
) -> ConsequenceChain {
    let chain_level = parent.chain_level + 1;
    ConsequenceChain {
        id: Uuid::new_v4(),
        origin_description: parent.origin_description.clone(),
        chain_level,
        magnitude: child_magnitude(parent.magnitude, config),
        affected_thread_ids: parent.affected_thread_ids.clone(),
        affected_actor_ids: parent.affected_actor_ids.clone(),
        relationship_delta: parent.relationship_delta,
        parent_id: Some(parent.id),
        is_active: true,
        created_at_turn: current_turn,
        manifest_at_turn: current_turn.saturating_add(delay_for_level(chain_level, config)),
    }
}

/// Describes each matured chain through the content generator, falling
/// back to a fixed sentence per chain. Affected threads are named by their
/// roster description, or by id when the roster does not know them.
#[instrument(skip_all, fields(matured = report.matured.len()))]
pub async fn narrate_maturation(
    report: &MaturationReport,
    threads: &dyn Roster,
    generator: &dyn ContentGenerator,
    timeout: Duration,
) -> Vec<Generated> {
    let mut narrations = Vec::with_capacity(report.matured.len());
    for chain in &report.matured {
        let thread_names: Vec<String> = chain
            .affected_thread_ids
            .iter()
            .map(|&id| threads.describe(id).unwrap_or_else(|| id.to_string()))
            .collect();
        let context = format!(
            "A consequence manifests.\norigin: {}\nchain_level: {}\nmagnitude: {:.2}\nthreads: {}",
            chain.origin_description,
            chain.chain_level,
            chain.magnitude,
            thread_names.join("; ")
        );
        let fallback = format!("{} comes to pass.", chain.origin_description);
        narrations.push(
            generate_text_or_fallback(generator, &context, &CHAIN_MANIFESTATION, timeout, fallback)
                .await,
        );
    }
    narrations
}
