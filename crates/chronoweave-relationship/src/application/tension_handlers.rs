//! Romantic tension handlers.
//!
//! Tensions are created only here, escalated by jealousy, and ended by
//! flagging them resolved. A resolved tension stays in the world so later
//! narration can refer back to it.

use std::collections::BTreeSet;
use std::time::Duration;

use chronoweave_core::config::RelationshipConfig;
use chronoweave_core::error::HardError;
use chronoweave_core::event::{TurnEventKind, TurnJournal};
use chronoweave_core::generation::{
    ContentGenerator, Generated, JEALOUSY_HOOK, generate_text_or_fallback,
};
use chronoweave_core::world::{ActorId, RomanticTension, TensionType, WorldModel, clamp_level};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::composition::check_tension_members;
use crate::domain::dynamics::{draws_in_player, escalate};

/// What a jealousy trigger did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JealousyOutcome {
    /// The escalated tension.
    pub tension_id: Uuid,
    /// Level after escalation.
    pub tension_level: i32,
    /// Whether the jealousy threshold was crossed by this trigger.
    pub crossed_threshold: bool,
    /// Narrative hook for the caller to surface, present when the threshold
    /// was crossed.
    pub narrative_hook: Option<Generated>,
}

/// Creates a romantic tension and adds it to the world.
///
/// # Errors
///
/// Returns `HardError::InvalidComposition` unless 2 or 3 actors are
/// involved. The world is unchanged on error.
pub fn create_tension(
    tension_type: TensionType,
    involved_actor_ids: BTreeSet<ActorId>,
    player_involved: bool,
    initial_level: i32,
    world: &mut WorldModel,
    journal: &mut TurnJournal,
) -> Result<RomanticTension, HardError> {
    check_tension_members(tension_type, involved_actor_ids.len())?;

    let tension = RomanticTension {
        id: Uuid::new_v4(),
        tension_type,
        involved_actor_ids,
        player_involved,
        tension_level: clamp_level(initial_level),
        complications: Vec::new(),
        is_resolved: false,
    };

    info!(tension_id = %tension.id, ?tension_type, "romantic tension created");
    journal.record(TurnEventKind::TensionCreated {
        tension_id: tension.id,
        tension_type,
    });
    world.romantic_tensions.push(tension.clone());
    Ok(tension)
}

/// Escalates the unresolved tension involving both `jealous_actor_id` and
/// `target_actor_id`.
///
/// Raises the tension by the configured increment and records
/// `trigger_description` as a complication. When the level crosses the
/// jealousy threshold, the player may be drawn in and a narrative hook is
/// generated (with a deterministic fallback). The world is only mutated
/// after the hook is settled.
///
/// # Errors
///
/// Returns `HardError::NoSuchTension` if no unresolved tension involves both
/// actors. The world is unchanged on error.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(world, generator, config, journal, trigger_description))]
pub async fn trigger_jealousy(
    jealous_actor_id: ActorId,
    target_actor_id: ActorId,
    trigger_description: &str,
    world: &mut WorldModel,
    generator: &dyn ContentGenerator,
    config: &RelationshipConfig,
    timeout: Duration,
    journal: &mut TurnJournal,
) -> Result<JealousyOutcome, HardError> {
    let index = world
        .romantic_tensions
        .iter()
        .position(|t| !t.is_resolved && t.involves(jealous_actor_id) && t.involves(target_actor_id))
        .ok_or_else(|| {
            HardError::NoSuchTension(format!(
                "no unresolved tension between {jealous_actor_id} and {target_actor_id}"
            ))
        })?;

    let (escalation, tension_type, player_among_involved, context) = {
        let tension = &world.romantic_tensions[index];
        let escalation = escalate(
            tension.tension_level,
            config.jealousy_increment,
            config.jealousy_threshold,
        );
        let player_among_involved = world.player_id.is_some_and(|p| tension.involves(p));
        let context = format!(
            "Jealousy surfaces.\ntension_type: {:?}\ntension_level: {}\njealous: {jealous_actor_id}\ntarget: {target_actor_id}\ntrigger: {trigger_description}\nprior complications: {}",
            tension.tension_type,
            escalation.tension_level,
            tension.complications.join("; ")
        );
        (escalation, tension.tension_type, player_among_involved, context)
    };

    let narrative_hook = if escalation.crossed_threshold {
        let fallback = format!(
            "Jealousy boils over between {jealous_actor_id} and {target_actor_id}: {trigger_description}"
        );
        Some(generate_text_or_fallback(generator, &context, &JEALOUSY_HOOK, timeout, fallback).await)
    } else {
        None
    };

    let tension = &mut world.romantic_tensions[index];
    tension.tension_level = escalation.tension_level;
    tension.complications.push(trigger_description.to_owned());
    if escalation.crossed_threshold && draws_in_player(tension_type, player_among_involved) {
        tension.player_involved = true;
    }

    info!(
        tension_id = %tension.id,
        tension_level = tension.tension_level,
        crossed = escalation.crossed_threshold,
        "jealousy escalated tension"
    );
    journal.record(TurnEventKind::TensionEscalated {
        tension_id: tension.id,
        tension_level: tension.tension_level,
        threshold_crossed: escalation.crossed_threshold,
    });

    Ok(JealousyOutcome {
        tension_id: tension.id,
        tension_level: tension.tension_level,
        crossed_threshold: escalation.crossed_threshold,
        narrative_hook,
    })
}

/// Marks a tension resolved. Resolving an already resolved tension is a
/// no-op.
///
/// # Errors
///
/// Returns `HardError::NoSuchTension` if no tension has `tension_id`.
pub fn resolve_tension(
    tension_id: Uuid,
    world: &mut WorldModel,
    journal: &mut TurnJournal,
) -> Result<(), HardError> {
    let tension = world
        .romantic_tensions
        .iter_mut()
        .find(|t| t.id == tension_id)
        .ok_or_else(|| HardError::NoSuchTension(tension_id.to_string()))?;
    if !tension.is_resolved {
        tension.is_resolved = true;
        info!(%tension_id, "romantic tension resolved");
        journal.record(TurnEventKind::TensionResolved { tension_id });
    }
    Ok(())
}
