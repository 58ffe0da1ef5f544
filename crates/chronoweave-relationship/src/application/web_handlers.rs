//! Relationship web handlers.

use std::collections::BTreeSet;

use chronoweave_core::error::HardError;
use chronoweave_core::event::{TurnEventKind, TurnJournal};
use chronoweave_core::world::{ActorId, DynamicsType, RelationshipEvent, RelationshipWeb, WorldModel};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::composition::{check_web_members, initial_levels};
use crate::domain::dynamics::{shift_tension, shift_web};

/// Forms a relationship web and adds it to the world.
///
/// # Errors
///
/// Returns `HardError::InvalidComposition` if the member count is outside
/// 2 to 6, or a love triangle does not have 2 or 3 members. The world is
/// unchanged on error.
pub fn create_web(
    group_name: &str,
    member_ids: BTreeSet<ActorId>,
    dynamics_type: DynamicsType,
    world: &mut WorldModel,
    journal: &mut TurnJournal,
) -> Result<RelationshipWeb, HardError> {
    check_web_members(dynamics_type, member_ids.len())?;

    let (cohesion_level, conflict_level) = initial_levels(dynamics_type);
    let web = RelationshipWeb {
        id: Uuid::new_v4(),
        group_name: group_name.to_owned(),
        member_ids,
        dynamics_type,
        cohesion_level,
        conflict_level,
        is_resolved: false,
    };

    info!(web_id = %web.id, ?dynamics_type, members = web.member_ids.len(), "relationship web formed");
    journal.record(TurnEventKind::WebFormed {
        web_id: web.id,
        dynamics_type,
    });
    world.relationship_webs.push(web.clone());
    Ok(web)
}

/// Folds relationship shifts into every unresolved web containing the actor
/// and every unresolved tension involving them.
///
/// Total over the current webs and tensions: an event naming an actor that
/// belongs to nothing changes nothing, and nothing is ever removed.
pub fn apply_relationship_events(
    events: &[RelationshipEvent],
    world: &mut WorldModel,
    journal: &mut TurnJournal,
) {
    for event in events {
        let mut touched = 0_usize;
        for web in world
            .relationship_webs
            .iter_mut()
            .filter(|w| !w.is_resolved && w.member_ids.contains(&event.actor_id))
        {
            (web.cohesion_level, web.conflict_level) =
                shift_web(web.cohesion_level, web.conflict_level, event.delta);
            touched += 1;
        }
        for tension in world
            .romantic_tensions
            .iter_mut()
            .filter(|t| !t.is_resolved && t.involves(event.actor_id))
        {
            tension.tension_level = shift_tension(tension.tension_level, event.delta);
            touched += 1;
        }

        debug!(actor_id = %event.actor_id, delta = event.delta, touched, "relationship event applied");
        journal.record(TurnEventKind::RelationshipShifted {
            actor_id: event.actor_id,
            delta: event.delta,
            reason: event.reason.clone(),
        });
    }
}

/// Marks a web resolved. Resolving an already resolved web is a no-op.
///
/// # Errors
///
/// Returns `HardError::NoSuchWeb` if no web has `web_id`.
pub fn resolve_web(
    web_id: Uuid,
    world: &mut WorldModel,
    journal: &mut TurnJournal,
) -> Result<(), HardError> {
    let web = world
        .relationship_webs
        .iter_mut()
        .find(|w| w.id == web_id)
        .ok_or(HardError::NoSuchWeb(web_id))?;
    if !web.is_resolved {
        web.is_resolved = true;
        info!(%web_id, "relationship web resolved");
        journal.record(TurnEventKind::WebResolved { web_id });
    }
    Ok(())
}
