//! Consistency rules over a whole World Model.
//!
//! Impossible compositions are hard errors and are detected before anything
//! is touched. Everything else (dangling references, out-of-range values,
//! soft size drift) is repaired or reported as a warning.

use chronoweave_core::diagnostics::{ReferenceKind, Warning};
use chronoweave_core::error::HardError;
use chronoweave_core::roster::Roster;
use chronoweave_core::world::{
    ActorId, DynamicsType, LEVEL_MAX, LEVEL_MIN, TensionType, WorldModel,
};
use chronoweave_relationship::domain::composition::{
    LOVE_TRIANGLE_MEMBERS, TENSION_MEMBERS, WEB_MEMBERS,
};
use tracing::warn;
use uuid::Uuid;

/// The rosters references are resolved against.
#[derive(Clone, Copy)]
pub struct Rosters<'a> {
    /// NPCs; chain actors, web members and tension actors.
    pub npcs: &'a dyn Roster,
    /// Narrative threads; chain threads.
    pub threads: &'a dyn Roster,
}

/// Validates `world`, clamping out-of-range values in place.
///
/// Returns the warnings for everything repaired or left dangling. Running
/// it again on its own output yields no clamps, only the same dangling and
/// drift warnings.
///
/// # Errors
///
/// Returns `HardError::InvalidComposition` if a love-triangle web or
/// tension does not have 2 or 3 members. The world is unchanged on error.
pub fn validate_consistency(
    world: &mut WorldModel,
    rosters: Rosters<'_>,
    max_chain_depth: u32,
) -> Result<Vec<Warning>, HardError> {
    check_love_triangles(world)?;

    let mut warnings = Vec::new();
    let player_id = world.player_id;
    let actor_known = |id: ActorId| Some(id) == player_id || rosters.npcs.exists(id);

    for chain in &mut world.consequence_chains {
        for &thread_id in &chain.affected_thread_ids {
            if !rosters.threads.exists(thread_id) {
                warnings.push(dangling(chain.id, ReferenceKind::Thread, thread_id));
            }
        }
        for &actor_id in &chain.affected_actor_ids {
            if !actor_known(actor_id) {
                warnings.push(dangling(chain.id, ReferenceKind::Actor, actor_id));
            }
        }
        let magnitude = if chain.magnitude.is_nan() {
            0.0
        } else {
            chain.magnitude.clamp(0.0, 1.0)
        };
        if magnitude.to_bits() != chain.magnitude.to_bits() {
            warnings.push(clamped(Some(chain.id), "magnitude", chain.magnitude, magnitude));
            chain.magnitude = magnitude;
        }
        if chain.chain_level > max_chain_depth {
            warnings.push(clamped(
                Some(chain.id),
                "chain_level",
                f64::from(chain.chain_level),
                f64::from(max_chain_depth),
            ));
            chain.chain_level = max_chain_depth;
        }
    }

    for web in &mut world.relationship_webs {
        for &member_id in &web.member_ids {
            if !actor_known(member_id) {
                warnings.push(dangling(web.id, ReferenceKind::Actor, member_id));
            }
        }
        if !WEB_MEMBERS.contains(&web.member_ids.len()) {
            warnings.push(Warning::CompositionDrift {
                owner_id: web.id,
                detail: format!(
                    "web has {} members, expected {} to {}",
                    web.member_ids.len(),
                    WEB_MEMBERS.start(),
                    WEB_MEMBERS.end()
                ),
            });
        }
        clamp_level_field(&mut web.cohesion_level, Some(web.id), "cohesion_level", &mut warnings);
        clamp_level_field(&mut web.conflict_level, Some(web.id), "conflict_level", &mut warnings);
    }

    for tension in &mut world.romantic_tensions {
        for &actor_id in &tension.involved_actor_ids {
            if !actor_known(actor_id) {
                warnings.push(dangling(tension.id, ReferenceKind::Actor, actor_id));
            }
        }
        if !TENSION_MEMBERS.contains(&tension.involved_actor_ids.len()) {
            warnings.push(Warning::CompositionDrift {
                owner_id: tension.id,
                detail: format!(
                    "tension involves {} actors, expected {} to {}",
                    tension.involved_actor_ids.len(),
                    TENSION_MEMBERS.start(),
                    TENSION_MEMBERS.end()
                ),
            });
        }
        clamp_level_field(
            &mut tension.tension_level,
            Some(tension.id),
            "tension_level",
            &mut warnings,
        );
    }

    if let Some(state) = world.temporal_state.as_mut() {
        clamp_level_field(
            &mut state.temporal_stability_level,
            None,
            "temporal_stability_level",
            &mut warnings,
        );
    }
    for memory in &mut world.retained_memories {
        clamp_level_field(
            &mut memory.retention_strength,
            None,
            "retention_strength",
            &mut warnings,
        );
    }
    for effect in &mut world.psychological_effects {
        clamp_level_field(&mut effect.intensity, Some(effect.id), "intensity", &mut warnings);
    }

    if !warnings.is_empty() {
        warn!(count = warnings.len(), "world model validated with warnings");
    }
    Ok(warnings)
}

fn check_love_triangles(world: &WorldModel) -> Result<(), HardError> {
    for web in &world.relationship_webs {
        if web.dynamics_type == DynamicsType::LoveTriangle
            && !LOVE_TRIANGLE_MEMBERS.contains(&web.member_ids.len())
        {
            return Err(HardError::InvalidComposition(format!(
                "love triangle web {} has {} members",
                web.id,
                web.member_ids.len()
            )));
        }
    }
    for tension in &world.romantic_tensions {
        if tension.tension_type == TensionType::LoveTriangle
            && !LOVE_TRIANGLE_MEMBERS.contains(&tension.involved_actor_ids.len())
        {
            return Err(HardError::InvalidComposition(format!(
                "love triangle tension {} involves {} actors",
                tension.id,
                tension.involved_actor_ids.len()
            )));
        }
    }
    Ok(())
}

fn clamp_level_field(
    value: &mut i32,
    owner_id: Option<Uuid>,
    field: &str,
    warnings: &mut Vec<Warning>,
) {
    let clamped_value = (*value).clamp(LEVEL_MIN, LEVEL_MAX);
    if clamped_value != *value {
        warnings.push(clamped(
            owner_id,
            field,
            f64::from(*value),
            f64::from(clamped_value),
        ));
        *value = clamped_value;
    }
}

fn dangling(owner_id: Uuid, reference: ReferenceKind, missing_id: Uuid) -> Warning {
    Warning::DanglingReference {
        owner_id,
        reference,
        missing_id,
    }
}

fn clamped(owner_id: Option<Uuid>, field: &str, original: f64, clamped: f64) -> Warning {
    Warning::ValueClamped {
        owner_id,
        field: field.to_owned(),
        original,
        clamped,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chronoweave_core::roster::InMemoryRoster;
    use chronoweave_core::world::{
        ConsequenceChain, MemoryEntry, MemoryType, RelationshipWeb, RomanticTension,
    };

    use super::*;

    struct Fixture {
        npcs: InMemoryRoster,
        threads: InMemoryRoster,
        known: Vec<Uuid>,
        thread: Uuid,
    }

    impl Fixture {
        fn new() -> Self {
            let known: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
            let thread = Uuid::new_v4();
            Self {
                npcs: InMemoryRoster::from_ids(known.iter().copied()),
                threads: InMemoryRoster::from_ids([thread]),
                known,
                thread,
            }
        }

        fn rosters(&self) -> Rosters<'_> {
            Rosters {
                npcs: &self.npcs,
                threads: &self.threads,
            }
        }

        fn members(&self, n: usize) -> BTreeSet<ActorId> {
            self.known.iter().copied().take(n).collect()
        }
    }

    fn web(member_ids: BTreeSet<ActorId>, dynamics_type: DynamicsType) -> RelationshipWeb {
        RelationshipWeb {
            id: Uuid::new_v4(),
            group_name: "the salt guild".to_owned(),
            member_ids,
            dynamics_type,
            cohesion_level: 50,
            conflict_level: 30,
            is_resolved: false,
        }
    }

    fn tension(involved: BTreeSet<ActorId>, tension_type: TensionType) -> RomanticTension {
        RomanticTension {
            id: Uuid::new_v4(),
            tension_type,
            involved_actor_ids: involved,
            player_involved: false,
            tension_level: 40,
            complications: Vec::new(),
            is_resolved: false,
        }
    }

    fn chain(thread: Uuid, magnitude: f64) -> ConsequenceChain {
        ConsequenceChain {
            id: Uuid::new_v4(),
            origin_description: "poisoned the well".to_owned(),
            chain_level: 0,
            magnitude,
            affected_thread_ids: BTreeSet::from([thread]),
            affected_actor_ids: BTreeSet::new(),
            relationship_delta: 0,
            parent_id: None,
            is_active: true,
            created_at_turn: 1,
            manifest_at_turn: 3,
        }
    }

    #[test]
    fn test_consistent_world_has_no_warnings() {
        let fx = Fixture::new();
        let mut world = WorldModel::default();
        world.consequence_chains.push(chain(fx.thread, 0.5));
        world.relationship_webs.push(web(fx.members(4), DynamicsType::Alliance));
        world
            .romantic_tensions
            .push(tension(fx.members(3), TensionType::LoveTriangle));

        let warnings = validate_consistency(&mut world, fx.rosters(), 3).unwrap();

        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_dangling_references_are_warnings() {
        let fx = Fixture::new();
        let stranger = Uuid::new_v4();
        let lost_thread = Uuid::new_v4();
        let mut world = WorldModel::default();
        world.consequence_chains.push(chain(lost_thread, 0.5));
        let mut members = fx.members(2);
        members.insert(stranger);
        world.relationship_webs.push(web(members, DynamicsType::Rivalry));

        let warnings = validate_consistency(&mut world, fx.rosters(), 3).unwrap();

        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| matches!(
            w,
            Warning::DanglingReference { reference: ReferenceKind::Thread, missing_id, .. }
                if *missing_id == lost_thread
        )));
        assert!(warnings.iter().any(|w| matches!(
            w,
            Warning::DanglingReference { reference: ReferenceKind::Actor, missing_id, .. }
                if *missing_id == stranger
        )));
    }

    #[test]
    fn test_player_is_a_valid_member() {
        let fx = Fixture::new();
        let player = Uuid::new_v4();
        let mut world = WorldModel::new(Some(player));
        let mut members = fx.members(1);
        members.insert(player);
        world
            .romantic_tensions
            .push(tension(members, TensionType::Unrequited));

        let warnings = validate_consistency(&mut world, fx.rosters(), 3).unwrap();

        assert!(warnings.is_empty());
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let fx = Fixture::new();
        let mut world = WorldModel::default();
        let mut bad_chain = chain(fx.thread, 1.7);
        bad_chain.chain_level = 9;
        world.consequence_chains.push(bad_chain);
        let mut hot = web(fx.members(2), DynamicsType::Rivalry);
        hot.conflict_level = 140;
        world.relationship_webs.push(hot);
        world.retained_memories.push(MemoryEntry {
            memory_type: MemoryType::Event,
            content: "the eclipse".to_owned(),
            retention_strength: -3,
            turn_id: 1,
        });

        let warnings = validate_consistency(&mut world, fx.rosters(), 3).unwrap();

        assert_eq!(warnings.len(), 4);
        assert!((world.consequence_chains[0].magnitude - 1.0).abs() < f64::EPSILON);
        assert_eq!(world.consequence_chains[0].chain_level, 3);
        assert_eq!(world.relationship_webs[0].conflict_level, 100);
        assert_eq!(world.retained_memories[0].retention_strength, 0);

        let again = validate_consistency(&mut world, fx.rosters(), 3).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_oversized_love_triangle_web_is_hard_error() {
        let fx = Fixture::new();
        let mut world = WorldModel::default();
        let mut hot = web(fx.members(2), DynamicsType::Rivalry);
        hot.conflict_level = 140;
        world.relationship_webs.push(hot);
        world
            .relationship_webs
            .push(web(fx.members(4), DynamicsType::LoveTriangle));
        let before = world.clone();

        let result = validate_consistency(&mut world, fx.rosters(), 3);

        assert!(matches!(result, Err(HardError::InvalidComposition(_))));
        assert_eq!(world, before);
    }

    #[test]
    fn test_oversized_love_triangle_tension_is_hard_error() {
        let fx = Fixture::new();
        let mut world = WorldModel::default();
        world
            .romantic_tensions
            .push(tension(fx.members(4), TensionType::LoveTriangle));

        let result = validate_consistency(&mut world, fx.rosters(), 3);

        assert!(matches!(result, Err(HardError::InvalidComposition(_))));
    }

    #[test]
    fn test_other_size_violations_are_drift() {
        let fx = Fixture::new();
        let mut world = WorldModel::default();
        world
            .relationship_webs
            .push(web(fx.members(1), DynamicsType::Alliance));
        world
            .romantic_tensions
            .push(tension(fx.members(4), TensionType::RivalryRomance));

        let warnings = validate_consistency(&mut world, fx.rosters(), 3).unwrap();

        assert_eq!(warnings.len(), 2);
        assert!(
            warnings
                .iter()
                .all(|w| matches!(w, Warning::CompositionDrift { .. }))
        );
    }
}
