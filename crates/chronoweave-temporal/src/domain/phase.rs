//! Loop phase of a World Model.

use chronoweave_core::world::WorldModel;

/// Where a World Model sits in the loop lifecycle.
///
/// `Looping` only exists while a rollback is in progress inside
/// `trigger_loop`; a World Model at rest is either dormant or active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalPhase {
    /// No loop mechanics. The initial phase.
    Dormant,
    /// Loop mechanics armed.
    Active,
    /// A rollback is being applied.
    Looping,
}

/// The resting phase of `world`.
#[must_use]
pub fn phase(world: &WorldModel) -> TemporalPhase {
    if world.loop_mechanics_active() {
        TemporalPhase::Active
    } else {
        TemporalPhase::Dormant
    }
}

#[cfg(test)]
mod tests {
    use chronoweave_core::world::{ProtagonistAwareness, TemporalState};

    use super::*;

    #[test]
    fn test_fresh_world_is_dormant() {
        assert_eq!(phase(&WorldModel::default()), TemporalPhase::Dormant);
    }

    #[test]
    fn test_disarmed_state_is_dormant() {
        let world = WorldModel {
            temporal_state: Some(TemporalState {
                current_iteration: 2,
                total_loops: 2,
                protagonist_awareness: ProtagonistAwareness::Suspecting,
                temporal_stability_level: 80,
                loop_mechanics_active: false,
                activation_trigger: String::new(),
            }),
            ..WorldModel::default()
        };
        assert_eq!(phase(&world), TemporalPhase::Dormant);
    }
}
