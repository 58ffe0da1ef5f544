//! The player choice that seeds a consequence chain.

use std::collections::BTreeSet;

use chronoweave_core::world::{ActorId, ThreadId};
use serde::{Deserialize, Serialize};

/// A player choice flagged as consequential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeringChoice {
    /// What the player chose.
    pub description: String,
    /// Declared risk in `[0, 1]`.
    pub risk: f64,
    /// Declared moral weight in `[0, 1]`.
    pub moral_weight: f64,
    /// Narrative threads the consequence will touch.
    #[serde(default)]
    pub affected_thread_ids: BTreeSet<ThreadId>,
    /// Actors whose relationships the consequence will shift.
    #[serde(default)]
    pub affected_actor_ids: BTreeSet<ActorId>,
    /// Base relationship shift, scaled by magnitude when the chain matures.
    #[serde(default)]
    pub relationship_delta: i32,
}
