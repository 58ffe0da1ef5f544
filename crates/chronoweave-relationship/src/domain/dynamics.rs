//! Pure level arithmetic for webs and tensions.

use chronoweave_core::world::{TensionType, clamp_level};

/// Cohesion and conflict after an actor's relationships shift by `delta`.
///
/// Goodwill raises cohesion by `delta` and eases conflict by half as much;
/// hostility raises conflict by `|delta|` and erodes cohesion by half.
#[must_use]
pub fn shift_web(cohesion: i32, conflict: i32, delta: i32) -> (i32, i32) {
    let magnitude = delta.saturating_abs();
    if delta >= 0 {
        (
            clamp_level(cohesion.saturating_add(magnitude)),
            clamp_level(conflict.saturating_sub(magnitude / 2)),
        )
    } else {
        (
            clamp_level(cohesion.saturating_sub(magnitude / 2)),
            clamp_level(conflict.saturating_add(magnitude)),
        )
    }
}

/// Tension level after an involved actor shifts by `delta`. Hostility
/// raises tension; goodwill eases it. Half the delta applies.
#[must_use]
pub fn shift_tension(tension_level: i32, delta: i32) -> i32 {
    clamp_level(tension_level.saturating_sub(delta / 2))
}

/// Result of a jealousy trigger on a tension level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escalation {
    /// Level after the increment, clamped.
    pub tension_level: i32,
    /// Whether the level rose from below `threshold` to at least it.
    pub crossed_threshold: bool,
}

/// Raises `tension_level` by `increment` and reports whether it crossed
/// `threshold`.
#[must_use]
pub fn escalate(tension_level: i32, increment: i32, threshold: i32) -> Escalation {
    let raised = clamp_level(tension_level.saturating_add(increment));
    Escalation {
        tension_level: raised,
        crossed_threshold: tension_level < threshold && raised >= threshold,
    }
}

/// Whether an escalation past the threshold draws the player into the
/// tension: always for love triangles and rivalry romances, and for any
/// tension the player is already part of.
#[must_use]
pub fn draws_in_player(tension_type: TensionType, player_among_involved: bool) -> bool {
    player_among_involved
        || matches!(
            tension_type,
            TensionType::LoveTriangle | TensionType::RivalryRomance
        )
}
