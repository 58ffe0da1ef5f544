//! Membership rules for webs and tensions.

use std::ops::RangeInclusive;

use chronoweave_core::error::HardError;
use chronoweave_core::world::{DynamicsType, TensionType};

/// Allowed member count of any relationship web.
pub const WEB_MEMBERS: RangeInclusive<usize> = 2..=6;

/// Allowed member count of a love triangle, web or tension.
pub const LOVE_TRIANGLE_MEMBERS: RangeInclusive<usize> = 2..=3;

/// Allowed actor count of any romantic tension.
pub const TENSION_MEMBERS: RangeInclusive<usize> = 2..=3;

/// Checks a web's member count against its dynamics.
///
/// # Errors
///
/// Returns `HardError::InvalidComposition` when the count is outside
/// [`WEB_MEMBERS`], or outside [`LOVE_TRIANGLE_MEMBERS`] for a love triangle.
pub fn check_web_members(dynamics_type: DynamicsType, member_count: usize) -> Result<(), HardError> {
    if dynamics_type == DynamicsType::LoveTriangle && !LOVE_TRIANGLE_MEMBERS.contains(&member_count)
    {
        return Err(HardError::InvalidComposition(format!(
            "love triangle requires 2 or 3 members, got {member_count}"
        )));
    }
    if !WEB_MEMBERS.contains(&member_count) {
        return Err(HardError::InvalidComposition(format!(
            "relationship web requires 2 to 6 members, got {member_count}"
        )));
    }
    Ok(())
}

/// Checks a tension's actor count.
///
/// # Errors
///
/// Returns `HardError::InvalidComposition` when the count is outside
/// [`TENSION_MEMBERS`].
pub fn check_tension_members(tension_type: TensionType, actor_count: usize) -> Result<(), HardError> {
    if !TENSION_MEMBERS.contains(&actor_count) {
        return Err(HardError::InvalidComposition(format!(
            "{tension_type:?} tension requires 2 or 3 actors, got {actor_count}"
        )));
    }
    Ok(())
}

/// Starting `(cohesion, conflict)` for a new web.
#[must_use]
pub fn initial_levels(dynamics_type: DynamicsType) -> (i32, i32) {
    match dynamics_type {
        DynamicsType::Alliance => (60, 20),
        DynamicsType::Rivalry => (25, 65),
        DynamicsType::LoveTriangle => (45, 55),
        DynamicsType::Mentorship => (70, 10),
    }
}
