//! Pure scheduling and branching rules.
//!
//! Every number that decides when a chain manifests or whether it branches
//! is computed here from explicit inputs. The only randomness is the roll
//! in [`count_children`], drawn from an injected source.

use chronoweave_core::config::ConsequenceConfig;
use chronoweave_core::rng::DeterministicRng;

/// Magnitude of a root chain from the choice's declared risk and moral
/// weight. Inputs are clamped to `[0, 1]`, as is the result.
#[must_use]
pub fn magnitude_for(risk: f64, moral_weight: f64, config: &ConsequenceConfig) -> f64 {
    let risk = unit(risk);
    let moral_weight = unit(moral_weight);
    unit(config.risk_weight * risk + config.moral_weight_weight * moral_weight)
}

/// Turns until a chain at `chain_level` manifests. Deeper chains manifest
/// sooner, never faster than `min_delay_turns`.
#[must_use]
pub fn delay_for_level(chain_level: u32, config: &ConsequenceConfig) -> u64 {
    config
        .base_delay_turns
        .saturating_sub(u64::from(chain_level))
        .max(config.min_delay_turns)
}

/// Probability that a single branching roll spawns a child.
#[must_use]
pub fn spawn_probability(magnitude: f64, config: &ConsequenceConfig) -> f64 {
    unit(magnitude * config.spawn_probability_scale)
}

/// Magnitude of a child of a chain with `magnitude`.
#[must_use]
pub fn child_magnitude(magnitude: f64, config: &ConsequenceConfig) -> f64 {
    magnitude * config.decay_factor
}

/// Whether a chain at `chain_level` may spawn children at all.
#[must_use]
pub fn can_branch(chain_level: u32, config: &ConsequenceConfig) -> bool {
    chain_level < config.max_chain_depth
}

/// Number of children a maturing chain spawns: one independent roll per
/// possible child. Chains at the depth cap draw no rolls.
pub fn count_children(
    magnitude: f64,
    chain_level: u32,
    config: &ConsequenceConfig,
    rng: &mut dyn DeterministicRng,
) -> u32 {
    if !can_branch(chain_level, config) {
        return 0;
    }
    let probability = spawn_probability(magnitude, config);
    let mut spawned = 0;
    for _ in 0..config.max_children {
        if rng.next_f64() < probability {
            spawned += 1;
        }
    }
    spawned
}

/// Relationship shift of a maturing chain: the declared delta scaled by
/// magnitude, rounded to the nearest integer.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn scaled_delta(relationship_delta: i32, magnitude: f64) -> i32 {
    (f64::from(relationship_delta) * unit(magnitude)).round() as i32
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
