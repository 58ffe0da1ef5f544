//! Tunable simulation constants.
//!
//! Every branching probability, decay rate and threshold the engines use is
//! read from here. Missing keys fall back to the defaults below, so a YAML
//! file only needs to name what it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML did not parse.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of its meaningful range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted field path.
        field: &'static str,
        /// What is wrong.
        reason: String,
    },
}

/// Most children a single matured chain may spawn.
pub const MAX_CHILDREN_PER_CHAIN: u32 = 2;

/// Consequence Engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsequenceConfig {
    /// Deepest chain level; chains at this level never branch.
    pub max_chain_depth: u32,
    /// Magnitude multiplier per level.
    pub decay_factor: f64,
    /// Spawn probability per roll is `magnitude * spawn_probability_scale`.
    pub spawn_probability_scale: f64,
    /// Upper bound on children per matured chain, at most
    /// [`MAX_CHILDREN_PER_CHAIN`].
    pub max_children: u32,
    /// Delay of a root chain in turns.
    pub base_delay_turns: u64,
    /// Floor on the delay of any chain.
    pub min_delay_turns: u64,
    /// Weight of the choice's risk in its magnitude.
    pub risk_weight: f64,
    /// Weight of the choice's moral weight in its magnitude.
    pub moral_weight_weight: f64,
}

impl Default for ConsequenceConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: 3,
            decay_factor: 0.6,
            spawn_probability_scale: 1.0,
            max_children: MAX_CHILDREN_PER_CHAIN,
            base_delay_turns: 2,
            min_delay_turns: 1,
            risk_weight: 0.5,
            moral_weight_weight: 0.5,
        }
    }
}

/// Relationship Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Tension added by one jealousy trigger.
    pub jealousy_increment: i32,
    /// Tension level at which jealousy surfaces a narrative hook.
    pub jealousy_threshold: i32,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            jealousy_increment: 30,
            jealousy_threshold: 70,
        }
    }
}

/// Temporal Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    /// Memories strictly above this strength survive a rollback.
    pub retention_threshold: i32,
    /// Strength lost by each surviving memory per rollback.
    pub retention_decay: i32,
    /// Strength of the memory recording the rollback itself.
    pub loop_echo_strength: i32,
    /// Loop counts at which awareness advances one step each.
    pub awareness_thresholds: Vec<u32>,
    /// Stability lost per rollback.
    pub stability_cost: i32,
    /// Psychological intensity gained per rollback, times the loop count.
    pub intensity_per_loop: i32,
    /// Minimum strength of a relationship memory that turns scarring into
    /// attachment.
    pub attachment_memory_strength: i32,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            retention_threshold: 30,
            retention_decay: 15,
            loop_echo_strength: 60,
            awareness_thresholds: vec![2, 4, 7],
            stability_cost: 10,
            intensity_per_loop: 5,
            attachment_memory_strength: 50,
        }
    }
}

/// Content-generation collaborator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Budget for a single generation call.
    pub timeout_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { timeout_ms: 8_000 }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Consequence Engine tuning.
    pub consequence: ConsequenceConfig,
    /// Relationship Engine tuning.
    pub relationship: RelationshipConfig,
    /// Temporal Engine tuning.
    pub temporal: TemporalConfig,
    /// Generation collaborator settings.
    pub generation: GenerationConfig,
}

impl SimulationConfig {
    /// Parses and validates a YAML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed YAML and
    /// `ConfigError::Invalid` for out-of-range values.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`SimulationConfig::from_yaml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Checks that every value is meaningful.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.consequence;
        if !(0.0..=1.0).contains(&c.decay_factor) {
            return Err(invalid("consequence.decay_factor", "must be within [0, 1]"));
        }
        if c.spawn_probability_scale < 0.0 || !c.spawn_probability_scale.is_finite() {
            return Err(invalid(
                "consequence.spawn_probability_scale",
                "must be a non-negative number",
            ));
        }
        if c.max_children > MAX_CHILDREN_PER_CHAIN {
            return Err(invalid(
                "consequence.max_children",
                &format!("must be at most {MAX_CHILDREN_PER_CHAIN}"),
            ));
        }
        if c.min_delay_turns == 0 {
            return Err(invalid(
                "consequence.min_delay_turns",
                "must be at least 1 so chains never mature on the turn they are created",
            ));
        }
        if c.risk_weight < 0.0 || c.moral_weight_weight < 0.0 {
            return Err(invalid(
                "consequence.risk_weight",
                "magnitude weights must be non-negative",
            ));
        }

        let r = &self.relationship;
        if !(0..=100).contains(&r.jealousy_increment) {
            return Err(invalid("relationship.jealousy_increment", "must be within [0, 100]"));
        }
        if !(0..=100).contains(&r.jealousy_threshold) {
            return Err(invalid("relationship.jealousy_threshold", "must be within [0, 100]"));
        }

        let t = &self.temporal;
        for (field, value) in [
            ("temporal.retention_threshold", t.retention_threshold),
            ("temporal.retention_decay", t.retention_decay),
            ("temporal.loop_echo_strength", t.loop_echo_strength),
            ("temporal.stability_cost", t.stability_cost),
            ("temporal.intensity_per_loop", t.intensity_per_loop),
            ("temporal.attachment_memory_strength", t.attachment_memory_strength),
        ] {
            if !(0..=100).contains(&value) {
                return Err(invalid(field, "must be within [0, 100]"));
            }
        }
        if t.awareness_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid(
                "temporal.awareness_thresholds",
                "must be strictly increasing",
            ));
        }

        if self.generation.timeout_ms == 0 {
            return Err(invalid("generation.timeout_ms", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = SimulationConfig::from_yaml_str(
            "consequence:\n  decay_factor: 0.5\ntemporal:\n  retention_decay: 20\n",
        )
        .unwrap();

        assert!((config.consequence.decay_factor - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.consequence.max_chain_depth, 3);
        assert_eq!(config.temporal.retention_decay, 20);
        assert_eq!(config.temporal.retention_threshold, 30);
        assert_eq!(config.relationship, RelationshipConfig::default());
    }

    #[test]
    fn test_decay_factor_above_one_is_rejected() {
        let err = SimulationConfig::from_yaml_str("consequence:\n  decay_factor: 1.5\n")
            .unwrap_err();
        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "consequence.decay_factor"),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_more_than_two_children_is_rejected() {
        let err = SimulationConfig::from_yaml_str("consequence:\n  max_children: 5\n")
            .unwrap_err();
        match err {
            ConfigError::Invalid { field, reason } => {
                assert_eq!(field, "consequence.max_children");
                assert_eq!(reason, "must be at most 2");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert!(SimulationConfig::from_yaml_str("consequence:\n  max_children: 0\n").is_ok());
    }

    #[test]
    fn test_non_increasing_awareness_thresholds_are_rejected() {
        let err = SimulationConfig::from_yaml_str("temporal:\n  awareness_thresholds: [3, 3]\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "temporal.awareness_thresholds",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = SimulationConfig::from_yaml_str("consequence: [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimulationConfig::load("/nonexistent/chronoweave.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
