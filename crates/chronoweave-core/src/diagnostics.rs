//! Turn diagnostics: warnings and the serializable error report.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HardError;

/// Which roster a dangling reference was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// The NPC roster.
    Actor,
    /// The narrative-thread roster.
    Thread,
}

/// A recoverable problem recorded in a turn's report. Warnings never block
/// play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// An id does not resolve in its roster.
    DanglingReference {
        /// The chain, web or tension holding the reference.
        owner_id: Uuid,
        /// Roster the id was looked up in.
        reference: ReferenceKind,
        /// The unresolved id.
        missing_id: Uuid,
    },
    /// A bounded field was out of range and has been clamped.
    ValueClamped {
        /// The structure holding the field, if it has an id.
        owner_id: Option<Uuid>,
        /// Field name.
        field: String,
        /// Value before clamping.
        original: f64,
        /// Value after clamping.
        clamped: f64,
    },
    /// A web or tension has a member count outside its soft bounds.
    CompositionDrift {
        /// The drifting web or tension.
        owner_id: Uuid,
        /// What is wrong.
        detail: String,
    },
    /// The content generator failed and deterministic text was used.
    GenerationFallback {
        /// The output shape that was requested.
        shape: String,
        /// Why generation failed.
        reason: String,
    },
    /// The loop predicate fired while loop mechanics were dormant.
    LoopTriggerIgnored {
        /// The predicate's reason.
        reason: String,
    },
    /// A loop fired without a checkpoint; reset-scope state was kept.
    MissingCheckpoint,
}

/// Serializable form of a [`HardError`] for turn reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl From<&HardError> for ErrorReport {
    fn from(err: &HardError) -> Self {
        Self {
            code: err.code().to_owned(),
            message: err.to_string(),
        }
    }
}
