//! Error types.
//!
//! A `HardError` rejects a single operation and leaves the World Model
//! unchanged. Recoverable problems are reported as
//! [`Warning`](crate::diagnostics::Warning)s instead.

use thiserror::Error;
use uuid::Uuid;

/// Errors that reject an operation outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardError {
    /// A web or tension has an impossible membership.
    #[error("invalid composition: {0}")]
    InvalidComposition(String),

    /// A loop was triggered before loop mechanics were activated.
    #[error("loop mechanics are not active")]
    LoopNotActive,

    /// Loop mechanics were activated twice.
    #[error("loop mechanics are already active")]
    AlreadyActive,

    /// No unresolved tension matches the request.
    #[error("no such tension: {0}")]
    NoSuchTension(String),

    /// No relationship web has the given id.
    #[error("no such relationship web: {0}")]
    NoSuchWeb(Uuid),
}

impl HardError {
    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidComposition(_) => "invalid_composition",
            Self::LoopNotActive => "loop_not_active",
            Self::AlreadyActive => "already_active",
            Self::NoSuchTension(_) => "no_such_tension",
            Self::NoSuchWeb(_) => "no_such_web",
        }
    }
}
