//! Loop predicates.
//!
//! The caller decides what makes the world loop (the player dying, a bell
//! tolling, a spell). The manager asks its predicate once per turn, after
//! the engines have run.

use chronoweave_core::world::WorldModel;

use super::action::PlayerAction;

/// Decides whether a turn ends in a loop.
pub trait LoopTrigger: Send + Sync {
    /// Returns the loop reason if the turn should loop.
    fn should_loop(&self, action: &PlayerAction, world: &WorldModel) -> Option<String>;
}

/// Fires when the action carries a named flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagLoopTrigger {
    flag: String,
}

impl FlagLoopTrigger {
    /// Creates a trigger on `flag`.
    #[must_use]
    pub fn new(flag: impl Into<String>) -> Self {
        Self { flag: flag.into() }
    }
}

impl LoopTrigger for FlagLoopTrigger {
    fn should_loop(&self, action: &PlayerAction, _world: &WorldModel) -> Option<String> {
        if !action.has_flag(&self.flag) {
            return None;
        }
        if action.description.is_empty() {
            Some(self.flag.clone())
        } else {
            Some(format!("{}: {}", self.flag, action.description))
        }
    }
}

/// Never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverLoop;

impl LoopTrigger for NeverLoop {
    fn should_loop(&self, _action: &PlayerAction, _world: &WorldModel) -> Option<String> {
        None
    }
}

/// A predicate backed by a closure. Built with [`loop_when`].
pub struct FnLoopTrigger<F>(F);

impl<F> LoopTrigger for FnLoopTrigger<F>
where
    F: Fn(&PlayerAction, &WorldModel) -> Option<String> + Send + Sync,
{
    fn should_loop(&self, action: &PlayerAction, world: &WorldModel) -> Option<String> {
        (self.0)(action, world)
    }
}

/// Wraps a closure as a loop predicate.
pub fn loop_when<F>(predicate: F) -> FnLoopTrigger<F>
where
    F: Fn(&PlayerAction, &WorldModel) -> Option<String> + Send + Sync,
{
    FnLoopTrigger(predicate)
}
