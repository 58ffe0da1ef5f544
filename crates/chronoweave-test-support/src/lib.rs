//! Shared test doubles and utilities for the Chronoweave narrative simulation.

mod clock;
mod generator;
mod rng;

pub use clock::{FixedClock, fixed_clock};
pub use generator::{FailingGenerator, ScriptedGenerator};
pub use rng::{MockRng, SequenceRng};
