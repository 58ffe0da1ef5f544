//! Test RNG: deterministic `DeterministicRng` implementations for tests.

use chronoweave_core::rng::DeterministicRng;

/// An RNG that always returns `0.0`. Every probability roll against it
/// succeeds, so chains branch as much as they are allowed to.
#[derive(Debug)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_f64(&mut self) -> f64 {
        0.0
    }
}

/// An RNG that returns rolls from a predetermined sequence. Panics if the
/// sequence is exhausted, so a test that draws more rolls than it scripted
/// fails loudly.
#[derive(Debug, Default)]
pub struct SequenceRng {
    floats: Vec<f64>,
    float_index: usize,
}

impl SequenceRng {
    /// Create a `SequenceRng` that scripts `next_f64` rolls.
    #[must_use]
    pub fn with_floats(floats: Vec<f64>) -> Self {
        Self {
            floats,
            float_index: 0,
        }
    }

    /// Number of rolls drawn so far.
    #[must_use]
    pub fn floats_drawn(&self) -> usize {
        self.float_index
    }
}

impl DeterministicRng for SequenceRng {
    fn next_f64(&mut self) -> f64 {
        let val = self.floats[self.float_index];
        self.float_index += 1;
        val
    }
}
