//! Implementation of a saturating counter.

use crate::branch::Outcome;
use crate::predictor::StatefulPredictor;

/// Configuration for building a [`SaturatingCounter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaturatingCounterConfig {
    /// The largest value the counter can hold
    pub max: u8,
    /// The value of the counter after being reset
    pub init: u8,
}
impl SaturatingCounterConfig {
    /// A 2-bit counter starting at 'init'.
    pub fn two_bit(init: u8) -> Self {
        Self { max: 3, init }
    }

    pub fn storage_bits(&self) -> usize {
        (u8::BITS - self.max.leading_zeros()) as usize
    }

    pub fn build(self) -> SaturatingCounter {
        assert!(self.max > 0 && self.init <= self.max);
        SaturatingCounter {
            cfg: self,
            ctr: self.init,
        }
    }
}

/// An N-bit saturating counter used to follow the behavior of a branch.
///
/// The lower half of the range predicts not-taken and the upper half
/// predicts taken. For 2-bit counters, the values are:
///
/// - 0: strongly not-taken
/// - 1: weakly not-taken
/// - 2: weakly taken
/// - 3: strongly taken
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaturatingCounter {
    cfg: SaturatingCounterConfig,
    ctr: u8,
}
impl SaturatingCounter {
    pub const STRONGLY_NOT_TAKEN: u8 = 0;
    pub const WEAKLY_NOT_TAKEN: u8 = 1;
    pub const WEAKLY_TAKEN: u8 = 2;
    pub const STRONGLY_TAKEN: u8 = 3;

    /// Return the current value of the counter.
    pub fn value(&self) -> u8 { self.ctr }

    /// Set the current value of the counter (clamped to the counter range).
    pub fn set_value(&mut self, val: u8) {
        self.ctr = val.min(self.cfg.max);
    }

    pub fn inc(&mut self) {
        if self.ctr < self.cfg.max {
            self.ctr += 1;
        }
    }

    pub fn dec(&mut self) {
        self.ctr = self.ctr.saturating_sub(1);
    }
}

impl StatefulPredictor for SaturatingCounter {
    fn predict(&self) -> Outcome { Outcome::from(self.ctr > self.cfg.max / 2) }
    fn reset(&mut self) { self.ctr = self.cfg.init; }
    fn update(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::T => self.inc(),
            Outcome::N => self.dec(),
        }
    }
}
