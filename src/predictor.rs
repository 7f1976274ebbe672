//! Implementations of different branch predictors.

pub mod table;
pub mod simple;
pub mod counter;
pub mod gshare;
pub mod tournament;
pub mod perceptron;

pub use table::*;
pub use simple::*;
pub use counter::*;
pub use gshare::*;
pub use tournament::*;
pub use perceptron::*;

use crate::branch::Outcome;

/// Interface to a predictor with some internal state which is only subject to
/// change by the correct branch outcome.
pub trait StatefulPredictor {
    /// Reset the internal state of the predictor.
    fn reset(&mut self);

    /// Return the current predicted outcome.
    fn predict(&self) -> Outcome;

    /// Update the internal state of the predictor with the correct outcome.
    fn update(&mut self, outcome: Outcome);
}

/// Interface to a predictor which makes a prediction for a particular
/// program counter value, and is later trained with the resolved outcome.
pub trait BranchPredictor {
    fn name(&self) -> &'static str;

    /// Reset the predictor to the state it was built in.
    fn reset(&mut self);

    /// Return the predicted outcome for the branch at 'pc'.
    /// This never changes the state of the predictor.
    fn predict(&self, pc: u32) -> Outcome;

    /// Update the predictor with the resolved outcome of the branch at 'pc'.
    fn train(&mut self, pc: u32, outcome: Outcome);

    /// Get the [approximate] number of storage bits.
    fn storage_bits(&self) -> usize;
}
