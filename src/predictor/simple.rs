
use crate::branch::Outcome;
use crate::predictor::BranchPredictor;

/// A simple predictor with no state: always predict 'taken'.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaticPredictor;
impl BranchPredictor for StaticPredictor {
    fn name(&self) -> &'static str { "Static" }
    fn reset(&mut self) {}
    fn predict(&self, _pc: u32) -> Outcome { Outcome::T }
    fn train(&mut self, _pc: u32, _outcome: Outcome) {}
    fn storage_bits(&self) -> usize { 0 }
}
