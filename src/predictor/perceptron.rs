//! Implementation of a perceptron predictor.

use bitvec::prelude::*;
use itertools::Itertools;
use log::trace;

use crate::branch::Outcome;
use crate::config::PerceptronConfig;
use crate::history::*;
use crate::predictor::*;

/// Limit on the magnitude of the bias weight.
pub const BIAS_LIMIT: i32 = 128;

/// Number of bits needed to hold a signed value in `[-limit, limit]`.
fn signed_bits(limit: i32) -> usize {
    (u32::BITS - limit.unsigned_abs().leading_zeros()) as usize + 1
}

/// Output from a [Perceptron]: the raw sum, and the predicted direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerceptronOutput {
    pub sum: i32,
    pub outcome: Outcome,
}
impl PerceptronOutput {
    /// Confidence in this prediction.
    pub fn magnitude(&self) -> u32 { self.sum.unsigned_abs() }
}

/// Perceptron [with integer weights].
///
/// Each weight corresponds to one bit of global history. A history bit set
/// to '1' contributes the weight to the output, and a bit set to '0'
/// contributes the negated weight.
///
/// See the following papers:
///
/// - "Dynamic Branch Prediction with Perceptrons" (Jiménez and Lin, 2001)
/// - "Neural Methods for Dynamic Branch Prediction" (Jiménez and Lin, 2002)
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Perceptron {
    bias: i16,
    weights: Box<[i16]>,
}
impl Perceptron {
    pub fn new(len: usize) -> Self {
        Self { bias: 0, weights: vec![0; len].into_boxed_slice() }
    }

    /// Reset the state.
    pub fn reset(&mut self) {
        self.bias = 0;
        self.weights.fill(0);
    }

    pub fn bias(&self) -> i16 { self.bias }

    /// Return a reference to the list of weights.
    pub fn weights(&self) -> &[i16] { &self.weights }

    /// Compute the dot product of the input/weight vectors
    fn dot_product(&self, input: &BitSlice<usize, Lsb0>) -> i32 {
        self.weights.iter().zip_eq(input.iter().by_vals())
            .map(|(w, x)| if x { i32::from(*w) } else { -i32::from(*w) })
            .sum()
    }

    /// Given some input vector, compute the output value.
    /// The predicted outcome is determined by the sign of the output.
    pub fn output(&self, input: &BitSlice<usize, Lsb0>) -> PerceptronOutput {
        let sum = i32::from(self.bias) + self.dot_product(input);
        let outcome = if sum >= 0 { Outcome::T } else { Outcome::N };
        PerceptronOutput { sum, outcome }
    }

    /// Given some outcome, adjust the weights.
    ///
    /// Returns the output computed from the state *before* training.
    pub fn train(&mut self, input: &BitSlice<usize, Lsb0>, outcome: Outcome,
        theta: i32) -> PerceptronOutput
    {
        let output = self.output(input);

        // Training occurs after a misprediction, or when the output value is
        // not above the threshold.
        let miss = output.outcome != outcome;
        let below_threshold = output.magnitude() <= theta.unsigned_abs();
        if !(miss || below_threshold) {
            return output;
        }

        let bias = i32::from(self.bias) + outcome.sign();
        self.bias = bias.clamp(-BIAS_LIMIT, BIAS_LIMIT) as i16;

        // When a bit in the history matches the outcome, increment the
        // corresponding weight. Otherwise, decrement the corresponding weight.
        for (w, x) in self.weights.iter_mut().zip_eq(input.iter().by_vals()) {
            let adj = if Outcome::from(x) == outcome { 1 } else { -1 };
            *w = (i32::from(*w) + adj).clamp(-theta, theta) as i16;
        }
        output
    }
}

/// A table of [Perceptron] indexed by the low bits of some key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerceptronTable {
    data: Vec<Perceptron>,
}
impl PerceptronTable {
    pub fn new(size: usize, history_len: usize) -> Self {
        assert!(size.is_power_of_two());
        Self { data: vec![Perceptron::new(history_len); size] }
    }

    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|p| p.reset());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Perceptron> {
        self.data.iter()
    }
}

impl PredictorTable for PerceptronTable {
    type Input = usize;
    type Entry = Perceptron;

    fn size(&self) -> usize { self.data.len() }

    fn get_index(&self, key: usize) -> usize {
        key & self.index_mask()
    }

    fn get_entry(&self, idx: usize) -> &Perceptron {
        let index = idx & self.index_mask();
        &self.data[index]
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut Perceptron {
        let index = idx & self.index_mask();
        &mut self.data[index]
    }
}

/// A table of perceptrons sharing a single global history register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerceptronPredictor {
    cfg: PerceptronConfig,

    /// Global history register
    ghr: HistoryRegister,

    /// Table of perceptrons
    table: PerceptronTable,

    /// Magnitude of the output computed during the most recent update
    steps: u32,
}
impl PerceptronPredictor {
    /// Build a predictor from a *validated* configuration.
    pub fn new(cfg: PerceptronConfig) -> Self {
        Self {
            ghr: HistoryRegister::new(cfg.history_len),
            table: PerceptronTable::new(cfg.table_size, cfg.history_len),
            steps: 0,
            cfg,
        }
    }

    pub fn config(&self) -> &PerceptronConfig { &self.cfg }
    pub fn ghr(&self) -> &HistoryRegister { &self.ghr }
    pub fn table(&self) -> &PerceptronTable { &self.table }
    pub fn steps(&self) -> u32 { self.steps }

    /// Select a perceptron by hashing the program counter with the most
    /// recent word of global history.
    pub fn index(&self, pc: u32) -> usize {
        let mask = self.table.index_mask();
        let pc = pc as usize & mask;
        let hist = self.ghr.first_word() as usize & mask;
        self.table.get_index(pc ^ hist)
    }

    /// Compute the output of the perceptron selected for 'pc'.
    pub fn output(&self, pc: u32) -> PerceptronOutput {
        self.table.get_entry(self.index(pc)).output(self.ghr.data())
    }
}

impl BranchPredictor for PerceptronPredictor {
    fn name(&self) -> &'static str { "Perceptron" }

    fn reset(&mut self) {
        self.ghr.clear();
        self.table.reset();
        self.steps = 0;
    }

    fn predict(&self, pc: u32) -> Outcome {
        self.output(pc).outcome
    }

    fn train(&mut self, pc: u32, outcome: Outcome) {
        let idx = self.index(pc);
        let theta = self.cfg.threshold();
        let output = self.table.get_entry_mut(idx)
            .train(self.ghr.data(), outcome, theta);
        self.steps = output.magnitude();
        trace!("perceptron[{}] pc={:#010x} sum={} outcome={:?}",
            idx, pc, output.sum, outcome);

        self.ghr.push(outcome);
    }

    fn storage_bits(&self) -> usize {
        let row = signed_bits(BIAS_LIMIT)
            + self.cfg.history_len * signed_bits(self.cfg.threshold());
        self.cfg.table_size * row + self.cfg.history_len
    }
}
