//! Implementation of a "gshare" predictor.
//!
//! See "Combining Branch Predictors" (McFarling, 1993).

use crate::branch::Outcome;
use crate::history::*;
use crate::predictor::*;

/// Configuration for a [`GsharePredictor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GshareConfig {
    /// Number of global history bits (and index bits)
    pub history_bits: u32,

    /// Parameters for the saturating counters
    pub ctr: SaturatingCounterConfig,
}
impl GshareConfig {
    pub fn new(history_bits: u32) -> Self {
        Self {
            history_bits,
            ctr: SaturatingCounterConfig::two_bit(
                SaturatingCounter::WEAKLY_NOT_TAKEN
            ),
        }
    }

    /// Get the [approximate] number of storage bits.
    pub fn storage_bits(&self) -> usize {
        self.ctr.storage_bits() * (1 << self.history_bits)
            + self.history_bits as usize
    }

    pub fn build(self) -> GsharePredictor {
        let ghist = ShiftRegister::new(self.history_bits);
        let pht = CounterTable::new(self.history_bits, self.ctr);
        assert_eq!(pht.index_mask(), ghist.mask());
        GsharePredictor { cfg: self, ghist, pht }
    }
}

/// A single table of counters indexed by global history XOR'ed with the
/// program counter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GsharePredictor {
    cfg: GshareConfig,

    /// Global history register
    ghist: ShiftRegister,

    /// Pattern history table
    pht: CounterTable,
}
impl GsharePredictor {
    pub fn ghist(&self) -> &ShiftRegister { &self.ghist }
    pub fn pht(&self) -> &CounterTable { &self.pht }

    /// Index into the PHT for the branch at 'pc'.
    pub fn index(&self, pc: u32) -> usize {
        let mask = self.ghist.mask();
        let hist = self.ghist.value() & mask;
        let pc = pc as usize & mask;
        self.pht.get_index(hist ^ pc)
    }
}

impl BranchPredictor for GsharePredictor {
    fn name(&self) -> &'static str { "Gshare" }

    fn reset(&mut self) {
        self.ghist.clear();
        self.pht.reset();
    }

    fn predict(&self, pc: u32) -> Outcome {
        self.pht.get_entry(self.index(pc)).predict()
    }

    fn train(&mut self, pc: u32, outcome: Outcome) {
        let idx = self.index(pc);
        self.pht.get_entry_mut(idx).update(outcome);
        self.ghist.push(outcome);
    }

    fn storage_bits(&self) -> usize { self.cfg.storage_bits() }
}
