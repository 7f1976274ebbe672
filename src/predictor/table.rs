//! Types for implementing a table of predictors.

use crate::history::*;
use crate::predictor::*;

/// Interface to a table of predictors.
pub trait PredictorTable {
    /// The type of input to the table used to form an index.
    type Input;

    /// The type of entry in the table.
    type Entry;

    /// Returns the number of entries in the table.
    fn size(&self) -> usize;

    /// Given some input, return the corresponding index into the table.
    fn get_index(&self, input: Self::Input) -> usize;

    /// Returns a reference to an entry in the table.
    fn get_entry(&self, idx: usize) -> &Self::Entry;

    /// Returns a mutable reference to an entry in the table.
    fn get_entry_mut(&mut self, idx: usize) -> &mut Self::Entry;

    /// Returns a bitmask corresponding to the number of entries in the table.
    fn index_mask(&self) -> usize {
        assert!(self.size().is_power_of_two());
        self.size() - 1
    }
}

/// A pattern history table: 2^bits [SaturatingCounter] indexed by the low
/// bits of some key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterTable {
    /// Saturating counter configuration
    cfg: SaturatingCounterConfig,

    /// Table of counters
    data: Vec<SaturatingCounter>,

    /// Number of index bits
    bits: u32,
}
impl CounterTable {
    pub fn new(bits: u32, cfg: SaturatingCounterConfig) -> Self {
        Self {
            cfg,
            data: vec![cfg.build(); 1usize << bits],
            bits,
        }
    }

    pub fn bits(&self) -> u32 { self.bits }

    /// Return the counter values in index order.
    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.data.iter().map(|c| c.value())
    }

    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|c| c.reset());
    }

    pub fn storage_bits(&self) -> usize {
        self.cfg.storage_bits() * self.size()
    }
}

impl PredictorTable for CounterTable {
    type Input = usize;
    type Entry = SaturatingCounter;

    fn size(&self) -> usize { self.data.len() }

    fn get_index(&self, key: usize) -> usize {
        key & self.index_mask()
    }

    fn get_entry(&self, idx: usize) -> &SaturatingCounter {
        let index = idx & self.index_mask();
        &self.data[index]
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut SaturatingCounter {
        let index = idx & self.index_mask();
        &mut self.data[index]
    }
}

/// A table of per-branch [ShiftRegister] indexed by the low bits of the
/// program counter. Each entry tracks the recent outcomes of one branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalHistoryTable {
    data: Vec<ShiftRegister>,
}
impl LocalHistoryTable {
    /// Create a table with 2^'index_bits' registers of 'history_bits' each.
    pub fn new(index_bits: u32, history_bits: u32) -> Self {
        Self {
            data: vec![ShiftRegister::new(history_bits); 1usize << index_bits],
        }
    }

    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|r| r.clear());
    }

    pub fn storage_bits(&self) -> usize {
        self.data.iter().map(|r| r.bits() as usize).sum()
    }
}

impl PredictorTable for LocalHistoryTable {
    type Input = u32;
    type Entry = ShiftRegister;

    fn size(&self) -> usize { self.data.len() }

    fn get_index(&self, pc: u32) -> usize {
        pc as usize & self.index_mask()
    }

    fn get_entry(&self, idx: usize) -> &ShiftRegister {
        let index = idx & self.index_mask();
        &self.data[index]
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut ShiftRegister {
        let index = idx & self.index_mask();
        &mut self.data[index]
    }
}
