//! Implementation of a tournament predictor.
//!
//! A local predictor (per-branch history selecting a counter) and a global
//! predictor (global history selecting a counter) both make a prediction,
//! and a table of "choice" counters decides which one to use.
//!
//! See "Combining Branch Predictors" (McFarling, 1993) and the Alpha 21264.

use crate::branch::Outcome;
use crate::config::{ Geometry, TOURNAMENT_ALT_GEOMETRY };
use crate::history::*;
use crate::predictor::*;

/// Strategy for forming an index into the global and choice tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GlobalIndex {
    /// Use global history alone
    #[default]
    History,
    /// Global history XOR'ed with the program counter (as in gshare)
    HistoryXorPc,
}

/// Identifies the component providing a [`TournamentPrediction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TournamentProvider {
    Local,
    Global,
}

/// Container for output from [`TournamentPredictor::lookup`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TournamentPrediction {
    /// The final predicted direction
    pub outcome: Outcome,

    /// The component selected by the choice table
    pub provider: TournamentProvider,

    /// Predicted direction from the local component
    pub local: Outcome,

    /// Predicted direction from the global component
    pub global: Outcome,

    /// Index into the global and choice tables
    pub global_idx: usize,

    /// Index into the local history table
    pub bht_idx: usize,

    /// Index into the local pattern history table
    pub local_idx: usize,
}

/// Configuration for a [`TournamentPredictor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TournamentConfig {
    /// Table widths
    pub geometry: Geometry,

    /// Strategy for indexing the global and choice tables
    pub global_index: GlobalIndex,

    /// Parameters for the local and global counters
    pub ctr: SaturatingCounterConfig,

    /// Parameters for the choice counters
    pub choice_ctr: SaturatingCounterConfig,
}
impl TournamentConfig {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            global_index: GlobalIndex::History,
            ctr: SaturatingCounterConfig::two_bit(
                SaturatingCounter::WEAKLY_NOT_TAKEN
            ),
            // Start out weakly preferring the global predictor
            choice_ctr: SaturatingCounterConfig::two_bit(
                SaturatingCounter::WEAKLY_TAKEN
            ),
        }
    }

    /// The fixed-size preset with gshare-style global indexing.
    pub fn alt() -> Self {
        Self {
            global_index: GlobalIndex::HistoryXorPc,
            ..Self::new(TOURNAMENT_ALT_GEOMETRY)
        }
    }

    /// Get the [approximate] number of storage bits.
    pub fn storage_bits(&self) -> usize {
        let g = self.geometry.ghistory_bits;
        let l = self.geometry.lhistory_bits;
        let p = self.geometry.pc_index_bits;
        let global = self.ctr.storage_bits() << g;
        let choice = self.choice_ctr.storage_bits() << g;
        let local = self.ctr.storage_bits() << l;
        let bht = (l as usize) << p;
        global + choice + local + bht + g as usize
    }

    pub fn build(self) -> TournamentPredictor {
        let g = self.geometry.ghistory_bits;
        let l = self.geometry.lhistory_bits;
        let p = self.geometry.pc_index_bits;
        let ghist = ShiftRegister::new(g);
        let local_bht = LocalHistoryTable::new(p, l);
        let local_pht = CounterTable::new(l, self.ctr);
        let global_pht = CounterTable::new(g, self.ctr);
        let choice_pht = CounterTable::new(g, self.choice_ctr);

        // Each table is indexed by a key no wider than its own mask.
        assert_eq!(global_pht.index_mask(), ghist.mask());
        assert_eq!(choice_pht.index_mask(), ghist.mask());
        assert_eq!(local_pht.index_mask(), width_mask(l));
        assert_eq!(local_bht.index_mask(), width_mask(p));
        TournamentPredictor {
            cfg: self,
            ghist,
            local_bht,
            local_pht,
            global_pht,
            choice_pht,
        }
    }
}

/// Local and global predictors arbitrated by a choice predictor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TournamentPredictor {
    cfg: TournamentConfig,

    /// Global history register
    ghist: ShiftRegister,

    /// Per-branch local history
    local_bht: LocalHistoryTable,

    /// Counters indexed by local history
    local_pht: CounterTable,

    /// Counters indexed by global history
    global_pht: CounterTable,

    /// Choice counters: low values select the local component, and high
    /// values select the global component
    choice_pht: CounterTable,
}
impl TournamentPredictor {
    pub fn config(&self) -> &TournamentConfig { &self.cfg }
    pub fn ghist(&self) -> &ShiftRegister { &self.ghist }
    pub fn local_bht(&self) -> &LocalHistoryTable { &self.local_bht }
    pub fn local_pht(&self) -> &CounterTable { &self.local_pht }
    pub fn global_pht(&self) -> &CounterTable { &self.global_pht }
    pub fn choice_pht(&self) -> &CounterTable { &self.choice_pht }

    fn global_index(&self, pc: u32) -> usize {
        let mask = self.ghist.mask();
        let hist = self.ghist.value() & mask;
        let key = match self.cfg.global_index {
            GlobalIndex::History => hist,
            GlobalIndex::HistoryXorPc => hist ^ (pc as usize & mask),
        };
        self.global_pht.get_index(key)
    }

    /// Read both components and the choice table for the branch at 'pc'.
    pub fn lookup(&self, pc: u32) -> TournamentPrediction {
        let global_idx = self.global_index(pc);
        let bht_idx = self.local_bht.get_index(pc);
        let lhist = self.local_bht.get_entry(bht_idx);
        let local_idx = self.local_pht.get_index(lhist.value() & lhist.mask());

        let local = self.local_pht.get_entry(local_idx).predict();
        let global = self.global_pht.get_entry(global_idx).predict();

        let choice = self.choice_pht.get_entry(global_idx).value();
        let (provider, outcome) = if choice < SaturatingCounter::WEAKLY_TAKEN {
            (TournamentProvider::Local, local)
        } else {
            (TournamentProvider::Global, global)
        };

        TournamentPrediction {
            outcome,
            provider,
            local,
            global,
            global_idx,
            bht_idx,
            local_idx,
        }
    }
}

impl BranchPredictor for TournamentPredictor {
    fn name(&self) -> &'static str {
        match self.cfg.global_index {
            GlobalIndex::History => "Tournament",
            GlobalIndex::HistoryXorPc => "Tournament2",
        }
    }

    fn reset(&mut self) {
        self.ghist.clear();
        self.local_bht.reset();
        self.local_pht.reset();
        self.global_pht.reset();
        self.choice_pht.reset();
    }

    fn predict(&self, pc: u32) -> Outcome {
        self.lookup(pc).outcome
    }

    fn train(&mut self, pc: u32, outcome: Outcome) {
        let p = self.lookup(pc);
        let local_hit = p.local == outcome;
        let global_hit = p.global == outcome;

        // Only move the choice counter when exactly one component was right
        let choice = self.choice_pht.get_entry_mut(p.global_idx);
        match (global_hit, local_hit) {
            (true, false) => choice.inc(),
            (false, true) => choice.dec(),
            _ => {},
        }

        self.global_pht.get_entry_mut(p.global_idx).update(outcome);
        self.local_pht.get_entry_mut(p.local_idx).update(outcome);

        self.local_bht.get_entry_mut(p.bht_idx).push(outcome);
        self.ghist.push(outcome);
    }

    fn storage_bits(&self) -> usize { self.cfg.storage_bits() }
}

#[cfg(test)]
mod test {
    use super::*;

    fn geometry(g: u32, l: u32, p: u32) -> Geometry {
        Geometry { ghistory_bits: g, lhistory_bits: l, pc_index_bits: p }
    }

    #[test]
    fn initial_state() {
        let p = TournamentConfig::new(geometry(4, 3, 2)).build();
        assert_eq!(p.global_pht().size(), 16);
        assert_eq!(p.choice_pht().size(), 16);
        assert_eq!(p.local_pht().size(), 8);
        assert_eq!(p.local_bht().size(), 4);
        assert!(p.global_pht().values().all(|v| v == 1));
        assert!(p.local_pht().values().all(|v| v == 1));
        assert!(p.choice_pht().values().all(|v| v == 2));

        let pred = p.lookup(0x1234);
        assert_eq!(pred.provider, TournamentProvider::Global);
        assert_eq!(pred.outcome, Outcome::N);
    }

    // A branch alternating between taken and not-taken. With no global
    // history, the global component is wrong every time, while one bit of
    // local history is enough for the local component to learn it.
    #[test]
    fn choice_follows_local() {
        let mut p = TournamentConfig::new(geometry(0, 1, 0)).build();
        let pc = 0x40;
        for i in 0..20 {
            p.train(pc, Outcome::from(i % 2 == 0));
        }
        assert_eq!(p.choice_pht().get_entry(0).value(), 0);

        let pred = p.lookup(pc);
        assert_eq!(pred.provider, TournamentProvider::Local);
        assert_eq!(pred.local, Outcome::T);
        assert_eq!(pred.global, Outcome::N);
        assert_eq!(p.predict(pc), Outcome::T);
    }

    #[test]
    fn choice_unchanged_when_both_agree() {
        let mut p = TournamentConfig::new(geometry(2, 2, 2)).build();
        let pred = p.lookup(0);
        p.global_pht.get_entry_mut(pred.global_idx).set_value(3);
        p.local_pht.get_entry_mut(pred.local_idx).set_value(3);

        p.train(0, Outcome::T);
        assert_eq!(p.choice_pht().get_entry(pred.global_idx).value(), 2);

        // Both wrong
        let pred = p.lookup(0);
        p.global_pht.get_entry_mut(pred.global_idx).set_value(3);
        p.local_pht.get_entry_mut(pred.local_idx).set_value(3);
        p.train(0, Outcome::N);
        assert_eq!(p.choice_pht().get_entry(pred.global_idx).value(), 2);
    }

    #[test]
    fn choice_moves_toward_global() {
        let mut p = TournamentConfig::new(geometry(2, 2, 2)).build();
        let pred = p.lookup(0);
        p.global_pht.get_entry_mut(pred.global_idx).set_value(2);
        p.train(0, Outcome::T);
        assert_eq!(p.choice_pht().get_entry(pred.global_idx).value(), 3);
    }

    // Global and local histories are kept masked to their configured widths
    // on every update; an unmasked register would only differ when read back
    // directly.
    #[test]
    fn histories_are_masked() {
        let mut p = TournamentConfig::new(geometry(3, 2, 4)).build();
        for _ in 0..8 {
            p.train(0x35, Outcome::T);
        }
        assert_eq!(p.ghist().value(), 0b111);
        let bht = p.local_bht();
        assert_eq!(bht.get_entry(bht.get_index(0x35)).value(), 0b11);
        assert_eq!(bht.get_entry(bht.get_index(0x36)).value(), 0);
    }

    #[test]
    fn alt_preset_uses_pc_in_global_index() {
        let p = TournamentConfig::alt().build();
        assert_eq!(p.name(), "Tournament2");
        assert_eq!(p.global_pht().size(), 1 << 13);
        assert_eq!(p.local_bht().size(), 1 << 11);
        assert_eq!(p.lookup(0x1abc).global_idx, 0x1abc);
        assert_eq!(p.lookup(0xffff_1abc).global_idx, 0x1abc);

        let p = TournamentConfig::new(TOURNAMENT_ALT_GEOMETRY).build();
        assert_eq!(p.lookup(0x1abc).global_idx, 0);
    }

    #[test]
    fn table_masks_match_register_widths() {
        for (g, l, p) in [(0, 0, 0), (1, 5, 3), (12, 10, 8), (13, 11, 11)] {
            let t = TournamentConfig::new(geometry(g, l, p)).build();
            assert_eq!(t.global_pht().index_mask(), t.ghist().mask());
            assert_eq!(t.global_pht().size(), 1 << g);
            assert_eq!(t.local_pht().size(), 1 << l);
            assert_eq!(t.local_bht().size(), 1 << p);
        }
    }

    #[test]
    fn alt_preset_storage() {
        // Tables, plus 13 bits of global history
        assert_eq!(TournamentConfig::alt().storage_bits(), 59392 + 13);
    }
}
