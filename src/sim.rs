//! The predictor core driven by a trace-driven simulator.
//!
//! The simulator calls [`BranchPredictor::predict`] when a conditional
//! branch is fetched, and [`BranchPredictor::train`] once the outcome of
//! the same branch has been resolved.

use log::{ debug, info };

use crate::branch::Outcome;
use crate::config::*;
use crate::error::ConfigError;
use crate::predictor::*;

/// The active predictor. Only the state for the selected scheme exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PredictorCore {
    Static(StaticPredictor),
    Gshare(GsharePredictor),
    Tournament(TournamentPredictor),
    Perceptron(PerceptronPredictor),
}
impl PredictorCore {
    /// Validate the configuration and build the selected predictor.
    pub fn initialize(cfg: &PredictorConfig) -> Result<Self, ConfigError> {
        let geometry = cfg.validate()?;
        let core = match cfg.scheme {
            Scheme::Static => Self::Static(StaticPredictor),
            Scheme::Gshare => {
                Self::Gshare(GshareConfig::new(geometry.ghistory_bits).build())
            },
            Scheme::Tournament => {
                Self::Tournament(TournamentConfig::new(geometry).build())
            },
            Scheme::TournamentAlt => {
                Self::Tournament(TournamentConfig::alt().build())
            },
            Scheme::Perceptron => {
                Self::Perceptron(PerceptronPredictor::new(cfg.perceptron))
            },
        };
        info!("initialized {} predictor ({:?}, {} storage bits)",
            core.name(), geometry, core.storage_bits());
        Ok(core)
    }

    /// Build a predictor from a scheme and the driver's bit-widths.
    pub fn new(scheme: Scheme, ghistory_bits: i32, lhistory_bits: i32,
        pc_index_bits: i32) -> Result<Self, ConfigError>
    {
        let cfg = PredictorConfig::new(
            scheme, ghistory_bits, lhistory_bits, pc_index_bits
        );
        Self::initialize(&cfg)
    }

    /// The scheme this predictor was built for.
    pub fn scheme(&self) -> Scheme {
        match self {
            Self::Static(_) => Scheme::Static,
            Self::Gshare(_) => Scheme::Gshare,
            Self::Tournament(p) => match p.config().global_index {
                GlobalIndex::History => Scheme::Tournament,
                GlobalIndex::HistoryXorPc => Scheme::TournamentAlt,
            },
            Self::Perceptron(_) => Scheme::Perceptron,
        }
    }
}

impl BranchPredictor for PredictorCore {
    fn name(&self) -> &'static str {
        match self {
            Self::Static(p) => p.name(),
            Self::Gshare(p) => p.name(),
            Self::Tournament(p) => p.name(),
            Self::Perceptron(p) => p.name(),
        }
    }

    fn reset(&mut self) {
        debug!("reset {} predictor", self.name());
        match self {
            Self::Static(p) => p.reset(),
            Self::Gshare(p) => p.reset(),
            Self::Tournament(p) => p.reset(),
            Self::Perceptron(p) => p.reset(),
        }
    }

    #[inline(always)]
    fn predict(&self, pc: u32) -> Outcome {
        match self {
            Self::Static(p) => p.predict(pc),
            Self::Gshare(p) => p.predict(pc),
            Self::Tournament(p) => p.predict(pc),
            Self::Perceptron(p) => p.predict(pc),
        }
    }

    #[inline(always)]
    fn train(&mut self, pc: u32, outcome: Outcome) {
        match self {
            Self::Static(p) => p.train(pc, outcome),
            Self::Gshare(p) => p.train(pc, outcome),
            Self::Tournament(p) => p.train(pc, outcome),
            Self::Perceptron(p) => p.train(pc, outcome),
        }
    }

    fn storage_bits(&self) -> usize {
        match self {
            Self::Static(p) => p.storage_bits(),
            Self::Gshare(p) => p.storage_bits(),
            Self::Tournament(p) => p.storage_bits(),
            Self::Perceptron(p) => p.storage_bits(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const ALL_SCHEMES: [Scheme; 5] = [
        Scheme::Static,
        Scheme::Gshare,
        Scheme::Tournament,
        Scheme::TournamentAlt,
        Scheme::Perceptron,
    ];

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn build(scheme: Scheme) -> PredictorCore {
        PredictorCore::new(scheme, 10, 8, 8).unwrap()
    }

    /// A trace of branches from a small set of PCs, with outcomes that
    /// are partly correlated with each other.
    fn random_trace(seed: u64, len: usize) -> Vec<(u32, Outcome)> {
        let mut rng = StdRng::seed_from_u64(seed);
        let pcs: Vec<u32> = (0..16).map(|_| rng.gen()).collect();
        let mut last = false;
        (0..len).map(|i| {
            let pc = pcs[rng.gen_range(0..pcs.len())];
            let taken = if i % 3 == 0 { !last } else { rng.gen_bool(0.7) };
            last = taken;
            (pc, Outcome::from(taken))
        }).collect()
    }

    fn run(core: &mut PredictorCore, trace: &[(u32, Outcome)]) -> Vec<Outcome> {
        trace.iter().map(|(pc, outcome)| {
            let prediction = core.predict(*pc);
            core.train(*pc, *outcome);
            prediction
        }).collect()
    }

    fn counter_tables(core: &PredictorCore) -> Vec<&CounterTable> {
        match core {
            PredictorCore::Gshare(p) => vec![p.pht()],
            PredictorCore::Tournament(p) => {
                vec![p.local_pht(), p.global_pht(), p.choice_pht()]
            },
            _ => vec![],
        }
    }

    #[test]
    fn initialize_each_scheme() {
        init_logger();
        for scheme in ALL_SCHEMES {
            let core = build(scheme);
            assert_eq!(core.scheme(), scheme);
            assert_eq!(core.name(), scheme.name());
        }
    }

    #[test]
    fn initialize_errors() {
        init_logger();
        assert!(matches!(PredictorCore::new(Scheme::Gshare, -2, 0, 0),
            Err(ConfigError::NegativeWidth { .. })));
        assert!(matches!(PredictorCore::new(Scheme::Perceptron, 0, -1, 0),
            Err(ConfigError::NegativeWidth { .. })));
        assert!(matches!(PredictorCore::new(Scheme::Tournament, 0, 0, 40),
            Err(ConfigError::WidthTooLarge { .. })));

        let mut cfg = PredictorConfig::new(Scheme::Perceptron, 0, 0, 0);
        cfg.perceptron.table_size = 3;
        assert!(PredictorCore::initialize(&cfg).is_err());
    }

    #[test]
    fn gshare_worked_example() {
        init_logger();
        let mut core = PredictorCore::new(Scheme::Gshare, 2, 0, 0).unwrap();
        assert_eq!(core.predict(0b1010), Outcome::N);
        core.train(0b1010, Outcome::T);
        let PredictorCore::Gshare(p) = &core else { panic!("not gshare") };
        assert_eq!(p.pht().values().collect::<Vec<_>>(), vec![1, 1, 2, 1]);
        assert_eq!(p.ghist().value(), 0b01);
        assert_eq!(core.predict(0b1010), Outcome::N);
    }

    #[test]
    fn tournament_alt_ignores_widths() {
        init_logger();
        let core = PredictorCore::new(Scheme::TournamentAlt, 1, 1, 1).unwrap();
        let PredictorCore::Tournament(p) = &core else { panic!("not tournament") };
        assert_eq!(p.config().geometry, TOURNAMENT_ALT_GEOMETRY);
    }

    #[test]
    fn static_is_always_taken() {
        init_logger();
        for (g, l, p) in [(0, 0, 0), (4, 4, 4), (24, 24, 24)] {
            let mut core = PredictorCore::new(Scheme::Static, g, l, p).unwrap();
            let fresh = core.clone();
            for (pc, outcome) in random_trace(7, 500) {
                assert_eq!(core.predict(pc), Outcome::T);
                core.train(pc, outcome);
            }
            assert_eq!(core.predict(u32::MAX), Outcome::T);
            assert_eq!(core, fresh);
        }
    }

    #[test]
    fn deterministic() {
        init_logger();
        let trace = random_trace(0x5eed, 5000);
        for scheme in ALL_SCHEMES {
            let mut a = build(scheme);
            let mut b = build(scheme);
            let pa = run(&mut a, &trace);
            let pb = run(&mut b, &trace);
            assert_eq!(pa, pb, "{}", scheme);
            assert_eq!(a, b, "{}", scheme);
        }
    }

    #[test]
    fn predict_does_not_change_state() {
        init_logger();
        let trace = random_trace(3, 1000);
        for scheme in ALL_SCHEMES {
            let mut core = build(scheme);
            run(&mut core, &trace);
            let before = core.clone();
            for (pc, _) in trace.iter().take(100) {
                core.predict(*pc);
            }
            assert_eq!(core, before, "{}", scheme);
        }
    }

    // Training without a preceding prediction gives the same result as
    // training after one.
    #[test]
    fn train_does_not_depend_on_predict() {
        init_logger();
        let trace = random_trace(11, 2000);
        for scheme in ALL_SCHEMES {
            let mut a = build(scheme);
            let mut b = build(scheme);
            run(&mut a, &trace);
            for (pc, outcome) in trace.iter() {
                b.train(*pc, *outcome);
            }
            assert_eq!(a, b, "{}", scheme);
        }
    }

    #[test]
    fn learns_biased_branches() {
        init_logger();
        let trace: Vec<(u32, Outcome)> = (0..4000u32)
            .map(|i| {
                let pc = 0x1000 + 4 * (i % 4);
                (pc, Outcome::from(pc & 0x4 == 0))
            })
            .collect();
        for scheme in [Scheme::Gshare, Scheme::Tournament, Scheme::Perceptron] {
            let mut core = build(scheme);
            let predictions = run(&mut core, &trace);
            let hits = predictions.iter().zip(trace.iter())
                .skip(2000)
                .filter(|(p, (_, o))| *p == o)
                .count();
            assert_eq!(hits, 2000, "{}", scheme);
        }
    }

    #[test]
    fn reset_restores_initial_state() {
        init_logger();
        let trace = random_trace(99, 500);
        for scheme in ALL_SCHEMES {
            let mut core = build(scheme);
            let fresh = core.clone();
            run(&mut core, &trace);
            core.reset();
            assert_eq!(core, fresh, "{}", scheme);
        }
    }

    // Independent copies can be replayed on other threads.
    #[test]
    fn predictor_is_send() {
        fn assert_send<T: Send + Clone>() {}
        assert_send::<PredictorCore>();
    }

    #[test]
    fn saturated_perceptron_stays_bounded() {
        init_logger();
        let mut core = build(Scheme::Perceptron);
        for i in 0..20_000u32 {
            let outcome = Outcome::from(i % 7 != 0);
            core.train(0x400 + (i % 3), outcome);
        }
        let PredictorCore::Perceptron(p) = &core else { panic!("not perceptron") };
        let theta = p.config().threshold();
        for row in p.table().iter() {
            assert!(i32::from(row.bias()).abs() <= BIAS_LIMIT);
            assert!(row.weights().iter().all(|w| i32::from(*w).abs() <= theta));
        }
    }

    fn arb_trace() -> impl Strategy<Value = Vec<(u32, bool)>> {
        prop::collection::vec((0u32..64, any::<bool>()), 0..600)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn counters_stay_in_range(trace in arb_trace(), g in 0i32..6,
            l in 0i32..6, p in 0i32..6)
        {
            for scheme in [Scheme::Gshare, Scheme::Tournament] {
                let mut core = PredictorCore::new(scheme, g, l, p).unwrap();
                for (pc, taken) in trace.iter() {
                    core.train(*pc, Outcome::from(*taken));
                }
                for table in counter_tables(&core) {
                    prop_assert!(table.values().all(|v| v <= 3));
                }
            }
        }

        #[test]
        fn perceptron_weights_stay_in_range(trace in arb_trace()) {
            let mut cfg = PredictorConfig::new(Scheme::Perceptron, 0, 0, 0);
            cfg.perceptron = PerceptronConfig { table_size: 8, history_len: 12 };
            let mut core = PredictorCore::initialize(&cfg).unwrap();
            for (pc, taken) in trace.iter() {
                core.train(*pc, Outcome::from(*taken));
            }
            let PredictorCore::Perceptron(p) = &core else { unreachable!() };
            let theta = cfg.perceptron.threshold();
            for row in p.table().iter() {
                prop_assert!(i32::from(row.bias()).abs() <= BIAS_LIMIT);
                prop_assert!(row.weights().iter()
                    .all(|w| i32::from(*w).abs() <= theta));
            }
        }
    }
}
