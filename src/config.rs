//! Predictor configuration.
//!
//! A [`PredictorConfig`] is what the simulation driver hands us: the scheme
//! and the raw bit-widths it was given on the command line (or in a JSON
//! file). Nothing is allocated until the widths have been checked by
//! [`PredictorConfig::validate`].

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::Deserialize;

use crate::error::ConfigError;

/// The largest table index width we are willing to allocate for.
pub const MAX_TABLE_BITS: u32 = 24;

/// The longest history a perceptron may be configured with.
pub const MAX_PERCEPTRON_HISTORY: usize = 256;

/// Default number of perceptrons.
pub const PERCEPTRON_TABLE_SIZE: usize = 1024;

/// Default perceptron history length.
pub const PERCEPTRON_HISTORY_LEN: usize = 59;

/// Training threshold for a perceptron with 'history_len' inputs.
///
/// This is `floor(1.93 * history_len + 14)` from "Dynamic Branch Prediction
/// with Perceptrons" (Jiménez and Lin, 2001), computed in fixed point so it
/// can be used in constant expressions.
pub const fn perceptron_threshold(history_len: usize) -> i32 {
    ((193 * history_len + 1400) / 100) as i32
}

/// Selects one of the available prediction schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Scheme {
    /// Always predict taken.
    #[default]
    Static,
    /// Global history XOR'ed with the program counter.
    Gshare,
    /// Local and global predictors arbitrated by a choice table.
    Tournament,
    /// A fixed-size tournament preset with a gshare-indexed global table.
    TournamentAlt,
    /// Table of perceptrons.
    Perceptron,
}
impl Scheme {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "Static",
            Self::Gshare => "Gshare",
            Self::Tournament => "Tournament",
            Self::TournamentAlt => "Tournament2",
            Self::Perceptron => "Perceptron",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "gshare" => Ok(Self::Gshare),
            "tournament" => Ok(Self::Tournament),
            "tournament2" | "tournament-alt" | "tournamentalt" => {
                Ok(Self::TournamentAlt)
            },
            "perceptron" | "custom" => Ok(Self::Perceptron),
            _ => Err(ConfigError::UnknownScheme(s.to_string())),
        }
    }
}

impl TryFrom<String> for Scheme {
    type Error = ConfigError;
    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

/// Validated table widths (in bits) used to size a predictor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Number of bits of global history
    pub ghistory_bits: u32,
    /// Number of bits of local history
    pub lhistory_bits: u32,
    /// Number of program counter bits used to select a local history
    pub pc_index_bits: u32,
}

/// Widths used by [`Scheme::TournamentAlt`], regardless of configuration.
///
/// Total storage is 2^13 x 2 (global PHT) + 2^13 x 2 (choice PHT)
/// + 2^11 x 2 (local PHT) + 2^11 x 11 (local BHT) = 59392 bits.
pub const TOURNAMENT_ALT_GEOMETRY: Geometry = Geometry {
    ghistory_bits: 13,
    lhistory_bits: 11,
    pc_index_bits: 11,
};

/// Dimensions of a perceptron table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PerceptronConfig {
    /// Number of perceptrons
    pub table_size: usize,
    /// Number of history bits used as inputs to each perceptron
    pub history_len: usize,
}
impl Default for PerceptronConfig {
    fn default() -> Self {
        Self {
            table_size: PERCEPTRON_TABLE_SIZE,
            history_len: PERCEPTRON_HISTORY_LEN,
        }
    }
}
impl PerceptronConfig {
    /// Training threshold derived from the history length.
    pub fn threshold(&self) -> i32 { perceptron_threshold(self.history_len) }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_size = 1usize << MAX_TABLE_BITS;
        if !self.table_size.is_power_of_two() || self.table_size > max_size {
            return Err(ConfigError::InvalidPerceptronTable {
                size: self.table_size,
                max_bits: MAX_TABLE_BITS,
            });
        }
        if self.history_len == 0 || self.history_len > MAX_PERCEPTRON_HISTORY {
            return Err(ConfigError::InvalidHistoryLength {
                value: self.history_len,
                max: MAX_PERCEPTRON_HISTORY,
            });
        }
        Ok(())
    }
}

/// Configuration supplied by the simulation driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// The active prediction scheme
    pub scheme: Scheme,
    /// Number of bits used for global history
    pub ghistory_bits: i32,
    /// Number of bits used for local history
    pub lhistory_bits: i32,
    /// Number of bits used for the PC index
    pub pc_index_bits: i32,
    /// Perceptron table dimensions
    pub perceptron: PerceptronConfig,
}
impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            ghistory_bits: 14,
            lhistory_bits: 10,
            pc_index_bits: 10,
            perceptron: PerceptronConfig::default(),
        }
    }
}
impl PredictorConfig {
    pub fn new(scheme: Scheme, ghistory_bits: i32, lhistory_bits: i32,
        pc_index_bits: i32) -> Self
    {
        Self {
            scheme,
            ghistory_bits,
            lhistory_bits,
            pc_index_bits,
            perceptron: PerceptronConfig::default(),
        }
    }

    /// Check all widths, returning the geometry of the tables which should
    /// be built for the selected scheme.
    pub fn validate(&self) -> Result<Geometry, ConfigError> {
        let geometry = Geometry {
            ghistory_bits: check_width("ghistory_bits", self.ghistory_bits)?,
            lhistory_bits: check_width("lhistory_bits", self.lhistory_bits)?,
            pc_index_bits: check_width("pc_index_bits", self.pc_index_bits)?,
        };

        match self.scheme {
            Scheme::TournamentAlt => {
                if geometry != TOURNAMENT_ALT_GEOMETRY {
                    warn!("{} uses fixed widths {:?}, ignoring {:?}",
                        self.scheme, TOURNAMENT_ALT_GEOMETRY, geometry);
                }
                Ok(TOURNAMENT_ALT_GEOMETRY)
            },
            Scheme::Perceptron => {
                self.perceptron.validate()?;
                Ok(geometry)
            },
            _ => Ok(geometry),
        }
    }
}

fn check_width(name: &'static str, value: i32) -> Result<u32, ConfigError> {
    let bits = u32::try_from(value)
        .map_err(|_| ConfigError::NegativeWidth { name, value })?;
    if bits > MAX_TABLE_BITS {
        return Err(ConfigError::WidthTooLarge {
            name,
            value,
            max: MAX_TABLE_BITS,
        });
    }
    Ok(bits)
}
