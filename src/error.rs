//! Errors reported while configuring a predictor.

use thiserror::Error;

/// A predictor configuration which cannot be used to build a predictor.
///
/// These are only produced when a predictor is created. Once a predictor
/// exists, making a prediction or training it cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A bit-width was negative.
    #[error("{name} must not be negative (got {value})")]
    NegativeWidth { name: &'static str, value: i32 },

    /// A bit-width would index a table larger than we allow.
    #[error("{name} is too large (got {value}, maximum is {max})")]
    WidthTooLarge { name: &'static str, value: i32, max: u32 },

    /// The scheme identifier was not recognized.
    #[error("unsupported predictor scheme '{0}'")]
    UnknownScheme(String),

    /// The perceptron table size is zero, not a power of two, or too large.
    #[error("perceptron table size must be a power of two within 1..=2^{max_bits} (got {size})")]
    InvalidPerceptronTable { size: usize, max_bits: u32 },

    /// The perceptron history length is out of range.
    #[error("perceptron history length must be within 1..={max} (got {value})")]
    InvalidHistoryLength { value: usize, max: usize },
}
