//! Probability distributions over named variables
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use std::fmt;

mod categorical;
mod mixture;
mod normal;

pub use categorical::{Categorical, CategoricalError};
pub use mixture::{MixtureError, MixtureModel};
pub use normal::{Normal, NormalError};

/// Errors surfaced while evaluating a distribution on a variable map
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum DistributionError {
    /// A declared variable is absent from the input map
    MissingVariable { var: String },
    /// A variable's column count does not match the event dimension
    ShapeMismatch {
        var: String,
        expected: usize,
        found: usize,
    },
    /// A variable's row count does not match the batch size
    BatchSizeMismatch {
        var: String,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for DistributionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable { var } => {
                write!(f, "variable '{}' missing from input", var)
            }
            Self::ShapeMismatch {
                var,
                expected,
                found,
            } => write!(
                f,
                "variable '{}' has {} columns, expected {}",
                var, found, expected
            ),
            Self::BatchSizeMismatch {
                var,
                expected,
                found,
            } => write!(
                f,
                "variable '{}' has {} rows, expected {}",
                var, found, expected
            ),
        }
    }
}

impl std::error::Error for DistributionError {}
