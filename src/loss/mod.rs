//! Estimable losses and their composition
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use itertools::Itertools;
use std::fmt;

use crate::dist::DistributionError;

mod added;
mod autoregressive;
mod nll;
mod param;
mod value;

pub use added::AddedLoss;
pub use autoregressive::{ArDrawLoss, ArSeriesLoss, StepFn};
pub use nll::NllLoss;
pub use param::ParamLoss;
pub use value::ValueLoss;

/// Errors surfaced while evaluating a loss
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum LossError {
    /// An autoregressive loss has neither a step loss nor a last loss
    MissingLoss,
    /// A declared input variable is absent from the input map
    MissingVariable { var: String },
    /// A series variable has fewer leading-axis entries than required
    SeriesTooShort {
        var: String,
        len: usize,
        needed: usize,
    },
    /// A distribution evaluation inside the loss failed
    Distribution(DistributionError),
}

impl From<DistributionError> for LossError {
    fn from(err: DistributionError) -> Self {
        LossError::Distribution(err)
    }
}

impl fmt::Display for LossError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLoss => {
                write!(f, "no step loss or last loss to estimate")
            }
            Self::MissingVariable { var } => {
                write!(f, "input variable '{}' missing", var)
            }
            Self::SeriesTooShort { var, len, needed } => write!(
                f,
                "series variable '{}' has {} steps, needs at least {}",
                var, len, needed
            ),
            Self::Distribution(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LossError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Distribution(err) => Some(err),
            _ => None,
        }
    }
}

/// De-duplicated, order-preserving concatenation of declared input variables
pub(crate) fn concat_input_var(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().chain(b.iter()).cloned().unique().collect()
}
