//! Categorical distribution over a named one-hot variable
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use std::fmt;

use crate::data::VarMap;
use crate::dist::DistributionError;
use crate::misc::pflip;
use crate::traits::Distribution;

/// Named categorical distribution over K outcomes of a single declared
/// variable.
///
/// Values are one-hot rows: a batch of n assignments is an (n, K) matrix
/// whose rows each carry a single 1. The log-likelihood of a row is its dot
/// product with the log-probability vector, which for an exact one-hot picks
/// the log-probability of the active category.
///
/// Used as the mixing prior of a [`MixtureModel`](crate::dist::MixtureModel),
/// where the declared variable is the hidden component index.
///
/// # Example
///
/// ```
/// use provar::prelude::*;
///
/// let prior = Categorical::new("prior", "z", &[2.0, 1.0, 1.0]).unwrap();
///
/// // weights are normalized at construction
/// assert_eq!(prior.k(), 3);
/// assert::close(prior.probs()[0], 0.5, 1E-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct Categorical {
    name: String,
    var: Vec<String>,
    probs: DVector<f64>,
    ln_probs: DVector<f64>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum CategoricalError {
    /// One or more of the weights is infinite or NaN
    NonFiniteWeight { ix: usize, weight: f64 },
    /// One or more of the weights is less than zero
    NegativeWeight { ix: usize, weight: f64 },
    /// Weights has no entries
    EmptyWeights,
    /// The weights sum to zero, so they cannot be normalized
    WeightsSumToZero,
}

impl Categorical {
    /// Construct a new categorical named `name` over the variable `var`
    ///
    /// # Arguments
    /// - weights: proportional likelihood of each outcome. The weights must
    ///   all be non-negative with a positive sum, but do not need to sum to
    ///   1 because they will be normalized in the constructor.
    pub fn new(
        name: &str,
        var: &str,
        weights: &[f64],
    ) -> Result<Self, CategoricalError> {
        if weights.is_empty() {
            return Err(CategoricalError::EmptyWeights);
        }

        weights.iter().enumerate().try_for_each(|(ix, &weight)| {
            if weight < 0.0 {
                Err(CategoricalError::NegativeWeight { ix, weight })
            } else if !weight.is_finite() {
                Err(CategoricalError::NonFiniteWeight { ix, weight })
            } else {
                Ok(())
            }
        })?;

        let norm = weights.iter().sum::<f64>();
        if norm <= 0.0 {
            return Err(CategoricalError::WeightsSumToZero);
        }
        let probs = DVector::from_iterator(
            weights.len(),
            weights.iter().map(|w| w / norm),
        );
        let ln_probs = probs.map(|p| p.ln());

        Ok(Categorical {
            name: name.to_string(),
            var: vec![var.to_string()],
            probs,
            ln_probs,
        })
    }

    /// Categorical over K outcomes with uniform weights
    pub fn uniform(
        name: &str,
        var: &str,
        k: usize,
    ) -> Result<Self, CategoricalError> {
        if k == 0 {
            return Err(CategoricalError::EmptyWeights);
        }
        Categorical::new(name, var, &vec![1.0; k])
    }

    /// Get the number of possible outcomes
    #[inline]
    pub fn k(&self) -> usize {
        self.probs.len()
    }

    /// Get a reference to the normalized probabilities
    #[inline]
    pub fn probs(&self) -> &DVector<f64> {
        &self.probs
    }

    /// Get a reference to the log probabilities
    #[inline]
    pub fn ln_probs(&self) -> &DVector<f64> {
        &self.ln_probs
    }
}

impl Distribution for Categorical {
    fn name(&self) -> &str {
        &self.name
    }

    fn var(&self) -> &[String] {
        &self.var
    }

    fn distribution_name(&self) -> &'static str {
        "Categorical"
    }

    fn get_params(&self) -> VarMap {
        let mut params = VarMap::new();
        params.insert(
            "probs".to_string(),
            DMatrix::from_row_slice(1, self.k(), self.probs.as_slice()),
        );
        params
    }

    fn draw(&self, rng: &mut dyn RngCore) -> VarMap {
        let ix = pflip(self.probs.as_slice(), 1, rng)[0];
        let mut onehot = DMatrix::zeros(1, self.k());
        onehot[(0, ix)] = 1.0;

        let mut out = VarMap::new();
        out.insert(self.var[0].clone(), onehot);
        out
    }

    fn log_likelihood(
        &self,
        x: &VarMap,
    ) -> Result<DVector<f64>, DistributionError> {
        let xs = x.get(&self.var[0]).ok_or_else(|| {
            DistributionError::MissingVariable {
                var: self.var[0].clone(),
            }
        })?;
        if xs.ncols() != self.k() {
            return Err(DistributionError::ShapeMismatch {
                var: self.var[0].clone(),
                expected: self.k(),
                found: xs.ncols(),
            });
        }

        let ln_f = DVector::from_iterator(
            xs.nrows(),
            xs.row_iter().map(|row| {
                row.iter()
                    .zip(self.ln_probs.iter())
                    .map(|(&x_k, &ln_p)| {
                        // a zero one-hot entry contributes nothing, even
                        // against a zero-probability category
                        if x_k == 0.0 {
                            0.0
                        } else {
                            x_k * ln_p
                        }
                    })
                    .sum::<f64>()
            }),
        );
        Ok(ln_f)
    }
}

impl fmt::Display for Categorical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ Categorical(k: {})", self.prob_text(), self.k())
    }
}

impl fmt::Display for CategoricalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteWeight { ix, weight } => {
                write!(f, "non-finite weight at index {}: {}", ix, weight)
            }
            Self::NegativeWeight { ix, weight } => {
                write!(f, "negative weight at index {}: {}", ix, weight)
            }
            Self::EmptyWeights => write!(f, "empty weights vector"),
            Self::WeightsSumToZero => {
                write!(f, "weights sum to zero and cannot be normalized")
            }
        }
    }
}

impl std::error::Error for CategoricalError {}
