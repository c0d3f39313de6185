//! Diagonal Gaussian distribution over one named variable
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use nalgebra::{DMatrix, DVector, RowDVector};
use rand::RngCore;
use rand_distr::Distribution as _;
use rand_distr::Normal as NormalSampler;
use std::fmt;

use crate::consts::HALF_LN_2PI;
use crate::data::VarMap;
use crate::dist::DistributionError;
use crate::traits::Distribution;

/// Named diagonal Gaussian, N(loc, diag(scale²)), over a single declared
/// variable of dimension d.
///
/// Batched values are (batch, d) matrices; the log-likelihood of a batch row
/// is the sum of the per-dimension Gaussian log-densities.
///
/// # Example
///
/// ```
/// use nalgebra::{dvector, DMatrix};
/// use provar::prelude::*;
/// use provar::varmap;
///
/// let p = Normal::new("p", "x", dvector![0.0], dvector![1.0]).unwrap();
///
/// let x = varmap! { "x" => DMatrix::from_element(1, 1, 0.0) };
/// let ln_f = p.log_likelihood(&x).unwrap();
///
/// // standard normal density at zero
/// assert::close(ln_f[0], -0.918_938_533_204_672_7, 1E-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct Normal {
    name: String,
    var: Vec<String>,
    loc: DVector<f64>,
    scale: DVector<f64>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum NormalError {
    /// A loc entry is infinite or NaN
    LocNotFinite { ix: usize, loc: f64 },
    /// A scale entry is less than or equal to zero
    ScaleTooLow { ix: usize, scale: f64 },
    /// A scale entry is infinite or NaN
    ScaleNotFinite { ix: usize, scale: f64 },
    /// loc and scale have different lengths
    DimensionMismatch { loc: usize, scale: usize },
    /// loc and scale are empty
    EmptyParameters,
}

impl Normal {
    /// Create a new diagonal Gaussian named `name` over the variable `var`
    ///
    /// # Arguments
    /// - name: identifier used in textual renderings
    /// - var: the single variable this distribution models
    /// - loc: per-dimension means
    /// - scale: per-dimension standard deviations, all positive
    pub fn new(
        name: &str,
        var: &str,
        loc: DVector<f64>,
        scale: DVector<f64>,
    ) -> Result<Self, NormalError> {
        if loc.is_empty() {
            return Err(NormalError::EmptyParameters);
        }
        if loc.len() != scale.len() {
            return Err(NormalError::DimensionMismatch {
                loc: loc.len(),
                scale: scale.len(),
            });
        }
        loc.iter().enumerate().try_for_each(|(ix, &mu)| {
            if mu.is_finite() {
                Ok(())
            } else {
                Err(NormalError::LocNotFinite { ix, loc: mu })
            }
        })?;
        scale.iter().enumerate().try_for_each(|(ix, &sigma)| {
            if sigma <= 0.0 {
                Err(NormalError::ScaleTooLow { ix, scale: sigma })
            } else if !sigma.is_finite() {
                Err(NormalError::ScaleNotFinite { ix, scale: sigma })
            } else {
                Ok(())
            }
        })?;

        Ok(Normal {
            name: name.to_string(),
            var: vec![var.to_string()],
            loc,
            scale,
        })
    }

    /// Standard normal of dimension `dims`
    pub fn standard(name: &str, var: &str, dims: usize) -> Self {
        Normal {
            name: name.to_string(),
            var: vec![var.to_string()],
            loc: DVector::zeros(dims),
            scale: DVector::from_element(dims, 1.0),
        }
    }

    /// The event dimension d
    #[inline]
    pub fn dims(&self) -> usize {
        self.loc.len()
    }

    /// Get a reference to the means
    #[inline]
    pub fn loc(&self) -> &DVector<f64> {
        &self.loc
    }

    /// Get a reference to the standard deviations
    #[inline]
    pub fn scale(&self) -> &DVector<f64> {
        &self.scale
    }
}

impl Distribution for Normal {
    fn name(&self) -> &str {
        &self.name
    }

    fn var(&self) -> &[String] {
        &self.var
    }

    fn distribution_name(&self) -> &'static str {
        "Normal"
    }

    fn get_params(&self) -> VarMap {
        let d = self.dims();
        let mut params = VarMap::new();
        params.insert(
            "loc".to_string(),
            DMatrix::from_row_slice(1, d, self.loc.as_slice()),
        );
        params.insert(
            "scale".to_string(),
            DMatrix::from_row_slice(1, d, self.scale.as_slice()),
        );
        params
    }

    fn draw(&self, rng: &mut dyn RngCore) -> VarMap {
        let row = RowDVector::from_iterator(
            self.dims(),
            self.loc.iter().zip(self.scale.iter()).map(|(&mu, &sigma)| {
                // parameters validated at construction
                let g = NormalSampler::new(mu, sigma).unwrap();
                g.sample(&mut *rng)
            }),
        );
        let mut out = VarMap::new();
        out.insert(self.var[0].clone(), DMatrix::from_rows(&[row]));
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
        if xs.ncols() != self.dims() {
            return Err(DistributionError::ShapeMismatch {
                var: self.var[0].clone(),
                expected: self.dims(),
                found: xs.ncols(),
            });
        }

        let ln_f = DVector::from_iterator(
            xs.nrows(),
            xs.row_iter().map(|row| {
                row.iter()
                    .zip(self.loc.iter())
                    .zip(self.scale.iter())
                    .map(|((&x_j, &mu), &sigma)| {
                        let z = (x_j - mu) / sigma;
                        -0.5 * z * z - sigma.ln() - HALF_LN_2PI
                    })
                    .sum::<f64>()
            }),
        );
        Ok(ln_f)
    }
}

impl fmt::Display for Normal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ Normal(d: {})", self.prob_text(), self.dims())
    }
}

impl fmt::Display for NormalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocNotFinite { ix, loc } => {
                write!(f, "non-finite loc at index {}: {}", ix, loc)
            }
            Self::ScaleTooLow { ix, scale } => {
                write!(f, "non-positive scale at index {}: {}", ix, scale)
            }
            Self::ScaleNotFinite { ix, scale } => {
                write!(f, "non-finite scale at index {}: {}", ix, scale)
            }
            Self::DimensionMismatch { loc, scale } => write!(
                f,
                "loc has {} entries but scale has {}",
                loc, scale
            ),
            Self::EmptyParameters => write!(f, "empty parameter vectors"),
        }
    }
}

impl std::error::Error for NormalError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varmap;
    use nalgebra::dvector;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    const TOL: f64 = 1E-12;

    #[test]
    fn new_with_valid_params() {
        let p = Normal::new("p", "x", dvector![0.0, 1.0], dvector![1.0, 2.0]);
        assert!(p.is_ok());
    }

    #[test]
    fn new_rejects_non_positive_scale() {
        let res = Normal::new("p", "x", dvector![0.0], dvector![0.0]);
        assert_eq!(
            res,
            Err(NormalError::ScaleTooLow { ix: 0, scale: 0.0 })
        );
    }

    #[test]
    fn new_rejects_non_finite_loc() {
        let res = Normal::new("p", "x", dvector![f64::NAN], dvector![1.0]);
        assert!(matches!(res, Err(NormalError::LocNotFinite { ix: 0, .. })));
    }

    #[test]
    fn new_rejects_mismatched_dims() {
        let res = Normal::new("p", "x", dvector![0.0, 1.0], dvector![1.0]);
        assert_eq!(
            res,
            Err(NormalError::DimensionMismatch { loc: 2, scale: 1 })
        );
    }

    #[test]
    fn log_likelihood_of_standard_normal_at_zero() {
        let p = Normal::standard("p", "x", 1);
        let x = varmap! { "x" => DMatrix::from_element(1, 1, 0.0) };
        let ln_f = p.log_likelihood(&x).unwrap();
        assert::close(ln_f[0], -HALF_LN_2PI, TOL);
    }

    #[test]
    fn log_likelihood_sums_over_dimensions() {
        let p =
            Normal::new("p", "x", dvector![1.0, -1.0], dvector![2.0, 0.5])
                .unwrap();
        let x = varmap! { "x" => DMatrix::from_row_slice(1, 2, &[0.0, 0.0]) };
        let ln_f = p.log_likelihood(&x).unwrap();

        let expected = (-0.5 * (0.5_f64).powi(2)
            - 2.0_f64.ln()
            - HALF_LN_2PI)
            + (-0.5 * (2.0_f64).powi(2) - 0.5_f64.ln() - HALF_LN_2PI);
        assert::close(ln_f[0], expected, TOL);
    }

    #[test]
    fn log_likelihood_is_batched() {
        let p = Normal::standard("p", "x", 2);
        let x = varmap! { "x" => DMatrix::from_element(7, 2, 0.1) };
        let ln_f = p.log_likelihood(&x).unwrap();
        assert_eq!(ln_f.len(), 7);
    }

    #[test]
    fn log_likelihood_missing_var_errors() {
        let p = Normal::standard("p", "x", 1);
        let y = varmap! { "y" => DMatrix::from_element(1, 1, 0.0) };
        assert_eq!(
            p.log_likelihood(&y),
            Err(DistributionError::MissingVariable {
                var: "x".to_string()
            })
        );
    }

    #[test]
    fn log_likelihood_shape_mismatch_errors() {
        let p = Normal::standard("p", "x", 2);
        let x = varmap! { "x" => DMatrix::from_element(1, 3, 0.0) };
        assert_eq!(
            p.log_likelihood(&x),
            Err(DistributionError::ShapeMismatch {
                var: "x".to_string(),
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn draw_yields_one_row_of_event_dims() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0xABCD);
        let p = Normal::standard("p", "x", 3);
        let out = p.draw(&mut rng);
        let xs = &out["x"];
        assert_eq!(xs.shape(), (1, 3));
        assert!(xs.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn prob_text_uses_name_and_var() {
        let p = Normal::standard("p_0", "x", 1);
        assert_eq!(p.prob_text(), "p_0(x)");
        assert_eq!(p.distribution_name(), "Normal");
    }
}
