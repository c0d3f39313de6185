//! Mixture of named distributions with a categorical prior
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use itertools::Itertools;
use nalgebra::{DMatrix, DVector, RowDVector};
use rand::RngCore;
use std::fmt;

use crate::data::{get_values, VarMap};
use crate::dist::DistributionError;
use crate::misc::{argmax, LogSumExp};
use crate::traits::Distribution;

/// Mixture model p(x) = Σᵢ p(x|z=i) p(z=i) over one shared observed
/// variable, with the component index z as an implicit hidden variable.
///
/// The model owns K component distributions and one categorical prior whose
/// declared variable is the hidden index. Every likelihood quantity is
/// derived from the single (K, batch) joint table produced by
/// [`log_likelihood_all_hidden`](MixtureModel::log_likelihood_all_hidden),
/// so each component is evaluated exactly once per call and the one
/// numerically delicate operation (log-sum-exp over components) lives in one
/// place.
///
/// # Example
///
/// ```
/// use nalgebra::{dvector, DMatrix};
/// use provar::prelude::*;
/// use provar::varmap;
///
/// let components: Vec<Box<dyn Distribution>> = vec![
///     Box::new(Normal::new("p_0", "x", dvector![-3.0], dvector![1.0]).unwrap()),
///     Box::new(Normal::new("p_1", "x", dvector![3.0], dvector![1.0]).unwrap()),
/// ];
/// let prior = Categorical::uniform("prior", "z", 2).unwrap();
/// let p = MixtureModel::new(components, Box::new(prior), "p").unwrap();
///
/// let x = varmap! { "x" => DMatrix::from_element(1, 1, -3.0) };
/// let resps = p.get_posterior_probs(&x).unwrap();
///
/// // a point at the first component's mean is its responsibility
/// assert!(resps[(0, 0)] > 0.99);
/// ```
pub struct MixtureModel {
    name: String,
    var: Vec<String>,
    hidden_var: Vec<String>,
    components: Vec<Box<dyn Distribution>>,
    prior: Box<dyn Distribution>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum MixtureError {
    /// The component list is malformed (no components given)
    InvalidArgument,
    /// The prior is not a categorical distribution over one hidden variable
    InvalidPrior { found: String },
    /// The prior's category count does not match the number of components
    MixtureSizeMismatch { prior_k: usize, components: usize },
    /// The components do not share exactly one observed variable name
    HeterogeneousVariable { vars: Vec<String> },
}

impl MixtureModel {
    /// Compose `distributions` and a categorical `prior` into one mixture
    ///
    /// Validation happens eagerly, in order, each failure a distinct
    /// [`MixtureError`]; a constructed mixture is immutable and never
    /// re-checked.
    ///
    /// # Arguments
    /// - distributions: the K component distributions, all over the same
    ///   single observed variable
    /// - prior: categorical distribution over the hidden component index;
    ///   its `probs` parameter must have exactly K entries
    /// - name: identifier used in textual renderings
    pub fn new(
        distributions: Vec<Box<dyn Distribution>>,
        prior: Box<dyn Distribution>,
        name: &str,
    ) -> Result<Self, MixtureError> {
        if distributions.is_empty() {
            return Err(MixtureError::InvalidArgument);
        }

        if prior.distribution_name() != "Categorical"
            || prior.var().len() != 1
        {
            return Err(MixtureError::InvalidPrior {
                found: prior.distribution_name().to_string(),
            });
        }

        let prior_k = prior
            .get_params()
            .get("probs")
            .map(|probs| probs.len())
            .ok_or_else(|| MixtureError::InvalidPrior {
                found: prior.distribution_name().to_string(),
            })?;
        if prior_k != distributions.len() {
            return Err(MixtureError::MixtureSizeMismatch {
                prior_k,
                components: distributions.len(),
            });
        }

        let var: Vec<String> = distributions
            .iter()
            .flat_map(|d| d.var().iter().cloned())
            .unique()
            .collect();
        if var.len() != 1 {
            return Err(MixtureError::HeterogeneousVariable { vars: var });
        }

        let hidden_var = prior.var().to_vec();

        Ok(MixtureModel {
            name: name.to_string(),
            var,
            hidden_var,
            components: distributions,
            prior,
        })
    }

    /// The number of mixture components K
    #[inline]
    pub fn k(&self) -> usize {
        self.components.len()
    }

    /// Name of the hidden component-index variable
    #[inline]
    pub fn hidden_var(&self) -> &[String] {
        &self.hidden_var
    }

    /// Joint log-likelihood table ln p(x, z=i) for every component
    ///
    /// Row i carries the prior log-probability of component i plus component
    /// i's conditional log-likelihood of `x`, for every batch row of `x`.
    /// Components are evaluated in index order 0..K-1.
    ///
    /// Returns a (K, batch) matrix.
    pub fn log_likelihood_all_hidden(
        &self,
        x: &VarMap,
    ) -> Result<DMatrix<f64>, DistributionError> {
        let k = self.k();
        let mut rows: Vec<RowDVector<f64>> = Vec::with_capacity(k);

        for (i, component) in self.components.iter().enumerate() {
            let mut onehot = DMatrix::zeros(1, k);
            onehot[(0, i)] = 1.0;
            let mut hidden = VarMap::new();
            hidden.insert(self.hidden_var[0].clone(), onehot);

            // ln p(z=i)
            let prior_ll = self.prior.log_likelihood(&hidden)?[0];
            // ln p(x|z=i)
            let comp_ll = component.log_likelihood(x)?;

            rows.push(comp_ll.add_scalar(prior_ll).transpose());
        }

        Ok(DMatrix::from_rows(&rows))
    }

    /// Marginal log-likelihood ln p(x), one entry per batch row
    ///
    /// Computed as a stable log-sum-exp over the component axis of the joint
    /// table, never by summing raw likelihoods.
    pub fn log_likelihood(
        &self,
        x: &VarMap,
    ) -> Result<DVector<f64>, DistributionError> {
        let table = self.log_likelihood_all_hidden(x)?;
        Ok(marginalize(&table))
    }

    /// Posterior responsibilities p(z=i | x) for every component and batch
    /// row
    ///
    /// Computed in log space as exp(ln p(x, z=i) − ln p(x)) so small
    /// probabilities stay stable. Returns a (K, batch) matrix whose columns
    /// each sum to 1.
    pub fn get_posterior_probs(
        &self,
        x: &VarMap,
    ) -> Result<DMatrix<f64>, DistributionError> {
        let table = self.log_likelihood_all_hidden(x)?;
        let marginal = marginalize(&table);
        Ok(DMatrix::from_fn(table.nrows(), table.ncols(), |i, j| {
            (table[(i, j)] - marginal[j]).exp()
        }))
    }

    /// Draw `batch_size` independent samples of the observed variable
    ///
    /// Each draw samples a one-hot hidden assignment from the prior, selects
    /// the component at its arg-max index, and draws from that component.
    /// The returned map carries the observed variable's rows concatenated
    /// along the batch axis, plus the hidden one-hot rows when
    /// `return_hidden` is set. A `batch_size` of 0 yields an empty map.
    pub fn sample(
        &self,
        batch_size: usize,
        return_hidden: bool,
        rng: &mut dyn RngCore,
    ) -> VarMap {
        if batch_size == 0 {
            return VarMap::new();
        }

        let mut var_rows: Vec<RowDVector<f64>> =
            Vec::with_capacity(batch_size);
        let mut hidden_rows: Vec<RowDVector<f64>> =
            Vec::with_capacity(batch_size);

        for _ in 0..batch_size {
            let hidden = self.prior.draw(&mut *rng);
            let onehot = hidden
                .get(&self.hidden_var[0])
                .expect("prior draws its declared variable");
            let ix = argmax(onehot.as_slice())
                .expect("prior draws are non-empty");

            let drawn = self.components[ix].draw(&mut *rng);
            let value = drawn
                .get(&self.var[0])
                .expect("components draw their declared variable");

            var_rows.push(value.row(0).into_owned());
            if return_hidden {
                hidden_rows.push(onehot.row(0).into_owned());
            }
        }

        let mut out = VarMap::new();
        out.insert(self.var[0].clone(), DMatrix::from_rows(&var_rows));
        if return_hidden {
            out.insert(
                self.hidden_var[0].clone(),
                DMatrix::from_rows(&hidden_rows),
            );
        }
        out
    }

    /// Joint log-likelihood ln p(x, z) at an observed hidden assignment
    ///
    /// `x` carries both the observed variable and a one-hot hidden tensor;
    /// the full joint table is computed once and each batch row gathers the
    /// table entry at its arg-max hidden index.
    pub fn log_likelihood_given_hidden(
        &self,
        x: &VarMap,
    ) -> Result<DVector<f64>, DistributionError> {
        let visible = get_values(x, &self.var);
        let table = self.log_likelihood_all_hidden(&visible)?;

        let hidden = x.get(&self.hidden_var[0]).ok_or_else(|| {
            DistributionError::MissingVariable {
                var: self.hidden_var[0].clone(),
            }
        })?;
        if hidden.ncols() != self.k() {
            return Err(DistributionError::ShapeMismatch {
                var: self.hidden_var[0].clone(),
                expected: self.k(),
                found: hidden.ncols(),
            });
        }
        if hidden.nrows() != table.ncols() {
            return Err(DistributionError::BatchSizeMismatch {
                var: self.hidden_var[0].clone(),
                expected: table.ncols(),
                found: hidden.nrows(),
            });
        }

        Ok(DVector::from_iterator(
            table.ncols(),
            (0..table.ncols()).map(|j| {
                let ix = argmax(hidden.row(j).transpose().as_slice())
                    .expect("hidden rows are non-empty");
                table[(ix, j)]
            }),
        ))
    }
}

/// Column-wise log-sum-exp of a (K, batch) table
fn marginalize(table: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        table.ncols(),
        (0..table.ncols())
            .map(|j| table.column(j).iter().copied().logsumexp()),
    )
}

impl Distribution for MixtureModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn var(&self) -> &[String] {
        &self.var
    }

    fn distribution_name(&self) -> &'static str {
        "Mixture Model"
    }

    fn get_params(&self) -> VarMap {
        self.prior.get_params()
    }

    fn draw(&self, rng: &mut dyn RngCore) -> VarMap {
        self.sample(1, false, rng)
    }

    fn log_likelihood(
        &self,
        x: &VarMap,
    ) -> Result<DVector<f64>, DistributionError> {
        MixtureModel::log_likelihood(self, x)
    }

    fn prob_factorized_text(&self) -> String {
        self.components
            .iter()
            .enumerate()
            .map(|(i, d)| {
                format!(
                    "{}({}|{}={}){}({}={})",
                    d.name(),
                    self.var[0],
                    self.hidden_var[0],
                    i,
                    self.prior.name(),
                    self.hidden_var[0],
                    i
                )
            })
            .join(" + ")
    }
}

impl fmt::Display for MixtureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.prob_text(), self.prob_factorized_text())
    }
}

impl fmt::Display for MixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => {
                write!(f, "distributions must be a non-empty sequence")
            }
            Self::InvalidPrior { found } => write!(
                f,
                "the prior must be a categorical distribution over one \
                 hidden variable, found '{}'",
                found
            ),
            Self::MixtureSizeMismatch {
                prior_k,
                components,
            } => write!(
                f,
                "the prior has {} categories but there are {} components",
                prior_k, components
            ),
            Self::HeterogeneousVariable { vars } => write!(
                f,
                "all components must share one variable, found {:?}",
                vars
            ),
        }
    }
}

impl std::error::Error for MixtureError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::{Categorical, Normal};
    use crate::misc::logsumexp;
    use crate::varmap;
    use nalgebra::dvector;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    const TOL: f64 = 1E-10;

    fn two_gaussian_mixture() -> MixtureModel {
        let components: Vec<Box<dyn Distribution>> = vec![
            Box::new(
                Normal::new("p_0", "x", dvector![-3.0], dvector![1.0])
                    .unwrap(),
            ),
            Box::new(
                Normal::new("p_1", "x", dvector![3.0], dvector![1.0])
                    .unwrap(),
            ),
        ];
        let prior = Categorical::uniform("prior", "z", 2).unwrap();
        MixtureModel::new(components, Box::new(prior), "p").unwrap()
    }

    fn gaussian_components(
        locs: &[f64],
    ) -> Vec<Box<dyn Distribution>> {
        locs.iter()
            .enumerate()
            .map(|(i, &loc)| {
                Box::new(
                    Normal::new(
                        &format!("p_{}", i),
                        "x",
                        dvector![loc],
                        dvector![1.0],
                    )
                    .unwrap(),
                ) as Box<dyn Distribution>
            })
            .collect()
    }

    #[test]
    fn new_with_matching_prior_succeeds() {
        for k in 1..5 {
            let locs: Vec<f64> = (0..k).map(|i| i as f64).collect();
            let prior = Categorical::uniform("prior", "z", k).unwrap();
            let mm = MixtureModel::new(
                gaussian_components(&locs),
                Box::new(prior),
                "p",
            );
            assert!(mm.is_ok());
            assert_eq!(mm.unwrap().k(), k);
        }
    }

    #[test]
    fn new_rejects_empty_components() {
        let prior = Categorical::uniform("prior", "z", 2).unwrap();
        let res = MixtureModel::new(Vec::new(), Box::new(prior), "p");
        assert_eq!(res.err(), Some(MixtureError::InvalidArgument));
    }

    #[test]
    fn new_rejects_non_categorical_prior() {
        let prior = Normal::standard("prior", "z", 2);
        let res = MixtureModel::new(
            gaussian_components(&[-3.0, 3.0]),
            Box::new(prior),
            "p",
        );
        assert_eq!(
            res.err(),
            Some(MixtureError::InvalidPrior {
                found: "Normal".to_string()
            })
        );
    }

    #[test]
    fn new_rejects_size_mismatch() {
        for prior_k in [1_usize, 3] {
            let prior =
                Categorical::uniform("prior", "z", prior_k).unwrap();
            let res = MixtureModel::new(
                gaussian_components(&[-3.0, 3.0]),
                Box::new(prior),
                "p",
            );
            assert_eq!(
                res.err(),
                Some(MixtureError::MixtureSizeMismatch {
                    prior_k,
                    components: 2
                })
            );
        }
    }

    #[test]
    fn new_rejects_heterogeneous_variables() {
        let components: Vec<Box<dyn Distribution>> = vec![
            Box::new(Normal::standard("p_0", "x", 1)),
            Box::new(Normal::standard("p_1", "y", 1)),
        ];
        let prior = Categorical::uniform("prior", "z", 2).unwrap();
        let res = MixtureModel::new(components, Box::new(prior), "p");
        assert!(matches!(
            res.err(),
            Some(MixtureError::HeterogeneousVariable { .. })
        ));
    }

    #[test]
    fn joint_table_shape_is_k_by_batch() {
        let mm = two_gaussian_mixture();
        let x = varmap! {
            "x" => DMatrix::from_row_slice(3, 1, &[-3.0, 0.0, 3.0])
        };
        let table = mm.log_likelihood_all_hidden(&x).unwrap();
        assert_eq!(table.shape(), (2, 3));
    }

    #[test]
    fn marginal_is_logsumexp_of_joint_table() {
        let mm = two_gaussian_mixture();
        let x = varmap! {
            "x" => DMatrix::from_row_slice(3, 1, &[-3.0, 0.2, 3.0])
        };
        let table = mm.log_likelihood_all_hidden(&x).unwrap();
        let ln_px = mm.log_likelihood(&x).unwrap();

        for j in 0..3 {
            let col: Vec<f64> = table.column(j).iter().copied().collect();
            assert::close(ln_px[j], logsumexp(&col), TOL);
        }
    }

    #[test]
    fn marginal_matches_hand_computed_reference() {
        let mm = two_gaussian_mixture();
        let x = varmap! { "x" => DMatrix::from_element(1, 1, 0.0) };
        let ln_px = mm.log_likelihood(&x).unwrap();

        // ln(0.5 N(0|-3,1) + 0.5 N(0|3,1)) with both densities equal
        let ln_component = -0.5 * 9.0 - crate::consts::HALF_LN_2PI;
        assert::close(ln_px[0], ln_component, 1E-5);
    }

    #[test]
    fn posterior_probs_sum_to_one_per_batch_row() {
        let mm = two_gaussian_mixture();
        let x = varmap! {
            "x" => DMatrix::from_row_slice(4, 1, &[-5.0, -0.1, 0.1, 5.0])
        };
        let resps = mm.get_posterior_probs(&x).unwrap();
        assert_eq!(resps.shape(), (2, 4));
        for j in 0..4 {
            let total: f64 = resps.column(j).iter().sum();
            assert::close(total, 1.0, 1E-5);
        }
    }

    #[test]
    fn posterior_probs_favor_the_nearer_component() {
        let mm = two_gaussian_mixture();
        let x = varmap! {
            "x" => DMatrix::from_row_slice(2, 1, &[-3.0, 3.0])
        };
        let resps = mm.get_posterior_probs(&x).unwrap();
        assert!(resps[(0, 0)] > 0.99);
        assert!(resps[(1, 1)] > 0.99);
    }

    #[test]
    fn sample_returns_requested_batch_size() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0xFEED);
        let mm = two_gaussian_mixture();
        let out = mm.sample(17, false, &mut rng);
        assert_eq!(out["x"].shape(), (17, 1));
        assert!(!out.contains_key("z"));
    }

    #[test]
    fn sample_zero_batch_yields_empty_map() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0xFEED);
        let mm = two_gaussian_mixture();
        let out = mm.sample(0, true, &mut rng);
        assert!(out.is_empty());
    }

    #[test]
    fn sample_with_return_hidden_includes_one_hot_rows() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0xFEED);
        let mm = two_gaussian_mixture();
        let out = mm.sample(9, true, &mut rng);
        assert_eq!(out["x"].shape(), (9, 1));
        assert_eq!(out["z"].shape(), (9, 2));
        for j in 0..9 {
            assert::close(out["z"].row(j).iter().sum::<f64>(), 1.0, TOL);
        }
    }

    #[test]
    fn sampled_values_track_their_hidden_component() {
        // components far enough apart that the sign identifies the source
        let mut rng = Xoshiro256Plus::seed_from_u64(0xFEED);
        let mm = {
            let prior =
                Categorical::new("prior", "z", &[0.3, 0.7]).unwrap();
            MixtureModel::new(
                gaussian_components(&[-100.0, 100.0]),
                Box::new(prior),
                "p",
            )
            .unwrap()
        };
        let out = mm.sample(50, true, &mut rng);
        for j in 0..50 {
            let ix = argmax(out["z"].row(j).transpose().as_slice()).unwrap();
            let x = out["x"][(j, 0)];
            if ix == 0 {
                assert!(x < 0.0);
            } else {
                assert!(x > 0.0);
            }
        }
    }

    #[test]
    fn marginal_is_invariant_to_component_permutation() {
        let x = varmap! {
            "x" => DMatrix::from_row_slice(3, 1, &[-2.0, 0.5, 4.0])
        };

        let forward = {
            let prior =
                Categorical::new("prior", "z", &[0.2, 0.8]).unwrap();
            MixtureModel::new(
                gaussian_components(&[-3.0, 3.0]),
                Box::new(prior),
                "p",
            )
            .unwrap()
        };
        let swapped = {
            let prior =
                Categorical::new("prior", "z", &[0.8, 0.2]).unwrap();
            MixtureModel::new(
                gaussian_components(&[3.0, -3.0]),
                Box::new(prior),
                "p",
            )
            .unwrap()
        };

        let ll_fwd = forward.log_likelihood(&x).unwrap();
        let ll_swp = swapped.log_likelihood(&x).unwrap();
        for j in 0..3 {
            assert::close(ll_fwd[j], ll_swp[j], TOL);
        }
    }

    #[test]
    fn given_hidden_gathers_the_arg_max_row() {
        let mm = two_gaussian_mixture();
        let x = varmap! {
            "x" => DMatrix::from_row_slice(2, 1, &[-3.0, 3.0]),
            "z" => DMatrix::from_row_slice(2, 2, &[
                1.0, 0.0,
                0.0, 1.0,
            ])
        };
        let joint = mm.log_likelihood_given_hidden(&x).unwrap();

        let visible = varmap! {
            "x" => DMatrix::from_row_slice(2, 1, &[-3.0, 3.0])
        };
        let table = mm.log_likelihood_all_hidden(&visible).unwrap();
        assert::close(joint[0], table[(0, 0)], TOL);
        assert::close(joint[1], table[(1, 1)], TOL);
    }

    #[test]
    fn given_hidden_rejects_batch_row_mismatch() {
        let mm = two_gaussian_mixture();
        let x = varmap! {
            "x" => DMatrix::from_row_slice(2, 1, &[-3.0, 3.0]),
            "z" => DMatrix::from_row_slice(1, 2, &[1.0, 0.0])
        };
        assert_eq!(
            mm.log_likelihood_given_hidden(&x),
            Err(DistributionError::BatchSizeMismatch {
                var: "z".to_string(),
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn given_hidden_requires_the_hidden_variable() {
        let mm = two_gaussian_mixture();
        let x = varmap! { "x" => DMatrix::from_element(1, 1, 0.0) };
        assert_eq!(
            mm.log_likelihood_given_hidden(&x),
            Err(DistributionError::MissingVariable {
                var: "z".to_string()
            })
        );
    }

    #[test]
    fn prob_text_renderings() {
        let mm = two_gaussian_mixture();
        assert_eq!(mm.prob_text(), "p(x)");
        assert_eq!(
            mm.prob_factorized_text(),
            "p_0(x|z=0)prior(z=0) + p_1(x|z=1)prior(z=1)"
        );
        assert_eq!(mm.distribution_name(), "Mixture Model");
    }

    #[test]
    fn mixture_is_itself_a_distribution() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0xC0FFEE);
        let mm = two_gaussian_mixture();
        let one = mm.draw(&mut rng);
        assert_eq!(one["x"].shape(), (1, 1));
        assert_eq!(mm.var(), &["x".to_string()]);
    }
}
