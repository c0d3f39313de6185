//! Capability traits for distributions and losses
use nalgebra::DVector;
use rand::RngCore;

use crate::data::VarMap;
use crate::dist::DistributionError;
use crate::loss::LossError;

/// A named distribution over a declared, ordered set of variables.
///
/// The first entry of [`var`](Distribution::var) is the primary variable;
/// order is load-bearing and must be preserved by implementors. Composite
/// distributions such as [`MixtureModel`](crate::dist::MixtureModel) depend
/// only on this interface, never on a concrete family.
pub trait Distribution {
    /// Identifier used in textual renderings, e.g. `"p"` in `p(x)`
    fn name(&self) -> &str;

    /// Ordered names of the variables this distribution produces
    fn var(&self) -> &[String];

    /// Name of the distribution family, e.g. `"Normal"` or `"Categorical"`
    fn distribution_name(&self) -> &'static str;

    /// Parameters as named tensors, e.g. `probs` for a categorical
    fn get_params(&self) -> VarMap;

    /// A single draw, returned as 1-row matrices keyed by variable name
    fn draw(&self, rng: &mut dyn RngCore) -> VarMap;

    /// Joint log-density of `x`, one entry per batch row
    fn log_likelihood(
        &self,
        x: &VarMap,
    ) -> Result<DVector<f64>, DistributionError>;

    /// Textual rendering of the density, e.g. `p(x)`
    fn prob_text(&self) -> String {
        format!("{}({})", self.name(), self.var().join(","))
    }

    /// Textual rendering of the factorized density; defaults to
    /// [`prob_text`](Distribution::prob_text) for unfactored families
    fn prob_factorized_text(&self) -> String {
        self.prob_text()
    }
}

/// An estimable scalar loss with declared input variables.
///
/// Losses combine algebraically: `Box<dyn Loss> + Box<dyn Loss>` yields the
/// summed loss.
pub trait Loss {
    /// Ordered names of the variables `estimate` consumes
    fn input_var(&self) -> &[String];

    /// Evaluate the loss on `x`, producing a scalar
    fn estimate(&self, x: &VarMap) -> Result<f64, LossError>;

    /// Textual rendering of the loss term
    fn loss_text(&self) -> String;
}
