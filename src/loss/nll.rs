//! Negative log-likelihood loss
use crate::data::VarMap;
use crate::loss::LossError;
use crate::traits::{Distribution, Loss};

/// Negative mean log-likelihood of an owned distribution.
///
/// The declared input variables are the distribution's; estimation averages
/// the distribution's per-row log-likelihood over the batch and negates it.
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use provar::prelude::*;
/// use provar::varmap;
///
/// let p = Normal::standard("p", "x", 1);
/// let loss = NllLoss::new(Box::new(p));
///
/// let x = varmap! { "x" => DMatrix::from_element(1, 1, 0.0) };
/// // -ln N(0 | 0, 1)
/// assert::close(loss.estimate(&x).unwrap(), 0.918_938_533_204_672_7, 1E-12);
/// ```
pub struct NllLoss {
    p: Box<dyn Distribution>,
    input_var: Vec<String>,
}

impl NllLoss {
    pub fn new(p: Box<dyn Distribution>) -> Self {
        let input_var = p.var().to_vec();
        NllLoss { p, input_var }
    }
}

impl Loss for NllLoss {
    fn input_var(&self) -> &[String] {
        &self.input_var
    }

    fn estimate(&self, x: &VarMap) -> Result<f64, LossError> {
        let ln_f = self.p.log_likelihood(x)?;
        Ok(-ln_f.mean())
    }

    fn loss_text(&self) -> String {
        format!("-mean(ln {})", self.p.prob_text())
    }
}
