//! Algebraic sum of two losses
use std::ops::Add;

use crate::data::VarMap;
use crate::loss::{concat_input_var, LossError};
use crate::traits::Loss;

/// Sum of two losses.
///
/// The declared input variables are the order-preserving, de-duplicated
/// concatenation of the operands'. Usually built through `+` on boxed
/// losses.
///
/// # Example
///
/// ```
/// use provar::prelude::*;
/// use provar::varmap;
///
/// let a: Box<dyn Loss> = Box::new(ValueLoss::new(1.0));
/// let b: Box<dyn Loss> = Box::new(ValueLoss::new(2.0));
///
/// let sum = a + b;
/// assert_eq!(sum.estimate(&varmap! {}).unwrap(), 3.0);
/// assert_eq!(sum.loss_text(), "1 + 2");
/// ```
pub struct AddedLoss {
    lhs: Box<dyn Loss>,
    rhs: Box<dyn Loss>,
    input_var: Vec<String>,
}

impl AddedLoss {
    pub fn new(lhs: Box<dyn Loss>, rhs: Box<dyn Loss>) -> Self {
        let input_var = concat_input_var(lhs.input_var(), rhs.input_var());
        AddedLoss {
            lhs,
            rhs,
            input_var,
        }
    }
}

impl Loss for AddedLoss {
    fn input_var(&self) -> &[String] {
        &self.input_var
    }

    fn estimate(&self, x: &VarMap) -> Result<f64, LossError> {
        Ok(self.lhs.estimate(x)? + self.rhs.estimate(x)?)
    }

    fn loss_text(&self) -> String {
        format!("{} + {}", self.lhs.loss_text(), self.rhs.loss_text())
    }
}

impl Add for Box<dyn Loss> {
    type Output = Box<dyn Loss>;

    fn add(self, rhs: Box<dyn Loss>) -> Box<dyn Loss> {
        Box::new(AddedLoss::new(self, rhs))
    }
}
