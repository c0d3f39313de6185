//! Constant scalar loss
use crate::data::VarMap;
use crate::loss::LossError;
use crate::traits::Loss;

/// A loss that always evaluates to a fixed scalar.
///
/// Declares no input variables. Useful as a placeholder term when composing
/// objectives.
///
/// # Example
///
/// ```
/// use provar::prelude::*;
/// use provar::varmap;
///
/// let loss = ValueLoss::new(2.0);
/// assert_eq!(loss.estimate(&varmap! {}).unwrap(), 2.0);
/// assert!(loss.input_var().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValueLoss {
    value: f64,
}

impl ValueLoss {
    pub fn new(value: f64) -> Self {
        ValueLoss { value }
    }
}

impl Loss for ValueLoss {
    fn input_var(&self) -> &[String] {
        &[]
    }

    fn estimate(&self, _x: &VarMap) -> Result<f64, LossError> {
        Ok(self.value)
    }

    fn loss_text(&self) -> String {
        format!("{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varmap;

    #[test]
    fn estimate_ignores_input() {
        let loss = ValueLoss::new(-1.5);
        let x = varmap! {
            "x" => nalgebra::DMatrix::from_element(3, 1, 9.0)
        };
        assert_eq!(loss.estimate(&x).unwrap(), -1.5);
    }

    #[test]
    fn loss_text_is_the_value() {
        assert_eq!(ValueLoss::new(2.0).loss_text(), "2");
    }
}
