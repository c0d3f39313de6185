//! Loss reading one input variable directly
use crate::data::VarMap;
use crate::loss::LossError;
use crate::traits::Loss;

/// A loss that reads a single declared variable and returns the mean of its
/// entries.
///
/// The declarative analogue of using a tensor itself as a loss term, e.g. a
/// regularizer computed upstream and passed in by name.
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use provar::prelude::*;
/// use provar::varmap;
///
/// let loss = ParamLoss::new("reg");
/// let x = varmap! { "reg" => DMatrix::from_row_slice(2, 1, &[1.0, 3.0]) };
/// assert_eq!(loss.estimate(&x).unwrap(), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParamLoss {
    var: Vec<String>,
}

impl ParamLoss {
    pub fn new(var: &str) -> Self {
        ParamLoss {
            var: vec![var.to_string()],
        }
    }
}

impl Loss for ParamLoss {
    fn input_var(&self) -> &[String] {
        &self.var
    }

    fn estimate(&self, x: &VarMap) -> Result<f64, LossError> {
        let value = x.get(&self.var[0]).ok_or_else(|| {
            LossError::MissingVariable {
                var: self.var[0].clone(),
            }
        })?;
        Ok(value.mean())
    }

    fn loss_text(&self) -> String {
        self.var[0].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varmap;
    use nalgebra::DMatrix;

    #[test]
    fn estimate_is_mean_of_entries() {
        let loss = ParamLoss::new("x");
        let x = varmap! {
            "x" => DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 6.0])
        };
        assert_eq!(loss.estimate(&x).unwrap(), 3.0);
    }

    #[test]
    fn missing_variable_errors() {
        let loss = ParamLoss::new("x");
        assert_eq!(
            loss.estimate(&varmap! {}),
            Err(LossError::MissingVariable {
                var: "x".to_string()
            })
        );
    }

    #[test]
    fn declares_its_variable() {
        let loss = ParamLoss::new("x");
        assert_eq!(loss.input_var(), &["x".to_string()]);
        assert_eq!(loss.loss_text(), "x");
    }
}
