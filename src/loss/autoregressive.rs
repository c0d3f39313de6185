//! Autoregressive loss composition
//!
//! An autoregressive loss unrolls a per-step loss over a bounded number of
//! iterations, threading a [`VarMap`] state through a user-supplied
//! transition and composing the result with an optional terminal loss. Two
//! flavors differ in how state advances between steps:
//!
//! - [`ArDrawLoss`]: the inputs are non-series data. Each iteration
//!   evaluates the step loss at the pre-transition state, then applies the
//!   transition; the last loss sees the final state,
//!   L = Σₜ L_step(x, hₜ) + L_last(x, h_T) with hₜ = f(hₜ₋₁, x).
//! - [`ArSeriesLoss`]: a declared subset of the inputs is time-indexed.
//!   Each step slices the series variables at t, applies the transition, and
//!   evaluates the step loss at the post-transition state; the last loss
//!   sees the final recurrent state combined with the t = 0 series slice,
//!   L = Σₜ L_step(xₜ, hₜ) + L_last(x₁, h_T) with hₜ = f(hₜ₋₁, xₜ₋₁).
//!
//! Construction does no validation; a configuration with neither a step
//! loss nor a last loss surfaces [`LossError::MissingLoss`] when `estimate`
//! is invoked. Iteration runs in fixed order t = 0..max_iter−1 with
//! left-to-right accumulation, so results are reproducible bit-for-bit.
use crate::data::{get_values, VarMap};
use crate::loss::{concat_input_var, LossError};
use crate::traits::Loss;

/// State transition applied between unrolled steps: `(t, state) -> state`
pub type StepFn = Box<dyn Fn(usize, VarMap) -> VarMap>;

/// Configuration shared by the autoregressive loss variants
struct ArLoss {
    step_loss: Option<Box<dyn Loss>>,
    last_loss: Option<Box<dyn Loss>>,
    step_fn: StepFn,
    max_iter: usize,
    input_var: Vec<String>,
    explicit_input_var: bool,
}

impl ArLoss {
    fn new(max_iter: usize) -> Self {
        ArLoss {
            step_loss: None,
            last_loss: None,
            step_fn: Box::new(|_, x| x),
            max_iter,
            input_var: Vec::new(),
            explicit_input_var: false,
        }
    }

    fn set_step_loss(&mut self, loss: Box<dyn Loss>) {
        self.step_loss = Some(loss);
        self.assemble_input_var();
    }

    fn set_last_loss(&mut self, loss: Box<dyn Loss>) {
        self.last_loss = Some(loss);
        self.assemble_input_var();
    }

    fn set_input_var(&mut self, input_var: Vec<String>) {
        self.input_var = input_var;
        self.explicit_input_var = true;
    }

    // last-loss inputs first, then step-loss inputs, deduped in order
    fn assemble_input_var(&mut self) {
        if self.explicit_input_var {
            return;
        }
        let last = self
            .last_loss
            .as_ref()
            .map(|l| l.input_var())
            .unwrap_or(&[]);
        let step = self
            .step_loss
            .as_ref()
            .map(|l| l.input_var())
            .unwrap_or(&[]);
        self.input_var = concat_input_var(last, step);
    }

    fn require_loss(&self) -> Result<(), LossError> {
        if self.step_loss.is_none() && self.last_loss.is_none() {
            Err(LossError::MissingLoss)
        } else {
            Ok(())
        }
    }

    fn loss_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(last_loss) = &self.last_loss {
            parts.push(last_loss.loss_text());
        }
        if let Some(step_loss) = &self.step_loss {
            parts.push(format!(
                "sum_(t=1)^(T={}) {}",
                self.max_iter,
                step_loss.loss_text()
            ));
        }
        parts.join(" + ")
    }
}

/// Autoregressive loss over non-series inputs (DRAW-style unrolling).
///
/// # Example
///
/// ```
/// use provar::prelude::*;
/// use provar::varmap;
///
/// let loss = ArDrawLoss::new(3)
///     .with_step_loss(Box::new(ValueLoss::new(1.0)))
///     .with_last_loss(Box::new(ValueLoss::new(2.0)));
///
/// // 3 * 1.0 + 2.0
/// assert_eq!(loss.estimate(&varmap! {}).unwrap(), 5.0);
/// ```
pub struct ArDrawLoss {
    ar: ArLoss,
}

impl ArDrawLoss {
    /// Unroll over `max_iter` steps with an identity transition and no
    /// sub-losses
    pub fn new(max_iter: usize) -> Self {
        ArDrawLoss {
            ar: ArLoss::new(max_iter),
        }
    }

    /// Set the per-iteration loss term
    #[must_use]
    pub fn with_step_loss(mut self, loss: Box<dyn Loss>) -> Self {
        self.ar.set_step_loss(loss);
        self
    }

    /// Set the terminal loss term, evaluated at the final state
    #[must_use]
    pub fn with_last_loss(mut self, loss: Box<dyn Loss>) -> Self {
        self.ar.set_last_loss(loss);
        self
    }

    /// Set the state transition applied after each step's loss
    #[must_use]
    pub fn with_step_fn(mut self, step_fn: StepFn) -> Self {
        self.ar.step_fn = step_fn;
        self
    }

    /// Override the declared input variables
    #[must_use]
    pub fn with_input_var(mut self, input_var: Vec<String>) -> Self {
        self.ar.set_input_var(input_var);
        self
    }

    /// Estimate the loss and return the final state alongside it
    ///
    /// The step loss sees the state *before* the transition it triggers;
    /// the last loss sees the state after the final transition.
    pub fn estimate_with_state(
        &self,
        x: &VarMap,
    ) -> Result<(f64, VarMap), LossError> {
        self.ar.require_loss()?;

        let mut x = x.clone();
        let mut step_loss_sum = 0.0;
        for i in 0..self.ar.max_iter {
            if let Some(step_loss) = &self.ar.step_loss {
                step_loss_sum += step_loss.estimate(&x)?;
            }
            x = (self.ar.step_fn)(i, x);
        }

        let mut loss = step_loss_sum;
        if let Some(last_loss) = &self.ar.last_loss {
            loss += last_loss.estimate(&x)?;
        }

        Ok((loss, x))
    }
}

impl Loss for ArDrawLoss {
    fn input_var(&self) -> &[String] {
        &self.ar.input_var
    }

    fn estimate(&self, x: &VarMap) -> Result<f64, LossError> {
        self.estimate_with_state(x).map(|(loss, _)| loss)
    }

    fn loss_text(&self) -> String {
        self.ar.loss_text()
    }
}

/// Autoregressive loss over series inputs.
///
/// The variables named in `series_var` are time-indexed: their leading axis
/// must carry at least `max_iter` rows, and each step overwrites them in the
/// state with their slice at t before the transition runs.
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use provar::prelude::*;
/// use provar::varmap;
///
/// let loss = ArSeriesLoss::new(2, vec!["x".to_string()])
///     .with_step_loss(Box::new(ParamLoss::new("x")));
///
/// let x = varmap! { "x" => DMatrix::from_row_slice(2, 1, &[1.0, 2.0]) };
/// // slice t=0 then t=1: 1.0 + 2.0
/// assert_eq!(loss.estimate(&x).unwrap(), 3.0);
/// ```
pub struct ArSeriesLoss {
    ar: ArLoss,
    series_var: Vec<String>,
}

impl ArSeriesLoss {
    /// Unroll over `max_iter` steps, slicing the variables named in
    /// `series_var` at each step
    pub fn new(max_iter: usize, series_var: Vec<String>) -> Self {
        ArSeriesLoss {
            ar: ArLoss::new(max_iter),
            series_var,
        }
    }

    /// Set the per-iteration loss term
    #[must_use]
    pub fn with_step_loss(mut self, loss: Box<dyn Loss>) -> Self {
        self.ar.set_step_loss(loss);
        self
    }

    /// Set the terminal loss term, evaluated at the final recurrent state
    /// combined with the t = 0 series slice
    #[must_use]
    pub fn with_last_loss(mut self, loss: Box<dyn Loss>) -> Self {
        self.ar.set_last_loss(loss);
        self
    }

    /// Set the state transition applied before each step's loss
    #[must_use]
    pub fn with_step_fn(mut self, step_fn: StepFn) -> Self {
        self.ar.step_fn = step_fn;
        self
    }

    /// Override the declared input variables
    #[must_use]
    pub fn with_input_var(mut self, input_var: Vec<String>) -> Self {
        self.ar.set_input_var(input_var);
        self
    }

    /// The declared series variables
    pub fn series_var(&self) -> &[String] {
        &self.series_var
    }

    /// Declared input variables that are not series variables
    ///
    /// Derived on demand from `input_var`; kept for interface completeness.
    pub fn non_series_var(&self) -> Vec<String> {
        self.ar
            .input_var
            .iter()
            .filter(|v| !self.series_var.contains(v))
            .cloned()
            .collect()
    }

    /// Slice every entry of `x` at leading-axis index `t`
    ///
    /// Pure helper; the returned map holds 1-row matrices.
    pub fn slice_step_from_inputs(
        &self,
        t: usize,
        x: &VarMap,
    ) -> Result<VarMap, LossError> {
        x.iter()
            .map(|(k, v)| {
                if t < v.nrows() {
                    Ok((k.clone(), v.rows(t, 1).into_owned()))
                } else {
                    Err(LossError::SeriesTooShort {
                        var: k.clone(),
                        len: v.nrows(),
                        needed: t + 1,
                    })
                }
            })
            .collect()
    }

    /// Estimate the loss and return the final state alongside it
    ///
    /// Per step: slice the series variables at t, apply the transition, then
    /// evaluate the step loss at the post-transition state. The returned
    /// state carries the untouched full series tensors, not the last slice.
    pub fn estimate_with_state(
        &self,
        x: &VarMap,
    ) -> Result<(f64, VarMap), LossError> {
        self.ar.require_loss()?;

        let mut x = x.clone();
        let series_x = get_values(&x, &self.series_var);

        let mut step_loss_sum = 0.0;
        for t in 0..self.ar.max_iter {
            // update series inputs
            x.extend(self.slice_step_from_inputs(t, &series_x)?);

            // transition
            x = (self.ar.step_fn)(t, x);

            // estimate
            if let Some(step_loss) = &self.ar.step_loss {
                step_loss_sum += step_loss.estimate(&x)?;
            }
        }

        let mut loss = step_loss_sum;
        if let Some(last_loss) = &self.ar.last_loss {
            // the terminal loss sees the initial series slice together
            // with the final recurrent state
            x.extend(self.slice_step_from_inputs(0, &series_x)?);
            loss += last_loss.estimate(&x)?;
        }

        x.extend(series_x);
        Ok((loss, x))
    }
}

impl Loss for ArSeriesLoss {
    fn input_var(&self) -> &[String] {
        &self.ar.input_var
    }

    fn estimate(&self, x: &VarMap) -> Result<f64, LossError> {
        self.estimate_with_state(x).map(|(loss, _)| loss)
    }

    fn loss_text(&self) -> String {
        self.ar.loss_text()
    }
}
