//! Declarative probabilistic model composition.
//!
//! `provar` lets you build stochastic generative models out of named
//! distribution objects and derive training objectives from the composition:
//!
//! - [`dist::MixtureModel`] turns K component distributions plus a
//!   categorical prior into a single distribution supporting sampling, exact
//!   marginal log-likelihood, and posterior responsibility computation.
//! - [`loss::ArDrawLoss`] and [`loss::ArSeriesLoss`] unroll a per-step loss
//!   over a bounded number of iterations, threading a variable map through a
//!   user-supplied transition and composing it with an optional terminal
//!   loss.
//!
//! Variables are named; batched values travel in a [`data::VarMap`], a map
//! from variable name to an `nalgebra` matrix whose rows are the batch (or
//! time) axis.
//!
//! # Example
//!
//! ```
//! use nalgebra::{dvector, DMatrix};
//! use provar::prelude::*;
//! use provar::varmap;
//!
//! let components: Vec<Box<dyn Distribution>> = vec![
//!     Box::new(Normal::new("p_0", "x", dvector![-3.0], dvector![1.0]).unwrap()),
//!     Box::new(Normal::new("p_1", "x", dvector![3.0], dvector![1.0]).unwrap()),
//! ];
//! let prior = Categorical::uniform("prior", "z", 2).unwrap();
//!
//! let mixture = MixtureModel::new(components, Box::new(prior), "p").unwrap();
//!
//! let x = varmap! { "x" => DMatrix::from_row_slice(3, 1, &[-3.0, 0.0, 3.0]) };
//! let ln_px = mixture.log_likelihood(&x).unwrap();
//! let resps = mixture.get_posterior_probs(&x).unwrap();
//!
//! assert_eq!(ln_px.len(), 3);
//! assert_eq!(resps.shape(), (2, 3));
//! ```

pub mod consts;
pub mod data;
pub mod dist;
pub mod loss;
pub mod misc;
pub mod prelude;
pub mod traits;
