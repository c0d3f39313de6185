//! Numeric utilities
mod func;

pub use func::*;
