//! Re-imports for convenience
#[doc(no_inline)]
pub use crate::data::{get_values, VarMap};
#[doc(no_inline)]
pub use crate::dist::*;
#[doc(no_inline)]
pub use crate::loss::*;
#[doc(no_inline)]
pub use crate::traits::*;
