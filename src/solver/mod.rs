//! SVM solver implementations
//!
//! The classifier minimizes a squared-hinge objective over kernel
//! coefficients with an accelerated gradient method.

pub mod fast_gradient;
pub mod objective;

pub use self::fast_gradient::*;
pub use self::objective::*;
