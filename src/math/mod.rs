//! Small dense matrix type used for design matrices and network weights.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
