#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Row-major 3x3 matrix helpers.
pub mod mat33;

/// Module to calculate SVD of a 3x3 matrix
pub mod svd;
