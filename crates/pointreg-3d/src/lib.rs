#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Linear algebra utilities.
pub mod linalg;

/// Operations on 3D points.
pub mod ops;

/// Point set type.
pub mod pointset;

/// 3D transforms algorithms.
pub mod transforms;
