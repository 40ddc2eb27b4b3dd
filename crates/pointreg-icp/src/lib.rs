#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Nearest-neighbor correspondence search.
pub mod correspondence;

mod error;
pub use error::RegistrationError;

/// Registration over arbitrary located objects.
pub mod objects;

/// The ICP registration loop.
pub mod registration;

/// Closed-form rigid transform estimation from matched pairs.
pub mod solver;

/// Seeded synthetic source/target pairs for tests and parameter sweeps.
pub mod synthetic;

pub use correspondence::{
    find_correspondences, BruteForceSearch, Correspondence, NearestNeighborSearch,
};
pub use objects::{match_indices, match_objects, Locatable3d};
pub use registration::{
    register_point_sets, register_point_sets_with, IterationState, RegistrationCriteria,
    RegistrationNote, RegistrationResult,
};
pub use solver::{solve_rigid_transform, RigidFit};
