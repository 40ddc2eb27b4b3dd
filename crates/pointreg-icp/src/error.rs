/// Errors that abort a registration call.
///
/// Running out of iterations is not an error; it is reported through
/// [`crate::RegistrationResult::converged`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// The source point set has no points.
    #[error("source point set is empty")]
    EmptySourceSet,

    /// The target point set has no points, so no nearest neighbor exists.
    #[error("target point set is empty")]
    EmptyTargetSet,

    /// The matched point slices given to the solver differ in length.
    #[error("matched point sets differ in length: {source_len} source vs {target_len} target")]
    MismatchedLengths {
        /// Number of source points.
        source_len: usize,
        /// Number of target points.
        target_len: usize,
    },

    /// A nearest-neighbor search returned an index outside the target set.
    #[error("target index {0} is out of bounds")]
    TargetIndexOutOfBounds(usize),

    /// The iteration budget must allow at least one iteration.
    #[error("max_iterations must be at least 1, got {0}")]
    InvalidMaxIterations(usize),

    /// The convergence tolerance must be positive and finite.
    #[error("tolerance must be a positive finite number, got {0}")]
    InvalidTolerance(f64),
}
