use pointreg_3d::{ops::euclidean_distance, pointset::PointSet, transforms::RigidTransform};

use crate::{
    correspondence::{find_correspondences_with, BruteForceSearch, NearestNeighborSearch},
    solver::solve_rigid_transform,
    Correspondence, RegistrationError,
};

/// Structure to define the ICP parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegistrationCriteria {
    /// Maximum number of iterations to perform.
    pub max_iterations: usize,
    /// Convergence tolerance on the mean residual distance.
    pub tolerance: f64,
}

impl RegistrationCriteria {
    /// Create criteria from an iteration budget and a tolerance.
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    /// Check that the budget allows at least one iteration and the tolerance is positive.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.max_iterations == 0 {
            return Err(RegistrationError::InvalidMaxIterations(self.max_iterations));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(RegistrationError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

impl Default for RegistrationCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 0.01,
        }
    }
}

/// Snapshot of one ICP iteration, taken before the iteration's transform is applied.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IterationState {
    iteration: usize,
    points: PointSet,
    correspondences: Vec<Correspondence>,
    matched_target: PointSet,
    mean_error: f64,
    energy: f64,
}

impl IterationState {
    /// Zero-based iteration number.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// The source points as moved by all previous iterations.
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// One correspondence per source point, in source order.
    pub fn correspondences(&self) -> &[Correspondence] {
        &self.correspondences
    }

    /// The target point matched to each source point, in source order.
    pub fn matched_target(&self) -> &PointSet {
        &self.matched_target
    }

    /// Mean Euclidean distance between the points and their matches.
    pub fn mean_error(&self) -> f64 {
        self.mean_error
    }

    /// Sum of squared distances between the points and their matches.
    pub fn energy(&self) -> f64 {
        self.energy
    }
}

/// Diagnostics recorded during a registration that did not abort it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RegistrationNote {
    /// The cross-covariance of an iteration had rank below 2, so the
    /// rotation applied after that iteration was not unique.
    SingularCovariance {
        /// Iteration whose matched pairs were degenerate.
        iteration: usize,
        /// Numerical rank of the cross-covariance matrix.
        rank: usize,
    },
}

/// Result of [`register_point_sets`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegistrationResult {
    converged: bool,
    trace: Vec<IterationState>,
    transform: RigidTransform,
    notes: Vec<RegistrationNote>,
}

impl RegistrationResult {
    /// Whether the mean error dropped below the tolerance.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Every iteration attempted, in order. Never empty.
    pub fn trace(&self) -> &[IterationState] {
        &self.trace
    }

    /// The state that ended the registration.
    pub fn final_state(&self) -> &IterationState {
        // the trace holds at least one state by construction
        &self.trace[self.trace.len() - 1]
    }

    /// Number of iterations recorded in the trace.
    pub fn num_iterations(&self) -> usize {
        self.trace.len()
    }

    /// Accumulated transform mapping the original source onto the points of the final state.
    pub fn transform(&self) -> &RigidTransform {
        &self.transform
    }

    /// Non-fatal diagnostics, in iteration order.
    pub fn notes(&self) -> &[RegistrationNote] {
        &self.notes
    }

    /// Consume the result and return the trace.
    pub fn into_trace(self) -> Vec<IterationState> {
        self.trace
    }
}

/// Iterative Closest Point (ICP) registration using point to point distance.
///
/// Each iteration matches every current source point to its nearest target
/// point, records the state, stops if the mean error is below the
/// tolerance, and otherwise moves the source by the optimal rigid transform
/// for the matched pairs. No transform is computed for the last state of an
/// exhausted budget, so the trace always ends on the state that stopped
/// the loop.
///
/// # Arguments
///
/// * `source` - Source point set. Its point order is kept across iterations.
/// * `target` - Target point set.
/// * `criteria` - Iteration budget and convergence tolerance.
///
/// # Returns
///
/// The convergence flag, the trace of every iteration and the accumulated transform.
/// Running out of iterations is a normal result with `converged() == false`.
///
/// # Errors
///
/// * `RegistrationError::EmptySourceSet` - If `source` has no points.
/// * `RegistrationError::EmptyTargetSet` - If `target` has no points.
/// * `RegistrationError::InvalidMaxIterations` - If `criteria.max_iterations` is 0.
/// * `RegistrationError::InvalidTolerance` - If `criteria.tolerance` is not positive.
pub fn register_point_sets(
    source: &PointSet,
    target: &PointSet,
    criteria: &RegistrationCriteria,
) -> Result<RegistrationResult, RegistrationError> {
    register_point_sets_with(
        source,
        target,
        &BruteForceSearch::new(target.points()),
        criteria,
    )
}

/// Like [`register_point_sets`], with a caller-provided nearest-neighbor search over `target`.
pub fn register_point_sets_with<S: NearestNeighborSearch + ?Sized>(
    source: &PointSet,
    target: &PointSet,
    search: &S,
    criteria: &RegistrationCriteria,
) -> Result<RegistrationResult, RegistrationError> {
    if source.is_empty() {
        return Err(RegistrationError::EmptySourceSet);
    }
    if target.is_empty() {
        return Err(RegistrationError::EmptyTargetSet);
    }
    criteria.validate()?;

    let mut current = source.clone();
    let mut transform = RigidTransform::identity();
    let mut trace = Vec::new();
    let mut notes = Vec::new();
    let mut converged = false;

    for iteration in 0..criteria.max_iterations {
        let now = std::time::Instant::now();

        // find closest points between current source and target
        let correspondences = find_correspondences_with(current.points(), search)?;
        let matched_target = target
            .select(correspondences.iter().map(|c| c.target_index))
            .ok_or_else(|| {
                let index = correspondences
                    .iter()
                    .map(|c| c.target_index)
                    .find(|&j| j >= target.len())
                    .unwrap_or_default();
                RegistrationError::TargetIndexOutOfBounds(index)
            })?;

        let residuals = current
            .iter()
            .zip(matched_target.iter())
            .map(|(p, q)| euclidean_distance(p, q))
            .collect::<Vec<_>>();
        let mean_error = residuals.iter().sum::<f64>() / residuals.len() as f64;
        let energy = residuals.iter().map(|r| r * r).sum::<f64>();

        log::debug!(
            "Iteration {}: mean error = {:.6}, energy = {:.6}",
            iteration,
            mean_error,
            energy
        );

        let state = IterationState {
            iteration,
            points: current,
            correspondences,
            matched_target,
            mean_error,
            energy,
        };

        if mean_error < criteria.tolerance {
            trace.push(state);
            converged = true;
            break;
        }

        if iteration + 1 == criteria.max_iterations {
            trace.push(state);
            break;
        }

        let fit = solve_rigid_transform(state.points.points(), state.matched_target.points())?;
        if fit.is_singular() {
            notes.push(RegistrationNote::SingularCovariance {
                iteration,
                rank: fit.covariance_rank(),
            });
        }

        current = state.points.transformed(&fit.transform);
        transform = fit.transform.compose(&transform);
        trace.push(state);

        log::debug!("elapsed: {:?}", now.elapsed());
    }

    let result = RegistrationResult {
        converged,
        trace,
        transform,
        notes,
    };

    if converged {
        log::debug!(
            "ICP converged at iteration {} with error {:.6}",
            result.final_state().iteration(),
            result.final_state().mean_error()
        );
    } else {
        log::debug!(
            "ICP did not converge after {} iterations. Final error: {:.6}",
            result.num_iterations(),
            result.final_state().mean_error()
        );
    }

    Ok(result)
}
