use pointreg_3d::{ops::squared_distance, pointset::PointSet};

use crate::RegistrationError;

/// Assignment of a source point to its nearest target point.
///
/// Several source points may share the same target index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Correspondence {
    /// Index into the source (current) point set.
    pub source_index: usize,
    /// Index into the target point set.
    pub target_index: usize,
}

/// Nearest-neighbor lookup over a fixed target point set.
///
/// Implementations must return an index into the target they were built
/// from, resolving ties to the lowest index.
pub trait NearestNeighborSearch {
    /// Index of the target point closest to `query`, or `None` if the target is empty.
    fn nearest(&self, query: &[f64; 3]) -> Option<usize>;
}

/// Linear scan over all target points.
///
/// Time complexity: O(m) per query where m = number of target points.
#[derive(Debug, Clone, Copy)]
pub struct BruteForceSearch<'a> {
    points: &'a [[f64; 3]],
}

impl<'a> BruteForceSearch<'a> {
    /// Create a search over the given target points.
    pub fn new(points: &'a [[f64; 3]]) -> Self {
        Self { points }
    }
}

impl NearestNeighborSearch for BruteForceSearch<'_> {
    fn nearest(&self, query: &[f64; 3]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (j, target_point) in self.points.iter().enumerate() {
            let dist = squared_distance(query, target_point);
            // strict comparison keeps the first occurrence on ties
            let closer = match best {
                None => true,
                Some((_, min_dist)) => dist < min_dist,
            };
            if closer {
                best = Some((j, dist));
            }
        }

        best.map(|(j, _)| j)
    }
}

/// Finds the closest target point for each point of `current` using brute-force search.
///
/// Returns one correspondence per point of `current`, in the same order.
///
/// # Errors
///
/// * `RegistrationError::EmptyTargetSet` - If `target` has no points.
pub fn find_correspondences(
    current: &PointSet,
    target: &PointSet,
) -> Result<Vec<Correspondence>, RegistrationError> {
    if target.is_empty() {
        return Err(RegistrationError::EmptyTargetSet);
    }
    find_correspondences_with(current.points(), &BruteForceSearch::new(target.points()))
}

/// Finds correspondences with any nearest-neighbor search strategy.
pub fn find_correspondences_with<S: NearestNeighborSearch + ?Sized>(
    current: &[[f64; 3]],
    search: &S,
) -> Result<Vec<Correspondence>, RegistrationError> {
    current
        .iter()
        .enumerate()
        .map(|(source_index, point)| {
            search
                .nearest(point)
                .map(|target_index| Correspondence {
                    source_index,
                    target_index,
                })
                .ok_or(RegistrationError::EmptyTargetSet)
        })
        .collect()
}
