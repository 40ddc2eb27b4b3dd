use crate::{linalg::transform_points, transforms::RigidTransform};

/// An ordered set of 3D points.
///
/// The order is significant: the index of a point is its identity when the
/// set is moved around by a registration.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PointSet {
    // The points in the set.
    points: Vec<[f64; 3]>,
}

impl PointSet {
    /// Create a new point set from points.
    pub fn new(points: Vec<[f64; 3]>) -> Self {
        Self { points }
    }

    /// Get the number of points in the point set.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point set.
    #[inline]
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get a point by index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&[f64; 3]> {
        self.points.get(index)
    }

    /// Iterate over the points.
    pub fn iter(&self) -> std::slice::Iter<'_, [f64; 3]> {
        self.points.iter()
    }

    /// Gather the points at the given indices, in order. Indices may repeat.
    ///
    /// Returns `None` if any index is out of bounds.
    pub fn select(&self, indices: impl IntoIterator<Item = usize>) -> Option<PointSet> {
        indices
            .into_iter()
            .map(|i| self.points.get(i).copied())
            .collect::<Option<Vec<_>>>()
            .map(PointSet::new)
    }

    /// Return a copy of the point set moved by a rigid transform.
    pub fn transformed(&self, transform: &RigidTransform) -> PointSet {
        let mut dst_points = vec![[0.0; 3]; self.points.len()];
        transform_points(
            &self.points,
            &transform.rotation,
            &transform.translation,
            &mut dst_points,
        );
        PointSet::new(dst_points)
    }

    /// Consume the set and return its points.
    pub fn into_points(self) -> Vec<[f64; 3]> {
        self.points
    }
}

impl From<Vec<[f64; 3]>> for PointSet {
    fn from(points: Vec<[f64; 3]>) -> Self {
        Self::new(points)
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a [f64; 3];
    type IntoIter = std::slice::Iter<'a, [f64; 3]>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
