use pointreg_3d::{
    pointset::PointSet,
    transforms::{axis_angle_to_rotation_matrix, rotation_z, RigidTransform, TransformError},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A source set and a target set produced from it by a known transform.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SyntheticPair {
    /// The untouched source points.
    pub source: PointSet,
    /// The moved source points, possibly with noise and outliers appended.
    pub target: PointSet,
    /// The transform used to move the source onto the target.
    pub transform: RigidTransform,
}

/// Parameters of [`random_pair`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    /// Number of source points.
    pub num_points: usize,
    /// Source points are drawn uniformly from `[-extent, extent]³`.
    pub extent: f64,
    /// Largest rotation angle, in radians, about a random axis.
    pub max_angle: f64,
    /// Largest absolute translation per axis.
    pub max_translation: f64,
    /// Largest absolute uniform noise per coordinate of the target points.
    pub noise: f64,
    /// Number of random points appended to the target.
    pub num_outliers: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            num_points: 30,
            extent: 1.0,
            max_angle: 0.3,
            max_translation: 0.3,
            noise: 0.0,
            num_outliers: 0,
        }
    }
}

/// The planar 9-point star pattern (z = 0) used by the demos and benchmarks.
pub fn star_pattern() -> PointSet {
    PointSet::new(vec![
        [-1.2, 0.8, 0.0],
        [-0.4, 1.0, 0.0],
        [0.4, 0.9, 0.0],
        [1.2, 0.6, 0.0],
        [-0.8, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [0.8, -0.2, 0.0],
        [-0.6, -0.8, 0.0],
        [0.6, -0.9, 0.0],
    ])
}

/// Move the star pattern by a rotation about Z followed by a translation.
///
/// Example:
///
/// ```
/// use pointreg_icp::synthetic::create_test_data;
///
/// let pair = create_test_data(0.25, [0.3, 0.2, 0.0]);
/// assert_eq!(pair.source.len(), pair.target.len());
/// ```
pub fn create_test_data(rotation: f64, translation: [f64; 3]) -> SyntheticPair {
    let source = star_pattern();
    let transform = RigidTransform::new(rotation_z(rotation), translation);
    let target = source.transformed(&transform);
    SyntheticPair {
        source,
        target,
        transform,
    }
}

// uniform sample in [-bound, bound], or 0 for a non-positive bound
fn symmetric(rng: &mut StdRng, bound: f64) -> f64 {
    if bound > 0.0 {
        rng.random_range(-bound..=bound)
    } else {
        0.0
    }
}

fn random_point(rng: &mut StdRng, extent: f64) -> [f64; 3] {
    [
        symmetric(rng, extent),
        symmetric(rng, extent),
        symmetric(rng, extent),
    ]
}

fn random_transform(
    rng: &mut StdRng,
    max_angle: f64,
    max_translation: f64,
) -> Result<RigidTransform, TransformError> {
    let axis = loop {
        let candidate = random_point(rng, 1.0);
        let norm = candidate.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 1e-3 {
            break candidate;
        }
    };
    let angle = symmetric(rng, max_angle);

    let rotation = axis_angle_to_rotation_matrix(&axis, angle)?;
    let translation = random_point(rng, max_translation);

    Ok(RigidTransform::new(rotation, translation))
}

fn append_outliers(rng: &mut StdRng, points: &mut Vec<[f64; 3]>, count: usize, extent: f64) {
    points.extend((0..count).map(|_| random_point(rng, extent)));
}

/// Generate a random source set and its transformed target, deterministically from `seed`.
///
/// Noise is added to the target points only, and outliers are appended to
/// the target only, so the first `num_points` target points correspond to
/// the source points in order.
///
/// # Errors
///
/// Propagates [`TransformError`] from building the random rotation.
pub fn random_pair(seed: u64, config: &SyntheticConfig) -> Result<SyntheticPair, TransformError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let source = PointSet::new(
        (0..config.num_points)
            .map(|_| random_point(&mut rng, config.extent))
            .collect(),
    );

    let transform = random_transform(&mut rng, config.max_angle, config.max_translation)?;

    let mut target_points = source
        .iter()
        .map(|p| {
            let q = transform.apply(p);
            let n = random_point(&mut rng, config.noise);
            [q[0] + n[0], q[1] + n[1], q[2] + n[2]]
        })
        .collect::<Vec<_>>();
    append_outliers(&mut rng, &mut target_points, config.num_outliers, config.extent);

    log::debug!(
        "synthetic pair (seed {}): {} source points, {} target points",
        seed,
        source.len(),
        target_points.len()
    );

    Ok(SyntheticPair {
        source,
        target: PointSet::new(target_points),
        transform,
    })
}

/// Return a copy of `target` with `count` random points drawn from `[-extent, extent]³` appended.
pub fn with_outliers(target: &PointSet, seed: u64, count: usize, extent: f64) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = target.points().to_vec();
    append_outliers(&mut rng, &mut points, count, extent);
    PointSet::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pointreg_linalg::mat33::{determinant33, matmul33, transpose33, IDENTITY33};

    #[test]
    fn test_star_pattern() {
        let star = star_pattern();
        assert_eq!(star.len(), 9);
        assert!(star.iter().all(|p| p[2] == 0.0));
    }

    #[test]
    fn test_create_test_data() {
        let pair = create_test_data(0.25, [0.3, 0.2, 0.0]);
        assert_eq!(pair.source, star_pattern());
        for (p, q) in pair.source.iter().zip(pair.target.iter()) {
            let expected = pair.transform.apply(p);
            for i in 0..3 {
                assert_relative_eq!(q[i], expected[i]);
            }
        }
        // the center point only moves by the translation
        assert_eq!(pair.target.get(5), Some(&[0.3, 0.2, 0.0]));
    }

    #[test]
    fn test_random_pair_is_deterministic() -> Result<(), TransformError> {
        let config = SyntheticConfig {
            noise: 0.01,
            num_outliers: 4,
            ..Default::default()
        };
        assert_eq!(random_pair(7, &config)?, random_pair(7, &config)?);
        assert_ne!(random_pair(7, &config)?, random_pair(8, &config)?);
        Ok(())
    }

    #[test]
    fn test_random_pair_layout() -> Result<(), TransformError> {
        let config = SyntheticConfig {
            num_points: 12,
            num_outliers: 3,
            ..Default::default()
        };
        let pair = random_pair(0, &config)?;
        assert_eq!(pair.source.len(), 12);
        assert_eq!(pair.target.len(), 15);

        let r = &pair.transform.rotation;
        assert_relative_eq!(determinant33(r), 1.0, epsilon = 1e-12);
        let rt_r = matmul33(&transpose33(r), r);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(rt_r[i][j], IDENTITY33[i][j], epsilon = 1e-12);
            }
            assert!(pair.transform.translation[i].abs() <= config.max_translation);
        }

        // without noise the leading target points are the moved source points
        for (p, q) in pair.source.iter().zip(pair.target.iter()) {
            let expected = pair.transform.apply(p);
            for i in 0..3 {
                assert_relative_eq!(q[i], expected[i]);
            }
        }
        Ok(())
    }

    #[test]
    fn test_random_pair_degenerate_config() -> Result<(), TransformError> {
        let config = SyntheticConfig {
            num_points: 4,
            extent: 0.0,
            max_angle: 0.0,
            max_translation: 0.0,
            noise: 0.0,
            num_outliers: 0,
        };
        let pair = random_pair(3, &config)?;
        assert_eq!(pair.transform, RigidTransform::identity());
        assert!(pair.target.iter().all(|p| *p == [0.0; 3]));
        Ok(())
    }

    #[test]
    fn test_with_outliers() {
        let star = star_pattern();
        let noisy = with_outliers(&star, 42, 5, 2.5);
        assert_eq!(noisy.len(), star.len() + 5);
        assert_eq!(&noisy.points()[..star.len()], star.points());
        assert!(noisy.iter().all(|p| p.iter().all(|x| x.abs() <= 2.5)));
        assert_eq!(noisy, with_outliers(&star, 42, 5, 2.5));
    }
}
