use glam::{DMat3, DVec3};
use pointreg_3d::{ops::centroid, transforms::RigidTransform};
use pointreg_linalg::{mat33::dmat3_to_array33, svd::svd3};

use crate::RegistrationError;

/// Singular values below this fraction of the largest one count as zero.
const RANK_TOLERANCE: f64 = 1e-9;

/// Output of [`solve_rigid_transform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidFit {
    /// The optimal transform from the source to the target frame.
    pub transform: RigidTransform,
    /// Singular values of the cross-covariance matrix, largest first.
    pub singular_values: [f64; 3],
}

impl RigidFit {
    /// Numerical rank of the cross-covariance matrix.
    pub fn covariance_rank(&self) -> usize {
        let largest = self.singular_values[0];
        if largest <= 0.0 {
            return 0;
        }
        self.singular_values
            .iter()
            .filter(|&&s| s > RANK_TOLERANCE * largest)
            .count()
    }

    /// Whether the rotation is underdetermined (rank below 2).
    ///
    /// This happens for a single pair or for collinear points. The rotation
    /// is still a valid proper rotation, only not unique.
    pub fn is_singular(&self) -> bool {
        self.covariance_rank() < 2
    }
}

/// Compute the rigid transform that best maps `source_matched` onto `target_matched`.
///
/// Kabsch / orthogonal Procrustes: the returned `(R, t)` minimizes
/// `Σ ‖R·sᵢ + t − tᵢ‖²` over the matched pairs, and `R` is always a proper
/// rotation (`det(R) = +1`).
///
/// # Arguments
///
/// * `source_matched` - Source points, one per pair.
/// * `target_matched` - Target points, in the same order as the source points.
///
/// # Errors
///
/// * `RegistrationError::EmptySourceSet` - If there are no pairs.
/// * `RegistrationError::MismatchedLengths` - If the slices differ in length.
pub fn solve_rigid_transform(
    source_matched: &[[f64; 3]],
    target_matched: &[[f64; 3]],
) -> Result<RigidFit, RegistrationError> {
    if source_matched.len() != target_matched.len() {
        return Err(RegistrationError::MismatchedLengths {
            source_len: source_matched.len(),
            target_len: target_matched.len(),
        });
    }

    let (Some(src_centroid), Some(dst_centroid)) =
        (centroid(source_matched), centroid(target_matched))
    else {
        return Err(RegistrationError::EmptySourceSet);
    };
    let src_centroid = DVec3::from_array(src_centroid);
    let dst_centroid = DVec3::from_array(dst_centroid);

    // compute covariance matrix H = Σ[(src - src_mean) * (dst - dst_mean)^T]
    let mut h = DMat3::ZERO;
    for (p_in_src, p_in_dst) in source_matched.iter().zip(target_matched.iter()) {
        let src_centered = DVec3::from_array(*p_in_src) - src_centroid;
        let dst_centered = DVec3::from_array(*p_in_dst) - dst_centroid;
        h += DMat3::from_cols(
            src_centered * dst_centered.x,
            src_centered * dst_centered.y,
            src_centered * dst_centered.z,
        );
    }

    let svd_result = svd3(&h);
    let u = *svd_result.u();
    let v = *svd_result.v();

    // R = V * U^T
    let mut r = v * u.transpose();

    // flip the singular vector of the smallest singular value to turn a reflection into a rotation
    if r.determinant() < 0.0 {
        let v_corrected = DMat3::from_cols(v.x_axis, v.y_axis, -v.z_axis);
        r = v_corrected * u.transpose();
    }

    let t = dst_centroid - r * src_centroid;

    let fit = RigidFit {
        transform: RigidTransform::new(dmat3_to_array33(&r), t.to_array()),
        singular_values: svd_result.singular_values(),
    };

    if fit.is_singular() {
        log::warn!(
            "singular cross-covariance (rank {}) over {} pairs: rotation is underdetermined",
            fit.covariance_rank(),
            source_matched.len()
        );
    }

    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pointreg_3d::transforms::{axis_angle_to_rotation_matrix, rotation_z};
    use pointreg_linalg::mat33::{determinant33, matmul33, transpose33, IDENTITY33};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_points(rng: &mut StdRng, num_points: usize) -> Vec<[f64; 3]> {
        (0..num_points)
            .map(|_| {
                [
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                ]
            })
            .collect()
    }

    fn assert_proper_rotation(r: &[[f64; 3]; 3]) {
        assert_relative_eq!(determinant33(r), 1.0, epsilon = 1e-9);
        let rt_r = matmul33(&transpose33(r), r);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(rt_r[i][j], IDENTITY33[i][j], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_fit_identity() -> Result<(), RegistrationError> {
        let mut rng = StdRng::seed_from_u64(0);
        let points = random_points(&mut rng, 30);

        let fit = solve_rigid_transform(&points, &points)?;

        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(
                    fit.transform.rotation[i][j],
                    IDENTITY33[i][j],
                    epsilon = 1e-9
                );
            }
            assert_relative_eq!(fit.transform.translation[i], 0.0, epsilon = 1e-9);
        }
        assert!(!fit.is_singular());
        Ok(())
    }

    #[test]
    fn test_fit_known_transform() -> Result<(), Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(1);
        let points_src = random_points(&mut rng, 30);

        let expected = RigidTransform::new(
            axis_angle_to_rotation_matrix(&[0.3, -1.0, 0.5], 1.2)?,
            [0.4, -0.2, 1.5],
        );
        let points_dst = points_src
            .iter()
            .map(|p| expected.apply(p))
            .collect::<Vec<_>>();

        let fit = solve_rigid_transform(&points_src, &points_dst)?;

        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(
                    fit.transform.rotation[i][j],
                    expected.rotation[i][j],
                    epsilon = 1e-9
                );
            }
            assert_relative_eq!(
                fit.transform.translation[i],
                expected.translation[i],
                epsilon = 1e-9
            );
        }
        Ok(())
    }

    #[test]
    fn test_fit_is_scale_invariant() -> Result<(), Box<dyn std::error::Error>> {
        let star = [
            [-1.2, 0.8, 0.3],
            [-0.4, 1.0, -0.2],
            [0.4, 0.9, 0.1],
            [1.2, 0.6, -0.4],
            [-0.8, 0.0, 0.5],
            [0.0, 0.0, 0.0],
            [0.8, -0.2, -0.1],
            [-0.6, -0.8, 0.2],
            [0.6, -0.9, -0.3],
        ];
        let rotation = axis_angle_to_rotation_matrix(&[0.3, -1.0, 0.5], 0.8)?;
        let translation = [0.4, -0.2, 1.5];

        for scale in [1e-6, 1e-5, 1e-4, 1e-3, 1e-2, 1e-1, 1.0, 1e1, 1e2, 1e3] {
            let expected = RigidTransform::new(rotation, translation.map(|t| t * scale));
            let points_src = star
                .iter()
                .map(|p| p.map(|x| x * scale))
                .collect::<Vec<_>>();
            let points_dst = points_src
                .iter()
                .map(|p| expected.apply(p))
                .collect::<Vec<_>>();

            let fit = solve_rigid_transform(&points_src, &points_dst)?;

            assert_eq!(fit.covariance_rank(), 3);
            for i in 0..3 {
                for j in 0..3 {
                    assert_relative_eq!(
                        fit.transform.rotation[i][j],
                        rotation[i][j],
                        epsilon = 1e-9
                    );
                }
                assert_relative_eq!(
                    fit.transform.translation[i],
                    expected.translation[i],
                    epsilon = 1e-9 * scale
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_fit_planar_points()-> Result<(), RegistrationError> {
        // rank 2 covariance still pins down the rotation
        let points_src = vec![
            [-1.2, 0.8, 0.0],
            [0.4, 0.9, 0.0],
            [0.0, 0.0, 0.0],
            [0.6, -0.9, 0.0],
        ];
        let expected = RigidTransform::new(rotation_z(0.25), [0.3, 0.2, 0.0]);
        let points_dst = points_src
            .iter()
            .map(|p| expected.apply(p))
            .collect::<Vec<_>>();

        let fit = solve_rigid_transform(&points_src, &points_dst)?;
        assert_eq!(fit.covariance_rank(), 2);
        assert!(!fit.is_singular());
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(
                    fit.transform.rotation[i][j],
                    expected.rotation[i][j],
                    epsilon = 1e-9
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_fit_mirrored_points_is_rotation() -> Result<(), RegistrationError> {
        // the unconstrained optimum is a reflection about the xz plane
        let points_src = vec![
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, -2.0, 0.0],
        ];
        let points_dst = vec![
            [1.0, 0.0, 0.0],
            [0.0, -1.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
        ];
        let fit = solve_rigid_transform(&points_src, &points_dst)?;
        assert_proper_rotation(&fit.transform.rotation);
        Ok(())
    }

    #[test]
    fn test_fit_single_pair() -> Result<(), RegistrationError> {
        let fit = solve_rigid_transform(&[[0.0, 0.0, 0.0]], &[[1.0, 2.0, 3.0]])?;
        assert_proper_rotation(&fit.transform.rotation);
        assert_eq!(fit.covariance_rank(), 0);
        assert!(fit.is_singular());
        assert_eq!(fit.transform.apply(&[0.0, 0.0, 0.0]), [1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_fit_collinear_points() -> Result<(), RegistrationError> {
        let points_src = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let points_dst = vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 2.0, 0.0]];
        let fit = solve_rigid_transform(&points_src, &points_dst)?;
        assert_eq!(fit.covariance_rank(), 1);
        assert_proper_rotation(&fit.transform.rotation);
        // the line itself is still mapped exactly
        for (src, dst) in points_src.iter().zip(points_dst.iter()) {
            let moved = fit.transform.apply(src);
            for i in 0..3 {
                assert_relative_eq!(moved[i], dst[i], epsilon = 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn test_fit_random_pairs_are_proper_rotations() -> Result<(), RegistrationError> {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let points_src = random_points(&mut rng, 6);
            let points_dst = random_points(&mut rng, 6);
            let fit = solve_rigid_transform(&points_src, &points_dst)?;
            assert_proper_rotation(&fit.transform.rotation);
        }
        Ok(())
    }

    #[test]
    fn test_fit_errors() {
        assert_eq!(
            solve_rigid_transform(&[], &[]),
            Err(RegistrationError::EmptySourceSet)
        );
        assert_eq!(
            solve_rigid_transform(&[[0.0; 3]], &[[0.0; 3], [1.0; 3]]),
            Err(RegistrationError::MismatchedLengths {
                source_len: 1,
                target_len: 2
            })
        );
    }
}
