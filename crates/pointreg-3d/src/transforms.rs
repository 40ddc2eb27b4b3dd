use pointreg_linalg::mat33::{mat33_mul_vec3, matmul33, transpose33, IDENTITY33};

/// Errors raised when building transforms.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TransformError {
    /// The rotation axis has (near) zero length.
    #[error("cannot compute rotation matrix from a zero vector")]
    ZeroAxis,
}

/// A rigid transform `p' = R * p + t`.
///
/// The rotation is stored row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RigidTransform {
    /// Rotation matrix.
    pub rotation: [[f64; 3]; 3],
    /// Translation vector.
    pub translation: [f64; 3],
}

impl RigidTransform {
    /// Create a transform from a rotation and a translation.
    pub fn new(rotation: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self::new(IDENTITY33, [0.0; 3])
    }

    /// Apply the transform to a single point.
    pub fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        let p = mat33_mul_vec3(&self.rotation, point);
        [
            p[0] + self.translation[0],
            p[1] + self.translation[1],
            p[2] + self.translation[2],
        ]
    }

    /// Compose two transforms: the result applies `first`, then `self`.
    ///
    /// R = R_self * R_first, t = R_self * t_first + t_self
    pub fn compose(&self, first: &RigidTransform) -> RigidTransform {
        RigidTransform {
            rotation: matmul33(&self.rotation, &first.rotation),
            translation: self.apply(&first.translation),
        }
    }

    /// The inverse transform, assuming the rotation is orthogonal.
    pub fn inverse(&self) -> RigidTransform {
        let rotation = transpose33(&self.rotation);
        let t = mat33_mul_vec3(&rotation, &self.translation);
        RigidTransform {
            rotation,
            translation: [-t[0], -t[1], -t[2]],
        }
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Compute the rotation matrix from an axis and angle.
///
/// # Arguments
///
/// * `axis` - The axis of rotation. It does not need to be normalized.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The row-major rotation matrix.
///
/// Example:
///
/// ```
/// use pointreg_3d::transforms::axis_angle_to_rotation_matrix;
///
/// let axis = [1.0, 0.0, 0.0];
/// let angle = std::f64::consts::PI / 2.0;
/// let rotation = axis_angle_to_rotation_matrix(&axis, angle).unwrap();
/// assert!((rotation[1][2] + 1.0).abs() < 1e-12);
/// ```
pub fn axis_angle_to_rotation_matrix(
    axis: &[f64; 3],
    angle: f64,
) -> Result<[[f64; 3]; 3], TransformError> {
    let magnitude = (axis[0].powi(2) + axis[1].powi(2) + axis[2].powi(2)).sqrt();
    if magnitude < 1e-10 {
        return Err(TransformError::ZeroAxis);
    }

    let x = axis[0] / magnitude;
    let y = axis[1] / magnitude;
    let z = axis[2] / magnitude;

    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;

    let m00 = c + x * x * t;
    let m11 = c + y * y * t;
    let m22 = c + z * z * t;

    let tmp1 = x * y * t;
    let tmp2 = z * s;

    let m10 = tmp1 + tmp2;
    let m01 = tmp1 - tmp2;

    let tmp3 = x * z * t;
    let tmp4 = y * s;

    let m20 = tmp3 - tmp4;
    let m02 = tmp3 + tmp4;

    let tmp5 = y * z * t;
    let tmp6 = x * s;

    let m12 = tmp5 - tmp6;
    let m21 = tmp5 + tmp6;

    Ok([[m00, m01, m02], [m10, m11, m12], [m20, m21, m22]])
}

/// Rotation of `angle` radians about the Z axis.
pub fn rotation_z(angle: f64) -> [[f64; 3]; 3] {
    let (s, c) = angle.sin_cos();
    [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
}
