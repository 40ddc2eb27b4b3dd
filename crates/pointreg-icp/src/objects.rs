use pointreg_3d::pointset::PointSet;

use crate::{register_point_sets, RegistrationCriteria, RegistrationError, RegistrationResult};

/// An object with a position in 3D space.
pub trait Locatable3d {
    /// The position of the object.
    fn position(&self) -> [f64; 3];
}

impl Locatable3d for [f64; 3] {
    fn position(&self) -> [f64; 3] {
        *self
    }
}

impl<T: Locatable3d + ?Sized> Locatable3d for &T {
    fn position(&self) -> [f64; 3] {
        (**self).position()
    }
}

impl<T: Locatable3d + ?Sized> Locatable3d for Box<T> {
    fn position(&self) -> [f64; 3] {
        (**self).position()
    }
}

fn to_point_set<T: Locatable3d>(objects: &[T]) -> PointSet {
    objects
        .iter()
        .map(|o| o.position())
        .collect::<Vec<_>>()
        .into()
}

/// Register two slices of located objects and return the final matches as index pairs.
///
/// Works for objects that cannot be cloned, such as `Box<dyn Locatable3d>`.
///
/// # Returns
///
/// `(source_index, target_index)` pairs from the last iteration of the
/// registration, in source order, together with the full result.
///
/// # Errors
///
/// Same as [`register_point_sets`].
pub fn match_indices<S, T>(
    source: &[S],
    target: &[T],
    criteria: &RegistrationCriteria,
) -> Result<(Vec<(usize, usize)>, RegistrationResult), RegistrationError>
where
    S: Locatable3d,
    T: Locatable3d,
{
    let result = register_point_sets(&to_point_set(source), &to_point_set(target), criteria)?;

    let matches = result
        .final_state()
        .correspondences()
        .iter()
        .map(|c| (c.source_index, c.target_index))
        .collect();

    Ok((matches, result))
}

/// Register two slices of located objects and return the matched objects.
///
/// Each source object is paired with a clone of its nearest target object
/// after the registration. Several source objects may share a target.
pub fn match_objects<S, T>(
    source: &[S],
    target: &[T],
    criteria: &RegistrationCriteria,
) -> Result<(Vec<(S, T)>, RegistrationResult), RegistrationError>
where
    S: Locatable3d + Clone,
    T: Locatable3d + Clone,
{
    let (indices, result) = match_indices(source, target, criteria)?;

    // indices come back in source order
    let pairs = source
        .iter()
        .zip(indices)
        .map(|(s, (_, j))| {
            target
                .get(j)
                .map(|t| (s.clone(), t.clone()))
                .ok_or(RegistrationError::TargetIndexOutOfBounds(j))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((pairs, result))
}
