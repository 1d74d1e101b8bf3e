//! Checked vector operations.
//!
//! Host CAD kernels report a failed `normalize` or `scaleBy` with a boolean.
//! Here the same operations return a [`VectorError`] so a degenerate input
//! is never mistaken for success.

use thiserror::Error;

use crate::{Point3, Vec3};

/// Errors from vector operations on degenerate input.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum VectorError {
    /// The vector has zero length and has no direction.
    #[error("degenerate vector: length {0:e} is below tolerance")]
    DegenerateVector(f64),

    /// A component or scale factor is NaN or infinite.
    #[error("non-finite value in vector operation")]
    NonFinite,
}

const MIN_LENGTH: f64 = 1e-12;

/// Checked operations on [`Vec3`].
pub trait VecExt: Sized {
    /// Unit vector in the same direction.
    fn try_unit(&self) -> Result<Self, VectorError>;

    /// This vector scaled by `factor`.
    fn try_scaled(&self, factor: f64) -> Result<Self, VectorError>;

    /// A vector in the same direction with the given length.
    ///
    /// Equivalent to normalizing then scaling. A negative length flips the
    /// direction.
    fn with_length(&self, length: f64) -> Result<Self, VectorError> {
        self.try_unit()?.try_scaled(length)
    }
}

impl VecExt for Vec3 {
    fn try_unit(&self) -> Result<Self, VectorError> {
        if !self.iter().all(|c| c.is_finite()) {
            return Err(VectorError::NonFinite);
        }
        let len = self.norm();
        if len < MIN_LENGTH {
            return Err(VectorError::DegenerateVector(len));
        }
        Ok(self / len)
    }

    fn try_scaled(&self, factor: f64) -> Result<Self, VectorError> {
        if !factor.is_finite() || !self.iter().all(|c| c.is_finite()) {
            return Err(VectorError::NonFinite);
        }
        Ok(self * factor)
    }
}

/// Mirror a point across the plane through `plane_point` with normal `plane_normal`.
pub fn reflect_point(
    p: &Point3,
    plane_point: &Point3,
    plane_normal: &Vec3,
) -> Result<Point3, VectorError> {
    let n = plane_normal.try_unit()?;
    let d = (p - plane_point).dot(&n);
    Ok(p - 2.0 * d * n)
}
