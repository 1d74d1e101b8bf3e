#![warn(missing_docs)]

//! Math types for box-joint layout.
//!
//! Thin wrappers around nalgebra providing the point and vector types the
//! layout code works in, tolerance constants, checked vector operations
//! and axis-aligned bounding boxes.
//!
//! All values are `Copy`. Operations never mutate a shared value in place;
//! translating a point or scaling a vector always produces a new value.

mod bbox;
mod vector;

pub use bbox::{arc_bounds, Aabb3};
pub use vector::{reflect_point, VecExt, VectorError};

use nalgebra::Vector3;

/// A point in 3D model space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default CAD tolerances (1e-6 mm linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if two non-zero vectors are perpendicular.
    ///
    /// The cosine of the angle between them must be below the linear tolerance.
    pub fn is_perpendicular(&self, a: &Vec3, b: &Vec3) -> bool {
        let la = a.norm();
        let lb = b.norm();
        if la < self.linear || lb < self.linear {
            return false;
        }
        (a.dot(b) / (la * lb)).abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
