//! Axis-aligned bounding boxes.
//!
//! Boxes are used to identify sketch profiles and to find the extruded
//! features that correspond to a profile.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::{Point3, Tolerance};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest AABB containing all `points`.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Smallest AABB containing both boxes.
    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        let mut out = *self;
        out.include_point(&other.min);
        out.include_point(&other.max);
        out
    }

    /// Test if two AABBs intersect (touching counts as intersecting).
    pub fn intersects(&self, other: &Aabb3) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// This box moved by `offset`.
    pub fn translated(&self, offset: &crate::Vec3) -> Aabb3 {
        Aabb3::new(self.min + offset, self.max + offset)
    }

    /// Whether both corners match `other` within the linear tolerance.
    pub fn approx_eq(&self, other: &Aabb3, tol: &Tolerance) -> bool {
        tol.points_equal(&self.min, &other.min) && tol.points_equal(&self.max, &other.max)
    }

    /// Check if the bounding box is valid (non-empty).
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Center of the box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Size of the box along each axis.
    pub fn extent(&self) -> crate::Vec3 {
        self.max - self.min
    }
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}

/// Bounding box of the minor circular arc from `start` to `end` about `center`.
///
/// Includes both endpoints and every axis extremum the arc passes through.
/// When `start` and `end` are diametrically opposite the arc plane is
/// undefined and only the endpoints are included.
pub fn arc_bounds(center: &Point3, start: &Point3, end: &Point3) -> Aabb3 {
    let mut aabb = Aabb3::from_points([start, end]);

    let u = start - center;
    let w = end - center;
    let radius = u.norm();
    let m = u.cross(&w);
    if radius < 1e-12 || m.norm() < 1e-12 {
        return aabb;
    }

    let sweep = m.norm().atan2(u.dot(&w));
    let e1 = u / radius;
    let e2 = m.normalize().cross(&e1);

    for k in 0..3 {
        let base = e2[k].atan2(e1[k]);
        for theta in [base, base + PI] {
            let theta = theta.rem_euclid(TAU);
            if theta <= sweep {
                let p = center + radius * (theta.cos() * e1 + theta.sin() * e2);
                aabb.include_point(&p);
            }
        }
    }

    aabb
}
