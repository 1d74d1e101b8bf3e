//! Sketch entity types.

use serde::{Deserialize, Serialize};

use boxjoint_math::{arc_bounds, Aabb3, Point3, Tolerance, Vec3, VecExt};

use crate::KernelError;

/// Handle to a curve inside one sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurveId(pub usize);

/// Handle to a closed profile inside one sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(pub usize);

/// Handle to a feature in a document timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub usize);

/// The plane a sketch lies on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchPlane {
    /// A point on the plane.
    pub origin: Point3,
    /// Unit normal. Extrusions cut against this direction.
    pub normal: Vec3,
}

impl SketchPlane {
    /// Create a plane, normalizing `normal`.
    pub fn new(origin: Point3, normal: Vec3) -> Result<Self, KernelError> {
        Ok(Self {
            origin,
            normal: normal.try_unit()?,
        })
    }

    /// Signed distance from the plane to `p`.
    pub fn distance_to(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.normal)
    }
}

/// A curve drawn in a sketch, in model coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SketchCurve {
    /// A line segment.
    Line {
        /// Start point.
        start: Point3,
        /// End point.
        end: Point3,
    },
    /// The minor circular arc from `start` to `end` around `center`.
    Arc {
        /// Center of the arc.
        center: Point3,
        /// Start point.
        start: Point3,
        /// End point.
        end: Point3,
    },
    /// A full circle in the sketch plane.
    Circle {
        /// Center of the circle.
        center: Point3,
        /// Radius.
        radius: f64,
    },
}

/// Which end of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    /// The start point.
    Start,
    /// The end point.
    End,
}

/// One end of one curve, the target of a coincident constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurveEnd {
    /// The curve.
    pub curve: CurveId,
    /// Which end.
    pub end: Endpoint,
}

impl CurveEnd {
    /// Start of `curve`.
    pub fn start(curve: CurveId) -> Self {
        Self {
            curve,
            end: Endpoint::Start,
        }
    }

    /// End of `curve`.
    pub fn end(curve: CurveId) -> Self {
        Self {
            curve,
            end: Endpoint::End,
        }
    }
}

impl SketchCurve {
    /// Start and end points, or `None` for a closed circle.
    pub fn endpoints(&self) -> Option<(Point3, Point3)> {
        match self {
            SketchCurve::Line { start, end } => Some((*start, *end)),
            SketchCurve::Arc { start, end, .. } => Some((*start, *end)),
            SketchCurve::Circle { .. } => None,
        }
    }

    /// The point at `end`, or `None` for a circle.
    pub fn point_at(&self, end: Endpoint) -> Option<Point3> {
        self.endpoints().map(|(s, e)| match end {
            Endpoint::Start => s,
            Endpoint::End => e,
        })
    }

    /// Radius of an arc or circle.
    pub fn radius(&self) -> Option<f64> {
        match self {
            SketchCurve::Line { .. } => None,
            SketchCurve::Arc { center, start, .. } => Some((start - center).norm()),
            SketchCurve::Circle { radius, .. } => Some(*radius),
        }
    }

    /// Check the curve has usable geometry.
    pub fn validate(&self) -> Result<(), KernelError> {
        let tol = Tolerance::DEFAULT;
        let finite = |p: &Point3| p.iter().all(|c| c.is_finite());
        match self {
            SketchCurve::Line { start, end } => {
                if !finite(start) || !finite(end) {
                    return Err(KernelError::DegenerateCurve("non-finite line point".into()));
                }
                if tol.points_equal(start, end) {
                    return Err(KernelError::DegenerateCurve("zero-length line".into()));
                }
            }
            SketchCurve::Arc { center, start, end } => {
                if !finite(center) || !finite(start) || !finite(end) {
                    return Err(KernelError::DegenerateCurve("non-finite arc point".into()));
                }
                let r1 = (start - center).norm();
                let r2 = (end - center).norm();
                if r1 < tol.linear || tol.points_equal(start, end) {
                    return Err(KernelError::DegenerateCurve("zero-sweep arc".into()));
                }
                if (r1 - r2).abs() > tol.linear {
                    return Err(KernelError::DegenerateCurve(format!(
                        "arc endpoints at different radii ({r1:.6} vs {r2:.6})"
                    )));
                }
                if (start - center).cross(&(end - center)).norm() < tol.linear * r1 {
                    return Err(KernelError::DegenerateCurve(
                        "arc endpoints are diametrically opposite".into(),
                    ));
                }
            }
            SketchCurve::Circle { center, radius } => {
                if !finite(center) || !radius.is_finite() || *radius < tol.linear {
                    return Err(KernelError::DegenerateCurve("zero-radius circle".into()));
                }
            }
        }
        Ok(())
    }

    /// Bounding box of the curve. Circles are bounded in the plane with normal `normal`.
    pub fn bounding_box(&self, normal: &Vec3) -> Aabb3 {
        match self {
            SketchCurve::Line { start, end } => Aabb3::from_points([start, end]),
            SketchCurve::Arc { center, start, end } => arc_bounds(center, start, end),
            SketchCurve::Circle { center, radius } => {
                let n = normal.try_unit().unwrap_or_else(|_| Vec3::z());
                let half = Vec3::new(
                    radius * (1.0 - n.x * n.x).max(0.0).sqrt(),
                    radius * (1.0 - n.y * n.y).max(0.0).sqrt(),
                    radius * (1.0 - n.z * n.z).max(0.0).sqrt(),
                );
                Aabb3::new(center - half, center + half)
            }
        }
    }

    /// Unit direction of a line.
    pub fn line_direction(&self) -> Option<Vec3> {
        match self {
            SketchCurve::Line { start, end } => (end - start).try_unit().ok(),
            _ => None,
        }
    }
}

/// A geometric constraint between sketch curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// Two curve ends share a point.
    Coincident(CurveEnd, CurveEnd),
    /// Two lines meet at a right angle.
    Perpendicular(CurveId, CurveId),
    /// A line and an arc are tangent where they meet.
    Tangent(CurveId, CurveId),
}

/// A driving dimension with a text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Dimension {
    /// Length of a line.
    Linear {
        /// The dimensioned line.
        curve: CurveId,
        /// Length in mm.
        value: f64,
        /// Where the dimension text is placed.
        text_point: Point3,
    },
    /// Radius of an arc or circle.
    Radial {
        /// The dimensioned arc or circle.
        curve: CurveId,
        /// Radius in mm.
        value: f64,
        /// Where the dimension text is placed.
        text_point: Point3,
    },
    /// Angle between two lines.
    Angular {
        /// First line.
        first: CurveId,
        /// Second line.
        second: CurveId,
        /// Angle in radians.
        value: f64,
        /// Where the dimension text is placed.
        text_point: Point3,
    },
}

/// A closed region found in a sketch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Handle within its sketch.
    pub id: ProfileId,
    /// Bounding box in model coordinates.
    pub bounding_box: Aabb3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_validation() {
        let p = Point3::new(1.0, 1.0, 0.0);
        let line = SketchCurve::Line { start: p, end: p };
        assert!(matches!(line.validate(), Err(KernelError::DegenerateCurve(_))));
    }

    #[test]
    fn test_arc_radius_mismatch() {
        let arc = SketchCurve::Arc {
            center: Point3::origin(),
            start: Point3::new(1.0, 0.0, 0.0),
            end: Point3::new(0.0, 2.0, 0.0),
        };
        assert!(arc.validate().is_err());
    }

    #[test]
    fn test_circle_bounds_in_xy() {
        let circle = SketchCurve::Circle {
            center: Point3::new(5.0, 5.0, 1.0),
            radius: 2.0,
        };
        let bb = circle.bounding_box(&Vec3::z());
        assert!((bb.min.x - 3.0).abs() < 1e-12);
        assert!((bb.max.y - 7.0).abs() < 1e-12);
        assert!((bb.min.z - 1.0).abs() < 1e-12);
        assert!((bb.max.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_plane_normalizes() {
        let plane = SketchPlane::new(Point3::origin(), Vec3::new(0.0, 0.0, 4.0)).unwrap();
        assert!((plane.normal.norm() - 1.0).abs() < 1e-12);
        assert!((plane.distance_to(&Point3::new(3.0, 2.0, 1.5)) - 1.5).abs() < 1e-12);
        assert!(SketchPlane::new(Point3::origin(), Vec3::zeros()).is_err());
    }
}
