//! Rounded corner left by the cutting tool at the floor of a gap.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};
use tracing::trace;

use boxjoint_math::{arc_bounds, Aabb3, Point3, Tolerance, Vec3, VecExt};
use boxjoint_sketch::{Constraint, CurveEnd, CurveId, Dimension, SketchWriter};

use crate::{FilletBase, FilletError};

/// Fraction of the width used as clearance between the fillet and the wall.
///
/// The corner is pushed this far back into the wall so the fillet piece
/// overlaps the wall instead of sharing a face with it.
pub const TINY_WIDTH_FRACTION: f64 = 0.01;

/// Fillet profile at one inside corner of a gap.
///
/// `ref_point` is the sharp corner. `width_vector` points from the corner
/// along the gap floor into the gap and `thickness_vector` points from the
/// corner up the wall. The two must be perpendicular.
///
/// The profile is two lines from the (clearance-shifted) corner to the
/// tangent points and the tool arc between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerFillet {
    base: FilletBase,
    ref_point: Point3,
    thickness_vector: Vec3,
    width_vector: Vec3,

    half_width_vector: Vec3,
    tiny_width_vector: Vec3,
    quarter_width_perp_vector: Vec3,

    front_point: Point3,
    front_gap_point: Point3,
    back_gap_point: Point3,
    angle_text_point: Point3,
}

/// Entities written by [`CornerFillet::draw_sketch`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilletSketch {
    /// Line from the corner up the wall.
    pub front_line: CurveId,
    /// Line from the corner along the floor.
    pub gap_line: CurveId,
    /// Tool arc.
    pub arc: CurveId,
    /// Bounding box of the closed profile.
    pub bounding_box: Aabb3,
}

impl CornerFillet {
    /// Compute the fillet geometry.
    pub fn new(
        ref_point: Point3,
        width_vector: Vec3,
        thickness_vector: Vec3,
        tool_diameter: f64,
    ) -> Result<Self, FilletError> {
        if !Tolerance::DEFAULT.is_perpendicular(&width_vector, &thickness_vector) {
            return Err(FilletError::NotPerpendicular);
        }

        let half_width_vector = width_vector.try_scaled(0.5)?;
        let tiny_width_vector = width_vector.try_scaled(TINY_WIDTH_FRACTION)?;
        let quarter_width_perp_vector = thickness_vector.with_length(width_vector.norm() / 4.0)?;

        let back_gap_point = ref_point - tiny_width_vector;
        let base = FilletBase::new(back_gap_point, &width_vector, &thickness_vector, tool_diameter)?;

        let half_width = half_width_vector.norm();
        if base.radius() > half_width {
            return Err(FilletError::RadiusExceedsHalfWidth {
                radius: base.radius(),
                half_width,
            });
        }

        Ok(Self {
            base,
            ref_point,
            thickness_vector,
            width_vector,
            half_width_vector,
            tiny_width_vector,
            quarter_width_perp_vector,
            front_point: base.arc_end(),
            front_gap_point: base.arc_start(),
            back_gap_point,
            angle_text_point: base.center_point() + quarter_width_perp_vector,
        })
    }

    /// Arc center.
    pub fn center_point(&self) -> Point3 {
        self.base.center_point()
    }

    /// Arc radius (half the tool diameter).
    pub fn radius(&self) -> f64 {
        self.base.radius()
    }

    /// The sharp corner this fillet was built for.
    pub fn ref_point(&self) -> Point3 {
        self.ref_point
    }

    /// Width vector as given.
    pub fn width_vector(&self) -> Vec3 {
        self.width_vector
    }

    /// Thickness vector as given.
    pub fn thickness_vector(&self) -> Vec3 {
        self.thickness_vector
    }

    /// Half of the width vector.
    pub fn half_width_vector(&self) -> Vec3 {
        self.half_width_vector
    }

    /// Clearance vector, [`TINY_WIDTH_FRACTION`] of the width.
    pub fn tiny_width_vector(&self) -> Vec3 {
        self.tiny_width_vector
    }

    /// Perpendicular to the width, a quarter of its length. Offsets the
    /// angular dimension text.
    pub fn quarter_width_perp_vector(&self) -> Vec3 {
        self.quarter_width_perp_vector
    }

    /// Tangent point on the wall.
    pub fn front_point(&self) -> Point3 {
        self.front_point
    }

    /// Tangent point on the floor.
    pub fn front_gap_point(&self) -> Point3 {
        self.front_gap_point
    }

    /// Corner shifted back into the wall by the clearance.
    pub fn back_gap_point(&self) -> Point3 {
        self.back_gap_point
    }

    /// Anchor for the angular dimension text.
    pub fn angle_text_point(&self) -> Point3 {
        self.angle_text_point
    }

    /// Bounding box of the profile.
    pub fn bounding_box(&self) -> Aabb3 {
        let lines = Aabb3::from_points([
            &self.back_gap_point,
            &self.front_point,
            &self.front_gap_point,
        ]);
        lines.union(&arc_bounds(
            &self.center_point(),
            &self.front_gap_point,
            &self.front_point,
        ))
    }

    /// Write the profile, its constraints and dimensions to `sketch`.
    ///
    /// Stops at the first entity the sketch rejects; entities already written
    /// stay in the sketch.
    pub fn draw_sketch<S: SketchWriter + ?Sized>(
        &self,
        sketch: &mut S,
    ) -> Result<FilletSketch, FilletError> {
        let front_line = sketch.add_line(self.back_gap_point, self.front_point)?;
        let gap_line = sketch.add_line(self.back_gap_point, self.front_gap_point)?;
        let arc = sketch.add_arc(self.center_point(), self.front_gap_point, self.front_point)?;

        sketch.add_constraint(Constraint::Coincident(
            CurveEnd::start(front_line),
            CurveEnd::start(gap_line),
        ))?;
        sketch.add_constraint(Constraint::Coincident(
            CurveEnd::end(gap_line),
            CurveEnd::start(arc),
        ))?;
        sketch.add_constraint(Constraint::Coincident(
            CurveEnd::end(arc),
            CurveEnd::end(front_line),
        ))?;
        sketch.add_constraint(Constraint::Perpendicular(front_line, gap_line))?;
        sketch.add_constraint(Constraint::Tangent(arc, gap_line))?;
        sketch.add_constraint(Constraint::Tangent(arc, front_line))?;

        sketch.add_dimension(Dimension::Radial {
            curve: arc,
            value: self.radius(),
            text_point: self.center_point() + self.half_width_vector,
        })?;
        sketch.add_dimension(Dimension::Angular {
            first: front_line,
            second: gap_line,
            value: FRAC_PI_2,
            text_point: self.angle_text_point,
        })?;

        trace!(sketch = sketch.name(), ?front_line, ?gap_line, ?arc, "drew corner fillet");

        Ok(FilletSketch {
            front_line,
            gap_line,
            arc,
            bounding_box: self.bounding_box(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use boxjoint_sketch::{MemorySketch, ProfileSource, SketchPlane};

    fn fillet() -> CornerFillet {
        CornerFillet::new(
            Point3::new(10.0, 6.0, 0.0),
            Vec3::new(-5.0, 0.0, 0.0),
            Vec3::new(0.0, -6.0, 0.0),
            3.175,
        )
        .unwrap()
    }

    #[test]
    fn test_center_is_radius_from_front() {
        let f = fillet();
        assert_relative_eq!((f.center_point() - f.front_point()).norm(), 1.5875, epsilon = 1e-9);
        assert_relative_eq!(
            (f.center_point() - f.front_gap_point()).norm(),
            1.5875,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_derived_vectors() {
        let f = fillet();
        assert_relative_eq!(f.half_width_vector().norm(), 2.5, epsilon = 1e-12);
        assert_relative_eq!(
            f.tiny_width_vector().norm(),
            5.0 * TINY_WIDTH_FRACTION,
            epsilon = 1e-12
        );
        assert!(f.tiny_width_vector().normalize().dot(&Vec3::new(-1.0, 0.0, 0.0)) > 1.0 - 1e-12);
        assert_relative_eq!(f.quarter_width_perp_vector().norm(), 1.25, epsilon = 1e-12);
        assert!(f.quarter_width_perp_vector().dot(&f.width_vector()).abs() < 1e-12);
    }

    #[test]
    fn test_back_gap_point_sits_in_wall() {
        let f = fillet();
        assert_relative_eq!(f.back_gap_point().x, 10.05, epsilon = 1e-12);
        assert_relative_eq!(f.back_gap_point().y, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_non_perpendicular() {
        let err = CornerFillet::new(
            Point3::origin(),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            1.0,
        )
        .unwrap_err();
        assert_eq!(err, FilletError::NotPerpendicular);
    }

    #[test]
    fn test_rejects_radius_larger_than_half_width() {
        let err = CornerFillet::new(Point3::origin(), Vec3::x() * 2.0, Vec3::y(), 3.0).unwrap_err();
        assert!(matches!(err, FilletError::RadiusExceedsHalfWidth { .. }));
    }

    #[test]
    fn test_degenerate_width() {
        let err = CornerFillet::new(Point3::origin(), Vec3::zeros(), Vec3::y(), 1.0).unwrap_err();
        assert_eq!(err, FilletError::NotPerpendicular);
    }

    #[test]
    fn test_draw_sketch_forms_one_profile() {
        let f = fillet();
        let mut sketch = MemorySketch::new(SketchPlane::new(Point3::origin(), Vec3::z()).unwrap());
        let drawn = f.draw_sketch(&mut sketch).unwrap();

        assert_eq!(sketch.curves().len(), 3);
        assert_eq!(sketch.constraints().len(), 6);
        assert_eq!(sketch.dimensions().len(), 2);

        let profiles = sketch.profiles().unwrap();
        assert_eq!(profiles.len(), 1);
        assert!(profiles[0]
            .bounding_box
            .approx_eq(&drawn.bounding_box, &Tolerance::DEFAULT));
    }

    #[test]
    fn test_profile_box_spans_radius() {
        let f = fillet();
        let bb = f.bounding_box();
        // x from the arc start (10.05 - r) to the shifted corner, y from 6 - r to 6.
        assert_relative_eq!(bb.max.x, 10.05, epsilon = 1e-9);
        assert_relative_eq!(bb.min.x, 10.05 - 1.5875, epsilon = 1e-9);
        assert_relative_eq!(bb.max.y, 6.0, epsilon = 1e-9);
        assert_relative_eq!(bb.min.y, 6.0 - 1.5875, epsilon = 1e-9);
    }

    #[test]
    fn test_center_holds_for_every_orientation() {
        let r = 1.5875;
        let w = Vec3::new(5.0, 0.0, 0.0);
        let t = Vec3::new(0.0, 6.0, 0.0);
        let mut pairs = vec![(w, t), (-w, t), (w, -t), (-w, -t)];
        // edge along z with the board in x
        pairs.push((Vec3::new(0.0, 0.0, 5.0), Vec3::new(-6.0, 0.0, 0.0)));
        // skewed pair in space
        pairs.push((Vec3::new(3.0, 4.0, 0.0), Vec3::new(0.0, 0.0, 6.0)));

        let reference = Point3::new(10.0, 6.0, 2.0);
        for (width, thickness) in pairs {
            let f = CornerFillet::new(reference, width, thickness, 3.175).unwrap();
            let center = f.center_point();

            assert_relative_eq!((center - f.front_point()).norm(), r, epsilon = 1e-9);
            assert_relative_eq!((center - f.front_gap_point()).norm(), r, epsilon = 1e-9);

            // the arc bulges away from the corner into the gap
            let from_corner = center - f.back_gap_point();
            assert_relative_eq!(from_corner.dot(&width.normalize()), r, epsilon = 1e-9);
            assert_relative_eq!(from_corner.dot(&thickness.normalize()), r, epsilon = 1e-9);

            let normal = width.cross(&thickness);
            let plane = SketchPlane::new(reference, normal).unwrap();
            let mut sketch = MemorySketch::new(plane);
            f.draw_sketch(&mut sketch).unwrap();
            assert_eq!(sketch.profiles().unwrap().len(), 1);
        }
    }
}
