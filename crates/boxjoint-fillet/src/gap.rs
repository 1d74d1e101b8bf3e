//! Rectangular slot cut between two teeth.

use serde::{Deserialize, Serialize};
use tracing::trace;

use boxjoint_math::{Aabb3, Point3, Tolerance, Vec3, VecExt};
use boxjoint_sketch::{Constraint, CurveEnd, CurveId, Dimension, SketchWriter};

use crate::FilletError;

/// A gap profile centered on `ref_point`.
///
/// The rectangle spans `ref_point ± (half_width + wiggle_room / 2)` along the
/// half width vector and extends `thickness_vector` from there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    ref_point: Point3,
    half_width_vector: Vec3,
    thickness_vector: Vec3,
    wiggle_room: f64,
    bounding_box: Option<Aabb3>,
}

/// Entities written by [`Gap::sketch`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapSketch {
    /// Lines a→b, b→c, c→d, d→a.
    pub lines: [CurveId; 4],
    /// Bounding box of the rectangle.
    pub bounding_box: Aabb3,
}

impl Gap {
    /// Create a gap with no wiggle room.
    pub fn new(
        ref_point: Point3,
        half_width_vector: Vec3,
        thickness_vector: Vec3,
    ) -> Result<Self, FilletError> {
        half_width_vector.try_unit()?;
        thickness_vector.try_unit()?;
        if !Tolerance::DEFAULT.is_perpendicular(&half_width_vector, &thickness_vector) {
            return Err(FilletError::NotPerpendicular);
        }
        Ok(Self {
            ref_point,
            half_width_vector,
            thickness_vector,
            wiggle_room: 0.0,
            bounding_box: None,
        })
    }

    /// Widen the gap by `wiggle_room` in total, half on each side.
    pub fn with_wiggle_room(mut self, wiggle_room: f64) -> Result<Self, FilletError> {
        if !wiggle_room.is_finite() || wiggle_room < 0.0 {
            return Err(FilletError::InvalidWiggleRoom(wiggle_room));
        }
        self.wiggle_room = wiggle_room;
        self.bounding_box = None;
        Ok(self)
    }

    /// Center of the gap mouth.
    pub fn ref_point(&self) -> Point3 {
        self.ref_point
    }

    /// Half width vector as given.
    pub fn half_width_vector(&self) -> Vec3 {
        self.half_width_vector
    }

    /// Depth of the gap.
    pub fn thickness_vector(&self) -> Vec3 {
        self.thickness_vector
    }

    /// Extra clearance across the gap.
    pub fn wiggle_room(&self) -> f64 {
        self.wiggle_room
    }

    /// Half width vector extended by half the wiggle room.
    pub fn extended_half_width(&self) -> Result<Vec3, FilletError> {
        let len = self.half_width_vector.norm() + self.wiggle_room / 2.0;
        Ok(self.half_width_vector.with_length(len)?)
    }

    /// Rectangle corners `[a, b, c, d]`: `a`/`b` on the mouth, `c`/`d` at
    /// the bottom.
    pub fn corners(&self) -> Result<[Point3; 4], FilletError> {
        let ext = self.extended_half_width()?;
        let a = self.ref_point - ext;
        let b = self.ref_point + ext;
        Ok([a, b, b + self.thickness_vector, a + self.thickness_vector])
    }

    /// Bounding box of the rectangle, once it has been sketched.
    pub fn bounding_box(&self) -> Option<Aabb3> {
        self.bounding_box
    }

    /// Draw the rectangle with its constraints and dimensions.
    pub fn sketch<S: SketchWriter + ?Sized>(
        &mut self,
        sketch: &mut S,
    ) -> Result<GapSketch, FilletError> {
        let [a, b, c, d] = self.corners()?;
        let ext = self.extended_half_width()?;

        let lines = [
            sketch.add_line(a, b)?,
            sketch.add_line(b, c)?,
            sketch.add_line(c, d)?,
            sketch.add_line(d, a)?,
        ];
        for i in 0..4 {
            sketch.add_constraint(Constraint::Coincident(
                CurveEnd::end(lines[i]),
                CurveEnd::start(lines[(i + 1) % 4]),
            ))?;
        }
        sketch.add_constraint(Constraint::Perpendicular(lines[0], lines[1]))?;
        sketch.add_constraint(Constraint::Perpendicular(lines[1], lines[2]))?;

        sketch.add_dimension(Dimension::Linear {
            curve: lines[0],
            value: 2.0 * ext.norm(),
            text_point: self.ref_point - self.thickness_vector * 0.25,
        })?;
        sketch.add_dimension(Dimension::Linear {
            curve: lines[1],
            value: self.thickness_vector.norm(),
            text_point: b + self.thickness_vector * 0.5 + ext * 0.25,
        })?;

        let bounding_box = Aabb3::from_points([&a, &b, &c, &d]);
        self.bounding_box = Some(bounding_box);
        trace!(sketch = sketch.name(), ?lines, "drew gap");

        Ok(GapSketch {
            lines,
            bounding_box,
        })
    }
}
