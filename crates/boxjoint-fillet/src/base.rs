//! Shared arc geometry for a rounded corner.

use serde::{Deserialize, Serialize};

use boxjoint_math::{Point3, Vec3, VecExt};

use crate::FilletError;

/// Arc of radius `tool_diameter / 2` tangent to two perpendicular edges
/// that meet at a corner.
///
/// `arc_start` lies on the width edge and `arc_end` on the thickness edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilletBase {
    center: Point3,
    radius: f64,
    arc_start: Point3,
    arc_end: Point3,
}

impl FilletBase {
    /// Place the arc for the corner at `corner` whose edges run along
    /// `width_dir` and `thickness_dir`.
    ///
    /// Only the directions of the two vectors are used.
    pub fn new(
        corner: Point3,
        width_dir: &Vec3,
        thickness_dir: &Vec3,
        tool_diameter: f64,
    ) -> Result<Self, FilletError> {
        if !tool_diameter.is_finite() || tool_diameter <= 0.0 {
            return Err(FilletError::InvalidToolDiameter(tool_diameter));
        }
        let radius = tool_diameter / 2.0;
        let along_width = width_dir.with_length(radius)?;
        let along_thickness = thickness_dir.with_length(radius)?;

        Ok(Self {
            center: corner + along_width + along_thickness,
            radius,
            arc_start: corner + along_width,
            arc_end: corner + along_thickness,
        })
    }

    /// Arc center.
    pub fn center_point(&self) -> Point3 {
        self.center
    }

    /// Arc radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Tangent point on the width edge.
    pub fn arc_start(&self) -> Point3 {
        self.arc_start
    }

    /// Tangent point on the thickness edge.
    pub fn arc_end(&self) -> Point3 {
        self.arc_end
    }
}
