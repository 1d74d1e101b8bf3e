//! Joint parameters.

use serde::{Deserialize, Serialize};

use boxjoint_math::{Point3, Tolerance, Vec3, VecExt};

use crate::{LayoutError, Result};

/// Everything needed to lay out a box joint along one edge.
///
/// Lengths are in mm. The edge runs from `edge_start` to `edge_end`; the
/// gaps are cut `thickness` deep from the edge into the board, in the
/// plane through `edge_start` with normal `plane_normal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointParams {
    /// First end of the edge.
    pub edge_start: Point3,
    /// Second end of the edge.
    pub edge_end: Point3,
    /// Depth of each gap, perpendicular to the edge.
    pub thickness: Vec3,
    /// Normal of the sketch plane. Extrusions cut against it.
    pub plane_normal: Vec3,
    /// Router bit diameter.
    pub tool_diameter: f64,
    /// Nominal gap width.
    pub gap_width: f64,
    /// Nominal tooth width.
    pub tooth_width: f64,
    /// Extra clearance added to every gap and taken from every tooth.
    pub wiggle_room: f64,
    /// Number of gaps along the edge; derived from the widths when unset.
    pub gap_count: Option<usize>,
    /// Extrusion distance; the thickness length when unset.
    pub extrude_extent: Option<f64>,
}

impl Default for JointParams {
    fn default() -> Self {
        Self {
            edge_start: Point3::origin(),
            edge_end: Point3::new(100.0, 0.0, 0.0),
            thickness: Vec3::new(0.0, 6.0, 0.0),
            plane_normal: Vec3::z(),
            tool_diameter: 3.175,
            gap_width: 5.0,
            tooth_width: 10.0,
            wiggle_room: 0.2,
            gap_count: None,
            extrude_extent: None,
        }
    }
}

impl JointParams {
    /// Vector from the edge start to the edge end.
    pub fn edge_vector(&self) -> Vec3 {
        self.edge_end - self.edge_start
    }

    /// Length of the edge.
    pub fn edge_length(&self) -> f64 {
        self.edge_vector().norm()
    }

    /// Unit direction along the edge.
    pub fn edge_direction(&self) -> Result<Vec3> {
        Ok(self.edge_vector().try_unit()?)
    }

    /// Number of gaps along the edge.
    ///
    /// Without an explicit count this is how many `gap + tooth` pitches fit,
    /// counting the edge as one tooth longer so that both ends get a gap.
    pub fn gap_count(&self) -> usize {
        match self.gap_count {
            Some(n) => n,
            None => {
                let pitch = self.gap_width + self.tooth_width;
                let fit = (self.edge_length() + self.tooth_width) / pitch;
                if fit.is_finite() && fit > 0.0 {
                    fit.floor() as usize
                } else {
                    0
                }
            }
        }
    }

    /// Most gaps the edge holds.
    ///
    /// The last middle gap, widened by the wiggle room, has to end before the
    /// end gap begins: `n * (gap + tooth) - 2 * tooth + wiggle <= length`.
    pub fn max_gap_count(&self) -> usize {
        let pitch = self.gap_width + self.tooth_width;
        let room = self.edge_length() + 2.0 * self.tooth_width - self.wiggle_room
            + Tolerance::DEFAULT.linear;
        let fit = room / pitch;
        if fit.is_finite() && fit > 0.0 {
            fit.floor() as usize
        } else {
            0
        }
    }

    /// Extrusion distance.
    pub fn extrude_extent(&self) -> f64 {
        self.extrude_extent.unwrap_or_else(|| self.thickness.norm())
    }

    /// Check the parameters for consistency.
    pub fn validate(&self) -> Result<()> {
        let tol = Tolerance::DEFAULT;

        let lengths = [
            ("tool_diameter", self.tool_diameter),
            ("gap_width", self.gap_width),
            ("tooth_width", self.tooth_width),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::InvalidParameters(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !self.wiggle_room.is_finite() || self.wiggle_room < 0.0 {
            return Err(LayoutError::InvalidParameters(format!(
                "wiggle_room must not be negative, got {}",
                self.wiggle_room
            )));
        }
        if self.wiggle_room >= self.tooth_width {
            return Err(LayoutError::InvalidParameters(
                "wiggle_room must be smaller than tooth_width".into(),
            ));
        }
        if let Some(extent) = self.extrude_extent {
            if !extent.is_finite() || extent <= 0.0 {
                return Err(LayoutError::InvalidParameters(format!(
                    "extrude_extent must be positive, got {extent}"
                )));
            }
        }

        let edge = self.edge_direction()?;
        self.thickness.try_unit()?;
        self.plane_normal.try_unit()?;
        if !tol.is_perpendicular(&edge, &self.thickness) {
            return Err(LayoutError::InvalidParameters(
                "thickness must be perpendicular to the edge".into(),
            ));
        }
        if !tol.is_perpendicular(&self.plane_normal, &edge)
            || !tol.is_perpendicular(&self.plane_normal, &self.thickness)
        {
            return Err(LayoutError::InvalidParameters(
                "plane_normal must be perpendicular to the edge and thickness".into(),
            ));
        }

        let radius = self.tool_diameter / 2.0;
        if radius > self.gap_width / 2.0 {
            return Err(LayoutError::InvalidParameters(format!(
                "tool radius {radius} does not fit in a {} mm gap",
                self.gap_width
            )));
        }

        let count = self.gap_count();
        if count < 2 {
            return Err(LayoutError::TooFewGaps(count));
        }
        let fits = self.max_gap_count();
        if count > fits {
            return Err(LayoutError::TooManyGaps {
                requested: count,
                fits,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        JointParams::default().validate().unwrap();
    }

    #[test]
    fn test_gap_count_from_widths() {
        let params = JointParams::default();
        assert_eq!(params.gap_count(), 7);
    }

    #[test]
    fn test_explicit_gap_count() {
        let params = JointParams {
            gap_count: Some(4),
            ..Default::default()
        };
        assert_eq!(params.gap_count(), 4);
    }

    #[test]
    fn test_extent_defaults_to_thickness() {
        let params = JointParams::default();
        assert_eq!(params.extrude_extent(), 6.0);
    }

    #[test]
    fn test_too_few_gaps() {
        let params = JointParams {
            gap_count: Some(1),
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(LayoutError::TooFewGaps(1)));

        let short = JointParams {
            edge_end: Point3::new(3.0, 0.0, 0.0),
            ..Default::default()
        };
        assert_eq!(short.validate(), Err(LayoutError::TooFewGaps(0)));
    }

    #[test]
    fn test_too_many_gaps() {
        let params = JointParams {
            gap_count: Some(12),
            ..Default::default()
        };
        assert_eq!(params.max_gap_count(), 7);
        assert_eq!(
            params.validate(),
            Err(LayoutError::TooManyGaps {
                requested: 12,
                fits: 7
            })
        );

        let huge = JointParams {
            gap_count: Some(usize::MAX),
            ..Default::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(LayoutError::TooManyGaps { .. })
        ));
    }

    #[test]
    fn test_derived_count_always_fits() {
        for (length, wiggle) in [(100.0, 0.2), (60.0, 0.0), (37.0, 9.5), (1000.0, 1.0)] {
            let params = JointParams {
                edge_end: Point3::new(length, 0.0, 0.0),
                wiggle_room: wiggle,
                ..Default::default()
            };
            assert!(params.gap_count() <= params.max_gap_count());
        }
    }

    #[test]
    fn test_rejects_slanted_thickness() {
        let params = JointParams {
            thickness: Vec3::new(1.0, 6.0, 0.0),
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(LayoutError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_rejects_tool_wider_than_gap() {
        let params = JointParams {
            tool_diameter: 6.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(LayoutError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_rejects_degenerate_edge() {
        let params = JointParams {
            edge_end: Point3::origin(),
            gap_count: Some(3),
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(LayoutError::Vector(_))));
    }

    #[test]
    fn test_rejects_wiggle_wider_than_tooth() {
        let params = JointParams {
            wiggle_room: 10.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(LayoutError::InvalidParameters(_))
        ));
    }
}
