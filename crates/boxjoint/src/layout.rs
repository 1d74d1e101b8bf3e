//! Gap-first edge layout.
//!
//! The edge starts and ends with a gap. Between them the teeth and gaps
//! alternate; only the first of the middle gaps (the "mid gap") and its two
//! fillets are laid out here, the rest are produced by patterning it.
//!
//! ```text
//!  start                                                      end
//!   |gap|  tooth  |gap|  tooth  |gap| ... |gap|  tooth  |gap|
//!   \___/         \___/                                 \___/
//!   edge gap      mid gap (template)                    edge gap
//! ```
//!
//! Every gap is widened by the wiggle room and every tooth narrowed by it, so
//! the pitch stays `gap_width + tooth_width`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use boxjoint_fillet::{CornerFillet, Gap};
use boxjoint_math::{Point3, Vec3};
use boxjoint_sketch::SketchPlane;

use crate::{JointParams, Result};

/// Offsets along the edge, all parallel to the edge direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeVectors {
    /// Unit edge direction.
    pub direction: Vec3,
    /// Nominal gap width.
    pub gap: Vec3,
    /// Half the nominal gap width.
    pub half_gap: Vec3,
    /// Nominal tooth width.
    pub tooth: Vec3,
    /// Half the wiggle room.
    pub half_wiggle: Vec3,
    /// Gap width plus the full wiggle room.
    pub wide_gap: Vec3,
    /// Tooth width minus the full wiggle room.
    pub narrow_tooth: Vec3,
    /// Gap width plus half the wiggle room: the width an edge gap opens
    /// past the edge end it sits on.
    pub edge_gap: Vec3,
}

impl EdgeVectors {
    /// Derive the offsets for `params`.
    pub fn new(params: &JointParams) -> Result<Self> {
        let direction = params.edge_direction()?;
        let gap = direction * params.gap_width;
        let half_wiggle = direction * (params.wiggle_room / 2.0);
        let wiggle = direction * params.wiggle_room;
        let tooth = direction * params.tooth_width;
        Ok(Self {
            direction,
            gap,
            half_gap: gap * 0.5,
            tooth,
            half_wiggle,
            wide_gap: gap + wiggle,
            narrow_tooth: tooth - wiggle,
            edge_gap: gap + half_wiggle,
        })
    }
}

/// The gap after the first tooth, with the fillets at its two inside
/// corners. Patterned along the edge to produce the other middle gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidSection {
    /// The template gap.
    pub gap: Gap,
    /// Fillet at the corner nearer the edge start.
    pub left_fillet: CornerFillet,
    /// Fillet at the corner nearer the edge end.
    pub right_fillet: CornerFillet,
}

/// Complete geometry for one edge, ready to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeLayout {
    /// Plane all sketches are drawn on.
    pub plane: SketchPlane,
    /// Offsets used to place everything.
    pub vectors: EdgeVectors,
    /// Border rectangle corners: start, end, end + thickness, start + thickness.
    pub border: [Point3; 4],
    /// Gap at the edge start.
    pub start_gap: Gap,
    /// Gap at the edge end.
    pub end_gap: Gap,
    /// Fillet at the inside corner of the start gap.
    pub start_fillet: CornerFillet,
    /// Fillet at the inside corner of the end gap.
    pub end_fillet: CornerFillet,
    /// Template for the middle gaps; `None` when the edge only holds the two
    /// edge gaps.
    pub mid: Option<MidSection>,
    /// Total number of gaps along the edge.
    pub gap_count: usize,
    /// Distance between neighbouring middle gaps.
    pub gap_spacing: f64,
    /// Pattern instances, the template included.
    pub pattern_count: usize,
    /// Unit pattern direction.
    pub pattern_direction: Vec3,
    /// Extrusion distance.
    pub extrude_extent: f64,
}

/// Lays out a box joint whose edge starts and ends with a gap.
#[derive(Debug, Clone)]
pub struct GapFirstBoxJoint {
    params: JointParams,
}

impl GapFirstBoxJoint {
    /// Create a planner, validating `params`.
    pub fn new(params: JointParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The parameters being laid out.
    pub fn params(&self) -> &JointParams {
        &self.params
    }

    /// Compute every profile along the edge.
    pub fn plan(&self) -> Result<EdgeLayout> {
        let p = &self.params;
        let v = EdgeVectors::new(p)?;
        let t = p.thickness;
        let start = p.edge_start;
        let end = p.edge_end;

        let plane = SketchPlane::new(start, p.plane_normal)?;
        let border = [start, end, end + t, start + t];

        let start_gap =
            Gap::new(start + v.half_gap, v.half_gap, t)?.with_wiggle_room(p.wiggle_room)?;
        let end_gap = Gap::new(end - v.half_gap, v.half_gap, t)?.with_wiggle_room(p.wiggle_room)?;

        let start_fillet =
            CornerFillet::new(start + t + v.edge_gap, -v.edge_gap, -t, p.tool_diameter)?;
        let end_fillet =
            CornerFillet::new(end + t - v.edge_gap, v.edge_gap, -t, p.tool_diameter)?;

        let gap_count = p.gap_count();
        let mid = if gap_count > 2 {
            Some(self.mid_section(&v)?)
        } else {
            None
        };
        let pattern_count = gap_count.saturating_sub(2);
        let gap_spacing = (v.narrow_tooth + v.wide_gap).norm();

        debug!(
            gap_count,
            pattern_count,
            gap_spacing,
            has_mid = mid.is_some(),
            "planned edge layout"
        );

        Ok(EdgeLayout {
            plane,
            vectors: v,
            border,
            start_gap,
            end_gap,
            start_fillet,
            end_fillet,
            mid,
            gap_count,
            gap_spacing,
            pattern_count,
            pattern_direction: v.direction,
            extrude_extent: p.extrude_extent(),
        })
    }

    fn mid_section(&self, v: &EdgeVectors) -> Result<MidSection> {
        let p = &self.params;
        let t = p.thickness;

        let gap_ref = p.edge_start + v.gap + v.tooth + v.half_gap;
        let gap = Gap::new(gap_ref, v.half_gap, t)?.with_wiggle_room(p.wiggle_room)?;

        let left_ref = p.edge_start + t + v.wide_gap - v.half_wiggle + v.narrow_tooth;
        let left_fillet = CornerFillet::new(left_ref, v.wide_gap, -t, p.tool_diameter)?;
        let right_fillet =
            CornerFillet::new(left_ref + v.wide_gap, -v.wide_gap, -t, p.tool_diameter)?;

        Ok(MidSection {
            gap,
            left_fillet,
            right_fillet,
        })
    }
}
