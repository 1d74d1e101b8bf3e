#![warn(missing_docs)]

//! Corner fillet and gap profiles for box joints.
//!
//! A router bit of diameter `d` cannot cut a sharp inside corner: it leaves a
//! rounded corner of radius `d / 2`. [`CornerFillet`] describes that leftover
//! piece at the floor of a gap (two straight edges meeting at the corner and
//! the arc the tool leaves between them). [`Gap`] describes the rectangular
//! slot itself.
//!
//! Both types compute their geometry up front and write it to a sketch once
//! through [`boxjoint_sketch::SketchWriter`].

mod base;
mod corner;
mod gap;

pub use base::FilletBase;
pub use corner::{CornerFillet, FilletSketch, TINY_WIDTH_FRACTION};
pub use gap::{Gap, GapSketch};

use boxjoint_math::VectorError;
use boxjoint_sketch::KernelError;
use thiserror::Error;

/// Errors from building or drawing fillet and gap profiles.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilletError {
    /// A vector input was zero-length or non-finite.
    #[error(transparent)]
    Vector(#[from] VectorError),

    /// The sketch rejected an entity.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// Tool diameter must be positive and finite.
    #[error("invalid tool diameter: {0}")]
    InvalidToolDiameter(f64),

    /// Width and thickness vectors must be perpendicular.
    #[error("width and thickness vectors are not perpendicular")]
    NotPerpendicular,

    /// The tool radius does not fit in half the width.
    #[error("tool radius {radius:.4} exceeds half width {half_width:.4}")]
    RadiusExceedsHalfWidth {
        /// Tool radius in mm.
        radius: f64,
        /// Half of the width vector's length in mm.
        half_width: f64,
    },

    /// Wiggle room must be finite and not negative.
    #[error("invalid wiggle room: {0}")]
    InvalidWiggleRoom(f64),
}
