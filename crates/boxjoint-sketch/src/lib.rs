#![warn(missing_docs)]

//! Sketch entities and host capability traits for box-joint layout.
//!
//! The layout code never talks to a CAD kernel directly. It writes through a
//! handful of narrow traits:
//!
//! - [`SketchFactory`] creates sketches on a plane
//! - [`SketchWriter`] draws curves, constraints and dimensions into a sketch
//! - [`ProfileSource`] reads back the closed profiles of a sketch
//! - [`ExtrudeDriver`] turns profiles into extrude features
//! - [`FeatureQuery`] lists extrude features with per-face bounding boxes
//! - [`PatternDriver`] repeats features along a direction
//!
//! [`MemoryDocument`] implements all of them in memory so the layout can be
//! exercised without a host kernel.
//!
//! # Example
//!
//! ```
//! use boxjoint_math::{Point3, Vec3};
//! use boxjoint_sketch::{MemoryDocument, ProfileSource, SketchFactory, SketchPlane, SketchWriter};
//!
//! let mut doc = MemoryDocument::new();
//! let plane = SketchPlane::new(Point3::origin(), Vec3::z()).unwrap();
//! let mut sketch = doc.create_sketch(&plane).unwrap();
//! sketch.set_name("outline").unwrap();
//!
//! let a = Point3::new(0.0, 0.0, 0.0);
//! let b = Point3::new(10.0, 0.0, 0.0);
//! let c = Point3::new(10.0, 5.0, 0.0);
//! sketch.add_line(a, b).unwrap();
//! sketch.add_line(b, c).unwrap();
//! sketch.add_line(c, a).unwrap();
//!
//! assert_eq!(sketch.profiles().unwrap().len(), 1);
//! ```

mod entity;
mod host;
mod memory;

pub use entity::{
    Constraint, CurveEnd, CurveId, Dimension, Endpoint, FeatureId, Profile, ProfileId,
    SketchCurve, SketchPlane,
};
pub use host::{
    ExtrudeDriver, ExtrudeFeature, FeatureQuery, PatternDriver, ProfileSource, SketchFactory,
    SketchWriter,
};
pub use memory::{MemoryDocument, MemorySketch, PatternFeature};

use boxjoint_math::VectorError;
use thiserror::Error;

/// Errors reported by a host kernel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// The kernel refused the operation.
    #[error("kernel rejected operation: {0}")]
    Rejected(String),

    /// A sketch name was empty or otherwise unusable.
    #[error("invalid sketch name: {0:?}")]
    InvalidName(String),

    /// A constraint or dimension referenced a curve the sketch does not have.
    #[error("unknown curve {0:?}")]
    UnknownCurve(CurveId),

    /// A profile id does not belong to the sketch.
    #[error("unknown profile {0:?}")]
    UnknownProfile(ProfileId),

    /// A feature id does not belong to the document.
    #[error("unknown feature {0:?}")]
    UnknownFeature(FeatureId),

    /// A curve has zero length or zero radius.
    #[error("degenerate curve: {0}")]
    DegenerateCurve(String),

    /// Profiles were read while compute is deferred and writes are pending.
    #[error("profiles are stale: flush deferred compute before reading them")]
    StaleProfiles,

    /// A vector operation failed inside the kernel.
    #[error(transparent)]
    Vector(#[from] VectorError),
}
