//! Host kernel capability traits.
//!
//! Each trait covers one need of the layout code so that a host adapter only
//! implements what it is asked for, and the layout can be tested against
//! [`crate::MemoryDocument`].

use boxjoint_math::{Aabb3, Point3, Vec3};

use crate::{Constraint, CurveId, Dimension, FeatureId, KernelError, Profile, SketchPlane};

/// Write access to one sketch.
pub trait SketchWriter {
    /// Rename the sketch.
    fn set_name(&mut self, name: &str) -> Result<(), KernelError>;

    /// Current name.
    fn name(&self) -> &str;

    /// Enable or disable deferred compute.
    ///
    /// While deferred, the host skips re-solving the sketch after every write.
    /// Disabling it flushes pending work.
    fn set_deferred_compute(&mut self, deferred: bool);

    /// Whether compute is currently deferred.
    fn is_compute_deferred(&self) -> bool;

    /// Draw a line between two model-space points.
    fn add_line(&mut self, start: Point3, end: Point3) -> Result<CurveId, KernelError>;

    /// Draw the minor arc from `start` to `end` around `center`.
    fn add_arc(&mut self, center: Point3, start: Point3, end: Point3)
        -> Result<CurveId, KernelError>;

    /// Draw a full circle.
    fn add_circle(&mut self, center: Point3, radius: f64) -> Result<CurveId, KernelError>;

    /// Add a geometric constraint.
    fn add_constraint(&mut self, constraint: Constraint) -> Result<(), KernelError>;

    /// Add a dimension.
    fn add_dimension(&mut self, dimension: Dimension) -> Result<(), KernelError>;
}

/// Read access to the closed profiles of a sketch.
pub trait ProfileSource {
    /// All closed profiles, in a stable order.
    fn profiles(&self) -> Result<Vec<Profile>, KernelError>;
}

/// Creates sketches.
pub trait SketchFactory {
    /// The sketch type handed out.
    type Sketch: SketchWriter + ProfileSource;

    /// Create an empty sketch on `plane`.
    fn create_sketch(&mut self, plane: &SketchPlane) -> Result<Self::Sketch, KernelError>;
}

/// Turns sketch profiles into extrude features.
pub trait ExtrudeDriver<S> {
    /// Extrude `profiles` of `sketch` by `extent` into the body.
    ///
    /// Returns the created features, empty when `profiles` is empty.
    fn extrude_profiles(
        &mut self,
        sketch: &S,
        profiles: &[Profile],
        extent: f64,
    ) -> Result<Vec<FeatureId>, KernelError>;
}

/// An extrude feature as seen by [`FeatureQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudeFeature {
    /// Feature handle.
    pub id: FeatureId,
    /// Bounding box of each face the feature created.
    pub faces: Vec<Aabb3>,
}

/// Lists the extrude features of a component.
pub trait FeatureQuery {
    /// All extrude features in timeline order.
    fn extrude_features(&self) -> Vec<ExtrudeFeature>;
}

/// Repeats features along a direction.
pub trait PatternDriver {
    /// Pattern `features` into `count` instances (the originals included)
    /// spaced `spacing` apart along `direction`.
    ///
    /// Returns `Ok(None)` without touching the document when there is nothing
    /// to repeat (`features` empty or `count < 2`).
    fn pattern_features(
        &mut self,
        features: &[FeatureId],
        count: usize,
        direction: Vec3,
        spacing: f64,
    ) -> Result<Option<FeatureId>, KernelError>;
}
