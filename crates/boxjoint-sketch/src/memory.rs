//! In-memory host kernel.
//!
//! [`MemorySketch`] records curves, constraints and dimensions, checks them
//! the way a host kernel would, and finds closed profiles by chaining curve
//! endpoints. [`MemoryDocument`] creates sketches, extrudes profiles and
//! patterns features.
//!
//! Extrusions are modelled as operations into an existing body: a feature's
//! faces are the lateral faces swept from each profile curve. Cap faces lie on
//! the body's own faces and merge into them, so they are not reported.

use std::collections::HashMap;

use boxjoint_math::{Aabb3, Point3, Tolerance, Vec3, VecExt};
use tracing::{debug, trace};

use crate::{
    Constraint, CurveEnd, CurveId, Dimension, ExtrudeDriver, ExtrudeFeature, FeatureId,
    FeatureQuery, KernelError, PatternDriver, Profile, ProfileId, ProfileSource, SketchCurve,
    SketchFactory, SketchPlane, SketchWriter,
};

/// Angular slack used when checking driven dimensions and constraints.
const ANGLE_TOLERANCE: f64 = 1e-6;

/// A sketch held in memory.
#[derive(Debug, Clone)]
pub struct MemorySketch {
    plane: SketchPlane,
    name: String,
    deferred: bool,
    dirty: bool,
    curves: Vec<SketchCurve>,
    constraints: Vec<Constraint>,
    dimensions: Vec<Dimension>,
    profiles: Vec<(Profile, Vec<CurveId>)>,
}

impl MemorySketch {
    /// Create an empty sketch on `plane`.
    pub fn new(plane: SketchPlane) -> Self {
        Self {
            plane,
            name: String::from("Sketch"),
            deferred: false,
            dirty: false,
            curves: Vec::new(),
            constraints: Vec::new(),
            dimensions: Vec::new(),
            profiles: Vec::new(),
        }
    }

    /// The sketch plane.
    pub fn plane(&self) -> &SketchPlane {
        &self.plane
    }

    /// All curves in creation order.
    pub fn curves(&self) -> &[SketchCurve] {
        &self.curves
    }

    /// Look up one curve.
    pub fn curve(&self, id: CurveId) -> Result<&SketchCurve, KernelError> {
        self.curves.get(id.0).ok_or(KernelError::UnknownCurve(id))
    }

    /// All constraints in creation order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// All dimensions in creation order.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Curves bounding a profile.
    pub fn profile_curves(&self, id: ProfileId) -> Result<&[CurveId], KernelError> {
        if self.deferred && self.dirty {
            return Err(KernelError::StaleProfiles);
        }
        self.profiles
            .iter()
            .find(|(p, _)| p.id == id)
            .map(|(_, curves)| curves.as_slice())
            .ok_or(KernelError::UnknownProfile(id))
    }

    fn push_curve(&mut self, curve: SketchCurve) -> Result<CurveId, KernelError> {
        curve.validate()?;
        self.check_on_plane(&curve)?;
        let id = CurveId(self.curves.len());
        trace!(sketch = %self.name, ?id, ?curve, "add curve");
        self.curves.push(curve);
        self.mark_dirty();
        Ok(id)
    }

    fn check_on_plane(&self, curve: &SketchCurve) -> Result<(), KernelError> {
        let tol = Tolerance::DEFAULT;
        let points: Vec<Point3> = match curve {
            SketchCurve::Line { start, end } => vec![*start, *end],
            SketchCurve::Arc { center, start, end } => vec![*center, *start, *end],
            SketchCurve::Circle { center, .. } => vec![*center],
        };
        for p in &points {
            let d = self.plane.distance_to(p);
            if !tol.is_zero(d) {
                return Err(KernelError::Rejected(format!(
                    "point ({:.6}, {:.6}, {:.6}) is {d:.6} mm off the sketch plane",
                    p.x, p.y, p.z
                )));
            }
        }
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        if !self.deferred {
            self.recompute();
        }
    }

    fn end_point(&self, end: CurveEnd) -> Result<Point3, KernelError> {
        self.curve(end.curve)?.point_at(end.end).ok_or_else(|| {
            KernelError::Rejected(format!("curve {:?} has no endpoints", end.curve))
        })
    }

    fn line_direction(&self, id: CurveId) -> Result<Vec3, KernelError> {
        self.curve(id)?
            .line_direction()
            .ok_or_else(|| KernelError::Rejected(format!("curve {id:?} is not a line")))
    }

    /// The curve end `end` is chained to among the `ends` sharing its point.
    fn chained_end(&self, end: CurveEnd, ends: &[CurveEnd]) -> Option<CurveEnd> {
        if ends.len() == 2 {
            return ends.iter().copied().find(|e| *e != end);
        }
        let mut linked = self.constraints.iter().filter_map(|c| match *c {
            Constraint::Coincident(a, b) if a == end && ends.contains(&b) => Some(b),
            Constraint::Coincident(a, b) if b == end && ends.contains(&a) => Some(a),
            _ => None,
        });
        let first = linked.next()?;
        linked.next().is_none().then_some(first)
    }

    fn check_tangent(&self, a: CurveId, b: CurveId) -> Result<(), KernelError> {
        let (ls, le, center, start, end) = match (self.curve(a)?, self.curve(b)?) {
            (
                SketchCurve::Line { start: ls, end: le },
                SketchCurve::Arc { center, start, end },
            )
            | (
                SketchCurve::Arc { center, start, end },
                SketchCurve::Line { start: ls, end: le },
            ) => (*ls, *le, *center, *start, *end),
            _ => {
                return Err(KernelError::Rejected(
                    "tangent constraint needs a line and an arc".into(),
                ))
            }
        };
        let tol = Tolerance::DEFAULT;
        let shared = [ls, le]
            .into_iter()
            .find(|p| tol.points_equal(p, &start) || tol.points_equal(p, &end))
            .ok_or_else(|| KernelError::Rejected("tangent curves do not touch".into()))?;
        let radial = (shared - center).try_unit()?;
        let dir = (le - ls).try_unit()?;
        if radial.dot(&dir).abs() > ANGLE_TOLERANCE {
            return Err(KernelError::Rejected("line is not tangent to arc".into()));
        }
        Ok(())
    }

    /// Rebuild the profile cache by chaining curves through shared endpoints.
    ///
    /// Where exactly two curve ends meet they are chained. Where more meet,
    /// an end is chained to the one end it has a coincident constraint with.
    /// A connected group of curves is a profile when every end in it is
    /// chained. A circle is a profile on its own.
    fn recompute(&mut self) {
        let mut parent: Vec<usize> = (0..self.curves.len()).collect();
        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        let quantize = |p: Point3| -> [i64; 3] {
            [
                (p.x * 1e6).round() as i64,
                (p.y * 1e6).round() as i64,
                (p.z * 1e6).round() as i64,
            ]
        };

        let mut ends_at: HashMap<[i64; 3], Vec<CurveEnd>> = HashMap::new();
        for (i, curve) in self.curves.iter().enumerate() {
            if let Some((s, e)) = curve.endpoints() {
                ends_at.entry(quantize(s)).or_default().push(CurveEnd::start(CurveId(i)));
                ends_at.entry(quantize(e)).or_default().push(CurveEnd::end(CurveId(i)));
            }
        }

        let mut open = Vec::new();
        for ends in ends_at.values() {
            for &end in ends {
                match self.chained_end(end, ends) {
                    Some(other) => {
                        let a = find(&mut parent, end.curve.0);
                        let b = find(&mut parent, other.curve.0);
                        if a != b {
                            parent[a] = b;
                        }
                    }
                    None => open.push(end.curve.0),
                }
            }
        }

        let mut open_roots = vec![false; self.curves.len()];
        for c in open {
            let root = find(&mut parent, c);
            open_roots[root] = true;
        }

        let mut groups: Vec<(usize, Vec<CurveId>)> = Vec::new();
        for i in 0..self.curves.len() {
            let root = find(&mut parent, i);
            if open_roots[root] {
                continue;
            }
            match groups.iter_mut().find(|(r, _)| *r == root) {
                Some((_, members)) => members.push(CurveId(i)),
                None => groups.push((root, vec![CurveId(i)])),
            }
        }

        let normal = self.plane.normal;
        self.profiles = groups
            .into_iter()
            .enumerate()
            .map(|(idx, (_, members))| {
                let bounding_box = members
                    .iter()
                    .map(|c| self.curves[c.0].bounding_box(&normal))
                    .fold(Aabb3::empty(), |acc, b| acc.union(&b));
                (
                    Profile {
                        id: ProfileId(idx),
                        bounding_box,
                    },
                    members,
                )
            })
            .collect();
        self.dirty = false;
        trace!(sketch = %self.name, profiles = self.profiles.len(), "recomputed profiles");
    }
}

impl SketchWriter for MemorySketch {
    fn set_name(&mut self, name: &str) -> Result<(), KernelError> {
        if name.trim().is_empty() {
            return Err(KernelError::InvalidName(name.to_string()));
        }
        self.name = name.to_string();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_deferred_compute(&mut self, deferred: bool) {
        self.deferred = deferred;
        if !deferred && self.dirty {
            self.recompute();
        }
    }

    fn is_compute_deferred(&self) -> bool {
        self.deferred
    }

    fn add_line(&mut self, start: Point3, end: Point3) -> Result<CurveId, KernelError> {
        self.push_curve(SketchCurve::Line { start, end })
    }

    fn add_arc(
        &mut self,
        center: Point3,
        start: Point3,
        end: Point3,
    ) -> Result<CurveId, KernelError> {
        self.push_curve(SketchCurve::Arc { center, start, end })
    }

    fn add_circle(&mut self, center: Point3, radius: f64) -> Result<CurveId, KernelError> {
        self.push_curve(SketchCurve::Circle { center, radius })
    }

    fn add_constraint(&mut self, constraint: Constraint) -> Result<(), KernelError> {
        let tol = Tolerance::DEFAULT;
        match constraint {
            Constraint::Coincident(a, b) => {
                let pa = self.end_point(a)?;
                let pb = self.end_point(b)?;
                if !tol.points_equal(&pa, &pb) {
                    return Err(KernelError::Rejected(format!(
                        "coincident ends are {:.6} mm apart",
                        (pa - pb).norm()
                    )));
                }
            }
            Constraint::Perpendicular(a, b) => {
                let da = self.line_direction(a)?;
                let db = self.line_direction(b)?;
                if da.dot(&db).abs() > ANGLE_TOLERANCE {
                    return Err(KernelError::Rejected("lines are not perpendicular".into()));
                }
            }
            Constraint::Tangent(a, b) => self.check_tangent(a, b)?,
        }
        self.constraints.push(constraint);
        if matches!(constraint, Constraint::Coincident(..)) {
            self.mark_dirty();
        }
        Ok(())
    }

    fn add_dimension(&mut self, dimension: Dimension) -> Result<(), KernelError> {
        let tol = Tolerance::DEFAULT;
        match dimension {
            Dimension::Linear { curve, value, .. } => {
                let length = match self.curve(curve)? {
                    SketchCurve::Line { start, end } => (end - start).norm(),
                    _ => {
                        return Err(KernelError::Rejected(
                            "linear dimension needs a line".into(),
                        ))
                    }
                };
                if !tol.is_zero(length - value) {
                    return Err(KernelError::Rejected(format!(
                        "linear dimension {value:.6} does not match length {length:.6}"
                    )));
                }
            }
            Dimension::Radial { curve, value, .. } => {
                let radius = self.curve(curve)?.radius().ok_or_else(|| {
                    KernelError::Rejected("radial dimension needs an arc or circle".into())
                })?;
                if !tol.is_zero(radius - value) {
                    return Err(KernelError::Rejected(format!(
                        "radial dimension {value:.6} does not match radius {radius:.6}"
                    )));
                }
            }
            Dimension::Angular {
                first,
                second,
                value,
                ..
            } => {
                let da = self.line_direction(first)?;
                let db = self.line_direction(second)?;
                let angle = da.dot(&db).clamp(-1.0, 1.0).acos();
                if (angle - value).abs() > ANGLE_TOLERANCE {
                    return Err(KernelError::Rejected(format!(
                        "angular dimension {value:.6} does not match angle {angle:.6}"
                    )));
                }
            }
        }
        self.dimensions.push(dimension);
        Ok(())
    }
}

impl ProfileSource for MemorySketch {
    fn profiles(&self) -> Result<Vec<Profile>, KernelError> {
        if self.deferred && self.dirty {
            return Err(KernelError::StaleProfiles);
        }
        Ok(self.profiles.iter().map(|(p, _)| *p).collect())
    }
}

/// A rectangular pattern recorded by [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq)]
pub struct PatternFeature {
    /// Feature handle.
    pub id: FeatureId,
    /// Features that were repeated.
    pub sources: Vec<FeatureId>,
    /// Instance count, originals included.
    pub count: usize,
    /// Offset between neighbouring instances.
    pub step: Vec3,
    /// Face boxes of each added instance (instance 1 to `count - 1`).
    pub instances: Vec<Vec<Aabb3>>,
}

/// An in-memory document: sketches, extrude features and patterns.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    features: Vec<ExtrudeFeature>,
    patterns: Vec<PatternFeature>,
    next_id: usize,
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// All pattern features in creation order.
    pub fn patterns(&self) -> &[PatternFeature] {
        &self.patterns
    }

    /// Add an extrude feature with the given face boxes directly.
    ///
    /// Useful for seeding a document with pre-existing features.
    pub fn insert_feature(&mut self, faces: Vec<Aabb3>) -> FeatureId {
        let id = self.allocate_id();
        self.features.push(ExtrudeFeature { id, faces });
        id
    }

    fn allocate_id(&mut self) -> FeatureId {
        let id = FeatureId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl SketchFactory for MemoryDocument {
    type Sketch = MemorySketch;

    fn create_sketch(&mut self, plane: &SketchPlane) -> Result<MemorySketch, KernelError> {
        Ok(MemorySketch::new(*plane))
    }
}

impl ExtrudeDriver<MemorySketch> for MemoryDocument {
    fn extrude_profiles(
        &mut self,
        sketch: &MemorySketch,
        profiles: &[Profile],
        extent: f64,
    ) -> Result<Vec<FeatureId>, KernelError> {
        if profiles.is_empty() {
            return Ok(Vec::new());
        }
        if !extent.is_finite() || extent <= 0.0 {
            return Err(KernelError::Rejected(format!(
                "extrude extent must be positive, got {extent}"
            )));
        }

        let sweep = sketch.plane().normal.try_scaled(-extent)?;
        let normal = sketch.plane().normal;
        let mut faces = Vec::new();
        for profile in profiles {
            for &curve_id in sketch.profile_curves(profile.id)? {
                let base = sketch.curve(curve_id)?.bounding_box(&normal);
                faces.push(base.union(&base.translated(&sweep)));
            }
        }

        let id = self.allocate_id();
        debug!(
            sketch = sketch.name(),
            ?id,
            profiles = profiles.len(),
            faces = faces.len(),
            "extruded profiles"
        );
        self.features.push(ExtrudeFeature { id, faces });
        Ok(vec![id])
    }
}

impl FeatureQuery for MemoryDocument {
    fn extrude_features(&self) -> Vec<ExtrudeFeature> {
        self.features.clone()
    }
}

impl PatternDriver for MemoryDocument {
    fn pattern_features(
        &mut self,
        features: &[FeatureId],
        count: usize,
        direction: Vec3,
        spacing: f64,
    ) -> Result<Option<FeatureId>, KernelError> {
        if features.is_empty() || count < 2 {
            debug!(features = features.len(), count, "nothing to pattern");
            return Ok(None);
        }

        let mut source_faces = Vec::new();
        for id in features {
            let feature = self
                .features
                .iter()
                .find(|f| f.id == *id)
                .ok_or(KernelError::UnknownFeature(*id))?;
            source_faces.extend(feature.faces.iter().copied());
        }

        let step = direction.with_length(spacing)?;
        let instances = (1..count)
            .map(|i| {
                let offset = step * i as f64;
                source_faces.iter().map(|f| f.translated(&offset)).collect()
            })
            .collect();

        let id = self.allocate_id();
        debug!(?id, sources = ?features, count, spacing, "patterned features");
        self.patterns.push(PatternFeature {
            id,
            sources: features.to_vec(),
            count,
            step,
            instances,
        });
        Ok(Some(id))
    }
}
