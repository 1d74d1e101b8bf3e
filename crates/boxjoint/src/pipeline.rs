//! Staged construction of a joint in a host document.
//!
//! [`Pipeline`] draws an [`EdgeLayout`] into three sketches, extrudes them and
//! patterns the mid gap. Stages run in the order of [`Stage::ALL`]; each one
//! can be run on its own with [`Pipeline::run_stage`].
//!
//! Sketch stages do not abort the pipeline when the host rejects an entity.
//! The failure is recorded in the [`PipelineReport`] together with the number
//! of entities the stage wrote before failing, and the next sketch stage
//! runs. [`Stage::Extrude`] then refuses to run, so partially drawn sketches
//! are never turned into features.
//!
//! Any other host failure is recorded as a failed stage and halts the
//! pipeline: the stage is not run again, and neither is any later one.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use boxjoint_math::{Aabb3, Point3};
use boxjoint_sketch::{
    Constraint, CurveEnd, CurveId, Dimension, ExtrudeDriver, FeatureId, FeatureQuery,
    KernelError, PatternDriver, ProfileSource, SketchFactory, SketchWriter,
};

use crate::matcher::{filter_matching_features, strip_border_profile};
use crate::{EdgeLayout, LayoutError, Result};

/// Name of the sketch holding the border, edge gaps and edge fillets.
pub const EDGE_SKETCH_NAME: &str = "edge_profiles";
/// Name of the sketch holding the mid gap.
pub const MID_GAP_SKETCH_NAME: &str = "mid_gap_profiles";
/// Name of the sketch holding the mid fillets.
pub const MID_FILLET_SKETCH_NAME: &str = "mid_fillet_profiles";

/// One step of building a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Create the sketches and defer their compute.
    CreateSketches,
    /// Draw the border rectangle into the edge sketch.
    Border,
    /// Draw the two edge gaps.
    EdgeGaps,
    /// Draw the two edge fillets.
    EdgeFillets,
    /// Draw the mid gap template.
    MidGap,
    /// Draw the two mid fillets.
    MidFillets,
    /// Re-enable compute on every sketch.
    Flush,
    /// Extrude the profiles and find the mid gap feature.
    Extrude,
    /// Pattern the mid gap features along the edge.
    Pattern,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Stage; 9] = [
        Stage::CreateSketches,
        Stage::Border,
        Stage::EdgeGaps,
        Stage::EdgeFillets,
        Stage::MidGap,
        Stage::MidFillets,
        Stage::Flush,
        Stage::Extrude,
        Stage::Pattern,
    ];

    /// Position in [`Stage::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    /// Everything was written.
    Completed,
    /// Nothing to do for this layout.
    Skipped,
    /// The host rejected something.
    Failed {
        /// Error message.
        error: String,
    },
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// The stage.
    pub stage: Stage,
    /// How it ended.
    pub status: StageStatus,
    /// Sketch entities (curves, constraints, dimensions) or features created.
    pub entities: usize,
}

/// Everything the pipeline did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Stages in the order they ran.
    pub stages: Vec<StageRecord>,
    /// Bounding box of the border profile.
    pub border_box: Option<Aabb3>,
    /// Bounding box of the mid gap profile.
    pub mid_gap_box: Option<Aabb3>,
    /// Features created by [`Stage::Extrude`], in creation order.
    pub extruded: Vec<FeatureId>,
    /// Features matched against the mid gap box.
    pub matched: Vec<FeatureId>,
    /// The pattern feature, when one was created.
    pub pattern: Option<FeatureId>,
}

impl PipelineReport {
    /// The record for `stage`, if it ran.
    pub fn record(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    /// Stages that failed.
    pub fn failed_stages(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .filter(|r| matches!(r.status, StageStatus::Failed { .. }))
            .map(|r| r.stage)
            .collect()
    }

    /// Whether every stage ran without failing.
    pub fn is_complete(&self) -> bool {
        self.stages.len() == Stage::ALL.len() && self.failed_stages().is_empty()
    }
}

struct JointSketches<S> {
    edge: S,
    mid_gap: Option<S>,
    mid_fillets: Option<S>,
}

/// Builds an [`EdgeLayout`] in a host document.
pub struct Pipeline<'h, H: SketchFactory> {
    host: &'h mut H,
    layout: EdgeLayout,
    sketches: Option<JointSketches<H::Sketch>>,
    next: usize,
    halted: Option<Stage>,
    sketch_count: usize,
    report: PipelineReport,
    mid_fillet_features: Vec<FeatureId>,
}

impl<'h, H> Pipeline<'h, H>
where
    H: SketchFactory + ExtrudeDriver<H::Sketch> + FeatureQuery + PatternDriver,
{
    /// Prepare to build `layout` in `host`.
    pub fn new(host: &'h mut H, layout: EdgeLayout) -> Self {
        Self {
            host,
            layout,
            sketches: None,
            next: 0,
            halted: None,
            sketch_count: 0,
            report: PipelineReport::default(),
            mid_fillet_features: Vec::new(),
        }
    }

    /// The layout being built. Gap boxes are filled in as stages run.
    pub fn layout(&self) -> &EdgeLayout {
        &self.layout
    }

    /// What has happened so far.
    pub fn report(&self) -> &PipelineReport {
        &self.report
    }

    /// Consume the pipeline, returning its report.
    pub fn into_report(self) -> PipelineReport {
        self.report
    }

    /// The stage [`Pipeline::run_stage`] expects next.
    pub fn next_stage(&self) -> Option<Stage> {
        Stage::ALL.get(self.next).copied()
    }

    /// Run every remaining stage.
    pub fn run(&mut self) -> Result<()> {
        while let Some(stage) = self.next_stage() {
            self.run_stage(stage)?;
        }
        Ok(())
    }

    /// Run one stage. Stages must be run in order.
    ///
    /// A stage the host fails is recorded in the report and halts the
    /// pipeline; the error is returned.
    pub fn run_stage(&mut self, stage: Stage) -> Result<&StageRecord> {
        if stage.index() < self.next {
            return Err(LayoutError::StageRepeated(stage));
        }
        if let Some(failed) = self.halted {
            return Err(LayoutError::Halted(failed));
        }
        if let Some(requires) = self.next_stage().filter(|&n| n != stage) {
            return Err(LayoutError::StageOrder { stage, requires });
        }

        let _span = info_span!("stage", ?stage).entered();
        let outcome = match stage {
            Stage::CreateSketches => self.create_sketches(),
            Stage::Flush => self.flush(),
            Stage::Extrude => self.extrude(),
            Stage::Pattern => self.pattern(),
            _ => self.sketch_stage(stage),
        };
        let record = match outcome {
            Ok(record) => record,
            // Refused before touching the host; the stage can still run.
            Err(e @ (LayoutError::StageOrder { .. } | LayoutError::IncompleteSketches(_))) => {
                return Err(e)
            }
            Err(e) => {
                let record = StageRecord {
                    stage,
                    status: StageStatus::Failed {
                        error: e.to_string(),
                    },
                    entities: self.partial_entities(stage),
                };
                warn!(entities = record.entities, error = %e, "stage failed, halting");
                self.halted = Some(stage);
                self.next += 1;
                self.report.stages.push(record);
                return Err(e);
            }
        };
        match &record.status {
            StageStatus::Failed { error } => {
                warn!(entities = record.entities, %error, "stage failed")
            }
            status => info!(entities = record.entities, ?status, "stage done"),
        }

        self.next += 1;
        let idx = self.report.stages.len();
        self.report.stages.push(record);
        Ok(&self.report.stages[idx])
    }

    /// What `stage` had created in the host when it failed.
    fn partial_entities(&self, stage: Stage) -> usize {
        match stage {
            Stage::CreateSketches => self.sketch_count,
            Stage::Extrude => self.report.extruded.len(),
            _ => 0,
        }
    }

    fn create_sketches(&mut self) -> Result<StageRecord> {
        let plane = self.layout.plane;
        let host = &mut *self.host;
        let sketch_count = &mut self.sketch_count;
        let mut create = |name: &str| -> Result<H::Sketch> {
            let mut sketch = host.create_sketch(&plane)?;
            *sketch_count += 1;
            sketch.set_name(name)?;
            sketch.set_deferred_compute(true);
            Ok(sketch)
        };

        let edge = create(EDGE_SKETCH_NAME)?;
        let (mid_gap, mid_fillets) = if self.layout.mid.is_some() {
            (
                Some(create(MID_GAP_SKETCH_NAME)?),
                Some(create(MID_FILLET_SKETCH_NAME)?),
            )
        } else {
            (None, None)
        };
        let count = self.sketch_count;

        self.sketches = Some(JointSketches {
            edge,
            mid_gap,
            mid_fillets,
        });
        Ok(StageRecord {
            stage: Stage::CreateSketches,
            status: StageStatus::Completed,
            entities: count,
        })
    }

    fn sketch_stage(&mut self, stage: Stage) -> Result<StageRecord> {
        let sketches = self.sketches.as_mut().ok_or(LayoutError::StageOrder {
            stage,
            requires: Stage::CreateSketches,
        })?;
        let layout = &mut self.layout;
        let report = &mut self.report;

        let (entities, outcome) = match stage {
            Stage::Border => {
                let mut tally = Tally::new(&mut sketches.edge);
                let outcome = draw_border(&mut tally, &layout.border).map(|bb| {
                    report.border_box = Some(bb);
                });
                (tally.written, outcome.map_err(LayoutError::from))
            }
            Stage::EdgeGaps => {
                let mut tally = Tally::new(&mut sketches.edge);
                let outcome = layout
                    .start_gap
                    .sketch(&mut tally)
                    .and_then(|_| layout.end_gap.sketch(&mut tally))
                    .map(|_| ());
                (tally.written, outcome.map_err(LayoutError::from))
            }
            Stage::EdgeFillets => {
                let mut tally = Tally::new(&mut sketches.edge);
                let outcome = layout
                    .start_fillet
                    .draw_sketch(&mut tally)
                    .and_then(|_| layout.end_fillet.draw_sketch(&mut tally))
                    .map(|_| ());
                (tally.written, outcome.map_err(LayoutError::from))
            }
            Stage::MidGap => match (layout.mid.as_mut(), sketches.mid_gap.as_mut()) {
                (Some(mid), Some(sketch)) => {
                    let mut tally = Tally::new(sketch);
                    let outcome = mid.gap.sketch(&mut tally).map(|drawn| {
                        report.mid_gap_box = Some(drawn.bounding_box);
                    });
                    (tally.written, outcome.map_err(LayoutError::from))
                }
                _ => return Ok(skipped(stage)),
            },
            Stage::MidFillets => match (layout.mid.as_ref(), sketches.mid_fillets.as_mut()) {
                (Some(mid), Some(sketch)) => {
                    let mut tally = Tally::new(sketch);
                    let outcome = mid
                        .left_fillet
                        .draw_sketch(&mut tally)
                        .and_then(|_| mid.right_fillet.draw_sketch(&mut tally))
                        .map(|_| ());
                    (tally.written, outcome.map_err(LayoutError::from))
                }
                _ => return Ok(skipped(stage)),
            },
            other => {
                return Err(LayoutError::StageOrder {
                    stage: other,
                    requires: Stage::CreateSketches,
                })
            }
        };

        let status = match outcome {
            Ok(()) => StageStatus::Completed,
            Err(e) => StageStatus::Failed {
                error: e.to_string(),
            },
        };
        Ok(StageRecord {
            stage,
            status,
            entities,
        })
    }

    fn flush(&mut self) -> Result<StageRecord> {
        let sketches = self.sketches.as_mut().ok_or(LayoutError::StageOrder {
            stage: Stage::Flush,
            requires: Stage::CreateSketches,
        })?;
        let mut flushed = 0;
        for sketch in std::iter::once(&mut sketches.edge)
            .chain(sketches.mid_gap.as_mut())
            .chain(sketches.mid_fillets.as_mut())
        {
            sketch.set_deferred_compute(false);
            flushed += 1;
        }
        Ok(StageRecord {
            stage: Stage::Flush,
            status: StageStatus::Completed,
            entities: flushed,
        })
    }

    fn extrude(&mut self) -> Result<StageRecord> {
        let failed = self.report.failed_stages();
        if !failed.is_empty() {
            return Err(LayoutError::IncompleteSketches(failed));
        }
        let sketches = self.sketches.as_ref().ok_or(LayoutError::StageOrder {
            stage: Stage::Extrude,
            requires: Stage::CreateSketches,
        })?;
        let extent = self.layout.extrude_extent;

        if let (Some(gap_sketch), Some(fillet_sketch)) = (&sketches.mid_gap, &sketches.mid_fillets)
        {
            let profiles = gap_sketch.profiles()?;
            let features = self.host.extrude_profiles(gap_sketch, &profiles, extent)?;
            self.report.extruded.extend(features);

            let profiles = fillet_sketch.profiles()?;
            self.mid_fillet_features =
                self.host.extrude_profiles(fillet_sketch, &profiles, extent)?;
            self.report
                .extruded
                .extend(self.mid_fillet_features.iter().copied());

            if let Some(target) = self.report.mid_gap_box {
                self.report.matched = filter_matching_features(&*self.host, &target)
                    .into_iter()
                    .map(|f| f.id)
                    .collect();
                debug!(matched = ?self.report.matched, "matched mid gap features");
            }
        }

        let profiles = sketches.edge.profiles()?;
        let cut = match &self.report.border_box {
            Some(border) => strip_border_profile(&profiles, border),
            None => profiles,
        };
        let features = self.host.extrude_profiles(&sketches.edge, &cut, extent)?;
        self.report.extruded.extend(features);

        let entities = self.report.extruded.len();
        Ok(StageRecord {
            stage: Stage::Extrude,
            status: StageStatus::Completed,
            entities,
        })
    }

    fn pattern(&mut self) -> Result<StageRecord> {
        if self.report.matched.is_empty() {
            if self.layout.mid.is_some() {
                warn!("no feature matched the mid gap, nothing to pattern");
            }
            return Ok(skipped(Stage::Pattern));
        }

        let mut sources = self.report.matched.clone();
        for id in &self.mid_fillet_features {
            if !sources.contains(id) {
                sources.push(*id);
            }
        }

        let pattern = self.host.pattern_features(
            &sources,
            self.layout.pattern_count,
            self.layout.pattern_direction,
            self.layout.gap_spacing,
        )?;
        self.report.pattern = pattern;

        Ok(match pattern {
            Some(_) => StageRecord {
                stage: Stage::Pattern,
                status: StageStatus::Completed,
                entities: 1,
            },
            None => skipped(Stage::Pattern),
        })
    }
}

fn skipped(stage: Stage) -> StageRecord {
    StageRecord {
        stage,
        status: StageStatus::Skipped,
        entities: 0,
    }
}

/// Draw the closed border rectangle `corners` and return its bounding box.
fn draw_border<S: SketchWriter + ?Sized>(
    sketch: &mut S,
    corners: &[Point3; 4],
) -> std::result::Result<Aabb3, KernelError> {
    let lines = [
        sketch.add_line(corners[0], corners[1])?,
        sketch.add_line(corners[1], corners[2])?,
        sketch.add_line(corners[2], corners[3])?,
        sketch.add_line(corners[3], corners[0])?,
    ];
    for i in 0..4 {
        sketch.add_constraint(Constraint::Coincident(
            CurveEnd::end(lines[i]),
            CurveEnd::start(lines[(i + 1) % 4]),
        ))?;
    }
    sketch.add_constraint(Constraint::Perpendicular(lines[0], lines[1]))?;
    sketch.add_constraint(Constraint::Perpendicular(lines[1], lines[2]))?;

    let length = corners[1] - corners[0];
    let depth = corners[3] - corners[0];
    sketch.add_dimension(Dimension::Linear {
        curve: lines[0],
        value: length.norm(),
        text_point: corners[0] + length * 0.5 - depth * 0.25,
    })?;
    sketch.add_dimension(Dimension::Linear {
        curve: lines[3],
        value: depth.norm(),
        text_point: corners[0] + depth * 0.5 - length * 0.05,
    })?;

    Ok(Aabb3::from_points(corners.iter()))
}

/// Counts the entities written through it.
struct Tally<'a, S: ?Sized> {
    inner: &'a mut S,
    written: usize,
}

impl<'a, S: SketchWriter + ?Sized> Tally<'a, S> {
    fn new(inner: &'a mut S) -> Self {
        Self { inner, written: 0 }
    }

    fn count<T>(
        &mut self,
        result: std::result::Result<T, KernelError>,
    ) -> std::result::Result<T, KernelError> {
        if result.is_ok() {
            self.written += 1;
        }
        result
    }
}

impl<S: SketchWriter + ?Sized> SketchWriter for Tally<'_, S> {
    fn set_name(&mut self, name: &str) -> std::result::Result<(), KernelError> {
        self.inner.set_name(name)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn set_deferred_compute(&mut self, deferred: bool) {
        self.inner.set_deferred_compute(deferred);
    }

    fn is_compute_deferred(&self) -> bool {
        self.inner.is_compute_deferred()
    }

    fn add_line(&mut self, start: Point3, end: Point3) -> std::result::Result<CurveId, KernelError> {
        let r = self.inner.add_line(start, end);
        self.count(r)
    }

    fn add_arc(
        &mut self,
        center: Point3,
        start: Point3,
        end: Point3,
    ) -> std::result::Result<CurveId, KernelError> {
        let r = self.inner.add_arc(center, start, end);
        self.count(r)
    }

    fn add_circle(&mut self, center: Point3, radius: f64) -> std::result::Result<CurveId, KernelError> {
        let r = self.inner.add_circle(center, radius);
        self.count(r)
    }

    fn add_constraint(&mut self, constraint: Constraint) -> std::result::Result<(), KernelError> {
        let r = self.inner.add_constraint(constraint);
        self.count(r)
    }

    fn add_dimension(&mut self, dimension: Dimension) -> std::result::Result<(), KernelError> {
        let r = self.inner.add_dimension(dimension);
        self.count(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GapFirstBoxJoint, JointParams};
    use boxjoint_math::Vec3;
    use boxjoint_sketch::{MemoryDocument, MemorySketch, SketchPlane};

    fn layout(params: JointParams) -> EdgeLayout {
        GapFirstBoxJoint::new(params).unwrap().plan().unwrap()
    }

    #[test]
    fn test_full_run() {
        let mut doc = MemoryDocument::new();
        let mut pipeline = Pipeline::new(&mut doc, layout(JointParams::default()));
        pipeline.run().unwrap();
        let report = pipeline.into_report();

        assert!(report.is_complete());
        // mid gap, mid fillets, edge profiles
        assert_eq!(report.extruded.len(), 3);
        assert_eq!(report.matched.len(), 1);
        assert_eq!(report.matched[0], report.extruded[0]);
        assert!(report.pattern.is_some());

        let pattern = &doc.patterns()[0];
        assert_eq!(pattern.count, 5);
        assert_eq!(pattern.sources, vec![report.extruded[0], report.extruded[1]]);
    }

    #[test]
    fn test_stage_entity_counts() {
        let mut doc = MemoryDocument::new();
        let mut pipeline = Pipeline::new(&mut doc, layout(JointParams::default()));
        pipeline.run().unwrap();
        let report = pipeline.report();

        let entities = |stage| report.record(stage).unwrap().entities;
        // 4 lines, 6 constraints, 2 dimensions
        assert_eq!(entities(Stage::Border), 12);
        assert_eq!(entities(Stage::EdgeGaps), 24);
        // 3 curves, 6 constraints, 2 dimensions per fillet
        assert_eq!(entities(Stage::EdgeFillets), 22);
        assert_eq!(entities(Stage::MidGap), 12);
        assert_eq!(entities(Stage::MidFillets), 22);
    }

    #[test]
    fn test_stages_must_run_in_order() {
        let mut doc = MemoryDocument::new();
        let mut pipeline = Pipeline::new(&mut doc, layout(JointParams::default()));

        let err = pipeline.run_stage(Stage::Border).unwrap_err();
        assert_eq!(
            err,
            LayoutError::StageOrder {
                stage: Stage::Border,
                requires: Stage::CreateSketches,
            }
        );

        pipeline.run_stage(Stage::CreateSketches).unwrap();
        assert_eq!(
            pipeline.run_stage(Stage::CreateSketches).unwrap_err(),
            LayoutError::StageRepeated(Stage::CreateSketches)
        );
        assert_eq!(pipeline.next_stage(), Some(Stage::Border));
    }

    #[test]
    fn test_two_gaps_skip_mid_and_pattern() {
        let mut doc = MemoryDocument::new();
        let params = JointParams {
            gap_count: Some(2),
            ..Default::default()
        };
        let mut pipeline = Pipeline::new(&mut doc, layout(params));
        pipeline.run().unwrap();
        let report = pipeline.into_report();

        assert!(report.is_complete());
        assert_eq!(report.record(Stage::MidGap).unwrap().status, StageStatus::Skipped);
        assert_eq!(report.record(Stage::Pattern).unwrap().status, StageStatus::Skipped);
        assert!(report.matched.is_empty());
        assert!(report.pattern.is_none());
        assert!(doc.patterns().is_empty());
    }

    #[test]
    fn test_edge_extrude_skips_border() {
        let mut doc = MemoryDocument::new();
        let mut pipeline = Pipeline::new(&mut doc, layout(JointParams::default()));
        pipeline.run().unwrap();
        let edge_feature = *pipeline.report().extruded.last().unwrap();

        let features = doc.extrude_features();
        let edge = features.iter().find(|f| f.id == edge_feature).unwrap();
        // two gaps of 4 lines and two fillets of 3 curves
        assert_eq!(edge.faces.len(), 14);
    }

    /// Host that rejects selected operations.
    #[derive(Default)]
    struct FaultyHost {
        doc: MemoryDocument,
        reject_arcs: bool,
        reject_name: Option<&'static str>,
        reject_extrude_of: Option<&'static str>,
        sketches_created: usize,
    }

    struct FaultySketch {
        inner: MemorySketch,
        reject_arcs: bool,
        reject_name: Option<&'static str>,
    }

    fn rejected(what: &str) -> KernelError {
        KernelError::Rejected(format!("{what} unsupported"))
    }

    impl SketchWriter for FaultySketch {
        fn set_name(&mut self, name: &str) -> std::result::Result<(), KernelError> {
            if self.reject_name == Some(name) {
                return Err(rejected(name));
            }
            self.inner.set_name(name)
        }
        fn name(&self) -> &str {
            self.inner.name()
        }
        fn set_deferred_compute(&mut self, deferred: bool) {
            self.inner.set_deferred_compute(deferred)
        }
        fn is_compute_deferred(&self) -> bool {
            self.inner.is_compute_deferred()
        }
        fn add_line(&mut self, s: Point3, e: Point3) -> std::result::Result<CurveId, KernelError> {
            self.inner.add_line(s, e)
        }
        fn add_arc(
            &mut self,
            c: Point3,
            s: Point3,
            e: Point3,
        ) -> std::result::Result<CurveId, KernelError> {
            if self.reject_arcs {
                return Err(rejected("arcs"));
            }
            self.inner.add_arc(c, s, e)
        }
        fn add_circle(&mut self, c: Point3, r: f64) -> std::result::Result<CurveId, KernelError> {
            self.inner.add_circle(c, r)
        }
        fn add_constraint(&mut self, c: Constraint) -> std::result::Result<(), KernelError> {
            self.inner.add_constraint(c)
        }
        fn add_dimension(&mut self, d: Dimension) -> std::result::Result<(), KernelError> {
            self.inner.add_dimension(d)
        }
    }

    impl ProfileSource for FaultySketch {
        fn profiles(&self) -> std::result::Result<Vec<boxjoint_sketch::Profile>, KernelError> {
            self.inner.profiles()
        }
    }

    impl SketchFactory for FaultyHost {
        type Sketch = FaultySketch;
        fn create_sketch(
            &mut self,
            plane: &SketchPlane,
        ) -> std::result::Result<FaultySketch, KernelError> {
            self.sketches_created += 1;
            Ok(FaultySketch {
                inner: self.doc.create_sketch(plane)?,
                reject_arcs: self.reject_arcs,
                reject_name: self.reject_name,
            })
        }
    }

    impl ExtrudeDriver<FaultySketch> for FaultyHost {
        fn extrude_profiles(
            &mut self,
            sketch: &FaultySketch,
            profiles: &[boxjoint_sketch::Profile],
            extent: f64,
        ) -> std::result::Result<Vec<FeatureId>, KernelError> {
            if self.reject_extrude_of == Some(sketch.name()) {
                return Err(rejected("extrusion"));
            }
            self.doc.extrude_profiles(&sketch.inner, profiles, extent)
        }
    }

    impl FeatureQuery for FaultyHost {
        fn extrude_features(&self) -> Vec<boxjoint_sketch::ExtrudeFeature> {
            self.doc.extrude_features()
        }
    }

    impl PatternDriver for FaultyHost {
        fn pattern_features(
            &mut self,
            features: &[FeatureId],
            count: usize,
            direction: Vec3,
            spacing: f64,
        ) -> std::result::Result<Option<FeatureId>, KernelError> {
            self.doc.pattern_features(features, count, direction, spacing)
        }
    }

    #[test]
    fn test_failed_sketch_stages_block_extrude() {
        let mut host = FaultyHost {
            reject_arcs: true,
            ..Default::default()
        };
        let mut pipeline = Pipeline::new(&mut host, layout(JointParams::default()));

        let err = pipeline.run().unwrap_err();
        assert_eq!(
            err,
            LayoutError::IncompleteSketches(vec![Stage::EdgeFillets, Stage::MidFillets])
        );

        let report = pipeline.report();
        assert_eq!(report.record(Stage::MidGap).unwrap().status, StageStatus::Completed);
        // two lines of the first fillet went in before the arc was rejected
        assert_eq!(report.record(Stage::EdgeFillets).unwrap().entities, 2);
        assert!(report.record(Stage::Extrude).is_none());
        assert!(host.doc.extrude_features().is_empty());
    }

    #[test]
    fn test_failed_edge_extrude_keeps_mid_features() {
        let mut host = FaultyHost {
            reject_extrude_of: Some(EDGE_SKETCH_NAME),
            ..Default::default()
        };
        let mut pipeline = Pipeline::new(&mut host, layout(JointParams::default()));

        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, LayoutError::Kernel(KernelError::Rejected(_))));

        let report = pipeline.report().clone();
        // mid gap and mid fillets were extruded before the edge failed
        assert_eq!(report.extruded.len(), 2);
        assert_eq!(report.matched, vec![report.extruded[0]]);
        let record = report.record(Stage::Extrude).unwrap();
        assert!(matches!(record.status, StageStatus::Failed { .. }));
        assert_eq!(record.entities, 2);
        assert_eq!(report.failed_stages(), vec![Stage::Extrude]);

        assert_eq!(
            pipeline.run_stage(Stage::Extrude).unwrap_err(),
            LayoutError::StageRepeated(Stage::Extrude)
        );
        assert_eq!(
            pipeline.run_stage(Stage::Pattern).unwrap_err(),
            LayoutError::Halted(Stage::Extrude)
        );
        assert_eq!(pipeline.run().unwrap_err(), LayoutError::Halted(Stage::Extrude));
        assert_eq!(pipeline.report().stages.len(), report.stages.len());

        assert_eq!(host.doc.extrude_features().len(), 2);
        assert!(host.doc.patterns().is_empty());
    }

    #[test]
    fn test_failed_sketch_creation_is_not_retried() {
        let mut host = FaultyHost {
            reject_name: Some(MID_GAP_SKETCH_NAME),
            ..Default::default()
        };
        let mut pipeline = Pipeline::new(&mut host, layout(JointParams::default()));

        let err = pipeline.run_stage(Stage::CreateSketches).unwrap_err();
        assert!(matches!(err, LayoutError::Kernel(_)));
        let record = pipeline.report().record(Stage::CreateSketches).unwrap();
        // edge sketch and the unnamed mid gap sketch
        assert_eq!(record.entities, 2);

        assert_eq!(
            pipeline.run_stage(Stage::CreateSketches).unwrap_err(),
            LayoutError::StageRepeated(Stage::CreateSketches)
        );
        assert_eq!(
            pipeline.run_stage(Stage::Border).unwrap_err(),
            LayoutError::Halted(Stage::CreateSketches)
        );
        assert_eq!(host.sketches_created, 2);
    }
}
