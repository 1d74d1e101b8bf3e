//! End-to-end checks against the in-memory host.

use approx::assert_relative_eq;

use boxjoint::{
    filter_matching_features, GapFirstBoxJoint, JointConfig, JointParams, Pipeline, Stage,
};
use boxjoint_math::{Aabb3, Point3, Tolerance, Vec3};
use boxjoint_sketch::{FeatureQuery, MemoryDocument};

fn default_run() -> (MemoryDocument, boxjoint::PipelineReport) {
    let layout = GapFirstBoxJoint::new(JointParams::default())
        .unwrap()
        .plan()
        .unwrap();
    let mut doc = MemoryDocument::new();
    let mut pipeline = Pipeline::new(&mut doc, layout);
    pipeline.run().unwrap();
    let report = pipeline.into_report();
    (doc, report)
}

#[test]
fn test_hundred_mm_edge() {
    let params = JointParams::default();
    assert_eq!(params.edge_length(), 100.0);
    assert_eq!(params.gap_count(), 7);

    let layout = GapFirstBoxJoint::new(params).unwrap().plan().unwrap();
    assert_eq!(layout.pattern_count, 5);
    assert_relative_eq!(layout.gap_spacing, 15.0, epsilon = 1e-9);
    assert_relative_eq!(layout.start_fillet.radius(), 1.5875, epsilon = 1e-12);
}

#[test]
fn test_mid_gap_box_selects_one_of_three() {
    let (_, report) = default_run();
    let target = report.mid_gap_box.unwrap();

    let mut doc = MemoryDocument::new();
    let left_of = doc.insert_feature(vec![Aabb3::new(
        Point3::new(0.0, 0.0, -6.0),
        Point3::new(5.0, 6.0, 0.0),
    )]);
    let inside = doc.insert_feature(vec![
        Aabb3::new(Point3::new(15.0, 0.0, -6.0), Point3::new(20.0, 0.0, 0.0)),
        Aabb3::new(Point3::new(20.0, 0.0, -6.0), Point3::new(20.0, 6.0, 0.0)),
    ]);
    let straddling = doc.insert_feature(vec![
        Aabb3::new(Point3::new(18.0, 0.0, -6.0), Point3::new(19.0, 6.0, 0.0)),
        Aabb3::new(Point3::new(40.0, 0.0, -6.0), Point3::new(41.0, 6.0, 0.0)),
    ]);

    let matched: Vec<_> = filter_matching_features(&doc, &target)
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(matched, vec![inside]);
    assert!(!matched.contains(&left_of));
    assert!(!matched.contains(&straddling));
}

#[test]
fn test_pattern_repeats_mid_gap() {
    let (doc, report) = default_run();
    let pattern = &doc.patterns()[0];

    assert_eq!(Some(pattern.id), report.pattern);
    assert_eq!(pattern.count, 5);
    assert_eq!(pattern.instances.len(), 4);
    assert_relative_eq!(pattern.step.x, 15.0, epsilon = 1e-9);
    assert_relative_eq!(pattern.step.y, 0.0, epsilon = 1e-12);

    // Last patterned gap ends before the end gap starts.
    let mid_gap = report.mid_gap_box.unwrap();
    let last = mid_gap.translated(&(pattern.step * 4.0));
    assert_relative_eq!(last.min.x, 74.9, epsilon = 1e-9);
    assert!(last.max.x < 94.9);
}

#[test]
fn test_report_lists_every_stage() {
    let (_, report) = default_run();
    let stages: Vec<_> = report.stages.iter().map(|r| r.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());
    assert!(report.is_complete());
}

#[test]
fn test_border_box_matches_edge() {
    let (doc, report) = default_run();
    let border = report.border_box.unwrap();
    assert!(border.approx_eq(
        &Aabb3::new(Point3::origin(), Point3::new(100.0, 6.0, 0.0)),
        &Tolerance::DEFAULT
    ));

    // No extruded face spans the whole border.
    for feature in doc.extrude_features() {
        for face in &feature.faces {
            assert!(face.extent().x < 100.0);
        }
    }
}

#[test]
fn test_edge_along_other_axis() {
    let params = JointParams {
        edge_start: Point3::new(0.0, 0.0, 0.0),
        edge_end: Point3::new(0.0, 0.0, 100.0),
        thickness: Vec3::new(-6.0, 0.0, 0.0),
        plane_normal: Vec3::y(),
        ..Default::default()
    };
    let layout = GapFirstBoxJoint::new(params).unwrap().plan().unwrap();
    let mut doc = MemoryDocument::new();
    let mut pipeline = Pipeline::new(&mut doc, layout);
    pipeline.run().unwrap();

    let report = pipeline.report();
    assert!(report.is_complete());
    assert_eq!(report.matched.len(), 1);
    assert_relative_eq!(doc.patterns()[0].step.z, 15.0, epsilon = 1e-9);
}

#[test]
fn test_config_to_pipeline() {
    let config = JointConfig::from_toml_str(
        r#"
        [edge]
        end = [60.0, 0.0, 0.0]

        [joint]
        gap_width = 6.0
        tooth_width = 6.0
        wiggle_room = 0.0
        "#,
    )
    .unwrap();
    let params = config.to_params().unwrap();
    assert_eq!(params.gap_count(), 5);

    let layout = GapFirstBoxJoint::new(params).unwrap().plan().unwrap();
    let mut doc = MemoryDocument::new();
    let mut pipeline = Pipeline::new(&mut doc, layout);
    pipeline.run().unwrap();
    let edge_feature = *pipeline.report().extruded.last().unwrap();

    // Without wiggle room the edge gaps share corners with the border; both
    // gaps and both fillets are still cut.
    let features = doc.extrude_features();
    let edge = features.iter().find(|f| f.id == edge_feature).unwrap();
    assert_eq!(edge.faces.len(), 14);
    assert_eq!(doc.patterns()[0].count, 3);
}

#[test]
fn test_report_serializes() {
    let (_, report) = default_run();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stages"][0]["stage"], "create_sketches");
    assert_eq!(json["stages"][0]["status"]["status"], "completed");
}
