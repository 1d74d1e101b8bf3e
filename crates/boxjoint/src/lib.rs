#![warn(missing_docs)]

//! Gap-first box joint layout.
//!
//! Given an edge, a board thickness, a router bit diameter and the gap and
//! tooth widths, this crate computes the gap rectangles and the tool-radius
//! fillets along the edge and builds them in a host CAD document through the
//! capability traits of [`boxjoint_sketch`].
//!
//! Only the two edge gaps and one middle gap are drawn. The middle gap's
//! extruded feature is located again by bounding box and patterned along the
//! edge to produce the remaining gaps.
//!
//! # Example
//!
//! ```
//! use boxjoint::{GapFirstBoxJoint, JointParams, Pipeline};
//! use boxjoint_sketch::MemoryDocument;
//!
//! let joint = GapFirstBoxJoint::new(JointParams::default()).unwrap();
//! let layout = joint.plan().unwrap();
//! assert_eq!(layout.pattern_count, 5);
//!
//! let mut doc = MemoryDocument::new();
//! let mut pipeline = Pipeline::new(&mut doc, layout);
//! pipeline.run().unwrap();
//! assert!(pipeline.report().pattern.is_some());
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod matcher;
pub mod params;
pub mod pipeline;

pub use config::{ConfigError, JointConfig};
pub use error::{LayoutError, Result};
pub use layout::{EdgeLayout, EdgeVectors, GapFirstBoxJoint, MidSection};
pub use matcher::{
    feature_matches, filter_matching_features, profile_boxes_equal, strip_border_profile,
};
pub use params::JointParams;
pub use pipeline::{Pipeline, PipelineReport, Stage, StageRecord, StageStatus};
