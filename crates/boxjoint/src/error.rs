//! Error types for box joint layout.

use boxjoint_fillet::FilletError;
use boxjoint_math::VectorError;
use boxjoint_sketch::KernelError;
use thiserror::Error;

use crate::pipeline::Stage;

/// Errors that can occur while planning or building a joint.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// A vector input was zero-length or non-finite.
    #[error(transparent)]
    Vector(#[from] VectorError),

    /// The host kernel rejected an operation.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// A fillet or gap profile could not be built.
    #[error(transparent)]
    Fillet(#[from] FilletError),

    /// Joint parameters are out of range.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The edge holds fewer than the two edge gaps.
    #[error("edge fits {0} gaps, at least 2 are required")]
    TooFewGaps(usize),

    /// More gaps were requested than the edge holds.
    #[error("{requested} gaps requested but the edge fits {fits}")]
    TooManyGaps {
        /// Requested gap count.
        requested: usize,
        /// Most gaps the edge holds.
        fits: usize,
    },

    /// A stage ran before the stage it depends on.
    #[error("stage {stage:?} requires {requires:?} to run first")]
    StageOrder {
        /// Stage that was requested.
        stage: Stage,
        /// Stage that has to complete first.
        requires: Stage,
    },

    /// A stage was requested a second time.
    #[error("stage {0:?} has already run")]
    StageRepeated(Stage),

    /// Extrusion was requested while sketch stages had failed.
    #[error("cannot extrude, sketch stages failed: {0:?}")]
    IncompleteSketches(Vec<Stage>),

    /// A stage was requested after an earlier stage failed in the host.
    #[error("pipeline halted, stage {0:?} failed")]
    Halted(Stage),
}

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;
