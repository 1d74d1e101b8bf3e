//! TOML joint configuration.
//!
//! ```toml
//! [edge]
//! start = [0.0, 0.0, 0.0]
//! end = [100.0, 0.0, 0.0]
//! thickness = [0.0, 6.0, 0.0]
//! plane_normal = [0.0, 0.0, 1.0]
//!
//! [tool]
//! diameter = 3.175
//!
//! [joint]
//! gap_width = 5.0
//! tooth_width = 10.0
//! wiggle_room = 0.2
//! # gap_count = 7
//! # extrude_extent = 6.0
//! ```
//!
//! Every key is optional and falls back to [`JointConfig::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use boxjoint_math::{Point3, Vec3};

use crate::{JointParams, LayoutError};

/// Errors from loading a joint configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for a joint.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be written as TOML.
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    /// The values do not describe a valid joint.
    #[error(transparent)]
    Invalid(#[from] LayoutError),
}

/// Edge geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// First end of the edge.
    pub start: [f64; 3],
    /// Second end of the edge.
    pub end: [f64; 3],
    /// Gap depth vector.
    pub thickness: [f64; 3],
    /// Sketch plane normal.
    pub plane_normal: [f64; 3],
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            start: [0.0, 0.0, 0.0],
            end: [100.0, 0.0, 0.0],
            thickness: [0.0, 6.0, 0.0],
            plane_normal: [0.0, 0.0, 1.0],
        }
    }
}

/// Cutting tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Bit diameter in mm.
    pub diameter: f64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self { diameter: 3.175 }
    }
}

/// Gap and tooth sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingConfig {
    /// Nominal gap width in mm.
    pub gap_width: f64,
    /// Nominal tooth width in mm.
    pub tooth_width: f64,
    /// Clearance in mm.
    pub wiggle_room: f64,
    /// Explicit gap count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_count: Option<usize>,
    /// Explicit extrusion distance in mm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extrude_extent: Option<f64>,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            gap_width: 5.0,
            tooth_width: 10.0,
            wiggle_room: 0.2,
            gap_count: None,
            extrude_extent: None,
        }
    }
}

/// A joint as written in a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointConfig {
    /// Edge geometry.
    pub edge: EdgeConfig,
    /// Cutting tool.
    pub tool: ToolConfig,
    /// Gap and tooth sizing.
    pub joint: SpacingConfig,
}

impl JointConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Encode as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Convert to validated joint parameters.
    pub fn to_params(&self) -> Result<JointParams, ConfigError> {
        let params = JointParams {
            edge_start: Point3::from(self.edge.start),
            edge_end: Point3::from(self.edge.end),
            thickness: Vec3::from(self.edge.thickness),
            plane_normal: Vec3::from(self.edge.plane_normal),
            tool_diameter: self.tool.diameter,
            gap_width: self.joint.gap_width,
            tooth_width: self.joint.tooth_width,
            wiggle_room: self.joint.wiggle_room,
            gap_count: self.joint.gap_count,
            extrude_extent: self.joint.extrude_extent,
        };
        params.validate()?;
        Ok(params)
    }
}
