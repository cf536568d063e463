//! Tunable thresholds for graph assembly, normalization and emission.
//!
//! Configuration is an explicit value handed to each stage. It can be loaded
//! from YAML or constructed programmatically; every field has a default, so
//! partial files are valid.
//!
//! # Configuration Structure
//!
//! ```yaml
//! confidence_floor: 0.95
//! duplicate_variance: 2800.0
//! terminal_a_variance: 2500.0
//! terminal_b_variance: 2400.0
//! min_grid_step: 48
//! scaling_factor: 0.03
//! line_point_distance: 850.0
//! sheet_width: 1000
//! sheet_height: 1000
//! emit_labels: false
//! ```
//!
//! # Programmatic Usage
//!
//! ```rust
//! use schemtrace::config::GraphConfig;
//!
//! let config = GraphConfig {
//!     duplicate_variance: 10.0,
//!     scaling_factor: 1.0,
//!     ..Default::default()
//! };
//! assert_eq!(config.duplicate_radius(), 10.0);
//! ```

use crate::poi::CONFIDENCE_FLOOR;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Upper bound on the grid step, in pixels.
pub const MAX_GRID_STEP: i64 = 1 << 16;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Thresholds owned by the core pipeline.
///
/// Radii are given in raw units and multiplied by `scaling_factor` (then
/// truncated to whole pixels) before use, so one set of values works across
/// image resolutions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Winning class probability must be strictly above this.
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,
    /// Same-type nodes closer than this are duplicates.
    #[serde(default = "default_duplicate_variance")]
    pub duplicate_variance: f64,
    /// Radius for resolving terminal A to a neighbor.
    #[serde(default = "default_terminal_a_variance")]
    pub terminal_a_variance: f64,
    /// Radius for terminal-line discovery and terminal B resolution.
    #[serde(default = "default_terminal_b_variance")]
    pub terminal_b_variance: f64,
    /// Layout lattice step in pixels.
    #[serde(default = "default_min_grid_step")]
    pub min_grid_step: i64,
    /// Resolution factor from the scale estimator.
    #[serde(default = "default_scaling_factor")]
    pub scaling_factor: f64,
    /// Endpoint radius for the line-pruning utility (unscaled).
    #[serde(default = "default_line_point_distance")]
    pub line_point_distance: f64,
    #[serde(default = "default_sheet_size")]
    pub sheet_width: u32,
    #[serde(default = "default_sheet_size")]
    pub sheet_height: u32,
    /// Emit `SYMATTR InstName` for labelled parts.
    #[serde(default)]
    pub emit_labels: bool,
}

fn default_confidence_floor() -> f64 { CONFIDENCE_FLOOR }
fn default_duplicate_variance() -> f64 { 2800.0 }
fn default_terminal_a_variance() -> f64 { 2500.0 }
fn default_terminal_b_variance() -> f64 { 2400.0 }
fn default_min_grid_step() -> i64 { 48 }
fn default_scaling_factor() -> f64 { 0.03 }
fn default_line_point_distance() -> f64 { 850.0 }
fn default_sheet_size() -> u32 { 1000 }

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            confidence_floor: default_confidence_floor(),
            duplicate_variance: default_duplicate_variance(),
            terminal_a_variance: default_terminal_a_variance(),
            terminal_b_variance: default_terminal_b_variance(),
            min_grid_step: default_min_grid_step(),
            scaling_factor: default_scaling_factor(),
            line_point_distance: default_line_point_distance(),
            sheet_width: default_sheet_size(),
            sheet_height: default_sheet_size(),
            emit_labels: false,
        }
    }
}

impl GraphConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: GraphConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Copy with a different scale factor.
    pub fn with_scale(&self, scaling_factor: f64) -> Self {
        Self {
            scaling_factor,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_GRID_STEP).contains(&self.min_grid_step) {
            return Err(ConfigError::Invalid(format!(
                "min_grid_step must lie in [1, {MAX_GRID_STEP}], got {}",
                self.min_grid_step
            )));
        }
        if !self.scaling_factor.is_finite() || self.scaling_factor < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "scaling_factor must be a finite non-negative number, got {}",
                self.scaling_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(ConfigError::Invalid(format!(
                "confidence_floor must lie in [0, 1], got {}",
                self.confidence_floor
            )));
        }
        let radii = [
            ("duplicate_variance", self.duplicate_variance),
            ("terminal_a_variance", self.terminal_a_variance),
            ("terminal_b_variance", self.terminal_b_variance),
            ("line_point_distance", self.line_point_distance),
        ];
        for (name, v) in radii {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a finite non-negative number, got {v}"
                )));
            }
        }
        Ok(())
    }

    /// Raw radius scaled to pixels, truncated toward zero.
    pub fn scaled(&self, raw: f64) -> f64 {
        (raw * self.scaling_factor).trunc()
    }

    pub fn duplicate_radius(&self) -> f64 {
        self.scaled(self.duplicate_variance)
    }

    pub fn terminal_a_radius(&self) -> f64 {
        self.scaled(self.terminal_a_variance)
    }

    pub fn terminal_b_radius(&self) -> f64 {
        self.scaled(self.terminal_b_variance)
    }

    /// Alignment margin: two grid steps.
    pub fn alignment_margin(&self) -> i64 {
        2 * self.min_grid_step
    }
}
