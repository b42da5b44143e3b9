//! Map-set configuration loaded from JSON.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::noise::{GradientMode, LaneWidth};

/// Errors raised while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A set of named noise layers sampled over one `width`×`height` grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSetConfig {
    /// Grid width in samples.
    pub width: u32,
    /// Grid height in samples.
    pub height: u32,
    /// Map seed. Drawn at random when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    /// Numeric backend used for every layer.
    #[serde(default)]
    pub lane_width: LaneWidth,
    pub layers: Vec<LayerConfig>,
}

/// One named layer of the map set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    /// Per-axis frequency; two entries for 2D kinds, three for 3D kinds.
    pub frequency: Vec<f32>,
    #[serde(flatten)]
    pub kind: LayerKind,
    /// Added to the map seed. Defaults to the layer's index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_offset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_mask: Option<LandMask>,
}

/// Kernel and kernel-specific parameters of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayerKind {
    Gradient2d {
        #[serde(default = "default_amplitude")]
        amplitude: f32,
        #[serde(default)]
        mode: GradientMode,
    },
    Gradient3d {
        #[serde(default = "default_amplitude")]
        amplitude: f32,
        #[serde(default)]
        mode: GradientMode,
        /// z coordinate of the sampled slice.
        #[serde(default)]
        depth: f32,
    },
    Cellular2d {
        #[serde(default = "default_amplitude")]
        center_amplitude: f32,
        #[serde(default = "default_amplitude")]
        edge_amplitude: f32,
        #[serde(default)]
        output: CellularOutput,
    },
    Cellular3d {
        #[serde(default = "default_amplitude")]
        center_amplitude: f32,
        #[serde(default = "default_amplitude")]
        edge_amplitude: f32,
        #[serde(default)]
        output: CellularOutput,
        #[serde(default)]
        depth: f32,
    },
}

fn default_amplitude() -> f32 {
    1.0
}

/// Which cellular distance a layer keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellularOutput {
    /// Distance to the nearest feature point.
    #[default]
    Center,
    /// Gap between the nearest and second-nearest feature points.
    Edge,
}

/// Zeroes a layer wherever another layer sits below a threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandMask {
    /// Name of the layer read as the mask.
    pub source: String,
    /// Source bytes below this value are treated as sea.
    pub sea_level: u8,
}

impl LayerKind {
    /// Lowercase identifier as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Gradient2d { .. } => "gradient2d",
            LayerKind::Gradient3d { .. } => "gradient3d",
            LayerKind::Cellular2d { .. } => "cellular2d",
            LayerKind::Cellular3d { .. } => "cellular3d",
        }
    }

    /// Number of frequency axes the kind expects.
    pub fn dimensions(&self) -> usize {
        match self {
            LayerKind::Gradient2d { .. } | LayerKind::Cellular2d { .. } => 2,
            LayerKind::Gradient3d { .. } | LayerKind::Cellular3d { .. } => 3,
        }
    }

    fn amplitudes(&self) -> [f32; 2] {
        match *self {
            LayerKind::Gradient2d { amplitude, .. } | LayerKind::Gradient3d { amplitude, .. } => {
                [amplitude, amplitude]
            }
            LayerKind::Cellular2d { center_amplitude, edge_amplitude, .. }
            | LayerKind::Cellular3d { center_amplitude, edge_amplitude, .. } => {
                [center_amplitude, edge_amplitude]
            }
        }
    }
}

impl LayerConfig {
    /// Frequency per axis, with 1.0 for axes the layer does not list.
    pub fn frequency_axes(&self) -> [f32; 3] {
        let axis = |i: usize| self.frequency.get(i).copied().unwrap_or(1.0);
        [axis(0), axis(1), axis(2)]
    }

    /// Seed offset, falling back to the layer's position in the set.
    pub fn seed_offset(&self, index: usize) -> i32 {
        self.seed_offset.unwrap_or(index as i32)
    }
}

impl Default for MapSetConfig {
    /// A single 256×256 quadratic gradient layer.
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            seed: None,
            lane_width: LaneWidth::default(),
            layers: vec![LayerConfig {
                name: "height".to_string(),
                frequency: vec![10.0 / 256.0, 10.0 / 256.0],
                kind: LayerKind::Gradient2d {
                    amplitude: 1.0,
                    mode: GradientMode::Quadratic,
                },
                seed_offset: None,
                land_mask: None,
            }],
        }
    }
}

impl MapSetConfig {
    /// Terrain-style preset: height, moisture, and rock cells masked to land.
    pub fn terrain(width: u32, height: u32) -> Self {
        let base = 10.0 / width.max(height) as f32;
        let sea = LandMask {
            source: "height".to_string(),
            sea_level: 96,
        };
        Self {
            width,
            height,
            seed: None,
            lane_width: LaneWidth::default(),
            layers: vec![
                LayerConfig {
                    name: "height".to_string(),
                    frequency: vec![base, base],
                    kind: LayerKind::Gradient2d {
                        amplitude: 1.0,
                        mode: GradientMode::Quadratic,
                    },
                    seed_offset: None,
                    land_mask: None,
                },
                LayerConfig {
                    name: "moisture".to_string(),
                    frequency: vec![base * 0.5, base * 0.5, base * 0.5],
                    kind: LayerKind::Gradient3d {
                        amplitude: 1.0,
                        mode: GradientMode::Linear,
                        depth: 0.0,
                    },
                    seed_offset: None,
                    land_mask: Some(sea.clone()),
                },
                LayerConfig {
                    name: "rock".to_string(),
                    frequency: vec![base * 2.0, base * 2.0],
                    kind: LayerKind::Cellular2d {
                        center_amplitude: 1.0,
                        edge_amplitude: 1.0,
                        output: CellularOutput::Edge,
                    },
                    seed_offset: None,
                    land_mask: Some(sea),
                },
            ],
        }
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON form.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of samples in one layer.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Checks dimensions, layer names, frequency arity, and mask sources.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.layers.is_empty() {
            return Err(ConfigError::Invalid("at least one layer is required".to_string()));
        }

        let mut names = HashSet::new();
        for layer in &self.layers {
            if layer.name.trim().is_empty() {
                return Err(ConfigError::Invalid("layer names must not be empty".to_string()));
            }
            if !names.insert(layer.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate layer name '{}'",
                    layer.name
                )));
            }

            let expected = layer.kind.dimensions();
            if layer.frequency.len() != expected {
                return Err(ConfigError::Invalid(format!(
                    "layer '{}' ({}) needs {} frequencies, got {}",
                    layer.name,
                    layer.kind.name(),
                    expected,
                    layer.frequency.len()
                )));
            }
            if layer
                .frequency
                .iter()
                .chain(&layer.kind.amplitudes())
                .any(|v| !v.is_finite())
            {
                return Err(ConfigError::Invalid(format!(
                    "layer '{}' has a non-finite frequency or amplitude",
                    layer.name
                )));
            }
        }

        for layer in &self.layers {
            if let Some(mask) = &layer.land_mask {
                if mask.source == layer.name {
                    return Err(ConfigError::Invalid(format!(
                        "layer '{}' cannot mask itself",
                        layer.name
                    )));
                }
                if !names.contains(mask.source.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "layer '{}' masks against unknown layer '{}'",
                        layer.name, mask.source
                    )));
                }
            }
        }

        Ok(())
    }
}
