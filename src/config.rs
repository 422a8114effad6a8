//! Generator configuration
//!
//! One flat struct describing a render. Missing fields in a JSON file take
//! their defaults, so a file only needs the values it changes.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color_table::{MAX_COLORS, MIN_COLORS, MIN_STANDARD_COLORS};
use crate::palette::PaletteError;
use crate::projection::Projection;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("palette error: {0}")]
    Palette(#[from] PaletteError),
    #[error("invalid map size {width}x{height}")]
    InvalidSize { width: usize, height: usize },
    #[error("seed must be a finite number in 0..=1, got {0}")]
    InvalidSeed(f64),
    #[error("scale must be positive, got {0}")]
    InvalidScale(f64),
    #[error("{found} colours requested, need {min}..={max}")]
    ColorCount { found: usize, min: usize, max: usize },
    #[error("grid spacing must be zero or positive, got {0}")]
    InvalidGrid(f64),
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },
}

/// Coastline post-processing applied after rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutlineMode {
    #[default]
    None,
    /// Trace coastlines in black on the colour map
    Edges,
    /// Black coastlines on white water and black land
    BlackAndWhite,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Root seed in 0..=1
    pub seed: f64,
    pub width: usize,
    pub height: usize,
    /// Magnification
    pub scale: f64,
    /// Centre longitude in degrees
    pub longitude: f64,
    /// Centre latitude in degrees
    pub latitude: f64,
    pub projection: Projection,
    pub nocols: usize,
    pub alt_colors: bool,
    pub latitude_coloring: bool,
    /// Meridian spacing in degrees, 0 for none
    pub grid_vertical: f64,
    /// Parallel spacing in degrees, 0 for none
    pub grid_horizontal: f64,
    pub initial_altitude: f64,
    pub distance_weight: f64,
    pub altitude_weight: f64,
    pub distance_power: f64,
    /// Number of lightening passes over the palette
    pub lighter: u32,
    pub reverse_background: bool,
    pub outline: OutlineMode,
    /// Replaces the built-in palette when set
    pub palette_file: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0.123,
            width: 800,
            height: 600,
            scale: 1.0,
            longitude: 0.0,
            latitude: 0.0,
            projection: Projection::Mercator,
            nocols: 256,
            alt_colors: false,
            latitude_coloring: false,
            grid_vertical: 0.0,
            grid_horizontal: 0.0,
            initial_altitude: -0.02,
            distance_weight: 0.03,
            altitude_weight: 0.4,
            distance_power: 0.47,
            lighter: 0,
            reverse_background: false,
            outline: OutlineMode::None,
            palette_file: None,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Smallest colour count the selected layout accepts.
    pub fn min_colors(&self) -> usize {
        if self.alt_colors {
            MIN_COLORS
        } else {
            MIN_STANDARD_COLORS
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidSize { width: self.width, height: self.height });
        }
        if !self.seed.is_finite() || !(0.0..=1.0).contains(&self.seed) {
            return Err(ConfigError::InvalidSeed(self.seed));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        let min = self.min_colors();
        if self.nocols < min || self.nocols > MAX_COLORS {
            return Err(ConfigError::ColorCount { found: self.nocols, min, max: MAX_COLORS });
        }
        for grid in [self.grid_vertical, self.grid_horizontal] {
            if !grid.is_finite() || grid < 0.0 {
                return Err(ConfigError::InvalidGrid(grid));
            }
        }
        let finite = [
            ("longitude", self.longitude),
            ("latitude", self.latitude),
            ("initial_altitude", self.initial_altitude),
            ("distance_weight", self.distance_weight),
            ("altitude_weight", self.altitude_weight),
            ("distance_power", self.distance_power),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }
        Ok(())
    }
}
