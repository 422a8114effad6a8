//! Authored palettes
//!
//! A palette holds the ten reference colours the lookup table is interpolated
//! from: two water shades, four land shades, the snow colour and the three
//! fixed colours for outlines, background and gridlines.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of reference colours in a palette.
pub const PALETTE_SIZE: usize = 10;

/// Errors that can occur while loading a palette file.
#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected three channel values, got {found:?}")]
    Malformed { line: usize, found: String },
    #[error("line {line}: channel value {value} outside 0-255")]
    OutOfRange { line: usize, value: i64 },
    #[error("expected 10 colours, found {0}")]
    WrongCount(usize),
}

/// Named slots of a palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteSlot {
    DeepWater = 0,
    ShallowWater = 1,
    Lowland = 2,
    Highland = 3,
    Mountain = 4,
    Peak = 5,
    Snow = 6,
    Outline = 7,
    Background = 8,
    Grid = 9,
}

/// Ten reference colours, stored as `i32` channels because the table
/// interpolation is done in integer arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub colors: [[i32; 3]; PALETTE_SIZE],
}

/// Default scheme: green lowlands shading to brown peaks.
pub const STANDARD_PALETTE: Palette = Palette {
    colors: [
        [0, 0, 255],     // dark blue depths
        [0, 128, 255],   // light blue shores
        [0, 255, 0],     // light green lowlands
        [64, 192, 16],   // dark green highlands
        [64, 192, 16],   // dark green mountains
        [128, 128, 32],  // brown stony peaks
        [255, 255, 255], // white peaks
        [0, 0, 0],       // outlines
        [0, 0, 0],       // background
        [0, 0, 0],       // gridlines
    ],
};

/// Atlas-style scheme used with the alternative band layout.
pub const ALT_PALETTE: Palette = Palette {
    colors: [
        [0, 0, 192],     // dark blue depths
        [0, 128, 255],   // light blue shores
        [0, 96, 0],      // dark green lowlands
        [0, 224, 0],     // light green highlands
        [128, 176, 0],   // brown mountainsides
        [128, 128, 128], // grey stony peaks
        [255, 255, 255], // white peaks
        [0, 0, 0],
        [0, 0, 0],
        [0, 0, 0],
    ],
};

impl Default for Palette {
    fn default() -> Self {
        STANDARD_PALETTE
    }
}

impl Palette {
    pub fn color(&self, slot: PaletteSlot) -> [i32; 3] {
        self.colors[slot as usize]
    }

    /// Brighten every non-black colour `times` times.
    ///
    /// Each pass maps a channel `c` to `240 * sqrt(c / 256) + 16`.
    pub fn lightened(mut self, times: u32) -> Self {
        for _ in 0..times {
            for color in self.colors.iter_mut() {
                if color.iter().all(|&c| c == 0) {
                    continue;
                }
                for c in color.iter_mut() {
                    let x = (*c as f64 / 256.0).sqrt();
                    *c = (240.0 * x + 16.0) as i32;
                }
            }
        }
        self
    }

    /// Parse a palette from text: ten lines of `r g b`, blank lines and
    /// `#` comments ignored.
    pub fn parse(text: &str) -> Result<Self, PaletteError> {
        let mut colors = Vec::with_capacity(PALETTE_SIZE);

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let values: Vec<i64> = line
                .split_whitespace()
                .map(|v| v.parse::<i64>())
                .collect::<Result<_, _>>()
                .map_err(|_| PaletteError::Malformed { line: idx + 1, found: line.to_string() })?;
            if values.len() != 3 {
                return Err(PaletteError::Malformed { line: idx + 1, found: line.to_string() });
            }
            if let Some(&value) = values.iter().find(|v| !(0..=255).contains(*v)) {
                return Err(PaletteError::OutOfRange { line: idx + 1, value });
            }
            colors.push([values[0] as i32, values[1] as i32, values[2] as i32]);
        }

        if colors.len() != PALETTE_SIZE {
            return Err(PaletteError::WrongCount(colors.len()));
        }

        let mut palette = Palette { colors: [[0; 3]; PALETTE_SIZE] };
        palette.colors.copy_from_slice(&colors);
        Ok(palette)
    }

    pub fn from_file(path: &Path) -> Result<Self, PaletteError> {
        let text = fs::read_to_string(path)?;
        let palette = Self::parse(&text)?;
        log::debug!("Loaded palette from {}", path.display());
        Ok(palette)
    }
}
