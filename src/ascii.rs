//! ASCII rendering and export for generated maps
//!
//! Maps are downsampled to a character grid for quick inspection in a
//! terminal, or written to a text report together with the generation
//! parameters and some statistics.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::Local;
use clap::ValueEnum;

use crate::color_table::{BandLayout, ColorTable, BACK, BLACK, BLUE0, GRID, WHITE};
use crate::config::GeneratorConfig;
use crate::tilemap::Tilemap;

/// ASCII rendering modes
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AsciiMode {
    /// Characters by colour band
    Terrain,
    /// Characters by raw altitude
    Height,
}

impl AsciiMode {
    pub fn name(&self) -> &'static str {
        match self {
            AsciiMode::Terrain => "Terrain",
            AsciiMode::Height => "Height",
        }
    }
}

/// Get ASCII character for a colour index
pub fn index_char(index: u8, table: &ColorTable) -> char {
    match index {
        BLACK => '#',
        BACK => ' ',
        GRID => '+',
        WHITE => '*',
        _ if table.is_water(index) => {
            // deep half of the water band vs the shallow half
            let blue1 = table.layout().blue1();
            let mid = (BLUE0 as u16 + blue1 as u16) / 2;
            if (index as u16) < mid {
                '~'
            } else {
                '-'
            }
        }
        _ => match table.layout() {
            BandLayout::Standard { land1, land4, .. } => {
                if index == land4 {
                    '*'
                } else if index < land1 {
                    '.'
                } else {
                    '^'
                }
            }
            BandLayout::Alt { green1, brown0, grey0, .. } => {
                if index < green1 {
                    '.'
                } else if index < brown0 {
                    ','
                } else if index < grey0 {
                    '^'
                } else {
                    'A'
                }
            }
        },
    }
}

/// Get ASCII character for an altitude (sea level at 0)
pub fn height_char(altitude: f64) -> char {
    const CHARS: &[char] = &['~', '~', '-', '-', '.', ':', '=', '+', '^', 'A', 'M'];
    let normalized = ((altitude + 0.1) / 0.2).clamp(0.0, 1.0);
    let idx = (normalized * (CHARS.len() - 1) as f64) as usize;
    CHARS[idx.min(CHARS.len() - 1)]
}

/// Cell centres of a `columns`-wide preview. Terminal characters are about
/// twice as tall as wide, so rows are halved.
fn preview_cells(width: usize, height: usize, columns: usize) -> (Vec<usize>, Vec<usize>) {
    let columns = columns.clamp(1, width.max(1));
    let rows = ((columns * height) / (2 * width.max(1))).max(1).min(height.max(1));
    let xs = (0..columns).map(|c| ((2 * c + 1) * width) / (2 * columns)).collect();
    let ys = (0..rows).map(|r| ((2 * r + 1) * height) / (2 * rows)).collect();
    (xs, ys)
}

fn render_with<T, F: Fn(&T) -> char>(map: &Tilemap<T>, columns: usize, to_char: F) -> String
where
    T: Clone,
{
    let (xs, ys) = preview_cells(map.width, map.height, columns);
    let mut result = String::with_capacity((xs.len() + 1) * ys.len());
    for &y in &ys {
        for &x in &xs {
            result.push(to_char(map.get(x, y)));
        }
        result.push('\n');
    }
    result
}

/// Render a colour-index map to an ASCII string `columns` characters wide
pub fn render_ascii_map(map: &Tilemap<u8>, table: &ColorTable, columns: usize) -> String {
    if map.width == 0 || map.height == 0 {
        return String::new();
    }
    render_with(map, columns, |&c| index_char(c, table))
}

/// Render an altitude map to an ASCII string `columns` characters wide
pub fn render_ascii_heights(heights: &Tilemap<f64>, columns: usize) -> String {
    if heights.width == 0 || heights.height == 0 {
        return String::new();
    }
    render_with(heights, columns, |&h| height_char(h))
}

/// Legend for [`index_char`]
pub fn terrain_legend() -> String {
    [
        "~  deep water",
        "-  shallow water",
        ".  lowland",
        ",  hills (alternative colours)",
        "^  mountains",
        "A  bare peaks (alternative colours)",
        "*  snow and ice",
        "+  gridline",
        "#  outline",
    ]
    .join("\n")
}

/// Counts of pixels per surface class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapStats {
    pub water: usize,
    pub land: usize,
    /// Background, grid, outline and snow overrides
    pub other: usize,
}

impl MapStats {
    pub fn collect(map: &Tilemap<u8>, table: &ColorTable) -> Self {
        let mut stats = MapStats::default();
        for (_, _, &c) in map.iter() {
            if table.is_water(c) {
                stats.water += 1;
            } else if table.is_land(c) {
                stats.land += 1;
            } else {
                stats.other += 1;
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.water + self.land + self.other
    }

    pub fn percent(&self, count: usize) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.total() as f64
        }
    }
}

/// Export a map report to a text file
pub fn export_report(
    map: &Tilemap<u8>,
    table: &ColorTable,
    config: &GeneratorConfig,
    columns: usize,
    path: &Path,
) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    let stats = MapStats::collect(map, table);

    // Header
    writeln!(file, "=== TETRA PLANET MAP ===")?;
    writeln!(file, "Seed: {}", config.seed)?;
    writeln!(file, "Size: {}x{}", map.width, map.height)?;
    writeln!(
        file,
        "Projection: {} (scale {}, centre {:.1}, {:.1})",
        config.projection, config.scale, config.longitude, config.latitude
    )?;
    writeln!(file, "Colours: {} ({})", table.len(), if config.alt_colors { "alternative" } else { "standard" })?;
    writeln!(file, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file)?;

    writeln!(file, "=== MAP ===")?;
    write!(file, "{}", render_ascii_map(map, table, columns))?;
    writeln!(file)?;
    writeln!(file, "{}", terrain_legend())?;
    writeln!(file)?;

    writeln!(file, "=== STATISTICS ===")?;
    writeln!(file, "Total pixels: {}", stats.total())?;
    writeln!(file, "Land: {} ({:.1}%)", stats.land, stats.percent(stats.land))?;
    writeln!(file, "Water: {} ({:.1}%)", stats.water, stats.percent(stats.water))?;
    writeln!(file, "Other: {} ({:.1}%)", stats.other, stats.percent(stats.other))?;

    file.flush()?;
    log::info!("Wrote report to {}", path.display());
    Ok(())
}
