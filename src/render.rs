//! Map rendering
//!
//! A [`GeneratorSession`] owns everything a render needs: the validated
//! configuration, the elevation oracle (with its cache), the colour table and
//! the view. Rendering walks the output rows, picks the subdivision depth for
//! each row, classifies every pixel and finally overlays gridlines and the
//! coastline outline.

use std::time::Instant;

use rayon::prelude::*;

use crate::color_table::{ColorTable, BACK, GRID};
use crate::config::{ConfigError, GeneratorConfig};
use crate::oracle::{CacheStats, ElevationOracle};
use crate::outline;
use crate::palette::{Palette, ALT_PALETTE, STANDARD_PALETTE};
use crate::projection::View;
use crate::seeds::SeedQuadruple;
use crate::tetra::SubdivisionWeights;
use crate::tilemap::Tilemap;

/// Heights are written out as integers after this scaling.
pub const HEIGHT_SCALE: f64 = 10_000_000.0;

pub struct GeneratorSession {
    config: GeneratorConfig,
    view: View,
    oracle: ElevationOracle,
    colors: ColorTable,
}

impl GeneratorSession {
    /// Validate `config`, load its palette and build the colour table.
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let palette = match &config.palette_file {
            Some(path) => Palette::from_file(path)?,
            None if config.alt_colors => ALT_PALETTE,
            None => STANDARD_PALETTE,
        };
        Ok(Self::with_palette(config, palette))
    }

    /// Like [`Self::new`] with an explicit palette; `config` must already be
    /// valid.
    pub fn with_palette(config: GeneratorConfig, palette: Palette) -> Self {
        let palette = palette.lightened(config.lighter);

        let mut colors = if config.alt_colors {
            ColorTable::alt(&palette, config.nocols)
        } else {
            ColorTable::standard(&palette, config.nocols)
        }
        .with_latitude_coloring(config.latitude_coloring);
        if config.reverse_background {
            colors = colors.with_reversed_background();
        }

        let view = View::new(
            config.projection,
            config.width,
            config.height,
            config.scale,
            config.longitude,
            config.latitude,
        );

        let weights = SubdivisionWeights {
            altitude_weight: config.altitude_weight,
            distance_weight: config.distance_weight,
            distance_power: config.distance_power,
        };
        let seeds = SeedQuadruple::from_root(config.seed);
        let oracle = ElevationOracle::new(seeds, weights, config.initial_altitude, view.base_depth());

        log::debug!(
            "Session: seed {}, {}x{} {}, base depth {}",
            config.seed,
            config.width,
            config.height,
            config.projection,
            view.base_depth()
        );

        Self { config, view, oracle, colors }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    pub fn oracle(&self) -> &ElevationOracle {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut ElevationOracle {
        &mut self.oracle
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.oracle.stats()
    }

    /// Colour index of one pixel, using the depth of its row.
    pub fn pixel(&mut self, i: usize, j: usize) -> u8 {
        self.oracle.set_depth(self.view.row_depth(j));
        match self.view.pixel_direction(i as f64, j as f64) {
            Some(p) => self.colors.classify(self.oracle.elevation(p), p.y),
            None => BACK,
        }
    }

    /// Render the map on the current thread, reusing the session's cache.
    pub fn render(&mut self) -> Tilemap<u8> {
        let start = Instant::now();
        let rows: Vec<Vec<u8>> = (0..self.view.height)
            .map(|j| render_row(&self.view, &self.colors, &mut self.oracle, j))
            .collect();
        let map = self.finish(rows);

        let stats = self.oracle.stats();
        log::debug!(
            "Rendered {}x{} in {:.2?}, cache hit rate {:.1}%",
            self.view.width,
            self.view.height,
            start.elapsed(),
            100.0 * stats.hit_rate()
        );
        map
    }

    /// Render rows in parallel. Every worker owns a fork of the oracle, so
    /// caches are never shared; the result equals [`Self::render`].
    pub fn render_parallel(&self) -> Tilemap<u8> {
        let start = Instant::now();
        let view = &self.view;
        let colors = &self.colors;
        let rows: Vec<Vec<u8>> = (0..view.height)
            .into_par_iter()
            .map_init(|| self.oracle.fork(), |oracle, j| render_row(view, colors, oracle, j))
            .collect();
        let map = self.finish(rows);

        log::debug!(
            "Rendered {}x{} on {} threads in {:.2?}",
            view.width,
            view.height,
            rayon::current_num_threads(),
            start.elapsed()
        );
        map
    }

    fn finish(&self, rows: Vec<Vec<u8>>) -> Tilemap<u8> {
        let mut map = Tilemap::from_rows(self.view.width, rows);
        let drawn = draw_gridlines(&mut map, &self.view, self.config.grid_vertical, self.config.grid_horizontal);
        if drawn > 0 {
            log::debug!("Drew {} gridline pixels", drawn);
        }
        outline::apply_outline(&mut map, &self.colors, self.config.outline);
        map
    }

    /// Raw altitudes for every pixel (0 for background), in parallel.
    pub fn render_heights(&self) -> Tilemap<f64> {
        let view = &self.view;
        let rows: Vec<Vec<f64>> = (0..view.height)
            .into_par_iter()
            .map_init(
                || self.oracle.fork(),
                |oracle, j| {
                    oracle.set_depth(view.row_depth(j));
                    (0..view.width)
                        .map(|i| match view.pixel_direction(i as f64, j as f64) {
                            Some(p) => oracle.elevation(p),
                            None => 0.0,
                        })
                        .collect()
                },
            )
            .collect();
        Tilemap::from_rows(view.width, rows)
    }
}

fn render_row(view: &View, colors: &ColorTable, oracle: &mut ElevationOracle, j: usize) -> Vec<u8> {
    oracle.set_depth(view.row_depth(j));
    (0..view.width)
        .map(|i| match view.pixel_direction(i as f64, j as f64) {
            Some(p) => colors.classify(oracle.elevation(p), p.y),
            None => BACK,
        })
        .collect()
}

/// Multiples of `spacing` strictly inside `-limit..limit` (`limit` itself is
/// included when `inclusive_top`).
fn grid_values(spacing: f64, limit: f64, inclusive_top: bool) -> Vec<f64> {
    let mut values = Vec::new();
    if spacing <= 0.0 {
        return values;
    }
    let first = (-limit / spacing).floor() as i64;
    let last = (limit / spacing).ceil() as i64;
    for k in first..=last {
        let v = k as f64 * spacing;
        if v > -limit && (v < limit || (inclusive_top && v == limit)) {
            values.push(v);
        }
    }
    values
}

/// Upper bound on forward projections per gridline.
pub const MAX_LINE_SAMPLES: usize = 1 << 20;

/// Samples taken along one gridline: about four per pixel of line length at
/// the view's scale, capped at [`MAX_LINE_SAMPLES`]. Strongly magnified
/// views may show dotted gridlines.
pub fn line_samples(view: &View) -> usize {
    let wanted = 4.0 * (view.width + view.height) as f64 * view.scale.max(1.0);
    if wanted.is_finite() {
        (wanted.ceil() as usize).clamp(1, MAX_LINE_SAMPLES)
    } else {
        MAX_LINE_SAMPLES
    }
}

/// Overlay meridians every `vertical` degrees and parallels every
/// `horizontal` degrees (0 disables either). Returns the pixels touched.
///
/// Lines are sampled densely through the forward projection, so the same
/// code handles straight and curved gridlines.
pub fn draw_gridlines(map: &mut Tilemap<u8>, view: &View, vertical: f64, horizontal: f64) -> usize {
    let samples = line_samples(view);
    let mut touched = 0;

    let mut stamp = |map: &mut Tilemap<u8>, lon: f64, lat: f64| {
        if let Some((x, y)) = view.project(lon, lat) {
            if x.is_finite() && y.is_finite() && map.set_clipped(x.floor() as i64, y.floor() as i64, GRID) {
                touched += 1;
            }
        }
    };

    for lat in grid_values(horizontal, 90.0, false) {
        for s in 0..=samples {
            let lon = -180.0 + 360.0 * s as f64 / samples as f64;
            stamp(map, lon, lat);
        }
    }

    for lon in grid_values(vertical, 180.0, true) {
        for s in 0..=samples {
            let lat = -90.0 + 180.0 * s as f64 / samples as f64;
            stamp(map, lon, lat);
        }
    }

    touched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_table::{BLACK, WHITE};
    use crate::config::OutlineMode;
    use crate::projection::Projection;

    fn small(projection: Projection) -> GeneratorConfig {
        GeneratorConfig {
            width: 96,
            height: 64,
            projection,
            ..Default::default()
        }
    }

    /// Index of pixel (400, 300) for seed 0.123 on the default 800x600
    /// Mercator map: altitude -0.0645, mid-depth water.
    const GOLDEN_CENTRE_INDEX: u8 = 49;

    #[test]
    fn test_golden_pixel() {
        let mut session = GeneratorSession::new(GeneratorConfig::default()).unwrap();
        let first = session.pixel(400, 300);
        assert_eq!(first, GOLDEN_CENTRE_INDEX);
        // the cache holds the same tetrahedron now; answers must not change
        assert_eq!(session.pixel(400, 300), first);
        session.oracle_mut().clear_cache();
        assert_eq!(session.pixel(400, 300), first);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        for &p in &[Projection::Mercator, Projection::Orthographic, Projection::Mollweide] {
            let mut session = GeneratorSession::new(small(p)).unwrap();
            let parallel = session.render_parallel();
            let sequential = session.render();
            assert_eq!(sequential, parallel, "{}", p);
        }
    }

    #[test]
    fn test_cache_does_not_change_map() {
        let mut session = GeneratorSession::new(small(Projection::Square)).unwrap();
        let map = session.render();
        assert!(session.cache_stats().hits > 0);

        let view = *session.view();
        let colors = session.colors().clone();
        let mut oracle = session.oracle().fork();
        for (i, j, &c) in map.iter().step_by(7) {
            oracle.set_depth(view.row_depth(j));
            let expected = match view.pixel_direction(i as f64, j as f64) {
                Some(p) => colors.classify(oracle.elevation_uncached(p), p.y),
                None => BACK,
            };
            assert_eq!(c, expected, "pixel ({}, {})", i, j);
        }
    }

    #[test]
    fn test_indices_in_range() {
        for &p in Projection::all() {
            for alt_colors in [false, true] {
                let config = GeneratorConfig { alt_colors, nocols: 16, latitude_coloring: true, ..small(p) };
                let map = GeneratorSession::new(config).unwrap().render_parallel();
                assert!(map.iter().all(|(_, _, &c)| c < 16), "{} alt={}", p, alt_colors);
            }
        }
    }

    #[test]
    fn test_map_has_land_and_water() {
        let mut session = GeneratorSession::new(small(Projection::Mercator)).unwrap();
        let map = session.render();
        let colors = session.colors();
        assert!(map.iter().any(|(_, _, &c)| colors.is_land(c)));
        assert!(map.iter().any(|(_, _, &c)| colors.is_water(c)));
    }

    #[test]
    fn test_orthographic_background() {
        let map = GeneratorSession::new(small(Projection::Orthographic)).unwrap().render_parallel();
        assert_eq!(*map.get(0, 0), BACK);
        assert_ne!(*map.get(48, 32), BACK);
    }

    #[test]
    fn test_gridlines_win() {
        let config = GeneratorConfig { grid_vertical: 30.0, grid_horizontal: 30.0, ..small(Projection::Mercator) };
        let map = GeneratorSession::new(config).unwrap().render_parallel();
        // the equator row and the central meridian column are fully gridded
        assert!((0..96).all(|i| *map.get(i, 32) == GRID));
        assert!((0..64).all(|j| *map.get(48, j) == GRID));
    }

    #[test]
    fn test_mollweide_parallels_stay_on_latitude() {
        let config = GeneratorConfig { width: 400, height: 200, grid_horizontal: 80.0, ..small(Projection::Mollweide) };
        let session = GeneratorSession::new(config).unwrap();
        let map = session.render_parallel();
        let view = session.view();
        let mut checked = 0;
        for (i, j, &c) in map.iter() {
            if c != GRID {
                continue;
            }
            let Some(d) = view.pixel_direction(i as f64 + 0.5, j as f64 + 0.5) else {
                continue;
            };
            let lat = (-d.y).asin().to_degrees();
            let nearest = [-80.0, 0.0, 80.0].iter().map(|p| (lat - p).abs()).fold(f64::MAX, f64::min);
            assert!(nearest < 3.0, "GRID at ({}, {}) has latitude {:.1}", i, j, lat);
            checked += 1;
        }
        assert!(checked > 400);
    }

    #[test]
    fn test_line_samples_capped() {
        let view = View::new(Projection::Mercator, 96, 64, 1.0, 0.0, 0.0);
        assert_eq!(line_samples(&view), 640);
        let zoomed = View::new(Projection::Mercator, 96, 64, 1e6, 0.0, 0.0);
        assert_eq!(line_samples(&zoomed), MAX_LINE_SAMPLES);

        let mut map = Tilemap::new_with(96, 64, BACK);
        assert!(draw_gridlines(&mut map, &zoomed, 90.0, 90.0) > 0);
    }

    #[test]
    fn test_grid_values() {
        assert_eq!(grid_values(30.0, 90.0, false), vec![-60.0, -30.0, 0.0, 30.0, 60.0]);
        assert_eq!(grid_values(90.0, 180.0, true), vec![-90.0, 0.0, 90.0, 180.0]);
        assert!(grid_values(0.0, 90.0, false).is_empty());
    }

    #[test]
    fn test_outline_applied() {
        let config = GeneratorConfig { outline: OutlineMode::BlackAndWhite, ..small(Projection::Mercator) };
        let map = GeneratorSession::new(config).unwrap().render_parallel();
        assert!(map.iter().all(|(_, _, &c)| c == BLACK || c == WHITE));
    }

    #[test]
    fn test_heights_follow_colours() {
        let mut session = GeneratorSession::new(small(Projection::Mercator)).unwrap();
        let heights = session.render_heights();
        let map = session.render();
        for (i, j, &h) in heights.iter() {
            let c = *map.get(i, j);
            assert_eq!(h > 0.0, session.colors().is_land(c), "pixel ({}, {}) height {}", i, j, h);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GeneratorConfig { nocols: 4, ..Default::default() };
        assert!(matches!(GeneratorSession::new(config), Err(ConfigError::ColorCount { .. })));
    }
}
