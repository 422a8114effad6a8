//! World-space terrain queries
//!
//! A 3-D scene places the planet's Mercator map on a square world of
//! [`WORLD_EXTENT`] units. `x` runs east and wraps around the globe, `z` runs
//! south and is clamped at the map edges. Queries go straight to the
//! elevation oracle at the continuous map position, so they are not limited
//! to the resolution of a rendered map.

use std::fmt;

use crate::oracle::ElevationOracle;
use crate::projection::{Projection, View};
use crate::render::GeneratorSession;

/// Side length of the world in scene units.
pub const WORLD_EXTENT: f64 = 3_000_000.0;

/// What lies at a world position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Water,
    /// Land with no water one sample away
    Land,
    /// Land next to water
    Coast,
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfaceKind::Water => "water",
            SurfaceKind::Land => "land",
            SurfaceKind::Coast => "coast",
        };
        f.write_str(name)
    }
}

/// Axis-aligned walking directions; up is towards `-z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
    Up,
    Down,
}

impl Direction {
    pub fn all() -> [Direction; 4] {
        [Direction::Right, Direction::Left, Direction::Up, Direction::Down]
    }

    /// Unit step as `(dx, dz)`.
    pub fn delta(&self) -> (f64, f64) {
        match self {
            Direction::Right => (1.0, 0.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
        }
    }
}

pub struct TerrainQuery {
    view: View,
    oracle: ElevationOracle,
    /// Distance used by [`Self::describe`] to look for nearby water
    coast_sample: f64,
}

impl TerrainQuery {
    /// Query the planet of `session` through a Mercator map of the session's
    /// size and centre. The query keeps its own oracle cache.
    pub fn new(session: &GeneratorSession) -> Self {
        let config = session.config();
        let view = View::new(
            Projection::Mercator,
            config.width,
            config.height,
            config.scale,
            config.longitude,
            config.latitude,
        );
        Self {
            view,
            oracle: session.oracle().fork(),
            coast_sample: WORLD_EXTENT / config.width as f64,
        }
    }

    /// Change the sample distance of coast detection.
    pub fn with_coast_sample(mut self, sample: f64) -> Self {
        self.coast_sample = sample;
        self
    }

    /// Map pixel coordinates for a world position.
    pub fn map_position(&self, x: f64, z: f64) -> (f64, f64) {
        let x = x.rem_euclid(WORLD_EXTENT);
        let z = z.clamp(0.0, WORLD_EXTENT);
        let i = x * self.view.width as f64 / WORLD_EXTENT;
        let j = (z * self.view.height as f64 / WORLD_EXTENT).min(self.view.height as f64 - 1.0);
        (i, j)
    }

    /// Altitude at world position `(x, z)`; positive is above sea level.
    pub fn elevation_at(&mut self, x: f64, z: f64) -> f64 {
        let (i, j) = self.map_position(x, z);
        self.oracle.set_depth(self.view.row_depth(j as usize));
        match self.view.pixel_direction(i, j) {
            Some(p) => self.oracle.elevation(p),
            None => 0.0,
        }
    }

    pub fn is_land(&mut self, x: f64, z: f64) -> bool {
        self.elevation_at(x, z) > 0.0
    }

    pub fn describe(&mut self, x: f64, z: f64) -> SurfaceKind {
        if !self.is_land(x, z) {
            return SurfaceKind::Water;
        }
        let sample = self.coast_sample;
        let near_water = Direction::all().iter().any(|d| {
            let (dx, dz) = d.delta();
            !self.is_land(x + dx * sample, z + dz * sample)
        });
        if near_water {
            SurfaceKind::Coast
        } else {
            SurfaceKind::Land
        }
    }

    /// Steps of `sample` units from `(x, z)` along `direction` until the
    /// surface is `target`. Zero means the start already matches; `None`
    /// means `max_steps` steps found nothing.
    pub fn distance_from(
        &mut self,
        target: SurfaceKind,
        x: f64,
        z: f64,
        sample: f64,
        direction: Direction,
        max_steps: usize,
    ) -> Option<usize> {
        let (dx, dz) = direction.delta();
        (0..=max_steps).find(|&step| {
            let d = step as f64 * sample;
            self.describe(x + dx * d, z + dz * d) == target
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;

    fn query() -> (GeneratorSession, TerrainQuery) {
        let config = GeneratorConfig { width: 120, height: 80, ..Default::default() };
        let session = GeneratorSession::new(config).unwrap();
        let query = TerrainQuery::new(&session);
        (session, query)
    }

    #[test]
    fn test_map_position_wraps_and_clamps() {
        let (_, q) = query();
        let (i, j) = q.map_position(WORLD_EXTENT * 0.5, WORLD_EXTENT * 0.5);
        assert_eq!((i, j), (60.0, 40.0));
        let (i, _) = q.map_position(-WORLD_EXTENT * 0.25, 0.0);
        assert!((i - 90.0).abs() < 1e-9);
        let (_, j) = q.map_position(0.0, WORLD_EXTENT * 4.0);
        assert_eq!(j, 79.0);
        let (_, j) = q.map_position(0.0, -10.0);
        assert_eq!(j, 0.0);
    }

    #[test]
    fn test_elevation_matches_rendered_map() {
        let (mut session, mut q) = query();
        let map = session.render();
        let colors = session.colors().clone();
        for j in (0..80).step_by(9) {
            for i in (0..120).step_by(11) {
                let x = i as f64 * WORLD_EXTENT / 120.0;
                let z = j as f64 * WORLD_EXTENT / 80.0;
                assert_eq!(q.is_land(x, z), colors.is_land(*map.get(i, j)), "({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_elevation_deterministic() {
        let (_, mut q) = query();
        let a = q.elevation_at(1_234_567.0, 987_654.0);
        let b = q.elevation_at(2_000_000.0, 100_000.0);
        assert_eq!(q.elevation_at(1_234_567.0, 987_654.0), a);
        assert_eq!(q.elevation_at(2_000_000.0 + WORLD_EXTENT, 100_000.0), b);
    }

    #[test]
    fn test_describe_consistent() {
        let (_, mut q) = query();
        let mut kinds = Vec::new();
        for k in 0..200 {
            let x = k as f64 * WORLD_EXTENT / 200.0;
            let z = WORLD_EXTENT * 0.5;
            let kind = q.describe(x, z);
            assert_eq!(kind == SurfaceKind::Water, !q.is_land(x, z));
            kinds.push(kind);
        }
        assert!(kinds.contains(&SurfaceKind::Water));
        assert!(kinds.iter().any(|k| *k != SurfaceKind::Water));
    }

    #[test]
    fn test_distance_from() {
        let (_, mut q) = query();
        let z = WORLD_EXTENT * 0.5;
        let sample = WORLD_EXTENT / 400.0;
        let here = q.describe(0.0, z);
        assert_eq!(q.distance_from(here, 0.0, z, sample, Direction::Right, 10), Some(0));

        // walking right along the equator eventually reaches the other kind
        let other = if here == SurfaceKind::Water { SurfaceKind::Coast } else { SurfaceKind::Water };
        let steps = q.distance_from(other, 0.0, z, sample, Direction::Right, 400);
        if let Some(n) = steps {
            assert!(n > 0);
            assert_eq!(q.describe(n as f64 * sample, z), other);
        }
        assert_eq!(q.distance_from(other, 0.0, z, sample, Direction::Right, 0), None);
    }
}
