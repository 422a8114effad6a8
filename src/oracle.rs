//! Elevation oracle
//!
//! Wraps the root tetrahedron, the subdivision depth and a one-slot cache of
//! the last tetrahedron visited at [`CACHE_LEVEL`]. Neighbouring pixels
//! usually fall into the same cached tetrahedron, which skips most of the
//! descent from the root.

use glam::DVec3;

use crate::seeds::SeedQuadruple;
use crate::tetra::{self, SubdivisionWeights, Tetrahedron, CACHE_LEVEL};

/// Tetrahedron remembered from the previous descent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CachedTetrahedron {
    pub tetra: Tetrahedron,
    /// Total depth of the descent that produced this snapshot
    pub depth: u32,
}

/// Counters for cache effectiveness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Maps a direction on the sphere to an altitude (0 = sea level).
#[derive(Clone, Debug)]
pub struct ElevationOracle {
    seeds: SeedQuadruple,
    weights: SubdivisionWeights,
    initial_altitude: f64,
    root: Tetrahedron,
    depth: u32,
    cache: Option<CachedTetrahedron>,
    stats: CacheStats,
}

/// Subdivision depth needed to resolve `pixels` pixels across the globe.
///
/// Three splits halve every edge of a tetrahedron, so the depth grows by three
/// per doubling of resolution; `bias` adds a fixed number of extra levels.
pub fn depth_for_resolution(pixels: f64, bias: i32) -> u32 {
    let octaves = if pixels.is_finite() && pixels >= 1.0 {
        pixels.log2().floor() as i32
    } else {
        0
    };
    (3 * octaves + bias).max(0) as u32
}

impl ElevationOracle {
    pub fn new(seeds: SeedQuadruple, weights: SubdivisionWeights, initial_altitude: f64, depth: u32) -> Self {
        let root = tetra::root_tetrahedron(&seeds, initial_altitude);
        Self {
            seeds,
            weights,
            initial_altitude,
            root,
            depth,
            cache: None,
            stats: CacheStats::default(),
        }
    }

    pub fn seeds(&self) -> &SeedQuadruple {
        &self.seeds
    }

    pub fn weights(&self) -> &SubdivisionWeights {
        &self.weights
    }

    pub fn initial_altitude(&self) -> f64 {
        self.initial_altitude
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Change the subdivision depth used by subsequent queries.
    pub fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }

    pub fn cache(&self) -> Option<&CachedTetrahedron> {
        self.cache.as_ref()
    }

    pub fn clear_cache(&mut self) {
        self.cache = None;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// A copy sharing seeds and depth but with an empty cache, for use by
    /// another worker.
    pub fn fork(&self) -> Self {
        Self {
            cache: None,
            stats: CacheStats::default(),
            ..self.clone()
        }
    }

    /// Altitude at `point`, resuming from the cached tetrahedron when the
    /// point lies inside it.
    pub fn elevation(&mut self, point: DVec3) -> f64 {
        if let Some(cached) = self.cache {
            if cached.depth == self.depth && tetra::contains(&cached.tetra, point) {
                self.stats.hits += 1;
                let mut ignored = None;
                return tetra::subdivide(cached.tetra, point, CACHE_LEVEL, &self.weights, &mut ignored);
            }
        }

        self.stats.misses += 1;
        let mut snapshot = None;
        let altitude = tetra::subdivide(self.root, point, self.depth, &self.weights, &mut snapshot);
        if let Some(tetra) = snapshot {
            self.cache = Some(CachedTetrahedron { tetra, depth: self.depth });
        }
        altitude
    }

    /// Altitude at `point` computed from the root, ignoring and leaving the
    /// cache untouched.
    pub fn elevation_uncached(&self, point: DVec3) -> f64 {
        let mut ignored = None;
        tetra::subdivide(self.root, point, self.depth, &self.weights, &mut ignored)
    }
}
