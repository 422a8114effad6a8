//! Recursive tetrahedron subdivision
//!
//! The planet is enclosed in an irregular tetrahedron whose corners carry an
//! altitude and a seed. To find the altitude at a point, the longest edge of
//! the current tetrahedron is split at a randomly displaced point, the new
//! point receives an altitude derived from the edge endpoints, and the descent
//! continues into whichever half contains the query point. After `level`
//! splits the altitude is the mean of the four corners.
//!
//! Every choice made on the way down depends only on the tetrahedron itself,
//! so any point reached through the same sequence of tetrahedra gets the same
//! value regardless of where the descent started.

use glam::DVec3;

use crate::seeds::{rand2, SeedQuadruple};

/// Remaining depth at which the descent snapshots its tetrahedron for reuse.
pub const CACHE_LEVEL: u32 = 11;

/// One corner of a tetrahedron.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TetraVertex {
    pub altitude: f64,
    pub seed: f64,
    pub position: DVec3,
}

impl TetraVertex {
    pub fn new(altitude: f64, seed: f64, position: DVec3) -> Self {
        Self { altitude, seed, position }
    }
}

/// Four corners; the order matters to the subdivision (see [`subdivide`]).
pub type Tetrahedron = [TetraVertex; 4];

/// Weights controlling how rough the generated terrain is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubdivisionWeights {
    /// Contribution of the altitude difference along the split edge
    pub altitude_weight: f64,
    /// Contribution of the edge length
    pub distance_weight: f64,
    /// Exponent applied to the (squared, compressed) edge length
    pub distance_power: f64,
}

impl Default for SubdivisionWeights {
    fn default() -> Self {
        Self {
            altitude_weight: 0.4,
            distance_weight: 0.03,
            distance_power: 0.47,
        }
    }
}

/// Build the tetrahedron enclosing the unit sphere.
///
/// The corners are deliberately off a regular tetrahedron and nudged by the
/// seeds, so no two edges are ever exactly equal in length.
pub fn root_tetrahedron(seeds: &SeedQuadruple, initial_altitude: f64) -> Tetrahedron {
    let SeedQuadruple { r1, r2, r3, r4, .. } = *seeds;
    let m = initial_altitude;
    [
        TetraVertex::new(m, r1, DVec3::new(0.0, 0.0, 3.01)),
        TetraVertex::new(
            m,
            r2,
            DVec3::new(0.0, 8.0f64.sqrt() + 0.01 * r1 * r1, -1.02 + 0.01 * r2 * r3),
        ),
        TetraVertex::new(
            m,
            r3,
            DVec3::new(
                -(6.0f64.sqrt()) - 0.01 * r3 * r3,
                -(2.0f64.sqrt()) - 0.01 * r4 * r4,
                -1.02 + 0.01 * r1 * r2,
            ),
        ),
        TetraVertex::new(
            m,
            r4,
            DVec3::new(
                6.0f64.sqrt() - 0.01 * r2 * r2,
                -(2.0f64.sqrt()) - 0.01 * r3 * r3,
                -1.02 + 0.01 * r1 * r3,
            ),
        ),
    ]
}

/// True when `point` and `reference` lie strictly on the same side of the
/// plane through `origin`, `u` and `v` (signed-volume test).
pub fn same_side(origin: DVec3, u: DVec3, v: DVec3, reference: DVec3, point: DVec3) -> bool {
    let normal = (u - origin).cross(v - origin);
    (reference - origin).dot(normal) * (point - origin).dot(normal) > 0.0
}

/// True when `point` lies strictly inside the tetrahedron.
pub fn contains(tetra: &Tetrahedron, point: DVec3) -> bool {
    let [a, b, c, d] = [
        tetra[0].position,
        tetra[1].position,
        tetra[2].position,
        tetra[3].position,
    ];
    same_side(a, b, c, d, point)
        && same_side(a, b, d, c, point)
        && same_side(a, c, d, b, point)
        && same_side(b, c, d, a, point)
}

/// Reorder the corners so that `a-b` is the longest edge.
///
/// The comparisons cascade in a fixed order (ab against ac, ad, bc, bd, cd);
/// whenever another edge is strictly longer the tetrahedron is relabelled and
/// the cascade restarts. Equal lengths keep the current labelling.
fn longest_edge_first(tetra: Tetrahedron) -> (Tetrahedron, f64) {
    let mut t = tetra;
    loop {
        let [a, b, c, d] = t;
        let lab = (a.position - b.position).length_squared();

        let lac = (a.position - c.position).length_squared();
        if lab < lac {
            t = [a, c, b, d];
            continue;
        }
        let lad = (a.position - d.position).length_squared();
        if lab < lad {
            t = [a, d, b, c];
            continue;
        }
        let lbc = (b.position - c.position).length_squared();
        if lab < lbc {
            t = [b, c, a, d];
            continue;
        }
        let lbd = (b.position - d.position).length_squared();
        if lab < lbd {
            t = [b, d, a, c];
            continue;
        }
        let lcd = (c.position - d.position).length_squared();
        if lab < lcd {
            t = [c, d, a, b];
            continue;
        }
        return (t, lab);
    }
}

/// Split the longest edge `a-b` and return the new vertex.
fn split_edge(a: &TetraVertex, b: &TetraVertex, lab: f64, weights: &SubdivisionWeights) -> TetraVertex {
    let es = rand2(a.seed, b.seed);
    let es1 = rand2(es, es);
    let es2 = 0.5 + 0.1 * rand2(es1, es1);
    let es3 = 1.0 - es2;

    // The endpoint with the smaller x always gets the `es2` share, so the
    // split point does not depend on which end is labelled `a`.
    let (pa, pb) = (a.position, b.position);
    let position = if pa.x == pb.x {
        pa * 0.5 + pb * 0.5
    } else if pa.x < pb.x {
        pa * es2 + pb * es3
    } else {
        pa * es3 + pb * es2
    };

    let length = if lab > 1.0 { lab.powf(0.75) } else { lab };
    let altitude = 0.5 * (a.altitude + b.altitude)
        + es * weights.altitude_weight * (a.altitude - b.altitude).abs()
        + es1 * weights.distance_weight * length.powf(weights.distance_power);

    TetraVertex::new(altitude, es, position)
}

/// Descend `level` subdivision steps towards `point` and return its altitude.
///
/// When the descent passes remaining depth [`CACHE_LEVEL`], the tetrahedron at
/// that depth is written to `snapshot`, so a later query inside it can resume
/// from there with `level == CACHE_LEVEL` and get an identical result.
pub fn subdivide(
    tetra: Tetrahedron,
    point: DVec3,
    level: u32,
    weights: &SubdivisionWeights,
    snapshot: &mut Option<Tetrahedron>,
) -> f64 {
    let mut tetra = tetra;
    let mut level = level;

    while level > 0 {
        let (ordered, lab) = longest_edge_first(tetra);
        if level == CACHE_LEVEL {
            *snapshot = Some(ordered);
        }

        let [a, b, c, d] = ordered;
        let e = split_edge(&a, &b, lab, weights);

        tetra = if same_side(e.position, c.position, d.position, a.position, point) {
            [c, d, a, e]
        } else {
            [c, d, b, e]
        };
        level -= 1;
    }

    tetra.iter().map(|v| v.altitude).sum::<f64>() / 4.0
}
