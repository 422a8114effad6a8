//! Seed management for planet generation
//!
//! The whole elevation field is driven by one pure two-argument random
//! function. A single root seed is expanded into the four vertex seeds of the
//! root tetrahedron by chaining calls to it.

/// Offset added to both arguments of [`rand2`].
///
/// The truncated value of pi is part of the generator's identity: changing a
/// single digit produces a different planet for every seed.
pub const RAND2_OFFSET: f64 = 3.14159265;

/// Two-seed pseudo-random function returning a value in `[-1, 1)`.
///
/// Symmetric in its arguments (`rand2(p, q) == rand2(q, p)`), which lets an
/// edge derive the same seed from either endpoint.
pub fn rand2(p: f64, q: f64) -> f64 {
    let r = (p + RAND2_OFFSET) * (q + RAND2_OFFSET);
    2.0 * (r - r.trunc()) - 1.0
}

/// Seeds for the four vertices of the root tetrahedron.
///
/// Derived from the root seed once per session and never modified; together
/// with the subdivision weights they fully determine the elevation field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeedQuadruple {
    /// Root seed the quadruple was derived from (kept for display)
    pub root: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub r4: f64,
}

impl SeedQuadruple {
    /// Expand a root seed into the four vertex seeds.
    pub fn from_root(root: f64) -> Self {
        let r1 = rand2(root, root);
        let r2 = rand2(r1, r1);
        let r3 = rand2(r1, r2);
        let r4 = rand2(r2, r3);
        Self { root, r1, r2, r3, r4 }
    }

    /// The four seeds in vertex order.
    pub fn as_array(&self) -> [f64; 4] {
        [self.r1, self.r2, self.r3, self.r4]
    }
}

impl Default for SeedQuadruple {
    fn default() -> Self {
        Self::from_root(rand::random())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rand2_is_symmetric() {
        let samples = [-1.0, -0.37, 0.0, 0.123, 0.5, 0.999, 12.5, -250.25];
        for &p in &samples {
            for &q in &samples {
                assert_eq!(rand2(p, q), rand2(q, p), "rand2({}, {})", p, q);
            }
        }
    }

    #[test]
    fn test_rand2_range() {
        let mut p = 0.123;
        for i in 0..1000 {
            let q = i as f64 * 0.001;
            let r = rand2(p, q);
            assert!(r >= -1.0 && r < 1.0, "rand2 out of range: {}", r);
            p = r;
        }
    }

    #[test]
    fn test_rand2_known_value() {
        // (0 + offset)^2 = 9.869604...; fractional part .869604... -> 0.739208...
        let r = rand2(0.0, 0.0);
        let expected = 2.0 * (RAND2_OFFSET * RAND2_OFFSET - 9.0) - 1.0;
        assert!((r - expected).abs() < 1e-12);
    }

    #[test]
    fn test_quadruple_is_deterministic() {
        let a = SeedQuadruple::from_root(0.123);
        let b = SeedQuadruple::from_root(0.123);
        assert_eq!(a, b);

        let c = SeedQuadruple::from_root(0.124);
        assert_ne!(a.r1, c.r1);
    }

    #[test]
    fn test_quadruple_chain() {
        let q = SeedQuadruple::from_root(0.5);
        assert_eq!(q.r1, rand2(0.5, 0.5));
        assert_eq!(q.r2, rand2(q.r1, q.r1));
        assert_eq!(q.r3, rand2(q.r1, q.r2));
        assert_eq!(q.r4, rand2(q.r2, q.r3));
        for r in q.as_array() {
            assert!((-1.0..1.0).contains(&r));
        }
    }
}
