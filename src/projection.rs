//! Map projections
//!
//! Every projection maps an output pixel `(i, j)` (row 0 at the top, north
//! up) to a direction on the unit sphere, or to nothing when the pixel lies
//! off the globe. Directions use `y = -sin(latitude)` and put longitude 0 on
//! the `+z` axis, so a point at longitude `lon` and latitude `lat` is
//! `(sin lon * cos lat, -sin lat, cos lon * cos lat)`.
//!
//! The forward transforms (longitude/latitude to fractional pixel) are only
//! used to rasterise gridlines.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

use clap::ValueEnum;
use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::oracle::depth_for_resolution;

/// Extra levels for views with a single, global depth.
pub const GLOBAL_DEPTH_BIAS: i32 = 6;
/// Extra levels for rows of (pseudo-)cylindrical projections.
pub const ROW_DEPTH_BIAS: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Mercator,
    /// Cylindrical equal-area
    Peters,
    /// Equirectangular
    Square,
    Mollweide,
    Sinusoidal,
    Stereographic,
    Orthographic,
    Gnomonic,
    /// Lambert azimuthal equal-area
    Azimuthal,
}

impl Projection {
    pub fn all() -> &'static [Projection] {
        &[
            Projection::Mercator,
            Projection::Peters,
            Projection::Square,
            Projection::Mollweide,
            Projection::Sinusoidal,
            Projection::Stereographic,
            Projection::Orthographic,
            Projection::Gnomonic,
            Projection::Azimuthal,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Projection::Mercator => "Mercator",
            Projection::Peters => "Peters",
            Projection::Square => "Square",
            Projection::Mollweide => "Mollweide",
            Projection::Sinusoidal => "Sinusoidal",
            Projection::Stereographic => "Stereographic",
            Projection::Orthographic => "Orthographic",
            Projection::Gnomonic => "Gnomonic",
            Projection::Azimuthal => "Azimuthal",
        }
    }

    /// Projections whose depth is recomputed per row from the local scale.
    pub fn is_cylindrical(&self) -> bool {
        matches!(
            self,
            Projection::Mercator
                | Projection::Peters
                | Projection::Square
                | Projection::Mollweide
                | Projection::Sinusoidal
        )
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unit direction for a longitude/latitude pair in radians.
pub fn direction(lon: f64, lat: f64) -> DVec3 {
    DVec3::new(lon.sin() * lat.cos(), -lat.sin(), lon.cos() * lat.cos())
}

/// Normalise a longitude in degrees to `(-180, 180]`.
pub fn normalize_longitude(lon_deg: f64) -> f64 {
    let mut lon = lon_deg % 360.0;
    if lon > 180.0 {
        lon -= 360.0;
    } else if lon <= -180.0 {
        lon += 360.0;
    }
    lon
}

fn wrap_angle(a: f64) -> f64 {
    let mut a = a % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a <= -PI {
        a += 2.0 * PI;
    }
    a
}

/// Rotation taking the screen frame onto the globe so that the screen
/// centre looks at `(longitude, latitude)`, both in radians.
fn view_rotation(longitude: f64, latitude: f64) -> DMat3 {
    let (slo, clo) = longitude.sin_cos();
    let (sla, cla) = latitude.sin_cos();
    DMat3::from_cols(
        DVec3::new(clo, 0.0, -slo),
        DVec3::new(slo * sla, cla, clo * sla),
        DVec3::new(slo * cla, -sla, clo * cla),
    )
}

/// Output geometry and view centre of one render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub projection: Projection,
    pub width: usize,
    pub height: usize,
    pub scale: f64,
    /// Centre longitude in radians
    pub longitude: f64,
    /// Centre latitude in radians
    pub latitude: f64,
    /// Screen frame (`z` towards the viewer) to globe frame
    rotation: DMat3,
    /// Whole-pixel row shift putting the centre latitude mid-image
    row_offset: f64,
}

impl View {
    pub fn new(projection: Projection, width: usize, height: usize, scale: f64, lon_deg: f64, lat_deg: f64) -> Self {
        let longitude = normalize_longitude(lon_deg).to_radians();
        let latitude = lat_deg.to_radians();
        let w = width as f64;

        let row_offset = match projection {
            Projection::Mercator => {
                let s = latitude.sin();
                let m = 0.5 * ((1.0 + s) / (1.0 - s)).ln();
                (0.5 * m * w * scale / PI).trunc()
            }
            Projection::Peters => (0.5 * latitude.sin() * w * scale / PI).trunc(),
            Projection::Square => (0.5 * latitude * w * scale / PI).trunc(),
            _ => 0.0,
        };

        Self {
            projection,
            width,
            height,
            scale,
            longitude,
            latitude,
            rotation: view_rotation(longitude, latitude),
            row_offset,
        }
    }

    /// Depth used by every pixel of azimuthal views, and the starting depth
    /// of cylindrical ones.
    pub fn base_depth(&self) -> u32 {
        depth_for_resolution(self.scale * self.height as f64, GLOBAL_DEPTH_BIAS)
    }

    /// Polar coordinate (`y` of the direction) and its cosine for row `j`
    /// of a cylindrical view, or `None` when the whole row is off the globe.
    fn row_geometry(&self, j: f64) -> Option<(f64, f64)> {
        let (w, h, scale) = (self.width as f64, self.height as f64, self.scale);
        let k = self.row_offset;
        match self.projection {
            Projection::Mercator => {
                let y = (PI * (2.0 * (j - k) - h) / w / scale).tanh();
                Some((y, (1.0 - y * y).sqrt()))
            }
            Projection::Peters => {
                let y = 0.5 * PI * (2.0 * (j - k) - h) / w / scale;
                if y.abs() > 1.0 {
                    return None;
                }
                Some((y, (1.0 - y * y).sqrt()))
            }
            Projection::Square => {
                let angle = (2.0 * (j - k) - h) / w / scale * PI;
                if angle.abs() >= FRAC_PI_2 {
                    return None;
                }
                Some((angle.sin(), angle.cos()))
            }
            Projection::Sinusoidal => {
                let angle = (2.0 * j - h) / w / scale * PI;
                if angle.abs() >= FRAC_PI_2 {
                    return None;
                }
                Some((angle.sin(), angle.cos()))
            }
            Projection::Mollweide => {
                let y1 = 2.0 * (2.0 * j - h) / w / scale;
                if y1.abs() >= 1.0 {
                    return None;
                }
                let zz = (1.0 - y1 * y1).sqrt();
                let y = 2.0 / PI * (y1 * zz + y1.asin());
                Some((y, (1.0 - y * y).sqrt()))
            }
            _ => None,
        }
    }

    /// Subdivision depth for row `j`.
    ///
    /// Cylindrical projections stretch rows away from the equator, so their
    /// depth follows the local horizontal scale.
    pub fn row_depth(&self, j: usize) -> u32 {
        if !self.projection.is_cylindrical() {
            return self.base_depth();
        }
        match self.row_geometry(j as f64) {
            Some((_, cos2)) if cos2 > 0.0 => {
                let scale1 = self.scale * self.width as f64 / self.height as f64 / cos2 / PI;
                depth_for_resolution(scale1 * self.height as f64, ROW_DEPTH_BIAS)
            }
            _ => self.base_depth(),
        }
    }

    /// Direction seen at pixel `(i, j)`, or `None` for background.
    pub fn pixel_direction(&self, i: f64, j: f64) -> Option<DVec3> {
        let (w, h, scale) = (self.width as f64, self.height as f64, self.scale);

        if self.projection.is_cylindrical() {
            let (y, cos2) = self.row_geometry(j)?;
            if cos2 <= 0.0 {
                return None;
            }
            let column = PI * (2.0 * i - w) / w / scale;
            let relative = match self.projection {
                Projection::Sinusoidal => column / cos2,
                Projection::Mollweide => {
                    let y1 = 2.0 * (2.0 * j - h) / w / scale;
                    column / (1.0 - y1 * y1).sqrt()
                }
                _ => column,
            };
            if matches!(self.projection, Projection::Sinusoidal | Projection::Mollweide) && relative.abs() > PI {
                return None;
            }
            let theta = self.longitude - FRAC_PI_2 + relative;
            return Some(DVec3::new(theta.cos() * cos2, y, -theta.sin() * cos2));
        }

        let x = (2.0 * i - w) / h / scale;
        let y = (2.0 * j - h) / h / scale;
        let r2 = x * x + y * y;

        let local = match self.projection {
            Projection::Orthographic => {
                if r2 > 1.0 {
                    return None;
                }
                DVec3::new(x, y, (1.0 - r2).sqrt())
            }
            Projection::Stereographic => {
                let zz = 0.25 * (4.0 + r2);
                DVec3::new(x / zz, y / zz, (1.0 - 0.25 * r2) / zz)
            }
            Projection::Gnomonic => {
                let zz = (1.0 / (1.0 + r2)).sqrt();
                let (x, y) = (x * zz, y * zz);
                DVec3::new(x, y, (1.0 - x * x - y * y).max(0.0).sqrt())
            }
            Projection::Azimuthal => {
                let z = 1.0 - 0.5 * r2;
                if z < -1.0 {
                    return None;
                }
                let k = (1.0 - 0.25 * r2).sqrt();
                DVec3::new(x * k, y * k, z)
            }
            _ => return None,
        };

        Some(self.rotate_to_globe(local))
    }

    fn rotate_to_globe(&self, p: DVec3) -> DVec3 {
        self.rotation * p
    }

    /// Inverse of [`Self::rotate_to_globe`].
    fn rotate_to_screen(&self, p: DVec3) -> DVec3 {
        self.rotation.transpose() * p
    }

    /// Fractional pixel showing longitude/latitude (degrees), or `None` when
    /// the point is not visible in this projection.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let (w, h, scale) = (self.width as f64, self.height as f64, self.scale);
        let lon = lon_deg.to_radians();
        let lat = lat_deg.to_radians();
        let k = self.row_offset;
        let dl = wrap_angle(lon - self.longitude);

        let column = |relative: f64| 0.5 * (w + relative * w * scale / PI);

        match self.projection {
            Projection::Mercator => {
                let s = -lat.sin();
                if s.abs() >= 1.0 {
                    return None;
                }
                let m = 0.5 * ((1.0 + s) / (1.0 - s)).ln();
                Some((column(dl), k + 0.5 * (h + m * w * scale / PI)))
            }
            Projection::Peters => {
                let y = -lat.sin();
                Some((column(dl), k + 0.5 * (h + 2.0 * y * w * scale / PI)))
            }
            Projection::Square => Some((column(dl), k + 0.5 * (h - lat * w * scale / PI))),
            Projection::Sinusoidal => Some((column(dl * lat.cos()), 0.5 * (h - lat * w * scale / PI))),
            Projection::Mollweide => {
                let y = -lat.sin();
                let theta = mollweide_auxiliary(y);
                let y1 = (0.5 * theta).sin();
                let zz = (1.0 - y1 * y1).sqrt();
                Some((column(dl * zz), 0.5 * (h + 0.5 * y1 * w * scale)))
            }
            _ => {
                let p = self.rotate_to_screen(direction(lon, lat));
                let (x, y) = match self.projection {
                    Projection::Orthographic => {
                        if p.z < 0.0 {
                            return None;
                        }
                        (p.x, p.y)
                    }
                    Projection::Stereographic => {
                        if p.z <= -1.0 + 1e-9 {
                            return None;
                        }
                        (2.0 * p.x / (1.0 + p.z), 2.0 * p.y / (1.0 + p.z))
                    }
                    Projection::Gnomonic => {
                        if p.z <= 1e-9 {
                            return None;
                        }
                        (p.x / p.z, p.y / p.z)
                    }
                    _ => {
                        if p.z <= -1.0 + 1e-9 {
                            return None;
                        }
                        let f = (2.0 / (1.0 + p.z)).sqrt();
                        (p.x * f, p.y * f)
                    }
                };
                Some((0.5 * (x * h * scale + w), 0.5 * (y * h * scale + h)))
            }
        }
    }
}

/// Solve `theta + sin(theta) = pi * y` for the Mollweide auxiliary angle
/// (twice the usual one).
///
/// The left side increases monotonically on `[-pi, pi]`, so Newton steps are
/// kept inside a shrinking bracket and replaced by bisection whenever they
/// would leave it. The derivative vanishes at the poles.
fn mollweide_auxiliary(y: f64) -> f64 {
    let target = PI * y.clamp(-1.0, 1.0);
    let (mut lo, mut hi) = (-PI, PI);
    let mut theta = 0.5 * target;
    for _ in 0..200 {
        let f = theta + theta.sin() - target;
        if f == 0.0 {
            break;
        }
        if f > 0.0 {
            hi = theta;
        } else {
            lo = theta;
        }
        if hi - lo < 1e-15 {
            break;
        }
        let d = 1.0 + theta.cos();
        let next = theta - f / d;
        theta = if d > 0.0 && next > lo && next < hi { next } else { 0.5 * (lo + hi) };
    }
    theta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < 1e-6
    }

    #[test]
    fn test_mercator_centre_pixel() {
        let view = View::new(Projection::Mercator, 800, 600, 1.0, 0.0, 0.0);
        let d = view.pixel_direction(400.0, 300.0).unwrap();
        assert!(close(d, DVec3::Z), "{:?}", d);
    }

    #[test]
    fn test_north_is_up() {
        for &p in Projection::all() {
            let view = View::new(p, 400, 200, 1.0, 0.0, 0.0);
            let above = view.pixel_direction(200.0, 60.0).unwrap();
            let below = view.pixel_direction(200.0, 140.0).unwrap();
            assert!(above.y < 0.0 && below.y > 0.0, "{} is upside down", p);
        }
    }

    #[test]
    fn test_directions_are_unit() {
        for &p in Projection::all() {
            let view = View::new(p, 120, 80, 1.3, 30.0, 20.0);
            for j in 0..80 {
                for i in 0..120 {
                    if let Some(d) = view.pixel_direction(i as f64, j as f64) {
                        assert!((d.length() - 1.0).abs() < 1e-9, "{} at ({}, {})", p, i, j);
                    }
                }
            }
        }
    }

    #[test]
    fn test_forward_inverts_pixel_direction() {
        let samples = [
            (10.0, 20.0),
            (-40.0, -35.0),
            (75.0, 5.0),
            (0.0, 0.0),
            (-5.0, 50.0),
            (30.0, 62.0),
            (-20.0, -70.0),
            (20.0, 80.0),
            (-60.0, -85.0),
        ];
        for &p in Projection::all() {
            let view = View::new(p, 600, 400, 1.0, 15.0, 10.0);
            for &(lon, lat) in &samples {
                let Some((i, j)) = view.project(lon, lat) else {
                    continue;
                };
                let Some(d) = view.pixel_direction(i, j) else {
                    continue;
                };
                let expected = direction(f64::to_radians(lon), f64::to_radians(lat));
                assert!(close(d, expected), "{} at {},{}: {:?} vs {:?}", p, lon, lat, d, expected);
            }
        }
    }

    #[test]
    fn test_view_centre_is_visible() {
        for &p in &[Projection::Orthographic, Projection::Stereographic, Projection::Gnomonic, Projection::Azimuthal] {
            let view = View::new(p, 300, 300, 1.0, 120.0, -30.0);
            let d = view.pixel_direction(150.0, 150.0).unwrap();
            assert!(close(d, direction(120f64.to_radians(), (-30f64).to_radians())), "{}", p);
            let (i, j) = view.project(120.0, -30.0).unwrap();
            assert!((i - 150.0).abs() < 1e-6 && (j - 150.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_background_outside_globe() {
        let ortho = View::new(Projection::Orthographic, 400, 200, 1.0, 0.0, 0.0);
        assert!(ortho.pixel_direction(0.0, 0.0).is_none());
        assert!(ortho.project(180.0, 0.0).is_none());

        let moll = View::new(Projection::Mollweide, 400, 200, 1.0, 0.0, 0.0);
        assert!(moll.pixel_direction(0.0, 0.0).is_none());
        assert!(moll.pixel_direction(200.0, 100.0).is_some());

        let sinus = View::new(Projection::Sinusoidal, 400, 200, 1.0, 0.0, 0.0);
        assert!(sinus.pixel_direction(2.0, 10.0).is_none());
    }

    #[test]
    fn test_row_depth() {
        let view = View::new(Projection::Mercator, 800, 600, 1.0, 0.0, 0.0);
        assert_eq!(view.base_depth(), 33);
        // equator: 800 / pi pixels per radian -> floor(log2(254.6)) = 7
        assert_eq!(view.row_depth(300), 24);
        // rows towards the poles need more detail
        assert!(view.row_depth(10) > view.row_depth(300));

        let ortho = View::new(Projection::Orthographic, 800, 600, 1.0, 0.0, 0.0);
        assert_eq!(ortho.row_depth(10), 33);
    }

    #[test]
    fn test_centre_latitude_shifts_rows() {
        let view = View::new(Projection::Mercator, 800, 600, 1.0, 0.0, 40.0);
        let d = view.pixel_direction(400.0, 300.0).unwrap();
        // the truncated row offset keeps the centre within a pixel of 40N
        let lat = (-d.y).asin().to_degrees();
        assert!((lat - 40.0).abs() < 0.5, "centre latitude {}", lat);
    }

    #[test]
    fn test_view_rotation_is_orthonormal() {
        let r = view_rotation(120f64.to_radians(), (-30f64).to_radians());
        let product = r * r.transpose();
        assert!(product.abs_diff_eq(DMat3::IDENTITY, 1e-12));
        assert!((r.determinant() - 1.0).abs() < 1e-12);
        // the screen axis lands on the view centre
        assert!(close(r * DVec3::Z, direction(120f64.to_radians(), (-30f64).to_radians())));
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(540.0), 180.0);
    }

    #[test]
    fn test_mollweide_auxiliary() {
        for y in [-1.0, -0.99, -0.9, -0.5, 0.0, 0.3, 0.86, 0.9, 0.999, 1.0] {
            let theta = mollweide_auxiliary(y);
            assert!((-PI..=PI).contains(&theta), "theta {} for y {}", theta, y);
            assert!((theta + theta.sin() - PI * y).abs() < 1e-10, "y {}", y);
        }
    }
}
