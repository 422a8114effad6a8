//! Colour lookup table
//!
//! Expands a ten-colour [`Palette`] into `nocols` entries and maps altitudes
//! to entries. The first four indices are reserved (black, background, grid,
//! white); water starts at [`BLUE0`]. Two band layouts exist:
//!
//! * standard: half of the free entries are water, the rest are split into a
//!   lowland and a highland ramp plus a single snow entry at the top;
//! * alternative: a quarter is water, the land ramps go through green, brown
//!   and grey to white, following common atlas conventions.
//!
//! Ramps are filled with integer interpolation between two reference
//! colours, truncating like the tables this layout was designed with.

use crate::palette::{Palette, PaletteSlot};

pub const BLACK: u8 = 0;
pub const BACK: u8 = 1;
pub const GRID: u8 = 2;
pub const WHITE: u8 = 3;
pub const BLUE0: u8 = 4;

/// Smallest table any layout accepts.
pub const MIN_COLORS: usize = 8;
/// Smallest table the standard layout accepts; at 8 its land ramp is empty.
pub const MIN_STANDARD_COLORS: usize = 9;
/// Indices are stored as `u8`.
pub const MAX_COLORS: usize = 256;

/// Band boundaries of a colour table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BandLayout {
    Standard {
        blue1: u8,
        land0: u8,
        land1: u8,
        land2: u8,
        /// Snow / ice entry
        land4: u8,
    },
    Alt {
        blue1: u8,
        land0: u8,
        green1: u8,
        brown0: u8,
        grey0: u8,
        land1: u8,
    },
}

impl BandLayout {
    /// Last water index (the first is always [`BLUE0`]).
    pub fn blue1(&self) -> u8 {
        match *self {
            BandLayout::Standard { blue1, .. } | BandLayout::Alt { blue1, .. } => blue1,
        }
    }

    /// First land index.
    pub fn land0(&self) -> u8 {
        match *self {
            BandLayout::Standard { land0, .. } | BandLayout::Alt { land0, .. } => land0,
        }
    }
}

/// RGB lookup table plus the band layout used to fill it.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorTable {
    entries: Vec<[u8; 3]>,
    layout: BandLayout,
    latitude_coloring: bool,
}

/// Linear blend between two colours at `i` in `lo..hi`, integer arithmetic.
fn ramp(from: [i32; 3], to: [i32; 3], i: i32, lo: i32, hi: i32) -> [u8; 3] {
    let mut out = [0u8; 3];
    for c in 0..3 {
        let v = (from[c] * (hi - i) + to[c] * (i - lo)) / (hi - lo);
        out[c] = v.clamp(0, 255) as u8;
    }
    out
}

fn to_rgb(color: [i32; 3]) -> [u8; 3] {
    [
        color[0].clamp(0, 255) as u8,
        color[1].clamp(0, 255) as u8,
        color[2].clamp(0, 255) as u8,
    ]
}

impl ColorTable {
    /// Standard layout. `nocols` must be within
    /// [`MIN_STANDARD_COLORS`]..=[`MAX_COLORS`]; the session validates this.
    pub fn standard(palette: &Palette, nocols: usize) -> Self {
        let n = nocols as i32;
        let mut entries = vec![[0u8; 3]; nocols];
        fill_reserved(&mut entries, palette);

        let deep = palette.color(PaletteSlot::DeepWater);
        let shallow = palette.color(PaletteSlot::ShallowWater);
        let blue0 = BLUE0 as i32;
        let blue1 = (n - 4) / 2 + blue0;
        if blue1 == blue0 {
            entries[BLUE0 as usize] = to_rgb(deep);
        } else {
            for i in blue0..=blue1 {
                entries[i as usize] = ramp(deep, shallow, i, blue0, blue1);
            }
        }

        let land0 = blue1 + 1;
        let land2 = n - 2;
        let land1 = (land0 + land2 + 1) / 2;
        let lowland = palette.color(PaletteSlot::Lowland);
        let highland = palette.color(PaletteSlot::Highland);
        for i in land0..land1 {
            entries[i as usize] = ramp(lowland, highland, i, land0, land1);
        }

        let mountain = palette.color(PaletteSlot::Mountain);
        let peak = palette.color(PaletteSlot::Peak);
        if land1 == land2 {
            entries[land1 as usize] = to_rgb(mountain);
        } else {
            for i in land1..=land2 {
                entries[i as usize] = ramp(mountain, peak, i, land1, land2);
            }
        }

        let land4 = n - 1;
        entries[land4 as usize] = to_rgb(palette.color(PaletteSlot::Snow));

        let layout = BandLayout::Standard {
            blue1: blue1 as u8,
            land0: land0 as u8,
            land1: land1 as u8,
            land2: land2 as u8,
            land4: land4 as u8,
        };
        log::debug!("Standard colour bands for {} colours: {:?}", nocols, layout);

        Self { entries, layout, latitude_coloring: false }
    }

    /// Alternative layout. `nocols` must be within
    /// [`MIN_COLORS`]..=[`MAX_COLORS`].
    pub fn alt(palette: &Palette, nocols: usize) -> Self {
        let n = nocols as i32;
        let mut entries = vec![[0u8; 3]; nocols];
        fill_reserved(&mut entries, palette);

        let blue0 = BLUE0 as i32;
        let land0 = (n / 4).max(blue0 + 1);
        let blue1 = land0 - 1;
        let grey0 = n - n / 8;
        let green1 = (land0 + n / 2).min(grey0 - 2);
        let brown0 = (green1 + grey0) / 2;
        let land1 = n - 1;

        let deep = palette.color(PaletteSlot::DeepWater);
        let shallow = palette.color(PaletteSlot::ShallowWater);
        entries[BLUE0 as usize] = to_rgb(deep);
        for i in (blue0 + 1)..=blue1 {
            entries[i as usize] = ramp(deep, shallow, i, blue0, blue1);
        }

        let lowland = palette.color(PaletteSlot::Lowland);
        let highland = palette.color(PaletteSlot::Highland);
        let mountain = palette.color(PaletteSlot::Mountain);
        let peak = palette.color(PaletteSlot::Peak);
        let snow = palette.color(PaletteSlot::Snow);

        for i in land0..green1 {
            entries[i as usize] = ramp(lowland, highland, i, land0, green1);
        }
        for i in green1..brown0 {
            entries[i as usize] = ramp(highland, mountain, i, green1, brown0);
        }
        for i in brown0..grey0 {
            entries[i as usize] = ramp(mountain, peak, i, brown0, grey0);
        }
        // the top ramp runs towards one past the snow colour over one extra
        // step, so the last entry stops just short of it
        let snow_plus = [snow[0] + 1, snow[1] + 1, snow[2] + 1];
        for i in grey0..n {
            entries[i as usize] = ramp(peak, snow_plus, i, grey0, n);
        }

        let layout = BandLayout::Alt {
            blue1: blue1 as u8,
            land0: land0 as u8,
            green1: green1 as u8,
            brown0: brown0 as u8,
            grey0: grey0 as u8,
            land1: land1 as u8,
        };
        log::debug!("Alternative colour bands for {} colours: {:?}", nocols, layout);

        Self { entries, layout, latitude_coloring: false }
    }

    /// Enable latitude-dependent colouring (ice caps).
    pub fn with_latitude_coloring(mut self, enabled: bool) -> Self {
        self.latitude_coloring = enabled;
        self
    }

    /// Paint the background entry white instead of the palette colour.
    pub fn with_reversed_background(mut self) -> Self {
        self.entries[BACK as usize] = [255, 255, 255];
        self
    }

    pub fn layout(&self) -> BandLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rgb(&self, index: u8) -> [u8; 3] {
        self.entries[index as usize]
    }

    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }

    pub fn is_water(&self, index: u8) -> bool {
        index >= BLUE0 && index <= self.layout.blue1()
    }

    pub fn is_land(&self, index: u8) -> bool {
        index >= self.layout.land0()
    }

    /// Colour index for `altitude` at a point whose polar coordinate is `y`
    /// (the sine of its latitude, sign irrelevant).
    pub fn classify(&self, altitude: f64, y: f64) -> u8 {
        match self.layout {
            BandLayout::Standard { blue1, land0, land2, land4, .. } => {
                self.classify_standard(altitude, y, blue1, land0, land2, land4)
            }
            BandLayout::Alt { blue1, land0, green1, grey0, land1, .. } => {
                self.classify_alt(altitude, y, blue1, land0, green1, grey0, land1)
            }
        }
    }

    fn classify_standard(&self, altitude: f64, y: f64, blue1: u8, land0: u8, land2: u8, land4: u8) -> u8 {
        let (blue0, blue1, land0, land2) = (BLUE0 as i64, blue1 as i64, land0 as i64, land2 as i64);
        let mut alt = altitude;

        if alt <= 0.0 {
            if self.latitude_coloring && y * y + alt >= 0.98 {
                return land4;
            }
            let colour = blue1 + ((blue1 - blue0 + 1) as f64 * (10.0 * alt)) as i64;
            colour.max(blue0) as u8
        } else {
            if self.latitude_coloring {
                alt += 0.10204 * y * y;
            }
            if alt >= 0.1 {
                return land4;
            }
            let colour = land0 + ((land2 - land0 + 1) as f64 * (10.0 * alt)) as i64;
            colour.min(land2) as u8
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn classify_alt(&self, altitude: f64, y: f64, blue1: u8, land0: u8, green1: u8, grey0: u8, land1: u8) -> u8 {
        let (blue0, blue1) = (BLUE0 as i64, blue1 as i64);
        let (land0, green1, grey0, land1) = (land0 as i64, green1 as i64, grey0 as i64, land1 as i64);

        let mut snow = 0.125;
        let mut tree = snow * 0.5;
        let mut bare = (tree + snow) / 2.0;
        if self.latitude_coloring {
            let y6 = y * y * y * y * y * y;
            snow -= 0.13 * y6;
            bare -= 0.12 * y6;
            tree -= 0.11 * y6;
        }

        let colour = if altitude > 0.0 {
            let alt = altitude;
            if alt > snow {
                WHITE as i64
            } else if alt > bare {
                let c = grey0 + ((1 + land1 - grey0) as f64 * (alt - bare) / (snow - bare)) as i64;
                c.min(land1)
            } else if alt > tree {
                let c = green1 + ((1 + grey0 - green1) as f64 * (alt - tree) / (bare - tree)) as i64;
                c.min(grey0)
            } else {
                let c = land0 + ((1 + green1 - land0) as f64 * alt / tree) as i64;
                c.min(green1)
            }
        } else {
            // sea ice only forms where the snow line dips below sea level
            let alt = altitude / 2.0;
            if alt > snow {
                WHITE as i64
            } else if alt > bare {
                let c = grey0 + ((1 + land1 - grey0) as f64 * (alt - bare) / (snow - bare)) as i64;
                c.min(land1)
            } else {
                let c = blue1 + ((blue1 - blue0 + 1) as f64 * (25.0 * alt)) as i64;
                c.max(blue0)
            }
        };
        colour as u8
    }
}

fn fill_reserved(entries: &mut [[u8; 3]], palette: &Palette) {
    entries[GRID as usize] = to_rgb(palette.color(PaletteSlot::Grid));
    entries[BACK as usize] = to_rgb(palette.color(PaletteSlot::Background));
    entries[BLACK as usize] = to_rgb(palette.color(PaletteSlot::Outline));
    entries[WHITE as usize] = to_rgb(palette.color(PaletteSlot::Snow));
}
