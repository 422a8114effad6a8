//! Map encoders
//!
//! Raster formats (BMP, PNG, PPM) go through the `image` crate, which picks
//! the format from the file extension. XPM and the heightfield dump are plain
//! text and written directly.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use thiserror::Error;

use crate::color_table::{ColorTable, BACK, BLACK, GRID};
use crate::render::HEIGHT_SCALE;
use crate::tilemap::Tilemap;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("nothing to export: map is {0}x{1}")]
    EmptyMap(usize, usize),
}

/// Symbols used for XPM pixels; each symbol encodes five bits.
const XPM_LETTERS: &[u8; 64] = b"@$.,:;-+=#*&ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

fn check_size<T>(map: &Tilemap<T>) -> Result<(), ExportError> {
    if map.width == 0 || map.height == 0 {
        return Err(ExportError::EmptyMap(map.width, map.height));
    }
    Ok(())
}

/// True for pixels drawn black in monochrome output.
fn is_ink(index: u8) -> bool {
    index == BLACK || index == GRID || index == BACK
}

/// Colour map through the lookup table.
pub fn color_image(map: &Tilemap<u8>, table: &ColorTable) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(map.width as u32, map.height as u32);
    for (x, y, &c) in map.iter() {
        img.put_pixel(x as u32, y as u32, Rgb(table.rgb(c)));
    }
    img
}

/// Write the colour map; the format follows the extension of `path`.
pub fn export_color_map(map: &Tilemap<u8>, table: &ColorTable, path: &Path) -> Result<(), ExportError> {
    check_size(map)?;
    color_image(map, table).save(path)?;
    log::info!("Wrote colour map to {}", path.display());
    Ok(())
}

/// Write a two-tone map: outline, grid and background black, the rest white.
pub fn export_bw_map(map: &Tilemap<u8>, path: &Path) -> Result<(), ExportError> {
    check_size(map)?;
    let mut img: GrayImage = ImageBuffer::new(map.width as u32, map.height as u32);
    for (x, y, &c) in map.iter() {
        let v = if is_ink(c) { 0 } else { 255 };
        img.put_pixel(x as u32, y as u32, Luma([v]));
    }
    img.save(path)?;
    log::info!("Wrote black and white map to {}", path.display());
    Ok(())
}

/// Symbols per pixel needed for `nocols` colours.
pub fn xpm_symbols_per_pixel(nocols: usize) -> usize {
    let mut x = nocols.saturating_sub(1);
    let mut n = 0;
    while x != 0 {
        x >>= 5;
        n += 1;
    }
    n.max(1)
}

fn xpm_code(index: usize, symbols: usize) -> String {
    (0..symbols)
        .rev()
        .map(|k| XPM_LETTERS[(index >> (5 * k)) & 0x1f] as char)
        .collect()
}

pub fn write_xpm<W: Write>(map: &Tilemap<u8>, table: &ColorTable, out: &mut W) -> io::Result<()> {
    let symbols = xpm_symbols_per_pixel(table.len());
    writeln!(out, "/* XPM */")?;
    writeln!(out, "static char *xpmdata[] = {{")?;
    writeln!(out, "/* width height ncolors chars_per_pixel */")?;
    writeln!(out, "\"{} {} {} {}\",", map.width, map.height, table.len(), symbols)?;
    writeln!(out, "/* colors */")?;
    for (i, rgb) in table.entries().iter().enumerate() {
        writeln!(out, "\"{} c #{:02X}{:02X}{:02X}\",", xpm_code(i, symbols), rgb[0], rgb[1], rgb[2])?;
    }
    writeln!(out, "/* pixels */")?;
    for y in 0..map.height {
        let row: String = map.row(y).iter().map(|&c| xpm_code(c as usize, symbols)).collect();
        writeln!(out, "\"{}\",", row)?;
    }
    writeln!(out, "}};")?;
    Ok(())
}

/// Two-colour XPM with the same ink rule as [`export_bw_map`].
pub fn write_xpm_bw<W: Write>(map: &Tilemap<u8>, out: &mut W) -> io::Result<()> {
    writeln!(out, "/* XPM */")?;
    writeln!(out, "static char *xpmdata[] = {{")?;
    writeln!(out, "/* width height ncolors chars_per_pixel */")?;
    writeln!(out, "\"{} {} 2 1\",", map.width, map.height)?;
    writeln!(out, "/* colors */")?;
    writeln!(out, "\". c #FFFFFF\",")?;
    writeln!(out, "\"X c #000000\",")?;
    writeln!(out, "/* pixels */")?;
    for y in 0..map.height {
        let row: String = map.row(y).iter().map(|&c| if is_ink(c) { 'X' } else { '.' }).collect();
        writeln!(out, "\"{}\",", row)?;
    }
    writeln!(out, "}};")?;
    Ok(())
}

pub fn export_xpm(map: &Tilemap<u8>, table: &ColorTable, path: &Path, bw: bool) -> Result<(), ExportError> {
    check_size(map)?;
    let mut out = BufWriter::new(File::create(path)?);
    if bw {
        write_xpm_bw(map, &mut out)?;
    } else {
        write_xpm(map, table, &mut out)?;
    }
    out.flush()?;
    log::info!("Wrote XPM map to {}", path.display());
    Ok(())
}

/// Altitudes scaled by [`HEIGHT_SCALE`] and truncated, one row per line.
pub fn write_heightfield<W: Write>(heights: &Tilemap<f64>, out: &mut W) -> io::Result<()> {
    for y in 0..heights.height {
        let line: Vec<String> = heights
            .row(y)
            .iter()
            .map(|&h| ((h * HEIGHT_SCALE) as i64).to_string())
            .collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    Ok(())
}

pub fn export_heightfield(heights: &Tilemap<f64>, path: &Path) -> Result<(), ExportError> {
    check_size(heights)?;
    let mut out = BufWriter::new(File::create(path)?);
    write_heightfield(heights, &mut out)?;
    out.flush()?;
    log::info!("Wrote heightfield to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_table::{BLUE0, WHITE};
    use crate::palette::STANDARD_PALETTE;
    use std::fs;

    fn sample_map() -> Tilemap<u8> {
        Tilemap::from_rows(3, vec![vec![BLUE0, 200, BLACK], vec![GRID, BACK, WHITE]])
    }

    #[test]
    fn test_xpm_symbols() {
        assert_eq!(xpm_symbols_per_pixel(8), 1);
        assert_eq!(xpm_symbols_per_pixel(32), 1);
        assert_eq!(xpm_symbols_per_pixel(33), 2);
        assert_eq!(xpm_symbols_per_pixel(256), 2);
        assert_eq!(xpm_code(0, 2), "@@");
        assert_eq!(xpm_code(33, 2), "$$");
        assert_eq!(xpm_code(31, 1), "T");
    }

    #[test]
    fn test_write_xpm() {
        let table = ColorTable::standard(&STANDARD_PALETTE, 256);
        let mut out = Vec::new();
        write_xpm(&sample_map(), &table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[3], "\"3 2 256 2\",");
        // colour 4 is the deep water entry
        assert_eq!(lines[5 + 4], "\"@: c #0000FF\",");
        assert_eq!(lines[5 + 256 + 1], format!("\"@:{}@@\",", xpm_code(200, 2)));
        assert_eq!(lines.last(), Some(&"};"));
    }

    #[test]
    fn test_write_xpm_bw() {
        let mut out = Vec::new();
        write_xpm_bw(&sample_map(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"..X\",\n\"XX.\",\n"));
    }

    #[test]
    fn test_write_heightfield() {
        let heights = Tilemap::from_rows(2, vec![vec![0.015625, -0.00000015], vec![0.0, 1.0]]);
        let mut out = Vec::new();
        write_heightfield(&heights, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "156250 -1\n0 10000000\n");
    }

    #[test]
    fn test_export_files() {
        let table = ColorTable::standard(&STANDARD_PALETTE, 256);
        let map = sample_map();
        let dir = std::env::temp_dir().join("tetra_planet_export_test");
        fs::create_dir_all(&dir).unwrap();

        for name in ["map.png", "map.bmp", "map.ppm"] {
            let path = dir.join(name);
            export_color_map(&map, &table, &path).unwrap();
            let img = image::open(&path).unwrap().to_rgb8();
            assert_eq!(img.dimensions(), (3, 2));
            assert_eq!(img.get_pixel(0, 0).0, table.rgb(BLUE0));
        }

        let bw = dir.join("bw.png");
        export_bw_map(&map, &bw).unwrap();
        let img = image::open(&bw).unwrap().to_luma8();
        assert_eq!(img.get_pixel(1, 0).0, [255]);
        assert_eq!(img.get_pixel(2, 0).0, [0]);

        let xpm = dir.join("map.xpm");
        export_xpm(&map, &table, &xpm, false).unwrap();
        assert!(fs::read_to_string(&xpm).unwrap().starts_with("/* XPM */"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_map_rejected() {
        let table = ColorTable::standard(&STANDARD_PALETTE, 16);
        let empty: Tilemap<u8> = Tilemap::new(0, 5);
        let path = std::env::temp_dir().join("tetra_planet_empty.png");
        assert!(matches!(export_color_map(&empty, &table, &path), Err(ExportError::EmptyMap(0, 5))));
    }
}
