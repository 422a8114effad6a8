//! Renders one planet in every projection and tiles the maps into a
//! labelled contact sheet for side-by-side comparison.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use image::{ImageBuffer, Rgb, RgbImage};
use tetra_planet::export::color_image;
use tetra_planet::{GeneratorConfig, GeneratorSession, Projection};

const CELL_WIDTH: usize = 240;
const CELL_HEIGHT: usize = 160;
const LABEL_HEIGHT: u32 = 20;

#[derive(Parser, Debug)]
#[command(name = "projection_sheet")]
#[command(about = "Render a planet in every projection on one sheet")]
struct Args {
    /// Root seed in 0..=1
    #[arg(short, long, default_value = "0.123")]
    seed: f64,

    /// Meridian and parallel spacing in degrees, 0 for none
    #[arg(short, long, default_value = "30")]
    grid: f64,

    /// Output image
    #[arg(short, long, default_value = "projection_sheet.png")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    println!("Rendering projection sheet for seed {}...", args.seed);

    let mut images: Vec<(String, RgbImage)> = Vec::new();
    for &projection in Projection::all() {
        println!("  Projection: {}", projection.name());
        let config = GeneratorConfig {
            seed: args.seed,
            width: CELL_WIDTH,
            height: CELL_HEIGHT,
            projection,
            grid_vertical: args.grid,
            grid_horizontal: args.grid,
            ..Default::default()
        };
        let session = GeneratorSession::new(config)?;
        let map = session.render_parallel();
        images.push((projection.name().to_string(), color_image(&map, session.colors())));
    }

    let cols = 3;
    let rows = images.len().div_ceil(cols);
    let sheet = create_grid(&images, cols, rows);
    sheet.save(&args.output)?;
    println!("Saved {}", args.output.display());
    Ok(())
}

fn create_grid(images: &[(String, RgbImage)], cols: usize, rows: usize) -> RgbImage {
    let Some((_, first)) = images.first() else {
        return ImageBuffer::new(1, 1);
    };
    let (cell_width, cell_height) = first.dimensions();
    let total_cell_height = cell_height + LABEL_HEIGHT;

    let mut grid: RgbImage = ImageBuffer::from_pixel(
        cell_width * cols as u32,
        total_cell_height * rows as u32,
        Rgb([40, 40, 40]),
    );

    for (idx, (name, img)) in images.iter().enumerate().take(cols * rows) {
        let x_offset = (idx % cols) as u32 * cell_width;
        let label_y = (idx / cols) as u32 * total_cell_height;

        for y in 0..LABEL_HEIGHT {
            for x in 0..cell_width {
                grid.put_pixel(x_offset + x, label_y + y, Rgb([30, 30, 30]));
            }
        }
        for (x, y, pixel) in img.enumerate_pixels() {
            grid.put_pixel(x_offset + x, label_y + LABEL_HEIGHT + y, *pixel);
        }
        draw_text(&mut grid, x_offset + 5, label_y + 6, name);
    }

    grid
}

/// 5x7 glyphs for the letters that appear in projection names.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01110, 0b10001, 0b10000, 0b01110, 0b00001, 0b10001, 0b01110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        _ => [0; 7],
    }
}

fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str) {
    let white = Rgb([255, 255, 255]);
    for (i, c) in text.chars().enumerate() {
        let cx = x + i as u32 * 6;
        if cx + 5 >= img.width() {
            break;
        }
        for (row, &bits) in glyph(c).iter().enumerate() {
            for col in 0..5 {
                let (px, py) = (cx + col, y + row as u32);
                if (bits >> (4 - col)) & 1 == 1 && py < img.height() {
                    img.put_pixel(px, py, white);
                }
            }
        }
    }
}
