use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use tetra_planet::ascii::{self, AsciiMode, MapStats};
use tetra_planet::export;
use tetra_planet::{GeneratorConfig, GeneratorSession, OutlineMode, Projection, TerrainQuery};

#[derive(Parser, Debug)]
#[command(name = "tetra_planet")]
#[command(about = "Generate planet maps by recursive tetrahedron subdivision")]
struct Args {
    /// JSON configuration file; flags given on the command line override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root seed in 0..=1 (uses a random seed if not specified)
    #[arg(short, long)]
    seed: Option<f64>,

    /// Width of the map in pixels
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the map in pixels
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Magnification
    #[arg(short = 'm', long)]
    scale: Option<f64>,

    /// Centre longitude in degrees
    #[arg(short = 'l', long, allow_hyphen_values = true)]
    longitude: Option<f64>,

    /// Centre latitude in degrees
    #[arg(short = 'L', long, allow_hyphen_values = true)]
    latitude: Option<f64>,

    /// Map projection
    #[arg(short = 'p', long, value_enum)]
    projection: Option<Projection>,

    /// Number of colours in the lookup table
    #[arg(short = 'N', long)]
    nocols: Option<usize>,

    /// Use the alternative colour scheme
    #[arg(short = 'a', long)]
    alt_colors: bool,

    /// Colour by latitude (ice caps)
    #[arg(short = 'c', long)]
    latitude_coloring: bool,

    /// Meridian spacing in degrees
    #[arg(short = 'g', long)]
    grid_vertical: Option<f64>,

    /// Parallel spacing in degrees
    #[arg(short = 'G', long)]
    grid_horizontal: Option<f64>,

    /// Initial altitude of the root tetrahedron
    #[arg(short = 'i', long, allow_hyphen_values = true)]
    initial_altitude: Option<f64>,

    /// Weight of edge length in altitude differences
    #[arg(short = 'V', long)]
    distance_weight: Option<f64>,

    /// Weight of altitude difference in altitude differences
    #[arg(short = 'v', long)]
    altitude_weight: Option<f64>,

    /// Exponent applied to edge length
    #[arg(long)]
    distance_power: Option<f64>,

    /// Lighten the palette (repeat for more)
    #[arg(short = 'C', long, action = clap::ArgAction::Count)]
    lighter: u8,

    /// Swap the background and outline colours
    #[arg(short = 'r', long)]
    reverse_background: bool,

    /// Coastline outline mode
    #[arg(long, value_enum)]
    outline: Option<OutlineMode>,

    /// Palette file replacing the built-in colours
    #[arg(short = 'M', long)]
    palette: Option<PathBuf>,

    /// Output map; the format follows the extension (bmp, png, ppm, xpm)
    #[arg(short, long, default_value = "planet.bmp")]
    output: PathBuf,

    /// Also write raw altitudes as a text heightfield
    #[arg(long)]
    heightfield: Option<PathBuf>,

    /// Write a text report with an ASCII preview and statistics
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print an ASCII preview of the map
    #[arg(long, value_enum)]
    ascii: Option<AsciiMode>,

    /// Width of ASCII previews in characters
    #[arg(long, default_value = "78")]
    columns: usize,

    /// Describe the terrain at a world position (x, z)
    #[arg(long, num_args = 2, value_names = ["X", "Z"], allow_hyphen_values = true)]
    probe: Option<Vec<f64>>,

    /// Save the effective configuration as JSON
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Render on a single thread
    #[arg(long)]
    sequential: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Command-line flags layered over the configuration file (or defaults).
fn build_config(args: &Args) -> Result<GeneratorConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_json_file(path)?,
        None => GeneratorConfig::default(),
    };

    // a config file without a seed keeps the default; no file at all means a fresh seed
    config.seed = match (args.seed, &args.config) {
        (Some(seed), _) => seed,
        (None, Some(_)) => config.seed,
        (None, None) => rand::random::<f64>(),
    };
    if let Some(v) = args.width {
        config.width = v;
    }
    if let Some(v) = args.height {
        config.height = v;
    }
    if let Some(v) = args.scale {
        config.scale = v;
    }
    if let Some(v) = args.longitude {
        config.longitude = v;
    }
    if let Some(v) = args.latitude {
        config.latitude = v;
    }
    if let Some(v) = args.projection {
        config.projection = v;
    }
    if let Some(v) = args.nocols {
        config.nocols = v;
    }
    if let Some(v) = args.grid_vertical {
        config.grid_vertical = v;
    }
    if let Some(v) = args.grid_horizontal {
        config.grid_horizontal = v;
    }
    if let Some(v) = args.initial_altitude {
        config.initial_altitude = v;
    }
    if let Some(v) = args.distance_weight {
        config.distance_weight = v;
    }
    if let Some(v) = args.altitude_weight {
        config.altitude_weight = v;
    }
    if let Some(v) = args.distance_power {
        config.distance_power = v;
    }
    if let Some(v) = args.outline {
        config.outline = v;
    }
    if let Some(path) = &args.palette {
        config.palette_file = Some(path.clone());
    }
    config.alt_colors |= args.alt_colors;
    config.latitude_coloring |= args.latitude_coloring;
    config.reverse_background |= args.reverse_background;
    config.lighter += args.lighter as u32;

    Ok(config)
}

fn is_xpm(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xpm"))
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = build_config(&args)?;

    println!("Generating planet with seed: {}", config.seed);
    println!(
        "Map size: {}x{} ({}, scale {}, centre {:.1}, {:.1})",
        config.width, config.height, config.projection, config.scale, config.longitude, config.latitude
    );

    if let Some(path) = &args.save_config {
        fs::write(path, config.to_json()?)?;
        println!("Saved configuration to {}", path.display());
    }

    let mut session = GeneratorSession::new(config)?;
    println!(
        "Subdivision depth: {} ({} colours)",
        session.view().base_depth(),
        session.colors().len()
    );

    println!("Rendering map...");
    let start = Instant::now();
    let map = if args.sequential {
        let map = session.render();
        let stats = session.cache_stats();
        println!(
            "Cache: {} hits, {} misses ({:.1}% hit rate)",
            stats.hits,
            stats.misses,
            100.0 * stats.hit_rate()
        );
        map
    } else {
        session.render_parallel()
    };
    println!("Rendered in {:.2?}", start.elapsed());

    let colors = session.colors();
    let stats = MapStats::collect(&map, colors);
    println!(
        "Land: {:.1}%, water: {:.1}%",
        stats.percent(stats.land),
        stats.percent(stats.water)
    );

    let bw = session.config().outline == OutlineMode::BlackAndWhite;
    let result = if is_xpm(&args.output) {
        export::export_xpm(&map, colors, &args.output, bw)
    } else if bw {
        export::export_bw_map(&map, &args.output)
    } else {
        export::export_color_map(&map, colors, &args.output)
    };
    match result {
        Ok(()) => println!("Saved map to {}", args.output.display()),
        Err(e) => return Err(format!("failed to write {}: {}", args.output.display(), e).into()),
    }

    if let Some(path) = &args.heightfield {
        println!("Computing heightfield...");
        let heights = session.render_heights();
        match export::export_heightfield(&heights, path) {
            Ok(()) => println!("Saved heightfield to {}", path.display()),
            Err(e) => eprintln!("Failed to export heightfield: {}", e),
        }
    }

    if let Some(path) = &args.report {
        match ascii::export_report(&map, colors, session.config(), args.columns, path) {
            Ok(()) => println!("Saved report to {}", path.display()),
            Err(e) => eprintln!("Failed to export report: {}", e),
        }
    }

    if let Some(mode) = args.ascii {
        println!();
        println!("ASCII preview ({}):", mode.name());
        match mode {
            AsciiMode::Terrain => {
                print!("{}", ascii::render_ascii_map(&map, colors, args.columns));
                println!("{}", ascii::terrain_legend());
            }
            AsciiMode::Height => {
                let heights = session.render_heights();
                print!("{}", ascii::render_ascii_heights(&heights, args.columns));
            }
        }
    }

    if let Some(&[x, z]) = args.probe.as_deref() {
        let mut query = TerrainQuery::new(&session);
        let altitude = query.elevation_at(x, z);
        println!(
            "Terrain at ({}, {}): {} (altitude {:.6})",
            x,
            z,
            query.describe(x, z),
            altitude
        );
    }

    Ok(())
}
