//! Planet generation library
//!
//! Re-exports modules for use by binaries and tools.

pub mod ascii;
pub mod color_table;
pub mod config;
pub mod export;
pub mod oracle;
pub mod outline;
pub mod palette;
pub mod projection;
pub mod render;
pub mod seeds;
pub mod terrain;
pub mod tetra;
pub mod tilemap;

pub use config::{ConfigError, GeneratorConfig, OutlineMode};
pub use oracle::ElevationOracle;
pub use projection::Projection;
pub use render::GeneratorSession;
pub use terrain::{SurfaceKind, TerrainQuery};
