//! Procedurally generated flooded caves: generation, water, spawn search,
//! static collision, fixed‑step physics and the per‑frame sync loop.

pub mod camera;
pub mod cave_gen;
pub mod collision;
pub mod components;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod level;
pub mod physics;
pub mod player;
pub mod render;
pub mod spawn;
pub mod tile_grid;
pub mod water;
pub mod world_sync;

pub use config::{LevelConfig, RunContext, WaterCategory};
pub use error::{ConfigError, LevelError};
pub use level::{build_level, CaveMap};
pub use tile_grid::{Tile, TileGrid};
pub use world_sync::{LevelEvent, LevelState, WorldSyncLoop};
