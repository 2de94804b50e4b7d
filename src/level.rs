//! level pipeline: cave → water → spawn, with whole‑level reseeding
use bevy::log::{info, warn};
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::cave_gen::CaveGenerator;
use crate::config::LevelConfig;
use crate::error::LevelError;
use crate::spawn::{select_spawn, spawn_world_position};
use crate::tile_grid::TileGrid;
use crate::water::compute_water_level;

/// keeps the water stream independent from the cave stream
const WATER_STREAM: u64 = 0x5741_5445_5221_u64;

/// splitmix64 finalizer; used to restart a level from an unrelated seed
pub fn reseed(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Read‑only result of building a level.
#[derive(Clone, Debug, PartialEq)]
pub struct CaveMap {
    pub grid: TileGrid,
    pub water_row: f32,
    pub spawn: UVec2,
    pub seed: u64,
}

impl CaveMap {
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    /// world‑space y of the water surface
    pub fn water_surface_y(&self) -> f32 {
        self.height() as f32 - self.water_row
    }

    pub fn spawn_position(&self, player_height: f32) -> Vec2 {
        spawn_world_position(self.height(), self.spawn, player_height)
    }
}

/// one pass of the pipeline for a single seed
pub fn build_from_seed(config: &LevelConfig, seed: u64) -> Result<CaveMap, LevelError> {
    let generator = CaveGenerator::new(config.generation.clone())?;
    let grid = generator.generate(config.width, config.height, seed)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ WATER_STREAM);
    let water = compute_water_level(&grid, config.water_category, &config.water_bands, &mut rng)?;
    let spawn = select_spawn(&water.grid, config.player_height)?;

    Ok(CaveMap {
        grid: water.grid,
        water_row: water.row,
        spawn,
        seed,
    })
}

/// Build a complete level from `seed`.
///
/// Seed‑dependent failures restart from [`reseed`] up to
/// `config.level_attempts` times; misconfiguration is returned at once.
pub fn build_level(config: &LevelConfig, seed: u64) -> Result<CaveMap, LevelError> {
    config.validate()?;
    let mut seed = seed;
    let mut last = LevelError::SpawnNotFound;
    for attempt in 1..=config.level_attempts {
        match build_from_seed(config, seed) {
            Ok(map) => {
                info!(
                    "level ready: seed {seed:#x}, water row {}, spawn ({}, {})",
                    map.water_row, map.spawn.x, map.spawn.y
                );
                return Ok(map);
            }
            Err(e) if e.is_seed_dependent() => {
                warn!("level attempt {attempt} with seed {seed:#x} failed: {e}");
                seed = reseed(seed);
                last = e;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last)
}
