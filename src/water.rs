//! water line selection & flooding
use bevy::log::debug;
use rand::Rng;

use crate::config::{WaterBands, WaterCategory};
use crate::error::LevelError;
use crate::tile_grid::{Tile, TileGrid};

/// Flooded copy of a grid plus the row that set the flood line.
#[derive(Clone, Debug, PartialEq)]
pub struct WaterLevel {
    pub row: f32,
    pub grid: TileGrid,
}

impl WaterLevel {
    /// world‑space height of the water surface (y‑up)
    pub fn surface_y(&self) -> f32 {
        self.grid.height() as f32 - self.row
    }
}

/// Sample a water row for `category` and flood the grid beneath it.
pub fn compute_water_level<R: Rng>(
    grid: &TileGrid,
    category: WaterCategory,
    bands: &WaterBands,
    rng: &mut R,
) -> Result<WaterLevel, LevelError> {
    let (lo, hi) = bands.range(category);
    if lo > hi {
        return Err(LevelError::parameter(
            "water_bands",
            format!("{category:?} band [{lo}, {hi}] is inverted"),
        ));
    }
    if hi as usize >= grid.height() {
        return Err(LevelError::parameter(
            "water_bands",
            format!(
                "{category:?} band [{lo}, {hi}] reaches past the last row {}",
                grid.height().saturating_sub(1)
            ),
        ));
    }
    let row = rng.gen_range(lo..=hi);
    let flooded = flood_below(grid, row as usize);
    debug!(
        "{category:?} water at row {row}: {} tiles flooded",
        flooded.count(Tile::Water)
    );
    Ok(WaterLevel {
        row: row as f32,
        grid: flooded,
    })
}

/// Mark every supported `Empty` tile at or below `water_row` as `Water`.
///
/// Columns are scanned bottom‑up so a tile only floods when the tile under
/// it is solid, already water, or the bottom edge of the map.
pub fn flood_below(grid: &TileGrid, water_row: usize) -> TileGrid {
    let mut out = grid.clone();
    let h = grid.height();
    if water_row >= h {
        return out;
    }
    for x in 0..grid.width() {
        for y in (water_row..h).rev() {
            if out.get(x as i32, y as i32) != Tile::Empty {
                continue;
            }
            let below = out.get(x as i32, y as i32 + 1);
            if matches!(below, Tile::Solid | Tile::Water) {
                out.flood(x, y);
            }
        }
    }
    out
}
