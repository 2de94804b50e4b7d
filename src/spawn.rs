//! player spawn selection
use bevy::prelude::*;

use crate::error::LevelError;
use crate::tile_grid::{tile_to_world_y, Regions, Tile, TileGrid};

/// columns ordered by distance from tile centre to map centre, left first on ties
fn columns_from_centre(width: usize) -> Vec<usize> {
    let mut columns: Vec<usize> = (0..width).collect();
    // doubled distance keeps the key integral
    columns.sort_by_key(|&x| ((2 * x + 1).abs_diff(width), x));
    columns
}

/// First standable, dry and reachable foot tile.
///
/// Rows are scanned top to bottom. A foot tile `(x, y)` needs
/// `player_height` dry `Empty` tiles ending at `y`, `Solid` at `(x, y + 1)`,
/// and must lie in the largest open region.
pub fn select_spawn(grid: &TileGrid, player_height: usize) -> Result<UVec2, LevelError> {
    if player_height == 0 {
        return Err(LevelError::parameter("player_height", "must be at least one tile"));
    }
    let regions = Regions::label(grid, Tile::is_open);
    let Some((main, _)) = regions.largest() else {
        return Err(LevelError::SpawnNotFound);
    };

    let columns = columns_from_centre(grid.width());
    for y in player_height..grid.height().saturating_sub(1) {
        for &x in &columns {
            let (tx, ty) = (x as i32, y as i32);
            if !grid.solid(tx, ty + 1) {
                continue;
            }
            let headroom = (0..player_height as i32).all(|h| grid.get(tx, ty - h) == Tile::Empty);
            if headroom && regions.label_at(x, y) == Some(main) {
                return Ok(UVec2::new(x as u32, y as u32));
            }
        }
    }
    Err(LevelError::SpawnNotFound)
}

/// world position of a player standing on top of the tile under `spawn`
pub fn spawn_world_position(grid_h: usize, spawn: UVec2, player_height: f32) -> Vec2 {
    let floor = tile_to_world_y(grid_h, spawn.y as usize);
    Vec2::new(spawn.x as f32 + 0.5, floor + player_height * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_outward_order() {
        assert_eq!(columns_from_centre(5), vec![2, 1, 3, 0, 4]);
        // 1 and 2 sit equally far from x = 2.0
        assert_eq!(columns_from_centre(4), vec![1, 2, 0, 3]);
        assert_eq!(columns_from_centre(1), vec![0]);
    }

    #[test]
    fn prefers_highest_ledge_then_centre() {
        let grid = TileGrid::from_ascii(&[
            "#########",
            "#.......#",
            "#.......#",
            "#.#...#.#",
            "#.......#",
            "#########",
        ]);
        // ledges at row 2 above (2,3) and (6,3); (2,·) is closer to x=4 on the left
        assert_eq!(select_spawn(&grid, 2), Ok(UVec2::new(2, 2)));
    }

    #[test]
    fn needs_headroom() {
        let grid = TileGrid::from_ascii(&[
            "#####", //
            "##.##", //
            "#...#", //
            "#####",
        ]);
        // (1,2) and (3,2) have solid overhead; (2,2) has one open tile above
        assert_eq!(select_spawn(&grid, 2), Ok(UVec2::new(2, 2)));
        assert_eq!(select_spawn(&grid, 3), Err(LevelError::SpawnNotFound));
    }

    #[test]
    fn water_is_not_standable() {
        let grid = TileGrid::from_ascii(&[
            "#####", //
            "#...#", //
            "#~~~#", //
            "#####",
        ]);
        assert_eq!(select_spawn(&grid, 1), Err(LevelError::SpawnNotFound));
    }

    #[test]
    fn isolated_pockets_are_skipped() {
        let grid = TileGrid::from_ascii(&[
            "###########",
            "#...#.....#",
            "#...#.....#",
            "#####.....#",
            "#.........#",
            "###########",
        ]);
        // the pocket at the top left is closer to the top, but cut off
        let spawn = select_spawn(&grid, 2).unwrap();
        assert_eq!(spawn, UVec2::new(5, 4));
    }

    #[test]
    fn spawn_world_position_sits_on_floor() {
        let p = spawn_world_position(10, UVec2::new(3, 4), 1.6);
        assert_eq!(p, Vec2::new(3.5, 5.0 + 0.8));
    }
}
