//! terrain collision geometry: greedy rectangle merge of solid tiles
use bevy::log::info;
use bevy::prelude::*;

use crate::physics::{BodyHandle, PhysicsBackend};
use crate::tile_grid::TileGrid;

/// Axis‑aligned block of tiles, `x`/`y` = top‑left tile (row‑0 = top).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl TileRect {
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// world‑space rectangle (y‑up) for a grid `grid_h` rows tall
    pub fn to_world(&self, grid_h: usize) -> Rect {
        let top = (grid_h - self.y) as f32;
        let bottom = (grid_h - self.y - self.height) as f32;
        Rect::new(
            self.x as f32,
            bottom,
            (self.x + self.width) as f32,
            top,
        )
    }
}

/// One static body per merged rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionBody {
    pub handle: BodyHandle,
    pub tiles: TileRect,
}

/// Cover every solid tile with non‑overlapping rectangles.
///
/// Row‑major scan: the maximal horizontal run of unconsumed solids is
/// grown downward while the whole run stays solid.
pub fn merge_solids(grid: &TileGrid) -> Vec<TileRect> {
    let (w, h) = (grid.width(), grid.height());
    let mut consumed = vec![false; w * h];
    let mut rects = Vec::new();

    let free = |consumed: &[bool], x: usize, y: usize| {
        !consumed[y * w + x] && grid.solid(x as i32, y as i32)
    };

    for y in 0..h {
        let mut x = 0;
        while x < w {
            if !free(&consumed, x, y) {
                x += 1;
                continue;
            }

            /* horizontal run ------------------------------------------------ */
            let mut x1 = x;
            while x1 + 1 < w && free(&consumed, x1 + 1, y) {
                x1 += 1;
            }

            /* grow downward ------------------------------------------------- */
            let mut y1 = y;
            while y1 + 1 < h && (x..=x1).all(|cx| free(&consumed, cx, y1 + 1)) {
                y1 += 1;
            }

            for cy in y..=y1 {
                for cx in x..=x1 {
                    consumed[cy * w + cx] = true;
                }
            }
            rects.push(TileRect {
                x,
                y,
                width: x1 - x + 1,
                height: y1 - y + 1,
            });
            x = x1 + 1;
        }
    }
    rects
}

/// Insert the merged terrain into `backend`.
pub fn build<B: PhysicsBackend>(grid: &TileGrid, backend: &mut B) -> Vec<CollisionBody> {
    let bodies: Vec<CollisionBody> = merge_solids(grid)
        .into_iter()
        .map(|tiles| CollisionBody {
            handle: backend.create_static_body(tiles.to_world(grid.height())),
            tiles,
        })
        .collect();
    info!(
        "terrain collision: {} bodies for {} solid tiles",
        bodies.len(),
        grid.count(crate::tile_grid::Tile::Solid)
    );
    bodies
}
