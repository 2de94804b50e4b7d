//! tile grid, coordinate helpers & region labelling
use bevy::prelude::*;
use std::collections::VecDeque;
use std::fmt;

/// helper conversions (row‑0 = top, world is y‑up, 1 unit = 1 tile)
pub fn tile_to_world_y(grid_h: usize, row: usize) -> f32 {
    grid_h as f32 - 1.0 - row as f32
}
pub fn world_to_tile_y(grid_h: usize, world_y: f32) -> i32 {
    (grid_h as f32 - 1.0 - world_y.floor()) as i32
}
pub fn world_to_tile_x(world_x: f32) -> i32 {
    world_x.floor() as i32
}

/// centre of tile `(x, row)` in world units
pub fn tile_center(grid_h: usize, x: usize, row: usize) -> Vec2 {
    Vec2::new(x as f32 + 0.5, tile_to_world_y(grid_h, row) + 0.5)
}

/// -------- tiles --------
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tile {
    #[default]
    Empty,
    Solid,
    Water,
}

impl Tile {
    #[inline]
    pub fn is_solid(self) -> bool {
        self == Tile::Solid
    }

    /// walkable or swimmable
    #[inline]
    pub fn is_open(self) -> bool {
        self != Tile::Solid
    }
}

/// Fixed `width × height` map of tiles.
///
/// Lookups outside the grid return [`Tile::Solid`], so neighbourhood
/// scans and collision probes near the edge never leak out of the map.
#[derive(Clone, PartialEq, Eq)]
pub struct TileGrid {
    tiles: Vec<Tile>,
    width: usize,
    height: usize,
}

impl TileGrid {
    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        Self {
            tiles: vec![tile; width * height],
            width,
            height,
        }
    }

    /// build from rows of `#` (solid), `~` (water) and anything else (empty)
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Self::filled(width, height, Tile::Solid);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let tile = match c {
                    '#' => Tile::Solid,
                    '~' => Tile::Water,
                    _ => Tile::Empty,
                };
                grid.set(x, y, tile);
            }
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    /// fail‑closed lookup
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Tile {
        if !self.in_bounds(x, y) {
            return Tile::Solid;
        }
        self.tiles[self.idx(x as usize, y as usize)]
    }

    #[inline]
    pub fn solid(&self, x: i32, y: i32) -> bool {
        self.get(x, y).is_solid()
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, tile: Tile) {
        let i = self.idx(x, y);
        self.tiles[i] = tile;
    }

    /// `Empty → Water`, the only transition allowed after generation
    pub(crate) fn flood(&mut self, x: usize, y: usize) -> bool {
        let i = self.idx(x, y);
        if self.tiles[i] == Tile::Empty {
            self.tiles[i] = Tile::Water;
            true
        } else {
            false
        }
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|t| **t == tile).count()
    }

    /// `(x, y, tile)` in row‑major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| (i % self.width, i / self.width, *t))
    }
}

impl fmt::Display for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let c = match self.tiles[self.idx(x, y)] {
                    Tile::Empty => '.',
                    Tile::Solid => '#',
                    Tile::Water => '~',
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TileGrid {}x{}", self.width, self.height)?;
        fmt::Display::fmt(self, f)
    }
}

/* ===========================================================
   connected regions (4‑neighbourhood)
   =========================================================== */
pub struct Regions {
    labels: Vec<Option<u32>>,
    sizes: Vec<usize>,
    width: usize,
}

impl Regions {
    /// label every tile accepted by `passable` with its region id
    pub fn label(grid: &TileGrid, passable: impl Fn(Tile) -> bool) -> Self {
        let (w, h) = (grid.width(), grid.height());
        let mut labels = vec![None; w * h];
        let mut sizes = Vec::new();
        let mut queue = VecDeque::new();

        for start in 0..w * h {
            if labels[start].is_some() || !passable(grid.tiles[start]) {
                continue;
            }
            let id = sizes.len() as u32;
            let mut size = 0;
            labels[start] = Some(id);
            queue.push_back(start);

            while let Some(i) = queue.pop_front() {
                size += 1;
                let (x, y) = ((i % w) as i32, (i / w) as i32);
                for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                    let (nx, ny) = (x + dx, y + dy);
                    if !grid.in_bounds(nx, ny) {
                        continue;
                    }
                    let n = grid.idx(nx as usize, ny as usize);
                    if labels[n].is_none() && passable(grid.tiles[n]) {
                        labels[n] = Some(id);
                        queue.push_back(n);
                    }
                }
            }
            sizes.push(size);
        }

        Self {
            labels,
            sizes,
            width: w,
        }
    }

    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    pub fn total(&self) -> usize {
        self.sizes.iter().sum()
    }

    /// `(id, size)` of the biggest region; lowest id wins ties
    pub fn largest(&self) -> Option<(u32, usize)> {
        self.sizes
            .iter()
            .enumerate()
            .fold(None, |best, (id, &size)| match best {
                Some((_, s)) if s >= size => best,
                _ => Some((id as u32, size)),
            })
    }

    pub fn label_at(&self, x: usize, y: usize) -> Option<u32> {
        self.labels[y * self.width + x]
    }

    /// largest region / all labelled tiles, 0 when nothing is labelled
    pub fn connectivity(&self) -> f64 {
        match (self.largest(), self.total()) {
            (Some((_, size)), total) if total > 0 => size as f64 / total as f64,
            _ => 0.0,
        }
    }
}
