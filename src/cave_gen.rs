//! cellular‑automaton cave generation with connectivity validation
use bevy::log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::GenerationConfig;
use crate::constants::MIN_DIMENSION;
use crate::error::LevelError;
use crate::tile_grid::{Regions, Tile, TileGrid};

/// odd 64‑bit constant (2^64 / φ) used to step between retry seeds
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// seed for retry `attempt`; attempt 0 is `seed` itself
pub fn derive_seed(seed: u64, attempt: u32) -> u64 {
    seed.wrapping_add(SEED_STRIDE.wrapping_mul(attempt as u64))
}

/// Outcome of checking a candidate grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaveStats {
    pub empty: usize,
    pub largest_region: usize,
    pub open_fraction: f64,
    pub connectivity: f64,
}

pub struct CaveGenerator {
    config: GenerationConfig,
}

impl CaveGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self, LevelError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Deterministic for a fixed `(width, height, seed)`.
    ///
    /// Rejected candidates are regenerated from [`derive_seed`] up to
    /// `max_retries` times before giving up with
    /// [`LevelError::GenerationFailure`].
    pub fn generate(&self, width: usize, height: usize, seed: u64) -> Result<TileGrid, LevelError> {
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(LevelError::InvalidDimensions {
                width,
                height,
                min: MIN_DIMENSION,
            });
        }

        for attempt in 0..self.config.max_retries {
            let attempt_seed = derive_seed(seed, attempt);
            let grid = self.candidate(width, height, attempt_seed);
            let stats = measure(&grid);

            if self.accepts(&stats) {
                info!(
                    "cave {width}x{height} accepted on attempt {} (open {:.2}, connectivity {:.2})",
                    attempt + 1,
                    stats.open_fraction,
                    stats.connectivity
                );
                return Ok(grid);
            }
            debug!(
                "cave seed {attempt_seed:#x} rejected: empty {}, open {:.2}, connectivity {:.2}",
                stats.empty, stats.open_fraction, stats.connectivity
            );
        }

        Err(LevelError::GenerationFailure {
            seed,
            attempts: self.config.max_retries,
        })
    }

    /// noise fill + smoothing, no validation
    pub fn candidate(&self, width: usize, height: usize, seed: u64) -> TileGrid {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut grid = TileGrid::filled(width, height, Tile::Solid);

        /* random fill -------------------------------------------------------- */
        for y in 0..height {
            for x in 0..width {
                let solid = rng.gen_bool(self.config.fill_probability);
                if !solid && !grid.is_border(x, y) {
                    grid.set(x, y, Tile::Empty);
                }
            }
        }

        /* smoothing ---------------------------------------------------------- */
        let mut scratch = grid.clone();
        for _ in 0..self.config.smoothing_passes {
            self.smooth(&grid, &mut scratch);
            std::mem::swap(&mut grid, &mut scratch);
        }
        grid
    }

    /// one automaton pass reading `src`, writing `dst`
    fn smooth(&self, src: &TileGrid, dst: &mut TileGrid) {
        let r = self.config.neighbourhood_radius as i32;
        for y in 0..src.height() {
            for x in 0..src.width() {
                if src.is_border(x, y) {
                    dst.set(x, y, Tile::Solid);
                    continue;
                }
                let (cx, cy) = (x as i32, y as i32);
                let mut solid = 0;
                for dy in -r..=r {
                    for dx in -r..=r {
                        if (dx, dy) != (0, 0) && src.solid(cx + dx, cy + dy) {
                            solid += 1;
                        }
                    }
                }
                let next = if solid >= self.config.birth_threshold {
                    Tile::Solid
                } else if solid <= self.config.death_threshold {
                    Tile::Empty
                } else {
                    src.get(cx, cy)
                };
                dst.set(x, y, next);
            }
        }
    }

    fn accepts(&self, stats: &CaveStats) -> bool {
        stats.empty > 0
            && stats.open_fraction >= self.config.min_open_fraction
            && stats.connectivity >= self.config.min_connectivity
    }
}

/// open‑area and connectivity figures for `grid`
pub fn measure(grid: &TileGrid) -> CaveStats {
    let regions = Regions::label(grid, Tile::is_open);
    let interior = grid.width().saturating_sub(2) * grid.height().saturating_sub(2);
    let empty = regions.total();
    CaveStats {
        empty,
        largest_region: regions.largest().map_or(0, |(_, size)| size),
        open_fraction: if interior == 0 {
            0.0
        } else {
            empty as f64 / interior as f64
        },
        connectivity: regions.connectivity(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> CaveGenerator {
        CaveGenerator::new(GenerationConfig::default()).unwrap()
    }

    #[test]
    fn same_seed_same_cave() {
        let g = generator();
        let a = g.generate(150, 150, 42).unwrap();
        let b = g.generate(150, 150, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let g = generator();
        assert_ne!(g.candidate(60, 60, 1), g.candidate(60, 60, 2));
    }

    #[test]
    fn border_is_closed() {
        let g = generator();
        for seed in [1, 42, 1234, 0xdead_beef] {
            let grid = g.generate(80, 60, seed).unwrap();
            for (x, y, tile) in grid.iter() {
                if grid.is_border(x, y) {
                    assert_eq!(tile, Tile::Solid, "border tile ({x},{y}) open for seed {seed}");
                }
            }
        }
    }

    #[test]
    fn accepted_caves_meet_connectivity() {
        let g = generator();
        for seed in 0..8 {
            let grid = g.generate(100, 100, seed).unwrap();
            let stats = measure(&grid);
            assert!(stats.empty > 0);
            assert!(stats.connectivity >= g.config().min_connectivity);
            assert!(stats.open_fraction >= g.config().min_open_fraction);
        }
    }

    #[test]
    fn small_dimensions_fail_fast() {
        let err = generator().generate(9, 50, 1).unwrap_err();
        assert_eq!(
            err,
            LevelError::InvalidDimensions {
                width: 9,
                height: 50,
                min: MIN_DIMENSION
            }
        );
    }

    #[test]
    fn fill_probability_out_of_range_is_rejected() {
        let config = GenerationConfig {
            fill_probability: -0.1,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            CaveGenerator::new(config),
            Err(LevelError::InvalidParameter { name: "fill_probability", .. })
        ));
    }

    #[test]
    fn unreachable_requirements_exhaust_retries() {
        // a fully solid fill can never open up
        let config = GenerationConfig {
            fill_probability: 1.0,
            max_retries: 3,
            ..GenerationConfig::default()
        };
        let err = CaveGenerator::new(config).unwrap().generate(30, 30, 5).unwrap_err();
        assert_eq!(err, LevelError::GenerationFailure { seed: 5, attempts: 3 });
    }

    #[test]
    fn sparse_caves_exhaust_retries() {
        let config = GenerationConfig {
            min_open_fraction: 1.0,
            max_retries: 3,
            ..GenerationConfig::default()
        };
        let g = CaveGenerator::new(config).unwrap();
        // candidates do open up, they just never open up enough
        for attempt in 0..3 {
            let stats = measure(&g.candidate(30, 30, derive_seed(5, attempt)));
            assert!(stats.empty > 0);
            assert!(stats.open_fraction < 1.0);
        }
        let err = g.generate(30, 30, 5).unwrap_err();
        assert_eq!(err, LevelError::GenerationFailure { seed: 5, attempts: 3 });
    }

    #[test]
    fn fragmented_caves_fail_strict_connectivity() {
        let grid = TileGrid::from_ascii(&[
            "#######", //
            "#...#.#", //
            "#######",
        ]);
        let stats = measure(&grid);
        assert_eq!(stats.empty, 4);
        assert_eq!(stats.largest_region, 3);
        assert_eq!(stats.connectivity, 0.75);

        assert!(generator().accepts(&stats));
        let strict = CaveGenerator::new(GenerationConfig {
            min_connectivity: 1.0,
            ..GenerationConfig::default()
        })
        .unwrap();
        assert!(!strict.accepts(&stats));
    }

    #[test]
    fn retry_seeds_are_distinct() {
        let seeds: Vec<u64> = (0..4).map(|a| derive_seed(99, a)).collect();
        assert_eq!(seeds[0], 99);
        for i in 0..seeds.len() {
            for j in i + 1..seeds.len() {
                assert_ne!(seeds[i], seeds[j]);
            }
        }
    }

    #[test]
    fn smoothing_rule_thresholds() {
        let config = GenerationConfig::default();
        let g = CaveGenerator::new(config).unwrap();
        let src = TileGrid::from_ascii(&[
            "#####", //
            "#...#", //
            "#.#.#", //
            "#...#", //
            "#####",
        ]);
        let mut dst = src.clone();
        g.smooth(&src, &mut dst);
        // (1,1) sees 6 solid neighbours → solid
        assert_eq!(dst.get(1, 1), Tile::Solid);
        // (2,1) sees 4 → unchanged
        assert_eq!(dst.get(2, 1), Tile::Empty);
        // (2,2) sees no solid neighbours → empty
        assert_eq!(dst.get(2, 2), Tile::Empty);
    }
}
