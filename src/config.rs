//! level configuration, loaded once at startup
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::*;
use crate::error::{ConfigError, LevelError};

/// Cellular‑automaton and validation knobs for [`crate::cave_gen::CaveGenerator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub fill_probability: f64,
    pub smoothing_passes: usize,
    pub birth_threshold: usize,
    pub death_threshold: usize,
    pub neighbourhood_radius: usize,
    pub min_connectivity: f64,
    pub min_open_fraction: f64,
    pub max_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            fill_probability: FILL_PROBABILITY,
            smoothing_passes: SMOOTHING_PASSES,
            birth_threshold: BIRTH_THRESHOLD,
            death_threshold: DEATH_THRESHOLD,
            neighbourhood_radius: NEIGHBOURHOOD_RADIUS,
            min_connectivity: MIN_CONNECTIVITY,
            min_open_fraction: MIN_OPEN_FRACTION,
            max_retries: GENERATION_RETRIES,
        }
    }
}

impl GenerationConfig {
    /// tiles in the neighbourhood, excluding the centre
    pub fn neighbourhood_size(&self) -> usize {
        let side = 2 * self.neighbourhood_radius + 1;
        side * side - 1
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if !(0.0..=1.0).contains(&self.fill_probability) {
            return Err(LevelError::parameter(
                "fill_probability",
                format!("{} is outside [0, 1]", self.fill_probability),
            ));
        }
        if self.neighbourhood_radius == 0 {
            return Err(LevelError::parameter("neighbourhood_radius", "must be at least 1"));
        }
        if self.death_threshold >= self.birth_threshold {
            return Err(LevelError::parameter(
                "death_threshold",
                format!(
                    "{} must be below birth_threshold {}",
                    self.death_threshold, self.birth_threshold
                ),
            ));
        }
        if self.birth_threshold > self.neighbourhood_size() {
            return Err(LevelError::parameter(
                "birth_threshold",
                format!(
                    "{} exceeds the {} tiles in the neighbourhood",
                    self.birth_threshold,
                    self.neighbourhood_size()
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_connectivity) {
            return Err(LevelError::parameter("min_connectivity", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.min_open_fraction) {
            return Err(LevelError::parameter("min_open_fraction", "must be within [0, 1]"));
        }
        if self.max_retries == 0 {
            return Err(LevelError::parameter("max_retries", "must allow at least one attempt"));
        }
        Ok(())
    }
}

/// Target fill for the flood pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterCategory {
    Low,
    #[default]
    Medium,
    High,
}

/// Inclusive row ranges per [`WaterCategory`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterBands {
    pub low: (u32, u32),
    pub medium: (u32, u32),
    pub high: (u32, u32),
}

impl Default for WaterBands {
    fn default() -> Self {
        Self {
            low: WATER_LOW,
            medium: WATER_MEDIUM,
            high: WATER_HIGH,
        }
    }
}

impl WaterBands {
    pub fn range(&self, category: WaterCategory) -> (u32, u32) {
        match category {
            WaterCategory::Low => self.low,
            WaterCategory::Medium => self.medium,
            WaterCategory::High => self.high,
        }
    }
}

/// Everything fixed at level construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    pub generation: GenerationConfig,
    pub water_category: WaterCategory,
    pub water_bands: WaterBands,
    pub player_height: usize,
    pub level_attempts: u32,
    pub fixed_timestep: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
            seed: 42,
            generation: GenerationConfig::default(),
            water_category: WaterCategory::default(),
            water_bands: WaterBands::default(),
            player_height: PLAYER_HEIGHT_TILES,
            level_attempts: LEVEL_ATTEMPTS,
            fixed_timestep: FIXED_TIMESTEP,
        }
    }
}

impl LevelConfig {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// read `path`; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if self.width < MIN_DIMENSION || self.height < MIN_DIMENSION {
            return Err(LevelError::InvalidDimensions {
                width: self.width,
                height: self.height,
                min: MIN_DIMENSION,
            });
        }
        self.generation.validate()?;
        let (lo, hi) = self.water_bands.range(self.water_category);
        if lo > hi {
            return Err(LevelError::parameter(
                "water_bands",
                format!("band [{lo}, {hi}] is inverted"),
            ));
        }
        if hi as usize >= self.height {
            return Err(LevelError::parameter(
                "water_bands",
                format!("band [{lo}, {hi}] lies outside a map {} rows tall", self.height),
            ));
        }
        if self.player_height == 0 {
            return Err(LevelError::parameter("player_height", "must be at least one tile"));
        }
        if self.level_attempts == 0 {
            return Err(LevelError::parameter("level_attempts", "must allow at least one attempt"));
        }
        if self.fixed_timestep.is_nan() || self.fixed_timestep <= 0.0 {
            return Err(LevelError::parameter("fixed_timestep", "must be positive"));
        }
        Ok(())
    }
}

/// Per‑level toggles handed to `update`/`draw` instead of process globals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunContext {
    pub debug: bool,
    pub hide_ui: bool,
}
