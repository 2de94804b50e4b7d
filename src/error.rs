//! error types for level construction and configuration
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a level from being built.
///
/// None of these are recoverable inside the pipeline that raised them: a
/// level is either complete or never started.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LevelError {
    #[error("map dimensions {width}x{height} are below the minimum of {min}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        min: usize,
    },
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("cave generation from seed {seed:#x} failed after {attempts} attempts")]
    GenerationFailure { seed: u64, attempts: u32 },
    #[error("no standable, dry and reachable spawn cell exists")]
    SpawnNotFound,
}

impl LevelError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for failures a fresh seed may fix.
    pub fn is_seed_dependent(&self) -> bool {
        matches!(self, Self::GenerationFailure { .. } | Self::SpawnNotFound)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Invalid(#[from] LevelError),
}
