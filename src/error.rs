use std::path::PathBuf;

use crate::engine::{GameState, PowerUp};

/// Errors that make a level unusable. No grid is built when one occurs.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("missing required header '{0}'")]
    MissingHeader(&'static str),

    #[error("header '{key}' has invalid value '{value}'")]
    InvalidHeader { key: String, value: String },

    #[error("invalid board dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("tile type count must be at least 1")]
    InvalidTileTypeCount,

    #[error("layout has {found} rows, expected {expected}")]
    RowCount { expected: usize, found: usize },

    #[error("layout row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unrecognized cell code '{token}' at row {row}, column {col}")]
    InvalidCellCode {
        row: usize,
        col: usize,
        token: String,
    },
}

/// Errors that can occur when loading engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

/// Errors returned synchronously by engine inputs.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("a match or shuffle is still resolving; wait for the turn to complete")]
    Busy,

    #[error("the game is not in play (state: {0:?})")]
    NotPlaying(GameState),

    #[error("no {0} charges left")]
    NoChargesLeft(PowerUp),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
