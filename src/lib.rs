//! # Link Match Library
//!
//! This library provides the core logic for a link-match tile puzzle: pairs of
//! identical tiles are removed when they can be joined by a path of at most
//! two turns through empty cells or the ring just outside the board.
//!
//! It is used by two binaries:
//! - `human_player`: Plays a level interactively via the command line.
//! - `autoplay`: Plays levels by following hints and reports how many boards
//!   were cleared.
//!
//! ## Modules
//! - `grid`: Positions, tiles (`Normal`, `Bomb`, `Rock`, frozen flag) and the `Grid` itself.
//! - `level`: The level file format, validation warnings and random level generation.
//! - `pathfinder`: The two-turn link search (`find_path`).
//! - `resolver`: Match validation and its effects: removal, thaw, bomb blasts, parity.
//! - `gravity`: Column compaction after removals.
//! - `shuffle`: Move detection and the solvable-shuffle search.
//! - `engine`: The game session (`Engine`): selection, scoring, timer, power-ups, events.
//! - `config`: TOML-loadable engine tuning (`EngineConfig`).
//! - `error`: Error types for levels, configuration and engine input.

pub mod config;
pub mod engine;
pub mod error;
pub mod gravity;
pub mod grid;
pub mod level;
pub mod pathfinder;
pub mod resolver;
pub mod shuffle;
