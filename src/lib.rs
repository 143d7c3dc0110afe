//! Tile Blast - a tile-matching blast puzzle
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, destroy strategies, falling tiles, turns)
//! - `game`: Scene flow (play -> result)
//! - `store`: Observable state for UI bindings
//! - `resources`: Resource lookup by kind and name
//! - `view`: Renderer boundary (opaque view handles)
//! - `config`: Data-driven game setup

pub mod config;
pub mod error;
pub mod game;
pub mod resources;
pub mod sim;
pub mod store;
pub mod view;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use config::{GameConfig, TileTypeConfig};
pub use error::{BlastError, ErrorCategory, Result};
pub use game::{ActiveScene, BlastGame};
pub use store::Store;

/// Simulation tuning constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Substep cap per frame; leftover time is dropped
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Falling tile acceleration (pixels/s²)
    pub const FALL_ACCEL: f32 = 3000.0;
    /// Delay before a queued tile starts to fall (seconds)
    pub const FALL_START_DELAY: f32 = 0.2;

    /// Destroy animation length once started (seconds)
    pub const DESTROY_DURATION: f32 = 0.08;
    /// Upper bound of the random start delay of a destroy animation (seconds)
    pub const DESTROY_MAX_DELAY: f32 = 0.12;
    /// Sideways drift of a destroyed tile per animation frame (pixels)
    pub const DESTROY_DRIFT: f32 = 2.0;
}
