//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by tile ID)
//! - No rendering or platform dependencies

pub mod booster;
pub mod destroy;
pub mod generator;
pub mod geometry;
pub mod grid;
pub mod movement;
pub mod scene;
pub mod tile;

pub use booster::{BoosterKind, Boosters};
pub use destroy::{BatchDisposed, DestroyStrategy, DestroySystem};
pub use generator::TileGenerator;
pub use geometry::{Aabb, Circle};
pub use grid::{Cell, CellId, Grid, GridOptions, Neighborhood};
pub use movement::{FallEntry, MovementSystem, Settled};
pub use scene::{GameResult, MainScene, MainState, TurnPhase};
pub use tile::{
    Component, ComponentKind, DestroyAnimation, MovementComponent, ScoringComponent, Tile, TileDescriptor, TileId,
    TileRegistry, TileSpec, ViewComponent,
};
