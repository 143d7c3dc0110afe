//! Falling tiles
//!
//! Tiles queued here are detached and fall straight down with constant
//! acceleration until they reach their destination cell, where they are
//! snapped into place and attached.

use serde::{Deserialize, Serialize};

use super::grid::{CellId, Grid};
use super::tile::{Component, ComponentKind, MovementComponent, TileId, TileRegistry};
use crate::consts::FALL_ACCEL;
use crate::error::{BlastError, Result};

/// A queued fall
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallEntry {
    pub tile: TileId,
    pub dst: CellId,
    /// Seconds left before the tile starts to move
    pub delay: f32,
}

/// A tile that reached its destination this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    pub tile: TileId,
    pub cell: CellId,
}

#[derive(Debug, Clone)]
pub struct MovementSystem {
    queue: Vec<FallEntry>,
    accel: f32,
    start_delay: f32,
}

impl MovementSystem {
    pub fn new(start_delay: f32) -> Self {
        Self {
            queue: Vec::new(),
            accel: FALL_ACCEL,
            start_delay,
        }
    }

    /// Queue a detached tile to fall into `dst` after the default start delay
    pub fn add_tile(&mut self, tiles: &mut TileRegistry, tile: TileId, dst: CellId) -> Result<()> {
        self.add_tile_with_delay(tiles, tile, dst, self.start_delay)
    }

    pub fn add_tile_with_delay(&mut self, tiles: &mut TileRegistry, tile: TileId, dst: CellId, delay: f32) -> Result<()> {
        if self.is_queued(tile) {
            return Err(BlastError::AlreadyQueued(tile));
        }

        let entity = tiles.get_mut(tile)?;
        if let Some(cell) = entity.cell() {
            return Err(BlastError::TileAlreadyAttached { tile, cell });
        }
        if !entity.has_component(ComponentKind::Movement) {
            entity.add_component(Component::Movement(MovementComponent::default()));
        }

        self.queue.push(FallEntry { tile, dst, delay });
        Ok(())
    }

    pub fn is_queued(&self, tile: TileId) -> bool {
        self.queue.iter().any(|e| e.tile == tile)
    }

    pub fn tiles_to_move_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue(&self) -> &[FallEntry] {
        &self.queue
    }

    /// Advance every queued tile by `dt`. Landed tiles are attached to their
    /// destination and returned.
    pub fn update(&mut self, dt: f32, grid: &mut Grid, tiles: &mut TileRegistry) -> Result<Vec<Settled>> {
        let mut settled = Vec::new();

        for entry in &mut self.queue {
            if entry.delay > 0.0 {
                entry.delay -= dt;
                continue;
            }

            let max_y = grid.cell(entry.dst).position.y;
            let tile = tiles.get_mut(entry.tile)?;
            let speed = {
                let movement = tile.movement_mut()?;
                movement.speed += self.accel * dt;
                movement.speed
            };
            tile.position.y += speed * dt;

            if tile.position.y >= max_y {
                tile.position.y = max_y;
                tile.movement_mut()?.speed = 0.0;
                settled.push(Settled {
                    tile: entry.tile,
                    cell: entry.dst,
                });
            }
        }

        for landed in &settled {
            self.queue.retain(|e| e.tile != landed.tile);
            tiles.attach(grid, landed.tile, landed.cell)?;
        }
        Ok(settled)
    }

    /// Compact one column: every attached tile above a gap is detached and
    /// queued to fall by the number of empty cells below it.
    /// Returns the number of empty cells left at the top of the column.
    pub fn move_hovered_tiles(&mut self, grid: &mut Grid, tiles: &mut TileRegistry, col: usize) -> Result<usize> {
        if col >= grid.cols {
            return Ok(0);
        }

        let column: Vec<(CellId, Option<TileId>)> = grid.column(col).iter().map(|c| (c.id, c.tile)).collect();
        let mut empty = 0;

        // Bottom-up so each tile knows how many gaps lie beneath it
        for row in (0..column.len()).rev() {
            match column[row].1 {
                None => empty += 1,
                Some(tile) if empty > 0 => {
                    tiles.detach(grid, tile)?;
                    self.add_tile(tiles, tile, column[row + empty].0)?;
                }
                Some(_) => {}
            }
        }
        Ok(empty)
    }
}
