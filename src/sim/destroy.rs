//! Destroy strategies and the destroy system
//!
//! A strategy only selects cells; it never touches grid or tile state. The
//! destroy system owns the active strategy (plus one saved strategy while a
//! booster override is installed), detaches the selected tiles and plays
//! their destroy animation until they are disposed.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Circle;
use super::grid::{CellId, Grid, Neighborhood};
use super::tile::{Component, ComponentKind, DestroyAnimation, TileId, TileRegistry};
use crate::error::Result;
use crate::view::ViewBinding;

/// Cell selection policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DestroyStrategy {
    /// Just the clicked cell
    OneCell,
    /// Same-family orthogonally connected tiles, if there are enough of them
    Batch { min_batch_size: usize },
    /// Occupied cells reachable through any neighbour whose box touches a circle
    Circle { radius: f32 },
}

impl DestroyStrategy {
    /// Cells to clear for a click on `seed`, or `None` when nothing qualifies
    pub fn request_to_destroy(&self, grid: &Grid, tiles: &TileRegistry, seed: CellId) -> Option<Vec<CellId>> {
        match *self {
            DestroyStrategy::OneCell => Some(vec![seed]),
            DestroyStrategy::Batch { min_batch_size } => batch(grid, tiles, seed, min_batch_size),
            DestroyStrategy::Circle { radius } => blast(grid, seed, radius),
        }
    }
}

fn batch(grid: &Grid, tiles: &TileRegistry, seed: CellId, min_batch_size: usize) -> Option<Vec<CellId>> {
    let family = tiles.family_at(grid, seed)?;

    let mut visited = vec![false; grid.cells().len()];
    let mut stack = vec![seed];
    let mut found = Vec::new();
    visited[seed.0] = true;

    while let Some(cell) = stack.pop() {
        found.push(cell);
        for &n in grid.neighbors(cell, Neighborhood::Orthogonal) {
            if visited[n.0] {
                continue;
            }
            if tiles.family_at(grid, n) == Some(family) {
                visited[n.0] = true;
                stack.push(n);
            }
        }
    }

    (found.len() >= min_batch_size).then_some(found)
}

fn blast(grid: &Grid, seed: CellId, radius: f32) -> Option<Vec<CellId>> {
    let origin = grid.cell(seed);
    if origin.is_empty() {
        return None;
    }

    let circle = Circle::new(origin.position + grid.cell_size() / 2.0, radius);

    let mut visited = vec![false; grid.cells().len()];
    let mut stack = vec![seed];
    let mut found = Vec::new();
    visited[seed.0] = true;

    while let Some(id) = stack.pop() {
        let cell = grid.cell(id);
        if cell.is_empty() || !circle.intersects_box(&cell.aabb) {
            continue;
        }
        found.push(id);
        for &n in grid.neighbors(id, Neighborhood::All) {
            if !visited[n.0] {
                visited[n.0] = true;
                stack.push(n);
            }
        }
    }

    Some(found)
}

/// Summary of a fully disposed destroy batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchDisposed {
    pub tiles: usize,
    pub reward: u32,
}

#[derive(Debug, Clone)]
pub struct DestroySystem {
    strategy: DestroyStrategy,
    /// Strategy to restore once a booster override completes
    previous: Option<DestroyStrategy>,
    duration: f32,
    max_delay: f32,
    /// Tiles with a running destroy animation (per-frame update queue)
    destroying: Vec<TileId>,
    batch: Option<BatchDisposed>,
    rng: Pcg32,
}

impl DestroySystem {
    pub fn new(strategy: DestroyStrategy, duration: f32, max_delay: f32, seed: u64) -> Self {
        Self {
            strategy,
            previous: None,
            duration,
            max_delay,
            destroying: Vec::new(),
            batch: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn strategy(&self) -> DestroyStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: DestroyStrategy) {
        self.strategy = strategy;
    }

    pub fn has_override(&self) -> bool {
        self.previous.is_some()
    }

    /// Replace the active strategy, remembering the current one.
    /// Only one override can be active at a time.
    pub fn install_override(&mut self, strategy: DestroyStrategy) -> bool {
        if self.previous.is_some() {
            return false;
        }
        self.previous = Some(std::mem::replace(&mut self.strategy, strategy));
        true
    }

    /// Put back the strategy saved by `install_override`
    pub fn restore(&mut self) -> bool {
        match self.previous.take() {
            Some(previous) => {
                self.strategy = previous;
                true
            }
            None => false,
        }
    }

    /// Ask the active strategy which cells a click on `cell` would clear
    pub fn request(&self, grid: &Grid, tiles: &TileRegistry, cell: CellId) -> Option<Vec<CellId>> {
        self.strategy.request_to_destroy(grid, tiles, cell)
    }

    /// Detach the occupants of `cells` and start their destroy animation.
    /// Empty cells are skipped. Returns the detached tiles.
    pub fn destroy_tiles(&mut self, grid: &mut Grid, tiles: &mut TileRegistry, cells: &[CellId]) -> Result<Vec<TileId>> {
        let mut detached = Vec::new();
        for &cell in cells {
            let Some(id) = grid.cell(cell).tile else {
                continue;
            };
            tiles.detach(grid, id)?;

            let delay = if self.max_delay > 0.0 {
                self.rng.random_range(0.0..self.max_delay)
            } else {
                0.0
            };
            let tile = tiles.get_mut(id)?;
            tile.remove_component(ComponentKind::Movement);
            tile.add_component(Component::DestroyAnimation(DestroyAnimation::new(delay, self.duration)));

            self.destroying.push(id);
            detached.push(id);
        }

        if !detached.is_empty() {
            let batch = self.batch.get_or_insert(BatchDisposed { tiles: 0, reward: 0 });
            batch.tiles += detached.len();
        }
        Ok(detached)
    }

    /// Advance destroy animations and dispose finished tiles.
    /// Returns the batch summary once its last tile is gone.
    pub fn update(
        &mut self,
        dt: f32,
        grid: &mut Grid,
        tiles: &mut TileRegistry,
        views: &mut dyn ViewBinding,
    ) -> Result<Option<BatchDisposed>> {
        let mut still_running = Vec::with_capacity(self.destroying.len());
        let mut reward = 0;

        for &id in &self.destroying {
            let tile = tiles.get_mut(id)?;
            let mut position: Vec2 = tile.position;
            tile.destroy_animation_mut()?.advance(dt, &mut position);
            tile.position = position;

            if tile.needs_update() {
                still_running.push(id);
            } else {
                reward += tiles.dispose(grid, id, views)?;
            }
        }
        self.destroying = still_running;

        if let Some(batch) = self.batch.as_mut() {
            batch.reward += reward;
        }
        if self.destroying.is_empty() {
            return Ok(self.batch.take());
        }
        Ok(None)
    }

    pub fn is_idle(&self) -> bool {
        self.destroying.is_empty()
    }

    pub fn destroying(&self) -> &[TileId] {
        &self.destroying
    }
}
