//! The main play scene: turn controller over the board systems
//!
//! A turn starts with an accepted click and ends once every destroyed tile
//! has been disposed and every falling tile has settled. Input is blocked in
//! between; the block is lifted by polling the systems each frame.

use std::cell::Cell as SharedFlag;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::booster::{BoosterKind, Boosters};
use super::destroy::{DestroyStrategy, DestroySystem};
use super::generator::TileGenerator;
use super::grid::{CellId, Grid};
use super::movement::MovementSystem;
use super::tile::TileRegistry;
use crate::config::GameConfig;
use crate::error::{BlastError, Result};
use crate::resources::ResourceProvider;
use crate::store::{Store, SubscribeOptions};
use crate::view::{HeadlessViews, Placement, ViewBinding};

/// Outcome of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Win,
    Lose,
    None,
}

/// Observable state of the main scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainState {
    pub scores: u32,
    pub steps: i32,
    pub max_scores: u32,
    pub shuffles: u32,
    pub boosters: u32,
}

impl MainState {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            scores: 0,
            steps: config.steps,
            max_scores: config.max_scores,
            shuffles: config.shuffles,
            boosters: config.bomb_boosters,
        }
    }

    /// Reaching the target wins even when the last step was just spent
    pub fn outcome(&self) -> GameResult {
        if self.scores >= self.max_scores {
            GameResult::Win
        } else if self.steps <= 0 {
            GameResult::Lose
        } else {
            GameResult::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for a click
    Idle,
    /// Destroy animations or falls in progress
    Resolving,
    /// Game over; input is ignored, motion still runs out
    Finished(GameResult),
}

#[derive(Debug)]
pub struct MainScene<V: ViewBinding = HeadlessViews> {
    grid: Grid,
    tiles: TileRegistry,
    destroy: DestroySystem,
    movement: MovementSystem,
    generator: TileGenerator,
    boosters: Boosters,
    store: Store<MainState>,
    views: V,
    phase: TurnPhase,
    input_blocked: bool,
    /// Written by the store's end-of-game subscription
    outcome: Rc<SharedFlag<GameResult>>,
    bomb_price: u32,
}

impl<V: ViewBinding> MainScene<V> {
    /// Build the board and fill it with random tiles
    pub fn new(config: &GameConfig, resources: &dyn ResourceProvider, mut views: V) -> Result<Self> {
        config.validate()?;

        let mut grid = Grid::new(config.grid_options())?;
        let mut tiles = TileRegistry::new();
        let mut generator = TileGenerator::new(&config.tile_types, resources, config.seed)?;
        generator.fill_grid(&mut grid, &mut tiles, &mut views)?;

        let mut store = Store::new(MainState::from_config(config));
        let outcome = Rc::new(SharedFlag::new(GameResult::None));
        let sink = outcome.clone();
        store.subscribe(
            MainState::outcome,
            move |result: &GameResult, _: &MainState| sink.set(*result),
            SubscribeOptions::deferred(),
        );

        log::info!(
            "Main scene: {}x{} grid, {} steps, target {} (seed {})",
            config.cols,
            config.rows,
            config.steps,
            config.max_scores,
            config.seed
        );

        Ok(Self {
            grid,
            tiles,
            destroy: DestroySystem::new(
                DestroyStrategy::Batch {
                    min_batch_size: config.min_batch_size,
                },
                config.destroy_duration,
                config.destroy_max_delay,
                config.seed.wrapping_add(1),
            ),
            movement: MovementSystem::new(config.fall_delay),
            generator,
            boosters: Boosters::new(config.circle_damage_radius, config.bomb_price),
            store,
            views,
            phase: TurnPhase::Idle,
            input_blocked: false,
            outcome,
            bomb_price: config.bomb_price,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tiles(&self) -> &TileRegistry {
        &self.tiles
    }

    pub fn views(&self) -> &V {
        &self.views
    }

    pub fn store(&self) -> &Store<MainState> {
        &self.store
    }

    /// For UI bindings that want to subscribe
    pub fn store_mut(&mut self) -> &mut Store<MainState> {
        &mut self.store
    }

    pub fn state(&self) -> &MainState {
        self.store.state()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_input_blocked(&self) -> bool {
        self.input_blocked
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, TurnPhase::Finished(_))
    }

    pub fn result(&self) -> GameResult {
        match self.phase {
            TurnPhase::Finished(result) => result,
            _ => GameResult::None,
        }
    }

    pub fn destroy_strategy(&self) -> DestroyStrategy {
        self.destroy.strategy()
    }

    pub fn armed_booster(&self) -> Option<BoosterKind> {
        self.boosters.armed()
    }

    /// No tile is falling or being destroyed
    pub fn is_settled(&self) -> bool {
        self.movement.is_idle() && self.destroy.is_idle()
    }

    /// Occupied cells a click on `cell` would clear under the active strategy.
    /// `None` for an id this grid does not know.
    pub fn preview(&self, cell: CellId) -> Option<Vec<CellId>> {
        self.grid.get(cell)?;
        let cells: Vec<CellId> = self
            .destroy
            .request(&self.grid, &self.tiles, cell)?
            .into_iter()
            .filter(|&id| !self.grid.cell(id).is_empty())
            .collect();
        (!cells.is_empty()).then_some(cells)
    }

    /// Cells whose click the active strategy would accept
    pub fn playable_cells(&self) -> Vec<CellId> {
        self.grid
            .cells()
            .iter()
            .filter(|c| self.preview(c.id).is_some())
            .map(|c| c.id)
            .collect()
    }

    /// Handle a click in grid-local pixels. Returns whether a turn started.
    pub fn on_click(&mut self, x: f32, y: f32) -> Result<bool> {
        if self.is_finished() || self.input_blocked {
            return Ok(false);
        }
        let Some(cell) = self.grid.cell_by_coords(x, y) else {
            return Ok(false);
        };
        let Some(cells) = self.destroy.request(&self.grid, &self.tiles, cell) else {
            return Ok(false);
        };

        let destroyed = self.destroy.destroy_tiles(&mut self.grid, &mut self.tiles, &cells)?;
        if destroyed.is_empty() {
            return Ok(false);
        }

        self.input_blocked = true;
        self.phase = TurnPhase::Resolving;
        log::debug!("Turn accepted: {} tiles at {:?}", destroyed.len(), cell);

        if let Some(kind) = self.boosters.consume(&mut self.destroy) {
            log::info!("{kind:?} booster used");
        }

        self.refill()?;
        // Zero-length destroy animations finish without waiting for a frame
        self.dispose_finished(0.0)?;
        Ok(true)
    }

    /// Compact every column and queue replacement tiles above it
    fn refill(&mut self) -> Result<()> {
        for col in 0..self.grid.cols {
            let empty = self.movement.move_hovered_tiles(&mut self.grid, &mut self.tiles, col)?;
            let spawned =
                self.generator
                    .generate_top_tiles(&self.grid, &mut self.tiles, &mut self.views, col, empty);
            for (tile, dst) in spawned {
                self.movement.add_tile(&mut self.tiles, tile, dst)?;
            }
        }
        Ok(())
    }

    fn dispose_finished(&mut self, dt: f32) -> Result<()> {
        let Some(batch) = self
            .destroy
            .update(dt, &mut self.grid, &mut self.tiles, &mut self.views)?
        else {
            return Ok(());
        };

        self.store.set_state(|state| {
            state.scores += batch.reward;
            state.steps -= 1;
        });
        log::debug!(
            "Batch of {} disposed: +{} scores, {} steps left",
            batch.tiles,
            batch.reward,
            self.store.state().steps
        );
        self.check_outcome();
        Ok(())
    }

    fn check_outcome(&mut self) {
        let result = self.outcome.get();
        if result == GameResult::None || self.is_finished() {
            return;
        }
        self.phase = TurnPhase::Finished(result);
        log::info!("Game over: {result:?} with {} scores", self.store.state().scores);
    }

    /// Advance the scene by one frame
    pub fn update(&mut self, dt: f32) -> Result<()> {
        self.dispose_finished(dt)?;

        for settled in self.movement.update(dt, &mut self.grid, &mut self.tiles)? {
            log::trace!("{:?} settled in {:?}", settled.tile, settled.cell);
        }
        self.sync_views();

        if self.input_blocked && self.is_settled() {
            self.input_blocked = false;
            if self.phase == TurnPhase::Resolving {
                self.phase = TurnPhase::Idle;
            }
        }
        Ok(())
    }

    /// Push every tile's placement to the view binding
    fn sync_views(&mut self) {
        let fit = self.views.fit();
        for tile in self.tiles.iter() {
            let Ok(view) = tile.view() else {
                continue;
            };
            let (scale, alpha) = tile
                .destroy_animation()
                .map(|anim| (anim.scale, anim.alpha))
                .unwrap_or((1.0, 1.0));
            let (position, size) = fit.apply(tile.aabb(), tile.size);
            self.views.place_view(
                view.handle,
                Placement {
                    position,
                    size,
                    scale,
                    alpha,
                },
            );
        }
    }

    /// Redistribute the board. Returns false when no shuffle is available.
    pub fn shuffle(&mut self) -> Result<bool> {
        if self.is_finished() || self.input_blocked || self.store.state().shuffles == 0 {
            return Ok(false);
        }

        self.generator.shuffle(&mut self.grid, &mut self.tiles)?;
        self.store.set_state(|state| state.shuffles -= 1);
        log::info!("Board shuffled, {} shuffles left", self.store.state().shuffles);
        Ok(true)
    }

    /// Arm the bomb for the next accepted click. Returns false when not allowed.
    pub fn activate_bomb(&mut self) -> bool {
        let state = self.store.state();
        if self.is_finished()
            || self.input_blocked
            || state.boosters == 0
            || state.scores < self.bomb_price
            || self.boosters.armed().is_some()
        {
            return false;
        }
        if !self.boosters.arm(BoosterKind::Bomb, &mut self.destroy) {
            return false;
        }

        let price = self.bomb_price;
        self.store.set_state(|state| {
            state.scores -= price;
            state.boosters -= 1;
        });
        log::info!("Bomb armed, {} boosters left", self.store.state().boosters);
        true
    }

    /// Replace the tile in one cell (level setup). `None` empties the cell.
    /// Only allowed while no turn is resolving.
    pub fn set_tile(&mut self, row: usize, col: usize, family: Option<&str>) -> Result<bool> {
        if self.input_blocked {
            return Ok(false);
        }
        let Some(cell) = self.grid.cell_by_row_col(row, col) else {
            return Ok(false);
        };
        if let Some(family) = family {
            if self.generator.descriptor(family).is_none() {
                return Err(BlastError::InvalidConfig(format!("unknown tile family `{family}`")));
            }
        }

        if let Some(old) = self.grid.cell(cell).tile {
            self.tiles.dispose(&mut self.grid, old, &mut self.views)?;
        }
        if let Some(family) = family {
            let position = self.grid.cell(cell).position;
            let id = self
                .generator
                .generate_family(family, &self.grid, &mut self.tiles, &mut self.views, position)?;
            self.tiles.attach(&mut self.grid, id, cell)?;
        }
        Ok(true)
    }

    /// Dispose every tile, releasing its view, and hand the binding back.
    /// The scene is left with an empty board.
    pub fn teardown(&mut self) -> Result<V>
    where
        V: Default,
    {
        for id in self.tiles.ids() {
            self.tiles.dispose(&mut self.grid, id, &mut self.views)?;
        }
        self.input_blocked = true;
        Ok(std::mem::take(&mut self.views))
    }
}
