//! Scene flow: main scene -> result scene -> restart
//!
//! `BlastGame` owns the fixed-timestep accumulator. Frame deltas go in, and
//! the main scene is advanced in `SIM_DT` substeps.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::error::Result;
use crate::resources::ResourceProvider;
use crate::sim::{GameResult, MainScene};
use crate::store::Store;
use crate::view::{HeadlessViews, ViewBinding};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveScene {
    Main,
    Result,
}

/// Observable state of the result scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultState {
    pub result: GameResult,
    pub scores: u32,
}

/// Shows the outcome of the last game
#[derive(Debug)]
pub struct ResultScene {
    store: Store<ResultState>,
}

impl ResultScene {
    fn new() -> Self {
        Self {
            store: Store::new(ResultState {
                result: GameResult::None,
                scores: 0,
            }),
        }
    }

    pub fn store(&self) -> &Store<ResultState> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store<ResultState> {
        &mut self.store
    }

    pub fn result(&self) -> GameResult {
        self.store.state().result
    }
}

#[derive(Debug)]
pub struct BlastGame<R: ResourceProvider, V: ViewBinding + Default = HeadlessViews> {
    config: GameConfig,
    resources: R,
    main: MainScene<V>,
    result: ResultScene,
    active: ActiveScene,
    games_played: u64,
    accumulator: f32,
}

impl<R: ResourceProvider, V: ViewBinding + Default> BlastGame<R, V> {
    pub fn new(config: GameConfig, resources: R, views: V) -> Result<Self> {
        let main = MainScene::new(&config, &resources, views)?;
        Ok(Self {
            config,
            resources,
            main,
            result: ResultScene::new(),
            active: ActiveScene::Main,
            games_played: 0,
            accumulator: 0.0,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn active(&self) -> ActiveScene {
        self.active
    }

    pub fn main(&self) -> &MainScene<V> {
        &self.main
    }

    pub fn main_mut(&mut self) -> &mut MainScene<V> {
        &mut self.main
    }

    pub fn result_scene(&self) -> &ResultScene {
        &self.result
    }

    pub fn result_scene_mut(&mut self) -> &mut ResultScene {
        &mut self.result
    }

    /// Seed of the game currently in the main scene
    pub fn current_seed(&self) -> u64 {
        self.config.seed.wrapping_add(self.games_played)
    }

    /// Click in grid-local pixels; ignored outside the main scene
    pub fn click(&mut self, x: f32, y: f32) -> Result<bool> {
        match self.active {
            ActiveScene::Main => self.main.on_click(x, y),
            ActiveScene::Result => Ok(false),
        }
    }

    pub fn shuffle(&mut self) -> Result<bool> {
        match self.active {
            ActiveScene::Main => self.main.shuffle(),
            ActiveScene::Result => Ok(false),
        }
    }

    pub fn activate_bomb(&mut self) -> bool {
        match self.active {
            ActiveScene::Main => self.main.activate_bomb(),
            ActiveScene::Result => false,
        }
    }

    /// Advance by a frame delta. Returns the number of simulation substeps run.
    pub fn update(&mut self, dt: f32) -> Result<u32> {
        let dt = dt.clamp(0.0, 0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            // Motion keeps running out under the result scene
            self.main.update(SIM_DT)?;
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator = 0.0;
        }

        if self.active == ActiveScene::Main && self.main.is_finished() {
            self.show_result();
        }
        Ok(substeps)
    }

    fn show_result(&mut self) {
        let result = self.main.result();
        let scores = self.main.state().scores;
        self.result.store.set_state(|state| {
            state.result = result;
            state.scores = scores;
        });
        self.active = ActiveScene::Result;
        log::info!("Result scene: {result:?} ({scores} scores)");
    }

    /// Start a new game with the next seed
    pub fn restart(&mut self) -> Result<()> {
        let views = self.main.teardown()?;
        self.games_played += 1;

        let config = GameConfig {
            seed: self.current_seed(),
            ..self.config.clone()
        };
        self.main = MainScene::new(&config, &self.resources, views)?;
        self.result.store.set_state(|state| {
            state.result = GameResult::None;
            state.scores = 0;
        });
        self.active = ActiveScene::Main;
        self.accumulator = 0.0;
        log::info!("Restarted with seed {}", config.seed);
        Ok(())
    }
}
