//! JavaScript boundary
//!
//! The page owns the canvas, the textures and the frame loop. It drives the
//! game through `WasmGame` and draws whatever `tiles_json` reports.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::GameConfig;
use crate::game::{ActiveScene, BlastGame};
use crate::resources::{ResourceKind, ResourceManager};
use crate::sim::{GameResult, MainState};
use crate::view::{HeadlessViews, Placement};

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    // Already initialised on a reload
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Tile Blast starting...");
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[derive(Serialize)]
struct Snapshot<'a> {
    scene: ActiveScene,
    state: &'a MainState,
    result: GameResult,
    input_blocked: bool,
}

#[derive(Serialize)]
struct TileView<'a> {
    view: u32,
    family: &'a str,
    #[serde(flatten)]
    placement: Option<Placement>,
}

#[wasm_bindgen]
pub struct WasmGame {
    game: BlastGame<ResourceManager, HeadlessViews>,
}

#[wasm_bindgen]
impl WasmGame {
    /// `config_json` may be empty for the default setup
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, seed: f64) -> Result<WasmGame, JsValue> {
        let config = if config_json.trim().is_empty() {
            GameConfig::default()
        } else {
            GameConfig::from_json(config_json).map_err(to_js)?
        };
        let config = GameConfig {
            seed: seed as u64,
            ..config
        };

        let mut resources = ResourceManager::with_kinds(&[ResourceKind::Texture, ResourceKind::Font]).map_err(to_js)?;
        resources
            .load(ResourceKind::Texture, config.texture_names())
            .map_err(to_js)?;

        let game = BlastGame::new(config, resources, HeadlessViews::new()).map_err(to_js)?;
        Ok(WasmGame { game })
    }

    /// Click in grid-local pixels
    pub fn click(&mut self, x: f32, y: f32) -> Result<bool, JsValue> {
        self.game.click(x, y).map_err(to_js)
    }

    /// Advance by a frame delta in seconds
    pub fn update(&mut self, dt: f32) -> Result<u32, JsValue> {
        self.game.update(dt).map_err(to_js)
    }

    pub fn shuffle(&mut self) -> Result<bool, JsValue> {
        self.game.shuffle().map_err(to_js)
    }

    pub fn activate_bomb(&mut self) -> bool {
        self.game.activate_bomb()
    }

    pub fn restart(&mut self) -> Result<(), JsValue> {
        self.game.restart().map_err(to_js)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        let main = self.game.main();
        let snapshot = Snapshot {
            scene: self.game.active(),
            state: main.state(),
            result: self.game.result_scene().result(),
            input_blocked: main.is_input_blocked(),
        };
        serde_json::to_string(&snapshot).map_err(to_js)
    }

    /// Same as `state_json`, parsed into a JS object
    pub fn state(&self) -> Result<JsValue, JsValue> {
        js_sys::JSON::parse(&self.state_json()?)
    }

    /// Every live tile view with its current placement
    pub fn tiles_json(&self) -> Result<String, JsValue> {
        let tiles: Vec<TileView> = self
            .game
            .main()
            .views()
            .iter()
            .map(|(handle, view)| TileView {
                view: handle.0,
                family: &view.family,
                placement: view.placement,
            })
            .collect();
        serde_json::to_string(&tiles).map_err(to_js)
    }
}
