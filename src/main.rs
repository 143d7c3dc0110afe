//! Tile Blast entry point
//!
//! Natively this runs a headless autoplay session, useful for checking
//! configurations and seeds. The web build is driven from JavaScript through
//! `tile_blast::wasm::WasmGame`.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::PathBuf;

    use anyhow::{Context, Result, bail};
    use clap::Parser;

    use tile_blast::consts::SIM_DT;
    use tile_blast::resources::{ResourceKind, ResourceManager};
    use tile_blast::sim::MainScene;
    use tile_blast::view::HeadlessViews;
    use tile_blast::{ActiveScene, BlastGame, GameConfig};

    /// Headless Tile Blast autoplay
    #[derive(Parser, Debug)]
    #[command(name = "tile-blast", version, about)]
    pub struct Args {
        /// JSON game configuration (built-in defaults when omitted)
        #[arg(short, long)]
        pub config: Option<PathBuf>,

        /// Override the configured RNG seed
        #[arg(short, long)]
        pub seed: Option<u64>,

        /// Stop after this many accepted turns
        #[arg(short, long, default_value_t = 100)]
        pub turns: u32,
    }

    /// Frames allowed for one turn to settle
    const MAX_SETTLE_FRAMES: u32 = 10_000;

    fn load_config(args: &Args) -> Result<GameConfig> {
        let mut config = match &args.config {
            Some(path) => {
                let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
                GameConfig::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
            }
            None => GameConfig::default(),
        };
        if let Some(seed) = args.seed {
            config.seed = seed;
        }
        Ok(config)
    }

    /// Center of the playable cell with the largest destroy set
    fn best_move(scene: &MainScene) -> Option<(f32, f32)> {
        scene
            .playable_cells()
            .into_iter()
            .filter_map(|cell| Some((cell, scene.preview(cell)?.len())))
            .max_by_key(|&(_, size)| size)
            .map(|(cell, _)| {
                let center = scene.grid().cell(cell).aabb.center();
                (center.x, center.y)
            })
    }

    fn settle(game: &mut BlastGame<ResourceManager>) -> Result<()> {
        for _ in 0..MAX_SETTLE_FRAMES {
            game.update(SIM_DT)?;
            if !game.main().is_input_blocked() {
                return Ok(());
            }
        }
        bail!("board did not settle within {MAX_SETTLE_FRAMES} frames")
    }

    pub fn run(args: Args) -> Result<()> {
        let config = load_config(&args)?;
        log::info!("Tile Blast (native) starting with seed {}", config.seed);

        let mut resources = ResourceManager::with_kinds(&[ResourceKind::Texture])?;
        resources.load(ResourceKind::Texture, config.texture_names())?;
        let mut game = BlastGame::new(config, resources, HeadlessViews::new())?;

        let mut turns = 0;
        while turns < args.turns && game.active() == ActiveScene::Main {
            let Some((x, y)) = best_move(game.main()) else {
                if game.shuffle()? {
                    continue;
                }
                if game.activate_bomb() {
                    log::info!("No moves left, using a bomb");
                    continue;
                }
                log::info!("No moves, shuffles or bombs left");
                break;
            };

            if game.click(x, y)? {
                turns += 1;
            }
            settle(&mut game)?;
        }

        let state = game.main().state();
        println!(
            "{:?} after {turns} turns: {} / {} scores, {} steps left, {} shuffles left, {} boosters left",
            game.main().result(),
            state.scores,
            state.max_scores,
            state.steps,
            state.shuffles,
            state.boosters,
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::init();
    native::run(native::Args::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is tile_blast::wasm::wasm_start, this is just to satisfy the compiler
}
