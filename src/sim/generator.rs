//! Tile generation and shuffling
//!
//! All randomness in the scene's board comes from one seeded PCG stream, so a
//! seed fully determines the initial board, the refill sequence and shuffles.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::grid::{CellId, Grid};
use super::tile::{Component, ScoringComponent, TileDescriptor, TileId, TileRegistry, TileSpec, ViewComponent};
use crate::config::TileTypeConfig;
use crate::error::{BlastError, Result};
use crate::resources::{ResourceKind, ResourceProvider};
use crate::view::ViewBinding;

#[derive(Debug, Clone)]
pub struct TileGenerator {
    descriptors: Vec<TileDescriptor>,
    rng: Pcg32,
}

impl TileGenerator {
    /// Resolve every family's texture up front; a missing one is fatal
    pub fn new(tile_types: &[TileTypeConfig], resources: &dyn ResourceProvider, seed: u64) -> Result<Self> {
        if tile_types.is_empty() {
            return Err(BlastError::InvalidConfig("no tile types".to_string()));
        }

        let descriptors = tile_types
            .iter()
            .map(|t| {
                Ok(TileDescriptor {
                    family: t.family.clone(),
                    texture: resources.get(ResourceKind::Texture, &t.image)?,
                    scores: t.scores,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            descriptors,
            rng: Pcg32::seed_from_u64(seed),
        })
    }

    pub fn descriptors(&self) -> &[TileDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, family: &str) -> Option<&TileDescriptor> {
        self.descriptors.iter().find(|d| d.family == family)
    }

    /// Spawn a detached tile of a random family at `position`
    pub fn generate(
        &mut self,
        grid: &Grid,
        tiles: &mut TileRegistry,
        views: &mut dyn ViewBinding,
        position: Vec2,
    ) -> TileId {
        let index = self.rng.random_range(0..self.descriptors.len());
        spawn_tile(&self.descriptors[index], grid, tiles, views, position)
    }

    /// Spawn a detached tile of a given family at `position`
    pub fn generate_family(
        &self,
        family: &str,
        grid: &Grid,
        tiles: &mut TileRegistry,
        views: &mut dyn ViewBinding,
        position: Vec2,
    ) -> Result<TileId> {
        let descriptor = self
            .descriptor(family)
            .ok_or_else(|| BlastError::InvalidConfig(format!("unknown tile family `{family}`")))?;
        Ok(spawn_tile(descriptor, grid, tiles, views, position))
    }

    /// Put a fresh random tile into every empty cell
    pub fn fill_grid(&mut self, grid: &mut Grid, tiles: &mut TileRegistry, views: &mut dyn ViewBinding) -> Result<()> {
        let empty: Vec<(CellId, Vec2)> = grid
            .cells()
            .iter()
            .filter(|c| c.is_empty())
            .map(|c| (c.id, c.position))
            .collect();

        for (cell, position) in empty {
            let id = self.generate(grid, tiles, views, position);
            tiles.attach(grid, id, cell)?;
        }
        Ok(())
    }

    /// Spawn `empty` tiles stacked above column `col` and the top padding,
    /// paired with the cells they should fall into (the lowest spawned tile
    /// lands deepest)
    pub fn generate_top_tiles(
        &mut self,
        grid: &Grid,
        tiles: &mut TileRegistry,
        views: &mut dyn ViewBinding,
        col: usize,
        empty: usize,
    ) -> Vec<(TileId, CellId)> {
        if col >= grid.cols {
            return Vec::new();
        }
        let empty = empty.min(grid.rows);
        let x = col as f32 * grid.cell_width();

        (0..empty)
            .map(|i| {
                let position = Vec2::new(x, -((i + 1) as f32) * grid.cell_height() - grid.top_padding);
                let id = self.generate(grid, tiles, views, position);
                (id, grid.column(col)[empty - (i + 1)].id)
            })
            .collect()
    }

    /// Randomly permute every attached tile over the grid, keeping the set of
    /// tiles. Tiles are laid out row by row in the shuffled order.
    pub fn shuffle(&mut self, grid: &mut Grid, tiles: &mut TileRegistry) -> Result<()> {
        let mut attached = tiles.detach_all(grid);
        attached.shuffle(&mut self.rng);

        for (index, id) in attached.into_iter().enumerate() {
            let (row, col) = (index / grid.cols, index % grid.cols);
            let cell = grid.cell_by_row_col(row, col).ok_or_else(|| {
                BlastError::InvalidConfig(format!("shuffle overflow at row {row}, col {col}"))
            })?;
            tiles.attach(grid, id, cell)?;
        }
        Ok(())
    }
}

fn spawn_tile(
    descriptor: &TileDescriptor,
    grid: &Grid,
    tiles: &mut TileRegistry,
    views: &mut dyn ViewBinding,
    position: Vec2,
) -> TileId {
    let id = tiles.spawn(TileSpec {
        family: descriptor.family.clone(),
        size: grid.cell_size(),
        position,
    });

    let handle = views.create_view(descriptor);
    if let Ok(tile) = tiles.get_mut(id) {
        tile.add_component(Component::View(ViewComponent { handle }));
        tile.add_component(Component::Scoring(ScoringComponent {
            scores: descriptor.scores,
        }));
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::resources::ResourceManager;
    use crate::sim::grid::GridOptions;
    use crate::view::HeadlessViews;

    fn resources(config: &GameConfig) -> ResourceManager {
        let mut manager = ResourceManager::with_kinds(&[ResourceKind::Texture]).unwrap();
        manager.load(ResourceKind::Texture, config.texture_names()).unwrap();
        manager
    }

    fn grid(cols: usize, rows: usize) -> Grid {
        Grid::new(GridOptions {
            cols,
            rows,
            width: cols as f32 * 10.0,
            height: rows as f32 * 10.0,
            top_padding: 0.0,
        })
        .unwrap()
    }

    fn families(grid: &Grid, tiles: &TileRegistry) -> Vec<String> {
        grid.cells()
            .iter()
            .map(|c| tiles.family_at(grid, c.id).unwrap_or(".").to_string())
            .collect()
    }

    #[test]
    fn test_missing_texture_is_fatal() {
        let config = GameConfig::default();
        let manager = ResourceManager::with_kinds(&[ResourceKind::Texture]).unwrap();
        let err = TileGenerator::new(&config.tile_types, &manager, 1).unwrap_err();
        assert!(matches!(err, BlastError::MissingResource { .. }));
    }

    #[test]
    fn test_fill_grid_is_deterministic() {
        let config = GameConfig::default();
        let manager = resources(&config);

        let mut boards = Vec::new();
        for _ in 0..2 {
            let mut generator = TileGenerator::new(&config.tile_types, &manager, 42).unwrap();
            let mut grid = grid(4, 4);
            let mut tiles = TileRegistry::new();
            let mut views = HeadlessViews::new();
            generator.fill_grid(&mut grid, &mut tiles, &mut views).unwrap();

            assert!(grid.cells().iter().all(|c| !c.is_empty()));
            assert_eq!(views.live_count(), 16);
            boards.push(families(&grid, &tiles));
        }
        assert_eq!(boards[0], boards[1]);
    }

    #[test]
    fn test_top_tiles_stack_above_column() {
        let config = GameConfig::default();
        let manager = resources(&config);
        let mut generator = TileGenerator::new(&config.tile_types, &manager, 3).unwrap();
        let grid = grid(3, 4);
        let mut tiles = TileRegistry::new();
        let mut views = HeadlessViews::new();

        let spawned = generator.generate_top_tiles(&grid, &mut tiles, &mut views, 1, 2);
        assert_eq!(spawned.len(), 2);

        let (first, first_dst) = spawned[0];
        let (second, second_dst) = spawned[1];
        assert_eq!(tiles.get(first).unwrap().position, Vec2::new(10.0, -10.0));
        assert_eq!(tiles.get(second).unwrap().position, Vec2::new(10.0, -20.0));
        assert_eq!(grid.cell(first_dst).row, 1);
        assert_eq!(grid.cell(second_dst).row, 0);
        assert!(!tiles.get(first).unwrap().is_attached());
    }

    #[test]
    fn test_top_tiles_clear_the_padding() {
        let config = GameConfig::default();
        let manager = resources(&config);
        let mut generator = TileGenerator::new(&config.tile_types, &manager, 3).unwrap();
        let grid = Grid::new(GridOptions {
            cols: 2,
            rows: 2,
            width: 20.0,
            height: 20.0,
            top_padding: 7.0,
        })
        .unwrap();
        let mut tiles = TileRegistry::new();
        let mut views = HeadlessViews::new();

        let spawned = generator.generate_top_tiles(&grid, &mut tiles, &mut views, 0, 2);
        let ys: Vec<f32> = spawned.iter().map(|(id, _)| tiles.get(*id).unwrap().position.y).collect();
        assert_eq!(ys, vec![-17.0, -27.0]);
    }

    #[test]
    fn test_shuffle_keeps_the_tile_set() {
        let config = GameConfig::default();
        let manager = resources(&config);
        let mut generator = TileGenerator::new(&config.tile_types, &manager, 9).unwrap();
        let mut grid = grid(5, 5);
        let mut tiles = TileRegistry::new();
        let mut views = HeadlessViews::new();
        generator.fill_grid(&mut grid, &mut tiles, &mut views).unwrap();

        let mut before = grid.attachments();
        before.sort();
        generator.shuffle(&mut grid, &mut tiles).unwrap();
        let mut after = grid.attachments();
        after.sort();

        assert_eq!(before, after);
        for cell in grid.cells() {
            let id = cell.tile.unwrap();
            let tile = tiles.get(id).unwrap();
            assert_eq!(tile.cell(), Some(cell.id));
            assert_eq!(tile.position, cell.position);
        }
    }

    #[test]
    fn test_generate_family() {
        let config = GameConfig::default();
        let manager = resources(&config);
        let generator = TileGenerator::new(&config.tile_types, &manager, 0).unwrap();
        let grid = grid(2, 2);
        let mut tiles = TileRegistry::new();
        let mut views = HeadlessViews::new();

        let id = generator
            .generate_family("blue", &grid, &mut tiles, &mut views, Vec2::ZERO)
            .unwrap();
        assert_eq!(tiles.get(id).unwrap().family, "blue");
        assert!(tiles.get(id).unwrap().view().is_ok());
        assert!(generator
            .generate_family("purple", &grid, &mut tiles, &mut views, Vec2::ZERO)
            .is_err());
    }
}
