//! Tile entities, their components and the tile registry
//!
//! A tile is either attached (it occupies exactly one cell and can be matched)
//! or detached (falling or being destroyed). The registry owns every live tile
//! and keeps the tile↔cell link consistent on both sides.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Aabb;
use super::grid::{CellId, Grid, Neighborhood};
use crate::consts::{DESTROY_DRIFT, SIM_DT};
use crate::error::{BlastError, Result};
use crate::resources::ResourceHandle;
use crate::view::{ViewBinding, ViewHandle};

/// Stable tile identity, monotonic per registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

/// Resolved tile family: match key, texture and reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDescriptor {
    pub family: String,
    pub texture: ResourceHandle,
    pub scores: u32,
}

/// Component discriminant, used for lookups and error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    View,
    Movement,
    DestroyAnimation,
    Scoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewComponent {
    pub handle: ViewHandle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementComponent {
    /// Fall speed (pixels/s)
    pub speed: f32,
}

/// Shrink-and-fade played between selection and disposal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DestroyAnimation {
    pub delay: f32,
    pub duration: f32,
    pub elapsed: f32,
    pub scale: f32,
    pub alpha: f32,
}

impl DestroyAnimation {
    pub fn new(delay: f32, duration: f32) -> Self {
        Self {
            delay,
            duration,
            elapsed: 0.0,
            scale: 1.0,
            alpha: 1.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.delay <= 0.0 && self.elapsed >= self.duration
    }

    /// Advance by `dt`, drifting `position`. Returns true once finished.
    pub fn advance(&mut self, dt: f32, position: &mut Vec2) -> bool {
        if self.delay > 0.0 {
            self.delay -= dt;
            return false;
        }

        self.elapsed += dt;
        let t = if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            1.0
        };
        // Quartic ease-in toward zero
        let remaining = 1.0 - t.powi(4);
        self.scale = remaining;
        self.alpha = remaining;
        *position += Vec2::splat(DESTROY_DRIFT * dt / SIM_DT);

        self.is_finished()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringComponent {
    pub scores: u32,
}

/// The fixed set of tile components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    View(ViewComponent),
    Movement(MovementComponent),
    DestroyAnimation(DestroyAnimation),
    Scoring(ScoringComponent),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::View(_) => ComponentKind::View,
            Component::Movement(_) => ComponentKind::Movement,
            Component::DestroyAnimation(_) => ComponentKind::DestroyAnimation,
            Component::Scoring(_) => ComponentKind::Scoring,
        }
    }

    /// Whether this component wants a per-frame update
    pub fn needs_update(&self) -> bool {
        match self {
            Component::DestroyAnimation(anim) => !anim.is_finished(),
            _ => false,
        }
    }

    /// Disposal hook. Returns the reward this component contributes.
    fn on_destroy(self, views: &mut dyn ViewBinding) -> u32 {
        match self {
            Component::View(view) => {
                views.release_view(view.handle);
                0
            }
            Component::Scoring(scoring) => scoring.scores,
            Component::Movement(_) | Component::DestroyAnimation(_) => 0,
        }
    }
}

/// Everything needed to spawn a tile
#[derive(Debug, Clone)]
pub struct TileSpec {
    pub family: String,
    pub size: Vec2,
    pub position: Vec2,
}

/// A matchable game piece
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub family: String,
    pub size: Vec2,
    /// Top-left corner in grid-local pixels
    pub position: Vec2,
    cell: Option<CellId>,
    components: Vec<Component>,
}

macro_rules! component_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty) => {
        pub fn $get(&self) -> Result<&$ty> {
            self.components
                .iter()
                .find_map(|c| match c {
                    Component::$variant(inner) => Some(inner),
                    _ => None,
                })
                .ok_or(BlastError::MissingComponent {
                    tile: self.id,
                    kind: ComponentKind::$variant,
                })
        }

        pub fn $get_mut(&mut self) -> Result<&mut $ty> {
            let id = self.id;
            self.components
                .iter_mut()
                .find_map(|c| match c {
                    Component::$variant(inner) => Some(inner),
                    _ => None,
                })
                .ok_or(BlastError::MissingComponent {
                    tile: id,
                    kind: ComponentKind::$variant,
                })
        }
    };
}

impl Tile {
    #[inline]
    pub fn cell(&self) -> Option<CellId> {
        self.cell
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.cell.is_some()
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_position_size(self.position, self.size)
    }

    /// Attach a component, replacing one of the same kind
    pub fn add_component(&mut self, component: Component) {
        let kind = component.kind();
        self.components.retain(|c| c.kind() != kind);
        self.components.push(component);
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.iter().any(|c| c.kind() == kind)
    }

    pub fn remove_component(&mut self, kind: ComponentKind) -> Option<Component> {
        let index = self.components.iter().position(|c| c.kind() == kind)?;
        Some(self.components.remove(index))
    }

    pub fn needs_update(&self) -> bool {
        self.components.iter().any(Component::needs_update)
    }

    component_accessors!(view, view_mut, View, ViewComponent);
    component_accessors!(movement, movement_mut, Movement, MovementComponent);
    component_accessors!(destroy_animation, destroy_animation_mut, DestroyAnimation, DestroyAnimation);
    component_accessors!(scoring, scoring_mut, Scoring, ScoringComponent);
}

/// Owns every live tile, keyed by id (stable iteration order)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileRegistry {
    tiles: BTreeMap<TileId, Tile>,
    next_id: u32,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached tile
    pub fn spawn(&mut self, spec: TileSpec) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        self.tiles.insert(
            id,
            Tile {
                id,
                family: spec.family,
                size: spec.size,
                position: spec.position,
                cell: None,
                components: Vec::new(),
            },
        );
        id
    }

    pub fn get(&self, id: TileId) -> Result<&Tile> {
        self.tiles.get(&id).ok_or(BlastError::UnknownTile(id))
    }

    pub fn get_mut(&mut self, id: TileId) -> Result<&mut Tile> {
        self.tiles.get_mut(&id).ok_or(BlastError::UnknownTile(id))
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn ids(&self) -> Vec<TileId> {
        self.tiles.keys().copied().collect()
    }

    /// Family of the tile occupying `cell`, if any
    pub fn family_at(&self, grid: &Grid, cell: CellId) -> Option<&str> {
        let id = grid.cell(cell).tile?;
        self.tiles.get(&id).map(|t| t.family.as_str())
    }

    /// Link a detached tile and an empty cell, snapping the tile onto the cell
    pub fn attach(&mut self, grid: &mut Grid, id: TileId, cell: CellId) -> Result<()> {
        let tile = self.tiles.get_mut(&id).ok_or(BlastError::UnknownTile(id))?;
        if let Some(current) = tile.cell {
            return Err(BlastError::TileAlreadyAttached { tile: id, cell: current });
        }

        let slot = grid.cell_mut(cell);
        if let Some(occupant) = slot.tile {
            return Err(BlastError::CellOccupied { cell, occupant });
        }

        slot.tile = Some(id);
        tile.cell = Some(cell);
        tile.position = slot.position;
        Ok(())
    }

    /// Break the tile↔cell link. Returns the vacated cell.
    pub fn detach(&mut self, grid: &mut Grid, id: TileId) -> Result<Option<CellId>> {
        let tile = self.tiles.get_mut(&id).ok_or(BlastError::UnknownTile(id))?;
        let Some(cell) = tile.cell.take() else {
            return Ok(None);
        };

        let slot = grid.cell_mut(cell);
        if slot.tile == Some(id) {
            slot.tile = None;
        }
        Ok(Some(cell))
    }

    /// Detach every attached tile at once. Returns them in grid traversal order.
    pub fn detach_all(&mut self, grid: &mut Grid) -> Vec<TileId> {
        let attached = grid.attachments();
        grid.clear();
        for id in &attached {
            if let Some(tile) = self.tiles.get_mut(id) {
                tile.cell = None;
            }
        }
        attached
    }

    /// Attached tiles around an attached tile; empty while detached
    pub fn neighbors(&self, grid: &Grid, id: TileId, neighborhood: Neighborhood) -> Result<Vec<TileId>> {
        let tile = self.get(id)?;
        let Some(cell) = tile.cell else {
            return Ok(Vec::new());
        };

        Ok(grid
            .neighbors(cell, neighborhood)
            .iter()
            .filter_map(|&n| grid.cell(n).tile)
            .collect())
    }

    /// Remove a tile, firing every component's disposal hook once.
    /// Returns the reward contributed by the tile's components.
    pub fn dispose(&mut self, grid: &mut Grid, id: TileId, views: &mut dyn ViewBinding) -> Result<u32> {
        self.detach(grid, id)?;
        let tile = self.tiles.remove(&id).ok_or(BlastError::UnknownTile(id))?;
        Ok(tile
            .components
            .into_iter()
            .map(|component| component.on_destroy(views))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::GridOptions;
    use crate::view::HeadlessViews;

    fn setup() -> (Grid, TileRegistry) {
        let grid = Grid::new(GridOptions {
            cols: 3,
            rows: 3,
            width: 30.0,
            height: 30.0,
            top_padding: 0.0,
        })
        .unwrap();
        (grid, TileRegistry::new())
    }

    fn place(grid: &mut Grid, tiles: &mut TileRegistry, id: TileId, row: usize, col: usize) {
        let cell = grid.cell_by_row_col(row, col).unwrap();
        tiles.attach(grid, id, cell).unwrap();
    }

    fn spec(family: &str) -> TileSpec {
        TileSpec {
            family: family.to_string(),
            size: Vec2::splat(10.0),
            position: Vec2::ZERO,
        }
    }

    #[test]
    fn test_ids_are_monotonic() {
        let (_, mut tiles) = setup();
        let a = tiles.spawn(spec("red"));
        let b = tiles.spawn(spec("red"));
        assert!(b > a);
        assert_eq!(tiles.len(), 2);
    }

    #[test]
    fn test_attach_detach_keeps_both_sides() {
        let (mut grid, mut tiles) = setup();
        let id = tiles.spawn(spec("red"));
        let cell = grid.cell_by_row_col(1, 2).unwrap();

        tiles.attach(&mut grid, id, cell).unwrap();
        assert_eq!(grid.cell(cell).tile, Some(id));
        assert_eq!(tiles.get(id).unwrap().cell(), Some(cell));
        assert_eq!(tiles.get(id).unwrap().position, Vec2::new(20.0, 10.0));

        assert_eq!(tiles.detach(&mut grid, id).unwrap(), Some(cell));
        assert!(grid.cell(cell).is_empty());
        assert!(!tiles.get(id).unwrap().is_attached());
        assert_eq!(tiles.detach(&mut grid, id).unwrap(), None);
    }

    #[test]
    fn test_attach_to_occupied_cell_fails() {
        let (mut grid, mut tiles) = setup();
        let a = tiles.spawn(spec("red"));
        let b = tiles.spawn(spec("blue"));
        let cell = grid.cell_by_row_col(0, 0).unwrap();

        tiles.attach(&mut grid, a, cell).unwrap();
        let err = tiles.attach(&mut grid, b, cell).unwrap_err();
        assert!(matches!(err, BlastError::CellOccupied { occupant, .. } if occupant == a));
        assert_eq!(err.category(), crate::ErrorCategory::State);
        assert!(!tiles.get(b).unwrap().is_attached());
    }

    #[test]
    fn test_attach_twice_fails() {
        let (mut grid, mut tiles) = setup();
        let a = tiles.spawn(spec("red"));
        place(&mut grid, &mut tiles, a, 0, 0);
        let other = grid.cell_by_row_col(0, 1).unwrap();
        let err = tiles.attach(&mut grid, a, other).unwrap_err();
        assert!(matches!(err, BlastError::TileAlreadyAttached { .. }));
        assert!(grid.cell(other).is_empty());
    }

    #[test]
    fn test_neighbors() {
        let (mut grid, mut tiles) = setup();
        let center = tiles.spawn(spec("red"));
        let up = tiles.spawn(spec("red"));
        let diag = tiles.spawn(spec("red"));
        place(&mut grid, &mut tiles, center, 1, 1);
        place(&mut grid, &mut tiles, up, 0, 1);
        place(&mut grid, &mut tiles, diag, 0, 0);

        assert_eq!(tiles.neighbors(&grid, center, Neighborhood::Orthogonal).unwrap(), vec![up]);
        let mut all = tiles.neighbors(&grid, center, Neighborhood::All).unwrap();
        all.sort();
        assert_eq!(all, vec![up, diag]);

        tiles.detach(&mut grid, center).unwrap();
        assert!(tiles.neighbors(&grid, center, Neighborhood::All).unwrap().is_empty());
    }

    #[test]
    fn test_detach_all() {
        let (mut grid, mut tiles) = setup();
        let a = tiles.spawn(spec("red"));
        let b = tiles.spawn(spec("blue"));
        place(&mut grid, &mut tiles, a, 2, 2);
        place(&mut grid, &mut tiles, b, 0, 0);

        assert_eq!(tiles.detach_all(&mut grid), vec![b, a]);
        assert!(grid.attachments().is_empty());
        assert!(tiles.iter().all(|t| !t.is_attached()));
    }

    #[test]
    fn test_missing_component() {
        let (_, mut tiles) = setup();
        let id = tiles.spawn(spec("red"));
        let err = tiles.get(id).unwrap().movement().unwrap_err();
        assert!(matches!(
            err,
            BlastError::MissingComponent { kind: ComponentKind::Movement, .. }
        ));

        let tile = tiles.get_mut(id).unwrap();
        tile.add_component(Component::Movement(MovementComponent::default()));
        tile.movement_mut().unwrap().speed = 5.0;
        assert_eq!(tile.movement().unwrap().speed, 5.0);
    }

    #[test]
    fn test_dispose_fires_hooks_once() {
        let (mut grid, mut tiles) = setup();
        let mut views = HeadlessViews::default();
        let id = tiles.spawn(spec("red"));
        let cell = grid.cell_by_row_col(2, 0).unwrap();
        tiles.attach(&mut grid, id, cell).unwrap();

        let descriptor = TileDescriptor {
            family: "red".into(),
            texture: ResourceHandle(0),
            scores: 3,
        };
        let handle = views.create_view(&descriptor);
        let tile = tiles.get_mut(id).unwrap();
        tile.add_component(Component::View(ViewComponent { handle }));
        tile.add_component(Component::Scoring(ScoringComponent { scores: 3 }));

        assert_eq!(tiles.dispose(&mut grid, id, &mut views).unwrap(), 3);
        assert!(grid.cell(cell).is_empty());
        assert!(!views.is_live(handle));
        assert!(matches!(
            tiles.dispose(&mut grid, id, &mut views),
            Err(BlastError::UnknownTile(_))
        ));
    }

    #[test]
    fn test_destroy_animation_runs_to_completion() {
        let mut anim = DestroyAnimation::new(0.05, 0.08);
        let mut pos = Vec2::ZERO;
        let mut ticks = 0;
        while !anim.advance(SIM_DT, &mut pos) {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(anim.scale, 0.0);
        assert_eq!(anim.alpha, 0.0);
        assert!(pos.x > 0.0);

        let mut instant = DestroyAnimation::new(0.0, 0.0);
        assert!(instant.is_finished());
        assert!(instant.advance(SIM_DT, &mut pos));
    }
}
