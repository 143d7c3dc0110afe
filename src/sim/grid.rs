//! Fixed spatial partition of the play field
//!
//! Cells live in a flat arena stored column-major, so a column is a contiguous
//! slice ordered top-to-bottom. Adjacency is computed once at construction;
//! only the occupancy slots change afterwards.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Aabb;
use super::tile::TileId;
use crate::error::{BlastError, Result};

/// Index of a cell in the grid arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(pub usize);

/// Which neighbours to follow from a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// Up, down, left, right
    Orthogonal,
    /// Orthogonal plus the four diagonals
    All,
}

/// Grid construction options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridOptions {
    pub cols: usize,
    pub rows: usize,
    pub width: f32,
    pub height: f32,
    /// Off-grid buffer above row 0 where spawned tiles stay visible
    pub top_padding: f32,
}

/// One slot of the partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub row: usize,
    pub col: usize,
    /// Top-left corner in grid-local pixels
    pub position: Vec2,
    pub aabb: Aabb,
    /// Orthogonal neighbours first, then diagonals
    neighbors: Vec<CellId>,
    orthogonal_count: usize,
    /// Occupant (back-reference only, the registry owns tiles)
    pub tile: Option<TileId>,
}

impl Cell {
    pub fn neighbors(&self, neighborhood: Neighborhood) -> &[CellId] {
        match neighborhood {
            Neighborhood::Orthogonal => &self.neighbors[..self.orthogonal_count],
            Neighborhood::All => &self.neighbors,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tile.is_none()
    }
}

/// The play field grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    pub cols: usize,
    pub rows: usize,
    pub width: f32,
    pub height: f32,
    pub top_padding: f32,
    cell_size: Vec2,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(options: GridOptions) -> Result<Self> {
        let GridOptions {
            cols,
            rows,
            width,
            height,
            top_padding,
        } = options;

        if cols == 0 || rows == 0 {
            return Err(BlastError::InvalidConfig(format!(
                "grid must have at least one row and column, got {cols}x{rows}"
            )));
        }
        if !(width > 0.0 && height > 0.0) {
            return Err(BlastError::InvalidConfig(format!(
                "grid size must be positive, got {width}x{height}"
            )));
        }

        let mut grid = Self {
            cols,
            rows,
            width,
            height,
            top_padding,
            cell_size: Vec2::new(width / cols as f32, height / rows as f32),
            cells: Vec::with_capacity(cols * rows),
        };
        grid.create();
        Ok(grid)
    }

    fn create(&mut self) {
        let (cols, rows) = (self.cols, self.rows);
        let cell_size = self.cell_size;

        // By columns, rows top-to-bottom
        for col in 0..cols {
            for row in 0..rows {
                let id = CellId(self.index(row, col));
                let position = Vec2::new(col as f32 * cell_size.x, row as f32 * cell_size.y);

                let row = row as isize;
                let col_i = col as isize;
                let orthogonal = [(row - 1, col_i), (row + 1, col_i), (row, col_i - 1), (row, col_i + 1)];
                let diagonal = [
                    (row - 1, col_i - 1),
                    (row - 1, col_i + 1),
                    (row + 1, col_i - 1),
                    (row + 1, col_i + 1),
                ];

                let mut neighbors: Vec<CellId> = orthogonal
                    .iter()
                    .filter_map(|&(r, c)| self.checked_id(r, c))
                    .collect();
                let orthogonal_count = neighbors.len();
                neighbors.extend(diagonal.iter().filter_map(|&(r, c)| self.checked_id(r, c)));

                self.cells.push(Cell {
                    id,
                    row: row as usize,
                    col,
                    position,
                    aabb: Aabb::from_position_size(position, cell_size),
                    neighbors,
                    orthogonal_count,
                    tile: None,
                });
            }
        }
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        col * self.rows + row
    }

    /// Border-checked arena id
    fn checked_id(&self, row: isize, col: isize) -> Option<CellId> {
        if row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.cols {
            return None;
        }
        Some(CellId(self.index(row as usize, col as usize)))
    }

    #[inline]
    pub fn cell_width(&self) -> f32 {
        self.cell_size.x
    }

    #[inline]
    pub fn cell_height(&self) -> f32 {
        self.cell_size.y
    }

    #[inline]
    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    /// Panics on an id from another grid; ids are only minted by this grid
    #[inline]
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    #[inline]
    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.0]
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells of one column, top-to-bottom
    pub fn column(&self, col: usize) -> &[Cell] {
        let start = col * self.rows;
        &self.cells[start..start + self.rows]
    }

    pub fn cell_by_row_col(&self, row: usize, col: usize) -> Option<CellId> {
        (row < self.rows && col < self.cols).then(|| CellId(self.index(row, col)))
    }

    /// Map a grid-local point to a cell. Points outside the grid are `None`.
    pub fn cell_by_coords(&self, x: f32, y: f32) -> Option<CellId> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let col = (x / self.cell_size.x).floor();
        let row = (y / self.cell_size.y).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        self.cell_by_row_col(row as usize, col as usize)
    }

    pub fn neighbors(&self, id: CellId, neighborhood: Neighborhood) -> &[CellId] {
        self.cell(id).neighbors(neighborhood)
    }

    pub fn for_each_cell(&self, mut traverser: impl FnMut(&Cell)) {
        for cell in &self.cells {
            traverser(cell);
        }
    }

    pub fn for_each_column(&self, mut traverser: impl FnMut(&[Cell], usize)) {
        for col in 0..self.cols {
            traverser(self.column(col), col);
        }
    }

    /// Empty every occupancy slot; tiles themselves are untouched
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.tile = None;
        }
    }

    /// Occupants in traversal order
    pub fn attachments(&self) -> Vec<TileId> {
        self.cells.iter().filter_map(|c| c.tile).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(cols: usize, rows: usize) -> Grid {
        Grid::new(GridOptions {
            cols,
            rows,
            width: cols as f32 * 10.0,
            height: rows as f32 * 20.0,
            top_padding: 0.0,
        })
        .unwrap()
    }

    #[test]
    fn test_cell_layout() {
        let grid = grid(3, 4);
        assert_eq!(grid.cells().len(), 12);
        assert_eq!(grid.cell_width(), 10.0);
        assert_eq!(grid.cell_height(), 20.0);

        let id = grid.cell_by_row_col(2, 1).unwrap();
        let cell = grid.cell(id);
        assert_eq!((cell.row, cell.col), (2, 1));
        assert_eq!(cell.position, Vec2::new(10.0, 40.0));
        assert_eq!(cell.aabb.max, Vec2::new(20.0, 60.0));
    }

    #[test]
    fn test_neighbor_counts() {
        let grid = grid(3, 3);
        let corner = grid.cell_by_row_col(0, 0).unwrap();
        let edge = grid.cell_by_row_col(0, 1).unwrap();
        let middle = grid.cell_by_row_col(1, 1).unwrap();

        assert_eq!(grid.neighbors(corner, Neighborhood::Orthogonal).len(), 2);
        assert_eq!(grid.neighbors(corner, Neighborhood::All).len(), 3);
        assert_eq!(grid.neighbors(edge, Neighborhood::Orthogonal).len(), 3);
        assert_eq!(grid.neighbors(edge, Neighborhood::All).len(), 5);
        assert_eq!(grid.neighbors(middle, Neighborhood::Orthogonal).len(), 4);
        assert_eq!(grid.neighbors(middle, Neighborhood::All).len(), 8);
    }

    #[test]
    fn test_orthogonal_neighbors_are_adjacent() {
        let grid = grid(4, 4);
        for cell in grid.cells() {
            for &n in cell.neighbors(Neighborhood::Orthogonal) {
                let other = grid.cell(n);
                let dist = cell.row.abs_diff(other.row) + cell.col.abs_diff(other.col);
                assert_eq!(dist, 1);
            }
        }
    }

    #[test]
    fn test_cell_by_coords() {
        let grid = grid(3, 3);
        assert_eq!(grid.cell_by_coords(0.0, 0.0), grid.cell_by_row_col(0, 0));
        assert_eq!(grid.cell_by_coords(25.0, 45.0), grid.cell_by_row_col(2, 2));
        assert_eq!(grid.cell_by_coords(-0.5, 10.0), None);
        assert_eq!(grid.cell_by_coords(30.0, 10.0), None);
        assert_eq!(grid.cell_by_coords(5.0, 60.0), None);
        assert_eq!(grid.cell_by_coords(f32::NAN, 5.0), None);
    }

    #[test]
    fn test_traversal_is_col_major() {
        let grid = grid(2, 3);
        let mut order = Vec::new();
        grid.for_each_cell(|cell| order.push((cell.col, cell.row)));
        assert_eq!(order, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);

        let mut columns = Vec::new();
        grid.for_each_column(|column, col| {
            assert!(column.iter().all(|c| c.col == col));
            columns.push(column.len());
        });
        assert_eq!(columns, vec![3, 3]);
    }

    #[test]
    fn test_clear() {
        let mut grid = grid(2, 2);
        let id = grid.cell_by_row_col(1, 1).unwrap();
        grid.cell_mut(id).tile = Some(TileId(7));
        assert_eq!(grid.attachments(), vec![TileId(7)]);
        grid.clear();
        assert!(grid.attachments().is_empty());
    }

    #[test]
    fn test_invalid_dimensions() {
        let err = Grid::new(GridOptions {
            cols: 0,
            rows: 3,
            width: 10.0,
            height: 10.0,
            top_padding: 0.0,
        })
        .unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Config);
    }
}
