use std::collections::BTreeMap;

use crate::geometry::{GridPos, GridRect, Point};

/// What occupies a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Road,
    Building,
    /// Held back from placement without being drawn (a street's unused sidewalk band).
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    pub owner: String,
    pub depth: u32,
}

/// A road cell that was painted over by a road one level apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub pos: GridPos,
    pub previous_owner: String,
    pub previous_depth: u32,
    pub owner: String,
    pub depth: u32,
}

/// Occupancy map for one layout run.
///
/// Cells only appear through the `place_*`/`reserve` calls. Every placement is
/// all-or-nothing: a rejected call leaves the grid exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    cell_size: f64,
    cells: BTreeMap<GridPos, Cell>,
    crossings: Vec<Crossing>,
}

impl TileGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: BTreeMap::new(),
            crossings: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn get(&self, pos: GridPos) -> Option<&Cell> {
        self.cells.get(&pos)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells ordered by `x`, then `y`.
    pub fn cells(&self) -> impl Iterator<Item = (GridPos, &Cell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    pub fn crossings(&self) -> &[Crossing] {
        &self.crossings
    }

    pub fn can_place_building(&self, pos: GridPos) -> bool {
        !self.cells.contains_key(&pos)
    }

    /// True when every cell of `rect` is empty.
    pub fn is_region_free(&self, rect: GridRect) -> bool {
        rect.cells().all(|pos| self.can_place_building(pos))
    }

    pub fn place_building(
        &mut self,
        pos: GridPos,
        owner: &str,
        depth: u32,
        width_cells: i32,
        height_cells: i32,
    ) -> bool {
        let footprint = GridRect::new(pos.x, pos.y, width_cells.max(1), height_cells.max(1));
        if !self.is_region_free(footprint) {
            return false;
        }
        for cell in footprint.cells() {
            self.cells.insert(
                cell,
                Cell {
                    kind: CellKind::Building,
                    owner: owner.to_string(),
                    depth,
                },
            );
        }
        true
    }

    /// Empty cells accept any road; an existing road accepts a road exactly one
    /// level above or below it. Buildings and reserved cells never do.
    pub fn can_place_road(&self, pos: GridPos, depth: u32) -> bool {
        match self.cells.get(&pos) {
            None => true,
            Some(cell) => cell.kind == CellKind::Road && cell.depth.abs_diff(depth) == 1,
        }
    }

    pub fn place_road(&mut self, cells: &[GridPos], owner: &str, depth: u32) -> bool {
        if !cells.iter().all(|pos| self.can_place_road(*pos, depth)) {
            return false;
        }
        for pos in cells {
            let previous = self.cells.insert(
                *pos,
                Cell {
                    kind: CellKind::Road,
                    owner: owner.to_string(),
                    depth,
                },
            );
            if let Some(previous) = previous {
                if previous.owner != owner {
                    self.crossings.push(Crossing {
                        pos: *pos,
                        previous_owner: previous.owner,
                        previous_depth: previous.depth,
                        owner: owner.to_string(),
                        depth,
                    });
                }
            }
        }
        true
    }

    /// Claims the empty cells among `cells` as reserved. Returns how many were claimed.
    pub fn reserve(&mut self, cells: impl IntoIterator<Item = GridPos>, owner: &str, depth: u32) -> usize {
        let mut claimed = 0;
        for pos in cells {
            if self.can_place_building(pos) {
                self.cells.insert(
                    pos,
                    Cell {
                        kind: CellKind::Reserved,
                        owner: owner.to_string(),
                        depth,
                    },
                );
                claimed += 1;
            }
        }
        claimed
    }

    /// World coordinate of the cell's top-left corner.
    pub fn grid_to_world(&self, x: i32, y: i32) -> Point {
        Point::new(x as f64 * self.cell_size, y as f64 * self.cell_size)
    }

    /// World coordinate of the cell's centre.
    pub fn cell_center(&self, pos: GridPos) -> Point {
        let corner = self.grid_to_world(pos.x, pos.y);
        Point::new(corner.x + self.cell_size / 2.0, corner.y + self.cell_size / 2.0)
    }

    /// The cell containing a world coordinate.
    pub fn world_to_grid(&self, x: f64, y: f64) -> GridPos {
        GridPos::new(
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Smallest rectangle covering every occupied cell.
    pub fn occupied_rect(&self) -> Option<GridRect> {
        let mut keys = self.cells.keys();
        let first = keys.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for pos in keys {
            min_x = min_x.min(pos.x);
            min_y = min_y.min(pos.y);
            max_x = max_x.max(pos.x);
            max_y = max_y.max(pos.y);
        }
        Some(GridRect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }
}
