use std::collections::{BTreeSet, VecDeque};

use crate::geometry::{GridPos, GridRect};
use crate::grid::TileGrid;

/// Outcome of a bounded search: the anchor found (if any) and how many
/// candidate anchors were examined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSearch {
    pub anchor: Option<GridPos>,
    pub probes: usize,
}

/// Breadth-first search from `start` for the nearest top-left anchor whose
/// `width x height` block is entirely empty.
pub fn find_free_region(
    grid: &TileGrid,
    start: GridPos,
    width: i32,
    height: i32,
    max_radius: i32,
) -> Option<GridPos> {
    find_free_region_where(grid, start, width, height, max_radius, |_| true).anchor
}

/// Same search, but an anchor is only accepted when `accept` also approves it.
///
/// Coordinates beyond `max_radius` (Chebyshev) are never visited, so the
/// search is bounded by `(2 * max_radius + 1)^2` probes.
pub fn find_free_region_where<F>(
    grid: &TileGrid,
    start: GridPos,
    width: i32,
    height: i32,
    max_radius: i32,
    mut accept: F,
) -> RegionSearch
where
    F: FnMut(GridPos) -> bool,
{
    let width = width.max(1);
    let height = height.max(1);
    let mut queue = VecDeque::from([start]);
    let mut visited = BTreeSet::from([start]);
    let mut probes = 0;

    while let Some(pos) = queue.pop_front() {
        probes += 1;
        if grid.is_region_free(GridRect::new(pos.x, pos.y, width, height)) && accept(pos) {
            return RegionSearch {
                anchor: Some(pos),
                probes,
            };
        }

        for next in pos.neighbors() {
            if next.chebyshev(start) <= max_radius && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    RegionSearch {
        anchor: None,
        probes,
    }
}
