use crate::geometry::GridPos;
use crate::grid::TileGrid;

/// Orthogonal path between two cells with a single bend.
///
/// The path runs along x first when `horizontal_first`, otherwise along y,
/// and always contains `|dx| + |dy| + 1` cells from `start` to `end`
/// inclusive. Aligned endpoints collapse to a straight line.
pub fn create_l_path(start: GridPos, end: GridPos, horizontal_first: bool) -> Vec<GridPos> {
    let mut cells = Vec::with_capacity(((end.x - start.x).abs() + (end.y - start.y).abs() + 1) as usize);
    let step_x = (end.x - start.x).signum();
    let step_y = (end.y - start.y).signum();
    let mut cursor = start;
    cells.push(cursor);

    if horizontal_first {
        while cursor.x != end.x {
            cursor.x += step_x;
            cells.push(cursor);
        }
        while cursor.y != end.y {
            cursor.y += step_y;
            cells.push(cursor);
        }
    } else {
        while cursor.y != end.y {
            cursor.y += step_y;
            cells.push(cursor);
        }
        while cursor.x != end.x {
            cursor.x += step_x;
            cells.push(cursor);
        }
    }

    cells
}

/// Cells of `path` a road at `depth` could not legally claim, plus any the
/// caller marks as `blocked`.
pub fn count_conflicts<B>(grid: &TileGrid, path: &[GridPos], depth: u32, blocked: B) -> usize
where
    B: Fn(GridPos) -> bool,
{
    path.iter()
        .filter(|pos| !grid.can_place_road(**pos, depth) || blocked(**pos))
        .count()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub cells: Vec<GridPos>,
    pub horizontal_first: bool,
    pub conflicts: usize,
}

impl Route {
    pub fn is_clear(&self) -> bool {
        self.conflicts == 0
    }

    /// Grid cell where the path turns, if it turns at all.
    pub fn bend(&self) -> Option<GridPos> {
        let first = *self.cells.first()?;
        let last = *self.cells.last()?;
        if first.x == last.x || first.y == last.y {
            return None;
        }
        Some(if self.horizontal_first {
            GridPos::new(last.x, first.y)
        } else {
            GridPos::new(first.x, last.y)
        })
    }
}

/// Evaluates both bend orders and keeps the one with fewer conflicts,
/// preferring horizontal-first on a tie.
pub fn choose_route<B>(grid: &TileGrid, start: GridPos, end: GridPos, depth: u32, blocked: B) -> Route
where
    B: Fn(GridPos) -> bool,
{
    let horizontal = create_l_path(start, end, true);
    let horizontal_conflicts = count_conflicts(grid, &horizontal, depth, &blocked);
    if horizontal_conflicts == 0 {
        return Route {
            cells: horizontal,
            horizontal_first: true,
            conflicts: 0,
        };
    }

    let vertical = create_l_path(start, end, false);
    let vertical_conflicts = count_conflicts(grid, &vertical, depth, &blocked);
    if vertical_conflicts < horizontal_conflicts {
        Route {
            cells: vertical,
            horizontal_first: false,
            conflicts: vertical_conflicts,
        }
    } else {
        Route {
            cells: horizontal,
            horizontal_first: true,
            conflicts: horizontal_conflicts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_path_shape(start: GridPos, end: GridPos, path: &[GridPos]) {
        let expected = (end.x - start.x).abs() + (end.y - start.y).abs() + 1;
        assert_eq!(path.len() as i32, expected);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        for pair in path.windows(2) {
            let step = (pair[1].x - pair[0].x).abs() + (pair[1].y - pair[0].y).abs();
            assert_eq!(step, 1, "non-adjacent step {:?}", pair);
        }
    }

    #[test]
    fn l_path_length_and_endpoints() {
        let cases = [
            (GridPos::new(0, 0), GridPos::new(4, 3)),
            (GridPos::new(5, -2), GridPos::new(-3, 6)),
            (GridPos::new(1, 1), GridPos::new(1, -4)),
            (GridPos::new(2, 7), GridPos::new(9, 7)),
            (GridPos::new(3, 3), GridPos::new(3, 3)),
        ];
        for (start, end) in cases {
            for horizontal_first in [true, false] {
                let path = create_l_path(start, end, horizontal_first);
                assert_path_shape(start, end, &path);
            }
        }
    }

    #[test]
    fn bend_order_changes_corner() {
        let start = GridPos::new(0, 0);
        let end = GridPos::new(2, 2);
        assert_eq!(create_l_path(start, end, true)[2], GridPos::new(2, 0));
        assert_eq!(create_l_path(start, end, false)[2], GridPos::new(0, 2));
    }

    #[test]
    fn choose_route_prefers_horizontal_on_tie() {
        let grid = TileGrid::new(6.0);
        let route = choose_route(&grid, GridPos::new(0, 0), GridPos::new(3, 3), 1, |_| false);
        assert!(route.horizontal_first);
        assert!(route.is_clear());
        assert_eq!(route.bend(), Some(GridPos::new(3, 0)));
    }

    #[test]
    fn choose_route_avoids_conflicts() {
        let mut grid = TileGrid::new(6.0);
        assert!(grid.place_building(GridPos::new(2, 0), "blocker.rs", 0, 1, 1));

        let route = choose_route(&grid, GridPos::new(0, 0), GridPos::new(3, 3), 1, |_| false);
        assert!(!route.horizontal_first);
        assert!(route.is_clear());

        let blocked = choose_route(&grid, GridPos::new(0, 0), GridPos::new(3, 3), 1, |pos| {
            pos.x == 0 && pos.y == 2
        });
        assert_eq!(blocked.conflicts, 1);
        assert!(blocked.horizontal_first);
    }
}
