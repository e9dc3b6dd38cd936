//! Grid module orchestrator.
//!
//! The occupancy map lives in the private `core` module. `region` and `path`
//! hold the read-only searches layered on top of it: the bounded BFS for free
//! blocks and the L-shaped connector router. Neither of them mutates the grid;
//! the layout engine decides what to claim with the results.

mod core;
pub mod path;
pub mod region;

pub use core::{Cell, CellKind, Crossing, TileGrid};
pub use path::{Route, choose_route, count_conflicts, create_l_path};
pub use region::{RegionSearch, find_free_region, find_free_region_where};
