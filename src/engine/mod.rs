//! Layout engine orchestrator.
//!
//! `footprint` plans how much room each subtree needs before anything is
//! placed; `core` walks the folder tree depth-first and claims grid cells for
//! streets, connectors, buildings and sidewalk bands.

mod core;
pub mod footprint;

pub use core::{
    Building, Connector, Layout, LayoutEngine, ROOT_STREET_ID, RoadClass, Street,
};
pub use footprint::{Footprint, Side, plan_footprint};
