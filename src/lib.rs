//! Tile-grid layout engine for code cities.
//!
//! A repository's files become buildings along streets; each folder is a
//! street branching off its parent's. The pipeline runs one way:
//! records → [`tree::build_tree`] → [`LayoutEngine`] claiming cells on a
//! [`TileGrid`] → [`GeometryEmitter`] producing world-space features.

pub mod building;
pub mod config;
pub mod diff;
pub mod emit;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod logging;
pub mod metrics;
pub mod tree;

pub use building::{Tier, TierPlan, plan_tiers};
pub use config::LayoutConfig;
pub use diff::{FileSetDiff, diff_file_sets, path_set};
pub use emit::{Feature, FeatureCollection, Geometry, GeometryEmitter, Layer, Properties};
pub use engine::{
    Building, Connector, Layout, LayoutEngine, ROOT_STREET_ID, RoadClass, Side, Street,
};
pub use error::{LayoutError, LayoutWarning, Result};
pub use geometry::{Bounds, GridPos, GridRect, Point};
pub use grid::{Cell, CellKind, Crossing, TileGrid, create_l_path, find_free_region};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{LayoutMetrics, MetricSnapshot};
pub use tree::{FileRecord, FolderNode, FolderTree, build_tree, fingerprint};
