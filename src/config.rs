use std::path::Path;

use crate::logging::{FileSink, LogEvent, Logger, LoggingResult};

/// Tunables for one layout run.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// World units per grid cell.
    pub cell_size: f64,
    /// Width of every street, in world units.
    pub street_width: f64,
    /// Width of each sidewalk strip flanking a street.
    pub sidewalk_width: f64,
    /// Extent of a building away from its street, in world units.
    pub building_depth: f64,
    /// Gap between a sidewalk's outer edge and the building it serves.
    pub footpath_clearance: f64,
    /// Narrowest tier a building may have.
    pub min_building_width: f64,
    /// Widest tier a building may have.
    pub max_building_width: f64,
    /// Chebyshev radius bounding each free-region search. A search starts
    /// against the parent street, so anything below 2 cannot clear its band.
    pub max_search_radius: i32,
    /// Margin added around the occupied area for the background polygon.
    pub background_margin: f64,
    /// Shortest main street, in cells, regardless of root content.
    pub min_main_street_cells: i32,
    /// Separator between path components in input records.
    pub path_delimiter: char,
    /// When set, emitted coordinates are centred and scaled to fit `[-range, range]`.
    pub normalize_range: Option<f64>,
    /// Optional structured logger used by the engine and emitter.
    pub logger: Option<Logger>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cell_size: 6.0,
            street_width: 6.0,
            sidewalk_width: 1.0,
            building_depth: 6.0,
            footpath_clearance: 1.0,
            min_building_width: 3.0,
            max_building_width: 10.0,
            max_search_radius: 100,
            background_margin: 10.0,
            min_main_street_cells: 10,
            path_delimiter: '/',
            normalize_range: None,
            logger: None,
        }
    }
}

impl LayoutConfig {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Logs to a JSON-lines file at `path`, truncated once it would exceed
    /// `max_bytes` (`0` never truncates).
    pub fn with_log_file(self, path: impl AsRef<Path>, max_bytes: u64) -> LoggingResult<Self> {
        let sink = FileSink::new(path, max_bytes)?;
        Ok(self.with_logger(Logger::new(sink)))
    }

    pub fn with_search_radius(mut self, radius: i32) -> Self {
        self.max_search_radius = radius;
        self
    }

    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_normalization(mut self, range: f64) -> Self {
        self.normalize_range = Some(range);
        self
    }

    /// Forward an event to the configured logger. Sink failures are dropped so
    /// logging can never fail a layout.
    pub(crate) fn emit(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log_event(event);
        }
    }
}
