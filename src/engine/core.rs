use std::time::Instant;

use serde::Serialize;

use crate::building::{Tier, plan_tiers};
use crate::config::LayoutConfig;
use crate::engine::footprint::{
    BAND_CLEARANCE, BAND_HALF_HEIGHT, ChildPlan, Footprint, Side, plan_footprint,
};
use crate::error::{LayoutError, LayoutWarning, Result};
use crate::geometry::{GridPos, GridRect};
use crate::grid::{Route, TileGrid, choose_route, find_free_region_where};
use crate::logging::{LogLevel, TARGET_ENGINE, TARGET_METRICS, event_with_fields, json_kv, json_str};
use crate::metrics::{LayoutMetrics, MetricSnapshot};
use crate::tree::{FileRecord, FolderNode, build_tree, fingerprint, language_hue};

/// Street identifier (and grid owner) of the main street. Folder paths are
/// never empty, so no folder street can share it.
pub const ROOT_STREET_ID: &str = "";

/// The main street is treated as if it had branched downward, so its first
/// file sits below it and its first folder above.
const ROOT_ARRIVAL: Side = Side::Down;

const ROOT_ORIGIN: GridPos = GridPos::new(0, 0);

/// Styling category derived from tree depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadClass {
    Primary,
    Secondary,
    Tertiary,
}

impl RoadClass {
    pub fn from_depth(depth: u32) -> Self {
        match depth {
            0 => RoadClass::Primary,
            1 => RoadClass::Secondary,
            _ => RoadClass::Tertiary,
        }
    }
}

/// A folder's road. Runs along +x from `start` to `end`, both inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Street {
    pub id: String,
    pub name: String,
    /// Folder path; empty for the main street.
    pub path: String,
    pub depth: u32,
    pub start: GridPos,
    pub end: GridPos,
    pub road_class: RoadClass,
    pub file_count: usize,
    pub descendant_count: usize,
    /// Cell on the parent street this street's connector leaves from.
    pub branch_point: Option<GridPos>,
}

impl Street {
    pub fn length(&self) -> i32 {
        self.end.x - self.start.x + 1
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.y == self.start.y && pos.x >= self.start.x && pos.x <= self.end.x
    }
}

/// Road linking a parent's branch point to a child street's first cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub id: String,
    pub parent: String,
    pub child: String,
    pub depth: u32,
    /// Full L path, branch point first and child street start last.
    pub cells: Vec<GridPos>,
    pub horizontal_first: bool,
}

impl Connector {
    pub fn branch_point(&self) -> Option<GridPos> {
        self.cells.first().copied()
    }

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

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub path: String,
    pub name: String,
    /// Id of the street the building faces.
    pub street: String,
    pub depth: u32,
    pub slot: usize,
    pub side: Side,
    /// Ground cells; only these are reserved on the grid.
    pub footprint: GridRect,
    /// Street cell the building faces.
    pub street_cell: GridPos,
    pub record: FileRecord,
    pub hue: u16,
    pub tiers: Vec<Tier>,
}

/// Result of one layout run. Immutable once returned.
#[derive(Debug, Clone)]
pub struct Layout {
    pub root_name: String,
    pub fingerprint: String,
    pub grid: TileGrid,
    pub streets: Vec<Street>,
    pub connectors: Vec<Connector>,
    pub buildings: Vec<Building>,
    pub warnings: Vec<LayoutWarning>,
    /// Bounding rectangle of every claimed cell.
    pub bounds: GridRect,
    pub metrics: MetricSnapshot,
}

impl Layout {
    pub fn street(&self, id: &str) -> Option<&Street> {
        self.streets.iter().find(|s| s.id == id)
    }

    pub fn building(&self, path: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.path == path)
    }

    pub fn main_street(&self) -> Option<&Street> {
        self.street(ROOT_STREET_ID)
    }

    /// Connector that leads into the street with the given id.
    pub fn connector_into(&self, street_id: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.child == street_id)
    }
}

/// Everything a run accumulates besides the grid.
#[derive(Debug, Default)]
struct Registry {
    streets: Vec<Street>,
    connectors: Vec<Connector>,
    buildings: Vec<Building>,
    warnings: Vec<LayoutWarning>,
    metrics: LayoutMetrics,
}

/// Lays out a repository as streets and buildings on a fresh [`TileGrid`].
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Computes a complete layout, or fails as a whole if any folder cannot be placed.
    pub fn layout(&self, records: &[FileRecord], root_name: &str) -> Result<Layout> {
        let started = Instant::now();
        let config = &self.config;
        let digest = fingerprint(records, root_name);
        let tree = build_tree(records, root_name, config);

        config.emit(event_with_fields(
            LogLevel::Info,
            TARGET_ENGINE,
            "layout_started",
            [
                json_str("root", root_name),
                json_kv("records", records.len()),
                json_str("fingerprint", digest.clone()),
            ],
        ));

        let mut grid = TileGrid::new(config.cell_size);
        let mut registry = Registry {
            warnings: tree.warnings.clone(),
            ..Registry::default()
        };

        let footprint = plan_footprint(&tree.root, ROOT_ARRIVAL, config.min_main_street_cells);
        let result = self.place_folder(
            &mut grid,
            &mut registry,
            &tree.root,
            &footprint,
            ROOT_ARRIVAL,
            ROOT_ORIGIN,
            None,
        );
        let bounds = match result {
            Ok(bounds) => bounds,
            Err(err) => {
                config.emit(event_with_fields(
                    LogLevel::Error,
                    TARGET_ENGINE,
                    "layout_failed",
                    [json_str("error", err.to_string())],
                ));
                return Err(err);
            }
        };

        registry.metrics.record_warnings(registry.warnings.len());
        let metrics = registry.metrics.snapshot(started.elapsed());
        config.emit(metrics.to_log_event(TARGET_METRICS));
        config.emit(event_with_fields(
            LogLevel::Info,
            TARGET_ENGINE,
            "layout_completed",
            [
                json_kv("streets", registry.streets.len()),
                json_kv("buildings", registry.buildings.len()),
                json_kv("warnings", registry.warnings.len()),
            ],
        ));

        Ok(Layout {
            root_name: root_name.to_string(),
            fingerprint: digest,
            grid,
            streets: registry.streets,
            connectors: registry.connectors,
            buildings: registry.buildings,
            warnings: registry.warnings,
            bounds,
            metrics,
        })
    }

    /// Claims a folder's street, buildings and sidewalk band, then places each
    /// subfolder in slot order. Returns the cells the subtree was planned into.
    #[allow(clippy::too_many_arguments)]
    fn place_folder(
        &self,
        grid: &mut TileGrid,
        registry: &mut Registry,
        folder: &FolderNode,
        footprint: &Footprint,
        arrival: Side,
        start: GridPos,
        branch_point: Option<GridPos>,
    ) -> Result<GridRect> {
        let id = street_id(folder);
        let depth = folder.depth;

        let road: Vec<GridPos> = (0..footprint.street_len)
            .map(|dx| start.offset(dx, 0))
            .collect();
        if !grid.place_road(&road, &id, depth) {
            return Err(LayoutError::PlacementConflict { owner: id });
        }

        let street = Street {
            id: id.clone(),
            name: folder.name.clone(),
            path: folder.path.clone(),
            depth,
            start,
            end: start.offset(footprint.street_len - 1, 0),
            road_class: RoadClass::from_depth(depth),
            file_count: folder.file_count(),
            descendant_count: folder.descendant_count(),
            branch_point,
        };

        self.place_buildings(grid, registry, folder, &street, &footprint.offsets, arrival)?;

        let exits: Vec<GridPos> = footprint
            .children
            .iter()
            .flat_map(|plan| {
                let column = start.x + plan.branch_offset;
                (1..=BAND_HALF_HEIGHT)
                    .map(move |step| GridPos::new(column, start.y + plan.side.sign() * step))
            })
            .collect();
        let band = GridRect::new(
            start.x,
            start.y - BAND_HALF_HEIGHT,
            footprint.street_len,
            2 * BAND_HALF_HEIGHT + 1,
        );
        grid.reserve(
            band.cells().filter(|cell| !exits.contains(cell)),
            &id,
            depth,
        );

        self.config.emit(event_with_fields(
            LogLevel::Debug,
            TARGET_ENGINE,
            "folder_placed",
            [
                json_str("street", id.clone()),
                json_kv("depth", depth),
                json_kv("x", start.x),
                json_kv("y", start.y),
                json_kv("length", footprint.street_len),
                json_kv("files", folder.file_count()),
            ],
        ));
        registry.metrics.record_folder();
        registry.streets.push(street.clone());

        let mut bounds = band;
        for plan in &footprint.children {
            let Some(child) = folder.folders.get(plan.slot) else {
                continue;
            };
            let child_bounds = self.attach_child(grid, registry, &street, child, plan)?;
            bounds = bounds.union(child_bounds);
        }
        Ok(bounds)
    }

    fn place_buildings(
        &self,
        grid: &mut TileGrid,
        registry: &mut Registry,
        folder: &FolderNode,
        street: &Street,
        offsets: &[i32],
        arrival: Side,
    ) -> Result<()> {
        let config = &self.config;
        for ((slot, file), &offset) in folder.files.iter().enumerate().zip(offsets) {
            let side = Side::for_file(arrival, slot);
            let street_cell = street.start.offset(offset, 0);
            let corner = match side {
                Side::Down => street_cell.offset(0, 1),
                Side::Up => street_cell.offset(0, -BAND_HALF_HEIGHT),
            };
            let footprint = GridRect::new(corner.x, corner.y, 1, BAND_HALF_HEIGHT);
            if !grid.place_building(corner, &file.path, street.depth, 1, BAND_HALF_HEIGHT) {
                return Err(LayoutError::PlacementConflict {
                    owner: file.path.clone(),
                });
            }

            let record = &file.record;
            let plan = plan_tiers(
                record.lines_of_code,
                &record.line_lengths,
                record.avg_line_length,
                config.min_building_width,
                config.max_building_width,
            );
            if plan.degenerate_width {
                let warning = LayoutWarning::DegenerateGeometry {
                    path: file.path.clone(),
                    detail: format!("tier width clamped to {}", config.min_building_width),
                };
                config.emit(event_with_fields(
                    LogLevel::Warn,
                    TARGET_ENGINE,
                    "degenerate_geometry",
                    [
                        json_str("path", file.path.clone()),
                        json_str("reason", warning.to_string()),
                    ],
                ));
                registry.warnings.push(warning);
            }

            registry.metrics.record_building(plan.tiers.len());
            registry.buildings.push(Building {
                path: file.path.clone(),
                name: file.name.clone(),
                street: street.id.clone(),
                depth: street.depth,
                slot,
                side,
                footprint,
                street_cell,
                hue: language_hue(&record.language),
                record: record.clone(),
                tiers: plan.tiers,
            });
        }
        Ok(())
    }

    /// Finds room for a subfolder's subtree next to its branch point, routes
    /// the connector and recurses.
    ///
    /// The search starts with the subtree touching the parent street and walks
    /// outward. Only anchors past the parent's band are accepted, so the radius
    /// must reach at least `BAND_CLEARANCE - 1` cells.
    fn attach_child(
        &self,
        grid: &mut TileGrid,
        registry: &mut Registry,
        parent: &Street,
        child: &FolderNode,
        plan: &ChildPlan,
    ) -> Result<GridRect> {
        let footprint = &plan.footprint;
        let depth = child.depth;
        let branch = parent.start.offset(plan.branch_offset, 0);
        let height = footprint.height();
        let origin = match plan.side {
            Side::Down => branch.offset(0, 1),
            Side::Up => branch.offset(0, -height),
        };
        let radius = self.config.max_search_radius;

        let mut route: Option<Route> = None;
        let search = find_free_region_where(
            grid,
            origin,
            footprint.width,
            height,
            radius,
            |anchor| {
                let clears_band = match plan.side {
                    Side::Down => anchor.y >= branch.y + BAND_CLEARANCE,
                    Side::Up => anchor.y + height - 1 <= branch.y - BAND_CLEARANCE,
                };
                if !clears_band || anchor.x < branch.x {
                    return false;
                }
                let start = GridPos::new(anchor.x, anchor.y + footprint.up);
                let rect = footprint.rect(start);
                let candidate = choose_route(grid, branch, start, depth, |pos| {
                    blocks_connector(pos, branch, start, rect, parent)
                });
                if candidate.is_clear() {
                    route = Some(candidate);
                    true
                } else {
                    false
                }
            },
        );
        registry.metrics.record_region_probes(search.probes);

        let (Some(anchor), Some(route)) = (search.anchor, route) else {
            return Err(LayoutError::LayoutOverflow {
                folder: child.path.clone(),
                width: footprint.width,
                height,
                radius,
            });
        };
        let start = GridPos::new(anchor.x, anchor.y + footprint.up);

        // The child street claims its own first cell.
        let connector_id = format!("{}>{}", parent.id, child.path);
        let crossings_before = grid.crossings().len();
        let cells = &route.cells[..route.cells.len().saturating_sub(1)];
        if !grid.place_road(cells, &connector_id, depth) {
            return Err(LayoutError::PlacementConflict {
                owner: connector_id,
            });
        }
        registry
            .metrics
            .record_connector(grid.crossings().len() - crossings_before);
        registry.connectors.push(Connector {
            id: connector_id,
            parent: parent.id.clone(),
            child: child.path.clone(),
            depth,
            cells: route.cells,
            horizontal_first: route.horizontal_first,
        });

        self.place_folder(
            grid,
            registry,
            child,
            footprint,
            plan.side,
            start,
            Some(branch),
        )
    }
}

fn street_id(folder: &FolderNode) -> String {
    if folder.is_root() {
        ROOT_STREET_ID.to_string()
    } else {
        folder.path.clone()
    }
}

/// A connector may only touch its parent street at its own branch point, and
/// may only enter the child's rectangle along the child street's first column.
fn blocks_connector(
    pos: GridPos,
    branch: GridPos,
    start: GridPos,
    rect: GridRect,
    parent: &Street,
) -> bool {
    (rect.contains(pos) && pos.x != start.x) || (pos != branch && parent.contains(pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> LayoutEngine {
        LayoutEngine::new(LayoutConfig::default())
    }

    fn records(paths: &[&str]) -> Vec<FileRecord> {
        paths.iter().map(|p| FileRecord::new(*p, 20)).collect()
    }

    #[test]
    fn road_class_follows_depth() {
        assert_eq!(RoadClass::from_depth(0), RoadClass::Primary);
        assert_eq!(RoadClass::from_depth(1), RoadClass::Secondary);
        assert_eq!(RoadClass::from_depth(5), RoadClass::Tertiary);
    }

    #[test]
    fn empty_input_yields_main_street_only() {
        let layout = engine().layout(&[], "empty").unwrap();
        assert_eq!(layout.streets.len(), 1);
        let main = layout.main_street().unwrap();
        assert_eq!(main.name, "empty");
        assert_eq!(main.length(), 10);
        assert!(layout.buildings.is_empty());
        assert!(layout.connectors.is_empty());
    }

    #[test]
    fn root_files_alternate_sides_along_main_street() {
        let layout = engine()
            .layout(&records(&["a.rs", "b.rs", "c.rs"]), "repo")
            .unwrap();
        let sides: Vec<Side> = layout.buildings.iter().map(|b| b.side).collect();
        assert_eq!(sides, vec![Side::Down, Side::Up, Side::Down]);

        let columns: Vec<i32> = layout.buildings.iter().map(|b| b.footprint.x).collect();
        assert_eq!(columns, vec![2, 4, 6]);
        assert_eq!(layout.buildings[0].footprint, GridRect::new(2, 1, 1, 2));
        assert_eq!(layout.buildings[1].footprint, GridRect::new(4, -2, 1, 2));
    }

    #[test]
    fn child_street_sits_where_footprint_planned_it() {
        let layout = engine()
            .layout(&records(&["src/a.rs", "src/b.rs"]), "repo")
            .unwrap();
        let src = layout.street("src").unwrap();
        assert_eq!(src.depth, 1);
        assert_eq!(src.road_class, RoadClass::Secondary);
        assert_eq!(src.branch_point, Some(GridPos::new(2, 0)));
        // First subfolder of the main street goes up, past a two-row band.
        assert_eq!(src.start, GridPos::new(2, -5));
        assert_eq!(src.length(), 6);

        let connector = layout.connector_into("src").unwrap();
        assert_eq!(connector.id, ">src");
        assert_eq!(connector.parent, ROOT_STREET_ID);
        assert_eq!(connector.cells.first(), Some(&GridPos::new(2, 0)));
        assert_eq!(connector.cells.last(), Some(&src.start));
        assert_eq!(connector.cells.len(), 6);
        assert_eq!(connector.bend(), None);
    }

    #[test]
    fn overflow_when_no_region_within_radius() {
        let engine = LayoutEngine::new(LayoutConfig::default().with_search_radius(1));
        let tree = build_tree(&records(&["src/a.rs"]), "repo", engine.config());
        let footprint = plan_footprint(&tree.root, ROOT_ARRIVAL, 10);
        let parent = Street {
            id: ROOT_STREET_ID.to_string(),
            name: "repo".to_string(),
            path: String::new(),
            depth: 0,
            start: ROOT_ORIGIN,
            end: GridPos::new(9, 0),
            road_class: RoadClass::Primary,
            file_count: 0,
            descendant_count: 1,
            branch_point: None,
        };

        let mut grid = TileGrid::new(6.0);
        grid.reserve(GridRect::new(-20, -20, 40, 40).cells(), "wall", 0);
        let mut registry = Registry::default();
        let err = engine
            .attach_child(
                &mut grid,
                &mut registry,
                &parent,
                &tree.root.folders[0],
                &footprint.children[0],
            )
            .unwrap_err();

        assert!(matches!(
            err,
            LayoutError::LayoutOverflow { ref folder, radius: 1, .. } if folder == "src"
        ));
        assert!(registry.connectors.is_empty());
        assert_eq!(registry.metrics.snapshot(Default::default()).region_probes, 9);
    }

    #[test]
    fn search_radius_must_reach_past_the_band() {
        let input = records(&["src/a.rs"]);
        let tight = LayoutConfig::default().with_search_radius(BAND_CLEARANCE - 2);
        assert!(matches!(
            LayoutEngine::new(tight).layout(&input, "repo"),
            Err(LayoutError::LayoutOverflow { ref folder, .. }) if folder == "src"
        ));

        let enough = LayoutConfig::default().with_search_radius(BAND_CLEARANCE - 1);
        let layout = LayoutEngine::new(enough).layout(&input, "repo").unwrap();
        assert_eq!(layout.street("src").unwrap().start, GridPos::new(2, -5));
    }

    #[test]
    fn degenerate_widths_are_clamped_and_reported() {
        let input = vec![FileRecord::new("empty.rs", 0).with_line_lengths(vec![0, 0])];
        let layout = engine().layout(&input, "repo").unwrap();
        let building = layout.building("empty.rs").unwrap();
        assert_eq!(building.tiers[0].width, 3.0);
        assert!(matches!(
            layout.warnings.as_slice(),
            [LayoutWarning::DegenerateGeometry { .. }]
        ));
        assert_eq!(layout.metrics.warnings, 1);
    }
}
