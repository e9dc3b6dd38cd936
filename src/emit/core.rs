use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::LayoutConfig;
use crate::engine::{Building, Connector, Layout, RoadClass, Street};
use crate::geometry::{Bounds, Point};
use crate::grid::TileGrid;
use crate::logging::{LogLevel, TARGET_EMIT, event_with_fields, json_kv};

/// Sideways nudge of a footpath's control point, in world units.
const FOOTPATH_BEND: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Background,
    Streets,
    Buildings,
    Sidewalks,
    Footpaths,
}

impl Layer {
    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Background => "background",
            Layer::Streets => "streets",
            Layer::Buildings => "buildings",
            Layer::Sidewalks => "sidewalks",
            Layer::Footpaths => "footpaths",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    LineString(Vec<Point>),
    /// Closed outer ring: the last point repeats the first.
    Polygon(Vec<Point>),
}

impl Geometry {
    pub fn points(&self) -> &[Point] {
        match self {
            Geometry::LineString(points) | Geometry::Polygon(points) => points,
        }
    }

    fn points_mut(&mut self) -> &mut [Point] {
        match self {
            Geometry::LineString(points) | Geometry::Polygon(points) => points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetProperties {
    pub id: String,
    pub name: String,
    pub path: String,
    pub depth: u32,
    pub file_count: usize,
    pub descendant_count: usize,
    pub road_class: RoadClass,
    pub connector: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SidewalkSide {
    /// Towards +y.
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidewalkProperties {
    pub street: String,
    pub side: SidewalkSide,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootpathProperties {
    pub building: String,
    pub street: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingProperties {
    pub id: String,
    pub name: String,
    pub path: String,
    pub street: String,
    pub language: String,
    pub hue: u16,
    pub lines_of_code: u64,
    pub avg_line_length: f64,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub tier: usize,
    pub tier_count: usize,
    pub base_height: f64,
    pub top_height: f64,
    pub tier_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundProperties {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Properties {
    Street(StreetProperties),
    Sidewalk(SidewalkProperties),
    Footpath(FootpathProperties),
    Building(BuildingProperties),
    Background(BackgroundProperties),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

impl Feature {
    pub fn layer(&self) -> Layer {
        match self.properties {
            Properties::Street(_) => Layer::Streets,
            Properties::Sidewalk(_) => Layer::Sidewalks,
            Properties::Footpath(_) => Layer::Footpaths,
            Properties::Building(_) => Layer::Buildings,
            Properties::Background(_) => Layer::Background,
        }
    }
}

/// Turns a finished [`Layout`] into world-space features.
///
/// Streets run through cell centres. Sidewalks, footpaths and building tiers
/// are offset from the street centre line by the configured widths, so their
/// world geometry may extend past the cells the grid reserved.
#[derive(Debug, Clone, Default)]
pub struct GeometryEmitter {
    config: LayoutConfig,
}

impl GeometryEmitter {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Features in draw order: background, streets, buildings, sidewalks, footpaths.
    pub fn emit(&self, layout: &Layout) -> Vec<Feature> {
        let grid = &layout.grid;

        let mut streets: Vec<Feature> = layout
            .streets
            .iter()
            .map(|street| street_feature(grid, street))
            .collect();
        streets.extend(
            layout
                .connectors
                .iter()
                .map(|connector| connector_feature(grid, layout, connector)),
        );

        let sidewalks: Vec<Feature> = layout
            .streets
            .iter()
            .flat_map(|street| self.sidewalk_features(grid, street))
            .collect();

        let mut buildings = Vec::new();
        let mut footpaths = Vec::new();
        for building in &layout.buildings {
            buildings.extend(self.building_features(grid, building));
            footpaths.push(self.footpath_feature(grid, building));
        }

        let mut features = Vec::with_capacity(
            1 + streets.len() + buildings.len() + sidewalks.len() + footpaths.len(),
        );
        let mut extent = Bounds::empty();
        for feature in streets.iter().chain(&buildings).chain(&sidewalks).chain(&footpaths) {
            for point in feature.geometry.points() {
                extent.include(*point);
            }
        }
        if !extent.is_empty() {
            features.push(Feature {
                geometry: Geometry::Polygon(extent.expand(self.config.background_margin).ring()),
                properties: Properties::Background(BackgroundProperties {
                    name: layout.root_name.clone(),
                }),
            });
        }
        let counts = [
            json_kv("streets", streets.len()),
            json_kv("buildings", buildings.len()),
            json_kv("sidewalks", sidewalks.len()),
            json_kv("footpaths", footpaths.len()),
        ];
        features.extend(streets);
        features.extend(buildings);
        features.extend(sidewalks);
        features.extend(footpaths);

        if let Some(range) = self.config.normalize_range {
            normalize(&mut features, range);
        }

        self.config.emit(event_with_fields(
            LogLevel::Debug,
            TARGET_EMIT,
            "geometry_emitted",
            counts,
        ));
        features
    }

    /// Two strips per street, from the street edge outward. A branched street's
    /// strips reach back to its branch point's coordinate along the street axis.
    fn sidewalk_features(&self, grid: &TileGrid, street: &Street) -> [Feature; 2] {
        let start = grid.cell_center(street.start);
        let end = grid.cell_center(street.end);
        let from_x = street
            .branch_point
            .map(|branch| grid.cell_center(branch).x)
            .unwrap_or(start.x);
        let inner = self.config.street_width / 2.0;
        let outer = inner + self.config.sidewalk_width;

        let strip = |sign: f64, side: SidewalkSide| Feature {
            geometry: Geometry::Polygon(vec![
                Point::new(from_x, start.y + sign * inner),
                Point::new(end.x, end.y + sign * inner),
                Point::new(end.x, end.y + sign * outer),
                Point::new(from_x, start.y + sign * outer),
                Point::new(from_x, start.y + sign * inner),
            ]),
            properties: Properties::Sidewalk(SidewalkProperties {
                street: street.id.clone(),
                side,
            }),
        };
        [strip(1.0, SidewalkSide::Left), strip(-1.0, SidewalkSide::Right)]
    }

    /// Offset from the street centre line to a building's road-facing edge.
    fn building_setback(&self) -> f64 {
        self.config.street_width / 2.0 + self.config.sidewalk_width + self.config.footpath_clearance
    }

    fn building_features<'a>(
        &'a self,
        grid: &'a TileGrid,
        building: &'a Building,
    ) -> impl Iterator<Item = Feature> + 'a {
        let center = grid.cell_center(building.street_cell);
        let sign = building.side.sign() as f64;
        let near = center.y + sign * self.building_setback();
        let far = near + sign * self.config.building_depth;
        let record = &building.record;
        let tier_count = building.tiers.len();

        building.tiers.iter().map(move |tier| {
            let half = tier.width / 2.0;
            Feature {
                geometry: Geometry::Polygon(vec![
                    Point::new(center.x - half, near),
                    Point::new(center.x + half, near),
                    Point::new(center.x + half, far),
                    Point::new(center.x - half, far),
                    Point::new(center.x - half, near),
                ]),
                properties: Properties::Building(BuildingProperties {
                    id: format!("{}#{}", building.path, tier.index),
                    name: building.name.clone(),
                    path: building.path.clone(),
                    street: building.street.clone(),
                    language: record.language.clone(),
                    hue: building.hue,
                    lines_of_code: record.lines_of_code,
                    avg_line_length: record.avg_line_length,
                    created_at: record.created_at,
                    last_modified: record.last_modified,
                    tier: tier.index,
                    tier_count,
                    base_height: tier.base_height,
                    top_height: tier.top_height,
                    tier_width: tier.width,
                }),
            }
        })
    }

    /// Quadratic curve from the building's road-facing edge to the outer edge
    /// of the sidewalk on that side: start, control point, end.
    fn footpath_feature(&self, grid: &TileGrid, building: &Building) -> Feature {
        let center = grid.cell_center(building.street_cell);
        let sign = building.side.sign() as f64;
        let edge = Point::new(center.x, center.y + sign * self.building_setback());
        let sidewalk = Point::new(
            center.x,
            center.y + sign * (self.config.street_width / 2.0 + self.config.sidewalk_width),
        );
        let control = Point::new(center.x + sign * FOOTPATH_BEND, (edge.y + sidewalk.y) / 2.0);

        Feature {
            geometry: Geometry::LineString(vec![edge, control, sidewalk]),
            properties: Properties::Footpath(FootpathProperties {
                building: building.path.clone(),
                street: building.street.clone(),
            }),
        }
    }
}

fn street_feature(grid: &TileGrid, street: &Street) -> Feature {
    Feature {
        geometry: Geometry::LineString(vec![
            grid.cell_center(street.start),
            grid.cell_center(street.end),
        ]),
        properties: Properties::Street(StreetProperties {
            id: street.id.clone(),
            name: street.name.clone(),
            path: street.path.clone(),
            depth: street.depth,
            file_count: street.file_count,
            descendant_count: street.descendant_count,
            road_class: street.road_class,
            connector: false,
            parent: None,
        }),
    }
}

/// Connectors become their own street features, drawn through the bend.
fn connector_feature(grid: &TileGrid, layout: &Layout, connector: &Connector) -> Feature {
    let points = connector
        .branch_point()
        .into_iter()
        .chain(connector.bend())
        .chain(connector.cells.last().copied())
        .map(|pos| grid.cell_center(pos))
        .collect();
    let child = layout.street(&connector.child);

    Feature {
        geometry: Geometry::LineString(points),
        properties: Properties::Street(StreetProperties {
            id: connector.id.clone(),
            name: child.map(|s| s.name.clone()).unwrap_or_default(),
            path: connector.child.clone(),
            depth: connector.depth,
            file_count: child.map_or(0, |s| s.file_count),
            descendant_count: child.map_or(0, |s| s.descendant_count),
            road_class: RoadClass::from_depth(connector.depth),
            connector: true,
            parent: Some(connector.parent.clone()),
        }),
    }
}

/// Centres every coordinate on the origin and scales uniformly so the whole
/// collection fits within `[-range, range]` on both axes.
fn normalize(features: &mut [Feature], range: f64) {
    let mut extent = Bounds::empty();
    for feature in features.iter() {
        for point in feature.geometry.points() {
            extent.include(*point);
        }
    }
    if extent.is_empty() {
        return;
    }

    let width = if extent.width() > 0.0 { extent.width() } else { 1.0 };
    let height = if extent.height() > 0.0 { extent.height() } else { 1.0 };
    let scale = (2.0 * range / width).min(2.0 * range / height);
    let center = extent.center();

    for feature in features.iter_mut() {
        for point in feature.geometry.points_mut() {
            *point = Point::new((point.x - center.x) * scale, (point.y - center.y) * scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LayoutEngine;
    use crate::tree::FileRecord;

    fn layout(paths: &[&str]) -> Layout {
        let records: Vec<FileRecord> = paths.iter().map(|p| FileRecord::new(*p, 150)).collect();
        LayoutEngine::default().layout(&records, "repo").unwrap()
    }

    fn by_layer(features: &[Feature], layer: Layer) -> Vec<&Feature> {
        features.iter().filter(|f| f.layer() == layer).collect()
    }

    #[test]
    fn features_come_out_in_draw_order() {
        let features = GeometryEmitter::default().emit(&layout(&["a.rs", "src/b.rs"]));
        let layers: Vec<Layer> = features.iter().map(Feature::layer).collect();
        let mut sorted = layers.clone();
        sorted.sort_by_key(|layer| match layer {
            Layer::Background => 0,
            Layer::Streets => 1,
            Layer::Buildings => 2,
            Layer::Sidewalks => 3,
            Layer::Footpaths => 4,
        });
        assert_eq!(layers, sorted);
        assert_eq!(layers[0], Layer::Background);
    }

    #[test]
    fn main_street_runs_through_cell_centres() {
        let features = GeometryEmitter::default().emit(&layout(&["a.rs"]));
        let street = by_layer(&features, Layer::Streets)[0];
        assert_eq!(
            street.geometry,
            Geometry::LineString(vec![Point::new(3.0, 3.0), Point::new(57.0, 3.0)])
        );
    }

    #[test]
    fn each_tier_becomes_its_own_polygon() {
        let features = GeometryEmitter::default().emit(&layout(&["a.rs"]));
        let tiers = by_layer(&features, Layer::Buildings);
        assert_eq!(tiers.len(), 3);
        let Properties::Building(top) = &tiers[2].properties else {
            panic!("expected building properties");
        };
        assert_eq!(top.tier_count, 3);
        assert!((top.top_height - 26.0).abs() < 1e-9);

        // Slot 0 sits below the main street: setback 3 + 1 + 1, depth 6.
        let ys: Vec<f64> = tiers[0].geometry.points().iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![8.0, 8.0, 14.0, 14.0, 8.0]);
    }

    #[test]
    fn sidewalks_flank_every_street_and_reach_back_to_the_branch() {
        let built = layout(&["src/b.rs"]);
        let features = GeometryEmitter::default().emit(&built);
        let sidewalks = by_layer(&features, Layer::Sidewalks);
        assert_eq!(sidewalks.len(), 2 * built.streets.len());

        let src = built.street("src").unwrap();
        let branch_x = built.grid.cell_center(src.branch_point.unwrap()).x;
        let src_strip = sidewalks
            .iter()
            .find(|f| matches!(&f.properties, Properties::Sidewalk(p) if p.street == "src"))
            .unwrap();
        assert_eq!(src_strip.geometry.points()[0].x, branch_x);
    }

    #[test]
    fn footpath_ends_on_sidewalk_outer_edge() {
        let features = GeometryEmitter::default().emit(&layout(&["a.rs"]));
        let path = by_layer(&features, Layer::Footpaths)[0];
        let points = path.geometry.points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], Point::new(15.0, 8.0));
        assert_eq!(points[2], Point::new(15.0, 7.0));
    }

    #[test]
    fn normalization_fits_target_range() {
        let emitter = GeometryEmitter::new(LayoutConfig::default().with_normalization(1.0));
        let features = emitter.emit(&layout(&["a.rs", "src/b.rs", "src/c/d.rs"]));
        for feature in &features {
            for point in feature.geometry.points() {
                assert!(point.x.abs() <= 1.0 + 1e-9 && point.y.abs() <= 1.0 + 1e-9);
            }
        }
        let background = by_layer(&features, Layer::Background)[0].geometry.points();
        let spans_x = (background[1].x - background[0].x - 2.0).abs() < 1e-9;
        let spans_y = (background[2].y - background[1].y - 2.0).abs() < 1e-9;
        assert!(spans_x || spans_y);
    }
}
