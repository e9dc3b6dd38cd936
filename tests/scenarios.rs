use std::sync::Arc;

use codecity_layout::logging::TARGET_TREE;
use codecity_layout::{
    CellKind, FileRecord, GeometryEmitter, GridPos, GridRect, Layer, LayoutConfig, LayoutEngine,
    LayoutWarning, LogLevel, Logger, MemorySink, ROOT_STREET_ID, Side, TileGrid, building,
    find_free_region,
};

fn records(paths: &[&str]) -> Vec<FileRecord> {
    paths.iter().map(|p| FileRecord::new(*p, 40)).collect()
}

#[test]
fn single_root_file_becomes_one_building_on_the_main_street() {
    let layout = LayoutEngine::default()
        .layout(&records(&["main.py"]), "app")
        .expect("layout");

    assert_eq!(layout.streets.len(), 1);
    assert!(layout.connectors.is_empty());
    assert_eq!(layout.buildings.len(), 1);

    let building = &layout.buildings[0];
    let main = layout.main_street().expect("main street");
    assert_eq!(building.street, main.id);
    assert_eq!(building.record.language, "python");
    assert!(main.contains(building.street_cell));
    // Footprint starts in the row right next to the road.
    let nearest = GridPos::new(building.street_cell.x, building.street_cell.y + 1);
    assert!(building.footprint.contains(nearest));
    assert_eq!(building.side, Side::Down);
}

#[test]
fn two_top_level_folders_branch_at_distinct_points() {
    let layout = LayoutEngine::default()
        .layout(&records(&["src/a.py", "lib/b.py"]), "app")
        .expect("layout");

    let src = layout.street("src").expect("src");
    let lib = layout.street("lib").expect("lib");
    assert_eq!((src.depth, lib.depth), (1, 1));
    assert_ne!(src.branch_point, lib.branch_point);
    assert_ne!(
        layout.connector_into("src").map(|c| c.id.as_str()),
        layout.connector_into("lib").map(|c| c.id.as_str())
    );

    // Siblings never touch: the only crossings are with the main street.
    for crossing in layout.grid.crossings() {
        assert_eq!(crossing.previous_owner, ROOT_STREET_ID);
        assert_eq!(crossing.previous_depth, 0);
    }
    let src_cells: Vec<GridPos> = layout.connector_into("src").expect("connector").cells.clone();
    let lib_cells = &layout.connector_into("lib").expect("connector").cells;
    assert!(src_cells.iter().all(|cell| !lib_cells.contains(cell)));
}

#[test]
fn deep_chain_crosses_once_per_level() {
    let layout = LayoutEngine::default()
        .layout(&records(&["src/a/b/c/file.py"]), "app")
        .expect("layout");

    let chain = ["src", "src/a", "src/a/b", "src/a/b/c"];
    for (level, id) in chain.iter().enumerate() {
        let street = layout.street(id).expect("street");
        assert_eq!(street.depth as usize, level + 1);
    }

    let pairs: Vec<(u32, u32)> = layout
        .grid
        .crossings()
        .iter()
        .map(|c| (c.previous_depth, c.depth))
        .collect();
    assert_eq!(pairs, vec![(0, 1), (1, 2), (2, 3), (3, 4)]);

    let building = layout.building("src/a/b/c/file.py").expect("building");
    assert_eq!(building.street, "src/a/b/c");
    assert_eq!(building.depth, 4);
}

#[test]
fn tiers_stack_without_gaps_up_to_the_file_height() {
    let lengths = vec![40; 150];
    let plan = building::plan_tiers(150, &lengths, 40.0, 3.0, 10.0);

    assert_eq!(plan.tiers.len(), 3);
    let width = plan.tiers[0].width;
    assert!(plan.tiers.iter().all(|tier| tier.width == width));
    for pair in plan.tiers.windows(2) {
        assert_eq!(pair[0].top_height, pair[1].base_height);
    }
    assert_eq!(plan.tiers[0].base_height, 0.0);
    assert_eq!(
        plan.tiers[2].top_height,
        building::interpolate_height(150)
    );
    assert!((plan.total_height - 26.0).abs() < 1e-9);
}

#[test]
fn region_search_escapes_an_occupied_block() {
    let mut grid = TileGrid::new(6.0);
    assert!(grid.place_building(GridPos::new(0, 0), "blocker", 0, 3, 3));
    let occupied = GridRect::new(0, 0, 3, 3);

    let anchor = find_free_region(&grid, GridPos::new(1, 1), 2, 2, 10).expect("free region");
    let found = GridRect::new(anchor.x, anchor.y, 2, 2);
    assert!(found.cells().all(|cell| !occupied.contains(cell)));
    assert!(found.cells().all(|cell| grid.can_place_building(cell)));
}

#[test]
fn malformed_and_duplicate_paths_are_skipped_with_warnings() {
    let sink = Arc::new(MemorySink::new());
    let config = LayoutConfig::default().with_logger(Logger::from_shared(sink.clone()));
    let input = records(&["ok.rs", "a//b.rs", "", "/abs.rs", "trailing/", "ok.rs"]);

    let layout = LayoutEngine::new(config).layout(&input, "app").expect("layout");

    assert_eq!(layout.buildings.len(), 1);
    let malformed = layout
        .warnings
        .iter()
        .filter(|w| matches!(w, LayoutWarning::MalformedPathEntry { .. }))
        .count();
    assert_eq!(malformed, 4);
    assert!(layout
        .warnings
        .contains(&LayoutWarning::DuplicatePathEntry { path: "ok.rs".to_string() }));
    assert_eq!(layout.metrics.warnings, 5);

    let events = sink.events();
    let skipped = events
        .iter()
        .filter(|e| e.target == TARGET_TREE && e.message == "skipped_record")
        .count();
    assert_eq!(skipped, 5);
    assert_eq!(sink.count_level(LogLevel::Warn), 5);
    assert!(events.iter().any(|e| e.message == "layout_metrics"));
    assert_eq!(
        events.last().map(|e| e.message.as_str()),
        Some("layout_completed")
    );
}

#[test]
fn empty_repository_still_has_a_main_street() {
    let layout = LayoutEngine::default().layout(&[], "empty").expect("layout");
    assert_eq!(layout.streets.len(), 1);
    assert!(layout.buildings.is_empty());
    let roads = layout
        .grid
        .cells()
        .filter(|(_, cell)| cell.kind == CellKind::Road)
        .count();
    assert_eq!(roads, 10);

    let features = GeometryEmitter::default().emit(&layout);
    assert_eq!(features[0].layer(), Layer::Background);
    assert_eq!(features.iter().filter(|f| f.layer() == Layer::Sidewalks).count(), 2);
}

#[test]
fn json_records_flow_through_to_geojson() {
    let input = r#"[
        {"path": "src/lib.rs", "lines_of_code": 120, "line_lengths": [30, 42, 18],
         "created_at": "2024-01-02T03:04:05Z", "last_modified": "2024-02-03T04:05:06Z"},
        {"path": "README.md", "lines_of_code": 12, "language": "markdown"}
    ]"#;
    let records: Vec<FileRecord> = serde_json::from_str(input).expect("records");
    let layout = LayoutEngine::default().layout(&records, "demo").expect("layout");

    let collection = GeometryEmitter::default().to_geojson(&layout).expect("geojson");
    let value = serde_json::to_value(&collection).expect("value");
    assert_eq!(value["type"], "FeatureCollection");

    let features = value["features"].as_array().expect("features");
    let lib_tiers: Vec<&serde_json::Value> = features
        .iter()
        .filter(|f| f["properties"]["layer"] == "buildings" && f["properties"]["path"] == "src/lib.rs")
        .collect();
    assert_eq!(lib_tiers.len(), 3);
    let props = &lib_tiers[0]["properties"];
    assert_eq!(props["language"], "rust");
    assert_eq!(props["hue"], 15);
    assert_eq!(props["created_at"], "2024-01-02T03:04:05Z");
    assert_eq!(props["street"], "src");
    assert_eq!(lib_tiers[0]["geometry"]["type"], "Polygon");

    let connectors: Vec<&serde_json::Value> = features
        .iter()
        .filter(|f| f["properties"]["connector"] == true)
        .collect();
    assert_eq!(connectors.len(), 1);
    assert_eq!(connectors[0]["properties"]["parent"], ROOT_STREET_ID);
    assert_eq!(connectors[0]["properties"]["road_class"], "secondary");

    for layer in ["background", "streets", "buildings", "sidewalks", "footpaths"] {
        assert!(
            features.iter().any(|f| f["properties"]["layer"] == layer),
            "no {layer} features"
        );
    }
}

#[test]
fn layout_events_can_be_written_to_a_log_file() {
    let path = std::env::temp_dir().join(format!(
        "codecity_layout_run_{}.log",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    let config = LayoutConfig::default()
        .with_log_file(&path, 0)
        .expect("log file");
    LayoutEngine::new(config)
        .layout(&records(&["src/a.rs", "b.rs"]), "app")
        .expect("layout");

    let contents = std::fs::read_to_string(&path).expect("log contents");
    let _ = std::fs::remove_file(&path);
    let messages: Vec<String> = contents
        .lines()
        .map(|line| {
            let event: serde_json::Value = serde_json::from_str(line).expect("json line");
            event["message"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(&messages[..2], ["tree_built", "layout_started"]);
    assert_eq!(messages.last().map(String::as_str), Some("layout_completed"));
    assert_eq!(messages.iter().filter(|m| *m == "folder_placed").count(), 2);
}
