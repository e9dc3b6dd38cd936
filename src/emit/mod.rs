//! Geometry emitter orchestrator.
//!
//! `core` converts a finished layout into typed world-space features;
//! `geojson` encodes them as a GeoJSON FeatureCollection.

mod core;
mod geojson;

pub use core::{
    BackgroundProperties, BuildingProperties, Feature, FootpathProperties, Geometry,
    GeometryEmitter, Layer, Properties, SidewalkProperties, SidewalkSide, StreetProperties,
};
pub use geojson::{FeatureCollection, GeoJsonFeature, GeoJsonGeometry};

use crate::engine::Layout;
use crate::error::Result;

impl GeometryEmitter {
    /// Emits `layout` and encodes the result as GeoJSON.
    pub fn to_geojson(&self, layout: &Layout) -> Result<FeatureCollection> {
        FeatureCollection::from_features(&self.emit(layout))
    }
}
