//! GeoJSON encoding of emitted features.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::emit::core::{Feature, Geometry};
use crate::error::Result;
use crate::geometry::Point;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum GeoJsonGeometry {
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoJsonFeature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub geometry: GeoJsonGeometry,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    pub features: Vec<GeoJsonFeature>,
}

fn coords(points: &[Point]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.x, p.y]).collect()
}

impl GeoJsonFeature {
    /// Encodes one feature; the layer name is added to its properties.
    pub fn from_feature(feature: &Feature) -> Result<Self> {
        let geometry = match &feature.geometry {
            Geometry::LineString(points) => GeoJsonGeometry::LineString(coords(points)),
            Geometry::Polygon(ring) => GeoJsonGeometry::Polygon(vec![coords(ring)]),
        };
        let mut properties = match serde_json::to_value(&feature.properties)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        properties.insert(
            "layer".to_string(),
            Value::String(feature.layer().as_str().to_string()),
        );
        Ok(Self {
            kind: "Feature",
            geometry,
            properties,
        })
    }

    pub fn layer(&self) -> Option<&str> {
        self.properties.get("layer").and_then(Value::as_str)
    }
}

impl FeatureCollection {
    pub fn from_features(features: &[Feature]) -> Result<Self> {
        let features = features
            .iter()
            .map(GeoJsonFeature::from_feature)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            kind: "FeatureCollection",
            features,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::core::{FootpathProperties, Properties};

    fn footpath() -> Feature {
        Feature {
            geometry: Geometry::LineString(vec![
                Point::new(15.0, 8.0),
                Point::new(15.5, 7.5),
                Point::new(15.0, 7.0),
            ]),
            properties: Properties::Footpath(FootpathProperties {
                building: "a.rs".to_string(),
                street: "root".to_string(),
            }),
        }
    }

    #[test]
    fn feature_carries_layer_and_geometry_type() {
        let encoded = GeoJsonFeature::from_feature(&footpath()).unwrap();
        let value = serde_json::to_value(&encoded).unwrap();
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["geometry"]["type"], "LineString");
        assert_eq!(value["geometry"]["coordinates"][1][0], 15.5);
        assert_eq!(value["properties"]["layer"], "footpaths");
        assert_eq!(value["properties"]["building"], "a.rs");
    }

    #[test]
    fn polygon_wraps_ring_in_outer_array() {
        let mut feature = footpath();
        feature.geometry = Geometry::Polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
        ]);
        let value = serde_json::to_value(GeoJsonFeature::from_feature(&feature).unwrap()).unwrap();
        assert_eq!(value["geometry"]["type"], "Polygon");
        assert_eq!(value["geometry"]["coordinates"][0].as_array().unwrap().len(), 4);
    }

    #[test]
    fn collection_serializes_as_feature_collection() {
        let collection = FeatureCollection::from_features(&[footpath()]).unwrap();
        let json = collection.to_json().unwrap();
        assert!(json.starts_with("{\"type\":\"FeatureCollection\""));
        assert_eq!(collection.features[0].layer(), Some("footpaths"));
    }
}
