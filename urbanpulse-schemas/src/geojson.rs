use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A `[longitude, latitude]` pair in WGS84 degrees.
pub type Position = [f64; 2];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionType {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    #[default]
    Feature,
}

/// Geometry carried by a map feature.
///
/// Road segments arrive as `LineString`s, air-quality stations as `Point`s.
/// Any other geometry kind is kept as `Unsupported` so that one odd feature
/// does not invalidate the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    LineString { coordinates: Vec<Position> },
    Point { coordinates: Position },
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// All vertices of the geometry, in drawing order.
    pub fn positions(&self) -> &[Position] {
        match self {
            Geometry::LineString { coordinates } => coordinates,
            Geometry::Point { coordinates } => std::slice::from_ref(coordinates),
            Geometry::Unsupported => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub kind: FeatureType,
    pub geometry: Geometry,
    /// Free-form property bag; consumed read-only.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub kind: CollectionType,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// The placeholder attached to a source before the first network load.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn line_strings(&self) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .filter(|f| matches!(f.geometry, Geometry::LineString { .. }))
    }

    pub fn points(&self) -> impl Iterator<Item = &Feature> {
        self.features
            .iter()
            .filter(|f| matches!(f.geometry, Geometry::Point { .. }))
    }

    /// `(min_lon, min_lat, max_lon, max_lat)` over every vertex, if any.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.features
            .iter()
            .flat_map(|f| f.geometry.positions().iter())
            .fold(None, |acc, [lon, lat]| match acc {
                None => Some((*lon, *lat, *lon, *lat)),
                Some((x0, y0, x1, y1)) => Some((x0.min(*lon), y0.min(*lat), x1.max(*lon), y1.max(*lat))),
            })
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
