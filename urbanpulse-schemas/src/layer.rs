use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The data layer shown on the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapLayer {
    #[default]
    Traffic,
    Aqi,
}

impl MapLayer {
    pub const ALL: [MapLayer; 2] = [MapLayer::Traffic, MapLayer::Aqi];

    /// Id of the GeoJSON source backing the layer.
    pub fn source_id(self) -> &'static str {
        match self {
            MapLayer::Traffic => "traffic",
            MapLayer::Aqi => "aqi",
        }
    }

    /// Id of the style layer drawing the source.
    pub fn layer_id(self) -> &'static str {
        match self {
            MapLayer::Traffic => "traffic-lines",
            MapLayer::Aqi => "aqi-points",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MapLayer::Traffic => "Traffic Flow",
            MapLayer::Aqi => "Air Quality",
        }
    }
}

impl fmt::Display for MapLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_id())
    }
}

impl FromStr for MapLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "traffic" => Ok(MapLayer::Traffic),
            "aqi" => Ok(MapLayer::Aqi),
            other => Err(format!("unknown map layer '{}', expected 'traffic' or 'aqi'", other)),
        }
    }
}
