use super::engine::{LayerKind, MapEngine, PaintValue, RasterSource, StyleLayer};
use crate::{
    cameras::CameraCatalog,
    diagnostics::{Component, Diagnostics, SharedSink},
    error::MapError,
    transport::Transport,
};
use chrono::{DateTime, Utc};
use urbanpulse_schemas::{
    camera::CameraSelection,
    geojson::{FeatureCollection, Position},
    layer::MapLayer,
    simulation::SimulationResponse,
};

pub const LOW_CONGESTION_MAX: f64 = 0.4;
pub const MODERATE_CONGESTION_MAX: f64 = 0.7;

pub const BACKGROUND_SOURCE: &str = "osm";
pub const BACKGROUND_LAYER: &str = "osm";

/// The paint colour for a congestion value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CongestionColor {
    Green,
    Yellow,
    Red,
}

impl CongestionColor {
    pub const ALL: [CongestionColor; 3] = [CongestionColor::Green, CongestionColor::Yellow, CongestionColor::Red];

    pub fn for_congestion(congestion: f64) -> Self {
        if congestion < LOW_CONGESTION_MAX {
            CongestionColor::Green
        } else if congestion < MODERATE_CONGESTION_MAX {
            CongestionColor::Yellow
        } else {
            CongestionColor::Red
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            CongestionColor::Green => "#22c55e",
            CongestionColor::Yellow => "#eab308",
            CongestionColor::Red => "#ef4444",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            CongestionColor::Green => (0x22, 0xc5, 0x5e),
            CongestionColor::Yellow => (0xea, 0xb3, 0x08),
            CongestionColor::Red => (0xef, 0x44, 0x44),
        }
    }

    /// Legend caption.
    pub fn label(self) -> &'static str {
        match self {
            CongestionColor::Green => "Low congestion",
            CongestionColor::Yellow => "Moderate",
            CongestionColor::Red => "High congestion",
        }
    }
}

pub fn congestion_color(congestion: f64) -> CongestionColor {
    CongestionColor::for_congestion(congestion)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: Position,
    pub zoom: f64,
    pub tiles: String,
    pub tile_size: u32,
    pub line_width: f64,
    pub aqi_color: String,
    pub aqi_radius: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: [103.85, 1.29],
            zoom: 12.0,
            tiles: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tile_size: 256,
            line_width: 6.0,
            aqi_color: "#3b82f6".to_string(),
            aqi_radius: 8.0,
        }
    }
}

/// Owns the map instance for its mounted lifetime.
pub struct MapSurface<E: MapEngine> {
    engine: E,
    options: MapOptions,
    diagnostics: Diagnostics,
    traffic_loaded: bool,
    aqi_loaded: bool,
    visible_layer: MapLayer,
    traffic_color: CongestionColor,
}

impl<E: MapEngine> MapSurface<E> {
    /// Binds the engine to the initial view and declares the background,
    /// traffic and (hidden) AQI layers with empty data.
    pub fn mount(mut engine: E, options: MapOptions, sink: SharedSink) -> Result<Self, MapError> {
        engine.jump_to(options.center, options.zoom);
        engine.add_raster_source(
            BACKGROUND_SOURCE,
            RasterSource {
                tiles: vec![options.tiles.clone()],
                tile_size: options.tile_size,
            },
        )?;
        engine.add_layer(StyleLayer::new(BACKGROUND_LAYER, BACKGROUND_SOURCE, LayerKind::Raster))?;

        let traffic = MapLayer::Traffic;
        engine.add_geojson_source(traffic.source_id(), FeatureCollection::empty())?;
        engine.add_layer(
            StyleLayer::new(traffic.layer_id(), traffic.source_id(), LayerKind::Line)
                .with_paint("line-color", PaintValue::Color(CongestionColor::Green.hex().to_string()))
                .with_paint("line-width", PaintValue::Number(options.line_width))
                .with_paint("line-opacity", PaintValue::Number(1.0)),
        )?;

        let aqi = MapLayer::Aqi;
        engine.add_geojson_source(aqi.source_id(), FeatureCollection::empty())?;
        engine.add_layer(
            StyleLayer::new(aqi.layer_id(), aqi.source_id(), LayerKind::Circle)
                .with_paint("circle-color", PaintValue::Color(options.aqi_color.clone()))
                .with_paint("circle-radius", PaintValue::Number(options.aqi_radius))
                .hidden(),
        )?;

        let diagnostics = Diagnostics::new(sink, Component::Map);
        diagnostics.info("Map and traffic layer ready.");

        Ok(Self {
            engine,
            options,
            diagnostics,
            traffic_loaded: false,
            aqi_loaded: false,
            visible_layer: MapLayer::Traffic,
            traffic_color: CongestionColor::Green,
        })
    }

    /// Fetches the traffic collection once and replaces the traffic source data.
    pub async fn on_load<T: Transport>(&mut self, transport: &T) {
        if self.traffic_loaded {
            return;
        }
        self.traffic_loaded = self.load_layer_data(MapLayer::Traffic, transport).await;
    }

    /// Recolours the whole traffic layer from the simulated congestion.
    pub fn apply_simulation(&mut self, response: &SimulationResponse) -> CongestionColor {
        let color = congestion_color(response.simulated.metrics.congestion);
        match self.engine.set_paint_property(
            MapLayer::Traffic.layer_id(),
            "line-color",
            PaintValue::Color(color.hex().to_string()),
        ) {
            Ok(()) => {
                self.traffic_color = color;
                self.diagnostics.info(format!("Applied color: {}", color.hex()));
            }
            Err(e) => self.diagnostics.error(format!("Color apply error: {}", e)),
        }
        self.traffic_color
    }

    /// Shows `layer` and hides the other data layer, loading AQI data on first use.
    pub async fn show_layer<T: Transport>(&mut self, layer: MapLayer, transport: &T) {
        if layer == MapLayer::Aqi && !self.aqi_loaded {
            self.aqi_loaded = self.load_layer_data(MapLayer::Aqi, transport).await;
        }
        for candidate in MapLayer::ALL {
            if let Err(e) = self
                .engine
                .set_layer_visibility(candidate.layer_id(), candidate == layer)
            {
                self.diagnostics
                    .error(format!("Failed to toggle layer '{}': {}", candidate.layer_id(), e));
                return;
            }
        }
        self.visible_layer = layer;
    }

    /// Resolves a click at `(lon, lat)` to the nearest known camera.
    pub fn click(&self, lon: f64, lat: f64, catalog: &CameraCatalog, at: DateTime<Utc>) -> Option<CameraSelection> {
        match catalog.select_nearest(lon, lat, at) {
            Some(selection) => {
                self.diagnostics.info(format!(
                    "Selected camera {} for click at ({:.5}, {:.5})",
                    selection.camera_id, lon, lat
                ));
                Some(selection)
            }
            None => {
                self.diagnostics
                    .warn(format!("No camera known near click at ({:.5}, {:.5})", lon, lat));
                None
            }
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn visible_layer(&self) -> MapLayer {
        self.visible_layer
    }

    pub fn traffic_color(&self) -> CongestionColor {
        self.traffic_color
    }

    pub fn is_loaded(&self) -> bool {
        self.traffic_loaded
    }

    /// Releases the map instance and hands the engine back.
    pub fn unmount(mut self) -> E {
        self.engine.remove();
        self.engine
    }

    async fn load_layer_data<T: Transport>(&mut self, layer: MapLayer, transport: &T) -> bool {
        let fetched = match layer {
            MapLayer::Traffic => transport.traffic().await,
            MapLayer::Aqi => transport.aqi().await,
        };
        let data = match fetched {
            Ok(data) => data,
            Err(e) => {
                self.diagnostics
                    .error(format!("Failed to load {} data: {}", layer, e));
                return false;
            }
        };
        let features = data.len();
        match self.engine.set_source_data(layer.source_id(), data) {
            Ok(()) => {
                self.diagnostics
                    .info(format!("{} set on map ({} features).", layer.title(), features));
                true
            }
            Err(e) => {
                self.diagnostics
                    .error(format!("Failed to set {} data: {}", layer, e));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_exact_at_boundaries() {
        assert_eq!(congestion_color(0.0), CongestionColor::Green);
        assert_eq!(congestion_color(0.399_999), CongestionColor::Green);
        assert_eq!(congestion_color(0.4), CongestionColor::Yellow);
        assert_eq!(congestion_color(0.699_999), CongestionColor::Yellow);
        assert_eq!(congestion_color(0.7), CongestionColor::Red);
        assert_eq!(congestion_color(1.0), CongestionColor::Red);
    }

    #[test]
    fn out_of_range_values_use_the_nearest_band() {
        assert_eq!(congestion_color(-0.5), CongestionColor::Green);
        assert_eq!(congestion_color(3.0), CongestionColor::Red);
        assert_eq!(congestion_color(f64::NAN), CongestionColor::Red);
    }

    #[test]
    fn hex_and_rgb_agree() {
        for color in CongestionColor::ALL {
            let (r, g, b) = color.rgb();
            assert_eq!(color.hex(), format!("#{:02x}{:02x}{:02x}", r, g, b));
        }
    }
}
