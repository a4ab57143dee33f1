//! The seam to the map-rendering engine.
//!
//! Tile rendering, projection and pan/zoom belong to the engine. The dashboard
//! only declares sources and style layers and mutates their paint.

use crate::error::MapError;
use std::collections::BTreeMap;
use urbanpulse_schemas::geojson::{FeatureCollection, Position};

#[derive(Debug, Clone, PartialEq)]
pub enum PaintValue {
    Color(String),
    Number(f64),
}

impl PaintValue {
    pub fn as_color(&self) -> Option<&str> {
        match self {
            PaintValue::Color(c) => Some(c),
            PaintValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PaintValue::Number(n) => Some(*n),
            PaintValue::Color(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterSource {
    pub tiles: Vec<String>,
    pub tile_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Raster(RasterSource),
    GeoJson(FeatureCollection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Raster,
    Line,
    Circle,
}

impl LayerKind {
    /// Paint properties of a layer kind share this prefix.
    pub fn paint_prefix(self) -> &'static str {
        match self {
            LayerKind::Raster => "raster-",
            LayerKind::Line => "line-",
            LayerKind::Circle => "circle-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleLayer {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
    pub paint: BTreeMap<String, PaintValue>,
    pub visible: bool,
}

impl StyleLayer {
    pub fn new(id: &str, source: &str, kind: LayerKind) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_string(),
            kind,
            paint: BTreeMap::new(),
            visible: true,
        }
    }

    pub fn with_paint(mut self, property: &str, value: PaintValue) -> Self {
        self.paint.insert(property.to_string(), value);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

pub trait MapEngine {
    fn jump_to(&mut self, center: Position, zoom: f64);
    fn add_raster_source(&mut self, id: &str, source: RasterSource) -> Result<(), MapError>;
    fn add_geojson_source(&mut self, id: &str, data: FeatureCollection) -> Result<(), MapError>;
    fn add_layer(&mut self, layer: StyleLayer) -> Result<(), MapError>;
    fn set_source_data(&mut self, id: &str, data: FeatureCollection) -> Result<(), MapError>;
    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: PaintValue) -> Result<(), MapError>;
    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) -> Result<(), MapError>;
    /// Releases the map; further calls fail with `MapError::Removed`.
    fn remove(&mut self);
}

/// A map engine that keeps the whole style in memory.
///
/// The CLI rasterises it to PNG and tests inspect it directly.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMap {
    center: Position,
    zoom: f64,
    sources: BTreeMap<String, Source>,
    layers: Vec<StyleLayer>,
    removed: bool,
}

impl InMemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(&self) -> Position {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn source(&self, id: &str) -> Option<&Source> {
        self.sources.get(id)
    }

    pub fn source_data(&self, id: &str) -> Option<&FeatureCollection> {
        match self.sources.get(id) {
            Some(Source::GeoJson(data)) => Some(data),
            _ => None,
        }
    }

    /// Layers in drawing order, bottom first.
    pub fn layers(&self) -> &[StyleLayer] {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&StyleLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn paint(&self, layer_id: &str, property: &str) -> Option<&PaintValue> {
        self.layer(layer_id).and_then(|l| l.paint.get(property))
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    fn ensure_live(&self) -> Result<(), MapError> {
        if self.removed {
            Err(MapError::Removed)
        } else {
            Ok(())
        }
    }

    fn add_source(&mut self, id: &str, source: Source) -> Result<(), MapError> {
        self.ensure_live()?;
        if self.sources.contains_key(id) {
            return Err(MapError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), source);
        Ok(())
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut StyleLayer, MapError> {
        self.ensure_live()?;
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| MapError::LayerNotFound(id.to_string()))
    }
}

impl MapEngine for InMemoryMap {
    fn jump_to(&mut self, center: Position, zoom: f64) {
        self.center = center;
        self.zoom = zoom;
    }

    fn add_raster_source(&mut self, id: &str, source: RasterSource) -> Result<(), MapError> {
        self.add_source(id, Source::Raster(source))
    }

    fn add_geojson_source(&mut self, id: &str, data: FeatureCollection) -> Result<(), MapError> {
        self.add_source(id, Source::GeoJson(data))
    }

    fn add_layer(&mut self, layer: StyleLayer) -> Result<(), MapError> {
        self.ensure_live()?;
        if self.layer(&layer.id).is_some() {
            return Err(MapError::DuplicateLayer(layer.id));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(MapError::SourceNotFound(layer.source));
        }
        if let Some(property) = layer.paint.keys().find(|p| !p.starts_with(layer.kind.paint_prefix())) {
            return Err(MapError::UnsupportedPaint {
                layer: layer.id.clone(),
                property: property.clone(),
            });
        }
        self.layers.push(layer);
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, data: FeatureCollection) -> Result<(), MapError> {
        self.ensure_live()?;
        match self.sources.get_mut(id) {
            Some(Source::GeoJson(existing)) => {
                *existing = data;
                Ok(())
            }
            Some(Source::Raster(_)) => Err(MapError::NotGeoJsonSource(id.to_string())),
            None => Err(MapError::SourceNotFound(id.to_string())),
        }
    }

    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: PaintValue) -> Result<(), MapError> {
        let layer = self.layer_mut(layer_id)?;
        if !property.starts_with(layer.kind.paint_prefix()) {
            return Err(MapError::UnsupportedPaint {
                layer: layer_id.to_string(),
                property: property.to_string(),
            });
        }
        layer.paint.insert(property.to_string(), value);
        Ok(())
    }

    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) -> Result<(), MapError> {
        self.layer_mut(layer_id)?.visible = visible;
        Ok(())
    }

    fn remove(&mut self) {
        self.sources.clear();
        self.layers.clear();
        self.removed = true;
    }
}
