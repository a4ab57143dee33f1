use super::{
    control::ControlPanel,
    engine::MapEngine,
    map::{MapOptions, MapSurface},
    sequencer::SequencingPolicy,
    shell::ViewShell,
};
use crate::{
    cameras::CameraCatalog,
    diagnostics::{Component, Diagnostics, SharedSink, TracingSink},
    error::UrbanPulseError,
    transport::Transport,
};
use std::sync::Arc;
use urbanpulse_schemas::{camera::CameraMeta, layer::MapLayer};

/// A fluent builder for constructing a `ViewShell`.
///
/// The transport and map engine are required; everything else has a default.
pub struct DashboardBuilder<T, E> {
    transport: Option<T>,
    engine: Option<E>,
    map_options: MapOptions,
    cameras: Vec<CameraMeta>,
    policy: SequencingPolicy,
    sink: Option<SharedSink>,
}

impl<T: Transport, E: MapEngine> DashboardBuilder<T, E> {
    /// Creates a new, empty `DashboardBuilder`.
    pub fn new() -> Self {
        Self {
            transport: None,
            engine: None,
            map_options: MapOptions::default(),
            cameras: Vec::new(),
            policy: SequencingPolicy::default(),
            sink: None,
        }
    }

    /// Sets the backend transport used by every component.
    pub fn with_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the map engine the Map Surface will own.
    pub fn with_engine(mut self, engine: E) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_map_options(mut self, options: MapOptions) -> Self {
        self.map_options = options;
        self
    }

    /// Pre-loads camera metadata. When empty, `ViewShell::load` asks the backend.
    pub fn with_cameras(mut self, cameras: Vec<CameraMeta>) -> Self {
        self.cameras = cameras;
        self
    }

    pub fn with_sequencing(mut self, policy: SequencingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Routes background diagnostics to `sink` instead of `tracing`.
    pub fn with_diagnostics(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Consumes the builder, mounts the map and returns the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an `UrbanPulseError` if the transport or engine is missing, or if
    /// the engine rejects the initial style.
    pub fn build(self) -> Result<ViewShell<T, E>, UrbanPulseError> {
        let transport = self.transport.ok_or(UrbanPulseError::TransportNotDefined)?;
        let engine = self.engine.ok_or(UrbanPulseError::EngineNotDefined)?;
        let sink: SharedSink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));

        let map = MapSurface::mount(engine, self.map_options, sink.clone())?;
        let control = ControlPanel::new(self.policy, sink.clone());

        Ok(ViewShell {
            transport,
            map,
            control,
            catalog: CameraCatalog::new(self.cameras),
            active_layer: MapLayer::Traffic,
            selected_cameras: Vec::new(),
            simulation: None,
            diagnostics: Diagnostics::new(sink, Component::Shell),
        })
    }
}

impl<T: Transport, E: MapEngine> Default for DashboardBuilder<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
