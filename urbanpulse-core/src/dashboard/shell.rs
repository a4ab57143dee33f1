use super::{
    control::{ControlPanel, SimulationOutcome},
    engine::MapEngine,
    map::{CongestionColor, MapSurface},
    metrics::MetricsTable,
};
use crate::{
    cameras::CameraCatalog,
    diagnostics::Diagnostics,
    error::ControlError,
    transport::Transport,
};
use chrono::Utc;
use urbanpulse_schemas::{camera::CameraSelection, layer::MapLayer, simulation::SimulationResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendEntry {
    pub color: CongestionColor,
    pub label: &'static str,
}

/// Top-level dashboard state: selection, last result and the child components.
pub struct ViewShell<T: Transport, E: MapEngine> {
    pub(super) transport: T,
    pub(super) map: MapSurface<E>,
    pub(super) control: ControlPanel,
    pub(super) catalog: CameraCatalog,
    pub(super) active_layer: MapLayer,
    pub(super) selected_cameras: Vec<CameraSelection>,
    pub(super) simulation: Option<SimulationResponse>,
    pub(super) diagnostics: Diagnostics,
}

impl<T: Transport, E: MapEngine> ViewShell<T, E> {
    /// Completes the map load and fetches camera metadata if none was supplied.
    pub async fn load(&mut self) {
        self.map.on_load(&self.transport).await;
        if self.catalog.is_empty() {
            match self.transport.cameras().await {
                Ok(cameras) => {
                    self.diagnostics
                        .info(format!("Loaded {} cameras from backend", cameras.len()));
                    self.catalog = CameraCatalog::new(cameras);
                }
                Err(e) => self.diagnostics.error(format!("Failed to load camera list: {}", e)),
            }
        }
    }

    pub async fn select_layer(&mut self, layer: MapLayer) {
        self.active_layer = layer;
        self.map.show_layer(layer, &self.transport).await;
    }

    /// Resolves a map click to the nearest camera and makes it the selection.
    pub fn click_map(&mut self, lon: f64, lat: f64) -> Option<&CameraSelection> {
        let selection = self.map.click(lon, lat, &self.catalog, Utc::now())?;
        self.diagnostics
            .info(format!("Selected cameras: [{}]", selection.camera_id));
        self.selected_cameras = vec![selection];
        self.selected_cameras.first()
    }

    pub fn select_cameras(&mut self, cameras: Vec<CameraSelection>) {
        self.selected_cameras = cameras;
    }

    pub fn set_reduction(&mut self, value: f64) -> f64 {
        self.control.set_reduction(value)
    }

    /// Presses the run button. A successful response replaces the stored
    /// result and recolours the traffic layer; failures leave both untouched.
    pub async fn run_simulation(&mut self) -> Result<SimulationOutcome, ControlError> {
        let outcome = self
            .control
            .run_simulation(&self.transport, &self.selected_cameras)
            .await?;
        self.apply_outcome(&outcome);
        Ok(outcome)
    }

    /// Routes a settled outcome into the displayed state.
    pub fn apply_outcome(&mut self, outcome: &SimulationOutcome) {
        if let SimulationOutcome::Applied(response) = outcome {
            self.map.apply_simulation(response);
            self.simulation = Some(response.clone());
        }
    }

    /// Clears the result and restores the panel defaults.
    pub fn reset(&mut self) {
        self.control.reset();
        self.simulation = None;
    }

    pub fn metrics(&self) -> Option<MetricsTable> {
        self.simulation.as_ref().map(MetricsTable::from_response)
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        CongestionColor::ALL
            .iter()
            .map(|&color| LegendEntry {
                color,
                label: color.label(),
            })
            .collect()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn map(&self) -> &MapSurface<E> {
        &self.map
    }

    pub fn control(&self) -> &ControlPanel {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut ControlPanel {
        &mut self.control
    }

    pub fn catalog(&self) -> &CameraCatalog {
        &self.catalog
    }

    pub fn active_layer(&self) -> MapLayer {
        self.active_layer
    }

    pub fn selected_cameras(&self) -> &[CameraSelection] {
        &self.selected_cameras
    }

    pub fn simulation(&self) -> Option<&SimulationResponse> {
        self.simulation.as_ref()
    }

    /// Tears the dashboard down, releasing the map instance.
    pub fn unmount(self) -> E {
        self.map.unmount()
    }
}
