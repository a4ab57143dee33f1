use crate::camera::CameraSelection;
use serde::{Deserialize, Serialize};

/// A snapshot of the simulated city at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    /// Normalised city-wide congestion in `[0, 1]`.
    pub congestion: f64,
    pub total_vehicle_count: f64,
    /// PM2.5 concentration in µg/m³.
    #[serde(alias = "pm25_estimate")]
    pub pm25: f64,
    pub aqi: f64,
    pub aqi_category: String,
}

/// The post-scenario snapshot, which also echoes the applied reduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedMetrics {
    #[serde(flatten)]
    pub metrics: SimulationMetrics,
    pub reduce_vehicles_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub baseline: SimulationMetrics,
    pub simulated: SimulatedMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Percentage of vehicles removed, `0..=100`.
    pub vehicle_reduction: f64,
    pub cameras: Vec<CameraSelection>,
}
