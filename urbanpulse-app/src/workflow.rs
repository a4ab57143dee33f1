use crate::config::AppConfig;
use crate::plotting;
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;
use urbanpulse_core::{
    cameras::{haversine_m, CameraCatalog},
    dashboard::{
        builder::DashboardBuilder,
        control::SimulationOutcome,
        engine::InMemoryMap,
        map::CongestionColor,
        metrics::{MetricsTable, Trend},
    },
    transport::{HttpTransport, Transport},
};
use urbanpulse_schemas::{camera::CameraSelection, geojson::FeatureCollection, layer::MapLayer};

/// Inputs for one simulated scenario.
#[derive(Debug, Clone)]
pub struct ScenarioRequest {
    pub lon: f64,
    pub lat: f64,
    pub reduction_pct: Option<f64>,
    pub chart: Option<PathBuf>,
    pub map: Option<PathBuf>,
}

pub async fn show_status(transport: &HttpTransport) -> Result<()> {
    let status = transport.status().await.context("Backend status check failed")?;
    print_json("Backend Status", &status)
}

pub async fn show_weather(transport: &HttpTransport) -> Result<()> {
    let weather = transport.weather().await.context("Weather lookup failed")?;
    print_json("Weather", &weather)
}

fn print_json(title: &str, value: &Value) -> Result<()> {
    println!("\n--- [{}] ---", title);
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Fetches one data layer and prints a per-feature summary.
pub async fn show_layer(transport: &HttpTransport, layer: MapLayer) -> Result<()> {
    let data = match layer {
        MapLayer::Traffic => transport.traffic().await,
        MapLayer::Aqi => transport.aqi().await,
    }
    .with_context(|| format!("Failed to load the {} layer", layer))?;

    println!("\n--- [{}] ---", layer.title());
    println!("Features: {}", data.len());
    if let Some((min_lon, min_lat, max_lon, max_lat)) = data.bounds() {
        println!(
            "Bounds:   lon {:.4} .. {:.4}, lat {:.4} .. {:.4}",
            min_lon, max_lon, min_lat, max_lat
        );
    }
    match layer {
        MapLayer::Traffic => print_road_segments(&data),
        MapLayer::Aqi => print_stations(&data),
    }
    Ok(())
}

fn print_road_segments(data: &FeatureCollection) {
    let mut total_m = 0.0;
    for (i, feature) in data.line_strings().enumerate() {
        let length_m: f64 = feature
            .geometry
            .positions()
            .windows(2)
            .map(|w| haversine_m(w[0][0], w[0][1], w[1][0], w[1][1]))
            .sum();
        total_m += length_m;
        let name = feature.property_str("name").unwrap_or("(unnamed)");
        println!("  - Segment {:>3}: {:<28} {:>8.0} m", i + 1, name, length_m);
    }
    println!("Total road length: {:.2} km", total_m / 1000.0);
}

fn print_stations(data: &FeatureCollection) {
    for feature in data.points() {
        let station = feature.property_str("station").unwrap_or("(unnamed)");
        match feature.property_f64("aqi") {
            Some(aqi) => println!("  - {:<28} AQI {:>5.0}", station, aqi),
            None => println!("  - {:<28} AQI   n/a", station),
        }
    }
}

/// Lists the configured offline catalog, or the backend's cameras.
pub async fn show_cameras(config: &AppConfig, transport: &HttpTransport) -> Result<()> {
    let cameras = match config.load_cameras()? {
        Some(cameras) => cameras,
        None => transport.cameras().await.context("Failed to fetch camera list")?,
    };

    println!("\n--- [Traffic Cameras] ---");
    for camera in &cameras {
        println!(
            "  - {:<8} lat {:>9.5}  lon {:>10.5}  {}",
            camera.camera_id, camera.latitude, camera.longitude, camera.image_link
        );
    }
    println!("Total: {} cameras", cameras.len());
    Ok(())
}

pub fn show_legend() {
    println!("\n--- [Traffic Legend] ---");
    for color in CongestionColor::ALL {
        println!("  {} {}", color.hex(), color.label());
    }
}

/// Drives the dashboard end to end: mount, load, click, run, report.
pub async fn run_scenario(
    config: &AppConfig,
    transport: HttpTransport,
    scenario: &ScenarioRequest,
) -> Result<()> {
    println!("\n--- [Workflow] Running Traffic Reduction Scenario ---");

    let mut builder = DashboardBuilder::new()
        .with_transport(transport)
        .with_engine(InMemoryMap::new())
        .with_sequencing(config.sequencing);
    if let Some(cameras) = config.load_cameras()? {
        builder = builder.with_cameras(cameras);
    }
    let mut shell = builder.build().context("Failed to mount the dashboard")?;

    // Background load failures are reported through diagnostics only.
    shell.load().await;
    shell.click_map(scenario.lon, scenario.lat);

    if let Some(pct) = scenario.reduction_pct {
        let applied = shell.set_reduction(pct);
        if applied != pct {
            info!("Reduction {}% clamped to {}%", pct, applied);
        }
    }

    let outcome = shell.run_simulation().await?;
    let response = match outcome {
        SimulationOutcome::Applied(response) => response,
        SimulationOutcome::Failed(message) => bail!("{}", message),
        SimulationOutcome::Stale => bail!("Simulation response was superseded by a newer request"),
    };

    let table = MetricsTable::from_response(&response);
    let color = shell.map().traffic_color();
    let selection = shell.selected_cameras().first();
    print_summary_report(scenario, selection, shell.catalog(), color, &table);

    if let Some(path) = &scenario.chart {
        plotting::plot_metrics_comparison(path, &table)
            .with_context(|| format!("Failed to write metrics chart to {:?}", path))?;
    }
    if let Some(path) = &scenario.map {
        plotting::render_map(path, shell.map().engine())
            .with_context(|| format!("Failed to write map snapshot to {:?}", path))?;
    }

    shell.unmount();
    Ok(())
}

fn print_summary_report(
    scenario: &ScenarioRequest,
    selection: Option<&CameraSelection>,
    catalog: &CameraCatalog,
    color: CongestionColor,
    table: &MetricsTable,
) {
    println!("\n\n--- [Scenario Report] ---");
    println!("========================================");
    if let Some(selection) = selection {
        let distance_m = haversine_m(scenario.lon, scenario.lat, selection.longitude, selection.latitude);
        println!(
            "Camera: {} ({:.5}, {:.5}), {:.0} m from the selected point, {} cameras known",
            selection.camera_id,
            selection.latitude,
            selection.longitude,
            distance_m,
            catalog.len()
        );
    }
    println!("Vehicle Reduction: {:.0}%", table.reduction_pct);
    println!("Traffic Layer: {} ({})", color.hex(), color.label());
    println!("----------------------------------------");

    println!("{:<22} {:>16} {:>16} {:>10}", "Metric", "Baseline", "Simulated", "Change");
    for row in &table.rows {
        let marker = match row.delta.trend {
            Trend::Up => " (worse)",
            Trend::Down => " (better)",
            Trend::Neutral => "",
        };
        println!(
            "{:<22} {:>16} {:>16} {:>10}{}",
            row.label(),
            row.before_text,
            row.after_text,
            row.delta.to_string(),
            marker
        );
    }
    println!("========================================");
}
