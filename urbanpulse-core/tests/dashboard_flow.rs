use serde_json::{json, Value};
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use urbanpulse_core::{
    dashboard::{
        builder::DashboardBuilder,
        control::SimulationOutcome,
        engine::{InMemoryMap, PaintValue},
        map::CongestionColor,
        metrics::{MetricKind, Trend, TrendStyle},
        sequencer::SequencingPolicy,
        shell::ViewShell,
    },
    diagnostics::{Component, Level, MemorySink},
    error::{ControlError, TransportError},
    transport::Transport,
};
use urbanpulse_schemas::{
    camera::CameraMeta,
    geojson::FeatureCollection,
    layer::MapLayer,
    simulation::{SimulatedMetrics, SimulationMetrics, SimulationRequest, SimulationResponse},
};

enum Scripted {
    Ok(SimulationResponse),
    Status(u16, &'static str),
}

#[derive(Default)]
struct FakeBackend {
    traffic: Option<FeatureCollection>,
    aqi: Option<FeatureCollection>,
    cameras: Option<Vec<CameraMeta>>,
    simulate: Mutex<VecDeque<Scripted>>,
    simulate_calls: AtomicUsize,
    traffic_calls: AtomicUsize,
    aqi_calls: AtomicUsize,
    last_request: Mutex<Option<SimulationRequest>>,
}

fn unavailable(path: &str) -> TransportError {
    TransportError::Status {
        status: 503,
        message: format!("{} unavailable", path),
    }
}

impl Transport for FakeBackend {
    async fn status(&self) -> Result<Value, TransportError> {
        Ok(json!({ "status": "healthy" }))
    }

    async fn traffic(&self) -> Result<FeatureCollection, TransportError> {
        self.traffic_calls.fetch_add(1, Ordering::SeqCst);
        self.traffic.clone().ok_or_else(|| unavailable("/data/traffic"))
    }

    async fn aqi(&self) -> Result<FeatureCollection, TransportError> {
        self.aqi_calls.fetch_add(1, Ordering::SeqCst);
        self.aqi.clone().ok_or_else(|| unavailable("/data/aqi"))
    }

    async fn weather(&self) -> Result<Value, TransportError> {
        Err(unavailable("/data/weather"))
    }

    async fn cameras(&self) -> Result<Vec<CameraMeta>, TransportError> {
        self.cameras.clone().ok_or_else(|| unavailable("/data/cameras"))
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse, TransportError> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match self.simulate.lock().unwrap().pop_front() {
            Some(Scripted::Ok(response)) => Ok(response),
            Some(Scripted::Status(status, body)) => Err(TransportError::Status {
                status,
                message: body.to_string(),
            }),
            None => Err(unavailable("/simulate")),
        }
    }
}

fn traffic() -> FeatureCollection {
    serde_json::from_value(json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "segment_id": 1, "congestion_level": 0.5 },
              "geometry": { "type": "LineString", "coordinates": [[103.85, 1.29], [103.851, 1.291]] } },
            { "type": "Feature", "properties": { "segment_id": 2, "congestion_level": 0.8 },
              "geometry": { "type": "LineString", "coordinates": [[103.86, 1.30], [103.861, 1.301]] } }
        ]
    }))
    .unwrap()
}

fn aqi() -> FeatureCollection {
    serde_json::from_value(json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "aqi": 65, "pm25": 25.0, "category": "Moderate", "station": "Central" },
              "geometry": { "type": "Point", "coordinates": [103.85, 1.29] } }
        ]
    }))
    .unwrap()
}

fn cameras() -> Vec<CameraMeta> {
    vec![
        CameraMeta {
            camera_id: "1701".into(),
            latitude: 1.29,
            longitude: 103.85,
            image_link: "https://images.example/1701.jpg".into(),
        },
        CameraMeta {
            camera_id: "4703".into(),
            latitude: 1.34,
            longitude: 103.70,
            image_link: "https://images.example/4703.jpg".into(),
        },
    ]
}

fn response(before: f64, after: f64) -> SimulationResponse {
    SimulationResponse {
        baseline: SimulationMetrics {
            congestion: before,
            total_vehicle_count: 320.0,
            pm25: 16.0,
            aqi: 59.0,
            aqi_category: "Moderate".into(),
        },
        simulated: SimulatedMetrics {
            metrics: SimulationMetrics {
                congestion: after,
                total_vehicle_count: 224.0,
                pm25: 11.2,
                aqi: 47.0,
                aqi_category: "Good".into(),
            },
            reduce_vehicles_pct: 30.0,
        },
    }
}

fn backend() -> FakeBackend {
    FakeBackend {
        traffic: Some(traffic()),
        aqi: Some(aqi()),
        cameras: Some(cameras()),
        ..FakeBackend::default()
    }
}

fn dashboard(
    backend: FakeBackend,
    policy: SequencingPolicy,
) -> (ViewShell<FakeBackend, InMemoryMap>, MemorySink) {
    let sink = MemorySink::new();
    let shell = DashboardBuilder::new()
        .with_transport(backend)
        .with_engine(InMemoryMap::new())
        .with_sequencing(policy)
        .with_diagnostics(Arc::new(sink.clone()))
        .build()
        .unwrap();
    (shell, sink)
}

fn line_color(shell: &ViewShell<FakeBackend, InMemoryMap>) -> Option<String> {
    shell
        .map()
        .engine()
        .paint("traffic-lines", "line-color")
        .and_then(PaintValue::as_color)
        .map(str::to_string)
}

#[tokio::test]
async fn load_replaces_traffic_source_once_and_fetches_cameras() {
    let (mut shell, _) = dashboard(backend(), SequencingPolicy::default());
    assert_eq!(shell.map().engine().source_data("traffic"), Some(&FeatureCollection::empty()));

    shell.load().await;
    shell.load().await;

    assert_eq!(shell.map().engine().source_data("traffic").map(|d| d.len()), Some(2));
    assert_eq!(shell.transport().traffic_calls.load(Ordering::SeqCst), 1);
    assert_eq!(shell.catalog().len(), 2);
    assert_eq!(shell.map().engine().center(), [103.85, 1.29]);
    assert_eq!(shell.map().engine().zoom(), 12.0);
}

#[tokio::test]
async fn traffic_failure_is_logged_and_swallowed() {
    let failing = FakeBackend {
        cameras: Some(cameras()),
        ..FakeBackend::default()
    };
    let (mut shell, sink) = dashboard(failing, SequencingPolicy::default());

    shell.load().await;

    assert!(shell.map().engine().source_data("traffic").unwrap().is_empty());
    assert!(!shell.map().is_loaded());
    assert!(sink.contains(Level::Error, Component::Map, "/data/traffic unavailable"));
    assert_eq!(shell.control().error(), None);
}

#[tokio::test]
async fn simulate_without_camera_never_hits_backend() {
    let (mut shell, _) = dashboard(backend(), SequencingPolicy::default());
    shell.load().await;

    let err = shell.run_simulation().await.unwrap_err();

    assert_eq!(err, ControlError::NoCameraSelected);
    assert_eq!(shell.control().error(), Some("No camera selected."));
    assert_eq!(shell.transport().simulate_calls.load(Ordering::SeqCst), 0);
    assert!(shell.simulation().is_none());
}

#[tokio::test]
async fn click_then_simulate_recolours_map_and_fills_metrics() {
    let fake = backend();
    fake.simulate.lock().unwrap().push_back(Scripted::Ok(response(0.5, 0.3)));
    let (mut shell, _) = dashboard(fake, SequencingPolicy::default());
    shell.load().await;

    let selected = shell.click_map(103.8502, 1.2901).cloned().unwrap();
    assert_eq!(selected.camera_id, "1701");
    shell.set_reduction(30.0);

    let outcome = shell.run_simulation().await.unwrap();
    assert!(matches!(outcome, SimulationOutcome::Applied(_)));

    let sent = shell.transport().last_request.lock().unwrap().clone().unwrap();
    assert_eq!(sent.vehicle_reduction, 30.0);
    assert_eq!(sent.cameras, vec![selected]);

    assert_eq!(line_color(&shell).as_deref(), Some(CongestionColor::Green.hex()));
    let table = shell.metrics().unwrap();
    let congestion = table.row(MetricKind::Congestion).unwrap();
    assert_eq!(congestion.delta.magnitude, "0.20");
    assert_eq!(congestion.delta.trend, Trend::Down);
    assert_eq!(congestion.delta.trend.style(), TrendStyle::Green);
    assert!(!shell.control().is_busy());
}

#[tokio::test]
async fn backend_rejection_shows_body_and_keeps_previous_result() {
    let fake = backend();
    {
        let mut script = fake.simulate.lock().unwrap();
        script.push_back(Scripted::Ok(response(0.5, 0.8)));
        script.push_back(Scripted::Status(422, "invalid percentage"));
    }
    let (mut shell, _) = dashboard(fake, SequencingPolicy::default());
    shell.load().await;
    shell.click_map(103.85, 1.29);

    shell.run_simulation().await.unwrap();
    assert_eq!(line_color(&shell).as_deref(), Some(CongestionColor::Red.hex()));

    let outcome = shell.run_simulation().await.unwrap();
    assert_eq!(outcome, SimulationOutcome::Failed("invalid percentage".into()));
    assert_eq!(shell.control().error(), Some("invalid percentage"));
    assert_eq!(shell.simulation(), Some(&response(0.5, 0.8)));
    assert_eq!(line_color(&shell).as_deref(), Some(CongestionColor::Red.hex()));
}

#[tokio::test]
async fn reset_clears_result_error_and_restores_default() {
    let fake = backend();
    fake.simulate.lock().unwrap().push_back(Scripted::Ok(response(0.5, 0.3)));
    let (mut shell, _) = dashboard(fake, SequencingPolicy::default());
    shell.load().await;
    shell.click_map(103.85, 1.29);
    shell.set_reduction(75.0);
    shell.run_simulation().await.unwrap();
    shell.run_simulation().await.unwrap();
    assert!(shell.control().error().is_some());

    shell.reset();

    assert_eq!(shell.control().reduction_pct(), 30.0);
    assert_eq!(shell.control().error(), None);
    assert!(shell.simulation().is_none());
    assert!(shell.metrics().is_none());
}

#[tokio::test]
async fn out_of_order_responses_follow_sequencing_policy() {
    for (policy, expected_after) in [
        (SequencingPolicy::LastResolvedWins, 0.2),
        (SequencingPolicy::LatestRequestWins, 0.9),
    ] {
        let (mut shell, _) = dashboard(backend(), policy);
        shell.load().await;
        shell.click_map(103.85, 1.29);
        let cams = shell.selected_cameras().to_vec();

        let first = shell.control_mut().begin_simulation(&cams).unwrap();
        let second = shell.control_mut().begin_simulation(&cams).unwrap();
        assert!(shell.control().is_busy());

        let late = shell.control_mut().settle(second, Ok(response(0.5, 0.9)));
        shell.apply_outcome(&late);
        let early = shell.control_mut().settle(first, Ok(response(0.5, 0.2)));
        shell.apply_outcome(&early);

        assert!(!shell.control().is_busy());
        assert_eq!(
            shell.simulation().map(|r| r.simulated.metrics.congestion),
            Some(expected_after),
            "policy {}",
            policy
        );
    }
}

#[tokio::test]
async fn run_button_is_disabled_while_busy() {
    let (mut shell, _) = dashboard(backend(), SequencingPolicy::default());
    shell.load().await;
    shell.click_map(103.85, 1.29);
    let cams = shell.selected_cameras().to_vec();
    let _pending = shell.control_mut().begin_simulation(&cams).unwrap();

    assert_eq!(shell.run_simulation().await.unwrap_err(), ControlError::Busy);
    assert_eq!(shell.transport().simulate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn aqi_layer_loads_lazily_and_toggles_visibility() {
    let (mut shell, _) = dashboard(backend(), SequencingPolicy::default());
    shell.load().await;
    assert!(!shell.map().engine().layer("aqi-points").unwrap().visible);

    shell.select_layer(MapLayer::Aqi).await;
    shell.select_layer(MapLayer::Traffic).await;
    shell.select_layer(MapLayer::Aqi).await;

    let engine = shell.map().engine();
    assert_eq!(shell.active_layer(), MapLayer::Aqi);
    assert!(engine.layer("aqi-points").unwrap().visible);
    assert!(!engine.layer("traffic-lines").unwrap().visible);
    assert_eq!(engine.source_data("aqi").map(|d| d.len()), Some(1));
    assert_eq!(shell.transport().aqi_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn click_without_catalog_selects_nothing() {
    let no_cameras = FakeBackend {
        traffic: Some(traffic()),
        ..FakeBackend::default()
    };
    let (mut shell, sink) = dashboard(no_cameras, SequencingPolicy::default());
    shell.load().await;

    assert!(shell.click_map(103.85, 1.29).is_none());
    assert!(shell.selected_cameras().is_empty());
    assert!(sink.contains(Level::Error, Component::Shell, "camera list"));
    assert!(sink.contains(Level::Warn, Component::Map, "No camera known"));
}

#[tokio::test]
async fn legend_lists_three_congestion_bands() {
    let (shell, _) = dashboard(backend(), SequencingPolicy::default());
    let labels: Vec<_> = shell.legend().iter().map(|e| e.label).collect();
    assert_eq!(labels, vec!["Low congestion", "Moderate", "High congestion"]);
}

#[tokio::test]
async fn unmount_releases_map() {
    let (shell, _) = dashboard(backend(), SequencingPolicy::default());
    let engine = shell.unmount();
    assert!(engine.is_removed());
}
