use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use urbanpulse_core::{dashboard::sequencer::SequencingPolicy, transport::HttpTransport};
use urbanpulse_schemas::layer::MapLayer;

mod config;
mod plotting;
mod workflow;

/// Scenario dashboard for the UrbanPulse city twin.
#[derive(Parser, Debug)]
#[command(name = "urbanpulse", version, about)]
struct Cli {
    /// Dashboard settings file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL. Overrides the config file and URBANPULSE_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Offline camera catalog: a YAML file or a directory of them.
    #[arg(long, global = true)]
    cameras: Option<PathBuf>,

    /// How overlapping simulation responses are reconciled
    /// (`last-resolved` or `latest-request`).
    #[arg(long, global = true)]
    sequencing: Option<SequencingPolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Checks that the backend is reachable.
    Status,
    /// Prints the current weather reported by the backend.
    Weather,
    /// Fetches and summarises a map data layer.
    Layer {
        /// `traffic` or `aqi`.
        layer: MapLayer,
    },
    /// Lists the traffic cameras available for selection.
    Cameras,
    /// Selects the camera nearest a point and runs a vehicle-reduction scenario.
    Simulate(SimulateArgs),
    /// Prints the congestion colour legend.
    Legend,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Vehicle reduction in percent, clamped to 0..=100. Defaults to 30.
    #[arg(long, allow_negative_numbers = true)]
    reduction: Option<f64>,

    /// Writes a before/after metrics chart to this PNG.
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Writes a snapshot of the recoloured map to this PNG.
    #[arg(long)]
    map: Option<PathBuf>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let overrides = config::Overrides {
        api_url: cli.api_url,
        sequencing: cli.sequencing,
        cameras_file: cli.cameras,
    };
    let config = config::AppConfig::load(cli.config.as_deref(), &overrides)?;
    let transport = HttpTransport::new(&config.api_url)
        .with_context(|| format!("Cannot use backend URL '{}'", config.api_url))?;

    match cli.command {
        Command::Status => workflow::show_status(&transport).await?,
        Command::Weather => workflow::show_weather(&transport).await?,
        Command::Layer { layer } => workflow::show_layer(&transport, layer).await?,
        Command::Cameras => workflow::show_cameras(&config, &transport).await?,
        Command::Legend => workflow::show_legend(),
        Command::Simulate(args) => {
            let scenario = workflow::ScenarioRequest {
                lon: args.lon,
                lat: args.lat,
                reduction_pct: args.reduction,
                chart: args.chart,
                map: args.map,
            };
            workflow::run_scenario(&config, transport, &scenario).await?;
        }
    }

    Ok(())
}
