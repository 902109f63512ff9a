//! pipeline-route - plan a pipeline route between two points.
//!
//! Usage:
//!   pipeline-route --start 52.05,103.70 --goal 52.10,103.78 --alternatives 2 --pretty

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pipeline_cli::{load_search_config, load_terrain, parse_position, parse_weights, Config, RouteReport};
use pipeline_core::{CriteriaWeights, PipeMaterial, PipeSpec, PipeType, RoutePlanner};

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-criteria pipeline route search")]
struct Args {
    /// Start point as LAT,LON
    #[arg(long, allow_hyphen_values = true)]
    start: String,

    /// Goal point as LAT,LON
    #[arg(long, allow_hyphen_values = true)]
    goal: String,

    /// oil, gas or water
    #[arg(long, default_value = "oil")]
    pipe_type: PipeType,

    /// Pipe diameter in millimetres
    #[arg(long, default_value_t = 500.0)]
    diameter: f64,

    /// steel, plastic or composite
    #[arg(long, default_value = "steel")]
    material: PipeMaterial,

    /// Maximum operating pressure in atmospheres
    #[arg(long, default_value_t = 50.0)]
    pressure: f64,

    /// Criterion weights, e.g. distance=0.5,terrain_difficulty=0.5
    #[arg(long)]
    weights: Option<String>,

    /// Number of alternative routes to search for
    #[arg(long, default_value_t = 2)]
    alternatives: usize,

    /// JSON terrain description (overrides PIPELINE_TERRAIN_FILE)
    #[arg(long)]
    terrain: Option<PathBuf>,

    /// JSON search config (overrides PIPELINE_SEARCH_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log as JSON lines on stderr
    #[arg(long)]
    log_json: bool,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pipeline_core=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(io::stderr)))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    let env = Config::from_env();
    init_tracing(args.log_json || env.log_json);

    let start = parse_position(&args.start)?;
    let goal = parse_position(&args.goal)?;
    let weights = match args.weights.as_deref() {
        Some(value) => parse_weights(value)?,
        None => CriteriaWeights::default(),
    };
    let pipe_spec = PipeSpec {
        pipe_type: args.pipe_type,
        diameter_mm: args.diameter,
        material: args.material,
        max_pressure_atm: args.pressure,
    };
    pipe_spec.validate()?;

    let search_config = load_search_config(args.config.or(env.search_config_path).as_deref())?;
    let terrain = load_terrain(args.terrain.or(env.terrain_path).as_deref())?;

    tracing::info!("Planning {} -> {} with {} alternatives", start, goal, args.alternatives);
    let routes = RoutePlanner::new(&terrain, pipe_spec.clone())
        .with_config(search_config)
        .find_routes(start, goal, &weights, args.alternatives)
        .inspect_err(|err| {
            if err.is_no_path() {
                tracing::warn!("No route; try a larger max_iterations or different weights");
            }
        })?;

    let report = RouteReport::new(start, goal, pipe_spec, weights, routes);
    println!("{}", report.to_json(args.pretty)?);
    Ok(())
}
