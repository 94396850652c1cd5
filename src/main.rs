mod api;
mod server;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use campaign_sim::synthetic::{generate_synthetic_context, SyntheticCampaign};
use campaign_sim::{
    format_float, format_number, format_percent, EngineConfig, SimulationContext, SimulationEngine,
    SimulationResult,
};

#[derive(Parser)]
#[command(name = "campaign-sim", about = "Campaign performance simulator")]
struct Cli {
    /// Engine config (TOML). Defaults to $SIM_CONFIG_PATH or config/simulation.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    Simulate(SimulateArgs),
    Demo(DemoArgs),
    Serve(ServeArgs),
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct SimulateArgs {
    /// Simulation context as JSON; `-` reads stdin.
    #[arg(long, default_value = "-")]
    input: String,
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    details: bool,
}

#[derive(Args, Debug, Clone)]
struct DemoArgs {
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = 28)]
    history_days: usize,
    #[arg(long, default_value_t = 30)]
    days: i64,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    details: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            seed: 42,
            history_days: 28,
            days: 30,
            json: false,
            details: false,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long, default_value = "config/simulation.toml")]
    path: PathBuf,
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Demo(DemoArgs::default()));

    if let Command::InitConfig(args) = &command {
        return init_config(args);
    }

    let (config, config_path) = EngineConfig::load(cli.config).map_err(|err| err.to_string())?;
    if let Some(path) = config_path.filter(|path| path.exists()) {
        tracing::info!(path = %path.display(), "loaded engine config");
    }
    let engine = SimulationEngine::new(config);

    match command {
        Command::Simulate(args) => run_simulate(&engine, args).await,
        Command::Demo(args) => run_demo(&engine, args).await,
        Command::Serve(args) => server::serve(engine, args).await,
        Command::InitConfig(_) => Ok(()),
    }
}

async fn run_simulate(engine: &SimulationEngine, args: SimulateArgs) -> Result<(), String> {
    let payload = read_input(&args.input)?;
    let context: SimulationContext = serde_json::from_str(&payload)
        .map_err(|err| format!("failed to parse simulation context: {}", err))?;
    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| engine.default_timeout());

    let result = engine
        .run_with_timeout(context, timeout)
        .await
        .map_err(|err| err.to_string())?;
    emit(&result, args.json, args.details)
}

async fn run_demo(engine: &SimulationEngine, args: DemoArgs) -> Result<(), String> {
    let as_of = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or_else(Utc::now);
    let spec = SyntheticCampaign {
        seed: args.seed,
        history_days: args.history_days,
        horizon_days: args.days,
        as_of,
        ..SyntheticCampaign::default()
    };
    let context = generate_synthetic_context(&spec);
    let result = engine
        .run_with_timeout(context, engine.default_timeout())
        .await
        .map_err(|err| err.to_string())?;
    emit(&result, args.json, args.details)
}

fn emit(result: &SimulationResult, json: bool, details: bool) -> Result<(), String> {
    if json {
        let payload = serde_json::to_string_pretty(result)
            .map_err(|err| format!("failed to serialize result: {}", err))?;
        println!("{}", payload);
        return Ok(());
    }
    print_summary(result, details);
    Ok(())
}

fn print_summary(result: &SimulationResult, details: bool) {
    let metadata = &result.model_metadata;
    println!(
        "Simulation {} for campaign {}",
        result.simulation_id, result.campaign_id
    );
    println!(
        "Model: {} | data quality {} | {} ms",
        metadata.forecast_model,
        format_float(metadata.data_quality.overall, 2),
        format_number(metadata.processing_time_ms as f64)
    );
    println!(
        "Baseline: {} points",
        format_number(result.trajectories.baseline.len() as f64)
    );

    println!("\nScenarios:");
    for scenario in &result.scenarios {
        println!(
            "  {:<14} probability {} | confidence {} | factors: {}",
            scenario.name,
            format_percent(scenario.probability),
            format_percent(scenario.confidence),
            scenario.key_factors.join(", ")
        );
    }
    for failure in &result.scenario_failures {
        println!("  {:<14} failed: {}", failure.name, failure.error);
    }

    if result.risks.is_empty() {
        println!("\nNo risks detected.");
    } else {
        println!("\nRisks:");
        for risk in &result.risks {
            println!(
                "  [{}] {} (p={} impact={} conf={})",
                risk.severity.label(),
                risk.description,
                format_float(risk.probability, 2),
                format_float(risk.impact, 2),
                format_float(risk.confidence, 2)
            );
            if details {
                for recommendation in &risk.recommendations {
                    println!("      - {}", recommendation);
                }
            }
        }
    }

    if !result.recommendations.is_empty() {
        println!("\nRecommendations:");
        for recommendation in &result.recommendations {
            println!(
                "  ({}) {} on {}: +{} expected, {}",
                recommendation.priority,
                recommendation.pivot_type.label(),
                recommendation.impact_estimate.metric,
                format_percent(recommendation.impact_estimate.improvement),
                recommendation.implementation.timeline
            );
            if details {
                for step in &recommendation.implementation.steps {
                    println!("      - {}", step);
                }
            }
        }
    }

    if details {
        for scenario_risks in &result.scenario_risks {
            println!(
                "\nScenario {}: {} risks",
                scenario_risks.scenario,
                scenario_risks.risks.len()
            );
        }
    }
}

fn init_config(args: &InitConfigArgs) -> Result<(), String> {
    if args.path.exists() && !args.force {
        return Err(format!(
            "config already exists at {} (pass --force to overwrite)",
            args.path.display()
        ));
    }
    EngineConfig::default()
        .write(&args.path)
        .map_err(|err| err.to_string())?;
    println!("Wrote default config to {}", args.path.display());
    Ok(())
}

fn read_input(source: &str) -> Result<String, String> {
    if source != "-" {
        return std::fs::read_to_string(source)
            .map_err(|err| format!("failed reading {}: {}", source, err));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("failed reading stdin: {}", err))?;
    if buffer.trim().is_empty() {
        return Err("missing simulation context: pass --input or pipe JSON on stdin".to_string());
    }
    Ok(buffer)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("campaign_sim=info,tower_http=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
