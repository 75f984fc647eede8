//! Double pendulum simulator CLI
//!
//! Runs the deterministic scenario suite, or drives a live engine on the
//! tokio runtime and reports its state once per second.

use clap::Parser;
use pendulum_core::{BackgroundDriver, DriverConfig, Preset, SimulationEngine, SimulationFacade};
use pendulum_env::TokioContext;
use pendulum_sim::scenarios::ScenarioId;
use pendulum_sim::{summary_json, ScenarioResult, ScenarioRunner};
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Frames are recorded every this many ticks in export mode.
const EXPORT_EVERY: u64 = 10;

/// Double pendulum simulator
#[derive(Parser, Debug)]
#[command(name = "pendulum-sim")]
#[command(about = "Run deterministic scenarios or a live double pendulum", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (energy_drift, single_rod, massless_bob, zero_length_fault,
    /// reset_recovery, concurrent_load, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Driver ticks per scenario
    #[arg(long, default_value = "1000")]
    steps: u64,

    /// Preset applied before a live run
    #[arg(short, long)]
    preset: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export scenario frames to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Drive a live engine for this many wall-clock seconds
    #[arg(long)]
    live: Option<f64>,
}

/// Steps a real engine in the background and logs it once per second.
fn run_live(args: &Args, seconds: f64) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;

    runtime.block_on(async {
        let engine = SimulationEngine::new();
        let facade = SimulationFacade::new(engine.clone());

        if let Some(name) = &args.preset {
            let preset: Preset = name.parse()?;
            let response = facade.apply_preset(preset);
            if !response.is_success() {
                return Err(format!("preset {} was only partly applied", preset));
            }
        }

        let driver = BackgroundDriver::new(TokioContext::shared(), engine, DriverConfig::default());
        let handle = driver.spawn().map_err(|e| e.to_string())?;

        let mut remaining = seconds.max(0.0);
        while remaining > 0.0 {
            let slice = remaining.min(1.0);
            tokio::time::sleep(Duration::from_secs_f64(slice)).await;
            remaining -= slice;

            let state = facade.state();
            info!(
                "theta_1={:.4} theta_2={:.4} | E={:.3} (KE={:.3}, PE={:.3})",
                state.theta_1,
                state.theta_2,
                state.energy.total,
                state.energy.kinetic,
                state.energy.potential
            );
        }

        let stats = handle.stats();
        info!(
            "Driver ran {} ticks ({} faulted)",
            stats.ticks, stats.faults
        );

        if args.json {
            let state = serde_json::to_string_pretty(&facade.state()).map_err(|e| e.to_string())?;
            println!("{}", state);
        }
        Ok::<(), String>(())
    })
}

fn report(result: &ScenarioResult) {
    if result.passed {
        info!(
            "✓ {} (seed={}) PASSED | ticks={} faults={} drift={:.5}",
            result.scenario.name(),
            result.seed,
            result.total_ticks,
            result.faulted_ticks,
            result.max_energy_drift
        );
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    // stdout is reserved for --json output
    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(level).into())
                .from_env_lossy(),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("Double Pendulum Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    if let Some(seconds) = args.live {
        if let Err(e) = run_live(&args, seconds) {
            error!("Live run failed: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            let names: Vec<&str> = ScenarioId::all().iter().map(|s| s.name()).collect();
            eprintln!("Available scenarios: {}, all", names.join(", "));
            std::process::exit(1);
        })]
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }

        info!("Running with export to: {}", export_path);
        let runner = ScenarioRunner::new(base_seed).with_steps(args.steps);
        let (result, export) = runner.run_with_export(scenarios[0], EXPORT_EVERY);

        match export.write_to_file(export_path) {
            Ok(()) => info!("Exported {} frames to {}", export.frames.len(), export_path),
            Err(e) => error!("Failed to write export: {:?}", e),
        }
        report(&result);

        if !result.passed {
            std::process::exit(1);
        }
        return;
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(seed).with_steps(args.steps);

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                report(&result);
            }
            if !result.passed {
                failed_count += 1;
            }
            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();

    if args.json {
        match serde_json::to_string_pretty(&summary_json(&all_results)) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);

            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
