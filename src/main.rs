//! pemopt command-line interface.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::time::Instant;

use pemopt::model::membrane::MembraneState;
use pemopt::{encode, make_problem, solve, ModelParams, Problem, ResultTable};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "pemopt")]
#[command(version)]
#[command(about = "Multi-objective design optimization of PEM electrolyzer membranes and catalyst layers")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the configured optimization and print the result table
    Optimize {
        /// Print JSON instead of an aligned table
        #[arg(long)]
        json: bool,
    },
    /// Evaluate one design vector against the configured model
    Evaluate {
        /// Comma-separated design vector, e.g. 158e-6,1.0
        #[arg(long, allow_hyphen_values = true)]
        x: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Validate a configuration file
    Validate,
}

// ============================================================================
// JSON Output Structures
// ============================================================================

#[derive(Serialize)]
struct Manifest {
    solver_version: String,
    platform: String,
    config_hash: String,
    config_snapshot: config::Root,
}

#[derive(Serialize)]
struct OptimizationOutput {
    manifest: Manifest,
    method: String,
    algorithm: String,
    pop_size: usize,
    generations: usize,
    seed: u64,
    evaluations: usize,
    n_feasible: Option<usize>,
    wall_time_ms: f64,
    table: ResultTable,
}

#[derive(Serialize)]
struct NamedValue {
    name: String,
    value: f64,
}

#[derive(Serialize)]
struct EvaluationOutput {
    variables: Vec<NamedValue>,
    objectives: Vec<NamedValue>,
    constraints: Vec<NamedValue>,
    feasible: bool,
    membrane_state: Option<MembraneState>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn compute_hash(data: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn create_manifest(cfg: &config::Root, cfg_text: &str) -> Manifest {
    Manifest {
        solver_version: VERSION.to_string(),
        platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        config_hash: compute_hash(cfg_text),
        config_snapshot: cfg.clone(),
    }
}

fn named(names: Vec<String>, values: &[f64]) -> Vec<NamedValue> {
    names
        .into_iter()
        .zip(values)
        .map(|(name, &value)| NamedValue { name, value })
        .collect()
}

fn parse_design(text: &str) -> Result<Vec<f64>> {
    text.split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid design component '{}'", v.trim()))
        })
        .collect()
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_optimize(cfg: &config::Root, cfg_text: &str, json_output: bool) -> Result<()> {
    let request = cfg.request()?;
    let problem = encode(&request)?;

    eprintln!("[pemopt] starting {} optimization ({})", request.method, cfg.run.problem);
    eprintln!(
        "  Population: {}, Generations: {}, Seed: {}",
        request.pop_size, request.generations, request.seed
    );

    let start = Instant::now();
    let result = solve(&problem, &request);
    let wall_time_ms = start.elapsed().as_secs_f64() * 1000.0;

    let table = ResultTable::assemble(&problem, &result);

    eprintln!("[pemopt] optimization complete");
    eprintln!("  Retained designs: {}", result.len());
    if let Some(n) = result.n_feasible() {
        eprintln!("  Feasible: {}/{}", n, result.len());
    }
    eprintln!("  Evaluations: {}", result.evaluations);
    eprintln!("  Wall time: {:.1} ms", wall_time_ms);

    if json_output {
        let output = OptimizationOutput {
            manifest: create_manifest(cfg, cfg_text),
            method: request.method.to_string(),
            algorithm: result.algorithm.to_string(),
            pop_size: request.pop_size,
            generations: result.generations,
            seed: request.seed,
            evaluations: result.evaluations,
            n_feasible: result.n_feasible(),
            wall_time_ms,
            table,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", table.render());
    }

    Ok(())
}

fn run_evaluate(cfg: &config::Root, x_text: &str, json_output: bool) -> Result<()> {
    let params = cfg.model_params()?;
    let problem = make_problem(&params, cfg.bounds()?)?;
    let x = parse_design(x_text)?;

    let eval = pemopt::evaluate(&x, &params).with_context(|| format!("evaluating {}", cfg.run.problem))?;
    if !problem.bounds().contains(&x) {
        eprintln!("[pemopt] WARNING: design vector lies outside the configured bounds");
    }

    let feasible = eval.constraints.iter().all(|&g| g <= 0.0);
    let membrane_state = match &params {
        ModelParams::Membrane(p) => Some(MembraneState::compute(x[0], x[1], p)),
        ModelParams::CatalystLayer(_) => None,
    };

    let constraint_names = (1..=problem.n_constraints()).map(|k| format!("G{k}")).collect();
    let output = EvaluationOutput {
        variables: named(problem.variable_names(), &x),
        objectives: named(problem.objective_names(), &eval.objectives),
        constraints: named(constraint_names, &eval.constraints),
        feasible,
        membrane_state,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("  {:24} {:>14}", "Quantity", "Value");
    println!("  {}", "-".repeat(40));
    for nv in output.variables.iter().chain(&output.objectives).chain(&output.constraints) {
        println!("  {:24} {:>14.6e}", nv.name, nv.value);
    }
    if let Some(state) = &output.membrane_state {
        println!("  {:24} {:>14.6}", "cell_voltage_V", state.voltage);
        println!("  {:24} {:>14.6}", "efficiency", state.efficiency);
        println!("  {:24} {:>14.1}", "lifetime_h", state.lifetime);
    }
    println!("  feasible: {}", output.feasible);

    Ok(())
}

fn validate_config(cfg_path: &str) -> Result<()> {
    let (cfg, _) = config::Root::load(cfg_path)?;
    let params = cfg.model_params()?;
    let problem = make_problem(&params, cfg.bounds()?)?;

    eprintln!("[pemopt] config valid: {}", cfg_path);
    eprintln!(
        "  run: problem={}, method={}, pop_size={}, generations={}, seed={}",
        cfg.run.problem, cfg.run.method, cfg.run.pop_size, cfg.run.generations, cfg.run.seed
    );
    eprintln!(
        "  shape: {} variables, {} objectives, {} constraints",
        problem.n_variables(),
        problem.n_objectives(),
        problem.n_constraints()
    );
    for (name, (lo, hi)) in problem.variable_names().iter().zip(problem.bounds().pairs()) {
        eprintln!("  bounds: {} in [{:.4e}, {:.4e}]", name, lo, hi);
    }

    let scalar = cfg.scalar_params();
    if let Some(w) = &scalar.weights {
        eprintln!("  scalar.weights: {:?}", w);
    }
    if let Some(g) = &scalar.goals {
        eprintln!("  scalar.goals: {:?}", g);
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let cfg_path = args.config.context("--config required")?;

    match args.command {
        Commands::Validate => validate_config(&cfg_path),
        Commands::Optimize { json } => {
            let (cfg, cfg_text) = config::Root::load(&cfg_path)?;
            eprintln!("[pemopt] v{} - {}", VERSION, cfg_path);
            run_optimize(&cfg, &cfg_text, json)
        }
        Commands::Evaluate { x, json } => {
            let (cfg, _) = config::Root::load(&cfg_path)?;
            run_evaluate(&cfg, &x, json)
        }
    }
}
