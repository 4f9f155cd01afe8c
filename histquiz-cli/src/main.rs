mod loader;
mod play;
mod reports;
mod simulate;
mod util;
mod validate;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use histquiz_game::{
    ChoiceShuffler, EngineConfig, EntropyShuffler, GameEngine, QuizSession, SeededShuffler,
    SessionStatus,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use loader::{FsLoader, load_config};
use reports::{ReportFormat, write_simulation_report, write_validation_report};
use simulate::{Simulator, Strategy};
use util::{OutputTarget, parse_seed, resolve_seeds};
use validate::{ValidationReport, validate_data};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Play the quiz interactively in the terminal
    Play,
    /// Check scenario and network data for structural problems
    Validate,
    /// Autoplay sessions with a policy and report outcomes
    Simulate,
}

#[derive(Debug, Parser)]
#[command(name = "histquiz", version)]
#[command(about = "Branching history quiz: play, validate data, or simulate runs")]
struct Args {
    /// What to do
    #[arg(value_enum, default_value_t = Mode::Play)]
    mode: Mode,

    /// Scenario JSON file (defaults to the bundled scenario)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Semantic network JSON file (defaults to the bundled network)
    #[arg(long, conflicts_with = "no_network")]
    network: Option<PathBuf>,

    /// Skip loading any semantic network
    #[arg(long)]
    no_network: bool,

    /// Engine config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Shuffle seed for play mode (entropy when omitted)
    #[arg(long)]
    seed: Option<String>,

    /// Override the delay before advancing to the next scene, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Seeds to simulate (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Sessions per seed (simulate mode only)
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Autoplay policy (simulate mode only)
    #[arg(long, value_enum, default_value_t = Strategy::Oracle)]
    policy: Strategy,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let loader = build_loader(&args);
    let mut config = load_config(args.config.as_deref())?;
    if let Some(delay) = args.delay_ms {
        config.advance_delay_ms = delay;
    }

    let passed = match args.mode {
        Mode::Play => run_play(&args, loader, config).await?,
        Mode::Validate => run_validate(&args, loader, config)?,
        Mode::Simulate => run_simulate(&args, loader, config)?,
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn build_loader(args: &Args) -> FsLoader {
    let loader = FsLoader::new(args.scenario.clone(), args.network.clone());
    if args.no_network {
        loader.without_network()
    } else {
        loader
    }
}

fn announce_banner(title: &str) {
    println!("{}", format!("🏯 HistQuiz {title}").bright_cyan().bold());
    println!("{}", "================================".cyan());
}

async fn run_play(args: &Args, loader: FsLoader, config: EngineConfig) -> Result<bool> {
    announce_banner("Play");
    let shuffler: Box<dyn ChoiceShuffler + Send> = match &args.seed {
        Some(token) => Box::new(SeededShuffler::new(parse_seed(token)?)),
        None => Box::new(EntropyShuffler::new()),
    };
    let engine = GameEngine::new(loader, config);
    let mut session: QuizSession = engine
        .create_session(shuffler)
        .context("failed to build quiz session")?;

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    let summary = play::run(&mut session, input, &mut out).await?;
    Ok(summary.status != SessionStatus::InProgress)
}

fn run_validate(args: &Args, loader: FsLoader, config: EngineConfig) -> Result<bool> {
    let source = loader.describe();
    let engine = GameEngine::new(loader, config);
    let report = match engine.load_data() {
        Ok(data) => validate_data(source, &data, engine.config()),
        Err(err) => ValidationReport::load_failure(source, &anyhow::Error::new(err)),
    };

    let mut output = OutputTarget::new(args.output.clone())?;
    write_validation_report(&mut output, args.report, &report)?;
    output.flush()?;
    Ok(report.passed())
}

fn run_simulate(args: &Args, loader: FsLoader, config: EngineConfig) -> Result<bool> {
    if args.report == ReportFormat::Console {
        announce_banner("Simulation");
    }
    let seeds = resolve_seeds(&args.seeds)?;
    let engine = GameEngine::new(loader, config);
    let data = engine.load_data().context("failed to load quiz data")?;
    let simulator = Simulator::new(data, engine.config().clone(), args.verbose);

    let started = Instant::now();
    let results = simulator.run(args.policy, &seeds, args.iterations);
    let mut output = OutputTarget::new(args.output.clone())?;
    write_simulation_report(&mut output, args.report, &results, started.elapsed())?;
    output.flush()?;
    Ok(results.iter().all(|result| result.passed))
}
