use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};

use hearts_bot::strategy::StrategyKind;
use hearts_predict::handler::{DEFAULT_TIMEOUT_MS, PredictionHandler};
use hearts_predict::model::{CardModel, ProcessModel, StrategyModel};
use hearts_predict::server::serve;
use hearts_sim::batch::BatchRunner;
use hearts_sim::config::{LoggingConfig, SimConfig};
use hearts_sim::logging::{init_logging, sibling_dir};
use hearts_sim::stats::StatsSummary;
use hearts_train::archive::load_archive;
use hearts_train::dataset::{DatasetFormat, write_dataset};
use hearts_train::extract::{Extractor, FilterPolicy};

/// Hearts simulation, training-data extraction and prediction serving.
#[derive(Debug, Parser)]
#[command(
    name = "hearts-sim",
    author,
    version,
    about = "Deterministic Hearts simulation and training-data toolkit"
)]
struct Cli {
    /// Log level for commands that take no config file.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a batch of games from a YAML configuration.
    Generate(GenerateArgs),
    /// Turn an archive of finished games into a training dataset.
    Extract(ExtractArgs),
    /// Summarise win rates and scores from an archive.
    Stats(StatsArgs),
    /// Answer prediction requests, one JSON line per request on stdin.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "sim/sim.yaml")]
    config: PathBuf,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the batch seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Game archive written by `generate` (JSON lines).
    #[arg(long, value_name = "FILE")]
    games: PathBuf,

    /// Dataset file to write.
    #[arg(long, value_name = "FILE")]
    out: PathBuf,

    #[arg(long, default_value_t = DatasetFormat::Binary)]
    format: DatasetFormat,

    #[arg(long, value_name = "POINTS")]
    max_round_points: Option<u32>,

    #[arg(long, value_name = "POINTS")]
    max_trick_points: Option<u8>,
}

#[derive(Debug, Args)]
struct StatsArgs {
    /// Game archive written by `generate` (JSON lines).
    #[arg(long, value_name = "FILE")]
    games: PathBuf,

    /// Also write the table to this Markdown file.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Model program; receives one request line on stdin per prediction.
    #[arg(long, value_name = "CMD", conflicts_with = "strategy")]
    command: Option<String>,

    /// Argument passed to the model program (repeatable).
    #[arg(long = "arg", value_name = "ARG", requires = "command")]
    args: Vec<String>,

    /// Answer with a built-in strategy instead of a model program.
    #[arg(long, value_name = "KIND")]
    strategy: Option<StrategyKind>,

    /// Deadline per request; must be at least 1.
    #[arg(
        long,
        value_name = "MS",
        default_value_t = DEFAULT_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_ms: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => generate(args),
        Command::Extract(args) => {
            init_cli_logging(&cli.log_level)?;
            extract(args)
        }
        Command::Stats(args) => {
            init_cli_logging(&cli.log_level)?;
            stats(args)
        }
        Command::Serve(args) => {
            init_cli_logging(&cli.log_level)?;
            run_server(args)
        }
    }
}

fn init_cli_logging(level: &str) -> anyhow::Result<()> {
    let logging = LoggingConfig {
        enable_structured: false,
        tracing_level: level.to_string(),
    };
    init_logging(&logging, &PathBuf::from("."))?;
    Ok(())
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut config = SimConfig::from_path(&args.config)?;

    if let Some(run_id) = args.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = args.games {
        config.games.count = games;
    }

    if let Some(seed) = args.seed {
        config.games.seed = Some(seed);
    }

    config.validate()?;

    let outputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let games = config.games.count;

    println!(
        "Loaded configuration '{run_id}' ({games} game{})",
        if games == 1 { "" } else { "s" }
    );

    if args.validate_only {
        println!("Validation-only mode: no games played.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &sibling_dir(&outputs.summary_md))?;
    let runner = BatchRunner::new(config, outputs)?;
    let summary = runner.run()?;

    println!(
        "Batch complete for '{run_id}' (seed {}): {} succeeded, {} failed of {} in {:.2}s",
        summary.seed,
        summary.succeeded,
        summary.failed,
        summary.requested,
        summary.elapsed.as_secs_f64()
    );
    for failure in &summary.failures {
        println!("  game {} failed: {}", failure.game_id, failure.message);
    }
    println!("Game archive: {}", summary.games_path.display());
    if let Some(path) = summary.training_path.as_ref() {
        println!(
            "Training data: {} ({} examples)",
            path.display(),
            summary.examples_written
        );
    }
    println!("Summary table: {}", summary.summary_path.display());
    print!("{}", summary.stats.to_markdown(&format!("Simulation Summary: {run_id}")));

    Ok(())
}

fn extract(args: ExtractArgs) -> anyhow::Result<()> {
    let defaults = FilterPolicy::default();
    let policy = FilterPolicy {
        max_round_points: args.max_round_points.unwrap_or(defaults.max_round_points),
        max_trick_points: args.max_trick_points.unwrap_or(defaults.max_trick_points),
    };
    let extractor = Extractor::new(policy);

    let games = load_archive(&args.games)
        .with_context(|| format!("reading game archive {}", args.games.display()))?;
    let mut examples = Vec::new();
    for game in &games {
        examples.extend(extractor.extract_archived(game)?);
    }

    if let Some(parent) = args.out.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let written = write_dataset(&args.out, args.format, &examples)
        .with_context(|| format!("writing dataset {}", args.out.display()))?;

    println!(
        "Extracted {written} examples from {} games into {} ({})",
        games.len(),
        args.out.display(),
        args.format
    );
    Ok(())
}

fn stats(args: StatsArgs) -> anyhow::Result<()> {
    let games = load_archive(&args.games)
        .with_context(|| format!("reading game archive {}", args.games.display()))?;
    if games.is_empty() {
        bail!("archive {} holds no games", args.games.display());
    }

    let summary = StatsSummary::from_results(&games);
    let title = format!("Game Statistics: {}", args.games.display());
    if let Some(out) = args.out.as_ref() {
        summary.write_markdown(out, &title)?;
    }
    print!("{}", summary.to_markdown(&title));
    Ok(())
}

fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let model: Arc<dyn CardModel> = match (args.command, args.strategy) {
        (Some(command), None) => Arc::new(ProcessModel::new(command, args.args)),
        (None, Some(kind)) => Arc::new(StrategyModel::new(kind, 0)),
        _ => bail!("serve needs exactly one of --command or --strategy"),
    };
    let handler =
        PredictionHandler::new(model).with_timeout(Duration::from_millis(args.timeout_ms));

    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(&handler, stdin.lock(), BufWriter::new(stdout.lock()))
        .context("prediction stream failed")?;
    Ok(())
}
