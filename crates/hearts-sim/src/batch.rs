use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hearts_bot::driver::{DriverError, GameDriver, GameRun, SeatConfig};
use hearts_bot::strategy::Strategy;
use hearts_predict::handler::PredictionHandler;
use hearts_predict::model::ProcessModel;
use hearts_predict::strategy::ModelStrategy;
use hearts_train::archive::ArchiveWriter;
use hearts_train::dataset::DatasetWriter;
use hearts_train::error::{ExtractError, SerializationError};
use hearts_train::extract::Extractor;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{ResolvedOutputs, SeatStrategy, SimConfig, ValidationError};
use crate::stats::{StatsCollector, StatsError, StatsSummary};

/// Games played in parallel before their results are written out.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Plays a batch of independent games in parallel and writes the archive,
/// the training dataset and the summary table.
///
/// Games run in chunks; each chunk is written in game order before the next
/// starts, so memory is bounded by the chunk rather than the batch.
pub struct BatchRunner {
    config: SimConfig,
    outputs: ResolvedOutputs,
    seats: [SeatStrategy; 4],
    seed: u64,
    chunk_size: usize,
}

/// Output writers and tallies shared by every chunk of a batch.
pub(crate) struct BatchSink {
    archive: ArchiveWriter<BufWriter<File>>,
    dataset: Option<DatasetWriter<BufWriter<File>>>,
    extractor: Extractor,
    stats: StatsCollector,
    failures: Vec<GameFailure>,
}

/// One game that did not produce a result.
#[derive(Debug, Clone)]
pub struct GameFailure {
    pub game_id: u64,
    pub message: String,
}

pub struct BatchSummary {
    pub seed: u64,
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<GameFailure>,
    pub examples_written: usize,
    pub games_path: PathBuf,
    pub training_path: Option<PathBuf>,
    pub summary_path: PathBuf,
    pub stats: StatsSummary,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{0}")]
    Config(#[from] ValidationError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to write output: {0}")]
    Serialization(#[from] SerializationError),
    #[error("game {game_id}: extraction failed: {source}")]
    Extract {
        game_id: u64,
        #[source]
        source: ExtractError,
    },
    #[error("statistics error: {0}")]
    Stats(#[from] StatsError),
}

impl BatchRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: SimConfig, outputs: ResolvedOutputs) -> Result<Self, BatchError> {
        let mut seats = Vec::with_capacity(4);
        for player in &config.players {
            seats.push(player.seat_strategy()?);
        }
        let seats: [SeatStrategy; 4] =
            seats
                .try_into()
                .map_err(|found: Vec<SeatStrategy>| ValidationError::InvalidField {
                    field: "players".to_string(),
                    message: format!("exactly 4 players are required, found {}", found.len()),
                })?;
        let seed = config.games.seed.unwrap_or_else(rand::random);

        Ok(Self {
            config,
            outputs,
            seats,
            seed,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Game ids run from 1; game `i` is dealt from `seed + i - 1`.
    pub fn game_seed(&self, game_id: u64) -> u64 {
        self.seed.wrapping_add(game_id - 1)
    }

    fn build_seats(&self, game_seed: u64) -> [SeatConfig; 4] {
        std::array::from_fn(|index| {
            let player = &self.config.players[index];
            let strategy: Box<dyn Strategy> = match &self.seats[index] {
                SeatStrategy::Builtin(kind) => kind.spawn(game_seed.wrapping_add(index as u64)),
                SeatStrategy::Model(model) => {
                    let process = ProcessModel::new(model.command.clone(), model.args.clone());
                    let handler = PredictionHandler::new(Arc::new(process))
                        .with_timeout(Duration::from_millis(model.timeout_ms));
                    Box::new(ModelStrategy::new(handler))
                }
            };
            SeatConfig::new(player.name.clone(), strategy)
        })
    }

    fn play(&self, game_id: u64) -> Result<GameRun, DriverError> {
        let game_seed = self.game_seed(game_id);
        GameDriver::new(
            game_id,
            game_seed,
            self.config.games.rules(),
            self.build_seats(game_seed),
        )
        .run()
    }

    /// Play every game, writing outputs in game order. A failed game is
    /// counted and logged; it never stops the batch.
    pub fn run(&self) -> Result<BatchSummary, BatchError> {
        ensure_parent(self.outputs.games_jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if let Some(training) = &self.outputs.training {
            ensure_parent(training.parent())?;
        }

        let start = Instant::now();
        let count = self.config.games.count as u64;
        event!(
            target: "hearts_sim::batch",
            Level::INFO,
            run_id = %self.config.run_id,
            games = count,
            seed = self.seed,
            chunk_size = self.chunk_size,
            "batch started"
        );

        let mut sink = self.open_sink()?;
        let mut first = 1;
        while first <= count {
            let last = count.min(first + self.chunk_size as u64 - 1);
            let runs: Vec<Result<GameRun, DriverError>> = (first..=last)
                .into_par_iter()
                .map(|game_id| self.play(game_id))
                .collect();
            for run in runs {
                sink.record(run)?;
            }
            first = last + 1;
        }
        self.finish(sink, start)
    }

    pub(crate) fn open_sink(&self) -> Result<BatchSink, BatchError> {
        let dataset = match &self.outputs.training {
            Some(path) => Some(DatasetWriter::new(
                BufWriter::new(File::create(path)?),
                self.config.extraction.format,
            )?),
            None => None,
        };
        Ok(BatchSink {
            archive: ArchiveWriter::create(&self.outputs.games_jsonl)?,
            dataset,
            extractor: Extractor::new(self.config.extraction.policy()),
            stats: StatsCollector::new(),
            failures: Vec::new(),
        })
    }

    /// Flushes the writers and writes the summary table.
    pub(crate) fn finish(&self, sink: BatchSink, start: Instant) -> Result<BatchSummary, BatchError> {
        let BatchSink {
            archive,
            dataset,
            stats,
            failures,
            ..
        } = sink;

        let succeeded = archive.games();
        archive.finish()?;
        let examples_written = match dataset {
            Some(dataset) => {
                let written = dataset.written();
                dataset.finish()?;
                written
            }
            None => 0,
        };

        let stats = stats.finalize();
        let title = format!("Simulation Summary: {}", self.config.run_id);
        stats.write_markdown(&self.outputs.summary_md, &title)?;

        let elapsed = start.elapsed();
        event!(
            target: "hearts_sim::batch",
            Level::INFO,
            run_id = %self.config.run_id,
            succeeded,
            failed = failures.len(),
            examples = examples_written,
            elapsed_ms = elapsed.as_millis() as u64,
            "batch finished"
        );

        Ok(BatchSummary {
            seed: self.seed,
            requested: self.config.games.count,
            succeeded,
            failed: failures.len(),
            failures,
            examples_written,
            games_path: self.outputs.games_jsonl.clone(),
            training_path: self.outputs.training.clone(),
            summary_path: self.outputs.summary_md.clone(),
            stats,
            elapsed,
        })
    }
}

impl BatchSink {
    /// Archives, extracts and tallies one game.
    pub(crate) fn record(&mut self, run: Result<GameRun, DriverError>) -> Result<(), BatchError> {
        match run {
            Ok(run) => {
                self.archive.push(&run.result)?;
                self.stats.record_game(&run.result);
                self.stats.record_timings(&run.result, &run.timings);
                if let Some(dataset) = self.dataset.as_mut() {
                    let game_id = run.result.game_id;
                    let examples = self
                        .extractor
                        .extract(&run.result, &run.decisions)
                        .map_err(|source| BatchError::Extract { game_id, source })?;
                    for example in &examples {
                        dataset.push(example)?;
                    }
                }
            }
            Err(err) => {
                event!(
                    target: "hearts_sim::batch",
                    Level::WARN,
                    game_id = err.game_id(),
                    error = %err,
                    "game failed"
                );
                self.stats.record_failure();
                self.failures.push(GameFailure {
                    game_id: err.game_id(),
                    message: err.to_string(),
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn ensure_parent(path: Option<&Path>) -> Result<(), std::io::Error> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
