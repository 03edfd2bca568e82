use hearts_bot::strategy::StrategyKind;
use hearts_core::game::state::{DEFAULT_END_SCORE, GameRules};
use hearts_core::model::score::TieBreak;
use hearts_predict::handler::DEFAULT_TIMEOUT_MS;
use hearts_train::dataset::DatasetFormat;
use hearts_train::extract::{DEFAULT_MAX_ROUND_POINTS, DEFAULT_MAX_TRICK_POINTS, FilterPolicy};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";
const MODEL_STRATEGY: &str = "model";

/// Root simulation configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SimConfig {
    pub run_id: String,
    pub games: GamesConfig,
    pub players: Vec<PlayerConfig>,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: SimConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.games.validate()?;
        validate_players(&self.players)?;
        self.outputs.validate(&self.run_id, self.extraction.enabled)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            games_jsonl: resolve_template(&self.run_id, &self.outputs.games_jsonl),
            training: self
                .outputs
                .training
                .as_deref()
                .filter(|_| self.extraction.enabled)
                .map(|template| resolve_template(&self.run_id, template)),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// How many games to play and under which rules.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    pub count: usize,
    /// Batch seed; game `i` is dealt from `seed + i - 1`. Drawn at random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_end_score")]
    pub end_score: u32,
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl GamesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::InvalidField {
                field: "games.count".to_string(),
                message: "number of games must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn rules(&self) -> GameRules {
        GameRules {
            end_score: self.end_score,
            tie_break: self.tie_break,
        }
    }
}

fn default_end_score() -> u32 {
    DEFAULT_END_SCORE
}

/// One seat at the table. `strategy` names a built-in strategy or `model`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlayerConfig {
    pub name: String,
    pub strategy: String,
    #[serde(default)]
    pub model: Option<ModelConfig>,
}

/// External model program used by `model` seats.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_model_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_model_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeatStrategy {
    Builtin(StrategyKind),
    Model(ModelConfig),
}

impl PlayerConfig {
    pub fn seat_strategy(&self) -> Result<SeatStrategy, ValidationError> {
        if self.strategy.trim().eq_ignore_ascii_case(MODEL_STRATEGY) {
            return match &self.model {
                Some(model) if !model.command.trim().is_empty() && model.timeout_ms > 0 => {
                    Ok(SeatStrategy::Model(model.clone()))
                }
                Some(_) => Err(ValidationError::InvalidField {
                    field: format!("players[{}].model", self.name),
                    message: "model needs a command and a non-zero timeout_ms".to_string(),
                }),
                None => Err(ValidationError::InvalidField {
                    field: format!("players[{}].model", self.name),
                    message: "strategy `model` requires a model block".to_string(),
                }),
            };
        }

        self.strategy
            .parse::<StrategyKind>()
            .map(SeatStrategy::Builtin)
            .map_err(|message| ValidationError::InvalidField {
                field: format!("players[{}].strategy", self.name),
                message,
            })
    }
}

/// Training-example extraction applied to every successful game.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_round_points")]
    pub max_round_points: u32,
    #[serde(default = "default_max_trick_points")]
    pub max_trick_points: u8,
    #[serde(default)]
    pub format: DatasetFormat,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_round_points: DEFAULT_MAX_ROUND_POINTS,
            max_trick_points: DEFAULT_MAX_TRICK_POINTS,
            format: DatasetFormat::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn policy(&self) -> FilterPolicy {
        FilterPolicy {
            max_round_points: self.max_round_points,
            max_trick_points: self.max_trick_points,
        }
    }
}

fn default_max_round_points() -> u32 {
    DEFAULT_MAX_ROUND_POINTS
}

fn default_max_trick_points() -> u8 {
    DEFAULT_MAX_TRICK_POINTS
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub games_jsonl: String,
    #[serde(default)]
    pub training: Option<String>,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str, extraction_enabled: bool) -> Result<(), ValidationError> {
        if extraction_enabled && self.training.is_none() {
            return Err(ValidationError::InvalidField {
                field: "outputs.training".to_string(),
                message: "extraction is enabled but no training path is set".to_string(),
            });
        }

        let training = self.training.as_ref();
        for (label, value) in [
            ("outputs.games_jsonl", Some(&self.games_jsonl)),
            ("outputs.training", training),
            ("outputs.summary_md", Some(&self.summary_md)),
        ] {
            let Some(value) = value else {
                continue;
            };
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to compact stderr output.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_players(players: &[PlayerConfig]) -> Result<(), ValidationError> {
    if players.len() != 4 {
        return Err(ValidationError::InvalidField {
            field: "players".to_string(),
            message: format!("exactly 4 players are required, found {}", players.len()),
        });
    }

    let mut seen = HashSet::new();
    for player in players {
        if player.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "players.name".to_string(),
                message: "player name must not be empty".to_string(),
            });
        }

        if !seen.insert(player.name.clone()) {
            return Err(ValidationError::InvalidField {
                field: "players".to_string(),
                message: format!("player name '{}' defined more than once", player.name),
            });
        }

        player.seat_strategy()?;
    }

    Ok(())
}

pub(crate) fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths. `training` is `None` when extraction is off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub games_jsonl: PathBuf,
    pub training: Option<PathBuf>,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
