use hearts_core::model::player::Seat;
use hearts_core::model::rules::PlayError;
use hearts_core::model::trick::TrickError;
use thiserror::Error;

/// Dataset and archive I/O or format failures.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("not a training dataset (bad magic bytes)")]
    BadMagic,
    #[error("unsupported dataset version {0}")]
    UnsupportedVersion(u16),
    #[error("unknown record tag {0:#06x}")]
    UnknownTag(u16),
    #[error("card id {0} out of range")]
    InvalidCard(u8),
    #[error("seat {0} out of range")]
    InvalidSeat(u8),
    #[error("malformed record: {0}")]
    Malformed(String),
    #[error("dataset ended without footer")]
    MissingFooter,
}

/// An archived game that cannot be turned into training examples.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("game {game_id}: no round {round} in result")]
    UnknownRound { game_id: u64, round: u32 },
    #[error("game {game_id} round {round}: no trick {trick}")]
    MissingTrick {
        game_id: u64,
        round: u32,
        trick: usize,
    },
    #[error("game {game_id} round {round}: initial hands are not a full deal")]
    InvalidHands { game_id: u64, round: u32 },
    #[error("game {game_id} round {round} trick {trick}: recorded trick is inconsistent: {source}")]
    BadTrick {
        game_id: u64,
        round: u32,
        trick: usize,
        #[source]
        source: TrickError,
    },
    #[error("game {game_id} round {round} trick {trick}: expected {expected} to play, archive has {actual}")]
    OutOfTurn {
        game_id: u64,
        round: u32,
        trick: usize,
        expected: Seat,
        actual: Seat,
    },
    #[error("game {game_id} round {round} trick {trick}: archived move is illegal: {source}")]
    IllegalMove {
        game_id: u64,
        round: u32,
        trick: usize,
        #[source]
        source: PlayError,
    },
    #[error("game {game_id} round {round}: {tricks} tricks leave cards unplayed")]
    IncompleteRound { game_id: u64, round: u32, tricks: usize },
}
