use crate::error::SerializationError;
use hearts_core::game::result::GameResult;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Appends one JSON line per finished game.
pub struct ArchiveWriter<W: Write> {
    inner: W,
    games: usize,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, games: 0 }
    }

    pub fn push(&mut self, result: &GameResult) -> Result<(), SerializationError> {
        serde_json::to_writer(&mut self.inner, result).map_err(SerializationError::Encode)?;
        self.inner.write_all(b"\n")?;
        self.games += 1;
        Ok(())
    }

    pub fn games(&self) -> usize {
        self.games
    }

    pub fn finish(mut self) -> Result<W, SerializationError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl ArchiveWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, SerializationError> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

pub fn read_archive<R: BufRead>(reader: R) -> Result<Vec<GameResult>, SerializationError> {
    let mut games = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let game = GameResult::from_json(&line).map_err(|source| SerializationError::Json {
            line: index + 1,
            source,
        })?;
        games.push(game);
    }
    Ok(games)
}

pub fn load_archive(path: &Path) -> Result<Vec<GameResult>, SerializationError> {
    read_archive(BufReader::new(File::open(path)?))
}
