//! Training datasets on disk.
//!
//! Binary layout (all integers big-endian):
//!
//! ```text
//! header   "HRTX" u16:version
//! record   u16:tag=0x0001
//!          u64:game_id u32:round_number u8:seat
//!          u8:n_previous { u8:leader u8[4]:card_ids }*n_previous
//!          u8:leader u8:n_current u8[n_current]:card_ids
//!          u8:n_hand u8[n_hand]:card_ids
//!          u8:played_card_id
//! footer   u16:0xFFFF
//! ```
//!
//! Trick winners, points and the trick number are derived on load.

use crate::error::SerializationError;
use crate::example::TrainingExample;
use byteorder::{BE, ReadBytesExt, WriteBytesExt};
use hearts_core::model::card::Card;
use hearts_core::model::player::Seat;
use hearts_core::model::trick::{CompletedTrick, Trick};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

pub const MAGIC: &[u8; 4] = b"HRTX";
pub const FORMAT_VERSION: u16 = 1;
const TAG_EXAMPLE: u16 = 0x0001;
const TAG_FOOTER: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
    #[default]
    Binary,
    Jsonl,
}

impl DatasetFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            DatasetFormat::Binary => "binary",
            DatasetFormat::Jsonl => "jsonl",
        }
    }
}

impl fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(DatasetFormat::Binary),
            "jsonl" | "json" => Ok(DatasetFormat::Jsonl),
            other => Err(format!("unknown dataset format `{other}`")),
        }
    }
}

/// Streams examples to `W`. Call [`DatasetWriter::finish`] to seal the file.
pub struct DatasetWriter<W: Write> {
    inner: W,
    format: DatasetFormat,
    written: usize,
}

impl<W: Write> DatasetWriter<W> {
    pub fn new(mut inner: W, format: DatasetFormat) -> Result<Self, SerializationError> {
        if format == DatasetFormat::Binary {
            inner.write_all(MAGIC)?;
            inner.write_u16::<BE>(FORMAT_VERSION)?;
        }
        Ok(Self {
            inner,
            format,
            written: 0,
        })
    }

    pub fn push(&mut self, example: &TrainingExample) -> Result<(), SerializationError> {
        match self.format {
            DatasetFormat::Binary => encode_example(&mut self.inner, example)?,
            DatasetFormat::Jsonl => {
                serde_json::to_writer(&mut self.inner, example).map_err(SerializationError::Encode)?;
                self.inner.write_all(b"\n")?;
            }
        }
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W, SerializationError> {
        if self.format == DatasetFormat::Binary {
            self.inner.write_u16::<BE>(TAG_FOOTER)?;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

pub fn write_examples<W: Write>(
    writer: W,
    format: DatasetFormat,
    examples: &[TrainingExample],
) -> Result<W, SerializationError> {
    let mut dataset = DatasetWriter::new(writer, format)?;
    for example in examples {
        dataset.push(example)?;
    }
    dataset.finish()
}

pub fn read_examples<R: BufRead>(
    reader: R,
    format: DatasetFormat,
) -> Result<Vec<TrainingExample>, SerializationError> {
    match format {
        DatasetFormat::Binary => read_binary(reader),
        DatasetFormat::Jsonl => read_jsonl(reader),
    }
}

pub fn write_dataset(
    path: &Path,
    format: DatasetFormat,
    examples: &[TrainingExample],
) -> Result<usize, SerializationError> {
    write_examples(BufWriter::new(File::create(path)?), format, examples)?;
    Ok(examples.len())
}

pub fn read_dataset(path: &Path, format: DatasetFormat) -> Result<Vec<TrainingExample>, SerializationError> {
    read_examples(BufReader::new(File::open(path)?), format)
}

fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<TrainingExample>, SerializationError> {
    let mut examples = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let example = serde_json::from_str(&line).map_err(|source| SerializationError::Json {
            line: index + 1,
            source,
        })?;
        examples.push(example);
    }
    Ok(examples)
}

fn read_binary<R: Read>(mut reader: R) -> Result<Vec<TrainingExample>, SerializationError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(SerializationError::BadMagic);
    }
    let version = reader.read_u16::<BE>()?;
    if version != FORMAT_VERSION {
        return Err(SerializationError::UnsupportedVersion(version));
    }

    let mut examples = Vec::new();
    loop {
        let tag = match reader.read_u16::<BE>() {
            Ok(tag) => tag,
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(SerializationError::MissingFooter);
            }
            Err(err) => return Err(err.into()),
        };
        match tag {
            TAG_FOOTER => return Ok(examples),
            TAG_EXAMPLE => examples.push(decode_example(&mut reader)?),
            other => return Err(SerializationError::UnknownTag(other)),
        }
    }
}

fn encode_example<W: Write>(writer: &mut W, example: &TrainingExample) -> Result<(), SerializationError> {
    writer.write_u16::<BE>(TAG_EXAMPLE)?;
    writer.write_u64::<BE>(example.game_id)?;
    writer.write_u32::<BE>(example.round_number)?;
    writer.write_u8(example.seat.index() as u8)?;

    writer.write_u8(count(example.previous_tricks.len())?)?;
    for trick in &example.previous_tricks {
        if trick.plays().len() != 4 {
            return Err(SerializationError::Malformed(format!(
                "completed trick with {} cards",
                trick.plays().len()
            )));
        }
        writer.write_u8(trick.leader().index() as u8)?;
        for play in trick.plays() {
            writer.write_u8(play.card.id())?;
        }
    }

    writer.write_u8(example.current_trick.leader().index() as u8)?;
    writer.write_u8(count(example.current_trick.len())?)?;
    for play in example.current_trick.plays() {
        writer.write_u8(play.card.id())?;
    }

    writer.write_u8(count(example.hand.len())?)?;
    for card in &example.hand {
        writer.write_u8(card.id())?;
    }

    writer.write_u8(example.played_card.id())?;
    Ok(())
}

fn decode_example<R: Read>(reader: &mut R) -> Result<TrainingExample, SerializationError> {
    let game_id = reader.read_u64::<BE>()?;
    let round_number = reader.read_u32::<BE>()?;
    let seat = read_seat(reader)?;

    let previous = reader.read_u8()? as usize;
    let mut previous_tricks = Vec::with_capacity(previous);
    for _ in 0..previous {
        let leader = read_seat(reader)?;
        let mut cards = [Card::TWO_OF_CLUBS; 4];
        for slot in cards.iter_mut() {
            *slot = read_card(reader)?;
        }
        previous_tricks.push(CompletedTrick::from_cards(leader, cards));
    }

    let leader = read_seat(reader)?;
    let mut current_trick = Trick::new(leader);
    let played = reader.read_u8()? as usize;
    for offset in 0..played {
        let card = read_card(reader)?;
        current_trick
            .play(leader.offset(offset), card)
            .map_err(|err| SerializationError::Malformed(err.to_string()))?;
    }

    let held = reader.read_u8()? as usize;
    let mut hand = Vec::with_capacity(held);
    for _ in 0..held {
        hand.push(read_card(reader)?);
    }

    let played_card = read_card(reader)?;
    Ok(TrainingExample {
        game_id,
        round_number,
        trick_number: previous as u32 + 1,
        previous_tricks,
        current_trick,
        seat,
        hand,
        played_card,
    })
}

fn count(len: usize) -> Result<u8, SerializationError> {
    u8::try_from(len).map_err(|_| SerializationError::Malformed(format!("{len} entries exceed u8")))
}

fn read_card<R: Read>(reader: &mut R) -> Result<Card, SerializationError> {
    let id = reader.read_u8()?;
    Card::from_id(id).ok_or(SerializationError::InvalidCard(id))
}

fn read_seat<R: Read>(reader: &mut R) -> Result<Seat, SerializationError> {
    let index = reader.read_u8()?;
    Seat::from_index(index as usize).ok_or(SerializationError::InvalidSeat(index))
}
