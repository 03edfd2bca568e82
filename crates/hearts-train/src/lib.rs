pub mod archive;
pub mod dataset;
pub mod error;
pub mod example;
pub mod extract;
pub mod replay;

pub use archive::{ArchiveWriter, load_archive, read_archive};
pub use dataset::{DatasetFormat, DatasetWriter, read_dataset, read_examples, write_dataset, write_examples};
pub use error::{ExtractError, SerializationError};
pub use example::TrainingExample;
pub use extract::{Extractor, FilterPolicy};
pub use replay::replay_decisions;
