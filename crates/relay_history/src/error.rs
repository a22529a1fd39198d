use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: invalid event: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode event {sequence}: {source}")]
    Encode {
        sequence: u64,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid cursor file: {0}")]
    RonDecode(#[from] ron::error::SpannedError),
    #[error("could not encode cursor file: {0}")]
    RonEncode(#[from] ron::Error),
}
