use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort an aggregation run.
///
/// The engine never retries and never salvages partial results: the first
/// error reached is returned to the caller, which decides how to report it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read failed at byte {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("malformed record at byte {offset}: expected 2 fields, found {found}")]
    FieldCount { offset: u64, found: usize },

    #[error("malformed record at byte {offset}: key is not valid UTF-8")]
    InvalidKey { offset: u64 },

    #[error("invalid reading {value:?} at byte {offset}")]
    InvalidReading { offset: u64, value: String },

    #[error(
        "no newline within {max_record_length} bytes of offset {offset}; \
         is there a record longer than that?"
    )]
    ChunkBoundary { offset: u64, max_record_length: usize },

    #[error("a worker exited without reporting its partial result")]
    WorkerLost,

    #[error("could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown revision {0}")]
    UnknownRevision(u8),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
