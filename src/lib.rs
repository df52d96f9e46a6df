//! Per-key min/mean/max over large `key;value` measurement files.
//!
//! The file is split into newline-aligned chunks ([`compute_chunks`]), each
//! chunk is parsed and tallied by its own worker ([`run_chunk`]), and the
//! partial maps are merged by a single [`Reducer`]. [`run`] wires the pieces
//! together for each [`Revision`].

mod chunker;
mod config;
mod error;
mod format;
mod parser;
mod reducer;
mod strategy;
mod tally;
mod worker;

pub use chunker::{compute_chunks, Chunk};
pub use config::{
    Config, DEFAULT_MAX_RECORD_LENGTH, DEFAULT_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE,
};
pub use error::{Error, Result};
pub use format::Aggregate;
pub use parser::{RecordParser, COMMENT, SEPARATOR};
pub use reducer::{drain, reduce, Reducer};
pub use strategy::{run, Revision};
pub use tally::{record, Tally, TallyMap};
pub use worker::{run_chunk, tally_records};
