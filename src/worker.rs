use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, debug_span};

use crate::chunker::Chunk;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::RecordParser;
use crate::tally::{record, TallyMap};

/// Aggregates one chunk of `path` through its own file handle.
///
/// Reads never leave `[chunk.start, chunk.end())`, so concurrent workers on
/// the same file never see each other's records.
///
/// # Errors
///
/// [`Error::Config`] for an invalid `config`, [`Error::Io`] if the file cannot
/// be opened or seeked, otherwise whatever the parser reports for the range.
pub fn run_chunk(path: &Path, chunk: Chunk, config: &Config) -> Result<TallyMap> {
    let _span = debug_span!("chunk", start = chunk.start, len = chunk.len).entered();
    config.validate()?;
    if chunk.is_empty() {
        return Ok(TallyMap::default());
    }

    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    file.seek(SeekFrom::Start(chunk.start))
        .map_err(|e| Error::io(path, e))?;
    let reader = BufReader::with_capacity(config.read_buffer_size, file.take(chunk.len));

    let tallies = tally_records(RecordParser::starting_at(reader, chunk.start))?;
    debug!(keys = tallies.len(), "chunk done");
    Ok(tallies)
}

/// Drains `parser` into a fresh map.
///
/// # Errors
///
/// The first error the parser yields.
pub fn tally_records<R: BufRead>(mut parser: RecordParser<R>) -> Result<TallyMap> {
    // estimate the size from typical station counts to avoid early rehashing
    let mut map = TallyMap::with_capacity_and_hasher(512, Default::default());
    while let Some((key, reading)) = parser.next_record()? {
        record(&mut map, key, reading);
    }
    Ok(map)
}
