//! Splitting a file into newline-aligned byte ranges.
//!
//! Boundaries are found by probing the bytes just before each naive split
//! point and moving the split to just past the first newline found there, so
//! no record ever straddles two chunks.

use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;

use tracing::debug;

use crate::error::{Error, Result};

/// A contiguous byte range of the input owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: u64,
    pub len: u64,
}

impl Chunk {
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.start + self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The chunk as an index range into an in-memory view of the file.
    ///
    /// # Panics
    ///
    /// Panics if the chunk does not fit in the address space.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        let start = usize::try_from(self.start).expect("chunk start exceeds address space");
        let end = usize::try_from(self.end()).expect("chunk end exceeds address space");
        start..end
    }
}

/// Computes `target_workers` ordered, newline-aligned chunks covering
/// `[0, file_size)`.
///
/// Chunk `i` (for `i >= 1`) starts just past the first newline found in the
/// `max_record_length` bytes leading up to `i * file_size / target_workers`.
/// Small files may yield trailing empty chunks.
///
/// # Errors
///
/// [`Error::ChunkBoundary`] if a probe window holds no newline and does not
/// reach the end of the file, [`Error::Read`] if probing the source fails, and
/// [`Error::Config`] for a zero worker count or record length.
pub fn compute_chunks<R: Read + Seek>(
    source: &mut R,
    file_size: u64,
    target_workers: usize,
    max_record_length: usize,
) -> Result<Vec<Chunk>> {
    if target_workers == 0 {
        return Err(Error::Config("worker count must be at least 1".into()));
    }
    if max_record_length == 0 {
        return Err(Error::Config("max record length must be at least 1".into()));
    }

    let target_size = file_size / target_workers as u64;
    let mut starts = Vec::with_capacity(target_workers);
    starts.push(0);
    // no window ever needs more bytes than the file holds
    let window = u64::try_from(max_record_length).unwrap_or(u64::MAX);
    let mut probe = Vec::with_capacity(usize::try_from(window.min(file_size)).unwrap_or(0));

    for i in 1..target_workers as u64 {
        let previous = *starts.last().unwrap_or(&0);
        let candidate = (i * target_size)
            .saturating_sub(window)
            .max(previous);
        if candidate >= file_size {
            starts.push(file_size);
            continue;
        }

        source
            .seek(SeekFrom::Start(candidate))
            .map_err(|source| Error::Read {
                offset: candidate,
                source,
            })?;
        probe.clear();
        let read = source
            .by_ref()
            .take(window)
            .read_to_end(&mut probe)
            .map_err(|source| Error::Read {
                offset: candidate,
                source,
            })?;

        let boundary = match memchr::memchr(b'\n', &probe) {
            Some(idx) => candidate + idx as u64 + 1,
            None if candidate + read as u64 >= file_size => file_size,
            None => {
                return Err(Error::ChunkBoundary {
                    offset: candidate,
                    max_record_length,
                })
            }
        };
        starts.push(boundary);
    }

    let chunks: Vec<Chunk> = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(file_size);
            Chunk {
                start,
                len: end - start,
            }
        })
        .collect();

    debug!(file_size, target_size, chunks = ?chunks, "computed chunk layout");
    Ok(chunks)
}
