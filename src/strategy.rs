//! The aggregation pipelines the revision selector chooses among.
//!
//! All of them produce the same [`Aggregate`] for the same input; they differ
//! only in how work is split and handed between threads.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::thread;

use crossbeam_channel::{bounded, Sender};
use memmap2::MmapOptions;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::chunker::compute_chunks;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::Aggregate;
use crate::parser::RecordParser;
use crate::reducer::{drain, reduce};
use crate::tally::{record, TallyMap};
use crate::worker::{run_chunk, tally_records};

/// Records handed from the reader thread to a fan-out worker in one message.
const FAN_OUT_BATCH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    /// One thread, one buffered pass.
    Naive,
    /// One reader thread parsing and fanning record batches out to workers.
    FanOut,
    /// Newline-aligned chunks, one worker per chunk, rendezvous result queue.
    ChunkedRendezvous,
    /// Newline-aligned chunks with a result queue sized to the worker count.
    ChunkedQueued,
    /// Chunks over a memory map, parsed on a rayon pool.
    Mapped,
}

impl Revision {
    pub const DEFAULT: Revision = Revision::ChunkedQueued;

    /// Selector number; the chunked variants keep their historical numbers.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Revision::Naive => 0,
            Revision::FanOut => 1,
            Revision::ChunkedRendezvous => 5,
            Revision::ChunkedQueued => 7,
            Revision::Mapped => 8,
        }
    }

    pub const ALL: [Revision; 5] = [
        Revision::Naive,
        Revision::FanOut,
        Revision::ChunkedRendezvous,
        Revision::ChunkedQueued,
        Revision::Mapped,
    ];
}

impl TryFrom<u8> for Revision {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Revision::ALL
            .into_iter()
            .find(|r| r.number() == value)
            .ok_or(Error::UnknownRevision(value))
    }
}

/// Aggregates the file at `path` using `revision`.
///
/// # Errors
///
/// Any configuration, I/O, chunking or parse error; the first one hit aborts
/// the run and no partial result is returned.
pub fn run(path: &Path, revision: Revision, config: &Config) -> Result<Aggregate> {
    config.validate()?;
    info!(?revision, workers = config.workers.get(), path = %path.display(), "aggregating");

    match revision {
        Revision::Naive => run_naive(path, config),
        Revision::FanOut => run_fan_out(path, config),
        Revision::ChunkedRendezvous => run_chunked(path, config, 0),
        Revision::ChunkedQueued => run_chunked(path, config, config.workers.get()),
        Revision::Mapped => run_mapped(path, config),
    }
}

fn open(path: &Path) -> Result<(File, u64)> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let len = file.metadata().map_err(|e| Error::io(path, e))?.len();
    Ok((file, len))
}

fn run_naive(path: &Path, config: &Config) -> Result<Aggregate> {
    let (file, _) = open(path)?;
    let reader = BufReader::with_capacity(config.read_buffer_size, file);
    Ok(Aggregate::from(tally_records(RecordParser::new(reader))?))
}

/// Chunked engine: one scoped thread per chunk, each with its own handle,
/// reporting over a result queue of `queue_capacity` slots.
fn run_chunked(path: &Path, config: &Config, queue_capacity: usize) -> Result<Aggregate> {
    let (mut file, file_size) = open(path)?;
    let chunks = compute_chunks(
        &mut file,
        file_size,
        config.workers.get(),
        config.max_record_length,
    )?;
    drop(file);
    debug!(chunks = chunks.len(), queue_capacity, "spawning chunk workers");

    let (tx, rx) = bounded(queue_capacity);
    thread::scope(|s| {
        for chunk in chunks.iter().copied() {
            let tx = tx.clone();
            s.spawn(move || {
                // a closed queue means the reducer already gave up
                let _ = tx.send(run_chunk(path, chunk, config));
            });
        }
        drop(tx);
        drain(rx, chunks.len())
    })
}

/// A single reader parses the whole file and spreads batches over workers.
fn run_fan_out(path: &Path, config: &Config) -> Result<Aggregate> {
    let (file, _) = open(path)?;
    let reader = BufReader::with_capacity(config.read_buffer_size, file);
    let workers = config.workers.get();

    let (batch_tx, batch_rx) = bounded::<Vec<(String, f64)>>(workers);
    let (result_tx, result_rx) = bounded(workers);
    thread::scope(|s| {
        for _ in 0..workers {
            let batches = batch_rx.clone();
            let results = result_tx.clone();
            s.spawn(move || {
                let mut map = TallyMap::default();
                for batch in batches {
                    for (key, reading) in batch {
                        record(&mut map, &key, reading);
                    }
                }
                let _ = results.send(Ok(map));
            });
        }
        drop(batch_rx);
        drop(result_tx);

        let fed = feed(RecordParser::new(reader), &batch_tx);
        // closing the batch queue lets every worker report
        drop(batch_tx);
        fed?;
        drain(result_rx, workers)
    })
}

fn feed<R: std::io::BufRead>(
    mut parser: RecordParser<R>,
    batches: &Sender<Vec<(String, f64)>>,
) -> Result<()> {
    let mut batch = Vec::with_capacity(FAN_OUT_BATCH);
    while let Some((key, reading)) = parser.next_record()? {
        batch.push((key.to_owned(), reading));
        if batch.len() == FAN_OUT_BATCH {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(FAN_OUT_BATCH));
            batches.send(full).map_err(|_| Error::WorkerLost)?;
        }
    }
    if !batch.is_empty() {
        batches.send(batch).map_err(|_| Error::WorkerLost)?;
    }
    Ok(())
}

/// Memory-mapped variant: the same chunk layout, parsed in place on a rayon
/// pool and merged by the reducer once every chunk is done.
fn run_mapped(path: &Path, config: &Config) -> Result<Aggregate> {
    let (file, file_size) = open(path)?;
    if file_size == 0 {
        return Ok(Aggregate::default());
    }

    // SAFETY: the input is treated as immutable for the duration of the run.
    #[allow(unsafe_code)]
    let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(|e| Error::io(path, e))?;
    let chunks = compute_chunks(
        &mut Cursor::new(&mmap[..]),
        file_size,
        config.workers.get(),
        config.max_record_length,
    )?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.get())
        .build()?;
    let partials = pool.install(|| {
        chunks
            .par_iter()
            .map(|chunk| tally_records(RecordParser::starting_at(&mmap[chunk.range()], chunk.start)))
            .collect::<Result<Vec<TallyMap>>>()
    })?;

    Ok(reduce(partials))
}
