use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use brc_chunked::{
    run, Config, Revision, DEFAULT_MAX_RECORD_LENGTH, DEFAULT_READ_BUFFER_SIZE,
};
use clap::Parser;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to measurements file
    #[arg(default_value = "measurements.txt")]
    path: PathBuf,

    /// Aggregation strategy: 0 naive, 1 fan-out, 5 chunked (rendezvous),
    /// 7 chunked (queued), 8 memory-mapped
    #[arg(short, long, default_value_t = Revision::DEFAULT.number())]
    revision: u8,

    /// Worker threads [default: available parallelism]
    #[arg(short = 'j', long)]
    workers: Option<NonZeroUsize>,

    /// Longest record the chunker will look past when aligning chunk boundaries
    #[arg(long, default_value_t = DEFAULT_MAX_RECORD_LENGTH)]
    max_record_length: usize,

    /// Read buffer per worker, in bytes
    #[arg(long, default_value_t = DEFAULT_READ_BUFFER_SIZE)]
    buffer_size: usize,

    /// More output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let start = Instant::now();
    let args = Args::parse();
    init_logging(args.verbose);

    let revision = Revision::try_from(args.revision)?;
    let workers = match args.workers {
        Some(workers) => workers,
        None => std::thread::available_parallelism()
            .context("could not determine available parallelism; pass --workers")?,
    };
    let config = Config::new(workers)
        .with_max_record_length(args.max_record_length)
        .with_read_buffer_size(args.buffer_size);

    let aggregate = run(&args.path, revision, &config)
        .with_context(|| format!("failed to aggregate {}", args.path.display()))?;
    info!(keys = aggregate.len(), elapsed = ?start.elapsed(), "aggregation done");

    let handle = std::io::stdout().lock();
    let mut writer = BufWriter::new(handle);
    writeln!(writer, "{aggregate}")?;
    writer.flush()?;

    debug!(elapsed = ?start.elapsed(), "output written");
    Ok(())
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .init();
}
