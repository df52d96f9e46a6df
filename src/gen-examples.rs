//! Writes a random measurements file for exercising `1brc`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Station names with a rough yearly mean temperature.
const STATIONS: [(&str, f64); 24] = [
    ("Abha", 18.0),
    ("Abidjan", 26.0),
    ("Accra", 26.4),
    ("Addis Ababa", 16.0),
    ("Alexandria", 20.0),
    ("Bangkok", 28.6),
    ("Bulawayo", 18.9),
    ("Cracow", 9.3),
    ("Dakar", 24.0),
    ("Hamburg", 9.7),
    ("İzmir", 17.9),
    ("Jakarta", 26.7),
    ("Kuopio", 3.4),
    ("Lima", 19.8),
    ("Marrakesh", 19.6),
    ("Nuuk", -1.4),
    ("Oslo", 5.7),
    ("Palembang", 27.3),
    ("Reykjavík", 4.3),
    ("São Paulo", 19.7),
    ("St. John's", 5.0),
    ("Tokyo", 15.4),
    ("Vladivostok", 4.9),
    ("Yakutsk", -8.8),
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of records to write
    rows: u64,

    /// Output file
    #[arg(short, long, default_value = "measurements.txt")]
    output: PathBuf,

    /// Seed for a reproducible file
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let file = File::create(&args.output)
        .with_context(|| format!("could not create {}", args.output.display()))?;
    let mut writer = BufWriter::with_capacity(1024 * 1024, file);

    writeln!(writer, "# station;temperature, {} rows", args.rows)?;
    for _ in 0..args.rows {
        let (name, mean) = STATIONS[rng.gen_range(0..STATIONS.len())];
        let reading: f64 = rng.gen_range(mean - 10.0..=mean + 10.0);
        writeln!(writer, "{name};{reading:.1}")?;
    }
    writer.flush()?;

    info!(rows = args.rows, output = %args.output.display(), "wrote measurements");
    Ok(())
}
