//! Reference batch driver.
//!
//! Reads raw trade/quote lines from a file, normalizes every line and writes
//! one JSON object per record in the fixed column order.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tickparse_core::{CommonEvent, Config, SourceFormat, SCHEMA};
use tickparse_ingestion::{IngestStats, LinePipeline};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tickparse", version, about = "Normalize trade and quote feed lines")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize a file of CSV or JSON lines into JSON rows
    Normalize(NormalizeArgs),
    /// Print the column schema of the normalized rows
    Schema,
}

#[derive(clap::Args, Debug)]
struct NormalizeArgs {
    /// Input file with one record per line
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source encoding (csv or json); inferred from the input extension when omitted
    #[arg(long)]
    format: Option<SourceFormat>,

    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of worker threads (0 = all cores)
    #[arg(long)]
    workers: Option<u32>,

    /// Lines normalized per batch
    #[arg(long)]
    chunk_lines: Option<usize>,

    /// Leave bad-partition rows out of the output
    #[arg(long)]
    skip_bad: bool,

    /// Do not log every bad line
    #[arg(long)]
    quiet_bad: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Normalize(args) => normalize(args),
        Command::Schema => {
            for (name, column_type) in SCHEMA.iter() {
                println!("{name}\t{column_type}");
            }
            Ok(())
        }
    }
}

fn normalize(args: NormalizeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(workers) = args.workers {
        config.ingest.workers = workers;
    }
    if let Some(chunk_lines) = args.chunk_lines {
        config.ingest.chunk_lines = chunk_lines;
    }
    if args.skip_bad {
        config.output.include_bad = false;
    }
    if args.quiet_bad {
        config.ingest.log_bad_records = false;
    }

    let format = match args.format.or(config.ingest.format) {
        Some(format) => format,
        None => infer_format(&args.input)?,
    };
    let pipeline = LinePipeline::from_config(&config.ingest, Some(format))?;

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    info!(input = %args.input.display(), %format, chunk_lines = config.ingest.chunk_lines, "normalizing");

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let stats = normalize_stream(
        &pipeline,
        BufReader::new(file),
        BufWriter::new(sink),
        config.ingest.chunk_lines.max(1),
        config.output.include_bad,
    )
    .with_context(|| format!("Failed to normalize {}", args.input.display()))?;

    info!(
        total = stats.total,
        trades = stats.trades,
        quotes = stats.quotes,
        bad = stats.bad,
        bad_frac = stats.bad_frac(),
        "done"
    );
    Ok(())
}

fn infer_format(path: &Path) -> Result<SourceFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv") | Some("txt") => Ok(SourceFormat::Csv),
        Some("json") | Some("jsonl") => Ok(SourceFormat::Json),
        _ => bail!(
            "cannot infer the format of {}; pass --format csv|json",
            path.display()
        ),
    }
}

/// Normalize `input` in batches of `chunk_lines`, writing rows as each batch completes.
fn normalize_stream(
    pipeline: &LinePipeline,
    input: impl BufRead,
    mut out: impl Write,
    chunk_lines: usize,
    include_bad: bool,
) -> Result<IngestStats> {
    let mut stats = IngestStats::default();
    let mut lines = input.lines();
    loop {
        let chunk = lines
            .by_ref()
            .take(chunk_lines)
            .collect::<io::Result<Vec<String>>>()?;
        if chunk.is_empty() {
            break;
        }
        let events = pipeline.process_batch(&chunk);
        stats.merge(&IngestStats::from_events(&events));
        write_rows(&mut out, &events, include_bad)?;
        debug!(lines = chunk.len(), total = stats.total, "wrote batch");
    }
    out.flush()?;
    Ok(stats)
}

fn write_rows(mut out: impl Write, events: &[CommonEvent], include_bad: bool) -> Result<()> {
    for event in events.iter().filter(|e| include_bad || !e.is_bad()) {
        serde_json::to_writer(&mut out, &event.to_row())?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
