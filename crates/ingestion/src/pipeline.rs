//! Batch processing of raw lines.
//!
//! Every line is normalized independently, so a batch can be spread over a
//! worker pool without coordination. Output order follows input order.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tickparse_core::config::IngestConfig;
use tickparse_core::{CommonEvent, Error, Partition, Result, SourceFormat};
use tracing::debug;

use crate::handler::contain;

/// Batches smaller than this are processed on the calling thread.
const MIN_PARALLEL_LINES: usize = 1024;

/// Statistics about a processed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Total records seen.
    pub total: u64,
    /// Records in the trade partition.
    pub trades: u64,
    /// Records in the quote partition.
    pub quotes: u64,
    /// Records in the bad partition.
    pub bad: u64,
}

impl IngestStats {
    /// Tally a batch of records.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a CommonEvent>) -> Self {
        let mut stats = Self::default();
        for event in events {
            stats.record(event);
        }
        stats
    }

    /// Count one record.
    pub fn record(&mut self, event: &CommonEvent) {
        self.total += 1;
        match event.partition() {
            Partition::Trade => self.trades += 1,
            Partition::Quote => self.quotes += 1,
            Partition::Bad => self.bad += 1,
        }
    }

    /// Add the counts of another batch.
    pub fn merge(&mut self, other: &IngestStats) {
        self.total += other.total;
        self.trades += other.trades;
        self.quotes += other.quotes;
        self.bad += other.bad;
    }

    /// Get the fraction of records routed to the bad partition.
    pub fn bad_frac(&self) -> f64 {
        if self.total > 0 {
            self.bad as f64 / self.total as f64
        } else {
            0.0
        }
    }
}

/// Line normalizer bound to one encoding and an ingestion configuration.
pub struct LinePipeline {
    format: SourceFormat,
    log_bad_records: bool,
    /// Dedicated pool when a worker count is configured, otherwise rayon's global pool.
    pool: Option<ThreadPool>,
}

impl LinePipeline {
    /// Create a pipeline with default settings.
    pub fn new(format: SourceFormat) -> Self {
        Self {
            format,
            log_bad_records: true,
            pool: None,
        }
    }

    /// Create a pipeline from an ingestion config.
    ///
    /// `format` overrides the configured encoding; one of the two must be set.
    pub fn from_config(config: &IngestConfig, format: Option<SourceFormat>) -> Result<Self> {
        let format = format
            .or(config.format)
            .ok_or_else(|| Error::config("source format is not set"))?;

        let pool = if config.workers > 0 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.workers as usize)
                .build()
                .map_err(|e| Error::config(format!("failed to build worker pool: {e}")))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            format,
            log_bad_records: config.log_bad_records,
            pool,
        })
    }

    /// Encoding this pipeline parses.
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Normalize one line.
    pub fn process(&self, line: &str) -> CommonEvent {
        contain(line, self.format, self.log_bad_records)
    }

    /// Normalize a batch of lines.
    pub fn process_batch<S>(&self, lines: &[S]) -> Vec<CommonEvent>
    where
        S: AsRef<str> + Sync,
    {
        let events: Vec<CommonEvent> = if lines.len() < MIN_PARALLEL_LINES {
            lines.iter().map(|line| self.process(line.as_ref())).collect()
        } else {
            let run = || -> Vec<CommonEvent> {
                lines
                    .par_iter()
                    .map(|line| self.process(line.as_ref()))
                    .collect()
            };
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        };

        debug!(format = %self.format, lines = lines.len(), "processed batch");
        events
    }
}
