//! Configuration structures for the tickparse system.
//!
//! The configuration is an explicit value handed to whatever drives a batch;
//! nothing in the per-line pipeline reads process-wide state.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::SourceFormat;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Line ingestion configuration.
    pub ingest: IngestConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Encoding of the batch; inferred from the input name when unset.
    pub format: Option<SourceFormat>,
    /// Emit a warning for every line routed to the bad partition.
    pub log_bad_records: bool,
    /// Number of worker threads (0 = available parallelism).
    pub workers: u32,
    /// Lines read and normalized per batch when streaming a file.
    pub chunk_lines: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            format: None,
            log_bad_records: true,
            workers: 0,
            chunk_lines: 65_536,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write bad-partition rows alongside good ones.
    pub include_bad: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { include_bad: true }
    }
}
