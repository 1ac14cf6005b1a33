//! Line parsing and normalization for the tickparse system.
//!
//! This crate handles:
//! - Record type detection for CSV and JSON lines
//! - Field extraction and type conversion
//! - Assembly of the unified trade/quote record
//! - Containment of malformed lines in the bad partition
//! - Batch processing and ingestion statistics

pub mod classifier;
pub mod extractor;
pub mod handler;
pub mod normalizer;
pub mod pipeline;

pub use classifier::{classify, ClassifiedLine, RawFields};
pub use extractor::{extract, Extracted};
pub use handler::{parse_csv, parse_json, parse_line, try_parse_line};
pub use pipeline::{IngestStats, LinePipeline};
