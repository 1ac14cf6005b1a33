//! Per-line containment of malformed input.
//!
//! A line moves through classification, extraction and normalization. Any
//! failure on the way ends in the bad partition with the original line
//! attached; nothing is propagated to the caller.

use tickparse_core::{CommonEvent, Result, SourceFormat};
use tracing::warn;

use crate::classifier::classify;
use crate::extractor::extract;
use crate::normalizer;

/// Classify, extract and normalize a line, surfacing the first failure.
pub fn try_parse_line(line: &str, format: SourceFormat) -> Result<CommonEvent> {
    let classified = classify(line, format)?;
    let extracted = extract(&classified)?;
    Ok(normalizer::normalize(extracted))
}

/// Normalize a line, routing failures to the bad partition.
pub fn parse_line(line: &str, format: SourceFormat) -> CommonEvent {
    contain(line, format, true)
}

/// Normalize a CSV line.
pub fn parse_csv(line: &str) -> CommonEvent {
    parse_line(line, SourceFormat::Csv)
}

/// Normalize a JSON line.
pub fn parse_json(line: &str) -> CommonEvent {
    parse_line(line, SourceFormat::Json)
}

pub(crate) fn contain(line: &str, format: SourceFormat, log_bad: bool) -> CommonEvent {
    match try_parse_line(line, format) {
        Ok(event) => event,
        Err(e) => {
            if log_bad {
                let stage = if e.is_classification() { "classify" } else { "extract" };
                warn!(%format, stage, error = %e, line, "routing line to bad partition");
            }
            normalizer::bad(line)
        }
    }
}
