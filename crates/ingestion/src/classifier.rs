//! Record type detection.
//!
//! Decodes a raw line just far enough to read its discriminator and hands the
//! decoded fields on, so extraction never decodes the same line twice.

use serde_json::{Map, Value};
use tickparse_core::{Error, RecordKind, Result, SourceFormat};

/// Field separator of CSV lines. Embedded commas are not escaped.
pub const CSV_DELIMITER: char = ',';

/// Position of the record type in a CSV line.
pub const CSV_RECORD_TYPE_POS: usize = 2;

/// Key of the record type in a JSON line.
pub const JSON_RECORD_TYPE_KEY: &str = "event_type";

/// Decoded but not yet converted fields of a line.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFields<'a> {
    /// Comma separated values, borrowed from the line.
    Csv(Vec<&'a str>),
    /// Top-level JSON object.
    Json(Map<String, Value>),
}

/// A line whose record kind is known.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine<'a> {
    /// Trade or quote.
    pub kind: RecordKind,
    /// Decoded fields.
    pub fields: RawFields<'a>,
}

/// Classify a line of the given encoding.
///
/// Returns [`Error::Classification`] when the discriminator is missing or not
/// `T`/`Q`, or when a JSON line is not an object.
pub fn classify(line: &str, format: SourceFormat) -> Result<ClassifiedLine<'_>> {
    match format {
        SourceFormat::Csv => classify_csv(line),
        SourceFormat::Json => classify_json(line),
    }
}

fn classify_csv(line: &str) -> Result<ClassifiedLine<'_>> {
    let fields: Vec<&str> = line.split(CSV_DELIMITER).collect();

    let code = fields.get(CSV_RECORD_TYPE_POS).ok_or_else(|| {
        Error::classification(format!(
            "csv line has {} fields, record type expected at position {CSV_RECORD_TYPE_POS}",
            fields.len()
        ))
    })?;

    let kind = RecordKind::from_code(code)
        .ok_or_else(|| Error::classification(format!("unknown record type {code:?}")))?;

    Ok(ClassifiedLine {
        kind,
        fields: RawFields::Csv(fields),
    })
}

fn classify_json(line: &str) -> Result<ClassifiedLine<'_>> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| Error::classification(format!("invalid json: {e}")))?;

    let Value::Object(object) = value else {
        return Err(Error::classification("json line is not an object"));
    };

    let kind = match object.get(JSON_RECORD_TYPE_KEY) {
        Some(Value::String(code)) => RecordKind::from_code(code)
            .ok_or_else(|| Error::classification(format!("unknown record type {code:?}")))?,
        Some(other) => {
            return Err(Error::classification(format!(
                "`{JSON_RECORD_TYPE_KEY}` is not a string: {other}"
            )))
        }
        None => {
            return Err(Error::classification(format!(
                "missing `{JSON_RECORD_TYPE_KEY}`"
            )))
        }
    };

    Ok(ClassifiedLine {
        kind,
        fields: RawFields::Json(object),
    })
}
