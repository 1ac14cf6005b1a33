//! Assembly of the unified record.

use tickparse_core::CommonEvent;

use crate::extractor::Extracted;

/// Build the unified record for extracted trade or quote fields.
///
/// Only the payload of the extracted kind is populated; the columns of the
/// other kind stay empty by construction.
pub fn normalize(extracted: Extracted) -> CommonEvent {
    match extracted {
        Extracted::Trade { header, trade } => CommonEvent::Trade { header, trade },
        Extracted::Quote { header, quote } => CommonEvent::Quote { header, quote },
    }
}

/// Build the bad-partition record for a line, keeping it byte for byte.
pub fn bad(line: &str) -> CommonEvent {
    CommonEvent::Bad {
        line: line.to_owned(),
    }
}
