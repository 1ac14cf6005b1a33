//! Core data types for the tickparse system.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};

use crate::convert::TIMESTAMP_OUTPUT_FORMAT;
use crate::error::Error;
use crate::price::{Price, PRICE_PRECISION, PRICE_SCALE};

/// Encoding of a batch of raw lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Comma-delimited positional fields.
    Csv,
    /// One JSON object per line.
    Json,
}

impl SourceFormat {
    /// Lowercase name of the encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Json => "json",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            other => Err(Error::config(format!("unknown source format {other:?}"))),
        }
    }
}

/// Kind of market event carried by a well-formed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Executed transaction.
    #[serde(rename = "T")]
    Trade,
    /// Bid/ask pair.
    #[serde(rename = "Q")]
    Quote,
}

impl RecordKind {
    /// Discriminator as it appears on the wire.
    pub fn code(self) -> &'static str {
        match self {
            RecordKind::Trade => "T",
            RecordKind::Quote => "Q",
        }
    }

    /// Look up a kind from its wire discriminator.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "T" => Some(RecordKind::Trade),
            "Q" => Some(RecordKind::Quote),
            _ => None,
        }
    }
}

/// Partition tag of a normalized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    #[serde(rename = "T")]
    Trade,
    #[serde(rename = "Q")]
    Quote,
    #[serde(rename = "B")]
    Bad,
}

impl Partition {
    /// Single-character tag.
    pub fn code(self) -> &'static str {
        match self {
            Partition::Trade => "T",
            Partition::Quote => "Q",
            Partition::Bad => "B",
        }
    }
}

impl From<RecordKind> for Partition {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Trade => Partition::Trade,
            RecordKind::Quote => Partition::Quote,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Fields shared by trades and quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    /// Trading date.
    pub trade_dt: NaiveDate,
    /// Record type discriminator.
    pub rec_type: RecordKind,
    /// Stock symbol.
    pub symbol: String,
    /// Exchange the event happened on.
    pub exchange: String,
    /// Event time.
    pub event_tm: NaiveDateTime,
    /// Sequence number within the source file.
    pub event_seq_nb: i32,
    /// Time the source file arrived.
    pub arrival_tm: NaiveDateTime,
}

/// Trade-only payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFields {
    /// Execution price.
    pub trade_pr: Price,
    /// Execution size.
    pub trade_size: i32,
}

/// Quote-only payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteFields {
    pub bid_pr: Price,
    pub bid_size: i32,
    pub ask_pr: Price,
    pub ask_size: i32,
}

/// One normalized input line.
///
/// The variant decides which payload exists, so a trade can never carry
/// bid/ask values and a bad record can never carry typed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommonEvent {
    Trade {
        header: EventHeader,
        trade: TradeFields,
    },
    Quote {
        header: EventHeader,
        quote: QuoteFields,
    },
    /// Line that failed classification or extraction, kept verbatim.
    Bad { line: String },
}

impl CommonEvent {
    /// Partition tag for this record.
    pub fn partition(&self) -> Partition {
        match self {
            CommonEvent::Trade { .. } => Partition::Trade,
            CommonEvent::Quote { .. } => Partition::Quote,
            CommonEvent::Bad { .. } => Partition::Bad,
        }
    }

    /// Shared header, absent for bad records.
    pub fn header(&self) -> Option<&EventHeader> {
        match self {
            CommonEvent::Trade { header, .. } | CommonEvent::Quote { header, .. } => Some(header),
            CommonEvent::Bad { .. } => None,
        }
    }

    /// Original line of a bad record.
    pub fn bad_line(&self) -> Option<&str> {
        match self {
            CommonEvent::Bad { line } => Some(line),
            _ => None,
        }
    }

    /// Whether this record went to the bad partition.
    pub fn is_bad(&self) -> bool {
        matches!(self, CommonEvent::Bad { .. })
    }

    /// Flatten into the fixed column layout.
    pub fn to_row(&self) -> CommonRow {
        CommonRow::from(self)
    }
}

/// Column type of the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Date,
    String,
    Timestamp,
    Int,
    Decimal { precision: u32, scale: u32 },
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Date => f.write_str("date"),
            ColumnType::String => f.write_str("string"),
            ColumnType::Timestamp => f.write_str("timestamp"),
            ColumnType::Int => f.write_str("int"),
            ColumnType::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
        }
    }
}

const PRICE: ColumnType = ColumnType::Decimal {
    precision: PRICE_PRECISION,
    scale: PRICE_SCALE,
};

/// Column names and types of [`CommonRow`], in order.
pub const SCHEMA: [(&str, ColumnType); 15] = [
    ("trade_dt", ColumnType::Date),
    ("rec_type", ColumnType::String),
    ("symbol", ColumnType::String),
    ("exchange", ColumnType::String),
    ("event_tm", ColumnType::Timestamp),
    ("event_seq_nb", ColumnType::Int),
    ("arrival_tm", ColumnType::Timestamp),
    ("trade_pr", PRICE),
    ("trade_size", ColumnType::Int),
    ("bid_pr", PRICE),
    ("bid_size", ColumnType::Int),
    ("ask_pr", PRICE),
    ("ask_size", ColumnType::Int),
    ("partition", ColumnType::String),
    ("line", ColumnType::String),
];

/// Flat 15-slot projection of a [`CommonEvent`].
///
/// Field order matches [`SCHEMA`]; `None` is the empty marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonRow {
    pub trade_dt: Option<NaiveDate>,
    pub rec_type: Option<RecordKind>,
    pub symbol: Option<String>,
    pub exchange: Option<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub event_tm: Option<NaiveDateTime>,
    pub event_seq_nb: Option<i32>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub arrival_tm: Option<NaiveDateTime>,
    pub trade_pr: Option<Price>,
    pub trade_size: Option<i32>,
    pub bid_pr: Option<Price>,
    pub bid_size: Option<i32>,
    pub ask_pr: Option<Price>,
    pub ask_size: Option<i32>,
    pub partition: Partition,
    pub line: Option<String>,
}

impl CommonRow {
    fn empty(partition: Partition) -> Self {
        Self {
            trade_dt: None,
            rec_type: None,
            symbol: None,
            exchange: None,
            event_tm: None,
            event_seq_nb: None,
            arrival_tm: None,
            trade_pr: None,
            trade_size: None,
            bid_pr: None,
            bid_size: None,
            ask_pr: None,
            ask_size: None,
            partition,
            line: None,
        }
    }

    fn with_header(partition: Partition, header: &EventHeader) -> Self {
        Self {
            trade_dt: Some(header.trade_dt),
            rec_type: Some(header.rec_type),
            symbol: Some(header.symbol.clone()),
            exchange: Some(header.exchange.clone()),
            event_tm: Some(header.event_tm),
            event_seq_nb: Some(header.event_seq_nb),
            arrival_tm: Some(header.arrival_tm),
            ..Self::empty(partition)
        }
    }

    /// Whether every typed analytic slot holds the empty marker.
    pub fn is_typed_empty(&self) -> bool {
        self.trade_dt.is_none()
            && self.rec_type.is_none()
            && self.symbol.is_none()
            && self.exchange.is_none()
            && self.event_tm.is_none()
            && self.event_seq_nb.is_none()
            && self.arrival_tm.is_none()
            && self.trade_pr.is_none()
            && self.trade_size.is_none()
            && self.bid_pr.is_none()
            && self.bid_size.is_none()
            && self.ask_pr.is_none()
            && self.ask_size.is_none()
    }
}

impl From<&CommonEvent> for CommonRow {
    fn from(event: &CommonEvent) -> Self {
        match event {
            CommonEvent::Trade { header, trade } => CommonRow {
                trade_pr: Some(trade.trade_pr),
                trade_size: Some(trade.trade_size),
                ..CommonRow::with_header(Partition::Trade, header)
            },
            CommonEvent::Quote { header, quote } => CommonRow {
                bid_pr: Some(quote.bid_pr),
                bid_size: Some(quote.bid_size),
                ask_pr: Some(quote.ask_pr),
                ask_size: Some(quote.ask_size),
                ..CommonRow::with_header(Partition::Quote, header)
            },
            CommonEvent::Bad { line } => CommonRow {
                line: Some(line.clone()),
                ..CommonRow::empty(Partition::Bad)
            },
        }
    }
}

fn serialize_timestamp<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(ts) => serializer.collect_str(&ts.format(TIMESTAMP_OUTPUT_FORMAT)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn header(kind: RecordKind) -> EventHeader {
        let ts = NaiveDate::from_ymd_opt(2023, 1, 3)
            .unwrap()
            .and_hms_micro_opt(9, 30, 0, 250)
            .unwrap();
        EventHeader {
            trade_dt: NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
            rec_type: kind,
            symbol: "IBM".to_string(),
            exchange: "NYSE".to_string(),
            event_tm: ts,
            event_seq_nb: 1,
            arrival_tm: ts,
        }
    }

    #[test]
    fn test_schema_column_order() {
        let names: Vec<&str> = SCHEMA.iter().map(|(name, _)| *name).collect();
        assert_eq!(names[0], "trade_dt");
        assert_eq!(names[7], "trade_pr");
        assert_eq!(names[13], "partition");
        assert_eq!(names[14], "line");
        assert_eq!(SCHEMA[7].1.to_string(), "decimal(30,15)");
    }

    #[test]
    fn test_row_serializes_in_schema_order() {
        let event = CommonEvent::Trade {
            header: header(RecordKind::Trade),
            trade: TradeFields {
                trade_pr: price("150.25"),
                trade_size: 100,
            },
        };
        let json = serde_json::to_value(event.to_row()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), SCHEMA.len());
        for (name, _) in SCHEMA.iter() {
            assert!(object.contains_key(*name), "missing column {name}");
        }
        assert_eq!(json["rec_type"], "T");
        assert_eq!(json["partition"], "T");
        assert_eq!(json["trade_pr"], "150.25");
        assert_eq!(json["event_tm"], "2023-01-03 09:30:00.000250");
        assert!(json["bid_pr"].is_null());
        assert!(json["line"].is_null());
    }

    #[test]
    fn test_quote_row_leaves_trade_slots_empty() {
        let event = CommonEvent::Quote {
            header: header(RecordKind::Quote),
            quote: QuoteFields {
                bid_pr: price("150.00"),
                bid_size: 100,
                ask_pr: price("150.50"),
                ask_size: 200,
            },
        };
        let row = event.to_row();
        assert_eq!(row.partition, Partition::Quote);
        assert!(row.trade_pr.is_none());
        assert!(row.trade_size.is_none());
        assert_eq!(row.ask_size, Some(200));
    }

    #[test]
    fn test_bad_row_carries_line_only() {
        let event = CommonEvent::Bad {
            line: "garbage,line".to_string(),
        };
        let row = event.to_row();
        assert_eq!(row.partition, Partition::Bad);
        assert!(row.is_typed_empty());
        assert_eq!(row.line.as_deref(), Some("garbage,line"));
        assert_eq!(event.bad_line(), Some("garbage,line"));
        assert!(event.header().is_none());
    }

    #[test]
    fn test_source_format_from_str() {
        assert_eq!("CSV".parse::<SourceFormat>().unwrap(), SourceFormat::Csv);
        assert_eq!("json".parse::<SourceFormat>().unwrap(), SourceFormat::Json);
        assert!("parquet".parse::<SourceFormat>().is_err());
    }

    #[test]
    fn test_record_kind_codes() {
        assert_eq!(RecordKind::from_code("T"), Some(RecordKind::Trade));
        assert_eq!(RecordKind::from_code("Q"), Some(RecordKind::Quote));
        assert_eq!(RecordKind::from_code("X"), None);
        assert_eq!(RecordKind::from_code("t"), None);
        assert_eq!(Partition::from(RecordKind::Quote).code(), "Q");
    }
}
