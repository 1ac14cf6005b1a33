//! Field extraction and type conversion.
//!
//! Extraction is all-or-nothing: the first missing or unconvertible field
//! aborts the whole record with [`Error::MalformedField`].

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Number, Value};
use tickparse_core::convert::{parse_date, parse_decimal, parse_int, parse_timestamp};
use tickparse_core::{Error, EventHeader, Price, QuoteFields, RecordKind, Result, TradeFields};

use crate::classifier::{ClassifiedLine, RawFields};

/// Positions of the CSV columns.
pub mod csv_pos {
    pub const TRADE_DT: usize = 0;
    pub const ARRIVAL_TM: usize = 1;
    pub const REC_TYPE: usize = 2;
    pub const SYMBOL: usize = 3;
    pub const EVENT_TM: usize = 4;
    pub const EVENT_SEQ_NB: usize = 5;
    pub const EXCHANGE: usize = 6;
    /// `trade_pr` on trades, `bid_pr` on quotes.
    pub const PRICE: usize = 7;
    /// `trade_size` on trades, `bid_size` on quotes.
    pub const SIZE: usize = 8;
    pub const ASK_PR: usize = 9;
    pub const ASK_SIZE: usize = 10;
}

/// Keys of the JSON fields.
pub mod json_key {
    pub const TRADE_DT: &str = "trade_dt";
    pub const SYMBOL: &str = "symbol";
    pub const EXCHANGE: &str = "exchange";
    pub const EVENT_TM: &str = "event_tm";
    pub const EVENT_SEQ_NB: &str = "event_seq_nb";
    pub const FILE_TM: &str = "file_tm";
    pub const PRICE: &str = "price";
    pub const SIZE: &str = "size";
    pub const BID_PR: &str = "bid_pr";
    pub const BID_SIZE: &str = "bid_size";
    pub const ASK_PR: &str = "ask_pr";
    pub const ASK_SIZE: &str = "ask_size";
}

/// Converted fields of one trade or quote line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Trade {
        header: EventHeader,
        trade: TradeFields,
    },
    Quote {
        header: EventHeader,
        quote: QuoteFields,
    },
}

/// Extract and convert every field the classified kind requires.
pub fn extract(classified: &ClassifiedLine<'_>) -> Result<Extracted> {
    match &classified.fields {
        RawFields::Csv(fields) => extract_fields(&CsvSource { fields }, classified.kind),
        RawFields::Json(object) => extract_fields(&JsonSource { object }, classified.kind),
    }
}

/// Typed access to the fields of one encoding.
///
/// `column` is the unified record column being read; each source maps it to
/// its own position or key.
trait FieldSource {
    fn date(&self, column: &'static str) -> Result<NaiveDate>;
    fn timestamp(&self, column: &'static str) -> Result<NaiveDateTime>;
    fn text(&self, column: &'static str) -> Result<String>;
    fn int(&self, column: &'static str) -> Result<i32>;
    fn decimal(&self, column: &'static str) -> Result<Price>;
}

fn extract_fields(source: &impl FieldSource, kind: RecordKind) -> Result<Extracted> {
    let header = EventHeader {
        trade_dt: source.date("trade_dt")?,
        rec_type: kind,
        symbol: source.text("symbol")?,
        exchange: source.text("exchange")?,
        event_tm: source.timestamp("event_tm")?,
        event_seq_nb: source.int("event_seq_nb")?,
        arrival_tm: source.timestamp("arrival_tm")?,
    };

    Ok(match kind {
        RecordKind::Trade => Extracted::Trade {
            header,
            trade: TradeFields {
                trade_pr: source.decimal("trade_pr")?,
                trade_size: source.int("trade_size")?,
            },
        },
        RecordKind::Quote => Extracted::Quote {
            header,
            quote: QuoteFields {
                bid_pr: source.decimal("bid_pr")?,
                bid_size: source.int("bid_size")?,
                ask_pr: source.decimal("ask_pr")?,
                ask_size: source.int("ask_size")?,
            },
        },
    })
}

struct CsvSource<'s, 'a> {
    fields: &'s [&'a str],
}

impl CsvSource<'_, '_> {
    fn position(column: &'static str) -> Result<usize> {
        use self::csv_pos::*;
        Ok(match column {
            "trade_dt" => TRADE_DT,
            "arrival_tm" => ARRIVAL_TM,
            "rec_type" => REC_TYPE,
            "symbol" => SYMBOL,
            "event_tm" => EVENT_TM,
            "event_seq_nb" => EVENT_SEQ_NB,
            "exchange" => EXCHANGE,
            "trade_pr" | "bid_pr" => PRICE,
            "trade_size" | "bid_size" => SIZE,
            "ask_pr" => ASK_PR,
            "ask_size" => ASK_SIZE,
            _ => return Err(Error::malformed(column, "no csv position for column")),
        })
    }

    fn raw(&self, column: &'static str) -> Result<&str> {
        let pos = Self::position(column)?;
        self.fields.get(pos).copied().ok_or_else(|| {
            Error::malformed(
                column,
                format!(
                    "csv line has {} fields, expected one at position {pos}",
                    self.fields.len()
                ),
            )
        })
    }
}

impl FieldSource for CsvSource<'_, '_> {
    fn date(&self, column: &'static str) -> Result<NaiveDate> {
        parse_date(column, self.raw(column)?)
    }

    fn timestamp(&self, column: &'static str) -> Result<NaiveDateTime> {
        parse_timestamp(column, self.raw(column)?)
    }

    fn text(&self, column: &'static str) -> Result<String> {
        Ok(self.raw(column)?.to_string())
    }

    fn int(&self, column: &'static str) -> Result<i32> {
        parse_int(column, self.raw(column)?)
    }

    fn decimal(&self, column: &'static str) -> Result<Price> {
        parse_decimal(column, self.raw(column)?)
    }
}

struct JsonSource<'s> {
    object: &'s Map<String, Value>,
}

impl JsonSource<'_> {
    fn key(column: &'static str) -> Result<&'static str> {
        use self::json_key::*;
        Ok(match column {
            "trade_dt" => TRADE_DT,
            "symbol" => SYMBOL,
            "exchange" => EXCHANGE,
            "event_tm" => EVENT_TM,
            "event_seq_nb" => EVENT_SEQ_NB,
            "arrival_tm" => FILE_TM,
            "trade_pr" => PRICE,
            "trade_size" => SIZE,
            "bid_pr" => BID_PR,
            "bid_size" => BID_SIZE,
            "ask_pr" => ASK_PR,
            "ask_size" => ASK_SIZE,
            _ => return Err(Error::malformed(column, "no json key for column")),
        })
    }

    fn value(&self, column: &'static str) -> Result<&Value> {
        let key = Self::key(column)?;
        match self.object.get(key) {
            Some(Value::Null) | None => Err(Error::malformed(column, format!("missing key `{key}`"))),
            Some(value) => Ok(value),
        }
    }

    fn string(&self, column: &'static str) -> Result<&str> {
        match self.value(column)? {
            Value::String(s) => Ok(s),
            other => Err(Error::malformed(column, format!("expected a string, found {other}"))),
        }
    }

    /// Numeric fields may arrive as JSON numbers or as numeric strings.
    ///
    /// Numbers keep their source digits (`arbitrary_precision`), so a price
    /// never passes through a float.
    fn number(&self, column: &'static str) -> Result<NumericField<'_>> {
        match self.value(column)? {
            Value::String(s) => Ok(NumericField::Text(s)),
            Value::Number(n) => Ok(NumericField::Number(n)),
            other => Err(Error::malformed(column, format!("expected a number, found {other}"))),
        }
    }
}

enum NumericField<'a> {
    Text(&'a str),
    Number(&'a Number),
}

/// A JSON number counts as an integer when its value is integral, so `100`,
/// `100.0` and `1e2` agree. Numeric strings stay strict.
fn json_integer(column: &'static str, n: &Number) -> Result<i32> {
    let value = match n.as_i64() {
        Some(v) => Some(v),
        None => parse_decimal(column, &n.to_string())?
            .to_integer()
            .and_then(|v| i64::try_from(v).ok()),
    };
    value
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| Error::malformed(column, format!("expected a 32-bit integer, found {n}")))
}

impl FieldSource for JsonSource<'_> {
    fn date(&self, column: &'static str) -> Result<NaiveDate> {
        parse_date(column, self.string(column)?)
    }

    fn timestamp(&self, column: &'static str) -> Result<NaiveDateTime> {
        parse_timestamp(column, self.string(column)?)
    }

    fn text(&self, column: &'static str) -> Result<String> {
        self.string(column).map(str::to_string)
    }

    fn int(&self, column: &'static str) -> Result<i32> {
        match self.number(column)? {
            NumericField::Text(s) => parse_int(column, s),
            NumericField::Number(n) => json_integer(column, n),
        }
    }

    fn decimal(&self, column: &'static str) -> Result<Price> {
        match self.number(column)? {
            NumericField::Text(s) => parse_decimal(column, s),
            NumericField::Number(n) => parse_decimal(column, &n.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use tickparse_core::SourceFormat;

    const CSV_TRADE: &str = "2023-01-03,2023-01-03 09:31:00.000000,T,IBM,2023-01-03 09:30:00.000000,1,NYSE,150.25,100";
    const CSV_QUOTE: &str = "2023-01-03,2023-01-03 09:31:00.000000,Q,IBM,2023-01-03 09:30:00.000000,2,NYSE,150.00,100,150.50,200";

    fn extract_line(line: &str, format: SourceFormat) -> Result<Extracted> {
        extract(&classify(line, format)?)
    }

    fn dec(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn json_trade(seq: &str, price: &str) -> String {
        format!(
            r#"{{"event_type":"T","trade_dt":"2023-01-03","symbol":"IBM","exchange":"NYSE","event_tm":"2023-01-03 09:30:00.000000","event_seq_nb":{seq},"file_tm":"2023-01-03 09:31:00.000000","price":{price},"size":"100"}}"#
        )
    }

    #[test]
    fn test_csv_trade() {
        let Extracted::Trade { header, trade } = extract_line(CSV_TRADE, SourceFormat::Csv).unwrap() else {
            panic!("expected trade");
        };
        assert_eq!(header.trade_dt, NaiveDate::from_ymd_opt(2023, 1, 3).unwrap());
        assert_eq!(header.rec_type, RecordKind::Trade);
        assert_eq!(header.symbol, "IBM");
        assert_eq!(header.exchange, "NYSE");
        assert_eq!(header.event_seq_nb, 1);
        assert_eq!(header.event_tm.to_string(), "2023-01-03 09:30:00");
        assert_eq!(header.arrival_tm.to_string(), "2023-01-03 09:31:00");
        assert_eq!(trade.trade_pr, dec("150.25"));
        assert_eq!(trade.trade_size, 100);
    }

    #[test]
    fn test_csv_quote() {
        let Extracted::Quote { header, quote } = extract_line(CSV_QUOTE, SourceFormat::Csv).unwrap() else {
            panic!("expected quote");
        };
        assert_eq!(header.rec_type, RecordKind::Quote);
        assert_eq!(header.event_seq_nb, 2);
        assert_eq!(quote.bid_pr, dec("150.00"));
        assert_eq!(quote.bid_size, 100);
        assert_eq!(quote.ask_pr, dec("150.50"));
        assert_eq!(quote.ask_size, 200);
    }

    #[test]
    fn test_csv_trade_missing_size() {
        let line = "2023-01-03,2023-01-03 09:31:00.000000,T,IBM,2023-01-03 09:30:00.000000,1,NYSE,150.25";
        let err = extract_line(line, SourceFormat::Csv).unwrap_err();
        assert!(matches!(err, Error::MalformedField { field: "trade_size", .. }));
    }

    #[test]
    fn test_csv_quote_with_trade_arity_fails() {
        let line = "2023-01-03,2023-01-03 09:31:00.000000,Q,IBM,2023-01-03 09:30:00.000000,1,NYSE,150.00,100";
        let err = extract_line(line, SourceFormat::Csv).unwrap_err();
        assert!(matches!(err, Error::MalformedField { field: "ask_pr", .. }));
    }

    #[test]
    fn test_csv_non_numeric_price() {
        let line = CSV_TRADE.replace("150.25", "abc");
        let err = extract_line(&line, SourceFormat::Csv).unwrap_err();
        assert!(matches!(err, Error::MalformedField { field: "trade_pr", .. }));
    }

    #[test]
    fn test_csv_bad_date() {
        let line = CSV_TRADE.replacen("2023-01-03", "01/03/2023", 1);
        let err = extract_line(&line, SourceFormat::Csv).unwrap_err();
        assert!(matches!(err, Error::MalformedField { field: "trade_dt", .. }));
    }

    #[test]
    fn test_csv_trailing_carriage_return() {
        let line = format!("{CSV_TRADE}\r");
        let Extracted::Trade { trade, .. } = extract_line(&line, SourceFormat::Csv).unwrap() else {
            panic!("expected trade");
        };
        assert_eq!(trade.trade_size, 100);
    }

    #[test]
    fn test_json_trade() {
        let line = r#"{"event_type":"T","trade_dt":"2023-01-03","symbol":"IBM","exchange":"NYSE","event_tm":"2023-01-03 09:30:00.000000","event_seq_nb":1,"file_tm":"2023-01-03 09:31:00.000000","price":"150.25","size":"100"}"#;
        let Extracted::Trade { header, trade } = extract_line(line, SourceFormat::Json).unwrap() else {
            panic!("expected trade");
        };
        assert_eq!(header.symbol, "IBM");
        assert_eq!(header.arrival_tm.to_string(), "2023-01-03 09:31:00");
        assert_eq!(trade.trade_pr, dec("150.25"));
        assert_eq!(trade.trade_size, 100);
    }

    #[test]
    fn test_json_quote_with_numbers() {
        let line = r#"{"event_type":"Q","trade_dt":"2023-01-03","symbol":"IBM","exchange":"NYSE","event_tm":"2023-01-03 09:30:00.000000","event_seq_nb":"7","file_tm":"2023-01-03 09:31:00.000000","bid_pr":150.0,"bid_size":100,"ask_pr":"150.50","ask_size":200,"ignored":true}"#;
        let Extracted::Quote { header, quote } = extract_line(line, SourceFormat::Json).unwrap() else {
            panic!("expected quote");
        };
        assert_eq!(header.event_seq_nb, 7);
        assert_eq!(quote.bid_pr, dec("150"));
        assert_eq!(quote.ask_pr, dec("150.50"));
        assert_eq!(quote.ask_size, 200);
    }

    #[test]
    fn test_json_quote_missing_ask() {
        let line = r#"{"event_type":"Q","trade_dt":"2023-01-03","symbol":"IBM","exchange":"NYSE","event_tm":"2023-01-03 09:30:00.000000","event_seq_nb":1,"file_tm":"2023-01-03 09:31:00.000000","bid_pr":"150.00","bid_size":"100"}"#;
        let err = extract_line(line, SourceFormat::Json).unwrap_err();
        assert!(matches!(err, Error::MalformedField { field: "ask_pr", .. }));
    }

    #[test]
    fn test_json_null_and_wrong_types() {
        let line = r#"{"event_type":"T","trade_dt":"2023-01-03","symbol":null,"exchange":"NYSE","event_tm":"2023-01-03 09:30:00.000000","event_seq_nb":1,"file_tm":"2023-01-03 09:31:00.000000","price":"150.25","size":"100"}"#;
        let err = extract_line(line, SourceFormat::Json).unwrap_err();
        assert!(matches!(err, Error::MalformedField { field: "symbol", .. }));

        let line = r#"{"event_type":"T","trade_dt":"2023-01-03","symbol":"IBM","exchange":"NYSE","event_tm":"2023-01-03 09:30:00.000000","event_seq_nb":1.5,"file_tm":"2023-01-03 09:31:00.000000","price":"150.25","size":"100"}"#;
        let err = extract_line(line, SourceFormat::Json).unwrap_err();
        assert!(matches!(err, Error::MalformedField { field: "event_seq_nb", .. }));
    }

    #[test]
    fn test_json_number_price_keeps_every_digit() {
        let line = json_trade("1", "12345.123456789012345");
        let Extracted::Trade { trade, .. } = extract_line(&line, SourceFormat::Json).unwrap() else {
            panic!("expected trade");
        };
        assert_eq!(trade.trade_pr.to_string(), "12345.123456789012345");
    }

    #[test]
    fn test_json_number_price_beyond_scale_is_malformed() {
        let line = json_trade("1", "0.1234567890123456");
        let err = extract_line(&line, SourceFormat::Json).unwrap_err();
        assert!(matches!(err, Error::MalformedField { field: "trade_pr", .. }));
    }

    #[test]
    fn test_csv_full_width_price() {
        let line = CSV_TRADE.replace("150.25", "123456789012345.123456789012345");
        let Extracted::Trade { trade, .. } = extract_line(&line, SourceFormat::Csv).unwrap() else {
            panic!("expected trade");
        };
        assert_eq!(trade.trade_pr, dec("123456789012345.123456789012345"));
        assert_eq!(trade.trade_pr.to_string(), "123456789012345.123456789012345");
    }

    #[test]
    fn test_json_integral_numbers_are_integers() {
        for seq in ["42", "42.0", "4.2e1", "420e-1"] {
            let line = json_trade(seq, "\"150.25\"");
            let Extracted::Trade { header, .. } = extract_line(&line, SourceFormat::Json).unwrap() else {
                panic!("expected trade");
            };
            assert_eq!(header.event_seq_nb, 42, "{seq}");
        }
    }

    #[test]
    fn test_json_non_integral_or_oversized_numbers_are_malformed() {
        for seq in ["42.5", "1e10", "2147483648", "\"42.0\""] {
            let line = json_trade(seq, "\"150.25\"");
            let err = extract_line(&line, SourceFormat::Json).unwrap_err();
            assert!(
                matches!(err, Error::MalformedField { field: "event_seq_nb", .. }),
                "{seq}: {err}"
            );
        }
    }
}
