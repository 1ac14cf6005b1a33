//! PyO3 bindings for the tickparse line normalizer.
//!
//! Lets a Python batch driver map the Rust normalizer over raw lines:
//! - `parse_csv` / `parse_json` / `parse_line` per line
//! - `CommonEvent.to_row()` for the fixed 15-column row
//! - `schema()` for the column names and types

use chrono::{NaiveDate, NaiveDateTime};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyTuple;
use tickparse_core::{CommonEvent as RustCommonEvent, CommonRow, Price, SourceFormat, SCHEMA};

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One normalized line. Columns that do not apply to the record kind are None.
#[pyclass(frozen)]
#[derive(Clone)]
pub struct CommonEvent {
    #[pyo3(get)]
    pub trade_dt: Option<NaiveDate>,
    #[pyo3(get)]
    pub rec_type: Option<String>,
    #[pyo3(get)]
    pub symbol: Option<String>,
    #[pyo3(get)]
    pub exchange: Option<String>,
    #[pyo3(get)]
    pub event_tm: Option<NaiveDateTime>,
    #[pyo3(get)]
    pub event_seq_nb: Option<i32>,
    #[pyo3(get)]
    pub arrival_tm: Option<NaiveDateTime>,
    pub trade_pr: Option<Price>,
    #[pyo3(get)]
    pub trade_size: Option<i32>,
    pub bid_pr: Option<Price>,
    #[pyo3(get)]
    pub bid_size: Option<i32>,
    pub ask_pr: Option<Price>,
    #[pyo3(get)]
    pub ask_size: Option<i32>,
    #[pyo3(get)]
    pub partition: String,
    #[pyo3(get)]
    pub line: Option<String>,
}

#[pymethods]
impl CommonEvent {
    /// Whether the line was routed to the bad partition.
    #[getter]
    fn is_bad(&self) -> bool {
        self.partition == "B"
    }

    #[getter]
    fn trade_pr(&self, py: Python<'_>) -> PyResult<PyObject> {
        py_decimal(py, self.trade_pr)
    }

    #[getter]
    fn bid_pr(&self, py: Python<'_>) -> PyResult<PyObject> {
        py_decimal(py, self.bid_pr)
    }

    #[getter]
    fn ask_pr(&self, py: Python<'_>) -> PyResult<PyObject> {
        py_decimal(py, self.ask_pr)
    }

    /// Column values in schema order.
    fn to_row<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyTuple>> {
        let values: Vec<PyObject> = vec![
            self.trade_dt.into_py(py),
            self.rec_type.clone().into_py(py),
            self.symbol.clone().into_py(py),
            self.exchange.clone().into_py(py),
            self.event_tm.into_py(py),
            self.event_seq_nb.into_py(py),
            self.arrival_tm.into_py(py),
            py_decimal(py, self.trade_pr)?,
            self.trade_size.into_py(py),
            py_decimal(py, self.bid_pr)?,
            self.bid_size.into_py(py),
            py_decimal(py, self.ask_pr)?,
            self.ask_size.into_py(py),
            self.partition.clone().into_py(py),
            self.line.clone().into_py(py),
        ];
        Ok(PyTuple::new_bound(py, values))
    }

    fn __repr__(&self) -> String {
        match &self.line {
            Some(line) => format!("CommonEvent(partition=B, line={line:?})"),
            None => format!(
                "CommonEvent(partition={}, symbol={}, event_seq_nb={})",
                self.partition,
                self.symbol.as_deref().unwrap_or(""),
                self.event_seq_nb.unwrap_or_default()
            ),
        }
    }
}

/// Exact `decimal.Decimal` for a price, built from its shortest string form.
fn py_decimal(py: Python<'_>, price: Option<Price>) -> PyResult<PyObject> {
    match price {
        Some(price) => {
            let decimal = py.import_bound("decimal")?.getattr("Decimal")?;
            Ok(decimal.call1((price.to_string(),))?.unbind())
        }
        None => Ok(py.None()),
    }
}

impl From<CommonRow> for CommonEvent {
    fn from(row: CommonRow) -> Self {
        CommonEvent {
            trade_dt: row.trade_dt,
            rec_type: row.rec_type.map(|kind| kind.code().to_string()),
            symbol: row.symbol,
            exchange: row.exchange,
            event_tm: row.event_tm,
            event_seq_nb: row.event_seq_nb,
            arrival_tm: row.arrival_tm,
            trade_pr: row.trade_pr,
            trade_size: row.trade_size,
            bid_pr: row.bid_pr,
            bid_size: row.bid_size,
            ask_pr: row.ask_pr,
            ask_size: row.ask_size,
            partition: row.partition.code().to_string(),
            line: row.line,
        }
    }
}

impl From<RustCommonEvent> for CommonEvent {
    fn from(event: RustCommonEvent) -> Self {
        event.to_row().into()
    }
}

// ============================================================================
// Python-exposed Functions
// ============================================================================

/// Normalize a CSV line.
#[pyfunction]
fn parse_csv(line: &str) -> CommonEvent {
    tickparse_ingestion::parse_csv(line).into()
}

/// Normalize a JSON line.
#[pyfunction]
fn parse_json(line: &str) -> CommonEvent {
    tickparse_ingestion::parse_json(line).into()
}

/// Normalize a line of the named encoding ("csv" or "json").
#[pyfunction]
fn parse_line(line: &str, format: &str) -> PyResult<CommonEvent> {
    let format: SourceFormat = format
        .parse()
        .map_err(|e: tickparse_core::Error| PyValueError::new_err(e.to_string()))?;
    Ok(tickparse_ingestion::parse_line(line, format).into())
}

/// Column names and types of `CommonEvent.to_row()`.
#[pyfunction]
fn schema() -> Vec<(&'static str, String)> {
    SCHEMA
        .iter()
        .map(|(name, column_type)| (*name, column_type.to_string()))
        .collect()
}

// ============================================================================
// Module Definition
// ============================================================================

/// Tickparse - trade and quote line normalization for Python.
#[pymodule]
fn tickparse(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<CommonEvent>()?;

    m.add_function(wrap_pyfunction!(parse_csv, m)?)?;
    m.add_function(wrap_pyfunction!(parse_json, m)?)?;
    m.add_function(wrap_pyfunction!(parse_line, m)?)?;
    m.add_function(wrap_pyfunction!(schema, m)?)?;

    Ok(())
}
