//! Explicit column lists for CSV record types.
//!
//! `#[derive(CsvColumns)]` (from `k4tax-derive`) lists every named field in
//! declaration order and renders each through [`CsvCell`]. Absent values are
//! rendered as empty cells.

use crate::core::{CurrencyClass, CurrencyCode, K4Section, TradeKind, TradeSide};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

pub use k4tax_derive::CsvColumns;

/// One column of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Column names of `columns`, in order.
pub fn header(columns: &[CsvColumn]) -> Vec<&'static str> {
    columns.iter().map(|c| c.name).collect()
}

/// Textual value of a single cell.
pub trait CsvCell {
    fn cell(&self) -> String;
}

impl<T: CsvCell> CsvCell for Option<T> {
    fn cell(&self) -> String {
        self.as_ref().map(CsvCell::cell).unwrap_or_default()
    }
}

impl CsvCell for String {
    fn cell(&self) -> String {
        self.clone()
    }
}

impl CsvCell for usize {
    fn cell(&self) -> String {
        self.to_string()
    }
}

impl CsvCell for Decimal {
    fn cell(&self) -> String {
        self.normalize().to_string()
    }
}

impl CsvCell for NaiveDate {
    fn cell(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl CsvCell for NaiveDateTime {
    fn cell(&self) -> String {
        self.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl CsvCell for CurrencyCode {
    fn cell(&self) -> String {
        self.to_string()
    }
}

impl CsvCell for CurrencyClass {
    fn cell(&self) -> String {
        self.to_string()
    }
}

impl CsvCell for K4Section {
    fn cell(&self) -> String {
        self.to_string()
    }
}

impl CsvCell for TradeKind {
    fn cell(&self) -> String {
        self.to_string()
    }
}

/// `TradeSide::None` renders as an empty cell.
impl CsvCell for TradeSide {
    fn cell(&self) -> String {
        self.to_string()
    }
}
