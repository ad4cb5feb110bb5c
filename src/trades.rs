//! Trade ledger input.
//!
//! Reads exchange exports in the Bitstamp transaction layout
//! (`Type,Datetime,Account,Amount,Value,Rate,Fee,Sub Type`), where money cells
//! carry their currency (`"0.5 BTC"`), from CSV or from JSON wrapped as
//! `{ "trades": [...] }`. Records are returned in file order; sorting is left
//! to the caller (see [`sort_chronologically`](crate::core::sort_chronologically)).

use crate::columns::CsvColumns;
use crate::core::{CurrencyCode, CurrencyValue, InvalidCurrencyCode, TradeEvent, TradeKind, TradeSide};
use crate::utils::{parse_decimal, sniff_delimiter};
use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum TradeError {
    #[error("invalid money value '{0}', expected '<amount> <CODE>'")]
    InvalidMoney(String),
    #[error("unrecognised date/time '{0}'")]
    InvalidDatetime(String),
    #[error("unknown sub type '{0}', expected Buy or Sell")]
    InvalidSubType(String),
    #[error("market trade without a value")]
    MissingValue,
    #[error(transparent)]
    InvalidCurrency(#[from] InvalidCurrencyCode),
    #[error("trade {record}: {source}")]
    Record {
        record: usize,
        #[source]
        source: Box<TradeError>,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One exported trade row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, CsvColumns)]
pub struct TradeRecord {
    /// Market for trades; anything else (Deposit, Withdrawal, ...) is ignored
    #[serde(rename = "Type")]
    pub kind: String,
    /// Trade time, e.g. "Jan. 05, 2018, 09:15 PM" or "2018-01-05 21:15:00"
    #[serde(rename = "Datetime")]
    pub datetime: String,
    /// Exchange account name
    #[serde(rename = "Account", default)]
    pub account: Option<String>,
    /// Quantity with its currency, e.g. "0.5 BTC"
    #[serde(rename = "Amount")]
    pub amount: String,
    /// Price leg with its currency, e.g. "8000.00 USD"
    #[serde(rename = "Value", default)]
    pub value: Option<String>,
    /// Unit price, informational only
    #[serde(rename = "Rate", default)]
    pub rate: Option<String>,
    /// Fee with its currency, e.g. "20.00 USD"
    #[serde(rename = "Fee", default)]
    pub fee: Option<String>,
    /// Buy or Sell for market trades
    #[serde(rename = "Sub Type", default)]
    pub side: Option<String>,
}

/// JSON input format
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TradeInput {
    pub trades: Vec<TradeRecord>,
}

impl TryFrom<TradeRecord> for TradeEvent {
    type Error = TradeError;

    fn try_from(record: TradeRecord) -> Result<Self, Self::Error> {
        let datetime = parse_datetime(&record.datetime)?;
        let kind = if record.kind.trim().eq_ignore_ascii_case("market") {
            TradeKind::Market
        } else {
            TradeKind::Other
        };
        let side = parse_side(record.side.as_deref())?;
        let amount = parse_money(&record.amount)?;

        let value = match non_empty(record.value.as_deref()) {
            Some(raw) => parse_money(raw)?,
            None if kind == TradeKind::Market => return Err(TradeError::MissingValue),
            None => CurrencyValue::zero(amount.code().clone()),
        };
        let fee = match non_empty(record.fee.as_deref()) {
            Some(raw) => parse_money(raw)?,
            None => CurrencyValue::zero(value.code().clone()),
        };

        Ok(TradeEvent {
            datetime,
            kind,
            side,
            amount,
            value,
            fee,
        })
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// `"<amount> <CODE>"`, with either `.` or `,` as decimal separator.
pub fn parse_money(raw: &str) -> Result<CurrencyValue, TradeError> {
    let invalid = || TradeError::InvalidMoney(raw.to_string());
    let (amount, code) = raw.trim().rsplit_once(char::is_whitespace).ok_or_else(invalid)?;
    let amount = parse_decimal(amount).ok_or_else(invalid)?;
    let code = CurrencyCode::new(code)?;
    Ok(CurrencyValue::of(amount, code))
}

const DATETIME_FORMATS: &[&str] = &[
    "%b. %d, %Y, %I:%M %p",
    "%b %d, %Y, %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, TradeError> {
    let s = raw.trim();
    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Ok(datetime);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| TradeError::InvalidDatetime(raw.to_string()))
}

fn parse_side(raw: Option<&str>) -> Result<TradeSide, TradeError> {
    match non_empty(raw) {
        None => Ok(TradeSide::None),
        Some(s) if s.eq_ignore_ascii_case("buy") => Ok(TradeSide::Buy),
        Some(s) if s.eq_ignore_ascii_case("sell") => Ok(TradeSide::Sell),
        Some(s) => Err(TradeError::InvalidSubType(s.to_string())),
    }
}

fn into_events(records: Vec<TradeRecord>) -> Result<Vec<TradeEvent>, TradeError> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            TradeEvent::try_from(record).map_err(|e| TradeError::Record {
                record: i + 1,
                source: Box::new(e),
            })
        })
        .collect()
}

/// Read trades from CSV. The delimiter (`,` or `;`) is taken from the header.
pub fn read_csv<R: Read>(mut reader: R) -> Result<Vec<TradeEvent>, TradeError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(&text))
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let records: Result<Vec<TradeRecord>, _> = rdr.deserialize::<TradeRecord>().collect();
    into_events(records?)
}

/// Read trades from JSON
pub fn read_json<R: Read>(reader: R) -> Result<Vec<TradeEvent>, TradeError> {
    let input: TradeInput = serde_json::from_reader(reader)?;
    into_events(input.trades)
}

/// Load a trade file, choosing the format by extension (`.json`, else CSV).
pub fn load(path: &Path) -> anyhow::Result<Vec<TradeEvent>> {
    let file = File::open(path).with_context(|| format!("opening trades file {}", path.display()))?;
    let reader = BufReader::new(file);
    let events = match crate::utils::extension(path).as_deref() {
        Some("json") => read_json(reader),
        _ => read_csv(reader),
    }
    .with_context(|| format!("reading trades from {}", path.display()))?;
    log::debug!("Loaded {} trades from {}", events.len(), path.display());
    Ok(events)
}
