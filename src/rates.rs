//! Exchange-rate input.
//!
//! Three layouts are accepted:
//! - long CSV: `date,origin,destination,rate`, one rate per row
//! - wide CSV: a date column followed by one column per currency pair
//!   (`USDSEK`, `EUR/SEK`, ...); a two-column file whose second header is not
//!   a pair holds BTC/USD prices
//! - JSON: `{ "rates": [{ "date", "origin", "destination", "rate" }] }`
//!
//! CSV delimiters may be `,` or `;` and decimals may use `,`. Empty or
//! non-numeric rate cells are skipped with a warning.

use crate::columns::CsvColumns;
use crate::core::{CurrencyCode, ExchangeRate, InvalidCurrencyCode, RateTable};
use crate::utils::{parse_decimal, sniff_delimiter};
use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("column '{0}' is not a currency pair")]
    InvalidPair(String),
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),
    #[error(transparent)]
    InvalidCurrency(#[from] InvalidCurrencyCode),
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<RateError>,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One exchange rate in the long layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, CsvColumns)]
pub struct RateRecord {
    /// Day the rate applies to (YYYY-MM-DD)
    #[schemars(with = "String")]
    pub date: NaiveDate,
    /// Currency being priced, e.g. BTC
    pub origin: String,
    /// Currency the rate is quoted in, e.g. USD
    pub destination: String,
    /// Units of destination per unit of origin
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

impl TryFrom<RateRecord> for ExchangeRate {
    type Error = RateError;

    fn try_from(record: RateRecord) -> Result<Self, Self::Error> {
        Ok(ExchangeRate::new(
            record.date,
            CurrencyCode::new(&record.origin)?,
            CurrencyCode::new(&record.destination)?,
            record.rate,
        ))
    }
}

/// JSON input format
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RateInput {
    pub rates: Vec<RateRecord>,
}

#[derive(Debug)]
enum Layout {
    Long {
        date: usize,
        origin: usize,
        destination: usize,
        rate: usize,
    },
    Wide(Vec<(usize, CurrencyCode, CurrencyCode)>),
}

impl Layout {
    fn detect(headers: &csv::StringRecord) -> Result<Self, RateError> {
        let position = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        if let (Some(origin), Some(destination)) = (position("origin"), position("destination")) {
            return Ok(Layout::Long {
                date: position("date").unwrap_or(0),
                origin,
                destination,
                rate: position("rate").ok_or(RateError::MissingColumn("rate"))?,
            });
        }

        if headers.len() == 2 {
            if let Some(header) = headers.get(1) {
                if parse_pair(header).is_none() {
                    return Ok(Layout::Wide(vec![(1, code("BTC")?, code("USD")?)]));
                }
            }
        }

        let pairs = headers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, header)| {
                let (origin, destination) =
                    parse_pair(header).ok_or_else(|| RateError::InvalidPair(header.to_string()))?;
                Ok((i, code(origin)?, code(destination)?))
            })
            .collect::<Result<Vec<_>, RateError>>()?;
        Ok(Layout::Wide(pairs))
    }

    fn read_row(&self, row: &csv::StringRecord, out: &mut Vec<ExchangeRate>) -> Result<(), RateError> {
        let cell = |i: usize| row.get(i).unwrap_or_default();
        match self {
            Layout::Long {
                date,
                origin,
                destination,
                rate,
            } => {
                let date = parse_date(cell(*date))?;
                let origin = CurrencyCode::new(cell(*origin))?;
                let destination = CurrencyCode::new(cell(*destination))?;
                push_rate(out, date, origin, destination, cell(*rate));
            }
            Layout::Wide(pairs) => {
                let date = parse_date(cell(0))?;
                for (i, origin, destination) in pairs {
                    push_rate(out, date, origin.clone(), destination.clone(), cell(*i));
                }
            }
        }
        Ok(())
    }
}

fn push_rate(
    out: &mut Vec<ExchangeRate>,
    date: NaiveDate,
    origin: CurrencyCode,
    destination: CurrencyCode,
    raw: &str,
) {
    match parse_decimal(raw) {
        Some(rate) => out.push(ExchangeRate::new(date, origin, destination, rate)),
        None => log::warn!("Skipping {}{} rate on {}: '{}' is not a number", origin, destination, date, raw),
    }
}

fn code(s: &str) -> Result<CurrencyCode, RateError> {
    Ok(CurrencyCode::new(s)?)
}

/// `USDSEK`, `USD/SEK`, `USD-SEK` or `USD_SEK`. The unseparated form must be
/// upper case.
fn parse_pair(header: &str) -> Option<(&str, &str)> {
    let header = header.trim();
    if let Some((origin, destination)) = header.split_once(['/', '-', '_']) {
        return Some((origin.trim(), destination.trim()));
    }
    if header.len() == 6 && header.chars().all(|c| c.is_ascii_uppercase()) {
        return Some(header.split_at(3));
    }
    None
}

/// Only the leading `YYYY-MM-DD` is used, so timestamps are accepted.
fn parse_date(raw: &str) -> Result<NaiveDate, RateError> {
    let day = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| RateError::InvalidDate(raw.to_string()))
}

/// Read rates from CSV in either the long or the wide layout.
pub fn read_csv<R: Read>(mut reader: R) -> Result<Vec<ExchangeRate>, RateError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(&text))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());
    let layout = Layout::detect(rdr.headers()?)?;

    let mut rates = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row?;
        // header is line 1
        let line = i + 2;
        layout.read_row(&row, &mut rates).map_err(|e| RateError::Line {
            line,
            source: Box::new(e),
        })?;
    }
    Ok(rates)
}

/// Read rates from JSON
pub fn read_json<R: Read>(reader: R) -> Result<Vec<ExchangeRate>, RateError> {
    let input: RateInput = serde_json::from_reader(reader)?;
    input.rates.into_iter().map(ExchangeRate::try_from).collect()
}

/// Load and merge rate files, choosing the format per file by extension.
pub fn load(paths: &[PathBuf]) -> anyhow::Result<RateTable> {
    let mut table = RateTable::new();
    for path in paths {
        let rates = load_file(path)?;
        log::debug!("Loaded {} rates from {}", rates.len(), path.display());
        table.extend(rates);
    }
    log::info!("Rate table holds {} rates from {} file(s)", table.len(), paths.len());
    Ok(table)
}

fn load_file(path: &Path) -> anyhow::Result<Vec<ExchangeRate>> {
    let file = File::open(path).with_context(|| format!("opening rates file {}", path.display()))?;
    let reader = BufReader::new(file);
    let rates = match crate::utils::extension(path).as_deref() {
        Some("json") => read_json(reader),
        _ => read_csv(reader),
    }
    .with_context(|| format!("reading rates from {}", path.display()))?;
    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn reads_long_layout() {
        let csv = "date,origin,destination,rate\n\
                   2023-01-01,USD,SEK,10.45\n\
                   2023-01-01,btc,usd,16500\n";
        let rates = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].origin.as_str(), "USD");
        assert_eq!(rates[0].rate, dec!(10.45));
        assert_eq!(rates[1].origin.as_str(), "BTC");
        assert_eq!(rates[1].destination.as_str(), "USD");
    }

    #[test]
    fn reads_wide_layout_with_semicolons_and_comma_decimals() {
        let csv = "Datum;SEKUSD;USDSEK;EUR/SEK\n\
                   2018-01-02;0,1219;8,2030;9,8500\n\
                   2018-01-03;;8,1900;n/a\n";
        let rates = read_csv(csv.as_bytes()).unwrap();

        // two cells on the second row are skipped
        assert_eq!(rates.len(), 4);
        assert_eq!(rates[0].origin.as_str(), "SEK");
        assert_eq!(rates[0].destination.as_str(), "USD");
        assert_eq!(rates[2].origin.as_str(), "EUR");
        assert_eq!(rates[2].rate, dec!(9.85));
        assert_eq!(rates[3].date, day("2018-01-03"));
        assert_eq!(rates[3].rate, dec!(8.19));
    }

    #[test]
    fn two_column_file_is_btc_usd() {
        let csv = "Date,Close\n2018-01-05 00:00:00,16000.5\n";
        let rates = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].origin.as_str(), "BTC");
        assert_eq!(rates[0].destination.as_str(), "USD");
        assert_eq!(rates[0].date, day("2018-01-05"));
    }

    #[test]
    fn rejects_unknown_wide_column() {
        let csv = "Datum,USDSEK,Volume\n2018-01-02,8.2,100\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "column 'Volume' is not a currency pair");
    }

    #[test]
    fn bad_date_reports_line() {
        let csv = "date,origin,destination,rate\n2023-01-01,USD,SEK,10\nyesterday,USD,SEK,10\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "line 3: invalid date 'yesterday', expected YYYY-MM-DD");
    }

    #[test]
    fn reads_json() {
        let json = r#"{"rates": [
            {"date": "2023-01-01", "origin": "ETH", "destination": "BTC", "rate": "0.07"},
            {"date": "2023-01-01", "origin": "BTC", "destination": "SEK", "rate": 170000}
        ]}"#;
        let rates = read_json(json.as_bytes()).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].rate, dec!(0.07));
        assert_eq!(rates[1].rate, dec!(170000));
    }

    #[test]
    fn pair_headers() {
        assert_eq!(parse_pair("USDSEK"), Some(("USD", "SEK")));
        assert_eq!(parse_pair("ETH/BTC"), Some(("ETH", "BTC")));
        assert_eq!(parse_pair("USDT-SEK"), Some(("USDT", "SEK")));
        assert_eq!(parse_pair("Close"), None);
    }
}
