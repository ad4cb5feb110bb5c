//! Detailed transaction dump: every input trade with the outcome of its replay.

use crate::columns::{self, CsvColumns};
use crate::core::{CurrencyCode, K4Section, ReplayReport, TradeEvent, TradeKind, TradeSide};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, CsvColumns)]
pub struct DetailedTrade {
    /// 1-based position in the trade ledger
    pub line: usize,
    pub datetime: NaiveDateTime,
    /// Market or Other
    pub kind: TradeKind,
    /// Buy, Sell or empty
    pub side: TradeSide,
    pub amount: Decimal,
    pub amount_currency: CurrencyCode,
    pub value: Decimal,
    pub value_currency: CurrencyCode,
    pub fee: Decimal,
    pub fee_currency: CurrencyCode,
    /// Currency given up in the trade
    pub disposed_currency: Option<CurrencyCode>,
    /// K4 section of the disposal, C (currency) or D (other assets)
    pub section: Option<K4Section>,
    /// Sales price in the reporting currency
    pub sales_price: Option<Decimal>,
    /// Tax basis in the reporting currency
    pub tax_basis: Option<Decimal>,
    pub gain: Option<Decimal>,
    pub loss: Option<Decimal>,
    /// Why the trade could not be classified
    pub error: Option<String>,
}

/// One row per event, joined with its disposal record or diagnostic.
pub fn rows(events: &[TradeEvent], report: &ReplayReport) -> Vec<DetailedTrade> {
    let errors: HashMap<usize, String> = report
        .diagnostics
        .iter()
        .map(|d| (d.event_index, format!("{}: {}", d.component, d.message)))
        .collect();

    events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let line = i + 1;
            let disposal = report.disposals.for_event(line);
            DetailedTrade {
                line,
                datetime: event.datetime,
                kind: event.kind,
                side: event.side,
                amount: event.amount.amount(),
                amount_currency: event.amount.code().clone(),
                value: event.value.amount(),
                value_currency: event.value.code().clone(),
                fee: event.fee.amount(),
                fee_currency: event.fee.code().clone(),
                disposed_currency: disposal.map(|d| d.currency.clone()),
                section: disposal.map(|d| d.section()),
                sales_price: disposal.map(|d| d.sales_price),
                tax_basis: disposal.map(|d| d.tax_basis),
                gain: disposal.map(|d| d.gain),
                loss: disposal.map(|d| d.loss),
                error: errors.get(&line).cloned(),
            }
        })
        .collect()
}

/// Write `rows` semicolon delimited, header first.
pub fn write_csv<W: Write>(rows: &[DetailedTrade], writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);
    wtr.write_record(columns::header(DetailedTrade::csv_columns()))?;
    for row in rows {
        wtr.write_record(row.csv_values())?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{replay, CurrencyValue, ExchangeRate, RateTable, ReplayOptions};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    fn event(kind: TradeKind, side: TradeSide, amount: &str, value: Decimal) -> TradeEvent {
        TradeEvent {
            datetime: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(9, 30, 0).unwrap(),
            kind,
            side,
            amount: CurrencyValue::of(dec!(1), code(amount)),
            value: CurrencyValue::of(value, code("USD")),
            fee: CurrencyValue::zero(code("USD")),
        }
    }

    fn fixture() -> (Vec<TradeEvent>, ReplayReport) {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let rates: RateTable = vec![
            ExchangeRate::new(date, code("USD"), code("SEK"), dec!(10)),
            ExchangeRate::new(date, code("BTC"), code("USD"), dec!(16000)),
        ]
        .into_iter()
        .collect();
        let events = vec![
            event(TradeKind::Other, TradeSide::None, "BTC", dec!(0)),
            event(TradeKind::Market, TradeSide::Buy, "BTC", dec!(16000)),
            event(TradeKind::Market, TradeSide::Buy, "ETH", dec!(1200)),
        ];
        let report = replay(&events, &rates, ReplayOptions::default()).unwrap();
        (events, report)
    }

    #[test]
    fn one_row_per_event() {
        let (events, report) = fixture();
        let rows = rows(&events, &report);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].section, None);
        assert_eq!(rows[0].error, None);
        assert_eq!(rows[1].section, Some(K4Section::C));
        assert_eq!(rows[1].sales_price, Some(dec!(160000)));
        assert!(rows[2]
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("rate resolver: no rate path from ETH")));
    }

    #[test]
    fn writes_semicolon_rows_with_empty_absent_values() {
        let (events, report) = fixture();
        let mut out = Vec::new();
        write_csv(&rows(&events, &report), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some(
                "line;datetime;kind;side;amount;amount_currency;value;value_currency;fee;fee_currency;\
                 disposed_currency;section;sales_price;tax_basis;gain;loss;error"
            )
        );
        assert_eq!(lines.next(), Some("1;2023-01-01 09:30:00;Other;;1;BTC;0;USD;0;USD;;;;;;;"));
        assert_eq!(
            lines.next(),
            Some("2;2023-01-01 09:30:00;Market;Buy;1;BTC;16000;USD;0;USD;USD;C;160000;0;160000;0;")
        );
    }
}
