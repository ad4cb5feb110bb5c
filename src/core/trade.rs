use super::currency::CurrencyValue;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeKind {
    Market,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
    None,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Market => f.write_str("Market"),
            TradeKind::Other => f.write_str("Other"),
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => f.write_str("Buy"),
            TradeSide::Sell => f.write_str("Sell"),
            TradeSide::None => Ok(()),
        }
    }
}

/// One row of the trade ledger.
///
/// `amount` is the quantity leg, `value` the price leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub datetime: NaiveDateTime,
    pub kind: TradeKind,
    pub side: TradeSide,
    pub amount: CurrencyValue,
    pub value: CurrencyValue,
    pub fee: CurrencyValue,
}

/// The two sides of a market trade from the holder's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeLegs<'a> {
    pub acquired: &'a CurrencyValue,
    pub disposed: &'a CurrencyValue,
}

impl TradeEvent {
    /// Rates are looked up by calendar date only.
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    /// Acquired and disposed legs, or `None` for events that take no part in
    /// the accounting (non-market events, or market events without a side).
    pub fn legs(&self) -> Option<TradeLegs<'_>> {
        match (self.kind, self.side) {
            (TradeKind::Market, TradeSide::Buy) => Some(TradeLegs {
                acquired: &self.amount,
                disposed: &self.value,
            }),
            (TradeKind::Market, TradeSide::Sell) => Some(TradeLegs {
                acquired: &self.value,
                disposed: &self.amount,
            }),
            _ => None,
        }
    }
}

/// Stable sort by datetime. Replay never sorts on its own; callers holding
/// unordered input use this first.
pub fn sort_chronologically(events: &mut [TradeEvent]) {
    events.sort_by_key(|e| e.datetime);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyCode;
    use rust_decimal_macros::dec;

    fn value(amount: rust_decimal::Decimal, code: &str) -> CurrencyValue {
        CurrencyValue::of(amount, CurrencyCode::new(code).unwrap())
    }

    fn event(at: &str, kind: TradeKind, side: TradeSide) -> TradeEvent {
        TradeEvent {
            datetime: NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M:%S").unwrap(),
            kind,
            side,
            amount: value(dec!(1), "BTC"),
            value: value(dec!(16000), "USD"),
            fee: value(dec!(40), "USD"),
        }
    }

    #[test]
    fn buy_acquires_quantity_leg() {
        let buy = event("2023-01-01 10:00:00", TradeKind::Market, TradeSide::Buy);
        let legs = buy.legs().unwrap();
        assert_eq!(legs.acquired.code().as_str(), "BTC");
        assert_eq!(legs.disposed.code().as_str(), "USD");
    }

    #[test]
    fn sell_disposes_quantity_leg() {
        let sell = event("2023-01-01 10:00:00", TradeKind::Market, TradeSide::Sell);
        let legs = sell.legs().unwrap();
        assert_eq!(legs.acquired.code().as_str(), "USD");
        assert_eq!(legs.disposed.code().as_str(), "BTC");
    }

    #[test]
    fn non_market_or_sideless_events_have_no_legs() {
        assert!(event("2023-01-01 10:00:00", TradeKind::Other, TradeSide::Buy)
            .legs()
            .is_none());
        assert!(event("2023-01-01 10:00:00", TradeKind::Market, TradeSide::None)
            .legs()
            .is_none());
    }

    #[test]
    fn sort_keeps_equal_timestamps_in_input_order() {
        let mut events = vec![
            event("2023-01-02 00:00:00", TradeKind::Market, TradeSide::Buy),
            event("2023-01-01 00:00:00", TradeKind::Market, TradeSide::Sell),
            event("2023-01-01 00:00:00", TradeKind::Other, TradeSide::None),
        ];
        sort_chronologically(&mut events);
        assert_eq!(events[0].side, TradeSide::Sell);
        assert_eq!(events[1].kind, TradeKind::Other);
        assert_eq!(events[2].side, TradeSide::Buy);
    }

    #[test]
    fn sideless_displays_empty() {
        assert_eq!(TradeSide::None.to_string(), "");
        assert_eq!(TradeSide::Buy.to_string(), "Buy");
    }
}
