use super::currency::CurrencyCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// "1 unit of `origin` = `rate` units of `destination`", as published on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub date: NaiveDate,
    pub origin: CurrencyCode,
    pub destination: CurrencyCode,
    pub rate: Decimal,
}

impl ExchangeRate {
    pub fn new(date: NaiveDate, origin: CurrencyCode, destination: CurrencyCode, rate: Decimal) -> Self {
        ExchangeRate {
            date,
            origin,
            destination,
            rate,
        }
    }
}

/// In-memory rate facts, indexed by origin currency.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    by_origin: HashMap<CurrencyCode, Vec<ExchangeRate>>,
    len: usize,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rate: ExchangeRate) {
        self.by_origin
            .entry(rate.origin.clone())
            .or_default()
            .push(rate);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All rates published for `origin`, in insertion order.
    pub fn from_origin(&self, origin: &CurrencyCode) -> &[ExchangeRate] {
        self.by_origin
            .get(origin)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExchangeRate> {
        self.by_origin.values().flatten()
    }

    /// Direct rate `origin -> destination` for `date`.
    ///
    /// The most recent rate dated on or before `date` wins. When every direct
    /// rate is dated after `date`, the earliest one is used. Equal dates keep
    /// the first inserted.
    pub fn direct(
        &self,
        origin: &CurrencyCode,
        destination: &CurrencyCode,
        date: NaiveDate,
    ) -> Option<&ExchangeRate> {
        let direct = || {
            self.from_origin(origin)
                .iter()
                .filter(move |r| &r.destination == destination)
        };
        let on_or_before = direct()
            .filter(|r| r.date <= date)
            .fold(None, |best: Option<&ExchangeRate>, r| match best {
                Some(b) if b.date >= r.date => Some(b),
                _ => Some(r),
            });
        on_or_before.or_else(|| {
            direct().fold(None, |best: Option<&ExchangeRate>, r| match best {
                Some(b) if b.date <= r.date => Some(b),
                _ => Some(r),
            })
        })
    }

    /// Rates leaving `origin` dated on or before `date`, ordered by
    /// destination ascending, origin ascending, date descending.
    pub fn candidates(&self, origin: &CurrencyCode, date: NaiveDate) -> Vec<&ExchangeRate> {
        let mut candidates: Vec<_> = self
            .from_origin(origin)
            .iter()
            .filter(|r| r.date <= date)
            .collect();
        candidates.sort_by(|a, b| {
            a.destination
                .cmp(&b.destination)
                .then_with(|| a.origin.cmp(&b.origin))
                .then_with(|| b.date.cmp(&a.date))
        });
        candidates
    }
}

impl FromIterator<ExchangeRate> for RateTable {
    fn from_iter<T: IntoIterator<Item = ExchangeRate>>(iter: T) -> Self {
        let mut table = RateTable::new();
        table.extend(iter);
        table
    }
}

impl Extend<ExchangeRate> for RateTable {
    fn extend<T: IntoIterator<Item = ExchangeRate>>(&mut self, iter: T) {
        for rate in iter {
            self.insert(rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    fn rate(d: &str, origin: &str, destination: &str, value: Decimal) -> ExchangeRate {
        ExchangeRate::new(date(d), code(origin), code(destination), value)
    }

    #[test]
    fn direct_prefers_latest_on_or_before() {
        let table: RateTable = vec![
            rate("2023-01-01", "USD", "SEK", dec!(10)),
            rate("2023-01-03", "USD", "SEK", dec!(10.5)),
            rate("2023-01-05", "USD", "SEK", dec!(11)),
        ]
        .into_iter()
        .collect();

        let found = table.direct(&code("USD"), &code("SEK"), date("2023-01-04")).unwrap();
        assert_eq!(found.rate, dec!(10.5));
    }

    #[test]
    fn direct_falls_back_to_earliest_when_all_later() {
        let table: RateTable = vec![
            rate("2023-02-01", "USD", "SEK", dec!(11)),
            rate("2023-01-15", "USD", "SEK", dec!(10)),
        ]
        .into_iter()
        .collect();

        let found = table.direct(&code("USD"), &code("SEK"), date("2022-12-31")).unwrap();
        assert_eq!(found.rate, dec!(10));
    }

    #[test]
    fn direct_ignores_other_destinations() {
        let table: RateTable = vec![rate("2023-01-01", "USD", "EUR", dec!(0.9))]
            .into_iter()
            .collect();
        assert!(table.direct(&code("USD"), &code("SEK"), date("2023-01-01")).is_none());
    }

    #[test]
    fn candidates_are_ranked_and_filtered_by_date() {
        let table: RateTable = vec![
            rate("2023-01-01", "BTC", "USD", dec!(16000)),
            rate("2023-01-02", "BTC", "USD", dec!(16500)),
            rate("2023-01-09", "BTC", "USD", dec!(17000)),
            rate("2023-01-02", "BTC", "EUR", dec!(15500)),
        ]
        .into_iter()
        .collect();

        let ranked: Vec<_> = table
            .candidates(&code("BTC"), date("2023-01-05"))
            .into_iter()
            .map(|r| (r.destination.to_string(), r.rate))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("EUR".to_string(), dec!(15500)),
                ("USD".to_string(), dec!(16500)),
                ("USD".to_string(), dec!(16000)),
            ]
        );
    }

    #[test]
    fn len_counts_every_insert() {
        let mut table = RateTable::new();
        assert!(table.is_empty());
        table.insert(rate("2023-01-01", "USD", "SEK", dec!(10)));
        table.insert(rate("2023-01-01", "EUR", "SEK", dec!(11)));
        assert_eq!(table.len(), 2);
        assert_eq!(table.iter().count(), 2);
    }
}
