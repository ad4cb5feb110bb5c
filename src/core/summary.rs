use super::currency::CurrencyCode;
use super::diagnostics::Component;
use super::disposal::{DisposalLedger, DisposalRecord, K4Section};
use super::error::EngineError;
use rust_decimal::Decimal;
use serde::Serialize;

/// Summed disposals of one currency within a K4 section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyTotals {
    pub currency: CurrencyCode,
    pub disposals: usize,
    pub amount: Decimal,
    pub sales_price: Decimal,
    pub tax_basis: Decimal,
    pub gain: Decimal,
    pub loss: Decimal,
}

impl CurrencyTotals {
    fn empty(currency: CurrencyCode) -> Self {
        CurrencyTotals {
            currency,
            disposals: 0,
            amount: Decimal::ZERO,
            sales_price: Decimal::ZERO,
            tax_basis: Decimal::ZERO,
            gain: Decimal::ZERO,
            loss: Decimal::ZERO,
        }
    }

    fn add(&mut self, record: &DisposalRecord) -> Result<(), EngineError> {
        let overflow = |what| EngineError::overflow(Component::Summary, what, &self.currency);
        let amount = self.amount.checked_add(record.amount).ok_or_else(|| overflow("amount total"))?;
        let sales_price = self
            .sales_price
            .checked_add(record.sales_price)
            .ok_or_else(|| overflow("sales price total"))?;
        let tax_basis = self
            .tax_basis
            .checked_add(record.tax_basis)
            .ok_or_else(|| overflow("tax basis total"))?;
        let gain = self.gain.checked_add(record.gain).ok_or_else(|| overflow("gain total"))?;
        let loss = self.loss.checked_add(record.loss).ok_or_else(|| overflow("loss total"))?;

        self.disposals += 1;
        self.amount = amount;
        self.sales_price = sales_price;
        self.tax_basis = tax_basis;
        self.gain = gain;
        self.loss = loss;
        Ok(())
    }
}

/// Checked sum of one column; `None` on overflow.
fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(value))
}

/// One K4 section: rows per currency in first-appearance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub section: K4Section,
    pub rows: Vec<CurrencyTotals>,
    pub sales_price: Decimal,
    pub tax_basis: Decimal,
    pub gain: Decimal,
    pub loss: Decimal,
}

impl SectionSummary {
    fn build<'a>(
        section: K4Section,
        records: impl IntoIterator<Item = &'a DisposalRecord>,
        reporting_currency: &CurrencyCode,
    ) -> Result<Self, EngineError> {
        let mut rows: Vec<CurrencyTotals> = Vec::new();
        for record in records {
            let position = match rows.iter().position(|r| r.currency == record.currency) {
                Some(position) => position,
                None => {
                    rows.push(CurrencyTotals::empty(record.currency.clone()));
                    rows.len() - 1
                }
            };
            rows[position].add(record)?;
        }

        let total = |what, column: fn(&CurrencyTotals) -> Decimal| {
            checked_sum(rows.iter().map(column))
                .ok_or_else(|| EngineError::overflow(Component::Summary, what, reporting_currency))
        };
        Ok(SectionSummary {
            section,
            sales_price: total("sales price total", |r| r.sales_price)?,
            tax_basis: total("tax basis total", |r| r.tax_basis)?,
            gain: total("gain total", |r| r.gain)?,
            loss: total("loss total", |r| r.loss)?,
            rows,
        })
    }

    pub fn disposals(&self) -> usize {
        self.rows.iter().map(|r| r.disposals).sum()
    }

    pub fn net(&self) -> Decimal {
        self.gain - self.loss
    }
}

/// K4 totals for a replay, optionally restricted to one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct K4Summary {
    pub year: Option<i32>,
    pub currency: CurrencyCode,
    pub fiat: SectionSummary,
    pub crypto: SectionSummary,
    gain: Decimal,
    loss: Decimal,
}

impl K4Summary {
    /// Fails only when a total leaves the `Decimal` range.
    pub fn new(
        disposals: &DisposalLedger,
        reporting_currency: &CurrencyCode,
        year: Option<i32>,
    ) -> Result<Self, EngineError> {
        let in_year = |d: &&DisposalRecord| year.is_none_or(|y| d.year() == y);
        let fiat = SectionSummary::build(
            K4Section::C,
            disposals.fiat().iter().filter(in_year),
            reporting_currency,
        )?;
        let crypto = SectionSummary::build(
            K4Section::D,
            disposals.crypto().iter().filter(in_year),
            reporting_currency,
        )?;
        let overflow = |what| EngineError::overflow(Component::Summary, what, reporting_currency);
        let gain = fiat.gain.checked_add(crypto.gain).ok_or_else(|| overflow("gain total"))?;
        let loss = fiat.loss.checked_add(crypto.loss).ok_or_else(|| overflow("loss total"))?;

        Ok(K4Summary {
            year,
            currency: reporting_currency.clone(),
            fiat,
            crypto,
            gain,
            loss,
        })
    }

    pub fn section(&self, section: K4Section) -> &SectionSummary {
        match section {
            K4Section::C => &self.fiat,
            K4Section::D => &self.crypto,
        }
    }

    pub fn total_gain(&self) -> Decimal {
        self.gain
    }

    pub fn total_loss(&self) -> Decimal {
        self.loss
    }

    pub fn net(&self) -> Decimal {
        self.total_gain() - self.total_loss()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::disposal::gain_or_loss;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(event_index: usize, year: i32, currency: &str, sales: Decimal, basis: Decimal) -> DisposalRecord {
        let currency = CurrencyCode::new(currency).unwrap();
        let (gain, loss) = gain_or_loss(sales, basis).unwrap();
        DisposalRecord {
            event_index,
            date: NaiveDate::from_ymd_opt(year, 3, 1).unwrap(),
            amount: dec!(1),
            class: currency.class(),
            currency,
            sales_price: sales,
            tax_basis: basis,
            gain,
            loss,
        }
    }

    fn ledger() -> DisposalLedger {
        let mut ledger = DisposalLedger::new();
        ledger.push(record(1, 2022, "USD", dec!(100), dec!(90)));
        ledger.push(record(2, 2023, "BTC", dec!(500), dec!(700)));
        ledger.push(record(3, 2023, "EUR", dec!(50), dec!(40)));
        ledger.push(record(4, 2023, "USD", dec!(200), dec!(150)));
        ledger.push(record(5, 2023, "BTC", dec!(900), dec!(600)));
        ledger
    }

    #[test]
    fn groups_by_currency_in_first_appearance_order() {
        let summary = K4Summary::new(&ledger(), &CurrencyCode::sek(), None).unwrap();

        let fiat: Vec<_> = summary.fiat.rows.iter().map(|r| r.currency.as_str()).collect();
        assert_eq!(fiat, vec!["USD", "EUR"]);

        let usd = &summary.fiat.rows[0];
        assert_eq!(usd.disposals, 2);
        assert_eq!(usd.sales_price, dec!(300));
        assert_eq!(usd.gain, dec!(60));

        assert_eq!(summary.crypto.rows.len(), 1);
        assert_eq!(summary.crypto.gain, dec!(300));
        assert_eq!(summary.crypto.loss, dec!(200));
        assert_eq!(summary.crypto.net(), dec!(100));
        assert_eq!(summary.net(), dec!(170));
    }

    #[test]
    fn year_filter_drops_other_years() {
        let summary = K4Summary::new(&ledger(), &CurrencyCode::sek(), Some(2023)).unwrap();

        assert_eq!(summary.fiat.disposals(), 2);
        assert_eq!(summary.section(K4Section::C).sales_price, dec!(250));
        assert_eq!(summary.total_gain(), dec!(360));
        assert_eq!(summary.total_loss(), dec!(200));
    }

    #[test]
    fn empty_year_has_zero_totals() {
        let summary = K4Summary::new(&ledger(), &CurrencyCode::sek(), Some(2019)).unwrap();
        assert!(summary.fiat.rows.is_empty());
        assert!(summary.crypto.rows.is_empty());
        assert_eq!(summary.net(), Decimal::ZERO);
    }

    #[test]
    fn totals_beyond_decimal_range_are_an_error() {
        let mut ledger = DisposalLedger::new();
        ledger.push(record(1, 2023, "USD", Decimal::MAX, Decimal::ZERO));
        ledger.push(record(2, 2023, "USD", Decimal::MAX, Decimal::ZERO));

        let err = K4Summary::new(&ledger, &CurrencyCode::sek(), None).unwrap_err();
        assert_eq!(err.component(), Component::Summary);
        assert_eq!(err.to_string(), "decimal overflow computing sales price total for USD");
    }
}
