use super::currency::{CurrencyClass, CurrencyCode};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// K4 form section a disposal is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum K4Section {
    /// Section C: foreign currency
    C,
    /// Section D: other assets, including crypto
    D,
}

impl K4Section {
    pub fn for_class(class: CurrencyClass) -> Self {
        match class {
            CurrencyClass::Fiat => K4Section::C,
            CurrencyClass::Crypto => K4Section::D,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            K4Section::C => "Section C - Currency",
            K4Section::D => "Section D - Other assets",
        }
    }
}

impl fmt::Display for K4Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            K4Section::C => f.write_str("C"),
            K4Section::D => f.write_str("D"),
        }
    }
}

/// Realised result of giving up one currency leg of a trade.
///
/// At most one of `gain` and `loss` is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisposalRecord {
    /// 1-based position of the originating trade event
    pub event_index: usize,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub class: CurrencyClass,
    pub sales_price: Decimal,
    pub tax_basis: Decimal,
    pub gain: Decimal,
    pub loss: Decimal,
}

impl DisposalRecord {
    pub fn section(&self) -> K4Section {
        K4Section::for_class(self.class)
    }

    /// Signed result: gain minus loss.
    pub fn net(&self) -> Decimal {
        self.gain - self.loss
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Split proceeds against basis into a non-negative gain or loss.
///
/// `None` when the difference does not fit in a `Decimal`, which can happen
/// once a negative holding gives a negative basis.
pub fn gain_or_loss(sales_price: Decimal, tax_basis: Decimal) -> Option<(Decimal, Decimal)> {
    if sales_price > tax_basis {
        Some((sales_price.checked_sub(tax_basis)?, Decimal::ZERO))
    } else {
        Some((Decimal::ZERO, tax_basis.checked_sub(sales_price)?))
    }
}

/// Append-only disposal records, partitioned by currency class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisposalLedger {
    fiat: Vec<DisposalRecord>,
    crypto: Vec<DisposalRecord>,
}

impl DisposalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: DisposalRecord) {
        match record.class {
            CurrencyClass::Fiat => self.fiat.push(record),
            CurrencyClass::Crypto => self.crypto.push(record),
        }
    }

    pub fn fiat(&self) -> &[DisposalRecord] {
        &self.fiat
    }

    pub fn crypto(&self) -> &[DisposalRecord] {
        &self.crypto
    }

    pub fn section(&self, section: K4Section) -> &[DisposalRecord] {
        match section {
            K4Section::C => &self.fiat,
            K4Section::D => &self.crypto,
        }
    }

    pub fn len(&self) -> usize {
        self.fiat.len() + self.crypto.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records of one event index, if any.
    pub fn for_event(&self, event_index: usize) -> Option<&DisposalRecord> {
        self.fiat
            .iter()
            .chain(self.crypto.iter())
            .find(|d| d.event_index == event_index)
    }

    /// Records in replay order across both sections, optionally for one calendar year.
    pub fn chronological(&self, year: Option<i32>) -> Vec<&DisposalRecord> {
        let mut all: Vec<_> = self
            .fiat
            .iter()
            .chain(self.crypto.iter())
            .filter(|d| year.is_none_or(|y| d.year() == y))
            .collect();
        all.sort_by_key(|d| d.event_index);
        all
    }
}

/// CSV record for disposal output
#[derive(Debug, Serialize, Deserialize)]
pub struct DisposalCsvRecord {
    pub section: String,
    pub event: usize,
    pub date: String,
    pub amount: String,
    pub currency: String,
    pub sales_price: String,
    pub tax_basis: String,
    pub gain: String,
    pub loss: String,
}

impl From<&DisposalRecord> for DisposalCsvRecord {
    fn from(d: &DisposalRecord) -> Self {
        DisposalCsvRecord {
            section: d.section().to_string(),
            event: d.event_index,
            date: d.date.format("%Y-%m-%d").to_string(),
            amount: d.amount.normalize().to_string(),
            currency: d.currency.to_string(),
            sales_price: d.sales_price.round_dp(2).to_string(),
            tax_basis: d.tax_basis.round_dp(2).to_string(),
            gain: d.gain.round_dp(2).to_string(),
            loss: d.loss.round_dp(2).to_string(),
        }
    }
}
