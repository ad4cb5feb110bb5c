use super::currency::CurrencyCode;
use super::diagnostics::Component;
use super::error::EngineError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Running state for one currency under the average cost method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BasisEntry {
    /// Cumulative held amount. Negative when disposals exceed recorded acquisitions.
    pub held_amount: Decimal,
    /// Weighted average acquisition rate, in reporting currency per unit.
    pub average_rate: Decimal,
}

impl BasisEntry {
    pub fn basis(&self) -> Option<Decimal> {
        self.held_amount.checked_mul(self.average_rate)
    }

    /// Entry after folding in `added` units bought at `rate`.
    fn acquire(&self, added: Decimal, rate: Decimal) -> Option<(BasisEntry, AcquisitionOutcome)> {
        let total = self.held_amount.checked_add(added)?;
        if total.is_zero() {
            let entry = BasisEntry {
                held_amount: total,
                average_rate: self.average_rate,
            };
            return Some((entry, AcquisitionOutcome::Degenerate));
        }

        if self.held_amount.is_zero() {
            let entry = BasisEntry {
                held_amount: total,
                average_rate: rate,
            };
            return Some((entry, AcquisitionOutcome::Updated));
        }

        let held_value = self.held_amount.checked_mul(self.average_rate)?;
        let added_value = added.checked_mul(rate)?;
        let average_rate = held_value.checked_add(added_value)?.checked_div(total)?;
        let entry = BasisEntry {
            held_amount: total,
            average_rate,
        };
        Some((entry, AcquisitionOutcome::Updated))
    }

    fn dispose(&self, disposed: Decimal) -> Option<BasisEntry> {
        Some(BasisEntry {
            held_amount: self.held_amount.checked_sub(disposed)?,
            average_rate: self.average_rate,
        })
    }
}

/// Result of folding an acquisition into an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    /// Average rate recomputed, held amount increased.
    Updated,
    /// Total held amount after the acquisition would be zero, so there is no
    /// average to compute. The rate is left untouched.
    Degenerate,
}

/// Cost basis per currency for the lifetime of one replay.
///
/// Entries appear on first acquisition or disposal, starting at zero amount
/// and zero rate. Every mutating operation either applies fully or leaves the
/// ledger untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostBasisLedger {
    entries: BTreeMap<CurrencyCode, BasisEntry>,
}

impl CostBasisLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry, e.g. with balances carried over from a previous period.
    pub fn with_entry(mut self, currency: CurrencyCode, entry: BasisEntry) -> Self {
        self.entries.insert(currency, entry);
        self
    }

    pub fn entry(&self, currency: &CurrencyCode) -> Option<&BasisEntry> {
        self.entries.get(currency)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&CurrencyCode, &BasisEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn current(&self, currency: &CurrencyCode) -> BasisEntry {
        self.entries.get(currency).copied().unwrap_or_default()
    }

    /// Basis attributed to the currently held amount: `held * average`.
    ///
    /// A pure read. Callers decrement the held amount separately through
    /// [`record_disposal`](Self::record_disposal).
    pub fn consume_basis(&self, currency: &CurrencyCode) -> Result<Decimal, EngineError> {
        self.current(currency)
            .basis()
            .ok_or_else(|| EngineError::overflow(Component::CostBasisLedger, "tax basis", currency))
    }

    pub fn record_acquisition(
        &mut self,
        currency: &CurrencyCode,
        acquired: Decimal,
        fee: Decimal,
        rate: Decimal,
    ) -> Result<AcquisitionOutcome, EngineError> {
        let (entry, outcome) = self.preview_acquisition(currency, acquired, fee, rate)?;
        self.commit_acquisition(currency, entry, outcome, rate);
        Ok(outcome)
    }

    pub fn record_disposal(&mut self, currency: &CurrencyCode, disposed: Decimal) -> Result<(), EngineError> {
        let entry = self.preview_disposal(currency, self.current(currency), disposed)?;
        self.commit_disposal(currency, entry, disposed);
        Ok(())
    }

    /// Acquisition followed by disposal, applied together or not at all.
    pub fn settle(
        &mut self,
        acquired: (&CurrencyCode, Decimal),
        fee: Decimal,
        rate: Decimal,
        disposed: (&CurrencyCode, Decimal),
    ) -> Result<AcquisitionOutcome, EngineError> {
        let (acquired_code, acquired_amount) = acquired;
        let (disposed_code, disposed_amount) = disposed;

        let (acquired_entry, outcome) =
            self.preview_acquisition(acquired_code, acquired_amount, fee, rate)?;
        let disposed_before = if disposed_code == acquired_code {
            acquired_entry
        } else {
            self.current(disposed_code)
        };
        let disposed_entry = self.preview_disposal(disposed_code, disposed_before, disposed_amount)?;

        self.commit_acquisition(acquired_code, acquired_entry, outcome, rate);
        self.commit_disposal(disposed_code, disposed_entry, disposed_amount);
        Ok(outcome)
    }

    fn preview_acquisition(
        &self,
        currency: &CurrencyCode,
        acquired: Decimal,
        fee: Decimal,
        rate: Decimal,
    ) -> Result<(BasisEntry, AcquisitionOutcome), EngineError> {
        acquired
            .checked_add(fee)
            .and_then(|added| self.current(currency).acquire(added, rate))
            .ok_or_else(|| EngineError::overflow(Component::CostBasisLedger, "average rate", currency))
    }

    fn preview_disposal(
        &self,
        currency: &CurrencyCode,
        before: BasisEntry,
        disposed: Decimal,
    ) -> Result<BasisEntry, EngineError> {
        before
            .dispose(disposed)
            .ok_or_else(|| EngineError::overflow(Component::CostBasisLedger, "held amount", currency))
    }

    fn commit_acquisition(
        &mut self,
        currency: &CurrencyCode,
        entry: BasisEntry,
        outcome: AcquisitionOutcome,
        rate: Decimal,
    ) {
        match outcome {
            AcquisitionOutcome::Updated => log::debug!(
                "Basis {} ACQUIRE at {}. New total: qty={}, avg={}",
                currency,
                rate,
                entry.held_amount,
                entry.average_rate
            ),
            AcquisitionOutcome::Degenerate => log::debug!(
                "Basis {} ACQUIRE degenerate: nothing held afterwards, avg kept at {}",
                currency,
                entry.average_rate
            ),
        }
        self.entries.insert(currency.clone(), entry);
    }

    fn commit_disposal(&mut self, currency: &CurrencyCode, entry: BasisEntry, disposed: Decimal) {
        if entry.held_amount < Decimal::ZERO {
            log::warn!(
                "Basis {} held amount is negative ({}) after disposing {}",
                currency,
                entry.held_amount,
                disposed
            );
        } else {
            log::debug!(
                "Basis {} DISPOSE: qty={}. Remaining: qty={}, avg={}",
                currency,
                disposed,
                entry.held_amount,
                entry.average_rate
            );
        }
        self.entries.insert(currency.clone(), entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    #[test]
    fn first_acquisition_sets_rate_and_amount() {
        let mut ledger = CostBasisLedger::new();
        let outcome = ledger
            .record_acquisition(&code("BTC"), dec!(1), dec!(0.01), dec!(160000))
            .unwrap();

        assert_eq!(outcome, AcquisitionOutcome::Updated);
        let entry = ledger.entry(&code("BTC")).unwrap();
        assert_eq!(entry.held_amount, dec!(1.01));
        assert_eq!(entry.average_rate, dec!(160000));
    }

    #[test]
    fn acquisitions_average_by_weight() {
        // (10 * 10 + 5 * 20) / 15 = 13.333...
        let mut ledger = CostBasisLedger::new();
        ledger.record_acquisition(&code("USD"), dec!(10), Decimal::ZERO, dec!(10)).unwrap();
        ledger.record_acquisition(&code("USD"), dec!(5), Decimal::ZERO, dec!(20)).unwrap();

        let entry = ledger.entry(&code("USD")).unwrap();
        assert_eq!(entry.held_amount, dec!(15));
        assert_eq!(entry.average_rate.round_dp(6), dec!(13.333333));
    }

    #[test]
    fn disposal_changes_amount_only() {
        let mut ledger = CostBasisLedger::new();
        ledger.record_acquisition(&code("USD"), dec!(100), Decimal::ZERO, dec!(10)).unwrap();
        ledger.record_disposal(&code("USD"), dec!(50)).unwrap();

        let entry = ledger.entry(&code("USD")).unwrap();
        assert_eq!(entry.held_amount, dec!(50));
        assert_eq!(entry.average_rate, dec!(10));
        assert_eq!(ledger.consume_basis(&code("USD")).unwrap(), dec!(500));
    }

    #[test]
    fn consume_basis_does_not_mutate() {
        let mut ledger = CostBasisLedger::new();
        ledger.record_acquisition(&code("USD"), dec!(100), Decimal::ZERO, dec!(10)).unwrap();

        assert_eq!(ledger.consume_basis(&code("USD")).unwrap(), dec!(1000));
        assert_eq!(ledger.consume_basis(&code("USD")).unwrap(), dec!(1000));
        assert_eq!(ledger.consume_basis(&code("EUR")).unwrap(), Decimal::ZERO);
        assert!(ledger.entry(&code("EUR")).is_none());
    }

    #[test]
    fn zero_acquisition_into_empty_entry_is_degenerate() {
        let mut ledger = CostBasisLedger::new();
        let outcome = ledger
            .record_acquisition(&code("USD"), Decimal::ZERO, Decimal::ZERO, dec!(10))
            .unwrap();

        assert_eq!(outcome, AcquisitionOutcome::Degenerate);
        assert_eq!(ledger.entry(&code("USD")), Some(&BasisEntry::default()));
    }

    #[test]
    fn acquisition_that_closes_a_short_is_degenerate() {
        let mut ledger = CostBasisLedger::new();
        ledger.record_disposal(&code("BTC"), dec!(2)).unwrap();
        let outcome = ledger
            .record_acquisition(&code("BTC"), dec!(2), Decimal::ZERO, dec!(100))
            .unwrap();

        assert_eq!(outcome, AcquisitionOutcome::Degenerate);
        let entry = ledger.entry(&code("BTC")).unwrap();
        assert_eq!(entry.held_amount, Decimal::ZERO);
        assert_eq!(entry.average_rate, Decimal::ZERO);
    }

    #[test]
    fn disposals_may_go_negative() {
        let mut ledger = CostBasisLedger::new();
        ledger.record_disposal(&code("USD"), dec!(100)).unwrap();

        let entry = ledger.entry(&code("USD")).unwrap();
        assert_eq!(entry.held_amount, dec!(-100));
        assert_eq!(ledger.consume_basis(&code("USD")).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn seeded_entries_are_kept() {
        let ledger = CostBasisLedger::new().with_entry(
            code("BTC"),
            BasisEntry {
                held_amount: dec!(2),
                average_rate: dec!(100000),
            },
        );
        assert_eq!(ledger.consume_basis(&code("BTC")).unwrap(), dec!(200000));
    }

    #[test]
    fn settle_applies_both_legs() {
        let mut ledger = CostBasisLedger::new().with_entry(
            code("USD"),
            BasisEntry {
                held_amount: dec!(100),
                average_rate: dec!(10),
            },
        );
        let outcome = ledger
            .settle((&code("BTC"), dec!(0.5)), Decimal::ZERO, dec!(160000), (&code("USD"), dec!(80)))
            .unwrap();

        assert_eq!(outcome, AcquisitionOutcome::Updated);
        assert_eq!(ledger.entry(&code("BTC")).unwrap().held_amount, dec!(0.5));
        let usd = ledger.entry(&code("USD")).unwrap();
        assert_eq!(usd.held_amount, dec!(20));
        assert_eq!(usd.average_rate, dec!(10));
    }

    #[test]
    fn settle_leaves_ledger_untouched_on_overflow() {
        let mut ledger = CostBasisLedger::new();
        let before = ledger.clone();
        let err = ledger
            .settle((&code("BTC"), Decimal::MAX), dec!(1), dec!(2), (&code("USD"), dec!(1)))
            .unwrap_err();

        assert!(matches!(err, EngineError::Overflow { component: Component::CostBasisLedger, .. }));
        assert_eq!(ledger, before);
    }
}
