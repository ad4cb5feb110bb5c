use super::basis::{AcquisitionOutcome, CostBasisLedger};
use super::currency::{CurrencyClass, CurrencyCode};
use super::diagnostics::{Component, Diagnostic};
use super::disposal::{gain_or_loss, DisposalLedger, DisposalRecord};
use super::error::EngineError;
use super::rates::RateTable;
use super::resolver::RateResolver;
use super::trade::TradeEvent;
use rust_decimal::Decimal;

/// Settings for one replay of the trade ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Currency all proceeds, basis and results are expressed in
    pub reporting_currency: CurrencyCode,
    /// Abort on the first event that fails instead of recording a diagnostic
    pub strict: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        ReplayOptions {
            reporting_currency: CurrencyCode::sek(),
            strict: false,
        }
    }
}

/// What classifying a single event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Not a market buy or sell; nothing changed.
    Skipped,
    /// A disposal was recorded and the ledger settled.
    Disposal {
        record: DisposalRecord,
        acquisition: AcquisitionOutcome,
    },
}

/// Turns market trades into disposal records against a cost-basis ledger.
#[derive(Debug, Clone, Copy)]
pub struct DisposalClassifier<'a> {
    resolver: RateResolver<'a>,
}

impl<'a> DisposalClassifier<'a> {
    pub fn new(resolver: RateResolver<'a>) -> Self {
        DisposalClassifier { resolver }
    }

    /// Classify one event and settle it against `ledger`.
    ///
    /// Every value is computed before the ledger is touched, so on error the
    /// ledger is exactly as it was and no record exists for the event.
    pub fn classify(
        &self,
        event_index: usize,
        event: &TradeEvent,
        ledger: &mut CostBasisLedger,
    ) -> Result<Classified, EngineError> {
        self.try_classify(event_index, event, ledger)
            .map_err(|e| EngineError::classification(event_index, e))
    }

    fn try_classify(
        &self,
        event_index: usize,
        event: &TradeEvent,
        ledger: &mut CostBasisLedger,
    ) -> Result<Classified, EngineError> {
        let Some(legs) = event.legs() else {
            return Ok(Classified::Skipped);
        };
        let (acquired, disposed) = (legs.acquired, legs.disposed);
        let date = event.date();

        let acquired_rate = self.resolver.resolve(date, acquired.code())?;

        // Sales price: the fiat given up, or the currency received for crypto.
        let sales_price = match disposed.class() {
            CurrencyClass::Fiat => {
                let rate = self.resolver.resolve(date, disposed.code())?;
                disposed.amount().checked_mul(rate)
            }
            CurrencyClass::Crypto => acquired.amount().checked_mul(acquired_rate),
        }
        .ok_or_else(|| {
            EngineError::overflow(Component::DisposalClassifier, "sales price", disposed.code())
        })?;

        let tax_basis = ledger.consume_basis(disposed.code())?;
        let (gain, loss) = gain_or_loss(sales_price, tax_basis).ok_or_else(|| {
            EngineError::overflow(Component::DisposalClassifier, "gain/loss", disposed.code())
        })?;

        let fee = if event.fee.code() == acquired.code() {
            event.fee.amount()
        } else {
            Decimal::ZERO
        };

        let acquisition = ledger.settle(
            (acquired.code(), acquired.amount()),
            fee,
            acquired_rate,
            (disposed.code(), disposed.amount()),
        )?;

        log::debug!(
            "Event {}: disposed {} for {}, basis {}, gain {}, loss {}",
            event_index,
            disposed,
            sales_price,
            tax_basis,
            gain,
            loss
        );

        Ok(Classified::Disposal {
            record: DisposalRecord {
                event_index,
                date,
                amount: disposed.amount(),
                currency: disposed.code().clone(),
                class: disposed.class(),
                sales_price,
                tax_basis,
                gain,
                loss,
            },
            acquisition,
        })
    }
}

/// Outcome of replaying a full trade ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub disposals: DisposalLedger,
    pub diagnostics: Vec<Diagnostic>,
    /// Cost-basis state after the last event
    pub ledger: CostBasisLedger,
    pub reporting_currency: CurrencyCode,
    /// Events that produced a disposal record
    pub processed: usize,
    /// Events that take no part in the accounting
    pub skipped: usize,
    /// Acquisitions that left nothing held and kept the previous average rate
    pub degenerate: usize,
}

impl ReplayReport {
    pub fn failed(&self) -> usize {
        self.diagnostics.len()
    }
}

/// A single pass over a chronologically ordered trade ledger.
///
/// Each replay owns its ledger; running the same events twice from the same
/// starting ledger yields identical reports.
#[derive(Debug)]
pub struct Replay<'a> {
    rates: &'a RateTable,
    options: ReplayOptions,
    ledger: CostBasisLedger,
}

impl<'a> Replay<'a> {
    pub fn new(rates: &'a RateTable, options: ReplayOptions) -> Self {
        Replay::with_ledger(rates, CostBasisLedger::new(), options)
    }

    /// Start from existing balances, e.g. carried over from an earlier period.
    pub fn with_ledger(rates: &'a RateTable, ledger: CostBasisLedger, options: ReplayOptions) -> Self {
        Replay {
            rates,
            options,
            ledger,
        }
    }

    /// Process `events` in the order given. The caller is responsible for
    /// chronological order.
    pub fn run(self, events: &[TradeEvent]) -> Result<ReplayReport, EngineError> {
        let Replay {
            rates,
            options,
            mut ledger,
        } = self;
        let resolver = RateResolver::new(rates, &options.reporting_currency);
        let classifier = DisposalClassifier::new(resolver);

        let mut disposals = DisposalLedger::new();
        let mut diagnostics = Vec::new();
        let (mut processed, mut skipped, mut degenerate) = (0, 0, 0);

        for (position, event) in events.iter().enumerate() {
            let event_index = position + 1;
            match classifier.classify(event_index, event, &mut ledger) {
                Ok(Classified::Skipped) => skipped += 1,
                Ok(Classified::Disposal {
                    record,
                    acquisition,
                }) => {
                    if acquisition == AcquisitionOutcome::Degenerate {
                        degenerate += 1;
                    }
                    processed += 1;
                    disposals.push(record);
                }
                Err(err) if options.strict => return Err(err),
                Err(err) => {
                    let diagnostic = Diagnostic::from_error(event_index, &err);
                    log::warn!("{}", diagnostic);
                    diagnostics.push(diagnostic);
                }
            }
        }

        log::info!(
            "Replayed {} events: {} disposals, {} skipped, {} failed",
            events.len(),
            processed,
            skipped,
            diagnostics.len()
        );

        Ok(ReplayReport {
            disposals,
            diagnostics,
            ledger,
            reporting_currency: options.reporting_currency.clone(),
            processed,
            skipped,
            degenerate,
        })
    }
}

/// Replay `events` from an empty ledger.
pub fn replay(
    events: &[TradeEvent],
    rates: &RateTable,
    options: ReplayOptions,
) -> Result<ReplayReport, EngineError> {
    Replay::new(rates, options).run(events)
}
