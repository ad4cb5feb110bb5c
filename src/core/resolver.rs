use super::currency::CurrencyCode;
use super::diagnostics::Component;
use super::error::EngineError;
use super::rates::{ExchangeRate, RateTable};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Converts any currency into the reporting currency as of a date, walking
/// the rate graph depth-first when no direct rate exists.
///
/// Stateless over a borrowed table snapshot: nothing is cached between calls.
#[derive(Debug, Clone, Copy)]
pub struct RateResolver<'a> {
    rates: &'a RateTable,
    reporting: &'a CurrencyCode,
}

/// A resolved rate together with the hops taken to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub rate: Decimal,
    pub path: Vec<&'a ExchangeRate>,
}

impl<'a> RateResolver<'a> {
    pub fn new(rates: &'a RateTable, reporting: &'a CurrencyCode) -> Self {
        RateResolver { rates, reporting }
    }

    pub fn reporting_currency(&self) -> &CurrencyCode {
        self.reporting
    }

    /// Units of reporting currency equal to one unit of `currency` on `date`.
    pub fn resolve(&self, date: NaiveDate, currency: &CurrencyCode) -> Result<Decimal, EngineError> {
        self.resolve_path(date, currency).map(|r| r.rate)
    }

    /// Like [`resolve`](Self::resolve), also returning the rates multiplied together.
    pub fn resolve_path(
        &self,
        date: NaiveDate,
        currency: &CurrencyCode,
    ) -> Result<Resolution<'a>, EngineError> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut current = currency;
        let mut multiplier = Decimal::ONE;

        loop {
            if current == self.reporting {
                return Ok(Resolution {
                    rate: multiplier,
                    path,
                });
            }
            if !visited.insert(current) {
                log::debug!("Rate walk from {} revisited {} on {}", currency, current, date);
                break;
            }

            let hop = match self.rates.direct(current, self.reporting, date) {
                Some(direct) => direct,
                // first ranked candidate only, a dead end does not backtrack
                None => match self.rates.candidates(current, date).into_iter().next() {
                    Some(candidate) => candidate,
                    None => break,
                },
            };

            log::debug!(
                "Rate hop {} -> {} at {} ({})",
                hop.origin,
                hop.destination,
                hop.rate,
                hop.date
            );
            multiplier = multiplier
                .checked_mul(hop.rate)
                .ok_or_else(|| EngineError::overflow(Component::RateResolver, "rate path", currency))?;
            path.push(hop);
            current = &hop.destination;
        }

        Err(EngineError::RateNotFound {
            currency: currency.clone(),
            date,
        })
    }
}
