use super::currency::CurrencyCode;
use super::diagnostics::Component;
use chrono::NaiveDate;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    /// The rate graph was exhausted (or revisited a currency) without reaching
    /// the reporting currency.
    #[error("no rate path from {currency} to the reporting currency on {date}")]
    RateNotFound { currency: CurrencyCode, date: NaiveDate },
    #[error("decimal overflow computing {what} for {currency}")]
    Overflow {
        component: Component,
        what: &'static str,
        currency: CurrencyCode,
    },
    /// Processing a single trade event failed; nothing was recorded for it.
    #[error("event {event_index}: {source}")]
    ClassificationFailure {
        event_index: usize,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    pub fn classification(event_index: usize, source: EngineError) -> Self {
        EngineError::ClassificationFailure {
            event_index,
            source: Box::new(source),
        }
    }

    pub(crate) fn overflow(component: Component, what: &'static str, currency: &CurrencyCode) -> Self {
        EngineError::Overflow {
            component,
            what,
            currency: currency.clone(),
        }
    }

    /// Component the failure originated in.
    pub fn component(&self) -> Component {
        match self {
            EngineError::RateNotFound { .. } => Component::RateResolver,
            EngineError::Overflow { component, .. } => *component,
            EngineError::ClassificationFailure { source, .. } => source.component(),
        }
    }

    /// Innermost error, stripping classification wrappers.
    pub fn root(&self) -> &EngineError {
        match self {
            EngineError::ClassificationFailure { source, .. } => source.root(),
            other => other,
        }
    }
}
