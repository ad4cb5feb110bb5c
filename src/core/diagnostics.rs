use super::error::EngineError;
use serde::Serialize;
use std::fmt;

/// Engine component that raised a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Component {
    RateResolver,
    CostBasisLedger,
    DisposalClassifier,
    Summary,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::RateResolver => f.write_str("rate resolver"),
            Component::CostBasisLedger => f.write_str("cost basis ledger"),
            Component::DisposalClassifier => f.write_str("disposal classifier"),
            Component::Summary => f.write_str("summary"),
        }
    }
}

/// A trade event that could not be classified. Replay continued past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 1-based position of the trade event
    pub event_index: usize,
    pub component: Component,
    pub message: String,
}

impl Diagnostic {
    pub fn from_error(event_index: usize, error: &EngineError) -> Self {
        Diagnostic {
            event_index,
            component: error.component(),
            message: error.root().to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}. {}: {}", self.event_index, self.component, self.message)
    }
}
