pub mod basis;
pub mod classifier;
pub mod currency;
pub mod diagnostics;
pub mod disposal;
pub mod error;
pub mod rates;
pub mod resolver;
pub mod summary;
pub mod trade;

// Flat public surface for domain types and functions.
pub use basis::{AcquisitionOutcome, BasisEntry, CostBasisLedger};
pub use classifier::{replay, Classified, DisposalClassifier, Replay, ReplayOptions, ReplayReport};
pub use currency::{CurrencyClass, CurrencyCode, CurrencyValue, InvalidCurrencyCode};
pub use diagnostics::{Component, Diagnostic};
pub use disposal::{gain_or_loss, DisposalCsvRecord, DisposalLedger, DisposalRecord, K4Section};
pub use error::EngineError;
pub use rates::{ExchangeRate, RateTable};
pub use resolver::{RateResolver, Resolution};
pub use summary::{CurrencyTotals, K4Summary, SectionSummary};
pub use trade::{sort_chronologically, TradeEvent, TradeKind, TradeLegs, TradeSide};
