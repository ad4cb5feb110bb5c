pub mod balances;
pub mod detailed;
pub mod rate;
pub mod report;
pub mod schema;
pub mod summary;
pub mod validate;

use clap::Args;
use k4tax::core::{self, CurrencyCode, ReplayOptions, ReplayReport, TradeEvent};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Inputs shared by every command that replays the trade ledger.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Trade export (CSV, or JSON with a .json extension)
    #[arg(short, long)]
    pub trades: PathBuf,

    /// Rate files (CSV or JSON), merged into one table
    #[arg(short, long, required = true, num_args = 1..)]
    pub rates: Vec<PathBuf>,

    /// Reporting currency
    #[arg(short, long, default_value = "SEK")]
    pub currency: CurrencyCode,

    /// Stop at the first trade that cannot be classified
    #[arg(long)]
    pub strict: bool,
}

impl ReplayArgs {
    /// Load both inputs, sort the trades by time and replay them.
    pub fn replay(&self) -> anyhow::Result<(Vec<TradeEvent>, ReplayReport)> {
        let mut events = k4tax::trades::load(&self.trades)?;
        core::sort_chronologically(&mut events);
        let rates = k4tax::rates::load(&self.rates)?;

        let options = ReplayOptions {
            reporting_currency: self.currency.clone(),
            strict: self.strict,
        };
        let report = core::replay(&events, &rates, options)?;
        Ok((events, report))
    }
}

/// Warn on stderr when some trades were left out of the figures.
pub fn warn_failures(report: &ReplayReport) {
    if report.failed() > 0 {
        eprintln!(
            "warning: {} trade(s) could not be classified and are missing from these figures, run `k4tax validate` for details",
            report.failed()
        );
    }
}

pub fn format_money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

pub fn format_quantity(qty: Decimal) -> String {
    let s = format!("{:.8}", qty);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

pub fn year_label(year: Option<i32>) -> String {
    year.map_or("All Years".to_string(), |y| y.to_string())
}
