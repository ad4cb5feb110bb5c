//! Rate command - resolve one currency into the reporting currency

use clap::Args;
use chrono::NaiveDate;
use k4tax::core::{CurrencyCode, RateResolver};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RateCommand {
    /// Currency to convert, e.g. BTC
    code: CurrencyCode,

    /// Date of the conversion (YYYY-MM-DD)
    date: NaiveDate,

    /// Rate files (CSV or JSON), merged into one table
    #[arg(short, long, required = true, num_args = 1..)]
    rates: Vec<PathBuf>,

    /// Reporting currency
    #[arg(short, long, default_value = "SEK")]
    currency: CurrencyCode,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Hop {
    date: NaiveDate,
    origin: String,
    destination: String,
    rate: String,
}

#[derive(Debug, Serialize)]
struct RateOutput {
    currency: String,
    reporting_currency: String,
    date: NaiveDate,
    rate: String,
    path: Vec<Hop>,
}

impl RateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let table = k4tax::rates::load(&self.rates)?;
        let resolver = RateResolver::new(&table, &self.currency);
        let resolution = resolver.resolve_path(self.date, &self.code)?;

        let output = RateOutput {
            currency: self.code.to_string(),
            reporting_currency: self.currency.to_string(),
            date: self.date,
            rate: resolution.rate.normalize().to_string(),
            path: resolution
                .path
                .iter()
                .map(|r| Hop {
                    date: r.date,
                    origin: r.origin.to_string(),
                    destination: r.destination.to_string(),
                    rate: r.rate.normalize().to_string(),
                })
                .collect(),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("1 {} = {} {} on {}", output.currency, output.rate, output.reporting_currency, output.date);
        for hop in &output.path {
            println!("  {} -> {} at {} (rate of {})", hop.origin, hop.destination, hop.rate, hop.date);
        }
        Ok(())
    }
}
