//! Balances command - cost basis per currency after the last trade

use super::{format_money, format_quantity, warn_failures, ReplayArgs};
use clap::Args;
use k4tax::core::ReplayReport;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct BalancesCommand {
    #[command(flatten)]
    input: ReplayArgs,

    /// Output as JSON instead of a formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Balance {
    currency: String,
    class: String,
    held_amount: Decimal,
    average_rate: Decimal,
    basis: Option<Decimal>,
}

impl BalancesCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (_, report) = self.input.replay()?;
        let balances = balances(&report);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&balances)?);
        } else {
            print_table(&balances, &report);
        }

        warn_failures(&report);
        Ok(())
    }
}

fn balances(report: &ReplayReport) -> Vec<Balance> {
    report
        .ledger
        .entries()
        .map(|(code, entry)| Balance {
            currency: code.to_string(),
            class: code.class().to_string(),
            held_amount: entry.held_amount,
            average_rate: entry.average_rate,
            basis: entry.basis(),
        })
        .collect()
}

fn print_table(balances: &[Balance], report: &ReplayReport) {
    if balances.is_empty() {
        println!("No balances");
        return;
    }

    let rows: Vec<BalanceRow> = balances
        .iter()
        .map(|b| BalanceRow {
            currency: b.currency.clone(),
            class: b.class.clone(),
            held: format_quantity(b.held_amount),
            average_rate: b.average_rate.round_dp(6).normalize().to_string(),
            basis: b.basis.map(format_money).unwrap_or_else(|| "overflow".to_string()),
        })
        .collect();

    println!();
    println!("COST BASIS ({})", report.reporting_currency);
    println!();
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
}

#[derive(Debug, Clone, Tabled)]
struct BalanceRow {
    #[tabled(rename = "Currency")]
    currency: String,
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Held")]
    held: String,
    #[tabled(rename = "Average Rate")]
    average_rate: String,
    #[tabled(rename = "Basis")]
    basis: String,
}
