//! Summary command - K4 totals per currency and section

use super::{format_money, format_quantity, warn_failures, year_label, ReplayArgs};
use clap::Args;
use k4tax::core::{K4Summary, SectionSummary};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[command(flatten)]
    input: ReplayArgs,

    /// Calendar year to summarise
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (_, report) = self.input.replay()?;
        let summary = K4Summary::new(&report.disposals, &report.reporting_currency, self.year)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }

        warn_failures(&report);
        Ok(())
    }
}

fn print_summary(summary: &K4Summary) {
    println!();
    println!("K4 SUMMARY ({}, {})", year_label(summary.year), summary.currency);

    for section in [&summary.fiat, &summary.crypto] {
        print_section(section);
    }

    println!();
    println!(
        "TOTAL  Gain: {} | Loss: {} | Net: {}",
        format_money(summary.total_gain()),
        format_money(summary.total_loss()),
        format_money(summary.net())
    );
    println!();
}

fn print_section(section: &SectionSummary) {
    println!();
    println!("{}", section.section.title());
    if section.rows.is_empty() {
        println!("  (no disposals)");
        return;
    }

    let rows: Vec<TotalsRow> = section
        .rows
        .iter()
        .map(|r| TotalsRow {
            currency: r.currency.to_string(),
            disposals: r.disposals,
            amount: format_quantity(r.amount),
            sales_price: format_money(r.sales_price),
            tax_basis: format_money(r.tax_basis),
            gain: format_money(r.gain),
            loss: format_money(r.loss),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    println!(
        "  Sales price: {} | Tax basis: {} | Gain: {} | Loss: {}",
        format_money(section.sales_price),
        format_money(section.tax_basis),
        format_money(section.gain),
        format_money(section.loss)
    );
}

#[derive(Debug, Clone, Tabled)]
struct TotalsRow {
    #[tabled(rename = "Currency")]
    currency: String,
    #[tabled(rename = "Disposals")]
    disposals: usize,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Sales Price")]
    sales_price: String,
    #[tabled(rename = "Tax Basis")]
    tax_basis: String,
    #[tabled(rename = "Gain")]
    gain: String,
    #[tabled(rename = "Loss")]
    loss: String,
}
