//! Report command - K4 disposals per section

use super::{format_money, format_quantity, warn_failures, year_label, ReplayArgs};
use clap::{Args, ValueEnum};
use k4tax::core::{DisposalCsvRecord, DisposalRecord, K4Section, ReplayReport};
use serde::Serialize;
use std::io;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ReportCommand {
    #[command(flatten)]
    input: ReplayArgs,

    /// Calendar year to report
    #[arg(short, long)]
    year: Option<i32>,

    /// Only one K4 section
    #[arg(short, long, value_enum)]
    section: Option<SectionArg>,

    /// Output as CSV instead of formatted tables
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SectionArg {
    /// Section C: currency
    C,
    /// Section D: other assets
    D,
}

impl From<SectionArg> for K4Section {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::C => K4Section::C,
            SectionArg::D => K4Section::D,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReportOutput<'a> {
    year: Option<i32>,
    currency: String,
    disposals: Vec<&'a DisposalRecord>,
    failed: usize,
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (_, report) = self.input.replay()?;

        if self.csv {
            let records = self
                .disposals(&report)
                .into_iter()
                .map(DisposalCsvRecord::from);
            k4tax::utils::write_csv(records, io::stdout())?;
        } else if self.json {
            let output = ReportOutput {
                year: self.year,
                currency: report.reporting_currency.to_string(),
                disposals: self.disposals(&report),
                failed: report.failed(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            self.print_tables(&report);
        }

        warn_failures(&report);
        Ok(())
    }

    fn sections(&self) -> Vec<K4Section> {
        match self.section {
            Some(section) => vec![section.into()],
            None => vec![K4Section::C, K4Section::D],
        }
    }

    fn disposals<'a>(&self, report: &'a ReplayReport) -> Vec<&'a DisposalRecord> {
        let sections = self.sections();
        report
            .disposals
            .chronological(self.year)
            .into_iter()
            .filter(|d| sections.contains(&d.section()))
            .collect()
    }

    fn print_tables(&self, report: &ReplayReport) {
        println!();
        println!(
            "K4 DISPOSALS ({}, {})",
            year_label(self.year),
            report.reporting_currency
        );

        for section in self.sections() {
            let rows: Vec<DisposalRow> = report
                .disposals
                .section(section)
                .iter()
                .filter(|d| self.year.is_none_or(|y| d.year() == y))
                .map(DisposalRow::from)
                .collect();

            println!();
            println!("{}", section.title());
            if rows.is_empty() {
                println!("  (no disposals)");
                continue;
            }

            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
        }
        println!();
    }
}

#[derive(Debug, Clone, Tabled)]
struct DisposalRow {
    #[tabled(rename = "#")]
    event: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Currency")]
    currency: String,
    #[tabled(rename = "Sales Price")]
    sales_price: String,
    #[tabled(rename = "Tax Basis")]
    tax_basis: String,
    #[tabled(rename = "Gain")]
    gain: String,
    #[tabled(rename = "Loss")]
    loss: String,
}

impl From<&DisposalRecord> for DisposalRow {
    fn from(d: &DisposalRecord) -> Self {
        DisposalRow {
            event: d.event_index,
            date: d.date.format("%Y-%m-%d").to_string(),
            amount: format_quantity(d.amount),
            currency: d.currency.to_string(),
            sales_price: format_money(d.sales_price),
            tax_basis: format_money(d.tax_basis),
            gain: format_money(d.gain),
            loss: format_money(d.loss),
        }
    }
}
