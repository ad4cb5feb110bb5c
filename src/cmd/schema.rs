//! Schema command - print expected input formats

use clap::{Args, ValueEnum};
use k4tax::columns::{self, CsvColumn};
use k4tax::detailed::DetailedTrade;
use k4tax::rates::{RateInput, RateRecord};
use k4tax::trades::{TradeInput, TradeRecord};
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Which file to describe
    #[arg(value_enum, default_value = "trades")]
    file: SchemaFile,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaFile {
    /// Trade export
    Trades,
    /// Exchange rates (long layout)
    Rates,
    /// Detailed transaction output
    Detailed,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the JSON input format
    JsonSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => {
                let (columns, delimiter) = self.columns();
                println!("{}", columns::header(columns).join(delimiter));
                Ok(())
            }
            SchemaFormat::CsvFields => {
                self.print_csv_fields();
                Ok(())
            }
        }
    }

    fn columns(&self) -> (&'static [CsvColumn], &'static str) {
        match self.file {
            SchemaFile::Trades => (TradeRecord::csv_columns(), ","),
            SchemaFile::Rates => (RateRecord::csv_columns(), ","),
            SchemaFile::Detailed => (DetailedTrade::csv_columns(), ";"),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = match self.file {
            SchemaFile::Trades => schema_for!(TradeInput),
            SchemaFile::Rates => schema_for!(RateInput),
            SchemaFile::Detailed => anyhow::bail!("detailed output is CSV only, use --format csv-fields"),
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_fields(&self) {
        let (columns, _) = self.columns();
        let title = match self.file {
            SchemaFile::Trades => "Trade CSV Format",
            SchemaFile::Rates => "Rate CSV Format (long layout)",
            SchemaFile::Detailed => "Detailed CSV Format",
        };
        println!("{}", title);
        println!("{}", "=".repeat(title.len()));
        println!();
        for column in columns {
            let req = if column.required { "required" } else { "optional" };
            println!("{:20} ({:8})  {}", column.name, req, column.description);
        }
        println!();
        match self.file {
            SchemaFile::Trades => {
                println!("Money columns hold '<amount> <CODE>', e.g. '0.5 BTC'. Delimiter ',' or ';'.")
            }
            SchemaFile::Rates => println!(
                "A wide layout is also accepted: a date column then one column per pair (USDSEK, EUR/SEK, ...)."
            ),
            SchemaFile::Detailed => println!("Absent values are empty. Delimiter ';'."),
        }
    }
}
