mod cmd;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "k4tax", version)]
#[command(about = "Swedish K4 capital gains from exchange trades, using the average cost method")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// K4 disposals per section
    Report(cmd::report::ReportCommand),
    /// K4 totals per currency and section
    Summary(cmd::summary::SummaryCommand),
    /// Cost basis held per currency after the last trade
    Balances(cmd::balances::BalancesCommand),
    /// Resolve one exchange rate into the reporting currency
    Rate(cmd::rate::RateCommand),
    /// Every trade with the outcome of its replay, semicolon delimited
    Detailed(cmd::detailed::DetailedCommand),
    /// Replay and list trades that could not be classified
    Validate(cmd::validate::ValidateCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Report(report) => report.exec(),
        Command::Summary(summary) => summary.exec(),
        Command::Balances(balances) => balances.exec(),
        Command::Rate(rate) => rate.exec(),
        Command::Detailed(detailed) => detailed.exec(),
        Command::Validate(validate) => validate.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
