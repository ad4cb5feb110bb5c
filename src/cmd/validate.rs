//! Validate command - surface trades that could not be classified

use super::ReplayArgs;
use clap::Args;
use k4tax::core::Diagnostic;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    input: ReplayArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput<'a> {
    trades: usize,
    disposals: usize,
    skipped: usize,
    issue_count: usize,
    issues: &'a [Diagnostic],
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (events, report) = self.input.replay()?;
        let issues = &report.diagnostics;

        if self.json {
            let output = ValidationOutput {
                trades: events.len(),
                disposals: report.processed,
                skipped: report.skipped,
                issue_count: issues.len(),
                issues,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if issues.is_empty() {
            println!(
                "No issues found ({} trades, {} disposals, {} skipped)",
                events.len(),
                report.processed,
                report.skipped
            );
        } else {
            println!("{} issue(s) found:", issues.len());
            println!();
            for issue in issues {
                println!("  {}", issue);
            }
            println!();
        }

        // Exit with code 1 if issues found
        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }
}
