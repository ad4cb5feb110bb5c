//! Detailed command - every trade with the outcome of its replay

use super::{warn_failures, ReplayArgs};
use anyhow::Context;
use clap::Args;
use k4tax::detailed;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DetailedCommand {
    #[command(flatten)]
    input: ReplayArgs,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl DetailedCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (events, report) = self.input.replay()?;
        let rows = detailed::rows(&events, &report);

        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("creating {}", path.display()))?;
                detailed::write_csv(&rows, file)?;
                log::info!("Wrote {} trades to {}", rows.len(), path.display());
            }
            None => detailed::write_csv(&rows, io::stdout())?,
        }

        warn_failures(&report);
        Ok(())
    }
}
