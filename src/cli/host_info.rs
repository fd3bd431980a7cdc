//! `host-info` sub-command.

use anyhow::{Context, Result};
use clap::Parser;

/// Print the observed hostname and interface set as JSON
#[derive(Debug, Parser)]
pub struct CliHostInfo {}

impl CliHostInfo {
    /// Run the `host-info` sub-command.
    pub(crate) fn run(self) -> Result<()> {
        let info = crate::host_info::collect();
        let doc = serde_json::to_string_pretty(&info).context("serializing host info")?;
        println!("{doc}");
        Ok(())
    }
}
