//! `fetch` sub-command.

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;

use crate::guestinfo::{GuestinfoSource, VmtoolsChannel};

/// Acquire instance configuration from the guestinfo store
#[derive(Debug, Parser)]
pub struct CliFetch {
    /// Path to the vmtoolsd binary (located on PATH if unset)
    #[arg(long = "vmtoolsd", value_name = "path")]
    vmtoolsd: Option<String>,
    /// The file into which assembled metadata is written as JSON (stdout if unset)
    #[arg(long = "metadata", value_name = "path")]
    metadata_file: Option<String>,
    /// The file into which raw user data is written, when present
    #[arg(long = "userdata", value_name = "path")]
    userdata_file: Option<String>,
    /// The file into which raw vendor data is written, when present
    #[arg(long = "vendordata", value_name = "path")]
    vendordata_file: Option<String>,
    /// Merge the observed hostname and interface set into metadata
    #[arg(long)]
    with_host_info: bool,
}

impl CliFetch {
    /// Run the `fetch` sub-command.
    pub(crate) fn run(self) -> Result<()> {
        let channel = match &self.vmtoolsd {
            Some(path) => VmtoolsChannel::with_command(path),
            None => VmtoolsChannel::try_new().context("initializing guestinfo channel")?,
        };
        let mut source = GuestinfoSource::new(channel);
        source
            .acquire()
            .context("acquiring guestinfo configuration")?;

        if self.with_host_info {
            let host_info = crate::host_info::collect();
            source
                .apply_host_context(&host_info, None)
                .context("merging host context into metadata")?;
        }

        let metadata =
            serde_json::to_string_pretty(&source.metadata).context("serializing metadata")?;
        match &self.metadata_file {
            Some(path) => write_file(path, &metadata)?,
            None => println!("{metadata}"),
        }

        if let (Some(path), Some(data)) = (&self.userdata_file, &source.userdata_raw) {
            write_file(path, data)?;
        }
        if let (Some(path), Some(data)) = (&self.vendordata_file, &source.vendordata_raw) {
            write_file(path, data)?;
        }

        Ok(())
    }
}

fn write_file(path: &str, data: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("failed to create file '{path}'"))?;
    file.write_all(data.as_bytes())
        .with_context(|| format!("failed to write file '{path}'"))
}
