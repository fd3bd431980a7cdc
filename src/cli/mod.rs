//! Command-line arguments parsing.

use anyhow::Result;
use clap::Parser;
use slog_scope::trace;

mod fetch;
mod host_info;

#[derive(Debug, Parser)]
#[clap(display_name = "guestinfo-agent")]
#[clap(version, propagate_version = true)]
pub(crate) enum CliConfig {
    Fetch(fetch::CliFetch),
    HostInfo(host_info::CliHostInfo),
}

impl CliConfig {
    /// Run the relevant CLI sub-command.
    pub fn run(self) -> Result<()> {
        match self {
            CliConfig::Fetch(cmd) => cmd.run(),
            CliConfig::HostInfo(cmd) => cmd.run(),
        }
    }
}

/// Parse command-line arguments into CLI configuration.
pub(crate) fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<CliConfig> {
    let cfg = match CliConfig::try_parse_from(argv) {
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayHelp => e.exit(),
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayVersion => e.exit(),
        v => v,
    }?;
    trace!("cli configuration - {:?}", cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clap_tests() {
        use clap::CommandFactory;
        CliConfig::command().debug_assert();
    }

    #[test]
    fn test_no_args() {
        let args = vec!["guestinfo-agent".to_string()];
        parse_args(args).unwrap_err();
    }

    #[test]
    fn test_fetch_cmd() {
        let args: Vec<_> = [
            "guestinfo-agent",
            "fetch",
            "--metadata",
            "/run/metadata.json",
            "--with-host-info",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        let cmd = parse_args(args).unwrap();
        match cmd {
            CliConfig::Fetch(_) => {}
            x => panic!("unexpected cmd: {x:?}"),
        };
    }

    #[test]
    fn test_host_info_cmd() {
        let args: Vec<_> = ["guestinfo-agent", "host-info"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let cmd = parse_args(args).unwrap();
        match cmd {
            CliConfig::HostInfo(_) => {}
            x => panic!("unexpected cmd: {x:?}"),
        };
    }
}
