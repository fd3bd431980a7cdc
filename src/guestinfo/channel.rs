//! Guest channel backed by the VMware tools daemon.
//!
//! Values are queried one key at a time by running
//! `vmtoolsd --cmd "info-get guestinfo.<key>"`. The daemon signals an
//! unset key with an exact sentinel message on stderr, which is the
//! expected case and must not be reported as a failure.

use std::env;
use std::path::PathBuf;
use std::process::Command;

use slog_scope::{debug, error};

use crate::errors::{Error, Result};

/// Name of the guest-tools binary, located on PATH at construction.
pub const VMTOOLSD: &str = "vmtoolsd";

/// Sentinel emitted on stderr when a guestinfo key is not set.
const NO_VALUE: &str = "No value found";

/// A source of raw guestinfo values.
///
/// Absence and operational fetch failures both resolve to `None`;
/// failures are logged by the implementation. Implementors never
/// propagate an error to the caller.
pub trait GuestinfoChannel {
    /// Fetch the raw value for a guestinfo key, trailing whitespace
    /// trimmed.
    fn fetch(&self, key: &str) -> Option<String>;
}

/// Guest channel invoking the vmtoolsd command-line tool.
#[derive(Clone, Debug)]
pub struct VmtoolsChannel {
    /// Resolved path to the vmtoolsd binary.
    vmtoolsd: PathBuf,
}

impl VmtoolsChannel {
    /// Try to build a new channel, locating vmtoolsd on PATH.
    ///
    /// Failure here is fatal for the whole acquisition cycle: without
    /// the tool no guestinfo key can be queried.
    pub fn try_new() -> Result<Self> {
        let vmtoolsd = find_on_path(VMTOOLSD).ok_or(Error::ChannelUnavailable(VMTOOLSD))?;
        debug!("using guest channel command {}", vmtoolsd.display());
        Ok(Self { vmtoolsd })
    }

    /// Build a channel around a specific command path, bypassing the
    /// PATH lookup.
    pub fn with_command(vmtoolsd: impl Into<PathBuf>) -> Self {
        Self {
            vmtoolsd: vmtoolsd.into(),
        }
    }
}

impl GuestinfoChannel for VmtoolsChannel {
    fn fetch(&self, key: &str) -> Option<String> {
        debug!("getting guestinfo value for key {}", key);
        let output = Command::new(&self.vmtoolsd)
            .arg("--cmd")
            .arg(format!("info-get guestinfo.{key}"))
            .output();
        match output {
            Ok(out) => classify_output(key, out.status.success(), &out.stdout, &out.stderr),
            Err(e) => {
                error!("failed to invoke {} for key {}: {}", VMTOOLSD, key, e);
                None
            }
        }
    }
}

/// Classify a finished tool invocation into a value or absence.
///
/// The stderr sentinel is checked first, regardless of exit status, so
/// an unset key never surfaces as an operational error.
fn classify_output(key: &str, success: bool, stdout: &[u8], stderr: &[u8]) -> Option<String> {
    let stderr = String::from_utf8_lossy(stderr);
    if stderr.trim_end() == NO_VALUE {
        debug!("no value found for key {}", key);
        return None;
    }
    if !success {
        error!(
            "failed to get guestinfo value for key {}: {}",
            key,
            stderr.trim_end()
        );
        return None;
    }
    if stdout.is_empty() {
        error!("failed to get guestinfo value for key {}", key);
        return None;
    }
    let stdout = String::from_utf8_lossy(stdout);
    Some(stdout.trim_end().to_string())
}

/// Locate a binary in the directories listed in PATH.
fn find_on_path(bin: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_value_sentinel_is_absence() {
        // Sentinel beats exit status, with or without trailing newline.
        assert_eq!(classify_output("k", false, b"", b"No value found"), None);
        assert_eq!(classify_output("k", true, b"", b"No value found\n"), None);
    }

    #[test]
    fn test_operational_error_is_absence() {
        assert_eq!(
            classify_output("k", false, b"", b"Error communicating with host"),
            None
        );
        // Tool ran but produced nothing.
        assert_eq!(classify_output("k", true, b"", b""), None);
    }

    #[test]
    fn test_value_trimmed() {
        assert_eq!(
            classify_output("k", true, b"some value\n", b""),
            Some("some value".to_string())
        );
        assert_eq!(
            classify_output("k", true, b"abc-123 \n", b""),
            Some("abc-123".to_string())
        );
    }

    #[test]
    fn test_fetch_via_script() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("vmtoolsd");
        std::fs::write(
            &script,
            concat!(
                "#!/bin/sh\n",
                "case \"$2\" in\n",
                "*guestinfo.metadata) printf 'local-hostname: h1\\n' ;;\n",
                "*) printf 'No value found\\n' >&2; exit 1 ;;\n",
                "esac\n",
            ),
        )
        .unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        let channel = VmtoolsChannel::with_command(&script);
        assert_eq!(
            channel.fetch("metadata"),
            Some("local-hostname: h1".to_string())
        );
        assert_eq!(channel.fetch("metadata.encoding"), None);
    }

    #[test]
    fn test_find_on_path() {
        // `sh` is on PATH in any environment these tests run in.
        let sh = find_on_path("sh").unwrap();
        assert!(sh.ends_with("sh"));
        assert_eq!(find_on_path("no-such-binary-here"), None);
    }
}
