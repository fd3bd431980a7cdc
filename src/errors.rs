//! Error taxonomy for guestinfo acquisition.
//!
//! Absence of a guestinfo value is never an error: it travels as `None`
//! through the channel and assembler. The variants here cover the cases
//! where something *was* configured but cannot be used, which must stay
//! distinguishable from one another for the provisioning caller.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The guest-tools binary could not be located, which makes every
    /// guestinfo query impossible for this acquisition cycle.
    #[error("unable to locate '{0}' executable on PATH")]
    ChannelUnavailable(&'static str),

    /// A value carried a recognized encoding tag but its payload could
    /// not be decoded (malformed base64, corrupt gzip stream, or a
    /// decode result that is not valid UTF-8).
    #[error("failed to decode '{key}' as {encoding}: {detail}")]
    Decode {
        key: String,
        encoding: &'static str,
        detail: String,
    },

    /// Decoded text is neither valid JSON nor valid YAML. Carries the
    /// error from the YAML attempt, since YAML is the fallback format.
    #[error("data is neither valid JSON nor valid YAML")]
    Parse(#[source] serde_yaml::Error),

    /// A structured document parsed fine but is not a mapping where one
    /// is required.
    #[error("structured document for '{0}' is not a mapping")]
    NotAMapping(String),

    /// A `network` block was declared in metadata but is malformed.
    /// Operator intent is present here, so this aborts assembly instead
    /// of degrading to the fallback configuration.
    #[error("network configuration: {0}")]
    NetworkConfig(String),

    /// No instance identity could be established: metadata carries no
    /// `instance-id` and the system identifier file is unreadable.
    #[error("failed to read instance-id from '{}'", path.display())]
    InstanceId {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize instance data")]
    Serialize(#[from] serde_json::Error),
}
