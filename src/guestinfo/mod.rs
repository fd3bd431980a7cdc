//! VMware guestinfo configuration source.
//!
//! The host publishes instance configuration into the guestinfo
//! key-value store; this module acquires it through the guest-tools
//! channel, decodes it, and exposes it in normalized form for the
//! provisioning caller. Applying the configuration to the OS is the
//! caller's business, reached through the collaborator traits below.

pub mod channel;
pub mod decode;
pub mod load;
pub mod metadata;


use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use slog_scope::{debug, info, warn};

use crate::errors::{Error, Result};
use crate::host_info::HostInfo;

pub use self::channel::{GuestinfoChannel, VmtoolsChannel};
pub use self::metadata::Metadata;

/// System identifier file used when metadata carries no instance-id.
const PRODUCT_UUID_PATH: &str = "/sys/class/dmi/id/product_uuid";

/// Generator for a locally derived, minimal network configuration,
/// used when the host publishes no explicit network document.
pub trait FallbackNetworkConfig {
    fn generate(&self) -> Value;
}

/// Sink for assembled instance data.
///
/// Provisioning stacks on older hosts may not offer one; the facade
/// treats its absence as a missing capability, not a failure.
pub trait InstanceDataSink {
    fn persist(&self, metadata: &Metadata) -> anyhow::Result<()>;
}

/// Configuration source backed by the guestinfo store.
///
/// One acquisition cycle owns the metadata exclusively; `acquire`
/// re-queries the channel and overwrites all three outputs in place.
#[derive(Debug)]
pub struct GuestinfoSource<C> {
    channel: C,
    product_uuid_path: PathBuf,
    /// Assembled metadata document.
    pub metadata: Metadata,
    /// Raw user data, opaque to this source.
    pub userdata_raw: Option<String>,
    /// Raw vendor data, opaque to this source.
    pub vendordata_raw: Option<String>,
}

impl<C: GuestinfoChannel> GuestinfoSource<C> {
    /// Build a source around an existing channel.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            product_uuid_path: PathBuf::from(PRODUCT_UUID_PATH),
            metadata: Metadata::new(),
            userdata_raw: None,
            vendordata_raw: None,
        }
    }

    /// Override the instance-identity fallback file.
    pub fn with_product_uuid_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.product_uuid_path = path.into();
        self
    }

    /// Run one acquisition cycle.
    ///
    /// Populates metadata, raw user data and raw vendor data from the
    /// channel, discarding whatever a previous cycle left behind.
    /// Unset keys degrade to empty/absent values; declared-but-unusable
    /// data (undecodable payloads, malformed network blocks) aborts.
    pub fn acquire(&mut self) -> Result<()> {
        self.metadata = metadata::load_metadata(&self.channel)?;
        self.userdata_raw = metadata::fetch_value(&self.channel, "userdata")?;
        self.vendordata_raw = metadata::fetch_value(&self.channel, "vendordata")?;
        Ok(())
    }

    /// Resolve the network configuration document.
    ///
    /// Prefers the host-published `network.config`; otherwise asks the
    /// fallback generator once and caches the result into metadata, so
    /// repeated calls are idempotent.
    pub fn network_config(&mut self, fallback: &dyn FallbackNetworkConfig) -> Value {
        if let Some(config) = self.metadata.get("network").and_then(|n| n.get("config")) {
            debug!("using metadata network config");
            return config.clone();
        }

        debug!("using fallback network config");
        let config = fallback.generate();
        let network = self
            .metadata
            .entry("network")
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(map) = network {
            map.insert("config".to_string(), config.clone());
        }
        config
    }

    /// Resolve the instance identity.
    ///
    /// Prefers the metadata `instance-id`; otherwise reads the system
    /// product-UUID file, caching the trimmed content into metadata.
    /// With neither available no identity can be established, which is
    /// fatal for the cycle.
    pub fn instance_id(&mut self) -> Result<String> {
        if let Some(id) = self.metadata.get("instance-id").and_then(Value::as_str) {
            return Ok(id.to_string());
        }

        let id = fs::read_to_string(&self.product_uuid_path).map_err(|source| Error::InstanceId {
            path: self.product_uuid_path.clone(),
            source,
        })?;
        let id = id.trim_end().to_string();
        self.metadata
            .insert("instance-id".to_string(), Value::String(id.clone()));
        Ok(id)
    }

    /// Merge observed host state into metadata.
    ///
    /// A hostname already present in metadata wins; the observed one
    /// only fills the gap. The interface map is always overwritten with
    /// the freshly observed set. Finally the assembled metadata is
    /// handed to the persistence sink, best-effort.
    pub fn apply_host_context(
        &mut self,
        host_info: &HostInfo,
        sink: Option<&dyn InstanceDataSink>,
    ) -> Result<()> {
        if !self.metadata.contains_key("local-hostname") {
            if let Some(hostname) = &host_info.local_hostname {
                info!("using observed hostname {}", hostname);
                self.metadata
                    .insert("local-hostname".to_string(), Value::String(hostname.clone()));
            }
        }

        let interfaces = serde_json::to_value(&host_info.network.interfaces)?;
        let network = self
            .metadata
            .entry("network")
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(map) = network {
            map.insert("interfaces".to_string(), interfaces);
        }

        match sink {
            Some(sink) => {
                if let Err(e) = sink.persist(&self.metadata) {
                    warn!("failed to persist instance data: {:#}", e);
                }
            }
            None => debug!("no instance-data sink available, skipping persistence"),
        }
        Ok(())
    }
}
