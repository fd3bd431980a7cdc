//! Local host observation: hostname and network interface enumeration.
//!
//! This is reporting-side data only. The guestinfo source merges it
//! into metadata during host setup so the provisioning stack can
//! persist what the instance actually looks like; nothing here ever
//! mutates OS state.

use std::collections::BTreeMap;

use ipnetwork::IpNetwork;
use pnet_base::MacAddr;
use serde::Serialize;
use slog_scope::warn;

/// Observed host state.
#[derive(Clone, Debug, Default, Serialize)]
pub struct HostInfo {
    #[serde(rename = "local-hostname", skip_serializing_if = "Option::is_none")]
    pub local_hostname: Option<String>,
    pub network: NetworkInfo,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct NetworkInfo {
    pub interfaces: Interfaces,
}

/// Interface maps keyed by MAC and by address.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Interfaces {
    #[serde(rename = "by-mac")]
    pub by_mac: BTreeMap<String, InterfaceAddrs>,
    #[serde(rename = "by-ip4")]
    pub by_ip4: BTreeMap<String, AddressInfo>,
    #[serde(rename = "by-ip6")]
    pub by_ip6: BTreeMap<String, AddressInfo>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct InterfaceAddrs {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip4: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip6: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AddressInfo {
    /// Prefix length of the attached network.
    pub prefix: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

/// Observe the current hostname and interface set.
pub fn collect() -> HostInfo {
    let mut info = HostInfo::default();

    match nix::unistd::gethostname() {
        Ok(name) => info.local_hostname = name.into_string().ok(),
        Err(e) => warn!("failed to read hostname: {}", e),
    }

    let interfaces = &mut info.network.interfaces;
    for iface in pnet_datalink::interfaces() {
        // Do not bother recording localhost.
        if iface.mac == Some(MacAddr::zero()) {
            continue;
        }
        let mac = iface.mac.map(|m| m.to_string());

        let mut addrs = InterfaceAddrs::default();
        for ip in &iface.ips {
            match ip {
                IpNetwork::V4(net) => {
                    addrs.ip4.push(net.ip().to_string());
                    interfaces.by_ip4.insert(
                        net.ip().to_string(),
                        AddressInfo {
                            prefix: net.prefix(),
                            mac: mac.clone(),
                        },
                    );
                }
                IpNetwork::V6(net) => {
                    addrs.ip6.push(net.ip().to_string());
                    interfaces.by_ip6.insert(
                        net.ip().to_string(),
                        AddressInfo {
                            prefix: net.prefix(),
                            mac: mac.clone(),
                        },
                    );
                }
            }
        }

        if let Some(mac) = mac {
            if !addrs.ip4.is_empty() || !addrs.ip6.is_empty() {
                interfaces.by_mac.insert(mac, addrs);
            }
        }
    }

    info
}
