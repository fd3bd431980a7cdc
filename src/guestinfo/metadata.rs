//! Metadata assembly from guestinfo values.
//!
//! This composes the channel, the decoder and the structured loader
//! into the full metadata document, including the embedded network
//! sub-document. The `network` key and its `network.encoding` sibling
//! are looked up inside the parsed metadata document (nested lookup);
//! pre-parse extraction of top-level sibling keys is a legacy variant
//! this implementation deliberately does not support.

use serde_json::{Map, Value};
use slog_scope::debug;

use super::channel::GuestinfoChannel;
use super::decode::{decode, Encoding};
use super::load::load;
use crate::errors::{Error, Result};

/// Assembled instance metadata.
pub type Metadata = Map<String, Value>;

/// Fetch the decoded guestinfo value for a key.
///
/// The companion `<key>.encoding` key is consulted to pick the
/// transfer encoding. An unset key yields `Ok(None)`; a set key with
/// an undecodable payload is an error.
pub fn fetch_value(channel: &dyn GuestinfoChannel, key: &str) -> Result<Option<String>> {
    let Some(data) = channel.fetch(key) else {
        return Ok(None);
    };
    let tag = channel.fetch(&format!("{key}.encoding"));
    let encoding = Encoding::from_tag(tag.as_deref());
    decode(&format!("guestinfo.{key}"), encoding, &data).map(Some)
}

/// Load the metadata document from the guest channel.
///
/// An unset `metadata` key yields an empty document. A present
/// `network` entry is normalized to a mapping: if the host published
/// it as a string it was encoded independently from the rest of the
/// document, and is decoded here using the `network.encoding` entry
/// found alongside it. A declared network block without a `config` key
/// aborts assembly.
pub fn load_metadata(channel: &dyn GuestinfoChannel) -> Result<Metadata> {
    let raw = fetch_value(channel, "metadata")?;
    let mut data = as_mapping("metadata", load(raw.as_deref())?)?;

    let network = data.remove("network");
    // Only meaningful for a string-valued network entry; superfluous
    // (and dropped) when the network entry is already structured.
    let network_enc = data.remove("network.encoding");

    if let Some(network) = network {
        let network = match network {
            Value::Object(map) => map,
            Value::String(raw) => {
                debug!("decoding network data: {}", raw);
                let tag = network_enc.as_ref().and_then(Value::as_str);
                let text = decode("metadata.network", Encoding::from_tag(tag), &raw)?;
                as_mapping("metadata.network", load(Some(&text))?)
                    .map_err(|_| Error::NetworkConfig("network data is not a mapping".into()))?
            }
            other => {
                return Err(Error::NetworkConfig(format!(
                    "unexpected network value: {other}"
                )))
            }
        };
        if !network.contains_key("config") {
            return Err(Error::NetworkConfig("missing 'config' key".into()));
        }
        data.insert("network".to_string(), Value::Object(network));
    }

    Ok(data)
}

fn as_mapping(key: &str, value: Value) -> Result<Metadata> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::NotAMapping(key.to_string())),
    }
}
