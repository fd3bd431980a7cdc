//! Structured parsing of decoded guestinfo text.

use serde_json::Value;
use slog_scope::trace;

use crate::errors::{Error, Result};

/// Parse decoded text into a structured document.
///
/// JSON is attempted first; on any JSON parse error the text is
/// re-parsed as YAML, which is treated as the superset format. Absent
/// or empty input yields an empty mapping: a datasource with nothing
/// configured is not an error. Shape validation is the caller's job.
pub fn load(data: Option<&str>) -> Result<Value> {
    let data = match data {
        Some(text) if !text.is_empty() => text,
        _ => return Ok(Value::Object(Default::default())),
    };

    match serde_json::from_str(data) {
        Ok(value) => Ok(value),
        Err(e) => {
            trace!("data is not JSON ({}), trying YAML", e);
            serde_yaml::from_str(data).map_err(Error::Parse)
        }
    }
}
