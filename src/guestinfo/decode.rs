//! Transfer-encoding handling for guestinfo values.
//!
//! A value's companion `<key>.encoding` key declares how the raw text
//! must be transformed before structured parsing. Unrecognized tags
//! fall back to plain text, matching what hosts have historically
//! published.

use std::fmt;
use std::io::Read;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::GzDecoder;
use slog_scope::debug;

use crate::errors::{Error, Result};

/// Recognized transfer encodings for a guestinfo value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    Plain,
    Base64,
    GzipBase64,
}

impl Encoding {
    /// Map an encoding tag to an `Encoding`.
    ///
    /// Matching is exact and case-sensitive; anything unrecognized
    /// (including an absent tag) means plain text, not an error.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("gzip+base64") | Some("gz+b64") => Encoding::GzipBase64,
            Some("base64") | Some("b64") => Encoding::Base64,
            _ => Encoding::Plain,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Plain => "plain",
            Encoding::Base64 => "base64",
            Encoding::GzipBase64 => "gzip+base64",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode a raw guestinfo value into UTF-8 text.
///
/// `key` only identifies the data in logs and errors. A payload that
/// declares an encoding but fails to decode is a data-integrity error,
/// distinct from the "no value found" case handled by the channel.
pub fn decode(key: &str, encoding: Encoding, data: &str) -> Result<String> {
    match encoding {
        Encoding::GzipBase64 => {
            debug!("decoding {} format {}", encoding, key);
            let compressed = BASE64
                .decode(data)
                .map_err(|e| decode_err(key, encoding, e))?;
            let mut text = String::new();
            GzDecoder::new(compressed.as_slice())
                .read_to_string(&mut text)
                .map_err(|e| decode_err(key, encoding, e))?;
            Ok(text)
        }
        Encoding::Base64 => {
            debug!("decoding {} format {}", encoding, key);
            let bytes = BASE64
                .decode(data)
                .map_err(|e| decode_err(key, encoding, e))?;
            String::from_utf8(bytes).map_err(|e| decode_err(key, encoding, e))
        }
        Encoding::Plain => {
            debug!("plain-text data {}", key);
            Ok(data.to_string())
        }
    }
}

fn decode_err(key: &str, encoding: Encoding, err: impl fmt::Display) -> Error {
    Error::Decode {
        key: key.to_string(),
        encoding: encoding.as_str(),
        detail: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip_base64(text: &str) -> String {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(text.as_bytes()).unwrap();
        BASE64.encode(enc.finish().unwrap())
    }

    #[test]
    fn test_tag_parsing() {
        assert_eq!(Encoding::from_tag(None), Encoding::Plain);
        assert_eq!(Encoding::from_tag(Some("base64")), Encoding::Base64);
        assert_eq!(Encoding::from_tag(Some("b64")), Encoding::Base64);
        assert_eq!(Encoding::from_tag(Some("gzip+base64")), Encoding::GzipBase64);
        assert_eq!(Encoding::from_tag(Some("gz+b64")), Encoding::GzipBase64);
        // Unrecognized spellings silently mean plain text.
        assert_eq!(Encoding::from_tag(Some("Base64")), Encoding::Plain);
        assert_eq!(Encoding::from_tag(Some("gzip")), Encoding::Plain);
    }

    #[test]
    fn test_plain_passthrough() {
        let out = decode("guestinfo.userdata", Encoding::Plain, "#cloud-config\n").unwrap();
        assert_eq!(out, "#cloud-config\n");
    }

    #[test]
    fn test_base64_round_trip() {
        let text = "{\"local-hostname\": \"h1\"}";
        let data = BASE64.encode(text);
        let out = decode("guestinfo.metadata", Encoding::Base64, &data).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn test_gzip_base64_round_trip() {
        let text = "instance-id: iid-guestinfo\nlocal-hostname: h1\n";
        let data = gzip_base64(text);
        let out = decode("guestinfo.metadata", Encoding::GzipBase64, &data).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn test_malformed_base64() {
        let err = decode("guestinfo.metadata", Encoding::Base64, "!!not-base64!!").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "got: {err:?}");
    }

    #[test]
    fn test_corrupt_gzip() {
        // Valid base64, but the payload is not a gzip stream.
        let data = BASE64.encode("definitely not gzip");
        let err = decode("guestinfo.metadata", Encoding::GzipBase64, &data).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "got: {err:?}");
    }

    #[test]
    fn test_non_utf8_payload() {
        let data = BASE64.encode([0xff, 0xfe, 0x00, 0x01]);
        let err = decode("guestinfo.metadata", Encoding::Base64, &data).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "got: {err:?}");
    }
}
