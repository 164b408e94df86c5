//! Binary assets referenced by elements through their asset id.

use crate::document::DocumentError;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// An asset payload: a MIME type and the bytes as base64.
///
/// The core never decodes image formats and never garbage-collects assets; unused
/// entries stay in the map until the host removes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// MIME type, e.g. `image/png`.
    #[serde(rename = "type")]
    pub mime: String,
    /// Base64-encoded payload.
    pub data: String,
}

impl Asset {
    pub fn from_bytes(mime: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime: mime.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Decode the payload.
    pub fn decode(&self) -> Result<Vec<u8>, DocumentError> {
        STANDARD
            .decode(&self.data)
            .map_err(|err| DocumentError::InvalidAsset(err.to_string()))
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    /// Approximate size of the decoded payload in bytes.
    pub fn data_size(&self) -> usize {
        self.data.len() * 3 / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload() {
        let asset = Asset::from_bytes("image/png", &[0x89, b'P', b'N', b'G']);
        assert!(asset.is_image());
        assert_eq!(asset.decode().unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_invalid_payload() {
        let asset = Asset {
            mime: "image/png".to_string(),
            data: "not base64!".to_string(),
        };
        assert!(matches!(asset.decode(), Err(DocumentError::InvalidAsset(_))));
    }

    #[test]
    fn test_serialized_shape() {
        let asset = Asset::from_bytes("image/jpeg", b"abc");
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["type"], "image/jpeg");
        assert_eq!(json["data"], "YWJj");
    }
}
