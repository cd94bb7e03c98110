//! Default content keyword bindings.
//!
//! The compiler binds decoder and media type predicates onto schema nodes;
//! these are the stock implementations for the encodings the drafts name.

use crate::schema::{BoxError, ContentEncoding, ContentMediaType};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

/// Decode a base64 string into bytes.
pub fn from_base64(value: &str) -> Result<Vec<u8>, BoxError> {
    Ok(STANDARD.decode(value)?)
}

/// Check that the content is valid JSON.
pub fn is_json_media_type(content: &[u8]) -> Result<(), BoxError> {
    serde_json::from_slice::<serde_json::Value>(content)?;
    Ok(())
}

impl ContentEncoding {
    /// The stock `base64` binding.
    pub fn base64() -> ContentEncoding {
        ContentEncoding {
            name: "base64".to_string(),
            decode: Arc::new(from_base64),
        }
    }
}

impl ContentMediaType {
    /// The stock `application/json` binding.
    pub fn application_json() -> ContentMediaType {
        ContentMediaType {
            name: "application/json".to_string(),
            check: Arc::new(is_json_media_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{from_base64, is_json_media_type};

    #[test]
    fn decodes_base64() {
        assert_eq!(from_base64("aGVsbG8=").unwrap(), b"hello");
        assert!(from_base64("not base64!").is_err());
    }

    #[test]
    fn checks_json() {
        assert!(is_json_media_type(br#"{"a": 1}"#).is_ok());
        assert!(is_json_media_type(b"{").is_err());
    }
}
