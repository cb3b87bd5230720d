//! Data-URL codec for image payloads
//!
//! Images cross every boundary in this app as self-describing strings of the
//! form `data:<mime>;base64,<payload>`. These helpers split that form apart
//! for provider requests and reassemble it from provider responses.

use crate::{Error, Result};
use base64::Engine as _;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// One image pulled out of a data URL: its MIME type and base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub base64_data: String,
}

/// Parses a `data:<mime>;base64,<payload>` string.
pub fn decode(data_url: &str) -> Result<ImagePayload> {
    let rest = data_url
        .strip_prefix(DATA_PREFIX)
        .ok_or_else(|| Error::MalformedImage("missing data: prefix".to_string()))?;

    let (mime_type, base64_data) = rest
        .split_once(BASE64_MARKER)
        .ok_or_else(|| Error::MalformedImage("missing ;base64, separator".to_string()))?;

    if mime_type.is_empty() {
        return Err(Error::MalformedImage("empty MIME type".to_string()));
    }

    Ok(ImagePayload {
        mime_type: mime_type.to_string(),
        base64_data: base64_data.to_string(),
    })
}

/// Inverse of [`decode`] for an already-base64 payload.
pub fn encode(mime_type: &str, base64_data: &str) -> String {
    format!("{}{}{}{}", DATA_PREFIX, mime_type, BASE64_MARKER, base64_data)
}

/// Encodes raw image bytes as a data URL.
pub fn encode_bytes(mime_type: &str, bytes: &[u8]) -> String {
    encode(
        mime_type,
        &base64::engine::general_purpose::STANDARD.encode(bytes),
    )
}

impl ImagePayload {
    /// Decodes the base64 payload back into raw bytes.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.base64_data)
            .map_err(|e| Error::MalformedImage(format!("invalid base64 payload: {}", e)))
    }
}
