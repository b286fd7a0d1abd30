//! Encoded image payloads attached to library assets and shots.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An image carried inline in project state.
///
/// `data` is standard base64 with no data-URL prefix.  The mime type
/// travels with the payload so a vault upload can set a matching
/// `Content-Type` without sniffing bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Base64-encoded image bytes.
    pub data: String,
    /// Mime type of the decoded bytes, e.g. `image/png`.
    pub mime_type: String,
    /// Optional display name (ad-hoc references are often unnamed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ImagePayload {
    /// Create an unnamed payload.
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
            name: None,
        }
    }

    /// Create a payload from raw bytes, encoding them as base64.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self::new(
            base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type,
        )
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Decode the base64 payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, CoreError> {
        base64::engine::general_purpose::STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| CoreError::Validation(format!("Invalid base64 image data: {e}")))
    }
}
