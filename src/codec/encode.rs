//! Payload Encoding Module
//!
//! Pure, synchronous transforms between wire payloads and byte sizes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::cache::ItemKind;
use crate::error::{CacheError, Result};

// == Size Estimation ==
/// Computes the byte size recorded for a payload at write time.
///
/// For base64 image payloads this is the decoded binary size,
/// `ceil(len * 3 / 4)`. For prompt payloads it is the UTF-8 byte
/// length of the JSON string itself.
pub fn encoded_size(payload: &str, kind: ItemKind) -> u64 {
    match kind {
        ItemKind::Image => ((payload.len() as u64) * 3).div_ceil(4),
        ItemKind::Prompt => payload.len() as u64,
    }
}

// == Base64 Decoding ==
/// Decodes a base64 image payload into raw bytes.
///
/// Malformed base64 is reported as an error, never a silent
/// zero-length result. `key` identifies the row for diagnostics.
pub fn decode_image(payload: &str, key: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(payload)
        .map_err(|e| CacheError::MalformedPayload {
            key: key.to_string(),
            reason: format!("invalid base64: {}", e),
        })
}

// == Prompt Validation ==
/// Parses a prompt payload into its structured JSON form.
///
/// A row that exists but no longer parses is a malformed-payload
/// error, not absence.
pub fn parse_prompt(payload: &str, key: &str) -> Result<serde_json::Value> {
    serde_json::from_str(payload).map_err(|e| CacheError::MalformedPayload {
        key: key.to_string(),
        reason: format!("invalid prompt JSON: {}", e),
    })
}
