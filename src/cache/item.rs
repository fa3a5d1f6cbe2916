//! Stored Item Module
//!
//! Defines the structure for individual cached illustration records.

use serde::{Deserialize, Serialize};

use crate::codec::DisplayHandle;
use crate::error::{CacheError, Result};

// == Item Kind ==
/// Discriminates how a stored payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Base64-encoded binary image data
    Image,
    /// JSON-serialized generation prompt
    Prompt,
}

impl ItemKind {
    /// Returns the stable string form used in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Image => "image",
            ItemKind::Prompt => "prompt",
        }
    }

    /// Parses the stored string form back into a kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(ItemKind::Image),
            "prompt" => Some(ItemKind::Prompt),
            _ => None,
        }
    }
}

// == Stored Item ==
/// One cached illustration or prompt record, keyed by job and segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredItem {
    /// Identifies the owning translation job
    pub job_id: String,
    /// Position within the job's segment sequence
    pub segment_index: u32,
    /// Payload interpretation
    pub kind: ItemKind,
    /// Base64-encoded binary (Image) or JSON-serialized object (Prompt)
    pub payload: String,
    /// MIME type, present only for Image payloads
    pub mime_type: Option<String>,
    /// Unix milliseconds of the most recent write for this key
    pub created_at: u64,
    /// Byte size of the payload as computed by the codec at write time
    pub size_bytes: u64,
}

impl StoredItem {
    // == Is Expired ==
    /// Checks whether the item's age exceeds the given TTL at time `now_ms`.
    ///
    /// An item is expired only when its age is strictly greater than
    /// `max_age_ms`; an item exactly at the limit is still live.
    pub fn is_expired(&self, now_ms: u64, max_age_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at) > max_age_ms
    }

    // == Display Handle ==
    /// Decodes an image payload into a renderable [`DisplayHandle`].
    ///
    /// The handle is revoked automatically when dropped. Calling this on
    /// a prompt record is a malformed-payload error.
    pub fn display_handle(&self) -> Result<DisplayHandle> {
        let key = format!("{}/{}", self.job_id, self.segment_index);
        if self.kind != ItemKind::Image {
            return Err(CacheError::MalformedPayload {
                key,
                reason: "prompt payload has no image to display".to_string(),
            });
        }
        DisplayHandle::from_base64(&self.payload, self.mime_type.as_deref(), &key)
    }

    // == Age ==
    /// Returns the item's age in milliseconds at time `now_ms`.
    ///
    /// Clamps to zero if the clock appears to have moved backwards.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
