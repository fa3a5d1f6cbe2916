//! Display Handle Module
//!
//! Materializes decoded image bytes as a locally-addressable file the
//! rendering layer can load, with automatic revocation on drop.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::codec::encode::decode_image;
use crate::error::Result;

/// MIME type assumed for image payloads stored without one.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

// == Display Handle ==
/// A renderable reference to one decoded illustration.
///
/// The handle owns a named temporary file holding the decoded bytes;
/// the file is removed when the handle is dropped, so the reference is
/// revoked automatically when its owner goes away rather than by an
/// explicit caller-side release.
#[derive(Debug)]
pub struct DisplayHandle {
    file: NamedTempFile,
    mime_type: String,
    len: usize,
}

impl DisplayHandle {
    // == Constructor ==
    /// Decodes a base64 image payload and writes it to a temporary file.
    ///
    /// # Arguments
    /// * `payload_b64` - Base64-encoded image bytes
    /// * `mime_type` - Stored MIME type, or None for the default
    /// * `key` - Row identifier used in error diagnostics
    pub fn from_base64(payload_b64: &str, mime_type: Option<&str>, key: &str) -> Result<Self> {
        let bytes = decode_image(payload_b64, key)?;
        let mut file = NamedTempFile::new()?;
        file.write_all(&bytes)?;
        file.flush()?;

        Ok(Self {
            file,
            mime_type: mime_type.unwrap_or(DEFAULT_IMAGE_MIME).to_string(),
            len: bytes.len(),
        })
    }

    /// Filesystem path the renderer can load the image from.
    ///
    /// Valid only for the lifetime of the handle.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// MIME type of the decoded image.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Decoded image size in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the decoded image is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
