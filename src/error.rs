//! Error types for the illustration cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the illustration cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The environment has no usable persistent-storage capability.
    ///
    /// Callers are expected to skip cache operations entirely when this
    /// is reported; every cache failure degrades to a cache miss.
    #[error("Persistent storage unavailable: {0}")]
    Unsupported(String),

    /// Opening the store failed: path creation, handle acquisition,
    /// corruption, or a schema version newer than this build understands.
    #[error("Failed to open cache store: {0}")]
    StoreOpen(String),

    /// An individual store transaction aborted without committing.
    #[error("Cache transaction failed: {0}")]
    Transaction(#[from] rusqlite::Error),

    /// A stored payload is unusable: base64 that does not decode, or a
    /// prompt row whose JSON no longer parses. The row still exists.
    #[error("Malformed payload for {key}: {reason}")]
    MalformedPayload { key: String, reason: String },

    /// I/O failure while materializing a display handle.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the illustration cache.
pub type Result<T> = std::result::Result<T, CacheError>;
