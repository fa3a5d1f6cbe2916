//! Codec Module
//!
//! Pure transforms at the cache's read/write boundary: payload size
//! estimation, base64 decoding, prompt validation, and display handles.

mod display;
mod encode;

pub use display::{DisplayHandle, DEFAULT_IMAGE_MIME};
pub use encode::{decode_image, encoded_size, parse_prompt};
