//! Validation and canonicalization of untrusted data-URL images
//!
//! This crate takes `data:image/<kind>;base64,<payload>` strings as submitted
//! by web clients, decides whether they really contain an image of the claimed
//! type, and re-encodes the ones that do into a fresh byte stream free of EXIF
//! and any bytes the decoder did not consume.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]
#![doc = include_str!("../README.md")]

pub mod codec;
pub mod error;
mod filename;
pub mod format;
mod metadata;
pub mod pipeline;
pub mod prefix;
#[cfg(test)]
pub mod test_util;
pub mod types;

pub use self::codec::{CodecError, DecodedImage, EncodeOptions, ImageCodec, Pixels, StandardCodec};
pub use self::error::ValidationError;
pub use self::format::{Extension, ImageKind};
pub use self::pipeline::{Validator, estimated_decoded_size, validate};
pub use self::prefix::{PrefixMatch, parse_data_url};
pub use self::types::{
    DEFAULT_FILENAME, DEFAULT_MAX_SIZE_BYTES, Dimensions, MAX_ANIMATION_FRAMES, MAX_IMAGE_DIMENSION,
    MAX_IMAGE_MEMORY_MB, MAX_IMAGE_PIXELS, StoreRecord, ValidImage, ValidationOptions,
    ValidationResult,
};
