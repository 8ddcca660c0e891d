//! Shared types and constants for data-URL validation

use serde::{Deserialize, Serialize};

use crate::format::Extension;

/// Default cap on the estimated decoded size of an input (10 MiB)
pub const DEFAULT_MAX_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Filename stem used when the caller has nothing better
pub const DEFAULT_FILENAME: &str = "image";

/// Maximum image dimension (width or height)
pub const MAX_IMAGE_DIMENSION: u32 = 16384;

/// Maximum total pixels allowed in an image (50 million pixels)
/// This prevents decompression bombs. For animations the limit applies to the
/// sum over all frames.
pub const MAX_IMAGE_PIXELS: u64 = 50_000_000;

/// Maximum memory allowed for decoded images in MB (256MB)
pub const MAX_IMAGE_MEMORY_MB: u64 = 256;

/// Maximum number of frames decoded from an animation
pub const MAX_ANIMATION_FRAMES: usize = 512;

/// Options for data-URL validation
///
/// All fields have secure defaults; override only what you need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Cap on the estimated decoded size of the raw input; `None` disables the gate
    pub max_size_bytes: Option<usize>,
    /// Maximum allowed width or height (default: uses MAX_IMAGE_DIMENSION)
    pub max_dimension: Option<u32>,
    /// Maximum decoded pixel count (default: uses MAX_IMAGE_PIXELS)
    pub max_pixels: u64,
    /// Maximum number of animation frames (default: uses MAX_ANIMATION_FRAMES)
    pub max_frames: usize,
    /// Keep every frame of animated images when re-encoding (default: true)
    pub preserve_all_frames: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: Some(DEFAULT_MAX_SIZE_BYTES),
            max_dimension: Some(MAX_IMAGE_DIMENSION),
            max_pixels: MAX_IMAGE_PIXELS,
            max_frames: MAX_ANIMATION_FRAMES,
            preserve_all_frames: true,
        }
    }
}

impl ValidationOptions {
    /// Options with the byte-size gate disabled
    ///
    /// Codec limits (dimensions, pixels, frames) still apply.
    pub fn unbounded() -> Self {
        Self {
            max_size_bytes: None,
            ..Default::default()
        }
    }

    /// Default options with a specific byte-size cap (`None` disables the gate)
    pub fn with_max_size(max_size_bytes: Option<usize>) -> Self {
        Self {
            max_size_bytes,
            ..Default::default()
        }
    }
}

/// Pixel dimensions of a validated image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Persistence-ready projection of a validated image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    /// Canonical data URL: original prefix followed by the re-encoded base64
    pub data_url: String,
    /// Final filename, always ending in `.{extension}`
    pub filename: String,
    /// Image dimensions
    pub dimensions: Dimensions,
}

/// A payload that passed validation, in canonical re-encoded form
///
/// Only the pipeline can build one, so the following always hold:
/// `size_bytes() == canonical_bytes().len()`, `filename()` ends with
/// `.{extension}`, and `store_record().data_url` is `format_prefix()`
/// followed by `base64_canonical()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidImage {
    extension: Extension,
    filename: String,
    canonical_bytes: Vec<u8>,
    dimensions: Dimensions,
    base64_canonical: String,
    store_record: StoreRecord,
}

impl ValidImage {
    /// Assemble the final value from fully-resolved parts
    pub(crate) fn assemble(
        extension: Extension,
        stem: &str,
        canonical_bytes: Vec<u8>,
        base64_canonical: String,
        dimensions: Dimensions,
    ) -> Self {
        let filename = format!("{stem}.{extension}");
        let store_record = StoreRecord {
            data_url: format!("{}{}", extension.data_url_prefix(), base64_canonical),
            filename: filename.clone(),
            dimensions,
        };
        Self {
            extension,
            filename,
            canonical_bytes,
            dimensions,
            base64_canonical,
            store_record,
        }
    }

    /// Extension claimed by the prefix and confirmed by sniffing
    pub fn extension(&self) -> Extension {
        self.extension
    }

    /// The data-URL prefix the payload arrived with
    pub fn format_prefix(&self) -> &'static str {
        self.extension.data_url_prefix()
    }

    /// Sanitized filename with the confirmed extension appended
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Re-encoded image bytes
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.canonical_bytes
    }

    /// Length of [`canonical_bytes`](Self::canonical_bytes)
    pub fn size_bytes(&self) -> usize {
        self.canonical_bytes.len()
    }

    /// Pixel dimensions reported by the decoder
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Standard, padded base64 of the canonical bytes
    pub fn base64_canonical(&self) -> &str {
        &self.base64_canonical
    }

    /// Record ready to hand to a persistence layer
    pub fn store_record(&self) -> &StoreRecord {
        &self.store_record
    }

    /// Take ownership of the store record
    pub fn into_store_record(self) -> StoreRecord {
        self.store_record
    }
}

/// Outcome of validating one candidate payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The payload is a genuine image of the claimed type
    Valid(ValidImage),
    /// The payload looked like a data URL but is not a valid image of the claimed type
    Invalid,
}

impl ValidationResult {
    /// Whether the payload passed validation
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Borrow the validated image, if any
    pub fn as_valid(&self) -> Option<&ValidImage> {
        match self {
            Self::Valid(image) => Some(image),
            Self::Invalid => None,
        }
    }

    /// Take the validated image, if any
    pub fn into_valid(self) -> Option<ValidImage> {
        match self {
            Self::Valid(image) => Some(image),
            Self::Invalid => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_options_default() {
        let options = ValidationOptions::default();
        assert_eq!(options.max_size_bytes, Some(DEFAULT_MAX_SIZE_BYTES));
        assert_eq!(options.max_size_bytes, Some(10_485_760));
        assert_eq!(options.max_dimension, Some(MAX_IMAGE_DIMENSION));
        assert_eq!(options.max_pixels, MAX_IMAGE_PIXELS);
        assert_eq!(options.max_frames, MAX_ANIMATION_FRAMES);
        assert!(options.preserve_all_frames);
    }

    #[test]
    fn test_validation_options_unbounded() {
        let options = ValidationOptions::unbounded();
        assert_eq!(options.max_size_bytes, None);
        assert_eq!(options.max_dimension, Some(MAX_IMAGE_DIMENSION));
        assert_eq!(options.max_pixels, MAX_IMAGE_PIXELS);
    }

    #[test]
    fn test_valid_image_invariants() {
        let image = ValidImage::assemble(
            Extension::Png,
            "photo",
            vec![1, 2, 3, 4],
            "AQIDBA==".to_string(),
            Dimensions::from((3, 2)),
        );
        assert_eq!(image.filename(), "photo.png");
        assert_eq!(image.size_bytes(), image.canonical_bytes().len());
        assert_eq!(image.format_prefix(), "data:image/png;base64,");
        assert_eq!(
            image.store_record().data_url,
            "data:image/png;base64,AQIDBA=="
        );
        assert_eq!(image.store_record().filename, image.filename());
        assert_eq!(
            image.store_record().dimensions,
            Dimensions {
                width: 3,
                height: 2
            }
        );
    }

    #[test]
    fn test_store_record_serializes_camel_case() {
        let record = StoreRecord {
            data_url: "data:image/gif;base64,R0lG".to_string(),
            filename: "image.gif".to_string(),
            dimensions: Dimensions {
                width: 1,
                height: 1,
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["dataUrl"], "data:image/gif;base64,R0lG");
        assert_eq!(value["filename"], "image.gif");
        assert_eq!(value["dimensions"]["width"], 1);
        assert_eq!(value["dimensions"]["height"], 1);

        let back: StoreRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_validation_result_accessors() {
        assert!(!ValidationResult::Invalid.is_valid());
        assert!(ValidationResult::Invalid.as_valid().is_none());
        assert!(ValidationResult::Invalid.into_valid().is_none());
    }
}
