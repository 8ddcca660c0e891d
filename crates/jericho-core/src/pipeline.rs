//! Data-URL validation pipeline
//!
//! size gate -> filename sanitation -> prefix parse -> base64 decode ->
//! codec decode/sniff -> extension cross-check -> re-encode -> assembly.
//!
//! The first three stages reject caller mistakes with a [`ValidationError`].
//! Every later stage reports data problems as [`ValidationResult::Invalid`].

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;

use crate::codec::{EncodeOptions, ImageCodec, StandardCodec};
use crate::error::{Rejection, ValidationError};
use crate::filename::sanitize_filename;
use crate::metadata::exif_field_count;
use crate::prefix::{PrefixMatch, parse_data_url};
use crate::types::{Dimensions, ValidImage, ValidationOptions, ValidationResult};

/// Standard alphabet, padding optional, non-zero trailing bits ignored
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Validates data-URL images against a fixed configuration
///
/// A `Validator` holds no mutable state. Share one across threads freely.
///
/// # Examples
///
/// ```rust
/// use jericho_core::{ValidationError, ValidationOptions, Validator};
///
/// let validator = Validator::new(ValidationOptions::default());
/// let err = validator.validate("not a data url", "image").unwrap_err();
/// assert_eq!(err, ValidationError::UnsupportedImageType);
/// ```
#[derive(Debug, Clone)]
pub struct Validator<C = StandardCodec> {
    options: ValidationOptions,
    codec: C,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationOptions::default())
    }
}

impl Validator {
    /// Create a validator using the `image`-backed [`StandardCodec`]
    pub fn new(options: ValidationOptions) -> Self {
        let codec = StandardCodec::new(&options);
        Self { options, codec }
    }
}

impl<C> Validator<C>
where
    C: ImageCodec,
{
    /// Create a validator around a custom codec
    ///
    /// Codec-level limits in `options` are only honoured if `codec` reads them.
    pub fn with_codec(options: ValidationOptions, codec: C) -> Self {
        Self { options, codec }
    }

    /// The options this validator was built with
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validate a data-URL image
    ///
    /// # Arguments
    /// * `input` - untrusted `data:image/<kind>;base64,<payload>` string
    /// * `filename` - desired filename; any extension is discarded
    ///
    /// # Returns
    /// * `Valid` with the canonical re-encoded image, or `Invalid` when the
    ///   payload is not a genuine image of the claimed type
    ///
    /// # Errors
    /// * `ImageTooLarge` - estimated decoded size exceeds `max_size_bytes`
    /// * `EmptyFileName` - nothing is left of `filename` after sanitation
    /// * `UnsupportedImageType` - `input` has no recognized data-URL prefix
    pub fn validate(
        &self,
        input: &str,
        filename: &str,
    ) -> Result<ValidationResult, ValidationError> {
        if let Err(e) = check_size(input, self.options.max_size_bytes) {
            tracing::debug!(target: "jericho_core::pipeline", "Rejecting input: {}", e);
            return Err(e);
        }

        let stem = sanitize_filename(filename)?;

        let matched = match parse_data_url(input)? {
            Some(matched) => matched,
            None => {
                tracing::debug!(
                    target: "jericho_core::pipeline",
                    "Invalid image: {}",
                    Rejection::EmptyPayload
                );
                return Ok(ValidationResult::Invalid);
            }
        };

        match self.canonicalize(&matched) {
            Ok((canonical_bytes, dimensions)) => {
                let base64_canonical = STANDARD.encode(&canonical_bytes);
                let image = ValidImage::assemble(
                    matched.extension,
                    &stem,
                    canonical_bytes,
                    base64_canonical,
                    dimensions,
                );
                tracing::debug!(
                    target: "jericho_core::pipeline",
                    "Validated {} ({}x{}, {} bytes canonical)",
                    image.filename(),
                    dimensions.width,
                    dimensions.height,
                    image.size_bytes()
                );
                Ok(ValidationResult::Valid(image))
            }
            Err(rejection) => {
                tracing::debug!(
                    target: "jericho_core::pipeline",
                    "Invalid image claiming '{}': {}",
                    matched.extension,
                    rejection
                );
                Ok(ValidationResult::Invalid)
            }
        }
    }

    /// Decode, sniff, cross-check and re-encode one payload
    fn canonicalize(&self, matched: &PrefixMatch<'_>) -> Result<(Vec<u8>, Dimensions), Rejection> {
        let bytes = decode_payload(matched.base64_payload)?;

        let decoded = self.codec.decode(&bytes).map_err(Rejection::Decode)?;

        if !decoded.format.accepts(matched.extension) {
            return Err(Rejection::FormatMismatch {
                claimed: matched.extension,
                detected: decoded.format,
            });
        }

        if let Some(fields) = exif_field_count(&bytes) {
            tracing::debug!(
                target: "jericho_core::pipeline",
                "Dropping {} EXIF fields from {} payload",
                fields,
                decoded.format
            );
        }

        let canonical = self
            .codec
            .encode(
                &decoded,
                decoded.format,
                EncodeOptions {
                    preserve_all_frames: self.options.preserve_all_frames,
                },
            )
            .map_err(Rejection::Encode)?;

        Ok((canonical, decoded.dimensions()))
    }
}

/// Validate a data-URL image with default codec limits
///
/// Shorthand for [`Validator::validate`] with `max_size_bytes` overridden.
/// The stock call is `validate(input, DEFAULT_FILENAME, Some(DEFAULT_MAX_SIZE_BYTES))`;
/// `None` disables the size gate.
pub fn validate(
    input: &str,
    filename: &str,
    max_size_bytes: Option<usize>,
) -> Result<ValidationResult, ValidationError> {
    Validator::new(ValidationOptions::with_max_size(max_size_bytes)).validate(input, filename)
}

/// Upper bound on the decoded size of `input`: `ceil(len * 3 / 4)`
///
/// Measured over the whole string, prefix included, so it never underestimates.
pub fn estimated_decoded_size(input: &str) -> usize {
    input.len().saturating_mul(3).div_ceil(4)
}

/// Reject inputs whose estimated decoded size exceeds `max_size_bytes`
fn check_size(input: &str, max_size_bytes: Option<usize>) -> Result<(), ValidationError> {
    let Some(max) = max_size_bytes else {
        return Ok(());
    };
    let estimated = estimated_decoded_size(input);
    if estimated > max {
        return Err(ValidationError::ImageTooLarge { estimated, max });
    }
    Ok(())
}

/// Base64-decode a payload, ignoring ASCII whitespace such as line wraps
fn decode_payload(payload: &str) -> Result<Vec<u8>, Rejection> {
    if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: Vec<u8> = payload
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        return Ok(PAYLOAD_ENGINE.decode(compact)?);
    }
    Ok(PAYLOAD_ENGINE.decode(payload)?)
}
