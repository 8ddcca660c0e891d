//! Jericho errors
//!
//! Only caller-contract violations are errors. A payload that merely fails to
//! be a valid image is reported as [`ValidationResult::Invalid`](crate::ValidationResult::Invalid).

/// Caller-contract violation raised by [`Validator::validate`](crate::Validator::validate)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Input exceeds the configured byte budget (checked before any decoding)
    #[error("Encoded image of ~{estimated} bytes exceeds maximum allowed size {max}")]
    ImageTooLarge {
        /// Estimated decoded size of the whole input
        estimated: usize,
        /// The configured maximum
        max: usize,
    },

    /// Filename is empty once its extension and unprintable characters are removed
    #[error("Filename cannot be empty")]
    EmptyFileName,

    /// Input does not start with any recognized `data:image/...;base64,` prefix
    #[error("Image type not supported")]
    UnsupportedImageType,
}

/// Why a candidate payload was turned into `Invalid`
///
/// Never returned to callers; it only feeds the debug log.
#[derive(Debug, thiserror::Error)]
pub(crate) enum Rejection {
    #[error("empty payload after data-URL prefix")]
    EmptyPayload,

    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("codec could not decode payload: {0}")]
    Decode(#[source] crate::codec::CodecError),

    #[error("prefix claims '{claimed}' but bytes are {detected}")]
    FormatMismatch {
        claimed: crate::format::Extension,
        detected: crate::format::ImageKind,
    },

    #[error("codec could not re-encode image: {0}")]
    Encode(#[source] crate::codec::CodecError),
}
