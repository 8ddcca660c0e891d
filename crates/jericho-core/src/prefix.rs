//! Data-URL prefix recognition

use crate::error::ValidationError;
use crate::format::Extension;

/// A recognized data-URL prefix and the payload that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMatch<'a> {
    /// The exact prefix that matched, e.g. `data:image/png;base64,`
    pub format_prefix: &'static str,
    /// Extension the prefix claims
    pub extension: Extension,
    /// Everything after the prefix; never empty
    pub base64_payload: &'a str,
}

/// Strip a known `data:image/<kind>;base64,` prefix from `input`
///
/// Prefixes are tried in [`Extension::ALL`] order and the first match wins.
/// Matching is exact and case-sensitive.
///
/// # Returns
/// * `Ok(Some(_))` - a prefix matched and a payload follows it
/// * `Ok(None)` - a prefix matched but nothing follows it
///
/// # Errors
/// * `UnsupportedImageType` - no known prefix matched
pub fn parse_data_url(input: &str) -> Result<Option<PrefixMatch<'_>>, ValidationError> {
    for extension in Extension::ALL {
        let format_prefix = extension.data_url_prefix();
        if let Some(base64_payload) = input.strip_prefix(format_prefix) {
            if base64_payload.is_empty() {
                return Ok(None);
            }
            return Ok(Some(PrefixMatch {
                format_prefix,
                extension,
                base64_payload,
            }));
        }
    }

    Err(ValidationError::UnsupportedImageType)
}
