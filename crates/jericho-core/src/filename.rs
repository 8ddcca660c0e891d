//! Caller-supplied filename sanitation

use crate::error::ValidationError;

/// Reduce a caller-supplied filename to a safe stem
///
/// Everything from the first `.` on is dropped, so a caller can never choose
/// the extension. Only printable ASCII (graphic characters and space) is kept.
///
/// # Errors
/// * `EmptyFileName` - nothing usable is left
pub(crate) fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let stem = filename
        .split_once('.')
        .map_or(filename, |(stem, _)| stem);

    if stem.is_empty() {
        return Err(ValidationError::EmptyFileName);
    }

    let printable: String = stem
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();

    if printable.is_empty() {
        return Err(ValidationError::EmptyFileName);
    }

    Ok(printable)
}
