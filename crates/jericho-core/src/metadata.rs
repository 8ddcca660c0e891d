//! EXIF inspection
//!
//! The canonical re-encode is what actually removes metadata. This module only
//! reports what was there so the pipeline can log it.

use std::io::Cursor;

use exif::Reader;

/// Number of EXIF fields embedded in `data`, or `None` if it carries no EXIF block
pub(crate) fn exif_field_count(data: &[u8]) -> Option<usize> {
    Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()
        .map(|exif| exif.fields().count())
}
