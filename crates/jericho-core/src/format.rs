//! Claimed extensions, sniffed formats and the equivalence between them
//!
//! A data URL *claims* an [`Extension`] through its MIME prefix. The codec
//! *detects* an [`ImageKind`] from the bytes themselves. The two only agree
//! when the extension belongs to the kind's equivalence class, which is how
//! type-confusion payloads (GIF bytes behind a PNG prefix and the like) are
//! caught.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Structural image format as detected from the decoded bytes
///
/// Codec labels that are aliases of one another collapse into a single kind:
/// `JPG`/`JPEG` are both [`ImageKind::Jpeg`], `TIF`/`TIFF` are both
/// [`ImageKind::Tiff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// Portable Network Graphics
    Png,
    /// JPEG (JFIF/EXIF)
    Jpeg,
    /// Graphics Interchange Format, possibly animated
    Gif,
    /// Windows bitmap
    Bmp,
    /// Windows icon. Detected, but no accepted prefix maps to it.
    Ico,
    /// Tagged Image File Format
    Tiff,
    /// WebP
    WebP,
}

impl ImageKind {
    /// Map a format reported by the `image` crate onto a known kind
    ///
    /// Returns `None` for formats this crate does not accept at all (TGA, DDS,
    /// HDR, ...), which the pipeline treats the same as an undecodable payload.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::Bmp => Some(Self::Bmp),
            image::ImageFormat::Ico => Some(Self::Ico),
            image::ImageFormat::Tiff => Some(Self::Tiff),
            image::ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }

    /// The `image` crate format used to re-encode this kind
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Gif => image::ImageFormat::Gif,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Ico => image::ImageFormat::Ico,
            Self::Tiff => image::ImageFormat::Tiff,
            Self::WebP => image::ImageFormat::WebP,
        }
    }

    /// Canonical upper-case label
    pub fn label(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
            Self::Ico => "ICO",
            Self::Tiff => "TIFF",
            Self::WebP => "WEBP",
        }
    }

    /// Whether a payload claiming `extension` may legitimately contain this kind
    pub fn accepts(self, extension: Extension) -> bool {
        extension.kind() == self
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// File extension claimed by a recognized data-URL prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    /// `data:image/jpeg;base64,`
    Jpeg,
    /// `data:image/jpg;base64,`
    Jpg,
    /// `data:image/png;base64,`
    Png,
    /// `data:image/gif;base64,`
    Gif,
    /// `data:image/bmp;base64,`
    Bmp,
    /// `data:image/tiff;base64,`
    Tiff,
    /// `data:image/webp;base64,`
    Webp,
}

impl Extension {
    /// Every accepted extension, in prefix-matching priority order
    pub const ALL: [Extension; 7] = [
        Extension::Jpeg,
        Extension::Jpg,
        Extension::Png,
        Extension::Gif,
        Extension::Bmp,
        Extension::Tiff,
        Extension::Webp,
    ];

    /// Lower-case extension without the leading dot
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Webp => "webp",
        }
    }

    /// The exact, case-sensitive data-URL prefix announcing this extension
    pub fn data_url_prefix(self) -> &'static str {
        match self {
            Self::Jpeg => "data:image/jpeg;base64,",
            Self::Jpg => "data:image/jpg;base64,",
            Self::Png => "data:image/png;base64,",
            Self::Gif => "data:image/gif;base64,",
            Self::Bmp => "data:image/bmp;base64,",
            Self::Tiff => "data:image/tiff;base64,",
            Self::Webp => "data:image/webp;base64,",
        }
    }

    /// The equivalence class this extension belongs to
    pub fn kind(self) -> ImageKind {
        match self {
            Self::Jpeg | Self::Jpg => ImageKind::Jpeg,
            Self::Png => ImageKind::Png,
            Self::Gif => ImageKind::Gif,
            Self::Bmp => ImageKind::Bmp,
            Self::Tiff => ImageKind::Tiff,
            Self::Webp => ImageKind::WebP,
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the accepted extensions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown image extension: {0}")]
pub struct UnknownExtension(pub String);

impl FromStr for Extension {
    type Err = UnknownExtension;

    /// Parses `png`, `.PNG`, `jpg` and so on. `tif` is read as [`Extension::Tiff`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "jpeg" => Ok(Self::Jpeg),
            "jpg" => Ok(Self::Jpg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "bmp" => Ok(Self::Bmp),
            "tiff" | "tif" => Ok(Self::Tiff),
            "webp" => Ok(Self::Webp),
            _ => Err(UnknownExtension(s.to_string())),
        }
    }
}
