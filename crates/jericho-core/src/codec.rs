//! Image codec seam
//!
//! The pipeline never touches pixel formats directly. It asks an
//! [`ImageCodec`] to decode bytes (sniffing the real format on the way) and to
//! re-encode the decoded pixels into a fresh byte stream. [`StandardCodec`] is
//! the default implementation, backed by the `image` crate and hardened
//! against decompression bombs.

use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, ColorType, DynamicImage, Frame, ImageDecoder, ImageReader, Limits};

use crate::format::ImageKind;
use crate::types::{
    Dimensions, MAX_ANIMATION_FRAMES, MAX_IMAGE_DIMENSION, MAX_IMAGE_MEMORY_MB, MAX_IMAGE_PIXELS,
    ValidationOptions,
};

/// Errors reported by an [`ImageCodec`]
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The bytes do not start with any recognizable image signature
    #[error("Could not detect image format: {reason}")]
    UnknownFormat {
        /// What went wrong while sniffing
        reason: String,
    },

    /// The bytes are an image, but of a format this crate does not accept
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat {
        /// Name of the detected format
        format: String,
    },

    /// Image dimensions are too large
    #[error("Image dimensions {width}x{height} exceed maximum {max_dimension}")]
    DimensionsTooLarge {
        /// The image width in pixels
        width: u32,
        /// The image height in pixels
        height: u32,
        /// The maximum allowed dimension
        max_dimension: u32,
    },

    /// Image has too many pixels (decompression bomb protection)
    #[error("Image has {total_pixels} pixels, exceeding maximum {max_pixels}")]
    TooManyPixels {
        /// Total number of pixels, summed over frames
        total_pixels: u64,
        /// Maximum allowed pixels
        max_pixels: u64,
    },

    /// Image would require too much memory to decode (decompression bomb protection)
    #[error("Image would require {estimated_mb}MB to decode, exceeding maximum {max_mb}MB")]
    MemoryTooLarge {
        /// Estimated memory requirement in MB
        estimated_mb: u64,
        /// Maximum allowed memory in MB
        max_mb: u64,
    },

    /// Animation has more frames than allowed
    #[error("Animation has more than {max_frames} frames")]
    TooManyFrames {
        /// Maximum allowed frames
        max_frames: usize,
    },

    /// Pixel data could not be decoded
    #[error("Failed to decode image: {reason}")]
    DecodeFailed {
        /// The underlying decoder error
        reason: String,
    },

    /// Pixel data could not be re-encoded
    #[error("Failed to encode {format}: {reason}")]
    EncodeFailed {
        /// Target format
        format: ImageKind,
        /// The underlying encoder error
        reason: String,
    },
}

/// Decoded pixel data
#[derive(Clone)]
pub enum Pixels {
    /// A single still image
    Still(DynamicImage),
    /// Every frame of an animation, composited onto the full canvas
    Animated(Vec<Frame>),
}

impl fmt::Debug for Pixels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Still(img) => f.debug_tuple("Still").field(img).finish(),
            Self::Animated(frames) => f
                .debug_struct("Animated")
                .field("frames", &frames.len())
                .finish(),
        }
    }
}

impl Pixels {
    /// Number of frames held
    pub fn frame_count(&self) -> usize {
        match self {
            Self::Still(_) => 1,
            Self::Animated(frames) => frames.len(),
        }
    }

    /// The first (or only) frame as a still image
    pub fn first_frame(&self) -> Option<Cow<'_, DynamicImage>> {
        match self {
            Self::Still(img) => Some(Cow::Borrowed(img)),
            Self::Animated(frames) => frames
                .first()
                .map(|frame| Cow::Owned(DynamicImage::ImageRgba8(frame.buffer().clone()))),
        }
    }
}

/// Result of a successful [`ImageCodec::decode`]
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Format sniffed from the bytes, independent of any claim
    pub format: ImageKind,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Decoded pixels
    pub pixels: Pixels,
}

impl DecodedImage {
    /// Width and height as [`Dimensions`]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

/// Options for [`ImageCodec::encode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Write every frame of an animation instead of only the first
    pub preserve_all_frames: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            preserve_all_frames: true,
        }
    }
}

/// Capability the validation pipeline needs from an image library
///
/// Implementations must sniff the format from the bytes (never from outside
/// hints) and must enforce their own resource limits, reporting a violation
/// as an error rather than aborting.
pub trait ImageCodec {
    /// Decode `data`, detecting its real format
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, CodecError>;

    /// Encode `image` into a fresh byte stream of `format`
    fn encode(
        &self,
        image: &DecodedImage,
        format: ImageKind,
        options: EncodeOptions,
    ) -> Result<Vec<u8>, CodecError>;
}

/// [`ImageCodec`] backed by the `image` crate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardCodec {
    max_dimension: Option<u32>,
    max_pixels: u64,
    max_frames: usize,
}

impl Default for StandardCodec {
    fn default() -> Self {
        Self {
            max_dimension: Some(MAX_IMAGE_DIMENSION),
            max_pixels: MAX_IMAGE_PIXELS,
            max_frames: MAX_ANIMATION_FRAMES,
        }
    }
}

impl StandardCodec {
    /// Create a codec enforcing the limits in `options`
    pub fn new(options: &ValidationOptions) -> Self {
        Self {
            max_dimension: options.max_dimension,
            max_pixels: options.max_pixels,
            max_frames: options.max_frames,
        }
    }

    /// Validate image dimensions against limits
    ///
    /// `frames` is the number of full canvases that will be held in memory at
    /// once, so an animation is budgeted as `frames * width * height` pixels.
    fn check_dimensions(&self, width: u32, height: u32, frames: u64) -> Result<(), CodecError> {
        if let Some(max_dim) = self.max_dimension
            && (width > max_dim || height > max_dim)
        {
            return Err(CodecError::DimensionsTooLarge {
                width,
                height,
                max_dimension: max_dim,
            });
        }

        let total_pixels = (width as u64)
            .saturating_mul(height as u64)
            .saturating_mul(frames);
        if total_pixels > self.max_pixels {
            return Err(CodecError::TooManyPixels {
                total_pixels,
                max_pixels: self.max_pixels,
            });
        }

        // RGBA, rounded up
        let estimated_mb = total_pixels.saturating_mul(4).div_ceil(1024 * 1024);
        if estimated_mb > MAX_IMAGE_MEMORY_MB {
            return Err(CodecError::MemoryTooLarge {
                estimated_mb,
                max_mb: MAX_IMAGE_MEMORY_MB,
            });
        }

        Ok(())
    }

    /// Decoder limits matching the pixel budget, enforced inside the `image` crate
    fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = self.max_dimension;
        limits.max_image_height = self.max_dimension;
        limits.max_alloc = Some(MAX_IMAGE_MEMORY_MB * 1024 * 1024);
        limits
    }

    fn decode_still(
        &self,
        data: &[u8],
        format: image::ImageFormat,
    ) -> Result<DynamicImage, CodecError> {
        let mut reader = ImageReader::with_format(Cursor::new(data), format);
        reader.limits(self.limits());
        reader.decode().map_err(decode_failed)
    }

    fn decode_animation(&self, data: &[u8], width: u32, height: u32) -> Result<Pixels, CodecError> {
        let mut decoder = GifDecoder::new(Cursor::new(data)).map_err(decode_failed)?;
        decoder.set_limits(self.limits()).map_err(decode_failed)?;

        let mut frames = Vec::new();
        for frame in decoder.into_frames() {
            if frames.len() == self.max_frames {
                return Err(CodecError::TooManyFrames {
                    max_frames: self.max_frames,
                });
            }
            self.check_dimensions(width, height, frames.len() as u64 + 1)?;
            frames.push(frame.map_err(decode_failed)?);
        }

        if frames.is_empty() {
            return Err(CodecError::DecodeFailed {
                reason: "animation contains no frames".to_string(),
            });
        }

        Ok(Pixels::Animated(frames))
    }
}

impl ImageCodec for StandardCodec {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, CodecError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| CodecError::UnknownFormat {
                reason: e.to_string(),
            })?;

        let detected = reader.format().ok_or_else(|| CodecError::UnknownFormat {
            reason: "no known image signature".to_string(),
        })?;
        let format =
            ImageKind::from_image_format(detected).ok_or_else(|| CodecError::UnsupportedFormat {
                format: format!("{:?}", detected),
            })?;

        // Header-only preflight, rejects bombs before any pixel buffer exists
        let (width, height) = reader.into_dimensions().map_err(decode_failed)?;
        self.check_dimensions(width, height, 1)?;

        let pixels = match format {
            ImageKind::Gif => self.decode_animation(data, width, height)?,
            _ => Pixels::Still(self.decode_still(data, detected)?),
        };

        let (width, height) = match &pixels {
            Pixels::Still(img) => (img.width(), img.height()),
            Pixels::Animated(_) => (width, height),
        };

        Ok(DecodedImage {
            format,
            width,
            height,
            pixels,
        })
    }

    fn encode(
        &self,
        image: &DecodedImage,
        format: ImageKind,
        options: EncodeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        if let (Pixels::Animated(frames), ImageKind::Gif) = (&image.pixels, format)
            && options.preserve_all_frames
        {
            return encode_animation(frames);
        }

        let still = image
            .pixels
            .first_frame()
            .ok_or_else(|| CodecError::EncodeFailed {
                format,
                reason: "no pixel data".to_string(),
            })?;
        encode_still(&still, format)
    }
}

fn decode_failed(e: image::ImageError) -> CodecError {
    CodecError::DecodeFailed {
        reason: e.to_string(),
    }
}

fn encode_failed(format: ImageKind) -> impl FnOnce(image::ImageError) -> CodecError {
    move |e| CodecError::EncodeFailed {
        format,
        reason: e.to_string(),
    }
}

fn encode_still(img: &DynamicImage, format: ImageKind) -> Result<Vec<u8>, CodecError> {
    let prepared = prepare_for_encoding(img, format);
    let mut output = Cursor::new(Vec::new());
    prepared
        .write_to(&mut output, format.to_image_format())
        .map_err(encode_failed(format))?;
    Ok(output.into_inner())
}

fn encode_animation(frames: &[Frame]) -> Result<Vec<u8>, CodecError> {
    let mut output = Vec::new();
    {
        // The trailer is written when the encoder drops
        let mut encoder = GifEncoder::new(&mut output);
        if frames.len() > 1 {
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(encode_failed(ImageKind::Gif))?;
        }
        encoder
            .encode_frames(frames.iter().cloned())
            .map_err(encode_failed(ImageKind::Gif))?;
    }
    Ok(output)
}

/// Convert `img` to a colour type the target encoder can write
fn prepare_for_encoding(img: &DynamicImage, format: ImageKind) -> Cow<'_, DynamicImage> {
    let color = img.color();
    let supported = match format {
        ImageKind::Jpeg => matches!(color, ColorType::L8 | ColorType::Rgb8),
        ImageKind::Png => !matches!(color, ColorType::Rgb32F | ColorType::Rgba32F),
        ImageKind::Tiff => matches!(
            color,
            ColorType::L8
                | ColorType::Rgb8
                | ColorType::Rgba8
                | ColorType::L16
                | ColorType::Rgb16
                | ColorType::Rgba16
        ),
        ImageKind::Bmp => matches!(
            color,
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
        ),
        ImageKind::Gif | ImageKind::WebP => matches!(color, ColorType::Rgb8 | ColorType::Rgba8),
        ImageKind::Ico => matches!(color, ColorType::Rgba8),
    };

    if supported {
        return Cow::Borrowed(img);
    }

    // JPEG has no alpha channel; ICO is always written as RGBA
    let converted = match format {
        ImageKind::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        ImageKind::Ico => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ if color.has_alpha() => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    };
    Cow::Owned(converted)
}
