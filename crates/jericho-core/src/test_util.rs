//! Test utilities for the jericho-core crate
//!
//! Fixture builders shared by the unit tests: small synthetic images in every
//! accepted format, data-URL wrapping, and a JPEG carrying an EXIF block.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};

use crate::format::{Extension, ImageKind};

/// RGB gradient, distinct per pixel for small sizes
pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 32) as u8, (y * 32) as u8, ((x + y) * 16) as u8])
    })
}

/// Opaque RGBA gradient
pub fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x * 32) as u8, (y * 32) as u8, ((x + y) * 16) as u8, 255])
    })
}

/// Encode `img` as `format` with the `image` crate directly
pub fn encode_fixture(img: &DynamicImage, format: ImageKind) -> Vec<u8> {
    let img = match format {
        ImageKind::Gif | ImageKind::Ico => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => img.clone(),
    };
    let mut data = Vec::new();
    img.write_to(&mut Cursor::new(&mut data), format.to_image_format())
        .unwrap();
    data
}

/// Create a test PNG image with specified dimensions
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_fixture(
        &DynamicImage::ImageRgb8(gradient_rgb(width, height)),
        ImageKind::Png,
    )
}

/// Create a test JPEG image with specified dimensions
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_fixture(
        &DynamicImage::ImageRgb8(gradient_rgb(width, height)),
        ImageKind::Jpeg,
    )
}

/// Create a single-frame test GIF with specified dimensions
pub fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_fixture(
        &DynamicImage::ImageRgb8(gradient_rgb(width, height)),
        ImageKind::Gif,
    )
}

/// Create an animated GIF whose frames are solid, distinct colours
pub fn animated_gif_bytes(frames: u8, width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut data);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        let frames = (0..frames).map(|i| {
            let buffer =
                ImageBuffer::from_pixel(width, height, Rgba([i.wrapping_mul(40), 0, 255, 255]));
            Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }
    data
}

/// Build a minimal EXIF APP1 segment holding a single Orientation tag
fn exif_app1_segment() -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II*\0"); // little-endian TIFF header
    tiff.extend_from_slice(&8u32.to_le_bytes()); // offset of IFD0
    tiff.extend_from_slice(&1u16.to_le_bytes()); // one entry
    tiff.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_le_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_le_bytes()); // count
    tiff.extend_from_slice(&[1, 0, 0, 0]); // value, padded
    tiff.extend_from_slice(&0u32.to_le_bytes()); // no next IFD

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

/// Create a JPEG with an EXIF block spliced in right after SOI
pub fn jpeg_with_exif(width: u32, height: u32) -> Vec<u8> {
    let jpeg = jpeg_bytes(width, height);
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    let mut data = jpeg[..2].to_vec();
    data.extend_from_slice(&exif_app1_segment());
    data.extend_from_slice(&jpeg[2..]);
    data
}

/// Wrap `data` in the data-URL prefix for `extension`
pub fn data_url(extension: Extension, data: &[u8]) -> String {
    format!("{}{}", extension.data_url_prefix(), STANDARD.encode(data))
}

/// Whether `needle` occurs anywhere in `haystack`
pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
