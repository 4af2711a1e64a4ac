//! Decoding and format sniffing.
//!
//! Decoding is not pluggable: the `image` crate sniffs the payload and
//! decodes it. What this module adds is the format-spoofing guard: the
//! sniffed format must match the artifact's declared format tag, otherwise
//! the artifact is treated as corrupt.
//!
//! AVIF is sniffed and can be encoded, but the `image` crate's `avif` feature
//! ships no decoder, so AVIF input fails at [`decode`].

use super::backend::Dimensions;
use crate::artifact::{Artifact, ImageError};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Format tag used on artifacts for an `image` crate format.
pub fn format_name(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Jpeg => Some("jpeg"),
        ImageFormat::Png => Some("png"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::Tiff => Some("tiff"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Avif => Some("avif"),
        ImageFormat::Bmp => Some("bmp"),
        _ => None,
    }
}

/// Sniff the payload and return its artifact format tag.
pub fn sniff(data: &[u8]) -> Result<&'static str, ImageError> {
    let format = image::guess_format(data)
        .map_err(|e| ImageError::new(format!("unrecognized image data: {e}")))?;
    format_name(format)
        .ok_or_else(|| ImageError::new(format!("unsupported image format {format:?}")))
}

/// Sniff `artifact` and confirm the result matches its declared format.
fn checked_format(artifact: &Artifact) -> Result<ImageFormat, ImageError> {
    let sniffed = image::guess_format(artifact.data())
        .map_err(|e| ImageError::new(format!("unrecognized image data: {e}")))?;
    match format_name(sniffed) {
        Some(name) if name == artifact.format() => Ok(sniffed),
        Some(name) => Err(ImageError::new(format!(
            "decoded format \"{name}\" does not match image format \"{}\"",
            artifact.format()
        ))),
        None => Err(ImageError::new(format!(
            "unsupported image format {sniffed:?}"
        ))),
    }
}

/// Read the dimensions from the header without decoding pixels.
pub fn check(artifact: &Artifact) -> Result<Dimensions, ImageError> {
    let format = checked_format(artifact)?;
    let (width, height) = ImageReader::with_format(Cursor::new(artifact.data()), format)
        .into_dimensions()
        .map_err(|e| ImageError::new(format!("{} header: {e}", artifact.format())))?;
    Ok(Dimensions { width, height })
}

/// Fully decode `artifact` into pixels.
pub fn decode(artifact: &Artifact) -> Result<DynamicImage, ImageError> {
    let format = checked_format(artifact)?;
    image::load_from_memory_with_format(artifact.data(), format)
        .map_err(|e| ImageError::new(format!("{} decode: {e}", artifact.format())))
}
