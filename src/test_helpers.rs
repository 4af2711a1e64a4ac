//! Shared test utilities for the picserve test suite.
//!
//! Fixture images are generated in code, so the suite needs no checked-in
//! binaries.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let source = medium_jpeg();           // 1024x819 JPEG artifact
//! let image = gradient(32, 24);         // decoded RGB image
//! let png = encode_png(8, 8);           // raw PNG bytes
//! ```

use crate::artifact::Artifact;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use std::sync::LazyLock;

// =========================================================================
// Decoded images
// =========================================================================

/// RGB gradient; smooth enough that lossy quality settings matter.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

// =========================================================================
// Encoded fixtures
// =========================================================================

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn encode_png(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Png)
}

static MEDIUM_JPEG: LazyLock<Vec<u8>> =
    LazyLock::new(|| encode(&gradient(1024, 819), ImageFormat::Jpeg));

/// A 1024x819 JPEG, the "medium" source used across pipeline tests.
pub fn medium_jpeg() -> Artifact {
    Artifact::new("jpeg", MEDIUM_JPEG.clone())
}

/// A small 16x16 GIF with a transparent corner.
pub fn small_gif() -> Artifact {
    let img = RgbaImage::from_fn(16, 16, |x, y| {
        if x < 4 && y < 4 {
            image::Rgba([0, 0, 0, 0])
        } else {
            image::Rgba([(x * 16) as u8, (y * 16) as u8, 200, 255])
        }
    });
    Artifact::new("gif", encode(&DynamicImage::ImageRgba8(img), ImageFormat::Gif))
}
