//! Built-in encoders, one per output format.
//!
//! | Format | Codec | Params |
//! |---|---|---|
//! | `jpeg` | `image::codecs::jpeg` | `quality` (1–100) |
//! | `png` | `image::codecs::png`, best compression | none |
//! | `gif` | `image::codecs::gif` | none |
//! | `tiff` | `image::codecs::tiff` | none |
//! | `webp` | `image::codecs::webp`, lossless | none |
//! | `avif` | `image::codecs::avif` (rav1e) | `quality` (1–100) |
//!
//! Each codec accepts a limited set of pixel layouts, so images are
//! converted to 8-bit RGB or RGBA first where needed.

use super::backend::Encoder;
use super::options::{QUALITY_PARAM, Quality};
use super::registry::Registry;
use crate::error::{Error, Result};
use crate::params::Params;
use image::codecs::png::{CompressionType, FilterType as PngFilter};
use image::{DynamicImage, ImageFormat};
use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;

/// Default settings applied when a request does not override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderDefaults {
    pub jpeg_quality: Quality,
    pub avif_quality: Quality,
    /// rav1e speed, 1 (slowest) to 10.
    pub avif_speed: u8,
}

impl Default for EncoderDefaults {
    fn default() -> Self {
        Self {
            jpeg_quality: Quality::new(75),
            avif_quality: Quality::new(80),
            avif_speed: 6,
        }
    }
}

/// Register every built-in encoder under its format name.
pub fn register_all(registry: &mut Registry, defaults: &EncoderDefaults) {
    registry.register_encoder(
        "jpeg",
        Arc::new(JpegEncoder {
            default_quality: defaults.jpeg_quality,
        }),
    );
    registry.register_encoder("png", Arc::new(PngEncoder));
    registry.register_encoder("gif", Arc::new(GifEncoder));
    registry.register_encoder("tiff", Arc::new(TiffEncoder));
    registry.register_encoder("webp", Arc::new(WebpEncoder));
    registry.register_encoder(
        "avif",
        Arc::new(AvifEncoder {
            default_quality: defaults.avif_quality,
            speed: defaults.avif_speed,
        }),
    );
}

pub struct JpegEncoder {
    pub default_quality: Quality,
}

impl Encoder for JpegEncoder {
    fn encode(&self, image: &DynamicImage, params: &Params) -> Result<Vec<u8>> {
        let quality = Quality::from_params(params, self.default_quality)?;
        // Baseline JPEG has no alpha channel.
        let image = match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => Cow::Borrowed(image),
            other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
        };

        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.value());
        image
            .write_with_encoder(encoder)
            .map_err(|e| Error::codec("jpeg", e))?;
        Ok(buf)
    }

    fn change(&self, params: &Params) -> bool {
        params.has(QUALITY_PARAM)
    }
}

pub struct PngEncoder;

impl Encoder for PngEncoder {
    fn encode(&self, image: &DynamicImage, _params: &Params) -> Result<Vec<u8>> {
        let image = to_8bit(image);
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new_with_quality(
            &mut buf,
            CompressionType::Best,
            PngFilter::Adaptive,
        );
        image
            .write_with_encoder(encoder)
            .map_err(|e| Error::codec("png", e))?;
        Ok(buf)
    }

    fn change(&self, _params: &Params) -> bool {
        false
    }
}

pub struct GifEncoder;

impl Encoder for GifEncoder {
    fn encode(&self, image: &DynamicImage, _params: &Params) -> Result<Vec<u8>> {
        let image = DynamicImage::ImageRgba8(image.to_rgba8());
        write_format(&image, ImageFormat::Gif, "gif")
    }

    fn change(&self, _params: &Params) -> bool {
        false
    }
}

pub struct TiffEncoder;

impl Encoder for TiffEncoder {
    fn encode(&self, image: &DynamicImage, _params: &Params) -> Result<Vec<u8>> {
        write_format(&to_rgb_or_rgba(image), ImageFormat::Tiff, "tiff")
    }

    fn change(&self, _params: &Params) -> bool {
        false
    }
}

/// Lossless WebP; the `image` crate has no lossy WebP encoder.
pub struct WebpEncoder;

impl Encoder for WebpEncoder {
    fn encode(&self, image: &DynamicImage, _params: &Params) -> Result<Vec<u8>> {
        write_format(&to_rgb_or_rgba(image), ImageFormat::WebP, "webp")
    }

    fn change(&self, _params: &Params) -> bool {
        false
    }
}

pub struct AvifEncoder {
    pub default_quality: Quality,
    pub speed: u8,
}

impl Encoder for AvifEncoder {
    fn encode(&self, image: &DynamicImage, params: &Params) -> Result<Vec<u8>> {
        let quality = Quality::from_params(params, self.default_quality)?;
        let image = to_rgb_or_rgba(image);
        let mut buf = Vec::new();
        let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(
            &mut buf,
            self.speed,
            quality.value(),
        );
        image
            .write_with_encoder(encoder)
            .map_err(|e| Error::codec("avif", e))?;
        Ok(buf)
    }

    fn change(&self, params: &Params) -> bool {
        params.has(QUALITY_PARAM)
    }
}

fn write_format(image: &DynamicImage, format: ImageFormat, name: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|e| Error::codec(name, e))?;
    Ok(buf)
}

/// The PNG codec takes 8- and 16-bit buffers but no floats.
fn to_8bit(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageRgb32F(_) => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
        DynamicImage::ImageRgba32F(_) => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
        _ => Cow::Borrowed(image),
    }
}

fn to_rgb_or_rgba(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Cow::Borrowed(image),
        other if other.color().has_alpha() => {
            Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8()))
        }
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::decode;
    use crate::test_helpers::gradient;

    fn encode_with(name: &str, image: &DynamicImage, params: &Params) -> Vec<u8> {
        let mut registry = Registry::new();
        register_all(&mut registry, &EncoderDefaults::default());
        registry.encoder(name).unwrap().encode(image, params).unwrap()
    }

    #[test]
    fn every_builtin_encoder_output_sniffs_as_its_format() {
        let image = gradient(32, 24);
        for name in ["jpeg", "png", "gif", "tiff", "webp", "avif"] {
            let bytes = encode_with(name, &image, &Params::new());
            assert_eq!(decode::sniff(&bytes).unwrap(), name);
        }
    }

    #[test]
    fn jpeg_quality_changes_output_size() {
        let image = gradient(128, 96);
        let low = encode_with("jpeg", &image, &Params::new().with("quality", 10));
        let high = encode_with("jpeg", &image, &Params::new().with("quality", 95));
        assert!(low.len() < high.len());
    }

    #[test]
    fn jpeg_rejects_out_of_range_quality() {
        let encoder = JpegEncoder {
            default_quality: Quality::new(75),
        };
        let image = gradient(8, 8);
        for bad in [-10, 0, 101] {
            let err = encoder
                .encode(&image, &Params::new().with("quality", bad))
                .unwrap_err();
            assert_eq!(err.param(), Some("quality"), "{bad}");
        }
    }

    #[test]
    fn jpeg_accepts_alpha_input() {
        let image = DynamicImage::ImageRgba8(gradient(16, 16).to_rgba8());
        let bytes = encode_with("jpeg", &image, &Params::new());
        assert_eq!(decode::sniff(&bytes).unwrap(), "jpeg");
    }

    #[test]
    fn png_roundtrip_is_lossless() {
        let image = gradient(20, 10);
        let bytes = encode_with("png", &image, &Params::new());
        let back = image::load_from_memory(&bytes).unwrap();
        assert_eq!(back.to_rgb8(), image.to_rgb8());
    }

    #[test]
    fn change_predicates() {
        let defaults = EncoderDefaults::default();
        let jpeg = JpegEncoder {
            default_quality: defaults.jpeg_quality,
        };
        let avif = AvifEncoder {
            default_quality: defaults.avif_quality,
            speed: defaults.avif_speed,
        };
        let with_quality = Params::new().with("quality", 50);

        assert!(!jpeg.change(&Params::new()));
        assert!(jpeg.change(&with_quality));
        assert!(avif.change(&with_quality));
        assert!(!PngEncoder.change(&with_quality));
        assert!(!GifEncoder.change(&with_quality));
    }
}
