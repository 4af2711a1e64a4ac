//! Resampling kernels the `image` crate does not ship.
//!
//! Two separable convolution passes (horizontal, then vertical) over an
//! `Rgba32F` copy of the image. The result is converted back to the source's
//! pixel layout so encoders see the same layout as with the built-in filters.

use image::{ColorType, DynamicImage, Rgba32FImage};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// Mitchell–Netravali cubic, B = C = 1/3.
    MitchellNetravali,
    /// Lanczos windowed sinc, a = 2.
    Lanczos2,
}

impl Kernel {
    /// Radius of the kernel in source pixels at scale 1.
    pub fn support(self) -> f32 {
        match self {
            Self::MitchellNetravali | Self::Lanczos2 => 2.0,
        }
    }

    pub fn weight(self, x: f32) -> f32 {
        match self {
            Self::MitchellNetravali => bc_cubic(x, 1.0 / 3.0, 1.0 / 3.0),
            Self::Lanczos2 => lanczos(x, 2.0),
        }
    }

    /// Resample `image` to exactly `width` x `height`.
    pub fn resize(self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let color = image.color();
        let horizontal = self.horizontal(&image.to_rgba32f(), width);
        let resized = self.vertical(&horizontal, height);
        restore_layout(DynamicImage::ImageRgba32F(resized), color)
    }

    fn horizontal(self, src: &Rgba32FImage, width: u32) -> Rgba32FImage {
        let taps = self.taps(src.width(), width);
        Rgba32FImage::from_fn(width, src.height(), |x, y| {
            let (start, weights) = &taps[x as usize];
            convolve(weights, |k| src.get_pixel(start + k, y).0)
        })
    }

    fn vertical(self, src: &Rgba32FImage, height: u32) -> Rgba32FImage {
        let taps = self.taps(src.height(), height);
        Rgba32FImage::from_fn(src.width(), height, |x, y| {
            let (start, weights) = &taps[y as usize];
            let mut px = convolve(weights, |k| src.get_pixel(x, start + k).0);
            for c in &mut px.0 {
                *c = c.clamp(0.0, 1.0);
            }
            px
        })
    }

    /// For each destination index: first source index and normalized weights.
    fn taps(self, src_len: u32, dst_len: u32) -> Vec<(u32, Vec<f32>)> {
        let ratio = src_len as f32 / dst_len as f32;
        // Stretch the kernel over the source when downscaling.
        let scale = ratio.max(1.0);
        let radius = self.support() * scale;

        (0..dst_len)
            .map(|i| {
                let center = (i as f32 + 0.5) * ratio;
                let start = (center - radius).floor().max(0.0) as u32;
                let end = ((center + radius).ceil() as u32).clamp(start + 1, src_len);
                let mut weights: Vec<f32> = (start..end)
                    .map(|j| self.weight((j as f32 + 0.5 - center) / scale))
                    .collect();
                let sum: f32 = weights.iter().sum();
                if sum.abs() > f32::EPSILON {
                    weights.iter_mut().for_each(|w| *w /= sum);
                }
                (start, weights)
            })
            .collect()
    }
}

fn convolve(weights: &[f32], pixel: impl Fn(u32) -> [f32; 4]) -> image::Rgba<f32> {
    let mut acc = [0.0f32; 4];
    for (k, w) in weights.iter().enumerate() {
        for (a, v) in acc.iter_mut().zip(pixel(k as u32)) {
            *a += v * w;
        }
    }
    image::Rgba(acc)
}

fn bc_cubic(x: f32, b: f32, c: f32) -> f32 {
    let a = x.abs();
    let k = if a < 1.0 {
        (12.0 - 9.0 * b - 6.0 * c) * a.powi(3) + (-18.0 + 12.0 * b + 6.0 * c) * a.powi(2)
            + (6.0 - 2.0 * b)
    } else if a < 2.0 {
        (-b - 6.0 * c) * a.powi(3)
            + (6.0 * b + 30.0 * c) * a.powi(2)
            + (-12.0 * b - 48.0 * c) * a
            + (8.0 * b + 24.0 * c)
    } else {
        0.0
    };
    k / 6.0
}

fn sinc(x: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        let a = x * PI;
        a.sin() / a
    }
}

fn lanczos(x: f32, a: f32) -> f32 {
    if x.abs() < a { sinc(x) * sinc(x / a) } else { 0.0 }
}

fn restore_layout(image: DynamicImage, color: ColorType) -> DynamicImage {
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(image.to_rgb8()),
        ColorType::Rgba8 => DynamicImage::ImageRgba8(image.to_rgba8()),
        ColorType::L16 => DynamicImage::ImageLuma16(image.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(image.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(image.to_rgb16()),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(image.to_rgba16()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(image.to_rgb32f()),
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::gradient;
    use image::{GrayImage, Luma};

    const KERNELS: [Kernel; 2] = [Kernel::MitchellNetravali, Kernel::Lanczos2];

    #[test]
    fn kernel_values() {
        assert!((Kernel::MitchellNetravali.weight(0.0) - 8.0 / 9.0).abs() < 1e-6);
        assert_eq!(Kernel::MitchellNetravali.weight(2.0), 0.0);
        assert_eq!(Kernel::Lanczos2.weight(0.0), 1.0);
        assert!(Kernel::Lanczos2.weight(1.0).abs() < 1e-6);
        assert_eq!(Kernel::Lanczos2.weight(2.5), 0.0);
    }

    #[test]
    fn integer_offsets_sum_to_one() {
        let sum: f32 = (-2..=2)
            .map(|i| Kernel::MitchellNetravali.weight(i as f32))
            .sum();
        assert!((sum - 1.0).abs() < 1e-5, "{sum}");
    }

    #[test]
    fn output_has_requested_size_and_source_layout() {
        for kernel in KERNELS {
            let out = kernel.resize(&gradient(64, 48), 20, 70);
            assert_eq!((out.width(), out.height()), (20, 70), "{kernel:?}");
            assert_eq!(out.color(), ColorType::Rgb8);
        }
    }

    #[test]
    fn flat_image_stays_flat() {
        let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(9, 7, Luma([200])));
        for kernel in KERNELS {
            for (w, h) in [(3, 2), (30, 25)] {
                let out = kernel.resize(&flat, w, h).to_luma8();
                assert!(
                    out.pixels().all(|p| p.0[0].abs_diff(200) <= 1),
                    "{kernel:?} {w}x{h}"
                );
            }
        }
    }

    #[test]
    fn single_pixel_source() {
        let one = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([10])));
        let out = Kernel::Lanczos2.resize(&one, 4, 4).to_luma8();
        assert!(out.pixels().all(|p| p.0[0].abs_diff(10) <= 1));
    }
}
