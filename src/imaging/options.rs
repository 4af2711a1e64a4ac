//! Option types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between request parameters (see [`crate::params`]) and the
//! handlers that do the pixel work, which keeps parsing and validation
//! testable without touching any image.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`Interpolation`]: Resampling filter, by request name.
//! - [`ResizeMode`]: Exact resize or fit-inside thumbnail.
//! - [`ResizeOptions`]: Everything the resize transform reads from its
//!   nested parameter store.

use super::kernel::Kernel;
use crate::params::{ParamError, Params};
use image::imageops::FilterType;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Read `quality` from `params`, falling back to `default` when absent.
    ///
    /// Present values must be integers in 1..=100.
    pub fn from_params(params: &Params, default: Quality) -> Result<Self, ParamError> {
        if !params.has(QUALITY_PARAM) {
            return Ok(default);
        }
        let value = params.get_int_in_range(QUALITY_PARAM, 1..=100)?;
        Ok(Self(value as u8))
    }
}

pub const QUALITY_PARAM: &str = "quality";

/// Resampling filter used by the resize transform.
///
/// Most names map onto the filters the `image` crate ships; Mitchell–Netravali
/// and Lanczos-2 run through [`Kernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    NearestNeighbor,
    Bilinear,
    Bicubic,
    MitchellNetravali,
    Gaussian,
    Lanczos2,
    Lanczos3,
}

/// How an [`Interpolation`] is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resampler {
    Filter(FilterType),
    Kernel(Kernel),
}

impl Interpolation {
    pub const NAMES: &'static [&'static str] = &[
        "nearest_neighbor",
        "bilinear",
        "bicubic",
        "mitchell_netravali",
        "gaussian",
        "lanczos2",
        "lanczos3",
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "nearest_neighbor" => Some(Self::NearestNeighbor),
            "bilinear" => Some(Self::Bilinear),
            "bicubic" => Some(Self::Bicubic),
            "mitchell_netravali" => Some(Self::MitchellNetravali),
            "gaussian" => Some(Self::Gaussian),
            "lanczos2" => Some(Self::Lanczos2),
            "lanczos3" => Some(Self::Lanczos3),
            _ => None,
        }
    }

    pub fn resampler(self) -> Resampler {
        match self {
            Self::NearestNeighbor => Resampler::Filter(FilterType::Nearest),
            Self::Bilinear => Resampler::Filter(FilterType::Triangle),
            Self::Bicubic => Resampler::Filter(FilterType::CatmullRom),
            Self::MitchellNetravali => Resampler::Kernel(Kernel::MitchellNetravali),
            Self::Gaussian => Resampler::Filter(FilterType::Gaussian),
            Self::Lanczos2 => Resampler::Kernel(Kernel::Lanczos2),
            Self::Lanczos3 => Resampler::Filter(FilterType::Lanczos3),
        }
    }
}

impl Default for Interpolation {
    fn default() -> Self {
        Self::Lanczos3
    }
}

/// How the requested width/height are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Exact target size; a zero dimension is derived from the aspect ratio.
    #[default]
    Resize,
    /// Fit inside the box, keep aspect ratio, never upscale.
    Thumbnail,
}

impl ResizeMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "resize" => Some(Self::Resize),
            "thumbnail" => Some(Self::Thumbnail),
            _ => None,
        }
    }
}

/// Parsed options of the resize transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    /// 0 means "not constrained".
    pub width: u32,
    pub height: u32,
    pub interpolation: Interpolation,
    pub mode: ResizeMode,
}

impl ResizeOptions {
    /// Read options from the transform's own (nested) store.
    ///
    /// Errors name the key relative to that store; the caller prefixes them.
    pub fn from_params(
        params: &Params,
        default_interpolation: Interpolation,
        max_dimension: u32,
    ) -> Result<Self, ParamError> {
        let width = dimension(params, "width", max_dimension)?;
        let height = dimension(params, "height", max_dimension)?;

        let interpolation = if params.has("interpolation") {
            let name = params.get_string("interpolation")?;
            Interpolation::parse(name).ok_or_else(|| {
                ParamError::invalid(
                    "interpolation",
                    format!("must be one of {}", Interpolation::NAMES.join(", ")),
                )
            })?
        } else {
            default_interpolation
        };

        let mode = if params.has("mode") {
            let name = params.get_string("mode")?;
            ResizeMode::parse(name)
                .ok_or_else(|| ParamError::invalid("mode", "must be one of resize, thumbnail"))?
        } else {
            ResizeMode::default()
        };

        Ok(Self {
            width,
            height,
            interpolation,
            mode,
        })
    }

    /// True when neither dimension is constrained.
    pub fn is_identity(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

fn dimension(params: &Params, key: &str, max: u32) -> Result<u32, ParamError> {
    if !params.has(key) {
        return Ok(0);
    }
    let value = params.get_int_in_range(key, 0..=i64::from(max))?;
    Ok(value as u32)
}
