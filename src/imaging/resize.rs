//! The built-in resize transform.
//!
//! Reads its options from a nested store under one parameter key (`resize`
//! by default), for example `{"resize": {"width": 100, "mode": "thumbnail"}}`.
//! Errors from that store are reported with the key prefixed, so a bad width
//! surfaces as `resize.width`.
//!
//! Without the key, or with both dimensions 0, the image passes through
//! untouched. Neither output axis may exceed the processor's maximum
//! dimension, including an axis derived from the aspect ratio.

use super::backend::Processor;
use super::calculations::{resize_dimensions, thumbnail_dimensions};
use super::options::{Interpolation, ResizeMode, ResizeOptions, Resampler};
use super::registry::Registry;
use crate::error::Result;
use crate::params::{ParamError, Params};
use image::DynamicImage;
use std::sync::Arc;

pub const DEFAULT_PARAM: &str = "resize";

/// Largest width or height a request may ask for.
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

#[derive(Debug, Clone)]
pub struct ResizeProcessor {
    param: String,
    default_interpolation: Interpolation,
    max_dimension: u32,
}

impl Default for ResizeProcessor {
    fn default() -> Self {
        Self {
            param: DEFAULT_PARAM.to_string(),
            default_interpolation: Interpolation::default(),
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl ResizeProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter key holding the nested options.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    pub fn with_default_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.default_interpolation = interpolation;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    /// Parse options, `None` when the key is absent.
    fn options(&self, params: &Params) -> Result<Option<ResizeOptions>> {
        if !params.has(&self.param) {
            return Ok(None);
        }
        let options = params.with_sub(&self.param, |sub| {
            ResizeOptions::from_params(sub, self.default_interpolation, self.max_dimension)
        })?;
        Ok(Some(options))
    }

    /// A thin source with one requested dimension derives a huge other axis.
    fn check_output(&self, (width, height): (u32, u32)) -> Result<(), ParamError> {
        for (axis, value) in [("width", width), ("height", height)] {
            if value > self.max_dimension {
                return Err(ParamError::invalid(
                    format!("{}.{axis}", self.param),
                    format!(
                        "resulting {axis} {value} exceeds maximum {}",
                        self.max_dimension
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl Processor for ResizeProcessor {
    fn process(&self, image: DynamicImage, params: &Params) -> Result<DynamicImage> {
        let options = match self.options(params)? {
            Some(options) if !options.is_identity() => options,
            _ => return Ok(image),
        };

        let source = (image.width(), image.height());
        let target = (options.width, options.height);
        let (width, height) = match options.mode {
            ResizeMode::Resize => resize_dimensions(source, target),
            ResizeMode::Thumbnail => thumbnail_dimensions(source, target),
        };
        self.check_output((width, height))?;
        if (width, height) == source {
            return Ok(image);
        }

        tracing::debug!(
            from_width = source.0,
            from_height = source.1,
            width,
            height,
            "resize"
        );
        let resized = match options.interpolation.resampler() {
            Resampler::Filter(filter) => image.resize_exact(width, height, filter),
            Resampler::Kernel(kernel) => kernel.resize(&image, width, height),
        };
        Ok(resized)
    }

    /// A parse failure counts as a change: the request must not share a
    /// cache entry with the unmodified image.
    fn change(&self, params: &Params) -> bool {
        match self.options(params) {
            Ok(Some(options)) => !options.is_identity(),
            Ok(None) => false,
            Err(_) => true,
        }
    }
}

/// Register `processor` as the `resize` transform.
pub fn register(registry: &mut Registry, processor: ResizeProcessor) {
    registry.register_processor("resize", Arc::new(processor));
}
