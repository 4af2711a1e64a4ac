//! The decode → transform → encode pipeline.
//!
//! One [`Pipeline::process`] call handles one request:
//!
//! 1. **Decode**: sniff the payload, reject a mismatch with the declared
//!    format, enforce the dimension [`Limits`] from the header alone, then
//!    decode pixels.
//! 2. **Transform**: run the configured [`Processor`], if any.
//! 3. **Resolve format**: the `format` param if present, else the input
//!    artifact's own format.
//! 4. **Encode**: run the resolved [`Encoder`](crate::imaging::Encoder) and
//!    wrap the bytes in a new [`Artifact`].
//!
//! The first failure aborts the request and is returned as is.
//!
//! A [`Server`] pairs a pipeline with a [`Source`] that produces the input
//! artifact from the same parameters.
//!
//! ## Format resolution
//!
//! | `format` param | Lookup fails | Error |
//! |---|---|---|
//! | present | unknown name | `ParamError` on `format` |
//! | absent | input format not registered | `ImageError` |
//! | absent, input format empty | n/a | `MissingKey` on `format` |

use crate::artifact::{Artifact, ImageError};
use crate::error::Result;
use crate::imaging::{Dimensions, Encoder, Processor, Registry, UnsupportedFormat, decode, exceeds};
use crate::params::{ParamError, Params};
use image::DynamicImage;
use std::sync::Arc;

/// Parameter naming the output format.
pub const FORMAT_PARAM: &str = "format";

/// Largest source image the pipeline will decode. 0 disables an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    pub max_width: u32,
    pub max_height: u32,
}

impl Limits {
    pub fn check(&self, dims: Dimensions) -> Result<(), ImageError> {
        if exceeds(
            (dims.width, dims.height),
            (self.max_width, self.max_height),
        ) {
            return Err(ImageError::new(format!(
                "image dimensions {}x{} exceed limit {}x{}",
                dims.width, dims.height, self.max_width, self.max_height
            )));
        }
        Ok(())
    }
}

/// Produces the input artifact for a request.
pub trait Source: Send + Sync {
    fn get(&self, params: &Params) -> Result<Artifact>;
}

#[derive(Clone)]
pub struct Pipeline {
    registry: Arc<Registry>,
    transform: Option<Arc<dyn Processor>>,
    limits: Limits,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("registry", &self.registry)
            .field("transform", &self.transform.is_some())
            .field("limits", &self.limits)
            .finish()
    }
}

impl Pipeline {
    /// A pipeline without transform or limits: decode, then re-encode.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            transform: None,
            limits: Limits::default(),
        }
    }

    /// Use the transform registered as `name`.
    pub fn with_transform(mut self, name: &str) -> Result<Self, UnsupportedFormat> {
        self.transform = Some(self.registry.processor(name)?);
        Ok(self)
    }

    /// Use `processor` directly, bypassing the registry.
    pub fn with_processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.transform = Some(processor);
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Decode stage on its own: format check, limits, pixels.
    pub fn decode(&self, artifact: &Artifact) -> Result<DynamicImage> {
        let dims = decode::check(artifact)?;
        self.limits.check(dims)?;
        let image = decode::decode(artifact)?;
        tracing::debug!(
            format = artifact.format(),
            width = dims.width,
            height = dims.height,
            bytes = artifact.data().len(),
            "decoded"
        );
        Ok(image)
    }

    pub fn process(&self, artifact: &Artifact, params: &Params) -> Result<Artifact> {
        let image = self.decode(artifact)?;

        let image = match &self.transform {
            Some(transform) => transform.process(image, params)?,
            None => image,
        };

        let (format, encoder) = resolve_format(&self.registry, artifact.format(), params)?;
        let data = encoder.encode(&image, params)?;
        tracing::debug!(
            format,
            width = image.width(),
            height = image.height(),
            bytes = data.len(),
            "encoded"
        );
        Ok(Artifact::new(format, data))
    }

    /// Whether processing may produce output that differs from the input
    /// for `params`.
    ///
    /// Without an explicit format the encoder is the input's own, which is
    /// not known here, so every registered encoder is asked.
    pub fn change(&self, params: &Params) -> bool {
        if params.has(FORMAT_PARAM) {
            return true;
        }
        if let Some(transform) = &self.transform
            && transform.change(params)
        {
            return true;
        }
        self.registry.encoders_change(params)
    }
}

/// Pick the output format name and its encoder.
pub fn resolve_format<'r>(
    registry: &'r Registry,
    input_format: &str,
    params: &Params,
) -> Result<(String, &'r dyn Encoder)> {
    if params.has(FORMAT_PARAM) {
        let format = params.get_string(FORMAT_PARAM)?;
        let encoder = registry
            .encoder(format)
            .map_err(|e| ParamError::invalid(FORMAT_PARAM, e.to_string()))?;
        return Ok((format.to_string(), encoder));
    }

    if input_format.is_empty() {
        return Err(ParamError::MissingKey {
            param: FORMAT_PARAM.to_string(),
        }
        .into());
    }
    let encoder = registry
        .encoder(input_format)
        .map_err(|e| ImageError::new(e.to_string()))?;
    Ok((input_format.to_string(), encoder))
}

/// A [`Source`] followed by a [`Pipeline`].
pub struct Server<S> {
    pub source: S,
    pub pipeline: Pipeline,
}

impl<S: Source> Server<S> {
    pub fn new(source: S, pipeline: Pipeline) -> Self {
        Self { source, pipeline }
    }

    /// Load the source once and return it together with the processed result.
    pub fn get_with_original(&self, params: &Params) -> Result<(Artifact, Artifact)> {
        let original = self.source.get(params)?;
        let processed = self.pipeline.process(&original, params)?;
        Ok((original, processed))
    }
}

impl<S: Source> Source for Server<S> {
    fn get(&self, params: &Params) -> Result<Artifact> {
        self.get_with_original(params).map(|(_, processed)| processed)
    }
}
