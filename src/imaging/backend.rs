//! Handler traits for the pluggable pipeline stages.
//!
//! Two capabilities are pluggable, each a one-method trait plus the change
//! predicate:
//!
//! | Trait | Stage | Keyed by |
//! |---|---|---|
//! | [`Encoder`] | decoded image → bytes | output format name (`"png"`) |
//! | [`Processor`] | decoded image → decoded image | transform name (`"resize"`) |
//!
//! Decoding is not pluggable: it is whatever the `image` crate can sniff and
//! decode (see [`decode`](super::decode)).
//!
//! Plain functions and closures can be registered through [`EncoderFn`] and
//! [`ProcessorFn`].

use crate::error::Result;
use crate::params::Params;
use image::DynamicImage;

/// Encodes a decoded image to exactly one format.
pub trait Encoder: Send + Sync {
    fn encode(&self, image: &DynamicImage, params: &Params) -> Result<Vec<u8>>;

    /// Whether `params` makes this encoder produce bytes a cache must treat
    /// as distinct (e.g. an explicit quality).
    fn change(&self, params: &Params) -> bool;
}

/// Maps one decoded image to another (resize, crop, ...).
pub trait Processor: Send + Sync {
    fn process(&self, image: DynamicImage, params: &Params) -> Result<DynamicImage>;

    /// Whether `params` makes this transform alter its input.
    fn change(&self, params: &Params) -> bool;
}

/// Adapter registering a plain function as an [`Encoder`].
///
/// The change predicate is always `true`: nothing is known about what the
/// function reads.
pub struct EncoderFn<F>(pub F);

impl<F> EncoderFn<F>
where
    F: Fn(&DynamicImage, &Params) -> Result<Vec<u8>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Encoder for EncoderFn<F>
where
    F: Fn(&DynamicImage, &Params) -> Result<Vec<u8>> + Send + Sync,
{
    fn encode(&self, image: &DynamicImage, params: &Params) -> Result<Vec<u8>> {
        (self.0)(image, params)
    }

    fn change(&self, _params: &Params) -> bool {
        true
    }
}

/// Adapter registering a plain function as a [`Processor`]. Always reports a
/// change.
pub struct ProcessorFn<F>(pub F);

impl<F> ProcessorFn<F>
where
    F: Fn(DynamicImage, &Params) -> Result<DynamicImage> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Processor for ProcessorFn<F>
where
    F: Fn(DynamicImage, &Params) -> Result<DynamicImage> + Send + Sync,
{
    fn process(&self, image: DynamicImage, params: &Params) -> Result<DynamicImage> {
        (self.0)(image, params)
    }

    fn change(&self, _params: &Params) -> bool {
        true
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}
