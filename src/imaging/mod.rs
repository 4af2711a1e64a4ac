//! Image handling on top of the `image` crate.
//!
//! | Stage | Module | Crate / function |
//! |---|---|---|
//! | **Sniff + header check** | [`decode`] | `image::guess_format`, `ImageReader::into_dimensions` |
//! | **Decode** | [`decode`] | `image::load_from_memory_with_format` |
//! | **Resize / thumbnail** | [`resize`] | `DynamicImage::resize_exact`, [`Kernel`] for Mitchell–Netravali and Lanczos-2 |
//! | **Encode** | [`encoders`] | `image::codecs::{jpeg, png, gif, tiff, webp, avif}` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Options**: Data structures parsed from request parameters
//! - **Backend**: [`Encoder`] / [`Processor`] traits and closure adapters
//! - **Registry**: format-keyed lookup of handlers

pub mod backend;
mod calculations;
pub mod decode;
pub mod encoders;
mod kernel;
mod options;
pub mod registry;
pub mod resize;

pub use backend::{Dimensions, Encoder, EncoderFn, Processor, ProcessorFn};
pub use calculations::{exceeds, resize_dimensions, thumbnail_dimensions};
pub use encoders::EncoderDefaults;
pub use kernel::Kernel;
pub use options::{Interpolation, Quality, Resampler, ResizeMode, ResizeOptions};
pub use registry::{Registry, UnsupportedFormat};
pub use resize::ResizeProcessor;
