//! # picserve
//!
//! On-demand image processing: a request is a nested parameter set, the input
//! is an encoded image, and the output is a new encoded image plus its format
//! tag.
//!
//! # Architecture: Three-Step Pipeline
//!
//! ```text
//! 1. Decode     Artifact     →  pixels     (sniffed, checked against the declared format)
//! 2. Transform  pixels       →  pixels     (resize / thumbnail, or none)
//! 3. Encode     pixels       →  Artifact   (format from the request, else the input's)
//! ```
//!
//! Encoders and transforms are pluggable handlers looked up by name in a
//! [`imaging::Registry`]. The registry is built once and then only read, so
//! one pipeline serves any number of concurrent requests without locking.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`params`] | Nested, dynamically typed request parameters with path-qualified errors |
//! | [`artifact`] | Encoded image value and its length-prefixed binary wire format |
//! | [`imaging`] | Handler traits, registry, built-in encoders, resize transform, decoding |
//! | [`process`] | The decode → transform → encode [`process::Pipeline`] and [`process::Server`] |
//! | [`source`] | Filesystem input loader used by the CLI |
//! | [`batch`] | Parallel directory fan-out |
//! | [`config`] | `picserve.toml` loading, validation, and merging |
//! | [`args`] | `key=value` / JSON command-line parameters |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`error`] | Crate-level error type |
//!
//! # Design Decisions
//!
//! ## Errors Name the Full Parameter Path
//!
//! Nested stores don't know their own key. Whenever a handler reads a child
//! store, errors coming out of it are prefixed with the parent key, so a bad
//! `{"resize": {"width": "x"}}` is reported on `resize.width`, never `width`.
//!
//! ## Format Precedence
//!
//! An explicit `format` parameter always wins, and an unknown name there is the
//! caller's mistake (a parameter error). Without it the input's own format is
//! reused; if that has no encoder, the server's fallback is broken and the
//! error is an image error instead.
//!
//! ## Change Predicates
//!
//! Every handler answers "would these parameters alter the output?". Caching
//! layers built on top use it to avoid storing identical bytes under different
//! keys; [`params::Params::digest`] supplies the key itself.
//!
//! ## Pure-Rust Codecs
//!
//! Everything goes through the `image` crate. AVIF is encode-only: its AV1
//! decoder would need a C library.

pub mod args;
pub mod artifact;
pub mod batch;
pub mod config;
pub mod error;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod params;
pub mod process;
pub mod source;

pub use artifact::Artifact;
pub use error::{Error, Result};
pub use params::{ParamError, Params, Value};
pub use process::{Pipeline, Server, Source};

#[cfg(test)]
pub(crate) mod test_helpers;
