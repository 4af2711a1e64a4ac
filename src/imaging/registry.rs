//! Format-keyed handler registries.
//!
//! A [`Registry`] maps output format names to [`Encoder`]s and transform
//! names to [`Processor`]s. It is built once, by explicit registration calls,
//! and read-only afterwards: lookups take `&self` and need no locking, so one
//! registry is shared by every concurrent pipeline invocation.
//!
//! [`builtin()`] is the process-wide registry with every built-in handler,
//! initialized on first use.

use super::backend::{Encoder, Processor};
use super::encoders::{self, EncoderDefaults};
use super::resize::{self, ResizeProcessor};
use crate::params::Params;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Encoder,
    Transform,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Encoder => write!(f, "encoder for format"),
            HandlerKind::Transform => write!(f, "transform"),
        }
    }
}

/// Lookup miss: nothing registered under `name`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no registered {kind} {name:?}")]
pub struct UnsupportedFormat {
    pub kind: HandlerKind,
    pub name: String,
}

#[derive(Default, Clone)]
pub struct Registry {
    encoders: HashMap<String, Arc<dyn Encoder>>,
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in encoder and the `resize` transform,
    /// using default settings.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        encoders::register_all(&mut registry, &EncoderDefaults::default());
        resize::register(&mut registry, ResizeProcessor::default());
        registry
    }

    /// Insert or replace the encoder for `format`.
    pub fn register_encoder(&mut self, format: impl Into<String>, encoder: Arc<dyn Encoder>) {
        self.encoders.insert(format.into(), encoder);
    }

    /// Insert or replace the transform registered as `name`.
    pub fn register_processor(&mut self, name: impl Into<String>, processor: Arc<dyn Processor>) {
        self.processors.insert(name.into(), processor);
    }

    pub fn encoder(&self, format: &str) -> Result<&dyn Encoder, UnsupportedFormat> {
        self.encoders
            .get(format)
            .map(|e| e.as_ref())
            .ok_or_else(|| UnsupportedFormat {
                kind: HandlerKind::Encoder,
                name: format.to_string(),
            })
    }

    pub fn processor(&self, name: &str) -> Result<Arc<dyn Processor>, UnsupportedFormat> {
        self.processors
            .get(name)
            .cloned()
            .ok_or_else(|| UnsupportedFormat {
                kind: HandlerKind::Transform,
                name: name.to_string(),
            })
    }

    /// True if any registered encoder reports a change for `params`.
    pub(crate) fn encoders_change(&self, params: &Params) -> bool {
        self.encoders.values().any(|e| e.change(params))
    }

    fn sorted_names<V>(map: &HashMap<String, V>) -> Vec<&str> {
        let mut names: Vec<&str> = map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("encoders", &Self::sorted_names(&self.encoders))
            .field("processors", &Self::sorted_names(&self.processors))
            .finish()
    }
}

static BUILTIN: LazyLock<Registry> = LazyLock::new(Registry::with_builtins);

/// The process-wide registry of built-in handlers.
pub fn builtin() -> &'static Registry {
    &BUILTIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockEncoder;
    use crate::imaging::backend::{EncoderFn, ProcessorFn};
    use image::DynamicImage;

    #[test]
    fn empty_registry_misses() {
        let registry = Registry::new();
        let err = registry.encoder("png").err().unwrap();
        assert_eq!(err.kind, HandlerKind::Encoder);
        assert_eq!(err.to_string(), "no registered encoder for format \"png\"");

        let err = registry.processor("resize").err().unwrap();
        assert_eq!(err.to_string(), "no registered transform \"resize\"");
    }

    #[test]
    fn builtins_are_registered() {
        let registry = builtin();
        for format in ["jpeg", "png", "gif", "tiff", "webp", "avif"] {
            assert!(registry.encoder(format).is_ok(), "{format}");
        }
        assert!(registry.processor("resize").is_ok());
        assert!(registry.encoder("foobar").is_err());
    }

    #[test]
    fn register_replaces_existing_binding() {
        let mut registry = Registry::with_builtins();
        registry.register_encoder("png", Arc::new(MockEncoder::new(b"mock")));

        let bytes = registry
            .encoder("png")
            .unwrap()
            .encode(&DynamicImage::new_rgb8(1, 1), &Params::new())
            .unwrap();
        assert_eq!(bytes, b"mock");
    }

    #[test]
    fn closures_register_as_handlers() {
        let mut registry = Registry::new();
        registry.register_encoder("raw", Arc::new(EncoderFn::new(|image, _| Ok(image.as_bytes().to_vec()))));
        registry.register_processor("grayscale", Arc::new(ProcessorFn::new(|image, _| Ok(image.grayscale()))));

        let gray = registry
            .processor("grayscale")
            .unwrap()
            .process(DynamicImage::new_rgb8(2, 2), &Params::new())
            .unwrap();
        let bytes = registry.encoder("raw").unwrap().encode(&gray, &Params::new()).unwrap();
        assert_eq!(bytes.len(), 4);
    }

    #[test]
    fn encoders_change_is_any() {
        let mut registry = Registry::new();
        registry.register_encoder("a", Arc::new(MockEncoder::new(b"")));
        assert!(!registry.encoders_change(&Params::new()));

        let mut changing = MockEncoder::new(b"");
        changing.changes = true;
        registry.register_encoder("b", Arc::new(changing));
        assert!(registry.encoders_change(&Params::new()));
    }

    #[test]
    fn debug_lists_sorted_names() {
        let mut registry = Registry::new();
        registry.register_encoder("png", Arc::new(MockEncoder::new(b"")));
        registry.register_encoder("gif", Arc::new(MockEncoder::new(b"")));
        assert_eq!(
            format!("{registry:?}"),
            "Registry { encoders: [\"gif\", \"png\"], processors: [] }"
        );
    }
}
