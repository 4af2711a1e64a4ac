//! The parameter model: a nested, dynamically typed key/value store.
//!
//! Every request is described by a [`Params`] value. The front end builds it
//! once, then hands it to the pipeline by shared reference; no stage mutates
//! it afterwards.
//!
//! ```text
//! {
//!     format: "jpeg",
//!     quality: 50,
//!     resize: { width: 100, mode: "thumbnail" },
//! }
//! ```
//!
//! Values are a closed set ([`Value`]): string, integer, boolean, or a nested
//! store. Typed accessors return either the value or a [`ParamError`] naming
//! the offending key.
//!
//! ## Path qualification
//!
//! Nested stores don't know their own name. When code reads a child store and
//! an accessor on it fails, the error must be rewritten with the parent key
//! before it travels further, so users see `resize.width` rather than `width`.
//! [`Params::with_sub`] does this for you; [`ParamError::prefixed`] is the
//! primitive it uses.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

/// The type of a [`Value`], used in type mismatch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Int,
    Bool,
    Params,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Int => "int",
            ValueKind::Bool => "bool",
            ValueKind::Params => "params",
        };
        f.write_str(name)
    }
}

/// A single parameter value.
///
/// Serialized untagged, so a `Params` round-trips through a plain JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    Params(Params),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::Params(_) => ValueKind::Params,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Params> for Value {
    fn from(v: Params) -> Self {
        Value::Params(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Params(p) => write!(f, "{p}"),
        }
    }
}

/// A user-supplied parameter is missing, has the wrong type, or is out of range.
///
/// `param` is always the fully qualified dotted path once the error leaves the
/// component that read it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("invalid param \"{param}\": missing")]
    MissingKey { param: String },
    #[error("invalid param \"{param}\": expected {expected}, found {found}")]
    TypeMismatch {
        param: String,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("invalid param \"{param}\": {message}")]
    Invalid { param: String, message: String },
}

impl ParamError {
    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        ParamError::Invalid {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Dotted path of the offending parameter.
    pub fn param(&self) -> &str {
        match self {
            ParamError::MissingKey { param }
            | ParamError::TypeMismatch { param, .. }
            | ParamError::Invalid { param, .. } => param,
        }
    }

    /// Qualify the path with the key of the enclosing store.
    pub fn prefixed(mut self, parent: &str) -> Self {
        let param = match &mut self {
            ParamError::MissingKey { param }
            | ParamError::TypeMismatch { param, .. }
            | ParamError::Invalid { param, .. } => param,
        };
        *param = format!("{parent}.{param}");
        self
    }
}

/// Nested, dynamically typed parameter store.
///
/// Keys are case-sensitive. The backing map is ordered so that the
/// [`Display`](fmt::Display) form and [`digest`](Params::digest) are canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Params::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or overwrite a value. Construction-time only.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Top-level membership; dotted paths are not traversed.
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Result<&Value, ParamError> {
        self.0.get(key).ok_or_else(|| ParamError::MissingKey {
            param: key.to_string(),
        })
    }

    pub fn get_string(&self, key: &str) -> Result<&str, ParamError> {
        match self.get(key)? {
            Value::String(s) => Ok(s),
            other => Err(mismatch(key, ValueKind::String, other)),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ParamError> {
        match self.get(key)? {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch(key, ValueKind::Int, other)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ParamError> {
        match self.get(key)? {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch(key, ValueKind::Bool, other)),
        }
    }

    pub fn get_sub(&self, key: &str) -> Result<&Params, ParamError> {
        match self.get(key)? {
            Value::Params(p) => Ok(p),
            other => Err(mismatch(key, ValueKind::Params, other)),
        }
    }

    /// Integer accessor with a two-sided bound check.
    ///
    /// Out-of-range values are user input errors ([`ParamError::Invalid`]).
    pub fn get_int_in_range(
        &self,
        key: &str,
        range: RangeInclusive<i64>,
    ) -> Result<i64, ParamError> {
        let value = self.get_int(key)?;
        if value < *range.start() {
            return Err(ParamError::invalid(
                key,
                format!("must be greater than or equal to {}", range.start()),
            ));
        }
        if value > *range.end() {
            return Err(ParamError::invalid(
                key,
                format!("must be less than or equal to {}", range.end()),
            ));
        }
        Ok(value)
    }

    /// Run `f` against the nested store at `key`, qualifying any error it
    /// returns with `key.` so the full path survives.
    pub fn with_sub<T>(
        &self,
        key: &str,
        f: impl FnOnce(&Params) -> Result<T, ParamError>,
    ) -> Result<T, ParamError> {
        let sub = self.get_sub(key)?;
        f(sub).map_err(|e| e.prefixed(key))
    }

    /// SHA-256 of the canonical textual form, as lowercase hex.
    ///
    /// Two stores with the same content always produce the same digest,
    /// regardless of insertion order.
    pub fn digest(&self) -> String {
        let digest = Sha256::digest(self.to_string().as_bytes());
        format!("{:x}", digest)
    }
}

fn mismatch(key: &str, expected: ValueKind, found: &Value) -> ParamError {
    ParamError::TypeMismatch {
        param: key.to_string(),
        expected,
        found: found.kind(),
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key:?}: {value}")?;
        }
        f.write_str("}")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
