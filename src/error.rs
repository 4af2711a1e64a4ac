//! Crate-level error type.
//!
//! Each component owns its error: [`ParamError`] for user-supplied values,
//! [`ImageError`] for structural artifact problems, [`UnsupportedFormat`] for
//! registry misses. [`Error`] is what pipeline stages and handlers return; a
//! stage returns the first error it hits and nothing else.
//!
//! Front ends usually collapse everything into one "bad request" answer.
//! [`Error::is_user_error`] is there for those that want finer mapping.

use crate::artifact::ImageError;
use crate::imaging::registry::UnsupportedFormat;
use crate::params::ParamError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),
    #[error("{format} codec failed: {source}")]
    Codec {
        format: String,
        #[source]
        source: image::ImageError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn codec(format: &str, source: image::ImageError) -> Self {
        Error::Codec {
            format: format.to_string(),
            source,
        }
    }

    /// True when the caller's parameters are at fault.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::Param(_))
    }

    /// Fully qualified path of the offending parameter, for parameter errors.
    pub fn param(&self) -> Option<&str> {
        match self {
            Error::Param(e) => Some(e.param()),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
