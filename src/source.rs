//! Filesystem [`Source`]: loads the input artifact named by the `source`
//! param, relative to a root directory.

use crate::artifact::{Artifact, DATA_MAX_LEN};
use crate::error::Result;
use crate::imaging::decode;
use crate::params::{ParamError, Params};
use crate::process::Source;
use std::path::{Component, Path, PathBuf};

pub const SOURCE_PARAM: &str = "source";

#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `relative` under the root. Absolute paths and `..` are refused.
    fn resolve(&self, relative: &str) -> Result<PathBuf, ParamError> {
        let path = Path::new(relative);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            return Err(ParamError::invalid(
                SOURCE_PARAM,
                "must be a relative path inside the source root",
            ));
        }
        Ok(self.root.join(path))
    }
}

impl Source for FileSource {
    fn get(&self, params: &Params) -> Result<Artifact> {
        let relative = params.get_string(SOURCE_PARAM)?;
        let path = self.resolve(relative)?;

        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ParamError::invalid(SOURCE_PARAM, "not found").into());
            }
            Err(e) => return Err(e.into()),
        };
        if data.len() > DATA_MAX_LEN {
            return Err(ParamError::invalid(SOURCE_PARAM, "file too large").into());
        }

        let format = decode::sniff(&data)?;
        tracing::debug!(path = %path.display(), format, bytes = data.len(), "loaded source");
        Ok(Artifact::new(format, data))
    }
}
