//! Directory fan-out: run one parameter set over every image under a root.
//!
//! Files are discovered with `walkdir`, processed in parallel on the global
//! rayon pool, and written to a mirrored tree under the output directory.
//! One failing file does not stop the others; its error is reported in the
//! returned [`BatchOutcome`] list, which keeps input order.

use crate::artifact::Artifact;
use crate::error::{Error, Result};
use crate::output::BatchOutcome;
use crate::params::Params;
use crate::process::{FORMAT_PARAM, Pipeline, Server, Source};
use crate::source::{FileSource, SOURCE_PARAM};
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use walkdir::WalkDir;

/// Extensions picked up by [`collect_images`], compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "tif", "tiff", "webp", "bmp"];

/// File extension conventionally used for an artifact format.
pub fn extension_for(format: &str) -> &str {
    match format {
        "jpeg" => "jpg",
        other => other,
    }
}

/// Image files under `root`, relative to it, in sorted order.
pub fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| {
                    IMAGE_EXTENSIONS
                        .iter()
                        .any(|known| e.eq_ignore_ascii_case(known))
                })
        })
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

/// Process every image under `root` with `params`, writing results below
/// `out_dir`.
///
/// Inputs that would write the same output file (`a.jpg` and `a.png` with
/// `format=png`) are not overwritten: the first in sorted order wins and the
/// others are reported as failed.
pub fn run(pipeline: &Pipeline, root: &Path, out_dir: &Path, params: &Params) -> Vec<BatchOutcome> {
    let server = Server::new(FileSource::new(root), pipeline.clone());
    let files = collect_images(root);
    tracing::info!(count = files.len(), root = %root.display(), "batch started");

    let clashes = planned_clashes(&files, out_dir, params);
    let written = Mutex::new(HashSet::new());

    files
        .par_iter()
        .zip(clashes.par_iter())
        .map(|(relative, clash)| {
            let source = root.join(relative);
            let result = match clash {
                Some(owner) => Err(collision(
                    &planned_dest(out_dir, relative, params),
                    &owner.display(),
                )),
                None => process_one(&server, relative, out_dir, params, &written),
            };
            match result {
                Ok((dest, bytes)) => BatchOutcome::Done {
                    source,
                    dest,
                    bytes,
                },
                Err(e) => {
                    tracing::warn!(path = %source.display(), error = %e, "batch item failed");
                    BatchOutcome::Failed {
                        source,
                        error: e.to_string(),
                    }
                }
            }
        })
        .collect()
}

/// Output path a file is expected to get: the requested format's extension,
/// or the input's own extension when the format follows the input.
fn planned_dest(out_dir: &Path, relative: &Path, params: &Params) -> PathBuf {
    let extension = match params.get_string(FORMAT_PARAM) {
        Ok(format) => extension_for(format).to_string(),
        Err(_) => {
            let ext = relative
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default();
            match ext.as_str() {
                "jpeg" => "jpg".to_string(),
                "tif" => "tiff".to_string(),
                _ => ext,
            }
        }
    };
    out_dir.join(relative).with_extension(extension)
}

/// For each file, the earlier file whose planned output it would overwrite.
fn planned_clashes(files: &[PathBuf], out_dir: &Path, params: &Params) -> Vec<Option<PathBuf>> {
    let mut owners: HashMap<PathBuf, &Path> = HashMap::new();
    files
        .iter()
        .map(|relative| match owners.entry(planned_dest(out_dir, relative, params)) {
            Entry::Occupied(owner) => Some(owner.get().to_path_buf()),
            Entry::Vacant(slot) => {
                slot.insert(relative);
                None
            }
        })
        .collect()
}

fn collision(dest: &Path, owner: &dyn fmt::Display) -> Error {
    std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("{} is already written from {owner}", dest.display()),
    )
    .into()
}

fn process_one(
    server: &Server<FileSource>,
    relative: &Path,
    out_dir: &Path,
    params: &Params,
    written: &Mutex<HashSet<PathBuf>>,
) -> Result<(PathBuf, usize)> {
    let mut params = params.clone();
    params.set(SOURCE_PARAM, relative.to_string_lossy().into_owned());

    let artifact: Artifact = server.get(&params)?;
    let dest = out_dir
        .join(relative)
        .with_extension(extension_for(artifact.format()));
    // The sniffed format can disagree with the extension the plan assumed.
    let claimed = written
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(dest.clone());
    if !claimed {
        return Err(collision(&dest, &"another input"));
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&dest, artifact.data())?;
    Ok((dest, artifact.data().len()))
}
