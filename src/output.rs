//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! photos/dawn.jpg (jpeg, 1024x819, 80.2 KiB)
//!     Params: {"format": "png", "resize": {"width": 100}}
//!     Digest: 3f1c0a9b27e4
//!     → out/dawn.png (png, 100x80, 12.0 KiB)
//! ```
//!
//! ## Batch
//!
//! ```text
//! 001 dawn.jpg → out/dawn.png (12.0 KiB)
//! 002 broken.jpg
//!     Error: image error: jpeg decode: ...
//!
//! Processed 1 image, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::Dimensions;
use crate::params::Params;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based position as a zero-padded 3-digit index.
fn format_index(pos: usize) -> String {
    format!("{:03}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count.
pub fn format_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// `format, WxH, size`; dimensions are omitted when unknown.
fn artifact_detail(format: &str, dims: Option<Dimensions>, bytes: usize) -> String {
    match dims {
        Some(d) => format!(
            "{format}, {}x{}, {}",
            d.width,
            d.height,
            format_size(bytes)
        ),
        None => format!("{format}, {}", format_size(bytes)),
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Process
// ============================================================================

/// One side of a processed request: where it lives and what it holds.
#[derive(Debug, Clone)]
pub struct ArtifactSummary {
    pub path: PathBuf,
    pub format: String,
    pub dims: Option<Dimensions>,
    pub bytes: usize,
}

pub fn format_process_result(
    input: &ArtifactSummary,
    params: &Params,
    output: &ArtifactSummary,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({})",
        input.path.display(),
        artifact_detail(&input.format, input.dims, input.bytes)
    )];
    if !params.is_empty() {
        lines.push(format!("{}Params: {}", indent(1), params));
    }
    lines.push(format!("{}Digest: {}", indent(1), &params.digest()[..12]));
    lines.push(format!(
        "{}→ {} ({})",
        indent(1),
        output.path.display(),
        artifact_detail(&output.format, output.dims, output.bytes)
    ));
    lines
}

pub fn print_process_result(input: &ArtifactSummary, params: &Params, output: &ArtifactSummary) {
    for line in format_process_result(input, params, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Result of one file in a batch run.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Done {
        source: PathBuf,
        dest: PathBuf,
        bytes: usize,
    },
    Failed {
        source: PathBuf,
        error: String,
    },
}

/// Batch listing in input order, followed by a one-line summary.
///
/// `root` is stripped from source paths for display.
pub fn format_batch_summary(outcomes: &[BatchOutcome], root: &Path) -> Vec<String> {
    let display = |p: &Path| p.strip_prefix(root).unwrap_or(p).display().to_string();
    let mut lines = Vec::new();
    let mut failed = 0;

    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            BatchOutcome::Done {
                source,
                dest,
                bytes,
            } => lines.push(format!(
                "{} {} → {} ({})",
                format_index(i + 1),
                display(source),
                dest.display(),
                format_size(*bytes)
            )),
            BatchOutcome::Failed { source, error } => {
                failed += 1;
                lines.push(format!("{} {}", format_index(i + 1), display(source)));
                lines.push(format!("{}Error: {}", indent(1), error));
            }
        }
    }

    lines.push(String::new());
    let done = outcomes.len() - failed;
    if failed == 0 {
        lines.push(format!("Processed {}", plural(done, "image")));
    } else {
        lines.push(format!("Processed {}, {} failed", plural(done, "image"), failed));
    }
    lines
}

pub fn print_batch_summary(outcomes: &[BatchOutcome], root: &Path) {
    for line in format_batch_summary(outcomes, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Pack / unpack
// ============================================================================

pub fn format_pack_result(from: &Path, to: &Path, format: &str, bytes: usize) -> Vec<String> {
    vec![format!(
        "Packed {} ({}, {}) → {}",
        from.display(),
        format,
        format_size(bytes),
        to.display()
    )]
}

pub fn format_unpack_result(from: &Path, to: &Path, format: &str, bytes: usize) -> Vec<String> {
    vec![format!(
        "Unpacked {} → {} ({}, {})",
        from.display(),
        to.display(),
        format,
        format_size(bytes)
    )]
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn process_result_lines() {
        let input = ArtifactSummary {
            path: "photos/dawn.jpg".into(),
            format: "jpeg".into(),
            dims: Some(Dimensions {
                width: 1024,
                height: 819,
            }),
            bytes: 2048,
        };
        let output = ArtifactSummary {
            path: "out/dawn.png".into(),
            format: "png".into(),
            dims: Some(Dimensions {
                width: 100,
                height: 80,
            }),
            bytes: 512,
        };
        let params = Params::new().with("format", "png");
        let lines = format_process_result(&input, &params, &output);

        assert_eq!(lines[0], "photos/dawn.jpg (jpeg, 1024x819, 2.0 KiB)");
        assert_eq!(lines[1], r#"    Params: {"format": "png"}"#);
        assert!(lines[2].starts_with("    Digest: "));
        assert_eq!(lines[2].len(), "    Digest: ".len() + 12);
        assert_eq!(lines[3], "    → out/dawn.png (png, 100x80, 512 B)");
    }

    #[test]
    fn process_result_omits_empty_params_and_unknown_dims() {
        let summary = ArtifactSummary {
            path: "a.avif".into(),
            format: "avif".into(),
            dims: None,
            bytes: 10,
        };
        let lines = format_process_result(&summary, &Params::new(), &summary);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "a.avif (avif, 10 B)");
    }

    #[test]
    fn batch_summary_lists_failures() {
        let root = Path::new("/in");
        let outcomes = vec![
            BatchOutcome::Done {
                source: "/in/dawn.jpg".into(),
                dest: "out/dawn.png".into(),
                bytes: 2048,
            },
            BatchOutcome::Failed {
                source: "/in/broken.jpg".into(),
                error: "image error: truncated".into(),
            },
        ];
        let lines = format_batch_summary(&outcomes, root);
        assert_eq!(
            lines,
            vec![
                "001 dawn.jpg → out/dawn.png (2.0 KiB)",
                "002 broken.jpg",
                "    Error: image error: truncated",
                "",
                "Processed 1 image, 1 failed",
            ]
        );
    }

    #[test]
    fn batch_summary_all_ok() {
        let outcomes = vec![
            BatchOutcome::Done {
                source: "a.jpg".into(),
                dest: "a.png".into(),
                bytes: 1,
            };
            3
        ];
        let lines = format_batch_summary(&outcomes, Path::new(""));
        assert_eq!(lines.last().unwrap(), "Processed 3 images");
    }

    #[test]
    fn pack_and_unpack_lines() {
        assert_eq!(
            format_pack_result(Path::new("a.jpg"), Path::new("a.pic"), "jpeg", 100),
            vec!["Packed a.jpg (jpeg, 100 B) → a.pic"]
        );
        assert_eq!(
            format_unpack_result(Path::new("a.pic"), Path::new("a.jpg"), "jpeg", 100),
            vec!["Unpacked a.pic → a.jpg (jpeg, 100 B)"]
        );
    }
}
