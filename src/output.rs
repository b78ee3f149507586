//! CLI output formatting for the `check` and `resize` commands.
//!
//! The `generate` command writes HTML to stdout, so everything human-facing
//! goes through these functions instead (and logging goes to stderr).
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Images
//! 001 a.jpg
//!     Source: ./img/max_resolution/P/__1_a.jpg
//! 002 b.jpg
//!     Source: ./img/max_resolution/P/b.jpg
//!
//! Assets
//!     fullsize: 2
//!     thumbnail: 2
//!     ...
//! ```
//!
//! ## Resize
//!
//! ```text
//! Resizing 2 photos
//! 001 a.jpg
//!     Source: ./img/max_resolution/P/__1_a.jpg
//!     fullsize: published
//!     thumbnail: encoded
//!     thumbnail_optimized: skipped
//!     ...
//! Resized 2 photos: 9 encoded, 1 skipped, 1 published
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: they do no I/O.

use crate::gallery::{ImageAsset, VerificationReport};
use crate::paths::AssetKind;
use crate::resize::{ResizeEvent, ResizeSummary, VariantStatus};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Index + display name, then the discovered path as context.
fn image_lines(index: usize, basename: &str, source: &str) -> Vec<String> {
    vec![
        format!("{} {}", format_index(index), basename),
        format!("{}Source: {}", indent(1), source),
    ]
}

fn photos(n: usize) -> String {
    if n == 1 {
        "1 photo".to_string()
    } else {
        format!("{n} photos")
    }
}

// ============================================================================
// check
// ============================================================================

pub fn format_check_output(assets: &[ImageAsset], report: &VerificationReport) -> Vec<String> {
    let mut lines = vec!["Images".to_string()];
    for (i, asset) in assets.iter().enumerate() {
        lines.extend(image_lines(i + 1, &asset.basename, &asset.source));
    }
    lines.push(String::new());
    lines.push("Assets".to_string());
    for kind in AssetKind::ALL {
        lines.push(format!("{}{}: {}", indent(1), kind, report.count(kind)));
    }
    lines
}

pub fn print_check_output(assets: &[ImageAsset], report: &VerificationReport) {
    for line in format_check_output(assets, report) {
        println!("{}", line);
    }
}

// ============================================================================
// resize
// ============================================================================

pub fn format_resize_event(event: &ResizeEvent) -> Vec<String> {
    match event {
        ResizeEvent::Started { images } => vec![format!("Resizing {}", photos(*images))],
        ResizeEvent::ImageResized {
            index,
            basename,
            source,
            variants,
        } => {
            let mut lines = image_lines(*index, basename, source);
            for variant in variants {
                let status = match variant.status {
                    VariantStatus::Encoded => "encoded",
                    VariantStatus::Published => "published",
                    VariantStatus::Skipped => "skipped",
                };
                lines.push(format!("{}{}: {}", indent(1), variant.kind, status));
            }
            lines
        }
    }
}

pub fn format_resize_summary(summary: &ResizeSummary) -> String {
    let mut line = format!(
        "Resized {}: {} encoded, {} skipped",
        photos(summary.images),
        summary.encoded,
        summary.skipped
    );
    if summary.published > 0 {
        line.push_str(&format!(", {} published", summary.published));
    }
    line
}

pub fn print_resize_summary(summary: &ResizeSummary) {
    println!("{}", format_resize_summary(summary));
}
