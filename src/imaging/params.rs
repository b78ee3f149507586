//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. The resize stage
//! decides which variants to create; the [`backend`](super::backend) does the
//! pixel work. A mock backend can stand in without changing the planning.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`TargetSize`]: Exact height, or a maximum width.
//! - [`ResizeParams`]: Source, output path, target size, quality.

use std::fmt;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// How a variant is sized relative to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSize {
    /// Exactly this many pixels high, width proportional.
    Height(u32),
    /// At most this many pixels wide, height proportional. Never upscales.
    MaxWidth(u32),
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSize::Height(h) => write!(f, "x{h}"),
            TargetSize::MaxWidth(w) => write!(f, "{w}x"),
        }
    }
}

/// Parameters for a single resize-and-encode operation.
///
/// The output format follows the output file's extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub target: TargetSize,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn target_display_uses_geometry_notation() {
        assert_eq!(TargetSize::Height(256).to_string(), "x256");
        assert_eq!(TargetSize::MaxWidth(900).to_string(), "900x");
    }
}
