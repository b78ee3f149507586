//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between the resize stage and the
//! pixel work. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate; tests use a recording mock.

use super::params::ResizeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Decode `params.source` with its EXIF orientation applied, scale it to
    /// `params.target`, and encode it to `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
