//! Image processing for the resize stage, in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + auto-orient** | `image` decoders + EXIF orientation |
//! | **Resize** | Lanczos3 to an exact height or a maximum width |
//! | **Encode** | JPEG (quality), lossless WebP, PNG, TIFF by output extension |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use params::{Quality, ResizeParams, TargetSize};
pub use rust_backend::RustBackend;
