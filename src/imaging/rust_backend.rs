//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate decoders, format sniffed from content |
//! | Auto-orient | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → WebP | `WebPEncoder::new_lossless` |
//! | Encode → PNG / TIFF | `PngEncoder` / `TiffEncoder` |
//!
//! The output format follows the output extension. Outputs without a known
//! extension (a thumbnail of `IMG_0001` keeps the source's bare name) take the
//! format sniffed from the source instead. Encoding goes to a `.partial`
//! sibling that is renamed into place, so an output path never holds a
//! truncated image.
//!
//! The `image` crate only ships a lossless WebP encoder, so quality settings
//! apply to JPEG output only. Encoders write fresh pixel data, so source
//! metadata is not carried over.

use super::backend::{BackendError, ImageBackend};
use super::calculations::target_dimensions;
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_failed(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
}

/// Load and decode an image from disk, upright, along with the format sniffed
/// from its content.
fn load_oriented(path: &Path) -> Result<(DynamicImage, Option<ImageFormat>), BackendError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let mut decoder = reader.into_decoder().map_err(|e| decode_failed(path, e))?;
    let orientation = decoder.orientation().map_err(|e| decode_failed(path, e))?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_failed(path, e))?;
    img.apply_orientation(orientation);
    Ok((img, format))
}

fn encodable(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Png | ImageFormat::Tiff
    )
}

/// Output format from the extension, falling back to the source's own
/// format when the extension is missing or unknown.
fn output_format(path: &Path, source: Option<ImageFormat>) -> Result<ImageFormat, BackendError> {
    let format = match ImageFormat::from_path(path) {
        Ok(format) => Some(format),
        Err(_) => source,
    };
    format.filter(|f| encodable(*f)).ok_or_else(|| {
        BackendError::ProcessingFailed(format!("Unsupported output format: {}", path.display()))
    })
}

/// Sibling path the encoder writes to before the result is moved into place.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

fn encode(img: &DynamicImage, format: ImageFormat, path: &Path, quality: u32) -> Result<(), BackendError> {
    let encode_failed = |e: image::ImageError| {
        BackendError::ProcessingFailed(format!("{format:?} encode failed: {e}"))
    };
    let writer = BufWriter::new(File::create(path)?);

    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100) as u8);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(encode_failed)
        }
        ImageFormat::WebP => {
            let encoder = WebPEncoder::new_lossless(writer);
            let pixels = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            pixels.write_with_encoder(encoder).map_err(encode_failed)
        }
        ImageFormat::Png => img
            .write_with_encoder(PngEncoder::new(writer))
            .map_err(encode_failed),
        ImageFormat::Tiff => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(TiffEncoder::new(writer))
            .map_err(encode_failed),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {:?}",
            other
        ))),
    }
}

/// Encode into a `.partial` sibling, then rename over `path`.
///
/// A failed encode removes the partial file, so `path` is either a complete
/// image or untouched.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    source_format: Option<ImageFormat>,
    quality: u32,
) -> Result<(), BackendError> {
    let format = output_format(path, source_format)?;
    let partial = partial_path(path);
    if let Err(e) = encode(img, format, &partial, quality) {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }
    std::fs::rename(&partial, path).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        BackendError::Io(e)
    })
}

impl ImageBackend for RustBackend {
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let (img, source_format) = load_oriented(&params.source)?;
        let (width, height) = target_dimensions((img.width(), img.height()), params.target);
        let resized = if (width, height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(width, height, FilterType::Lanczos3)
        };
        save_image(&resized, &params.output, source_format, params.quality.value())
    }
}
