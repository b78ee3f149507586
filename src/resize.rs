//! Resize stage: produce every derived asset the gallery links to.
//!
//! For each full-resolution image in `base_dir`, five variants are written at
//! the exact paths the [`paths`](crate::paths) module derives (order prefix
//! stripped), from the upright (EXIF-oriented) source:
//!
//! | Variant | Size | Format | Quality |
//! |---|---|---|---|
//! | `thumbnail` | height 256 | same as source | `thumbnail_quality` |
//! | `thumbnail_optimized` | height 256 | WebP | lossless |
//! | `thumbnail_tiny` | height 96 | WebP | lossless |
//! | `mid_webp` | width ≤ 900 | WebP | lossless |
//! | `mid_jpeg` | width ≤ 1500 | JPEG | `mid_quality` |
//!
//! Sizes come from `[resize]` in the config; the table shows the defaults.
//!
//! ## Prefixed sources
//!
//! A prefixed source (`__1_dawn.jpg`) is also published at its stripped name
//! (`dawn.jpg`) in the full-resolution directory, since that is the full-size
//! path the gallery links to. Discovery treats that copy as part of the
//! prefixed image.
//!
//! ## Incremental runs
//!
//! A variant whose output file already exists is skipped unless `force` is
//! set, so re-running after adding a few photos only encodes the new ones.
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel using [rayon](https://docs.rs/rayon) on
//! the global pool (sized by `resize.max_processes`). Progress is reported as
//! [`ResizeEvent`]s over an mpsc channel, one per finished image.

use crate::config::{ConfigError, GalleryConfig, ResizeConfig};
use crate::gallery::{self, GalleryError, ImageAsset};
use crate::imaging::{BackendError, ImageBackend, Quality, ResizeParams, RustBackend, TargetSize};
use crate::metadata::Tags;
use crate::paths::{AssetKind, DirRules};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot create {kind} for {file}: {source}")]
    Imaging {
        kind: AssetKind,
        file: String,
        #[source]
        source: BackendError,
    },
}

/// What happened to one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    Encoded,
    /// Full-size copy of a prefixed source placed at its stripped name.
    Published,
    /// Output already present and `force` was off.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantOutcome {
    pub kind: AssetKind,
    pub output: PathBuf,
    pub status: VariantStatus,
}

/// Progress events emitted while resizing.
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeEvent {
    Started {
        images: usize,
    },
    ImageResized {
        /// 1-based position in discovery order.
        index: usize,
        basename: String,
        source: String,
        variants: Vec<VariantOutcome>,
    },
}

/// Totals for a finished resize run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeSummary {
    pub images: usize,
    pub encoded: usize,
    pub published: usize,
    pub skipped: usize,
}

/// Target size and quality for one derived kind.
pub fn variant_spec(kind: AssetKind, config: &ResizeConfig) -> Option<(TargetSize, Quality)> {
    let spec = match kind {
        AssetKind::Fullsize => return None,
        AssetKind::Thumbnail | AssetKind::ThumbnailOptimized => (
            TargetSize::Height(config.thumbnail_height),
            config.thumbnail_quality,
        ),
        AssetKind::ThumbnailTiny => (TargetSize::Height(config.tiny_height), config.tiny_quality),
        AssetKind::MidWebp => (TargetSize::MaxWidth(config.mid_webp_width), config.mid_quality),
        AssetKind::MidJpeg => (TargetSize::MaxWidth(config.mid_jpeg_width), config.mid_quality),
    };
    Some((spec.0, Quality::new(spec.1)))
}

/// Plan the five resize operations for one image.
pub fn plan_variants(
    asset: &ImageAsset,
    rules: &DirRules,
    config: &ResizeConfig,
) -> Vec<(AssetKind, ResizeParams)> {
    let derived = rules.derive(&asset.path);
    AssetKind::DERIVED
        .into_iter()
        .filter_map(|kind| {
            let (target, quality) = variant_spec(kind, config)?;
            Some((
                kind,
                ResizeParams {
                    source: PathBuf::from(&asset.source),
                    output: PathBuf::from(derived.get(kind)),
                    target,
                    quality,
                },
            ))
        })
        .collect()
}

/// Resize every image under `config.base_dir` with the production backend.
pub fn resize(
    config: &GalleryConfig,
    force: bool,
    events: Option<Sender<ResizeEvent>>,
) -> Result<ResizeSummary, ResizeError> {
    resize_with_backend(&RustBackend::new(), config, force, events)
}

/// Resize using a specific backend (allows testing with mock).
pub fn resize_with_backend(
    backend: &impl ImageBackend,
    config: &GalleryConfig,
    force: bool,
    events: Option<Sender<ResizeEvent>>,
) -> Result<ResizeSummary, ResizeError> {
    config.validate()?;
    let rules = DirRules::from(&config.dirs);
    let assets: Vec<ImageAsset> = gallery::discover(&config.base_dir)?
        .iter()
        .map(|source| ImageAsset::from_source(source, Tags::new()))
        .collect();

    if let Some(tx) = &events {
        tx.send(ResizeEvent::Started {
            images: assets.len(),
        })
        .ok();
    }

    let outcomes: Vec<Vec<VariantOutcome>> = assets
        .par_iter()
        .enumerate()
        .map(|(i, asset)| {
            let variants = resize_one(backend, asset, &rules, &config.resize, force)?;
            if let Some(tx) = &events {
                tx.send(ResizeEvent::ImageResized {
                    index: i + 1,
                    basename: asset.basename.clone(),
                    source: asset.source.clone(),
                    variants: variants.clone(),
                })
                .ok();
            }
            Ok(variants)
        })
        .collect::<Result<_, ResizeError>>()?;

    let mut summary = ResizeSummary {
        images: outcomes.len(),
        ..ResizeSummary::default()
    };
    for outcome in outcomes.iter().flatten() {
        match outcome.status {
            VariantStatus::Encoded => summary.encoded += 1,
            VariantStatus::Published => summary.published += 1,
            VariantStatus::Skipped => summary.skipped += 1,
        }
    }
    Ok(summary)
}

fn resize_one(
    backend: &impl ImageBackend,
    asset: &ImageAsset,
    rules: &DirRules,
    config: &ResizeConfig,
    force: bool,
) -> Result<Vec<VariantOutcome>, ResizeError> {
    let mut outcomes: Vec<VariantOutcome> = publish_fullsize(asset, force)?.into_iter().collect();
    for (kind, params) in plan_variants(asset, rules, config) {
        let status = if !force && params.output.exists() {
            VariantStatus::Skipped
        } else {
            ensure_parent(&params.output)?;
            backend
                .resize(&params)
                .map_err(|source| ResizeError::Imaging {
                    kind,
                    file: asset.basename.clone(),
                    source,
                })?;
            VariantStatus::Encoded
        };
        log::debug!("{} {}: {:?}", asset.basename, kind, status);
        outcomes.push(VariantOutcome {
            kind,
            output: params.output,
            status,
        });
    }
    Ok(outcomes)
}

/// Give a prefixed source its full-size copy at the stripped name the page
/// links to: a hard link, or a plain copy where linking is not possible.
fn publish_fullsize(asset: &ImageAsset, force: bool) -> Result<Option<VariantOutcome>, ResizeError> {
    if asset.source == asset.path {
        return Ok(None);
    }
    let output = PathBuf::from(&asset.path);
    let status = if !force && output.exists() {
        VariantStatus::Skipped
    } else {
        if output.exists() {
            std::fs::remove_file(&output)?;
        }
        if let Err(e) = std::fs::hard_link(&asset.source, &output) {
            log::debug!("Cannot hard link {} ({}), copying", asset.source, e);
            std::fs::copy(&asset.source, &output)?;
        }
        VariantStatus::Published
    };
    log::debug!("{} {}: {:?}", asset.basename, AssetKind::Fullsize, status);
    Ok(Some(VariantOutcome {
        kind: AssetKind::Fullsize,
        output,
        status,
    }))
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
