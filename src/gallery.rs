//! Whole-run pipeline: discover, verify, order, filter, emit.
//!
//! ```text
//! validate config
//!   → discover base_dir (one flat level)      ImageAsset per file + tags
//!   → verify every derived asset exists       fail fast, nothing emitted
//!   → resolve order → filter                  final sequence
//!   → emit fragments                          in memory
//!   → bare lines or template splice           written once
//! ```
//!
//! Verification covers every discovered image, including ones the filter
//! later drops: a broken tree is reported even when today's filter would hide
//! it.

use crate::config::{ConfigError, GalleryConfig, OutputConfig};
use crate::emit::{self, EmitError, Emitted, Emitter};
use crate::metadata::{TagExtractor, Tags};
use crate::naming;
use crate::order;
use crate::paths::{AssetKind, DirRules, PathError, verify_asset};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),
    #[error("cannot list {dir}: {source}")]
    Discover {
        dir: String,
        #[source]
        source: walkdir::Error,
    },
    #[error("cannot read template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One discovered full-resolution image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    /// Path as discovered, order prefix included.
    pub source: String,
    /// Canonical path with the order prefix stripped. Every derived path,
    /// URL and caption is based on this.
    pub path: String,
    /// Display basename of [`path`](Self::path).
    pub basename: String,
    /// `__N_` prefix number, if any.
    pub order_number: Option<u64>,
    pub tags: Tags,
}

impl ImageAsset {
    pub fn from_source(source: &str, tags: Tags) -> Self {
        let path = naming::strip_order_prefix(source);
        let basename = naming::basename(&path).to_string();
        let order_number = naming::parse_order_prefix(naming::basename(source)).number;
        Self {
            source: source.to_string(),
            path,
            basename,
            order_number,
            tags,
        }
    }
}

/// List the regular, non-hidden files directly inside `base_dir`, sorted by
/// name, as `{base_dir}/{name}` strings.
///
/// An unprefixed file whose name equals the stripped name of a prefixed one
/// (`dawn.jpg` next to `__1_dawn.jpg`) is the published full-size copy of
/// that image, not an image of its own, and is left out.
pub fn discover(base_dir: &str) -> Result<Vec<String>, GalleryError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(base_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|source| GalleryError::Discover {
            dir: base_dir.to_string(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            log::warn!("Skipping non-UTF-8 file name in {}", base_dir);
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        files.push(format!("{}/{}", base_dir.trim_end_matches('/'), name));
    }

    let published: HashSet<String> = files
        .iter()
        .filter_map(|f| {
            let stripped = naming::strip_order_prefix(f);
            (stripped != *f).then_some(stripped)
        })
        .collect();
    files.retain(|f| {
        let copy = published.contains(f) && naming::strip_order_prefix(f) == *f;
        if copy {
            log::debug!("Skipping published full-size copy {}", f);
        }
        !copy
    });
    Ok(files)
}

/// Discover `base_dir` and read the tags of every file, in discovery order.
pub fn load_assets(
    base_dir: &str,
    extractor: &impl TagExtractor,
) -> Result<Vec<ImageAsset>, GalleryError> {
    let assets = discover(base_dir)?
        .into_iter()
        .map(|source| {
            let tags = extractor.extract(std::path::Path::new(&source));
            log::debug!("EXIF tags for {}: {:?}", source, tags);
            ImageAsset::from_source(&source, tags)
        })
        .collect();
    Ok(assets)
}

/// Resolved file names per asset kind, from a successful verification pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    pub verified: BTreeMap<AssetKind, Vec<String>>,
}

impl VerificationReport {
    pub fn count(&self, kind: AssetKind) -> usize {
        self.verified.get(&kind).map_or(0, Vec::len)
    }
}

/// Check that every asset of every image exists on disk.
///
/// Every kind, full size included, is checked at the path derived from the
/// prefix-stripped name: the paths the emitted page links to. For a prefixed
/// image that means the published copy `resize` places next to the source.
pub fn verify(assets: &[ImageAsset], rules: &DirRules) -> Result<VerificationReport, PathError> {
    let mut report = VerificationReport::default();
    for asset in assets {
        let derived = rules.derive(&asset.path);
        for kind in AssetKind::ALL {
            let resolved = verify_asset(kind, derived.get(kind), &asset.basename)?;
            let name = resolved
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            report.verified.entry(kind).or_default().push(name);
        }
    }
    for (kind, names) in &report.verified {
        log::debug!("Verified {} paths exist: {}", kind, names.join(" "));
    }
    Ok(report)
}

/// Validate, discover and verify, without rendering anything.
pub fn check(
    config: &GalleryConfig,
    extractor: &impl TagExtractor,
) -> Result<(Vec<ImageAsset>, VerificationReport), GalleryError> {
    config.validate_for_render()?;
    let assets = load_assets(&config.base_dir, extractor)?;
    let report = verify(&assets, &DirRules::from(&config.dirs))?;
    Ok((assets, report))
}

/// Run the pipeline up to emitted fragments.
pub fn build_gallery(
    config: &GalleryConfig,
    extractor: &impl TagExtractor,
) -> Result<Emitted, GalleryError> {
    let emitter = Emitter::new(config)?;
    let (assets, _) = check(config, extractor)?;
    log::debug!("Filter list: {:?}", config.filter.terms);
    let ordered = order::resolve_order(assets, &config.order, &config.filter.terms)?;
    let selected = order::apply_filter(ordered, &config.filter.terms);
    let emitted = emitter.emit(&selected)?;
    emitted.stats.log_summary();
    Ok(emitted)
}

/// The final output text: the spliced template when one is configured,
/// otherwise one fragment per line.
pub fn compose_output(emitted: &Emitted, output: &OutputConfig) -> Result<String, GalleryError> {
    match &output.template {
        Some(path) => {
            let template = fs::read_to_string(path).map_err(|source| GalleryError::Template {
                path: path.clone(),
                source,
            })?;
            Ok(emit::splice_template(&template, &emitted.fragments, output))
        }
        None => Ok(emit::bare_output(&emitted.fragments)),
    }
}

/// Write `text` in one go to `output.output_file`, or to stdout.
pub fn write_output(text: &str, output: &OutputConfig) -> Result<(), GalleryError> {
    match &output.output_file {
        Some(path) => fs::write(path, text)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Full `generate` run.
pub fn run(
    config: &GalleryConfig,
    extractor: &impl TagExtractor,
) -> Result<emit::GalleryStats, GalleryError> {
    let emitted = build_gallery(config, extractor)?;
    let text = compose_output(&emitted, &config.output)?;
    write_output(&text, &config.output)?;
    Ok(emitted.stats)
}
