//! Gallery configuration.
//!
//! Every run is driven by one immutable [`GalleryConfig`], resolved once and
//! passed by reference into each pipeline component. Nothing reads ambient
//! state after that point.
//!
//! ## Resolution order
//!
//! ```text
//! stock defaults  →  gallery.toml (optional)  →  CLI flags  →  validate()
//! ```
//!
//! Stock defaults and the user file are merged as TOML tables (see
//! [`merge_toml`]), so a config file only needs the keys it overrides.
//! Unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! base_dir = "./img/max_resolution/Portfolio_2024-12"
//!
//! [location]
//! mode = "local"                 # or "remote-bucket"
//! path_root = "./"               # replaced by the active root URL
//! bucket_url = ""                # required for remote-bucket
//! local_root_url = "./"
//!
//! [dirs]
//! full_resolution = "max_resolution/"
//! thumbnail = "potato/"
//! mid_size = "potato/"
//!
//! [order]
//! strategy = "name"              # name | filter | exif | prefix | shuffle
//! reverse = false
//! # seed = 42
//!
//! [filter]
//! terms = []
//!
//! [captions]
//! default_artist = ""
//! # artist_override = "Jane Doe"
//! important_tags = ["exposure_time", "f_number", "iso"]
//! other_tags = ["make", "model", "focal_length"]
//!
//! [output]
//! inline_count = 20
//! # template = "gallery.template.html"
//! # output_file = "gallery.html"
//! custom_css = ""
//! output_marker = "<!-- gallery output -->"
//! css_marker = "/* gallery custom CSS */"
//!
//! [resize]
//! thumbnail_height = 256
//! tiny_height = 96
//! mid_webp_width = 900
//! mid_jpeg_width = 1500
//! thumbnail_quality = 78
//! tiny_quality = 75
//! mid_quality = 85
//! # max_processes = 4
//! ```

use crate::metadata::TagField;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("no root URL configured for image location {0}")]
    MissingRootUrl(LocationMode),
    #[error("base directory {base_dir} is not inside a '{token}' directory")]
    BaseDirOutsideFullResolution { base_dir: String, token: String },
    #[error("ordering by filter requires at least one filter term")]
    FilterOrderWithoutFilters,
    #[error("conflicting ordering options: {}", .0.join(", "))]
    ConflictingOrder(Vec<&'static str>),
}

/// Where the published images are served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LocationMode {
    /// Object-storage bucket; URLs are rooted at `location.bucket_url`.
    #[serde(alias = "aws_s3", alias = "AWS_S3")]
    #[value(aliases = ["aws_s3", "aws-s3", "s3"])]
    RemoteBucket,
    /// Served next to the HTML; URLs are rooted at `location.local_root_url`.
    #[serde(alias = "LOCAL")]
    Local,
}

impl std::fmt::Display for LocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationMode::RemoteBucket => f.write_str("remote-bucket"),
            LocationMode::Local => f.write_str("local"),
        }
    }
}

/// Primary ordering strategy. Exactly one is active per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStrategy {
    /// Lexicographic by full path.
    #[default]
    Name,
    /// Follow the order of the filter terms.
    Filter,
    /// Ascending EXIF capture datetime.
    Exif,
    /// `__N_` filename prefix.
    Prefix,
    /// Random, optionally seeded.
    Shuffle,
}

impl OrderStrategy {
    /// Resolve the legacy boolean ordering flags into a single strategy.
    ///
    /// Returns `Ok(None)` when no flag is set. Precedence is
    /// shuffle → filter → exif → prefix, but more than one set flag is an
    /// error rather than a silent pick.
    pub fn from_flags(
        shuffle: bool,
        filter: bool,
        exif: bool,
        prefix: bool,
    ) -> Result<Option<Self>, ConfigError> {
        let candidates = [
            (shuffle, OrderStrategy::Shuffle, "shuffled-order"),
            (filter, OrderStrategy::Filter, "order-from-filter"),
            (exif, OrderStrategy::Exif, "order-from-exif"),
            (prefix, OrderStrategy::Prefix, "order-from-prefix"),
        ];
        let set: Vec<_> = candidates.iter().filter(|(on, _, _)| *on).collect();
        match set.as_slice() {
            [] => Ok(None),
            [(_, strategy, _)] => Ok(Some(*strategy)),
            many => Err(ConfigError::ConflictingOrder(
                many.iter().map(|(_, _, name)| *name).collect(),
            )),
        }
    }
}

/// Gallery configuration loaded from `gallery.toml` and CLI flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Directory holding the full-resolution images (one flat level).
    pub base_dir: String,
    pub location: LocationConfig,
    pub dirs: DirsConfig,
    pub order: OrderConfig,
    pub filter: FilterConfig,
    pub captions: CaptionsConfig,
    pub output: OutputConfig,
    pub resize: ResizeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationConfig {
    pub mode: LocationMode,
    /// Local path prefix replaced by the destination root in every URL.
    pub path_root: String,
    pub bucket_url: String,
    pub local_root_url: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            mode: LocationMode::Local,
            path_root: "./".to_string(),
            bucket_url: String::new(),
            local_root_url: "./".to_string(),
        }
    }
}

impl LocationConfig {
    /// The destination root for the active mode.
    ///
    /// An empty root would silently produce host-relative garbage, so it is
    /// refused here rather than per image.
    pub fn destination_root(&self) -> Result<&str, ConfigError> {
        let root = match self.mode {
            LocationMode::RemoteBucket => self.bucket_url.as_str(),
            LocationMode::Local => self.local_root_url.as_str(),
        };
        if root.is_empty() {
            return Err(ConfigError::MissingRootUrl(self.mode));
        }
        Ok(root)
    }
}

/// The three-tier directory naming convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirsConfig {
    pub full_resolution: String,
    pub thumbnail: String,
    pub mid_size: String,
}

impl Default for DirsConfig {
    fn default() -> Self {
        Self {
            full_resolution: "max_resolution/".to_string(),
            thumbnail: "potato/".to_string(),
            mid_size: "potato/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderConfig {
    pub strategy: OrderStrategy,
    /// Reverse the final sequence, after any strategy.
    pub reverse: bool,
    /// Shuffle seed. Absent means a fresh order on every run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Case-sensitive substrings matched against the display basename.
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionsConfig {
    /// Used for images without an Artist tag.
    pub default_artist: String,
    /// Used for every image, regardless of its tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_override: Option<String>,
    pub important_tags: Vec<TagField>,
    pub other_tags: Vec<TagField>,
}

impl Default for CaptionsConfig {
    fn default() -> Self {
        Self {
            default_artist: String::new(),
            artist_override: None,
            important_tags: vec![TagField::ExposureTime, TagField::FNumber, TagField::Iso],
            other_tags: vec![TagField::Make, TagField::Model, TagField::FocalLength],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// How many leading thumbnails are embedded as base64 `data:` URLs.
    pub inline_count: usize,
    /// HTML template to splice the fragments into. Absent: bare fragments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    /// Write the final output here instead of stdout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    pub custom_css: String,
    pub output_marker: String,
    pub css_marker: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            inline_count: 20,
            template: None,
            output_file: None,
            custom_css: String::new(),
            output_marker: "<!-- gallery output -->".to_string(),
            css_marker: "/* gallery custom CSS */".to_string(),
        }
    }
}

/// Variant sizes and encoder settings for the `resize` stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub thumbnail_height: u32,
    pub tiny_height: u32,
    pub mid_webp_width: u32,
    pub mid_jpeg_width: u32,
    pub thumbnail_quality: u32,
    pub tiny_quality: u32,
    pub mid_quality: u32,
    /// Maximum parallel workers. Absent means one per CPU core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            thumbnail_height: 256,
            tiny_height: 96,
            mid_webp_width: 900,
            mid_jpeg_width: 1500,
            thumbnail_quality: 78,
            tiny_quality: 75,
            mid_quality: 85,
            max_processes: None,
        }
    }
}

/// Resolve the effective thread count for the resize pool.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never zero
pub fn effective_threads(config: &ResizeConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

impl GalleryConfig {
    /// Checks that hold for every subcommand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_dir.is_empty() {
            return Err(ConfigError::Validation(
                "base_dir must be set (--basedir or base_dir in the config file)".into(),
            ));
        }
        let token = &self.dirs.full_resolution;
        if token.is_empty() {
            return Err(ConfigError::Validation(
                "dirs.full_resolution must not be empty".into(),
            ));
        }
        if !self.base_dir.contains(token.as_str()) {
            return Err(ConfigError::BaseDirOutsideFullResolution {
                base_dir: self.base_dir.clone(),
                token: token.clone(),
            });
        }
        for (name, replacement) in [
            ("thumbnail", &self.dirs.thumbnail),
            ("mid_size", &self.dirs.mid_size),
        ] {
            if replacement.contains(token.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "dirs.{name} ({replacement}) must not contain dirs.full_resolution ({token})"
                )));
            }
        }
        if self.order.strategy == OrderStrategy::Filter && self.filter.terms.is_empty() {
            return Err(ConfigError::FilterOrderWithoutFilters);
        }
        for quality in [
            self.resize.thumbnail_quality,
            self.resize.tiny_quality,
            self.resize.mid_quality,
        ] {
            if quality > 100 {
                return Err(ConfigError::Validation(
                    "resize qualities must be 0-100".into(),
                ));
            }
        }
        Ok(())
    }

    /// Checks that only matter when rendering HTML.
    pub fn validate_for_render(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.location.destination_root()?;
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Split a comma-separated flag value, trimming items and dropping empties.
pub fn parse_csv(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Normalise the base directory into the `./relative/path` form URLs are
/// derived from.
///
/// Relative paths gain a `./` prefix; absolute paths inside `cwd` are made
/// relative to it; other absolute paths are kept as-is. Trailing slashes are
/// dropped.
pub fn normalize_base_dir(base_dir: &str, cwd: &Path) -> String {
    let trimmed = base_dir.trim_end_matches('/');
    let path = Path::new(trimmed);
    if path.is_absolute() {
        return match path.strip_prefix(cwd) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => format!("./{}", rel.to_string_lossy()),
            Err(_) => trimmed.to_string(),
        };
    }
    let mut rel = trimmed;
    while let Some(rest) = rel.strip_prefix("./") {
        rel = rest;
    }
    if rel.is_empty() || rel == "." {
        ".".to_string()
    } else if rel.starts_with("../") || rel == ".." {
        rel.to_string()
    } else {
        format!("./{rel}")
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load config from an optional file on top of stock defaults.
///
/// Validation is left to the caller: CLI overrides still have to be applied.
pub fn load_config(path: Option<&Path>) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match path {
        Some(path) => merge_toml(base, load_raw_config(path)?),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Returns a fully-commented stock `gallery.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Configuration
# =====================
# All settings are optional except base_dir, which may also be given as
# --basedir. Values shown below are the defaults. Unknown keys cause an error.

# Folder holding the full-size images, one flat level.
# Must contain the dirs.full_resolution token.
base_dir = ""

# ---------------------------------------------------------------------------
# Where the images are published
# ---------------------------------------------------------------------------
[location]
# "local" or "remote-bucket"
mode = "local"
# Local path prefix replaced by the destination root in every URL.
path_root = "./"
# Bucket root URL, required for remote-bucket.
# Example: https://s3.us-east-1.amazonaws.com/your.bucket.name/
bucket_url = ""
local_root_url = "./"

# ---------------------------------------------------------------------------
# Three-tier directory convention
# ---------------------------------------------------------------------------
[dirs]
full_resolution = "max_resolution/"
thumbnail = "potato/"
mid_size = "potato/"

# ---------------------------------------------------------------------------
# Ordering
# ---------------------------------------------------------------------------
[order]
# name | filter | exif | prefix | shuffle
strategy = "name"
# Reverse the final order (applied after the strategy).
reverse = false
# Shuffle seed; omit for a different order on every run.
# seed = 42

# ---------------------------------------------------------------------------
# Filtering
# ---------------------------------------------------------------------------
[filter]
# Include only images whose name contains any of these substrings.
terms = []

# ---------------------------------------------------------------------------
# Captions
# ---------------------------------------------------------------------------
[captions]
# Used for any image missing an artist.
default_artist = ""
# Used for all images.
# artist_override = "Jane Doe"
# Possible tags: artist, datetime, make, model, f_number, focal_length,
# exposure_time, iso, user_comment
important_tags = ["exposure_time", "f_number", "iso"]
other_tags = ["make", "model", "focal_length"]

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# How many thumbnails to embed as base64 for resilience against network
# errors. Larger values grow the HTML and defeat caching.
inline_count = 20
# template = "gallery.template.html"
# output_file = "gallery.html"
custom_css = ""
output_marker = "<!-- gallery output -->"
css_marker = "/* gallery custom CSS */"

# ---------------------------------------------------------------------------
# Resize stage
# ---------------------------------------------------------------------------
[resize]
thumbnail_height = 256
tiny_height = 96
mid_webp_width = 900
mid_jpeg_width = 1500
thumbnail_quality = 78
tiny_quality = 75
mid_quality = 85
# max_processes = 4
"##
}
