//! Derived asset paths and their public URLs.
//!
//! Every full-resolution image has five derived variants living in sibling
//! directory trees. The tree is selected by swapping the full-resolution
//! directory token for the thumbnail or mid-size token; the variant by a
//! fixed suffix:
//!
//! ```text
//! ./img/max_resolution/P/a.jpg          fullsize
//! ./img/potato/P/a.jpg                  thumbnail
//! ./img/potato/P/a.jpg.webp             thumbnail_optimized
//! ./img/potato/P/a.jpg_tiny.webp        thumbnail_tiny
//! ./img/potato/P/a.jpg_1500.jpg         mid_jpeg
//! ./img/potato/P/a.jpg_900.webp         mid_webp
//! ```
//!
//! ## Substring substitution
//!
//! The token swap is a literal substring replace over the whole path string,
//! not a path-segment match: a filename that contains the token text is
//! rewritten too. [`substitute_dir`] is the only place this happens.

use crate::config::{ConfigError, DirsConfig, LocationConfig};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("asset missing: {kind} for {file} (expected at {expected})")]
    AssetMissing {
        kind: AssetKind,
        file: String,
        expected: String,
    },
    #[error("cannot resolve {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One of the six files that make up a published image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetKind {
    Fullsize,
    Thumbnail,
    ThumbnailOptimized,
    ThumbnailTiny,
    MidJpeg,
    MidWebp,
}

impl AssetKind {
    pub const ALL: [AssetKind; 6] = [
        AssetKind::Fullsize,
        AssetKind::Thumbnail,
        AssetKind::ThumbnailOptimized,
        AssetKind::ThumbnailTiny,
        AssetKind::MidJpeg,
        AssetKind::MidWebp,
    ];

    /// The five variants produced by the resize stage.
    pub const DERIVED: [AssetKind; 5] = [
        AssetKind::Thumbnail,
        AssetKind::ThumbnailOptimized,
        AssetKind::ThumbnailTiny,
        AssetKind::MidJpeg,
        AssetKind::MidWebp,
    ];

    /// Fixed filename suffix appended after directory substitution.
    pub fn suffix(self) -> &'static str {
        match self {
            AssetKind::Fullsize | AssetKind::Thumbnail => "",
            AssetKind::ThumbnailOptimized => ".webp",
            AssetKind::ThumbnailTiny => "_tiny.webp",
            AssetKind::MidJpeg => "_1500.jpg",
            AssetKind::MidWebp => "_900.webp",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AssetKind::Fullsize => "fullsize",
            AssetKind::Thumbnail => "thumbnail",
            AssetKind::ThumbnailOptimized => "thumbnail_optimized",
            AssetKind::ThumbnailTiny => "thumbnail_tiny",
            AssetKind::MidJpeg => "mid_jpeg",
            AssetKind::MidWebp => "mid_webp",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One string per [`AssetKind`]: filesystem paths or URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub fullsize: String,
    pub thumbnail: String,
    pub thumbnail_optimized: String,
    pub thumbnail_tiny: String,
    pub mid_jpeg: String,
    pub mid_webp: String,
}

impl AssetPaths {
    pub fn get(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Fullsize => &self.fullsize,
            AssetKind::Thumbnail => &self.thumbnail,
            AssetKind::ThumbnailOptimized => &self.thumbnail_optimized,
            AssetKind::ThumbnailTiny => &self.thumbnail_tiny,
            AssetKind::MidJpeg => &self.mid_jpeg,
            AssetKind::MidWebp => &self.mid_webp,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetKind, &str)> {
        AssetKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }

    /// Apply `f` to every entry.
    pub fn map(&self, f: impl Fn(&str) -> String) -> AssetPaths {
        AssetPaths {
            fullsize: f(&self.fullsize),
            thumbnail: f(&self.thumbnail),
            thumbnail_optimized: f(&self.thumbnail_optimized),
            thumbnail_tiny: f(&self.thumbnail_tiny),
            mid_jpeg: f(&self.mid_jpeg),
            mid_webp: f(&self.mid_webp),
        }
    }
}

/// Replace every occurrence of `from` with `to` in `path`.
///
/// Deliberately a plain substring replace; see the module docs.
pub fn substitute_dir(path: &str, from: &str, to: &str) -> String {
    path.replace(from, to)
}

/// Directory substitution rules for the three tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRules {
    pub full_resolution: String,
    pub thumbnail: String,
    pub mid_size: String,
}

impl From<&DirsConfig> for DirRules {
    fn from(dirs: &DirsConfig) -> Self {
        Self {
            full_resolution: dirs.full_resolution.clone(),
            thumbnail: dirs.thumbnail.clone(),
            mid_size: dirs.mid_size.clone(),
        }
    }
}

impl DirRules {
    pub fn to_thumbnail_dir(&self, path: &str) -> String {
        substitute_dir(path, &self.full_resolution, &self.thumbnail)
    }

    pub fn to_mid_size_dir(&self, path: &str) -> String {
        substitute_dir(path, &self.full_resolution, &self.mid_size)
    }

    /// Derive every asset path from a canonical (prefix-stripped)
    /// full-resolution path.
    pub fn derive(&self, fullsize: &str) -> AssetPaths {
        let thumb = self.to_thumbnail_dir(fullsize);
        let mid = self.to_mid_size_dir(fullsize);
        AssetPaths {
            fullsize: fullsize.to_string(),
            thumbnail_optimized: format!("{thumb}{}", AssetKind::ThumbnailOptimized.suffix()),
            thumbnail_tiny: format!("{thumb}{}", AssetKind::ThumbnailTiny.suffix()),
            mid_jpeg: format!("{mid}{}", AssetKind::MidJpeg.suffix()),
            mid_webp: format!("{mid}{}", AssetKind::MidWebp.suffix()),
            thumbnail: thumb,
        }
    }
}

/// Root substitution turning local paths into public URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRoots {
    pub path_root: String,
    pub destination: String,
}

impl UrlRoots {
    /// Select the destination root for the configured location mode.
    pub fn from_location(location: &LocationConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            path_root: location.path_root.clone(),
            destination: location.destination_root()?.to_string(),
        })
    }

    /// Encode spaces, then swap the first occurrence of the local root for
    /// the destination root.
    pub fn to_url(&self, path: &str) -> String {
        let encoded = path.replace(' ', "%20");
        if self.path_root.is_empty() {
            return encoded;
        }
        encoded.replacen(&self.path_root, &self.destination, 1)
    }

    pub fn urls(&self, paths: &AssetPaths) -> AssetPaths {
        paths.map(|p| self.to_url(p))
    }
}

/// Resolve `path` to its real location, failing with
/// [`PathError::AssetMissing`] when nothing is there.
pub fn verify_asset(kind: AssetKind, path: &str, file: &str) -> Result<PathBuf, PathError> {
    match std::fs::canonicalize(path) {
        Ok(resolved) if resolved.exists() => Ok(resolved),
        Ok(_) => Err(missing(kind, path, file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(missing(kind, path, file)),
        Err(source) => Err(PathError::Io {
            path: path.to_string(),
            source,
        }),
    }
}

fn missing(kind: AssetKind, path: &str, file: &str) -> PathError {
    PathError::AssetMissing {
        kind,
        file: file.to_string(),
        expected: path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationMode;
    use std::fs;
    use tempfile::TempDir;

    fn rules() -> DirRules {
        DirRules::from(&DirsConfig {
            full_resolution: "max_resolution/".into(),
            thumbnail: "potato/".into(),
            mid_size: "s/".into(),
        })
    }

    #[test]
    fn derive_all_variants() {
        let paths = rules().derive("./img/max_resolution/P/a.jpg");
        assert_eq!(paths.fullsize, "./img/max_resolution/P/a.jpg");
        assert_eq!(paths.thumbnail, "./img/potato/P/a.jpg");
        assert_eq!(paths.thumbnail_optimized, "./img/potato/P/a.jpg.webp");
        assert_eq!(paths.thumbnail_tiny, "./img/potato/P/a.jpg_tiny.webp");
        assert_eq!(paths.mid_jpeg, "./img/s/P/a.jpg_1500.jpg");
        assert_eq!(paths.mid_webp, "./img/s/P/a.jpg_900.webp");
    }

    #[test]
    fn substitution_rewrites_token_in_filename_too() {
        let paths = rules().derive("./max_resolution/max_resolution/x.jpg");
        assert_eq!(paths.thumbnail, "./potato/potato/x.jpg");
    }

    #[test]
    fn substitution_is_idempotent() {
        let r = rules();
        for (kind, derived) in r.derive("./img/max_resolution/P/a.jpg").iter() {
            if kind == AssetKind::Fullsize {
                continue;
            }
            assert!(!derived.contains("max_resolution/"));
            assert_eq!(r.to_thumbnail_dir(derived), derived);
            assert_eq!(r.to_mid_size_dir(derived), derived);
        }
    }

    #[test]
    fn url_encodes_spaces_and_swaps_root() {
        let roots = UrlRoots {
            path_root: "./".into(),
            destination: "https://bucket.example/".into(),
        };
        assert_eq!(
            roots.to_url("./img/potato/P/my photo.jpg"),
            "https://bucket.example/img/potato/P/my%20photo.jpg"
        );
    }

    #[test]
    fn url_root_replaced_once() {
        let roots = UrlRoots {
            path_root: "./".into(),
            destination: "/media/".into(),
        };
        assert_eq!(roots.to_url("./a./b.jpg"), "/media/a./b.jpg");
    }

    #[test]
    fn url_roots_require_bucket_for_remote_mode() {
        let location = LocationConfig {
            mode: LocationMode::RemoteBucket,
            ..LocationConfig::default()
        };
        assert!(matches!(
            UrlRoots::from_location(&location),
            Err(ConfigError::MissingRootUrl(LocationMode::RemoteBucket))
        ));
    }

    #[test]
    fn url_roots_local_mode() {
        let location = LocationConfig {
            local_root_url: "/gallery/".into(),
            ..LocationConfig::default()
        };
        let roots = UrlRoots::from_location(&location).unwrap();
        assert_eq!(roots.to_url("./img/a.jpg"), "/gallery/img/a.jpg");
    }

    #[test]
    fn verify_existing_asset() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.jpg");
        fs::write(&file, b"x").unwrap();
        let resolved = verify_asset(AssetKind::Thumbnail, file.to_str().unwrap(), "a.jpg").unwrap();
        assert!(resolved.is_absolute());
    }

    #[test]
    fn verify_missing_asset_names_kind_and_file() {
        let err = verify_asset(AssetKind::MidWebp, "/nonexistent/a.jpg_900.webp", "a.jpg")
            .unwrap_err();
        assert!(matches!(err, PathError::AssetMissing { kind: AssetKind::MidWebp, .. }));
        assert!(err.to_string().starts_with("asset missing: mid_webp for a.jpg"));
    }
}
