//! Shared test utilities for the gallerygen test suite.
//!
//! Builds a temp-dir gallery tree following the three-tier convention, with
//! every derived asset in place, and a [`TagExtractor`] whose answers are set
//! per file.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fixture = GalleryFixture::new(&["a.jpg", "__1_b.jpg"]);
//! fs::remove_file(fixture.derived_path("a.jpg", AssetKind::MidWebp)).unwrap();
//! let result = build_gallery(&fixture.config, &MockExtractor::default());
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::GalleryConfig;
use crate::metadata::{TagExtractor, TagField, Tags};
use crate::naming;
use crate::paths::{AssetKind, DirRules};

// =========================================================================
// Fixture setup
// =========================================================================

/// A gallery tree under `{tmp}/img/{max_resolution,potato}/P/`.
///
/// `config` is ready to render: `base_dir` points at the full-resolution
/// directory and `location.path_root` at the temp root, so URLs come out as
/// `./img/...`.
pub struct GalleryFixture {
    tmp: TempDir,
    pub config: GalleryConfig,
}

impl GalleryFixture {
    /// Create full-resolution files named `names` (order prefixes allowed)
    /// plus all five derived assets of each.
    pub fn new(names: &[&str]) -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_str().unwrap().to_string();
        let mut config = GalleryConfig {
            base_dir: format!("{root}/img/max_resolution/P"),
            ..GalleryConfig::default()
        };
        config.location.path_root = format!("{root}/");
        fs::create_dir_all(&config.base_dir).unwrap();

        let fixture = Self { tmp, config };
        for name in names {
            fixture.add_image(name);
        }
        fixture
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn base_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.config.base_dir)
    }

    /// The full-resolution file for `name`, exactly as discovery reports it.
    pub fn source_path(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("{}/{}", self.config.base_dir, name))
    }

    /// Where the asset of `kind` for full-resolution file `name` lives.
    pub fn derived_path(&self, name: &str, kind: AssetKind) -> PathBuf {
        let stripped = naming::strip_order_prefix(&format!("{}/{}", self.config.base_dir, name));
        PathBuf::from(DirRules::from(&self.config.dirs).derive(&stripped).get(kind))
    }

    /// Write a full-resolution file and every derived asset for it. A
    /// prefixed `name` also gets its published full-size copy.
    pub fn add_image(&self, name: &str) {
        fs::write(self.source_path(name), format!("source of {name}")).unwrap();
        for kind in AssetKind::ALL {
            let path = self.derived_path(name, kind);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("{kind} of {name}")).unwrap();
        }
    }
}

// =========================================================================
// Tag extraction
// =========================================================================

/// [`TagExtractor`] answering from a per-path table; unknown paths get no tags.
#[derive(Default)]
pub struct MockExtractor {
    tags: HashMap<PathBuf, Tags>,
}

impl MockExtractor {
    pub fn set<'a>(
        &mut self,
        path: &Path,
        fields: impl IntoIterator<Item = (TagField, &'a str)>,
    ) {
        let tags = fields
            .into_iter()
            .map(|(field, value)| (field, value.to_string()))
            .collect();
        self.tags.insert(path.to_path_buf(), tags);
    }
}

impl TagExtractor for MockExtractor {
    fn extract(&self, path: &Path) -> Tags {
        self.tags.get(path).cloned().unwrap_or_default()
    }
}
