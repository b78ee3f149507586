//! Gallery Emitter: one single-line HTML fragment per image.
//!
//! Each fragment is an anchor around a thumbnail, shaped for lightGallery /
//! viewer.js style lightboxes but usable without JavaScript:
//!
//! ```html
//! <!-- a.jpg --> <a class="__gallery_anchor" data-sub-html="…caption…"
//!    href="{fullsize}" data-src="{mid_jpeg}"
//!    data-srcset="{mid_webp} 1100w, {mid_jpeg} 1600w"
//!    data-download-url="{fullsize}">
//!   <img title="{alt}" src="{thumb or data: URL}"
//!     srcset="{thumb.webp} 256w webp, {thumb} 256w"
//!     onerror="this.srcset=this.src" data-fullsize="{fullsize}"></a>
//! ```
//!
//! The first `output.inline_count` images (by position in the final order)
//! embed their tiny WebP thumbnail as a base64 `data:` URL, so the top of the
//! page renders even when the image host is slow or unreachable.
//!
//! Fragments are collected in memory. The caller decides whether they are
//! printed bare (one per line) or spliced into a template with
//! [`splice_template`].

use crate::caption;
use crate::config::{CaptionsConfig, ConfigError, GalleryConfig, OutputConfig};
use crate::gallery::ImageAsset;
use crate::paths::{AssetPaths, DirRules, UrlRoots};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use maud::{PreEscaped, html};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot inline {path}: {source}")]
    Inline {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Collapse every run of whitespace, newlines included, into one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Running totals over the emitted fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GalleryStats {
    pub images: usize,
    /// Fragment bytes, counting one newline per fragment.
    pub total_bytes: usize,
    pub inlined: usize,
}

impl GalleryStats {
    pub fn record(&mut self, fragment: &str, inlined: bool) {
        self.images += 1;
        self.total_bytes += fragment.len() + 1;
        if inlined {
            self.inlined += 1;
        }
    }

    pub fn average_bytes(&self) -> Option<f64> {
        (self.images > 0).then(|| self.total_bytes as f64 / self.images as f64)
    }

    /// Info summary, or a warning when nothing was emitted.
    pub fn log_summary(&self) {
        match self.average_bytes() {
            Some(average) => log::info!(
                "Generated {} images ({} inlined), {} total bytes, average of {:.2} bytes per image",
                self.images,
                self.inlined,
                self.total_bytes,
                average
            ),
            None => log::warn!("Empty image set? Filters too strict or wrong paths given."),
        }
    }
}

/// Everything the emitter produced for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Emitted {
    pub fragments: Vec<String>,
    pub stats: GalleryStats,
}

/// The visible thumbnail source: a `data:` URL for the first `inline_count`
/// images, the plain thumbnail URL after that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailSource {
    Inline(String),
    Url(String),
}

impl ThumbnailSource {
    pub fn as_str(&self) -> &str {
        match self {
            ThumbnailSource::Inline(s) | ThumbnailSource::Url(s) => s,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, ThumbnailSource::Inline(_))
    }
}

/// Inline `bytes` as a WebP `data:` URL.
pub fn data_url(bytes: &[u8]) -> String {
    format!("data:image/webp;base64,{}", STANDARD.encode(bytes))
}

/// Render the anchor/img fragment for one image, already collapsed to a
/// single line.
pub fn render_fragment(
    basename: &str,
    urls: &AssetPaths,
    thumbnail: &ThumbnailSource,
    caption: &caption::Caption,
) -> String {
    let comment = format!("<!-- {} -->", basename.replace("--", "- -"));
    let data_srcset = format!("{} 1100w, {} 1600w", urls.mid_webp, urls.mid_jpeg);
    let srcset = format!(
        "{} 256w webp, {} 256w",
        urls.thumbnail_optimized, urls.thumbnail
    );
    let markup = html! {
        (PreEscaped(comment))
        " "
        a class="__gallery_anchor"
            data-sub-html=(caption.html)
            href=(urls.fullsize)
            data-src=(urls.mid_jpeg)
            data-srcset=(data_srcset)
            data-download-url=(urls.fullsize) {
            img title=(caption.alt_text)
                src=(thumbnail.as_str())
                srcset=(srcset)
                onerror="this.srcset=this.src"
                data-fullsize=(urls.fullsize);
        }
    };
    collapse_whitespace(&markup.into_string())
}

/// Composes path derivation, captions and inline encoding for a whole run.
#[derive(Debug, Clone)]
pub struct Emitter<'a> {
    rules: DirRules,
    roots: UrlRoots,
    captions: &'a CaptionsConfig,
    inline_count: usize,
}

impl<'a> Emitter<'a> {
    pub fn new(config: &'a GalleryConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            rules: DirRules::from(&config.dirs),
            roots: UrlRoots::from_location(&config.location)?,
            captions: &config.captions,
            inline_count: config.output.inline_count,
        })
    }

    fn thumbnail_source(
        &self,
        index: usize,
        paths: &AssetPaths,
        urls: &AssetPaths,
    ) -> Result<ThumbnailSource, EmitError> {
        if index >= self.inline_count {
            return Ok(ThumbnailSource::Url(urls.thumbnail.clone()));
        }
        let bytes = fs::read(&paths.thumbnail_tiny).map_err(|source| EmitError::Inline {
            path: paths.thumbnail_tiny.clone(),
            source,
        })?;
        Ok(ThumbnailSource::Inline(data_url(&bytes)))
    }

    /// Emit one fragment per asset, in the given order.
    pub fn emit(&self, assets: &[ImageAsset]) -> Result<Emitted, EmitError> {
        let mut emitted = Emitted::default();
        for (index, asset) in assets.iter().enumerate() {
            log::debug!("Processing image #{}: {}", index, asset.basename);
            let paths = self.rules.derive(&asset.path);
            let urls = self.roots.urls(&paths);
            let thumbnail = self.thumbnail_source(index, &paths, &urls)?;
            let caption = caption::render(&asset.tags, self.captions, &asset.basename);
            let fragment = render_fragment(&asset.basename, &urls, &thumbnail, &caption);
            log::debug!("Generated {} bytes for {}", fragment.len(), asset.basename);
            emitted.stats.record(&fragment, thumbnail.is_inline());
            emitted.fragments.push(fragment);
        }
        Ok(emitted)
    }
}

/// Splice custom CSS, then the joined fragments, into the template's markers.
pub fn splice_template(template: &str, fragments: &[String], output: &OutputConfig) -> String {
    template
        .replace(&output.css_marker, &output.custom_css)
        .replace(&output.output_marker, &fragments.join("\n"))
}

/// Bare output: one fragment per line.
pub fn bare_output(fragments: &[String]) -> String {
    fragments.iter().map(|f| format!("{f}\n")).collect()
}
