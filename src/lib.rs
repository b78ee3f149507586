//! # gallerygen
//!
//! A static HTML photo gallery generator. Point it at one flat directory of
//! full-resolution photos and it emits a self-contained block of gallery
//! markup: one anchor per photo with thumbnail, mid-size and full-size URLs,
//! an EXIF-derived caption, and the first few thumbnails inlined as base64 so
//! the page survives a slow or failing image host.
//!
//! # Directory Convention
//!
//! Every photo exists in three tiers, told apart by a directory token:
//!
//! ```text
//! img/
//! ├── max_resolution/Portfolio/__1_dawn.jpg      # full resolution (source)
//! └── potato/Portfolio/
//!     ├── dawn.jpg                                # thumbnail, height 256
//!     ├── dawn.jpg.webp                           # thumbnail, WebP
//!     ├── dawn.jpg_tiny.webp                      # tiny thumbnail, height 96
//!     ├── dawn.jpg_1500.jpg                       # mid-size JPEG
//!     └── dawn.jpg_900.webp                       # mid-size WebP
//! ```
//!
//! The `resize` command creates the derived tiers; `generate` refuses to run
//! until every one of them exists.
//!
//! # Pipeline
//!
//! ```text
//! config → discover → verify assets → order → filter → emit → splice/print
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `gallery.toml` loading, merging, validation, stock config text |
//! | [`naming`] | `__N_` order-prefix parser |
//! | [`paths`] | Derived asset paths, URL derivation, existence checks |
//! | [`order`] | Ordering strategies and the substring filter |
//! | [`metadata`] | EXIF tag vocabulary, formatting, `TagExtractor` |
//! | [`caption`] | Title, alt text and caption markup per photo |
//! | [`emit`] | Per-photo HTML fragments, inline thumbnails, template splice |
//! | [`gallery`] | Discovery and the whole `generate` / `check` run |
//! | [`imaging`] | Pure-Rust decode, auto-orient, resize, encode |
//! | [`resize`] | The `resize` command: all derived variants, in parallel |
//! | [`output`] | CLI output formatting for `check` and `resize` |
//!
//! # Design Decisions
//!
//! ## One Immutable Config
//!
//! Defaults, `gallery.toml` and CLI flags are resolved into a single
//! [`config::GalleryConfig`] before anything else runs. Every component takes
//! it (or the section it needs) by reference.
//!
//! ## Fail Before Output
//!
//! Configuration errors and missing derived assets abort the run before a
//! single fragment is produced. Output is assembled in memory and written
//! once, so an aborted run never leaves half a gallery behind.
//!
//! ## Maud For Markup
//!
//! Fragments and captions are built with [Maud](https://maud.lambda.xyz/).
//! Captions end up inside a double-quoted attribute; Maud's escaping
//! guarantees they never contain a raw `"`.

pub mod caption;
pub mod config;
pub mod emit;
pub mod gallery;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod order;
pub mod output;
pub mod paths;
pub mod resize;

#[cfg(test)]
pub(crate) mod test_helpers;
