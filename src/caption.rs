//! Caption Renderer: title, alt text and lightbox caption for one image.
//!
//! ```text
//! title    = "{basename} by {artist}"         (or just "{basename}")
//! alt_text = "{title} (Exposure: {important})"
//! html     = <h4>{title}</h4><p>Exposure: {important} <i>({other})</i></p>
//! ```
//!
//! The caption ends up inside a double-quoted `data-sub-html` attribute, so
//! [`Caption::html`] is a single line with every `"` escaped.

use crate::config::CaptionsConfig;
use crate::emit::collapse_whitespace;
use crate::metadata::{TagField, Tags};
use maud::html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub title: String,
    pub alt_text: String,
    pub html: String,
}

/// The artist credited for an image: the override, else the image's own
/// Artist tag, else the configured default. Empty means uncredited.
pub fn effective_artist<'a>(tags: &'a Tags, config: &'a CaptionsConfig) -> &'a str {
    match &config.artist_override {
        Some(artist) => artist,
        None => tags
            .get_non_empty(TagField::Artist)
            .unwrap_or(&config.default_artist),
    }
}

pub fn render(tags: &Tags, config: &CaptionsConfig, basename: &str) -> Caption {
    let artist = effective_artist(tags, config);
    let title = if artist.is_empty() {
        basename.to_string()
    } else {
        format!("{basename} by {artist}")
    };
    let important = tags.join(&config.important_tags);
    let other = tags.join(&config.other_tags);
    let alt_text = format!("{title} (Exposure: {important})");

    let markup = html! {
        h4 { (title) }
        p { "Exposure: " (important) " " i { "(" (other) ")" } }
    };

    Caption {
        title: collapse_whitespace(&title),
        alt_text: collapse_whitespace(&alt_text),
        html: collapse_whitespace(&markup.into_string()),
    }
}
