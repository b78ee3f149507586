//! EXIF tag extraction and formatting.
//!
//! Captions and EXIF ordering read from a small, fixed vocabulary of tags
//! ([`TagField`]). Each field has its own formatting rule applied at
//! extraction time, so everything downstream deals in display strings:
//!
//! | Field | EXIF tag | Example |
//! |---|---|---|
//! | `artist` | Artist | `Jane Doe` |
//! | `datetime` | DateTime | `2024:12:01 10:32:05` |
//! | `make` | Make | `NIKON CORPORATION` |
//! | `model` | Model | `NIKON Z 6` |
//! | `f_number` | FNumber | `f/2.8` |
//! | `focal_length` | FocalLength | `50mm`, `127/2mm` |
//! | `exposure_time` | ExposureTime | `1/250sec` |
//! | `iso` | PhotographicSensitivity | `ISO400` |
//! | `user_comment` | UserComment | `handheld` |
//!
//! ## Missing and unreadable metadata
//!
//! Metadata is cosmetic. A file without EXIF, with a corrupt EXIF block, or
//! that cannot be opened yields an empty [`Tags`]; lookups through
//! [`Tags::get`] then return `""`. Extraction never fails the run.

use exif::{Field, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// A recognised metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagField {
    #[serde(alias = "Image Artist")]
    Artist,
    #[serde(alias = "Image DateTime")]
    Datetime,
    #[serde(alias = "Image Make")]
    Make,
    #[serde(alias = "Image Model")]
    Model,
    #[serde(alias = "EXIF FNumber")]
    FNumber,
    #[serde(alias = "EXIF FocalLength")]
    FocalLength,
    #[serde(alias = "EXIF ExposureTime")]
    ExposureTime,
    #[serde(alias = "EXIF ISOSpeedRatings")]
    Iso,
    #[serde(alias = "EXIF UserComment")]
    UserComment,
}

#[derive(Error, Debug, PartialEq)]
#[error("unknown EXIF tag name '{0}' (expected one of: {names})", names = TagField::names().join(", "))]
pub struct UnknownTagField(pub String);

impl TagField {
    pub const ALL: [TagField; 9] = [
        TagField::Artist,
        TagField::Datetime,
        TagField::Make,
        TagField::Model,
        TagField::FNumber,
        TagField::FocalLength,
        TagField::ExposureTime,
        TagField::Iso,
        TagField::UserComment,
    ];

    /// Canonical config name.
    pub fn name(self) -> &'static str {
        match self {
            TagField::Artist => "artist",
            TagField::Datetime => "datetime",
            TagField::Make => "make",
            TagField::Model => "model",
            TagField::FNumber => "f_number",
            TagField::FocalLength => "focal_length",
            TagField::ExposureTime => "exposure_time",
            TagField::Iso => "iso",
            TagField::UserComment => "user_comment",
        }
    }

    /// The exifread-style name older configs use (`"EXIF FNumber"`).
    pub fn legacy_name(self) -> &'static str {
        match self {
            TagField::Artist => "Image Artist",
            TagField::Datetime => "Image DateTime",
            TagField::Make => "Image Make",
            TagField::Model => "Image Model",
            TagField::FNumber => "EXIF FNumber",
            TagField::FocalLength => "EXIF FocalLength",
            TagField::ExposureTime => "EXIF ExposureTime",
            TagField::Iso => "EXIF ISOSpeedRatings",
            TagField::UserComment => "EXIF UserComment",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.name()).collect()
    }

    fn exif_tag(self) -> Tag {
        match self {
            TagField::Artist => Tag::Artist,
            TagField::Datetime => Tag::DateTime,
            TagField::Make => Tag::Make,
            TagField::Model => Tag::Model,
            TagField::FNumber => Tag::FNumber,
            TagField::FocalLength => Tag::FocalLength,
            TagField::ExposureTime => Tag::ExposureTime,
            TagField::Iso => Tag::PhotographicSensitivity,
            TagField::UserComment => Tag::UserComment,
        }
    }

    /// Apply this field's unit/prefix rule to a printable value.
    pub fn format(self, printable: &str) -> String {
        match self {
            TagField::FNumber => format!("f/{printable}"),
            TagField::FocalLength => format!("{printable}mm"),
            TagField::ExposureTime => format!("{printable}sec"),
            TagField::Iso => format!("ISO{printable}"),
            _ => printable.to_string(),
        }
    }
}

impl FromStr for TagField {
    type Err = UnknownTagField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TagField::ALL
            .into_iter()
            .find(|f| f.name() == s || f.legacy_name() == s)
            .ok_or_else(|| UnknownTagField(s.to_string()))
    }
}

impl std::fmt::Display for TagField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Formatted tag values for one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tags(BTreeMap<TagField, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: TagField, value: impl Into<String>) {
        self.0.insert(field, value.into());
    }

    /// Value for `field`, or `""` when absent. The single lookup used
    /// everywhere a tag is read.
    pub fn get(&self, field: TagField) -> &str {
        self.0.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Value for `field` only when present and non-empty.
    pub fn get_non_empty(&self, field: TagField) -> Option<&str> {
        Some(self.get(field)).filter(|v| !v.is_empty())
    }

    /// Values for `fields`, in order, joined by single spaces.
    pub fn join(&self, fields: &[TagField]) -> String {
        fields
            .iter()
            .map(|f| self.get(*f))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TagField, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl FromIterator<(TagField, String)> for Tags {
    fn from_iter<I: IntoIterator<Item = (TagField, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Reads the tag vocabulary from an image file.
pub trait TagExtractor {
    /// Never fails: unreadable metadata yields empty tags.
    fn extract(&self, path: &Path) -> Tags;
}

/// [`TagExtractor`] backed by `kamadak-exif`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExifExtractor;

impl TagExtractor for ExifExtractor {
    fn extract(&self, path: &Path) -> Tags {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                log::debug!("Cannot open {} for EXIF: {}", path.display(), e);
                return Tags::new();
            }
        };
        let mut reader = BufReader::new(file);
        match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => TagField::ALL
                .into_iter()
                .filter_map(|field| {
                    let raw = exif.get_field(field.exif_tag(), In::PRIMARY)?;
                    let printable = printable(field, raw)?;
                    Some((field, field.format(&printable)))
                })
                .collect(),
            Err(e) => {
                log::debug!("No readable EXIF in {}: {}", path.display(), e);
                Tags::new()
            }
        }
    }
}

/// Printable form of a raw field, before the field's unit rule is applied.
fn printable(field: TagField, raw: &Field) -> Option<String> {
    let text = match (&raw.value, field) {
        (Value::Rational(values), TagField::FNumber) if values.len() == 1 => {
            let r = &values[0];
            if r.denom == 0 {
                format_ratio(r.num, r.denom)
            } else {
                format_significant(r.num as f64 / r.denom as f64, 5)
            }
        }
        (Value::Rational(values), _) => {
            format_list(values.iter().map(|r| format_ratio(r.num, r.denom)))
        }
        (Value::Ascii(lines), _) => lines
            .iter()
            .map(|line| String::from_utf8_lossy(line).trim_matches(['\0', ' ']).to_string())
            .collect::<Vec<_>>()
            .join(" "),
        (Value::Short(values), _) => format_list(values.iter().map(u16::to_string)),
        (Value::Long(values), _) => format_list(values.iter().map(u32::to_string)),
        (Value::Undefined(bytes, _), TagField::UserComment) => decode_user_comment(bytes),
        _ => raw.display_value().to_string(),
    };
    let text = text.trim().to_string();
    Some(text).filter(|t| !t.is_empty())
}

fn format_list(items: impl Iterator<Item = String>) -> String {
    let items: Vec<String> = items.collect();
    match items.as_slice() {
        [single] => single.clone(),
        _ => format!("[{}]", items.join(", ")),
    }
}

/// Reduced fraction, or a bare integer when the denominator is 1.
pub fn format_ratio(num: u32, denom: u32) -> String {
    let divisor = gcd(num, denom);
    let (n, d) = if divisor > 1 {
        (num / divisor, denom / divisor)
    } else {
        (num, denom)
    };
    if d == 1 {
        n.to_string()
    } else {
        format!("{n}/{d}")
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Format with at most `digits` significant digits and no trailing zeros.
///
/// `2.8` stays `2.8` instead of `2.7999999999999998`, `4.0` becomes `4`.
pub fn format_significant(value: f64, digits: i32) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (digits - 1 - magnitude).max(0) as usize;
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Decode an EXIF UserComment: an 8-byte character-code header, then text.
fn decode_user_comment(bytes: &[u8]) -> String {
    if bytes.len() < 8 {
        return String::from_utf8_lossy(bytes).trim_matches('\0').to_string();
    }
    let (header, body) = bytes.split_at(8);
    let text = if header.starts_with(b"UNICODE") {
        let big_endian = body.first() == Some(&0);
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| {
                if big_endian {
                    u16::from_be_bytes([pair[0], pair[1]])
                } else {
                    u16::from_le_bytes([pair[0], pair[1]])
                }
            })
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(body).into_owned()
    };
    text.trim_matches(['\0', ' ']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn tag_field_parses_canonical_and_legacy_names() {
        assert_eq!("f_number".parse::<TagField>(), Ok(TagField::FNumber));
        assert_eq!("EXIF FNumber".parse::<TagField>(), Ok(TagField::FNumber));
        assert_eq!(" iso ".parse::<TagField>(), Ok(TagField::Iso));
        assert_eq!(
            "EXIF ISOSpeedRatings".parse::<TagField>(),
            Ok(TagField::Iso)
        );
    }

    #[test]
    fn unknown_tag_field_lists_vocabulary() {
        let err = "Lens".parse::<TagField>().unwrap_err();
        assert!(err.to_string().contains("exposure_time"));
    }

    #[test]
    fn field_formatting_rules() {
        assert_eq!(TagField::FNumber.format("2.8"), "f/2.8");
        assert_eq!(TagField::FocalLength.format("50"), "50mm");
        assert_eq!(TagField::ExposureTime.format("1/250"), "1/250sec");
        assert_eq!(TagField::Iso.format("400"), "ISO400");
        assert_eq!(TagField::Make.format("NIKON"), "NIKON");
    }

    #[test]
    fn missing_tag_defaults_to_empty() {
        let mut tags = Tags::new();
        tags.insert(TagField::Make, "NIKON");
        assert_eq!(tags.get(TagField::Make), "NIKON");
        assert_eq!(tags.get(TagField::Artist), "");
        assert_eq!(tags.get_non_empty(TagField::Artist), None);
    }

    #[test]
    fn join_keeps_field_order_and_blanks() {
        let mut tags = Tags::new();
        tags.insert(TagField::ExposureTime, "1/250sec");
        tags.insert(TagField::Iso, "ISO100");
        assert_eq!(
            tags.join(&[TagField::ExposureTime, TagField::FNumber, TagField::Iso]),
            "1/250sec  ISO100"
        );
        assert_eq!(tags.join(&[]), "");
    }

    #[test]
    fn ratio_is_reduced() {
        assert_eq!(format_ratio(10, 2500), "1/250");
        assert_eq!(format_ratio(500, 10), "50");
        assert_eq!(format_ratio(127, 2), "127/2");
    }

    #[test]
    fn significant_digits_are_clean() {
        assert_eq!(format_significant(28.0 / 10.0, 5), "2.8");
        assert_eq!(format_significant(4.0, 5), "4");
        assert_eq!(format_significant(71.0 / 10.0, 5), "7.1");
        assert_eq!(format_significant(1.0 / 3.0, 5), "0.33333");
        assert_eq!(format_significant(22.0, 5), "22");
    }

    #[test]
    fn user_comment_ascii_header_stripped() {
        let mut bytes = b"ASCII\0\0\0".to_vec();
        bytes.extend_from_slice(b"handheld\0");
        assert_eq!(decode_user_comment(&bytes), "handheld");
    }

    #[test]
    fn user_comment_unicode_little_endian() {
        let mut bytes = b"UNICODE\0".to_vec();
        for unit in "hi".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_user_comment(&bytes), "hi");
    }

    #[test]
    fn extractor_returns_empty_for_missing_file() {
        let tags = ExifExtractor.extract(Path::new("/nonexistent/photo.jpg"));
        assert!(tags.is_empty());
    }

    #[test]
    fn extractor_returns_empty_for_non_image() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        fs::write(&path, b"not really a jpeg").unwrap();
        assert!(ExifExtractor.extract(&path).is_empty());
    }

    #[test]
    fn extractor_returns_empty_for_jpeg_without_exif() {
        use image::{ImageEncoder, RgbImage};
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("plain.jpg");
        let img = RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30]));
        let file = fs::File::create(&path).unwrap();
        image::codecs::jpeg::JpegEncoder::new(file)
            .write_image(img.as_raw(), 8, 8, image::ExtendedColorType::Rgb8)
            .unwrap();
        assert!(ExifExtractor.extract(&path).is_empty());
    }
}
