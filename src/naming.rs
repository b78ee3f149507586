//! Filename parsing for the `__N_` order-prefix convention.
//!
//! A full-resolution file may carry an explicit sort position as a prefix:
//! `__12_sunset.jpg` sorts as 12 and is published as `sunset.jpg`. The prefix
//! is stripped for every purpose other than ordering: derived asset paths,
//! URLs, captions and filters all see the stripped name.
//!
//! - `__2_b.jpg` → number=Some(2), name="b.jpg"
//! - `__0_first.jpg` → number=Some(0), name="first.jpg"
//! - `c.jpg` → number=None, name="c.jpg"
//! - `__x_c.jpg` → number=None, name="__x_c.jpg" (not a valid prefix)
//! - `__99999999999999999999_d.jpg` → number=Some(u64::MAX), name="d.jpg"

/// Result of parsing a basename like `__12_sunset.jpg`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Order number if a valid prefix is present.
    pub number: Option<u64>,
    /// Basename with the prefix removed. For unprefixed names, the full input.
    pub name: String,
}

/// Parse a basename following the `__N_name` convention.
pub fn parse_order_prefix(basename: &str) -> ParsedName {
    if let Some(rest) = basename.strip_prefix("__") {
        if let Some(underscore) = rest.find('_') {
            let digits = &rest[..underscore];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                // Out-of-range numbers still count as a prefix; they sort last.
                let num = digits.parse::<u64>().unwrap_or(u64::MAX);
                return ParsedName {
                    number: Some(num),
                    name: rest[underscore + 1..].to_string(),
                };
            }
        }
    }
    ParsedName {
        number: None,
        name: basename.to_string(),
    }
}

/// Strip the order prefix from the last component of a `/`-separated path.
///
/// Only the basename is touched; directory components keep any `__N_`
/// text they happen to contain.
pub fn strip_order_prefix(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, base)) => format!("{}/{}", dir, parse_order_prefix(base).name),
        None => parse_order_prefix(path).name,
    }
}

/// The last `/`-separated component of a path string.
pub fn basename(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, base)| base).unwrap_or(path)
}
