//! Order Resolver and Filter.
//!
//! Exactly one [`OrderStrategy`] shapes the sequence, then `order.reverse`
//! optionally flips it. Filtering runs afterwards over the prefix-stripped
//! basenames:
//!
//! ```text
//! discovered → strategy → reverse? → filter → emit
//! ```
//!
//! | Strategy | Key | Ties |
//! |---|---|---|
//! | `name` | raw discovered path, lexicographic | n/a |
//! | `filter` | position of the first matching filter term | discovery order |
//! | `exif` | capture datetime; images without one come first | discovery order |
//! | `prefix` | `__N_` number; unprefixed files come last | discovery order |
//! | `shuffle` | random, reproducible with `order.seed` | n/a |

use crate::config::{ConfigError, OrderConfig, OrderStrategy};
use crate::gallery::ImageAsset;
use crate::metadata::TagField;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Whether `basename` passes the substring allow-list.
///
/// An empty list lets everything through. Matching is case-sensitive and
/// unanchored.
pub fn matches(basename: &str, filters: &[String]) -> bool {
    filters.is_empty() || filters.iter().any(|term| basename.contains(term.as_str()))
}

/// Drop every asset whose display basename misses the allow-list.
pub fn apply_filter(assets: Vec<ImageAsset>, filters: &[String]) -> Vec<ImageAsset> {
    assets
        .into_iter()
        .filter(|asset| {
            let keep = matches(&asset.basename, filters);
            if !keep {
                log::debug!("Skipping {} (no filter term matches)", asset.basename);
            }
            keep
        })
        .collect()
}

/// Arrange `assets` (in discovery order) according to `config`.
///
/// `filters` is only consulted by [`OrderStrategy::Filter`], which fails when
/// it is empty.
pub fn resolve_order(
    assets: Vec<ImageAsset>,
    config: &OrderConfig,
    filters: &[String],
) -> Result<Vec<ImageAsset>, ConfigError> {
    let mut ordered = match config.strategy {
        OrderStrategy::Shuffle => {
            let mut assets = assets;
            match config.seed {
                Some(seed) => assets.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => assets.shuffle(&mut rand::rng()),
            }
            assets
        }
        OrderStrategy::Filter => order_by_filter(assets, filters)?,
        OrderStrategy::Exif => {
            let mut assets = assets;
            assets.sort_by(|a, b| capture_time(a).cmp(&capture_time(b)));
            assets
        }
        OrderStrategy::Prefix => {
            let mut assets = assets;
            assets.sort_by_key(|a| (a.order_number.is_none(), a.order_number));
            assets
        }
        OrderStrategy::Name => {
            let mut assets = assets;
            assets.sort_by(|a, b| a.source.cmp(&b.source));
            assets
        }
    };
    if config.reverse {
        ordered.reverse();
    }
    log::debug!(
        "Image order: {}",
        ordered
            .iter()
            .map(|a| a.source.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(ordered)
}

/// `None` sorts before every datetime, so images without one lead.
fn capture_time(asset: &ImageAsset) -> Option<&str> {
    asset.tags.get_non_empty(TagField::Datetime)
}

/// For each term in turn, take every not-yet-placed asset whose basename
/// contains it. Assets matching no term are dropped here as well.
fn order_by_filter(
    assets: Vec<ImageAsset>,
    filters: &[String],
) -> Result<Vec<ImageAsset>, ConfigError> {
    if filters.is_empty() {
        return Err(ConfigError::FilterOrderWithoutFilters);
    }
    let mut remaining: Vec<Option<ImageAsset>> = assets.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());
    for term in filters {
        for slot in remaining.iter_mut() {
            if slot
                .as_ref()
                .is_some_and(|asset| asset.basename.contains(term.as_str()))
            {
                ordered.extend(slot.take());
            }
        }
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Tags;

    fn asset(source: &str) -> ImageAsset {
        ImageAsset::from_source(source, Tags::new())
    }

    fn with_datetime(source: &str, datetime: &str) -> ImageAsset {
        let mut tags = Tags::new();
        tags.insert(TagField::Datetime, datetime);
        ImageAsset::from_source(source, tags)
    }

    fn basenames(assets: &[ImageAsset]) -> Vec<&str> {
        assets.iter().map(|a| a.basename.as_str()).collect()
    }

    fn strategy(strategy: OrderStrategy) -> OrderConfig {
        OrderConfig {
            strategy,
            ..OrderConfig::default()
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches("a.jpg", &[]));
    }

    #[test]
    fn filter_is_case_sensitive_substring() {
        let filters = vec!["DSC".to_string(), "sun".to_string()];
        assert!(matches("DSC0001.jpg", &filters));
        assert!(matches("sunset.jpg", &filters));
        assert!(!matches("dsc0001.jpg", &filters));
        assert!(!matches("Sunset.jpg", &filters));
    }

    #[test]
    fn filter_sees_stripped_name() {
        let assets = vec![asset("./m/__1_a.jpg"), asset("./m/b.jpg")];
        let kept = apply_filter(assets, &["__1".to_string()]);
        assert!(kept.is_empty());
    }

    #[test]
    fn default_is_lexicographic_by_path() {
        let assets = vec![asset("./m/c.jpg"), asset("./m/a.jpg"), asset("./m/b.jpg")];
        let ordered = resolve_order(assets, &OrderConfig::default(), &[]).unwrap();
        assert_eq!(basenames(&ordered), vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn reverse_applies_after_default() {
        let assets = vec![asset("./m/b.jpg"), asset("./m/a.jpg"), asset("./m/c.jpg")];
        let config = OrderConfig {
            reverse: true,
            ..OrderConfig::default()
        };
        let ordered = resolve_order(assets, &config, &[]).unwrap();
        assert_eq!(basenames(&ordered), vec!["c.jpg", "b.jpg", "a.jpg"]);
    }

    #[test]
    fn prefix_order_puts_unprefixed_last() {
        let assets = vec![
            asset("./m/__2_b.jpg"),
            asset("./m/c.jpg"),
            asset("./m/__1_a.jpg"),
        ];
        let ordered = resolve_order(assets, &strategy(OrderStrategy::Prefix), &[]).unwrap();
        let sources: Vec<_> = ordered.iter().map(|a| a.source.as_str()).collect();
        assert_eq!(sources, vec!["./m/__1_a.jpg", "./m/__2_b.jpg", "./m/c.jpg"]);
        assert_eq!(basenames(&ordered), vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn prefix_order_is_stable_for_ties() {
        let assets = vec![
            asset("./m/z.jpg"),
            asset("./m/__1_y.jpg"),
            asset("./m/a.jpg"),
            asset("./m/__1_x.jpg"),
        ];
        let ordered = resolve_order(assets, &strategy(OrderStrategy::Prefix), &[]).unwrap();
        assert_eq!(basenames(&ordered), vec!["y.jpg", "x.jpg", "z.jpg", "a.jpg"]);
    }

    #[test]
    fn filter_order_follows_terms() {
        let assets = vec![asset("./m/ax.jpg"), asset("./m/by.jpg"), asset("./m/xy.jpg")];
        let filters = vec!["x".to_string(), "y".to_string()];
        let ordered = resolve_order(assets, &strategy(OrderStrategy::Filter), &filters).unwrap();
        assert_eq!(basenames(&ordered), vec!["ax.jpg", "xy.jpg", "by.jpg"]);
    }

    #[test]
    fn filter_order_without_terms_fails() {
        let assets = vec![asset("./m/a.jpg")];
        let err = resolve_order(assets, &strategy(OrderStrategy::Filter), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::FilterOrderWithoutFilters));
    }

    #[test]
    fn exif_order_puts_missing_datetime_first() {
        let assets = vec![
            with_datetime("./m/late.jpg", "2024:12:02 09:00:00"),
            with_datetime("./m/early.jpg", "2024:11:30 18:45:10"),
            asset("./m/none.jpg"),
        ];
        let ordered = resolve_order(assets, &strategy(OrderStrategy::Exif), &[]).unwrap();
        assert_eq!(basenames(&ordered), vec!["none.jpg", "early.jpg", "late.jpg"]);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let make = || (0..20).map(|i| asset(&format!("./m/{i:02}.jpg"))).collect::<Vec<_>>();
        let config = OrderConfig {
            strategy: OrderStrategy::Shuffle,
            reverse: false,
            seed: Some(7),
        };
        let first = resolve_order(make(), &config, &[]).unwrap();
        let second = resolve_order(make(), &config, &[]).unwrap();
        assert_eq!(basenames(&first), basenames(&second));
        assert_eq!(first.len(), 20);
    }

    #[test]
    fn reverse_applies_after_shuffle() {
        let make = || (0..10).map(|i| asset(&format!("./m/{i}.jpg"))).collect::<Vec<_>>();
        let forward = OrderConfig {
            strategy: OrderStrategy::Shuffle,
            reverse: false,
            seed: Some(3),
        };
        let backward = OrderConfig {
            reverse: true,
            ..forward.clone()
        };
        let mut a = basenames(&resolve_order(make(), &forward, &[]).unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        a.reverse();
        let b = resolve_order(make(), &backward, &[]).unwrap();
        assert_eq!(a, basenames(&b));
    }
}
