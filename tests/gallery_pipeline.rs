//! End-to-end runs through the public API: resize real images into the
//! derived tiers, then render the gallery from them.

use gallerygen::config::{GalleryConfig, OrderStrategy};
use gallerygen::gallery::{self, GalleryError};
use gallerygen::metadata::ExifExtractor;
use gallerygen::paths::{AssetKind, DirRules, PathError};
use gallerygen::resize;
use image::{ImageReader, Rgb, RgbImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save(path).unwrap();
}

fn gallery_tree(names: &[&str]) -> (TempDir, GalleryConfig) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_str().unwrap().to_string();
    let mut config = GalleryConfig {
        base_dir: format!("{root}/img/max_resolution/Trip"),
        ..GalleryConfig::default()
    };
    config.location.path_root = format!("{root}/");
    config.location.local_root_url = "/photos/".to_string();
    fs::create_dir_all(&config.base_dir).unwrap();
    for name in names {
        write_jpeg(&Path::new(&config.base_dir).join(name), 640, 480);
    }
    (tmp, config)
}

fn dimensions(path: &str) -> (u32, u32) {
    ImageReader::open(path)
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .into_dimensions()
        .unwrap()
}

#[test]
fn resize_creates_every_derived_tier() {
    let (_tmp, config) = gallery_tree(&["__2_dusk.jpg"]);

    let summary = resize::resize(&config, false, None).unwrap();
    assert_eq!(summary.images, 1);
    assert_eq!(summary.encoded, 5);
    assert_eq!(summary.published, 1);
    assert_eq!(summary.skipped, 0);
    assert!(Path::new(&config.base_dir).join("dusk.jpg").is_file());

    let derived = DirRules::from(&config.dirs).derive(&format!("{}/dusk.jpg", config.base_dir));
    assert!(derived.thumbnail.contains("/img/potato/Trip/"));
    assert_eq!(dimensions(&derived.thumbnail).1, 256);
    assert_eq!(dimensions(&derived.thumbnail_optimized).1, 256);
    assert_eq!(dimensions(&derived.thumbnail_tiny).1, 96);
    assert_eq!(dimensions(&derived.mid_webp), (640, 480));
    assert_eq!(dimensions(&derived.mid_jpeg), (640, 480));

    let again = resize::resize(&config, false, None).unwrap();
    assert_eq!(again.images, 1);
    assert_eq!(again.encoded, 0);
    assert_eq!(again.skipped, 6);
}

#[test]
fn generate_after_resize_writes_gallery_file() {
    let (tmp, mut config) = gallery_tree(&["__2_dusk.jpg", "__1_dawn.jpg", "noon.jpg"]);
    resize::resize(&config, false, None).unwrap();

    let out = tmp.path().join("gallery.html");
    let template = tmp.path().join("template.html");
    fs::write(
        &template,
        "<style>/* gallery custom CSS */</style>\n<div>\n<!-- gallery output -->\n</div>\n",
    )
    .unwrap();
    config.order.strategy = OrderStrategy::Prefix;
    config.output.inline_count = 1;
    config.output.template = Some(template);
    config.output.output_file = Some(out.clone());
    config.output.custom_css = "a{color:red}".to_string();

    let stats = gallery::run(&config, &ExifExtractor).unwrap();
    assert_eq!(stats.images, 3);
    assert_eq!(stats.inlined, 1);

    let html = fs::read_to_string(&out).unwrap();
    assert!(html.starts_with("<style>a{color:red}</style>\n<div>\n"));
    assert!(html.ends_with("\n</div>\n"));

    let lines: Vec<&str> = html.lines().filter(|l| l.starts_with("<!--")).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("<!-- dawn.jpg -->"));
    assert!(lines[1].starts_with("<!-- dusk.jpg -->"));
    assert!(lines[2].starts_with("<!-- noon.jpg -->"));

    assert!(lines[0].contains("src=\"data:image/webp;base64,"));
    assert!(lines[1].contains("src=\"/photos/img/potato/Trip/dusk.jpg\""));
    assert!(lines[0].contains("href=\"/photos/img/max_resolution/Trip/dawn.jpg\""));
    assert!(lines[0].contains("data-src=\"/photos/img/potato/Trip/dawn.jpg_1500.jpg\""));

    for line in &lines {
        let href = line
            .split("href=\"/photos/")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        assert!(tmp.path().join(href).is_file(), "{href} is not on disk");
    }
}

#[test]
fn failed_encode_leaves_tree_incomplete() {
    let (_tmp, config) = gallery_tree(&[]);
    RgbImage::from_pixel(10, 70_000, Rgb([10, 10, 10]))
        .save(Path::new(&config.base_dir).join("strip.png"))
        .unwrap();

    assert!(resize::resize(&config, false, None).is_err());
    let mid_jpeg = DirRules::from(&config.dirs)
        .derive(&format!("{}/strip.png", config.base_dir))
        .mid_jpeg;
    assert!(!Path::new(&mid_jpeg).exists());

    let check = gallery::check(&config, &ExifExtractor);
    assert!(matches!(check, Err(GalleryError::Path(PathError::AssetMissing { .. }))));
}

#[test]
fn generate_refuses_incomplete_tree() {
    let (tmp, mut config) = gallery_tree(&["dawn.jpg"]);
    config.output.output_file = Some(tmp.path().join("gallery.html"));

    let err = gallery::run(&config, &ExifExtractor).unwrap_err();
    assert!(matches!(
        err,
        GalleryError::Path(PathError::AssetMissing {
            kind: AssetKind::Thumbnail,
            ..
        })
    ));
    assert!(!tmp.path().join("gallery.html").exists());
}

#[test]
fn filter_narrows_rendered_set() {
    let (tmp, mut config) = gallery_tree(&["dawn.jpg", "dusk.jpg", "noon.jpg"]);
    resize::resize(&config, false, None).unwrap();

    let out = tmp.path().join("bare.html");
    config.filter.terms = vec!["noon".to_string(), "dawn".to_string()];
    config.order.strategy = OrderStrategy::Filter;
    config.output.output_file = Some(out.clone());

    let stats = gallery::run(&config, &ExifExtractor).unwrap();
    assert_eq!(stats.images, 2);

    let html = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = html.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("<!-- noon.jpg -->"));
    assert!(lines[1].starts_with("<!-- dawn.jpg -->"));
}
