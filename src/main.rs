use clap::{Parser, Subcommand};
use gallerygen::config::{self, ConfigError, GalleryConfig, LocationMode, OrderStrategy};
use gallerygen::metadata::{ExifExtractor, TagField};
use gallerygen::{gallery, output, resize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_CONFIG_FILE: &str = "gallery.toml";

/// Flags shared by every command that reads the gallery tree.
///
/// Each flag overrides the matching `gallery.toml` key.
#[derive(clap::Args, Clone, Default)]
struct GalleryArgs {
    /// Where images are served from
    #[arg(short = 'l', long, value_enum)]
    image_location: Option<LocationMode>,

    /// Folder holding the full-size images (must contain the full-resolution token)
    #[arg(short = 'b', long)]
    basedir: Option<String>,

    /// Local path prefix replaced by the root URL in every link
    #[arg(short = 'r', long)]
    pathroot: Option<String>,

    /// Bucket root URL, required for remote-bucket
    #[arg(long, alias = "aws-s3-bucket-url")]
    bucket_url: Option<String>,

    /// Root URL when images are hosted locally
    #[arg(long)]
    local_root_url: Option<String>,

    /// Comma-separated substrings; only matching images are included
    #[arg(short = 'i', long)]
    filter_images: Option<String>,

    /// How many leading thumbnails to embed as base64
    #[arg(long)]
    hardcoded_count: Option<usize>,

    /// Directory token of the full-resolution tier
    #[arg(long)]
    max_resolution_sub_dir: Option<String>,

    /// Directory token of the thumbnail tier
    #[arg(long)]
    thumbnail_sub_dir: Option<String>,

    /// Directory token of the mid-size tier
    #[arg(long)]
    smaller_sub_dir: Option<String>,

    /// Randomize the order
    #[arg(long)]
    shuffled_order: bool,

    /// Order by the sequence of --filter-images terms
    #[arg(long)]
    order_from_filter: bool,

    /// Order by EXIF capture time
    #[arg(long)]
    order_from_exif: bool,

    /// Order by the __N_ filename prefix
    #[arg(long)]
    order_from_prefix: bool,

    /// Seed for --shuffled-order
    #[arg(long)]
    random_seed: Option<u64>,

    /// Reverse the final order
    #[arg(long)]
    reverse_order: bool,

    /// Comma-separated EXIF tags for the title, alt text and caption
    #[arg(long)]
    important_exif_tags: Option<String>,

    /// Comma-separated EXIF tags shown in parentheses in the caption
    #[arg(long)]
    other_exif_tags: Option<String>,

    /// Artist for images without one
    #[arg(long)]
    default_artist: Option<String>,

    /// Artist for every image
    #[arg(long)]
    overwrite_artist: Option<String>,

    /// HTML template to splice the gallery into ("-" for bare fragments)
    #[arg(long)]
    html_output: Option<String>,

    /// Write the result to this file instead of stdout
    #[arg(short = 'o', long)]
    output_file: Option<PathBuf>,

    /// CSS injected at the template's CSS marker
    #[arg(long)]
    custom_css: Option<String>,
}

fn parse_tags(list: &str) -> Result<Vec<TagField>, ConfigError> {
    config::parse_csv(list)
        .iter()
        .map(|name| {
            name.parse::<TagField>()
                .map_err(|e| ConfigError::Validation(e.to_string()))
        })
        .collect()
}

impl GalleryArgs {
    /// Apply every flag that was given on top of `config`.
    fn apply(self, config: &mut GalleryConfig) -> Result<(), ConfigError> {
        if let Some(mode) = self.image_location {
            config.location.mode = mode;
        }
        if let Some(dir) = self.basedir {
            config.base_dir = dir;
        }
        if let Some(root) = self.pathroot {
            config.location.path_root = root;
        }
        if let Some(url) = self.bucket_url {
            config.location.bucket_url = url;
        }
        if let Some(url) = self.local_root_url {
            config.location.local_root_url = url;
        }
        if let Some(list) = self.filter_images {
            config.filter.terms = config::parse_csv(&list);
        }
        if let Some(count) = self.hardcoded_count {
            config.output.inline_count = count;
        }
        if let Some(token) = self.max_resolution_sub_dir {
            config.dirs.full_resolution = token;
        }
        if let Some(token) = self.thumbnail_sub_dir {
            config.dirs.thumbnail = token;
        }
        if let Some(token) = self.smaller_sub_dir {
            config.dirs.mid_size = token;
        }
        if let Some(strategy) = OrderStrategy::from_flags(
            self.shuffled_order,
            self.order_from_filter,
            self.order_from_exif,
            self.order_from_prefix,
        )? {
            config.order.strategy = strategy;
        }
        if let Some(seed) = self.random_seed {
            config.order.seed = Some(seed);
        }
        if self.reverse_order {
            config.order.reverse = true;
        }
        if let Some(list) = self.important_exif_tags {
            config.captions.important_tags = parse_tags(&list)?;
        }
        if let Some(list) = self.other_exif_tags {
            config.captions.other_tags = parse_tags(&list)?;
        }
        if let Some(artist) = self.default_artist {
            config.captions.default_artist = artist;
        }
        if let Some(artist) = self.overwrite_artist {
            config.captions.artist_override = Some(artist);
        }
        match self.html_output.as_deref() {
            Some("-") => config.output.template = None,
            Some(path) => config.output.template = Some(PathBuf::from(path)),
            None => {}
        }
        if let Some(path) = self.output_file {
            config.output.output_file = Some(path);
        }
        if let Some(css) = self.custom_css {
            config.output.custom_css = css;
        }
        Ok(())
    }
}

#[derive(Parser)]
#[command(name = "gallerygen")]
#[command(about = "Static HTML photo gallery generator")]
#[command(long_about = "\
Static HTML photo gallery generator

Reads one flat folder of full-resolution photos and prints gallery markup:
one link per photo with thumbnail, mid-size and full-size URLs, an EXIF
caption, and the first thumbnails inlined as base64.

Directory convention:

  img/
  ├── max_resolution/Portfolio/      # full resolution (--basedir points here)
  │   ├── __1_dawn.jpg               # optional __N_ order prefix
  │   └── dusk.jpg
  └── potato/Portfolio/              # derived tiers, created by 'resize'
      ├── dawn.jpg                   # thumbnail
      ├── dawn.jpg.webp              # thumbnail, WebP
      ├── dawn.jpg_tiny.webp         # inlined thumbnail
      ├── dawn.jpg_1500.jpg          # mid-size JPEG
      └── dawn.jpg_900.webp          # mid-size WebP

Run 'gallerygen gen-config' to generate a documented gallery.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./gallery.toml when present)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the gallery HTML (or splice it into a template)
    Generate(GalleryArgs),
    /// Validate config and verify every derived asset exists, without rendering
    Check(GalleryArgs),
    /// Create the thumbnail and mid-size variants of every photo
    Resize {
        #[command(flatten)]
        gallery: GalleryArgs,
        /// Re-encode variants that already exist
        #[arg(long)]
        force: bool,
        /// Maximum parallel workers (default: one per CPU core)
        #[arg(long)]
        max_processes: Option<usize>,
    },
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                log::error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Generate(args) => {
            let config = resolve_config(cli.config.as_deref(), args)?;
            gallery::run(&config, &ExifExtractor)?;
        }
        Command::Check(args) => {
            let config = resolve_config(cli.config.as_deref(), args)?;
            println!("==> Checking {}", config.base_dir);
            let (assets, report) = gallery::check(&config, &ExifExtractor)?;
            output::print_check_output(&assets, &report);
            println!("==> Gallery is valid");
        }
        Command::Resize {
            gallery: args,
            force,
            max_processes,
        } => {
            let mut config = resolve_config(cli.config.as_deref(), args)?;
            if max_processes.is_some() {
                config.resize.max_processes = max_processes;
            }
            init_thread_pool(&config.resize);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_resize_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = resize::resize(&config, force, Some(tx));
            if printer.join().is_err() {
                log::warn!("progress printer thread panicked");
            }
            output::print_resize_summary(&result?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Stock defaults → config file → CLI flags, with `base_dir` normalised.
fn resolve_config(path: Option<&Path>, args: GalleryArgs) -> Result<GalleryConfig, ConfigError> {
    let default_file = Path::new(DEFAULT_CONFIG_FILE);
    let path = path.or_else(|| default_file.is_file().then_some(default_file));
    if let Some(path) = path {
        log::debug!("Loading config from {}", path.display());
    }
    let mut config = config::load_config(path)?;
    args.apply(&mut config)?;
    if !config.base_dir.is_empty() {
        let cwd = std::env::current_dir()?;
        config.base_dir = config::normalize_base_dir(&config.base_dir, &cwd);
    }
    Ok(config)
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

/// Initialize the rayon thread pool based on resize config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(resize: &config::ResizeConfig) {
    let threads = config::effective_threads(resize);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
