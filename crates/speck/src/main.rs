//! speck: batch blob extraction from image files.
//!
//! Crawls the given files and directories, runs the segmentation
//! pipeline on every filename matching the filter, and reports blob
//! centroids. Optionally writes a diagnostic overlay image per input
//! and appends one JSON record per input to a dump file.
//!
//! A failure on one input is logged and the crawl continues with the
//! next item; the batch never aborts as a whole.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::Parser;
use regex::Regex;
use speck_export::ImageRecord;
use speck_pipeline::{PipelineConfig, StagedResult, WindowSpec, overlay};

/// Directory overlay images are written into, beside the working
/// directory, mirroring the input filenames.
const SEGMENT_DIR: &str = "segments";

/// Extract blobs and centroids from images beneath the given paths.
#[derive(Parser)]
#[command(name = "speck", version)]
struct Args {
    /// Files or directories to analyse.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Regular expression filenames must match to be analysed.
    #[arg(long, default_value = r"(?i)\.jpe?g$")]
    regex: String,

    /// Descend into subdirectories.
    #[arg(long)]
    recursive: bool,

    /// Write a `segments/<stem>_segments.<ext>` overlay per image.
    #[arg(long)]
    save_segments: bool,

    /// Threshold fraction of maximum luminance.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_THRESHOLD_FRACTION)]
    threshold: f32,

    /// Gaussian blur sigma; set on the order of the expected blob radius.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BLUR_SIGMA)]
    blur_sigma: f32,

    /// Extract light blobs on a dark background instead of dark on light.
    #[arg(long)]
    invert: bool,

    /// Scan window; negative values mean full extent on that edge.
    #[arg(
        long,
        num_args = 4,
        value_names = ["X_MIN", "X_MAX", "Y_MIN", "Y_MAX"],
        allow_negative_numbers = true,
    )]
    window: Option<Vec<i64>>,

    /// Append one JSON record per analysed image to this file.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Walks the search paths and analyses matching files.
struct Crawler {
    filter: Regex,
    recursive: bool,
    save_segments: bool,
    config: PipelineConfig,
    output: Option<File>,
}

impl Crawler {
    /// Visit one path: traverse directories, analyse matching files,
    /// ignore the rest.
    fn visit(&mut self, path: &Path) {
        if path.is_dir() {
            log::info!("traversing {}", path.display());
            let children = match fs::read_dir(path) {
                Ok(iter) => {
                    let mut paths: Vec<PathBuf> =
                        iter.filter_map(Result::ok).map(|entry| entry.path()).collect();
                    // Deterministic batch order regardless of readdir order.
                    paths.sort();
                    paths
                }
                Err(error) => {
                    log::error!("{}: {error}", path.display());
                    return;
                }
            };
            for child in children {
                if child.is_dir() && !self.recursive {
                    log::trace!("ignored {}", child.display());
                    continue;
                }
                self.visit(&child);
            }
        } else if self.matches(path) {
            if let Err(error) = self.analyse_image(path) {
                // One bad input must not take down the batch.
                log::error!("{}: {error}", path.display());
            }
        } else {
            log::trace!("ignored {}", path.display());
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| self.filter.is_match(name))
    }

    /// Run the pipeline on one file and emit the requested outputs.
    fn analyse_image(&mut self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        log::info!("running image analysis on {}", path.display());
        let bytes = fs::read(path)?;
        let staged = speck_pipeline::process_staged(&bytes, &self.config)?;
        let result = staged.summary()?;
        log::info!("found {} blobs in {}", result.blob_count, path.display());

        let segmented_file = if self.save_segments {
            Some(write_overlay(path, &staged)?)
        } else {
            None
        };

        if let Some(dump) = self.output.as_mut() {
            let record =
                ImageRecord::from_result(path.display().to_string(), segmented_file, &result);
            let line = speck_export::to_json_line(&record)?;
            writeln!(dump, "{line}")?;
            log::info!("dumped record for {}", path.display());
        }

        Ok(())
    }
}

/// Render the overlay and write it next to the originals under
/// [`SEGMENT_DIR`]. Returns the filename written.
fn write_overlay(path: &Path, staged: &StagedResult) -> Result<String, Box<dyn std::error::Error>> {
    let rendered = overlay::render_overlay(&staged.segmenter)?;
    fs::create_dir_all(SEGMENT_DIR)?;
    let name = segmented_file_name(path);
    let target = Path::new(SEGMENT_DIR).join(&name);
    // JPEG cannot carry an alpha channel; flatten before saving.
    image::DynamicImage::ImageRgba8(rendered).to_rgb8().save(&target)?;
    log::info!("wrote overlay {}", target.display());
    Ok(name)
}

/// `<stem>_segments.<ext>`, keeping the original extension where there
/// is one.
fn segmented_file_name(path: &Path) -> String {
    let stem = path.file_stem().and_then(OsStr::to_str).unwrap_or("image");
    path.extension().and_then(OsStr::to_str).map_or_else(
        || format!("{stem}_segments.png"),
        |ext| format!("{stem}_segments.{ext}"),
    )
}

/// Build a window spec from the four `--window` values.
fn window_from_values(values: &[i64]) -> WindowSpec {
    // clap guarantees exactly four values.
    WindowSpec {
        x_min: values.first().copied().unwrap_or(-1),
        x_max: values.get(1).copied().unwrap_or(-1),
        y_min: values.get(2).copied().unwrap_or(-1),
        y_max: values.get(3).copied().unwrap_or(-1),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let filter = Regex::new(&args.regex).map_err(|e| format!("--regex: {e}"))?;
    let window = args
        .window
        .as_deref()
        .map_or_else(WindowSpec::full, window_from_values);
    let config = PipelineConfig {
        blur_sigma: args.blur_sigma,
        threshold_fraction: args.threshold,
        invert: args.invert,
        window,
    };

    let output = match &args.output {
        Some(path) => Some(
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("--output {}: {e}", path.display()))?,
        ),
        None => None,
    };

    let mut crawler = Crawler {
        filter,
        recursive: args.recursive,
        save_segments: args.save_segments,
        config,
        output,
    };
    for path in &args.paths {
        crawler.visit(path);
    }

    Ok(())
}
