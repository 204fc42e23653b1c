//! Shared types for the speck segmentation pipeline.

use serde::{Deserialize, Serialize};

use crate::segment::BlobSegmenter;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` for overlay rendering consumers.
pub use image::RgbaImage;

/// A blob label.
///
/// `1..=K` are canonical labels after consolidation; during the forward
/// scan the same range holds provisional labels. [`BACKGROUND`] marks
/// unlabeled pixels.
pub type Label = u32;

/// The background sentinel: pixels that belong to no blob.
pub const BACKGROUND: Label = 0;

/// A pixel position in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelCoord {
    /// Column (pixels from the left edge).
    pub x: u32,
    /// Row (pixels from the top edge).
    pub y: u32,
}

impl PixelCoord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A binary foreground/background classification over a pixel grid.
///
/// Produced by [`crate::threshold::binarize`] and consumed by the
/// segmentation engine, which only ever asks "is this pixel foreground?".
/// Queries outside the grid answer `false`, so callers never need their
/// own bounds checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl ForegroundMask {
    /// Create an all-background mask.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    /// Create a mask by evaluating `classify` at every pixel.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, classify: impl Fn(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.data[y as usize * width as usize + x as usize] = classify(x, y);
            }
        }
        mask
    }

    /// Mask width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Mask extent as [`Dimensions`].
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Whether the pixel at `(x, y)` is foreground.
    ///
    /// Out-of-range coordinates are background.
    #[must_use]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.data[y as usize * self.width as usize + x as usize]
    }

    /// Mark the pixel at `(x, y)` as foreground or background.
    pub fn set(&mut self, x: u32, y: u32, foreground: bool) {
        self.data[y as usize * self.width as usize + x as usize] = foreground;
    }

    /// Total number of foreground pixels in the mask.
    #[must_use]
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&fg| fg).count()
    }
}

/// A requested scan window, before clamping.
///
/// Negative values mean "use the image's full extent on that edge";
/// positive values beyond the grid are clamped by [`Self::clamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Requested left edge (inclusive).
    pub x_min: i64,
    /// Requested right edge (exclusive).
    pub x_max: i64,
    /// Requested top edge (inclusive).
    pub y_min: i64,
    /// Requested bottom edge (exclusive).
    pub y_max: i64,
}

impl WindowSpec {
    /// A window covering the full image extent on every edge.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            x_min: -1,
            x_max: -1,
            y_min: -1,
            y_max: -1,
        }
    }

    /// Resolve the request against an actual grid extent.
    ///
    /// Negative edges become the full extent on that side; positive
    /// edges are clamped into `[0, extent]`. A request whose minimum
    /// ends up at or beyond its maximum yields an empty window.
    #[must_use]
    pub fn clamp(self, dimensions: Dimensions) -> Window {
        Window {
            x_min: clamp_min_edge(self.x_min, dimensions.width),
            x_max: clamp_max_edge(self.x_max, dimensions.width),
            y_min: clamp_min_edge(self.y_min, dimensions.height),
            y_max: clamp_max_edge(self.y_max, dimensions.height),
        }
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::full()
    }
}

fn clamp_min_edge(value: i64, extent: u32) -> u32 {
    u32::try_from(value.clamp(0, i64::from(extent))).unwrap_or(0)
}

fn clamp_max_edge(value: i64, extent: u32) -> u32 {
    if value < 0 {
        extent
    } else {
        u32::try_from(value.min(i64::from(extent))).unwrap_or(extent)
    }
}

/// The clamped scan window actually used by a segmentation run.
///
/// Half-open on both axes: a pixel `(x, y)` is inside when
/// `x_min <= x < x_max` and `y_min <= y < y_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Left edge (inclusive).
    pub x_min: u32,
    /// Right edge (exclusive).
    pub x_max: u32,
    /// Top edge (inclusive).
    pub y_min: u32,
    /// Bottom edge (exclusive).
    pub y_max: u32,
}

impl Window {
    /// Window width in pixels (zero when empty).
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.x_max.saturating_sub(self.x_min)
    }

    /// Window height in pixels (zero when empty).
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.y_max.saturating_sub(self.y_min)
    }

    /// Whether the window contains no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Configuration for the segmentation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Gaussian blur sigma applied before thresholding. Set this on the
    /// order of the expected blob radius to suppress speckle noise.
    pub blur_sigma: f32,

    /// Threshold as a fraction of the maximum luminance (clamped to
    /// `[0, 1]` by [`crate::threshold::binarize`]).
    pub threshold_fraction: f32,

    /// Whether to invert the foreground predicate. The default captures
    /// dark blobs on a light background; inverting captures light blobs
    /// on a dark background.
    pub invert: bool,

    /// Scan window from which blobs are extracted.
    pub window: WindowSpec,
}

impl PipelineConfig {
    /// Default Gaussian blur sigma.
    pub const DEFAULT_BLUR_SIGMA: f32 = 1.4;

    /// Default threshold fraction of maximum luminance.
    pub const DEFAULT_THRESHOLD_FRACTION: f32 = 0.5;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            blur_sigma: Self::DEFAULT_BLUR_SIGMA,
            threshold_fraction: Self::DEFAULT_THRESHOLD_FRACTION,
            invert: false,
            window: WindowSpec::full(),
        }
    }
}

/// Result of running the full segmentation pipeline.
///
/// Carries everything the reporting layers need: the clamped window
/// actually scanned, the blob count, and one centroid per blob in final
/// label order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,

    /// The clamped window actually used for the scan.
    pub window: Window,

    /// Total number of blobs found (the maximum canonical label).
    pub blob_count: Label,

    /// Integer-truncated centroid of each blob, indexed by final label
    /// minus one.
    pub centroids: Vec<PixelCoord>,
}

/// Result of running the pipeline with intermediate stage outputs preserved.
///
/// Keeps the raster intermediates and the segmenter itself so diagnostic
/// consumers (overlay rendering, blob queries) can inspect every stage.
/// Callers that only need centroids should prefer [`crate::process`],
/// which discards the intermediates.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 1: decoded grayscale image.
    pub grayscale: GrayImage,
    /// Stage 2: Gaussian-blurred image.
    pub blurred: GrayImage,
    /// Stages 3+4: thresholded mask, scanned and consolidated. Blob
    /// queries and the label grid are available through the segmenter.
    pub segmenter: BlobSegmenter,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// Condense into a [`ProcessResult`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::segment::SegmentError::NotSegmented`] if the held
    /// segmenter has not completed a run; `process_staged` always returns
    /// a segmented instance, so this only fails for hand-built values.
    pub fn summary(&self) -> Result<ProcessResult, crate::segment::SegmentError> {
        Ok(ProcessResult {
            dimensions: self.dimensions,
            window: self.segmenter.window(),
            blob_count: self.segmenter.max_label()?,
            centroids: self.segmenter.centroids()?,
        })
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// A blob query was rejected by the segmentation engine.
    #[error(transparent)]
    Segment(#[from] crate::segment::SegmentError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- ForegroundMask tests ---

    #[test]
    fn new_mask_is_all_background() {
        let mask = ForegroundMask::new(4, 3);
        assert_eq!(mask.foreground_count(), 0);
        assert!(!mask.is_foreground(0, 0));
    }

    #[test]
    fn from_fn_classifies_each_pixel() {
        let mask = ForegroundMask::from_fn(3, 3, |x, y| x == y);
        assert!(mask.is_foreground(0, 0));
        assert!(mask.is_foreground(2, 2));
        assert!(!mask.is_foreground(1, 2));
        assert_eq!(mask.foreground_count(), 3);
    }

    #[test]
    fn out_of_range_query_is_background() {
        let mask = ForegroundMask::from_fn(2, 2, |_, _| true);
        assert!(!mask.is_foreground(2, 0));
        assert!(!mask.is_foreground(0, 2));
        assert!(!mask.is_foreground(u32::MAX, u32::MAX));
    }

    #[test]
    fn set_marks_single_pixel() {
        let mut mask = ForegroundMask::new(3, 3);
        mask.set(1, 2, true);
        assert!(mask.is_foreground(1, 2));
        assert_eq!(mask.foreground_count(), 1);
    }

    // --- Window clamping tests ---

    const DIMS: Dimensions = Dimensions {
        width: 10,
        height: 8,
    };

    #[test]
    fn full_spec_clamps_to_whole_image() {
        let window = WindowSpec::full().clamp(DIMS);
        assert_eq!(
            window,
            Window {
                x_min: 0,
                x_max: 10,
                y_min: 0,
                y_max: 8,
            },
        );
        assert!(!window.is_empty());
    }

    #[test]
    fn negative_edges_mean_full_extent() {
        let spec = WindowSpec {
            x_min: -5,
            x_max: -1,
            y_min: 2,
            y_max: -3,
        };
        let window = spec.clamp(DIMS);
        assert_eq!(window.x_min, 0);
        assert_eq!(window.x_max, 10);
        assert_eq!(window.y_min, 2);
        assert_eq!(window.y_max, 8);
    }

    #[test]
    fn oversized_edges_are_clamped_to_extent() {
        let spec = WindowSpec {
            x_min: 0,
            x_max: 100,
            y_min: 0,
            y_max: 100,
        };
        let window = spec.clamp(DIMS);
        assert_eq!(window.x_max, 10);
        assert_eq!(window.y_max, 8);
    }

    #[test]
    fn inverted_request_yields_empty_window() {
        let spec = WindowSpec {
            x_min: 7,
            x_max: 3,
            y_min: 0,
            y_max: -1,
        };
        let window = spec.clamp(DIMS);
        assert!(window.is_empty());
        assert_eq!(window.width(), 0);
    }

    #[test]
    fn interior_window_passes_through() {
        let spec = WindowSpec {
            x_min: 2,
            x_max: 6,
            y_min: 1,
            y_max: 7,
        };
        let window = spec.clamp(DIMS);
        assert_eq!(window.width(), 4);
        assert_eq!(window.height(), 6);
    }

    // --- PipelineConfig tests ---

    #[test]
    fn config_defaults() {
        let config = PipelineConfig::default();
        assert!((config.blur_sigma - PipelineConfig::DEFAULT_BLUR_SIGMA).abs() < f32::EPSILON);
        assert!(
            (config.threshold_fraction - PipelineConfig::DEFAULT_THRESHOLD_FRACTION).abs()
                < f32::EPSILON
        );
        assert!(!config.invert);
        assert_eq!(config.window, WindowSpec::full());
    }

    // --- Serde tests ---

    #[test]
    fn process_result_serde_round_trip() {
        let result = ProcessResult {
            dimensions: DIMS,
            window: WindowSpec::full().clamp(DIMS),
            blob_count: 2,
            centroids: vec![PixelCoord::new(1, 2), PixelCoord::new(7, 5)],
        };
        let json = serde_json::to_string(&result).unwrap();
        let deserialized: ProcessResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, deserialized);
    }

    #[test]
    fn error_display_messages() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "input image data is empty",
        );
    }
}
