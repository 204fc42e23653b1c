//! speck-pipeline: Pure blob segmentation pipeline (sans-IO).
//!
//! Extracts connected groups of foreground pixels ("blobs") from raster
//! images and reports each blob's member coordinates and centroid:
//! grayscale -> blur -> threshold -> forward-scan labeling ->
//! equivalence consolidation -> blob queries.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. All filesystem interaction
//! lives in the `speck` CLI crate.

pub mod blur;
pub mod equivalence;
pub mod grayscale;
pub mod overlay;
pub mod segment;
pub mod threshold;
pub mod types;

pub use equivalence::EquivalenceRegistry;
pub use segment::{BlobSegmenter, SegmentError};
pub use types::{
    BACKGROUND, Dimensions, ForegroundMask, Label, PipelineConfig, PipelineError, PixelCoord,
    ProcessResult, StagedResult, Window, WindowSpec,
};

/// Run the full segmentation pipeline.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration,
/// then produces a [`ProcessResult`] with the clamped scan window, the
/// blob count, and one centroid per blob.
///
/// # Pipeline steps
///
/// 1. Decode image and convert to grayscale
/// 2. Gaussian blur (noise reduction)
/// 3. Threshold to a binary foreground mask
/// 4. Forward raster scan assigning provisional labels
/// 5. Equivalence consolidation into dense final labels
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized.
pub fn process(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    let staged = process_staged(image_bytes, config)?;
    Ok(staged.summary()?)
}

/// Run the pipeline, preserving intermediate stage outputs.
///
/// Returns the grayscale and blurred rasters along with the segmenter
/// itself, so diagnostic consumers can query individual blobs, read the
/// label grid, or render an overlay. Segmentation has already completed
/// on the returned segmenter.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    // 1. Decode and convert to grayscale.
    let gray = grayscale::decode_and_grayscale(image_bytes)?;
    let dimensions = Dimensions {
        width: gray.width(),
        height: gray.height(),
    };

    // 2. Gaussian blur.
    let blurred = blur::gaussian_blur(&gray, config.blur_sigma);

    // 3. Threshold to a foreground mask.
    let mask = threshold::binarize(&blurred, config.threshold_fraction, config.invert);
    log::trace!(
        "mask has {} foreground pixels of {}x{}",
        mask.foreground_count(),
        dimensions.width,
        dimensions.height,
    );

    // 4+5. Scan and consolidate.
    let mut segmenter = BlobSegmenter::new(mask, config.window);
    segmenter.segment();

    Ok(StagedResult {
        grayscale: gray,
        blurred,
        segmenter,
        dimensions,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Encode a white canvas with dark filled rectangles as a PNG.
    fn blobs_png(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            let dark = rects
                .iter()
                .any(|&(rx, ry, rw, rh)| x >= rx && x < rx + rw && y >= ry && y < ry + rh);
            if dark {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    /// Configuration with blur disabled so blob extents stay exact.
    fn sharp_config() -> PipelineConfig {
        PipelineConfig {
            blur_sigma: 0.0,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(&[0xFF, 0x00], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn uniform_white_image_has_no_blobs() {
        let png = blobs_png(16, 16, &[]);
        let result = process(&png, &sharp_config()).unwrap();
        assert_eq!(result.blob_count, 0);
        assert!(result.centroids.is_empty());
    }

    #[test]
    fn single_square_is_one_blob_with_centered_centroid() {
        let png = blobs_png(20, 20, &[(4, 4, 6, 6)]);
        let result = process(&png, &sharp_config()).unwrap();
        assert_eq!(result.blob_count, 1);
        let centroid = result.centroids[0];
        assert!((6..=7).contains(&centroid.x));
        assert!((6..=7).contains(&centroid.y));
    }

    #[test]
    fn separated_squares_are_distinct_blobs() {
        let png = blobs_png(30, 30, &[(2, 2, 5, 5), (20, 20, 5, 5)]);
        let result = process(&png, &sharp_config()).unwrap();
        assert_eq!(result.blob_count, 2);
        assert_eq!(result.centroids.len(), 2);
    }

    #[test]
    fn window_limits_the_scan() {
        let png = blobs_png(30, 30, &[(2, 2, 5, 5), (20, 20, 5, 5)]);
        let config = PipelineConfig {
            window: WindowSpec {
                x_min: 0,
                x_max: 15,
                y_min: 0,
                y_max: 15,
            },
            ..sharp_config()
        };
        let result = process(&png, &config).unwrap();
        assert_eq!(result.blob_count, 1);
        assert_eq!(result.window.x_max, 15);
    }

    #[test]
    fn staged_result_exposes_segmented_engine() {
        let png = blobs_png(12, 12, &[(3, 3, 4, 4)]);
        let staged = process_staged(&png, &sharp_config()).unwrap();
        assert_eq!(staged.segmenter.max_label(), Ok(1));
        assert_eq!(staged.grayscale.width(), 12);
        assert_eq!(staged.blurred.height(), 12);
        assert_eq!(staged.summary().unwrap().blob_count, 1);
    }

    #[test]
    fn invert_extracts_light_blobs() {
        // Light square on dark background needs the inverted predicate.
        let img = image::RgbaImage::from_fn(16, 16, |x, y| {
            if (5..10).contains(&x) && (5..10).contains(&y) {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();

        let config = PipelineConfig {
            invert: true,
            ..sharp_config()
        };
        let result = process(&buf, &config).unwrap();
        assert_eq!(result.blob_count, 1);
        assert_eq!(result.centroids[0], PixelCoord::new(7, 7));
    }
}
