//! Diagnostic overlay rendering for a segmented image.
//!
//! Maps the final label grid onto a normalized gray scale (background
//! white, blobs darker with increasing label), then marks each blob
//! centroid with a small circle and the scan window with a rectangle.
//! The result is an in-memory [`RgbaImage`]; writing it anywhere is the
//! caller's concern.

use image::Rgba;
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::segment::{BlobSegmenter, SegmentError};
use crate::types::{BACKGROUND, Label, RgbaImage};

/// Marker color for centroids and the window boundary.
const MARKER_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Centroid marker circle radius in pixels.
const MARKER_RADIUS: i32 = 2;

/// Render the diagnostic overlay for a completed segmentation run.
///
/// # Errors
///
/// Returns [`SegmentError::NotSegmented`] if the segmenter has not
/// completed a run.
#[allow(clippy::cast_possible_wrap)]
pub fn render_overlay(segmenter: &BlobSegmenter) -> Result<RgbaImage, SegmentError> {
    let max = segmenter.max_label()?;
    let centroids = segmenter.centroids()?;
    let dims = segmenter.dimensions();

    let mut canvas = RgbaImage::from_fn(dims.width, dims.height, |x, y| {
        let shade = label_shade(segmenter.label_at(x, y), max);
        Rgba([shade, shade, shade, 255])
    });

    for centroid in &centroids {
        draw_hollow_circle_mut(
            &mut canvas,
            (centroid.x as i32, centroid.y as i32),
            MARKER_RADIUS,
            MARKER_COLOR,
        );
    }

    let window = segmenter.window();
    if !window.is_empty() {
        let rect = Rect::at(window.x_min as i32, window.y_min as i32)
            .of_size(window.width(), window.height());
        draw_hollow_rect_mut(&mut canvas, rect, MARKER_COLOR);
    }

    Ok(canvas)
}

/// Normalized intensity for a label: background stays white, labeled
/// pixels darken with increasing label so distinct blobs are visually
/// separable.
#[allow(clippy::cast_possible_truncation)]
fn label_shade(label: Label, max: Label) -> u8 {
    if label == BACKGROUND || max == BACKGROUND {
        return u8::MAX;
    }
    u8::MAX - (u64::from(label) * u64::from(u8::MAX) / u64::from(max)) as u8
}
