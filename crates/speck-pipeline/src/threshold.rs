//! Luminance thresholding: reduce a grayscale image to a foreground mask.
//!
//! The threshold is given as a fraction of the maximum luminance. By
//! default pixels *below* the threshold are foreground, so dark blobs on
//! a light background are extracted -- the common case for scanned
//! particle and porosity imagery. The `invert` flag flips the predicate
//! for light-on-dark material.

use image::GrayImage;

use crate::types::ForegroundMask;

/// Reduce a grayscale image to a binary foreground mask.
///
/// `fraction` is interpreted against the 8-bit luminance range and is
/// clamped to `[0, 1]`; a pixel is foreground when its luminance is
/// strictly below `fraction * 255` (or at/above it when `invert` is set).
#[must_use = "returns the binary foreground mask"]
pub fn binarize(image: &GrayImage, fraction: f32, invert: bool) -> ForegroundMask {
    let cutoff = threshold_value(fraction);
    ForegroundMask::from_fn(image.width(), image.height(), |x, y| {
        let below = image.get_pixel(x, y).0[0] < cutoff;
        below != invert
    })
}

/// Map a threshold fraction to an 8-bit luminance cutoff.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn threshold_value(fraction: f32) -> u8 {
    (fraction.clamp(0.0, 1.0) * 255.0).round() as u8
}
