//! Gaussian blur for noise suppression before thresholding.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`]. Smoothing on the order
//! of the expected blob radius removes speckle noise that would otherwise
//! survive thresholding as spurious one-pixel blobs.

use image::GrayImage;

/// Apply Gaussian blur to a grayscale image.
///
/// Higher `sigma` values produce more smoothing. Non-positive sigma
/// values return the image unchanged, since the underlying `imageproc`
/// function does not accept `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sigma_returns_input_unchanged() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, image::Luma([255]));
        assert_eq!(gaussian_blur(&img, 0.0), img);
    }

    #[test]
    fn negative_sigma_returns_input_unchanged() {
        let img = GrayImage::from_pixel(4, 4, image::Luma([77]));
        assert_eq!(gaussian_blur(&img, -1.0), img);
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = GrayImage::new(13, 29);
        let blurred = gaussian_blur(&img, 1.4);
        assert_eq!(blurred.width(), 13);
        assert_eq!(blurred.height(), 29);
    }

    #[test]
    fn blur_spreads_an_isolated_peak() {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, image::Luma([255]));
        let blurred = gaussian_blur(&img, 1.5);
        // The peak loses mass and its neighbours gain some.
        assert!(blurred.get_pixel(4, 4).0[0] < 255);
        assert!(blurred.get_pixel(4, 5).0[0] > 0);
    }
}
