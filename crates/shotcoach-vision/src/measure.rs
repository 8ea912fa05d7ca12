//! Brightness metrics.

use image::GrayImage;
use shotcoach_models::ImageMetrics;

/// Mean 8-bit luminance over all pixels; 0.0 for an empty image.
pub fn mean_luminance(gray: &GrayImage) -> f64 {
    let count = gray.as_raw().len();
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = gray.as_raw().iter().map(|&p| p as u64).sum();
    sum as f64 / count as f64
}

/// Size and brightness readings of a grayscale frame.
pub fn measure(gray: &GrayImage) -> ImageMetrics {
    ImageMetrics::new(gray.width(), gray.height(), mean_luminance(gray))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use shotcoach_models::BrightnessTier;

    #[test]
    fn test_uniform_frame() {
        let gray = GrayImage::from_pixel(20, 10, Luma([200]));
        let metrics = measure(&gray);
        assert_eq!(metrics.width, 20);
        assert_eq!(metrics.height, 10);
        assert_eq!(metrics.brightness, 200.0);
        assert_eq!(metrics.brightness_tier, BrightnessTier::Bright);
    }

    #[test]
    fn test_half_dark_frame() {
        let gray = GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([0]) } else { Luma([81]) });
        let metrics = measure(&gray);
        assert_eq!(metrics.brightness, 40.5);
        assert_eq!(metrics.brightness_tier, BrightnessTier::Dim);
    }

    #[test]
    fn test_empty_frame() {
        assert_eq!(mean_luminance(&GrayImage::new(0, 0)), 0.0);
    }
}
