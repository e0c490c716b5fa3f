// THEORY:
// The basic metrics are pure per-channel error statistics and the only metrics
// that look at raw bytes rather than luminance.
//
// MSE normalization is unusual and intentional: the squared differences of all
// four channels (alpha included) are summed, then divided by the number of
// *pixels*, not bytes. Each pixel therefore contributes its whole 4-channel error
// as one term, so the upper bound is 4 * 255^2 = 260100, not 255^2. Downstream
// scores depend on these exact numbers, so the normalization is kept as is.

use crate::core_modules::raster::RasterImage;
use crate::core_modules::smart_pixel::smart_pixel::SmartPixel;
use tracing::debug;

pub const DEFAULT_MAX_PIXEL_VALUE: f64 = 255.0;

/// Mean squared error between two rasters, or `None` if they are not comparable.
pub fn compute_mse(first: &RasterImage, second: &RasterImage) -> Option<f64> {
    if !first.same_dimensions(second) {
        return None;
    }

    let sum_squared: u64 = first
        .iter_pixels()
        .zip(second.iter_pixels())
        .map(|(a, b)| SmartPixel::new(a, b).squared_error() as u64)
        .sum();

    let mse = sum_squared as f64 / first.pixel_count() as f64;
    debug!(mse, "computed mse");
    Some(mse)
}

/// Peak signal-to-noise ratio in decibels.
///
/// An exact match (`mse == 0`) yields `None` rather than infinity.
pub fn compute_psnr(mse: Option<f64>, max_value: f64) -> Option<f64> {
    match mse {
        Some(mse) if mse != 0.0 => Some(10.0 * (max_value * max_value / mse).log10()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_images_have_zero_mse_and_no_psnr() {
        let raster = RasterImage::new(2, 2, (0..16).collect()).unwrap();
        let mse = compute_mse(&raster, &raster);
        assert_eq!(mse, Some(0.0));
        assert_eq!(compute_psnr(mse, DEFAULT_MAX_PIXEL_VALUE), None);
    }

    #[test]
    fn black_versus_white_divides_by_pixel_count() {
        let black = RasterImage::filled(4, 4, [0, 0, 0, 255]).unwrap();
        let white = RasterImage::filled(4, 4, [255, 255, 255, 255]).unwrap();
        assert_eq!(compute_mse(&black, &white), Some(195_075.0));
    }

    #[test]
    fn mismatched_dimensions_are_not_comparable() {
        let wide = RasterImage::filled(4, 2, [0, 0, 0, 255]).unwrap();
        let tall = RasterImage::filled(2, 4, [0, 0, 0, 255]).unwrap();
        assert_eq!(compute_mse(&wide, &tall), None);
        assert_eq!(compute_psnr(compute_mse(&wide, &tall), 255.0), None);
    }

    #[test]
    fn psnr_from_known_mse() {
        let psnr = compute_psnr(Some(65025.0), 255.0).unwrap();
        assert!(psnr.abs() < 1e-12);
        let psnr = compute_psnr(Some(6.5025), 255.0).unwrap();
        assert!((psnr - 40.0).abs() < 1e-9);
    }

    #[test]
    fn mse_is_symmetric() {
        let a = RasterImage::new(2, 1, vec![10, 20, 30, 40, 50, 60, 70, 80]).unwrap();
        let b = RasterImage::new(2, 1, vec![15, 10, 90, 40, 0, 255, 70, 81]).unwrap();
        assert_eq!(compute_mse(&a, &b), compute_mse(&b, &a));
    }
}
