// THEORY:
// Structural similarity computed as a single global statistic: one window that
// covers the whole image, over BT.709 luminance. This is a deliberate
// simplification of windowed SSIM and must not be "upgraded" to 8x8 or 11x11
// tiles, because that would change every reported number.
//
//   SSIM = ((2 mu1 mu2 + C1)(2 sigma12 + C2)) / ((mu1^2 + mu2^2 + C1)(sigma1^2 + sigma2^2 + C2))
//
// with C1 = (0.01 * 255)^2 and C2 = (0.03 * 255)^2. Both constants are positive,
// so the denominator never vanishes.

use crate::core_modules::luminance::LuminanceField;
use crate::core_modules::raster::RasterImage;
use tracing::debug;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DYNAMIC_RANGE: f64 = 255.0;
pub const C1: f64 = (K1 * DYNAMIC_RANGE) * (K1 * DYNAMIC_RANGE);
pub const C2: f64 = (K2 * DYNAMIC_RANGE) * (K2 * DYNAMIC_RANGE);

/// Global SSIM between two rasters, or `None` if they are not comparable.
pub fn compute_ssim(first: &RasterImage, second: &RasterImage) -> Option<f64> {
    if !first.same_dimensions(second) {
        return None;
    }
    let ssim = ssim_of_fields(&first.luminance_field(), &second.luminance_field());
    debug!(ssim, "computed ssim");
    Some(ssim)
}

/// Global SSIM of two equally sized luminance fields.
pub fn ssim_of_fields(first: &LuminanceField, second: &LuminanceField) -> f64 {
    let mu1 = first.mean();
    let mu2 = second.mean();
    let sigma1_sq = first.variance(mu1);
    let sigma2_sq = second.variance(mu2);
    let sigma12 = first.covariance(second, mu1, mu2);

    let numerator = (2.0 * mu1 * mu2 + C1) * (2.0 * sigma12 + C2);
    let denominator = (mu1 * mu1 + mu2 * mu2 + C1) * (sigma1_sq + sigma2_sq + C2);
    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_raster(width: u32, height: u32, offset: u8) -> RasterImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for i in 0..(width * height) {
            let value = (i * 7 % 200) as u8 + offset;
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
        RasterImage::new(width, height, pixels).unwrap()
    }

    #[test]
    fn identical_images_score_one() {
        let raster = gradient_raster(2, 2, 0);
        let ssim = compute_ssim(&raster, &raster).unwrap();
        assert!((ssim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn identical_flat_images_score_one() {
        let raster = RasterImage::filled(2, 2, [12, 34, 56, 255]).unwrap();
        assert!((compute_ssim(&raster, &raster).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uniform_brightness_shift_stays_high() {
        let original = gradient_raster(16, 16, 20);
        let shifted = gradient_raster(16, 16, 30);
        let ssim = compute_ssim(&original, &shifted).unwrap();
        assert!(ssim > 0.9, "ssim was {ssim}");
        assert!(ssim < 1.0);
    }

    #[test]
    fn black_versus_white_is_near_zero() {
        let black = RasterImage::filled(4, 4, [0, 0, 0, 255]).unwrap();
        let white = RasterImage::filled(4, 4, [255, 255, 255, 255]).unwrap();
        let ssim = compute_ssim(&black, &white).unwrap();
        assert!(ssim > 0.0 && ssim < 0.02, "ssim was {ssim}");
    }

    #[test]
    fn mismatched_dimensions_are_not_comparable() {
        let a = gradient_raster(4, 4, 0);
        let b = gradient_raster(4, 2, 0);
        assert_eq!(compute_ssim(&a, &b), None);
    }

    #[test]
    fn ssim_is_symmetric() {
        let a = gradient_raster(8, 4, 0);
        let b = gradient_raster(8, 4, 17);
        let forward = compute_ssim(&a, &b).unwrap();
        let backward = compute_ssim(&b, &a).unwrap();
        assert!((forward - backward).abs() < 1e-12);
    }
}
