// THEORY:
// FSSIM is this engine's blend of global SSIM with a horizontal gradient
// similarity term. It is not the published FSIM (no phase congruency); it only
// asks "do the two images change brightness in the same places along each row?"
//
// 1. Each luminance field is turned into per-pixel horizontal gradients
//    |L(x,y) - L(x+1,y)|, clamped to 0 at the right edge.
// 2. Every co-located gradient pair scores (2 g1 g2 + eps) / (g1^2 + g2^2 + eps),
//    which is 1 when both are equal (including both flat) and falls toward 0 as
//    they diverge. The scores are averaged over all pixels.
// 3. FSSIM = alpha * SSIM + (1 - alpha) * gradient similarity, rounded to three
//    decimals.

use crate::core_modules::luminance::LuminanceField;
use crate::core_modules::raster::RasterImage;
use crate::core_modules::round_to_thousandths;
use crate::core_modules::ssim::ssim_of_fields;
use tracing::debug;

pub const GRADIENT_EPSILON: f64 = 0.01;
pub const DEFAULT_FSSIM_ALPHA: f64 = 0.5;

/// Horizontal luminance gradient of an image, row-major.
pub fn compute_gradient(field: &LuminanceField) -> Vec<f64> {
    field.horizontal_gradient()
}

/// Mean per-pixel similarity of two gradient sequences.
pub fn gradient_similarity(first: &[f64], second: &[f64]) -> f64 {
    let total: f64 = first
        .iter()
        .zip(second.iter())
        .map(|(g1, g2)| (2.0 * g1 * g2 + GRADIENT_EPSILON) / (g1 * g1 + g2 * g2 + GRADIENT_EPSILON))
        .sum();
    total / first.len() as f64
}

/// Gradient-augmented SSIM, or `None` if the rasters are not comparable.
pub fn compute_fssim(first: &RasterImage, second: &RasterImage, alpha: f64) -> Option<f64> {
    if !first.same_dimensions(second) {
        return None;
    }

    let first_field = first.luminance_field();
    let second_field = second.luminance_field();

    let grad_similarity = gradient_similarity(
        &compute_gradient(&first_field),
        &compute_gradient(&second_field),
    );
    let ssim = ssim_of_fields(&first_field, &second_field);

    let fssim = round_to_thousandths(alpha * ssim + (1.0 - alpha) * grad_similarity);
    debug!(grad_similarity, fssim, "computed fssim");
    Some(fssim)
}
