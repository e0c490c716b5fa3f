// THEORY:
// A `LuminanceField` is the luminance-only view of a raster that SSIM and FSSIM
// work on. It owns one f64 per pixel, in the raster's row-major order.
//
// All statistics are population statistics over the whole field (a single
// global window) and are accumulated sequentially, front to back, so repeated
// runs reproduce the same low-order digits.

pub type LuminanceSample = f64;

/// Per-pixel luminance of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct LuminanceField {
    width: u32,
    values: Vec<LuminanceSample>,
}

impl LuminanceField {
    /// `values` holds whole rows of `width` samples each.
    pub fn new(width: u32, values: Vec<LuminanceSample>) -> Self {
        debug_assert_eq!(values.len() % width.max(1) as usize, 0);
        Self { width, values }
    }

    pub fn values(&self) -> &[LuminanceSample] {
        &self.values
    }

    fn len(&self) -> f64 {
        self.values.len() as f64
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.len()
    }

    pub fn variance(&self, mean: f64) -> f64 {
        self.values
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / self.len()
    }

    pub fn covariance(&self, other: &LuminanceField, mean: f64, other_mean: f64) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - mean) * (b - other_mean))
            .sum::<f64>()
            / self.len()
    }

    /// Absolute luminance step to the right-hand neighbor of every pixel.
    ///
    /// The last column compares against itself, so it is always 0 (clamped,
    /// not wrapped to the next row).
    pub fn horizontal_gradient(&self) -> Vec<LuminanceSample> {
        let width = self.width as usize;
        self.values
            .chunks_exact(width)
            .flat_map(|row| {
                row.iter().enumerate().map(move |(x, current)| {
                    let right = if x + 1 < width { row[x + 1] } else { *current };
                    (current - right).abs()
                })
            })
            .collect()
    }
}
