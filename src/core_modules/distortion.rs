// THEORY:
// The distortion classifier is a coarse heuristic that guesses *what kind* of
// damage separates two images, so the adaptive combiner can lean on the metric
// best suited to it. It works on raw RGB differences, not luminance, and it
// ignores alpha.
//
// It runs in two stages:
// 1. `DistortionStats::measure` reduces the pair to three aggregates:
//    - `avg_diff`: mean of per-pixel (|dR| + |dG| + |dB|) / 3,
//    - `high_freq_artifacts`: fraction of pixels whose diff exceeds 50,
//    - `block_artifacts`: count of pixels at every 64th position of the diff
//      sequence whose diff exceeds 30.
// 2. `DistortionProfile::from_stats` thresholds those aggregates into discrete
//    severities (blur, edge loss, blocking).
//
// The thresholds and the stride of 64 are reproduced literally. The stride does
// not line up with any block-transform size (JPEG uses 8x8), so the blocking
// score is an approximation of unverified accuracy rather than a real blocking
// detector. Changing any constant here changes reported scores.

use crate::core_modules::raster::RasterImage;
use crate::core_modules::smart_pixel::smart_pixel::SmartPixel;
use tracing::debug;

pub const HIGH_FREQUENCY_DIFF: f64 = 50.0;
pub const BLOCK_SAMPLE_STRIDE: usize = 64;
pub const BLOCK_DIFF: f64 = 30.0;

/// Aggregate RGB difference statistics of an image pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionStats {
    pub avg_diff: f64,
    pub high_freq_artifacts: f64,
    pub block_artifacts: usize,
}

impl DistortionStats {
    /// Measures the pair, or returns `None` when the buffers cannot be walked in
    /// lockstep (different pixel counts).
    pub fn measure(first: &RasterImage, second: &RasterImage) -> Option<Self> {
        if first.pixel_count() != second.pixel_count() {
            return None;
        }

        let pixel_diffs: Vec<f64> = first
            .iter_pixels()
            .zip(second.iter_pixels())
            .map(|(a, b)| SmartPixel::new(a, b).mean_rgb_delta())
            .collect();
        let count = pixel_diffs.len() as f64;

        let avg_diff = pixel_diffs.iter().sum::<f64>() / count;
        let high_freq_artifacts = pixel_diffs
            .iter()
            .filter(|&&diff| diff > HIGH_FREQUENCY_DIFF)
            .count() as f64
            / count;
        let block_artifacts = pixel_diffs
            .iter()
            .step_by(BLOCK_SAMPLE_STRIDE)
            .filter(|&&diff| diff > BLOCK_DIFF)
            .count();

        Some(Self {
            avg_diff,
            high_freq_artifacts,
            block_artifacts,
        })
    }
}

/// Discrete severity weights derived from `DistortionStats`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionProfile {
    pub blur_level: f64,
    pub edge_loss: f64,
    pub blocking: f64,
}

impl DistortionProfile {
    pub fn from_stats(stats: &DistortionStats) -> Self {
        let blur_level = if stats.avg_diff < 10.0 {
            1.0
        } else if stats.avg_diff < 20.0 {
            0.5
        } else {
            0.1
        };
        let edge_loss = if stats.high_freq_artifacts > 0.1 { 0.8 } else { 0.3 };
        let blocking = if stats.block_artifacts > 20 { 0.8 } else { 0.2 };

        Self {
            blur_level,
            edge_loss,
            blocking,
        }
    }

    pub fn total(&self) -> f64 {
        self.blur_level + self.edge_loss + self.blocking
    }
}

/// Runs both classifier stages on an image pair.
pub fn analyze_distortion(first: &RasterImage, second: &RasterImage) -> Option<DistortionProfile> {
    let stats = DistortionStats::measure(first, second)?;
    let profile = DistortionProfile::from_stats(&stats);
    debug!(?stats, ?profile, "classified distortion");
    Some(profile)
}
