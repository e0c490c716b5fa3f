// THEORY:
// AEMC (adaptive error/metric combination) folds PSNR, SSIM and FSSIM into one
// score whose weights come from the distortion classifier:
//
//   wPsnr = blur / total, wSsim = edgeLoss / total, wFssim = blocking / total
//   AEMC  = wPsnr * (PSNR / 100) + wSsim * SSIM + wFssim * FSSIM
//
// The weights always sum to 1 because every severity is strictly positive.
// PSNR is brought toward [0, 1] by dividing by 100; very high PSNR can still
// push its term past 1, and that is the documented normalization.

use crate::core_modules::distortion::{DistortionProfile, analyze_distortion};
use crate::core_modules::raster::RasterImage;
use crate::core_modules::round_to_thousandths;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const PSNR_NORMALIZATION: f64 = 100.0;

/// Metric weights used by AEMC.
///
/// All zero when AEMC could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AemcWeights {
    pub w_psnr: f64,
    pub w_ssim: f64,
    pub w_fssim: f64,
}

impl AemcWeights {
    pub fn from_profile(profile: &DistortionProfile) -> Self {
        let total = profile.total();
        Self {
            w_psnr: profile.blur_level / total,
            w_ssim: profile.edge_loss / total,
            w_fssim: profile.blocking / total,
        }
    }

    pub fn sum(&self) -> f64 {
        self.w_psnr + self.w_ssim + self.w_fssim
    }
}

/// A computed AEMC score together with the weights that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AemcOutcome {
    pub result: f64,
    pub weights: AemcWeights,
}

/// Combines precomputed metrics using weights from a distortion profile.
pub fn combine(profile: &DistortionProfile, psnr: f64, ssim: f64, fssim: f64) -> AemcOutcome {
    let weights = AemcWeights::from_profile(profile);
    let combined = weights.w_psnr * (psnr / PSNR_NORMALIZATION)
        + weights.w_ssim * ssim
        + weights.w_fssim * fssim;
    AemcOutcome {
        result: round_to_thousandths(combined),
        weights,
    }
}

/// AEMC for an image pair, or `None` if any input metric is undefined or the
/// distortion classifier cannot run.
pub fn compute_aemc(
    first: &RasterImage,
    second: &RasterImage,
    psnr: Option<f64>,
    ssim: Option<f64>,
    fssim: Option<f64>,
) -> Option<AemcOutcome> {
    let profile = analyze_distortion(first, second)?;
    let outcome = combine(&profile, psnr?, ssim?, fssim?);
    debug!(aemc = outcome.result, weights = ?outcome.weights, "computed aemc");
    Some(outcome)
}
