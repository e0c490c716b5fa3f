// THEORY:
// The `record` module packages one finished comparison for the metrics history.
// Its JSON shape (field names included) is shared with every other reader of the
// history, so it is fixed: `fsim` holds FSSIM and `adaptiveMetric` holds AEMC.
//
// The history format has no notion of "undefined". Any metric the engine could
// not compute is written as 0, and the four subjective-assessment fields
// (likert, mos, kendall, hybridMetric) are always 0 placeholders because they
// are filled by a separate rating workflow, never by this engine.

use crate::pipeline::ComparisonResult;
use serde::{Deserialize, Serialize};

/// One persisted comparison.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRecord {
    pub image1: String,
    pub image2: String,
    pub mse: f64,
    pub psnr: f64,
    pub ssim: f64,
    pub fsim: f64,
    pub adaptive_metric: f64,
    pub likert: f64,
    pub mos: f64,
    pub kendall: f64,
    pub hybrid_metric: f64,
}

impl MetricsRecord {
    pub fn build(image1: &str, image2: &str, result: &ComparisonResult) -> Self {
        Self {
            image1: image1.to_string(),
            image2: image2.to_string(),
            mse: result.mse.unwrap_or(0.0),
            psnr: result.psnr.unwrap_or(0.0),
            ssim: result.ssim.unwrap_or(0.0),
            fsim: result.fssim.unwrap_or(0.0),
            adaptive_metric: result.aemc.unwrap_or(0.0),
            ..Self::default()
        }
    }
}
