// THEORY:
// The `pipeline` module is the top-level API of the metrics engine. It runs the
// full comparison for one pair of rasters in a fixed order:
//
//   Stage 1: MSE over raw RGBA bytes, then PSNR from MSE.
//   Stage 2: global SSIM over BT.709 luminance.
//   Stage 3: FSSIM (SSIM blended with horizontal gradient similarity).
//   Stage 4: distortion classification and the adaptive AEMC combination.
//
// Every stage is a pure function of its inputs. An incomparable pair (different
// dimensions) yields a `ComparisonResult` whose scalars are all `None`, never an
// error. `None` means "not computable" and is distinct from 0.
//
// `ComparisonSession` plays the role of the interactive caller: it holds two
// image slots and runs the pipeline exactly once each time a slot changes while
// both are filled with dimension-matched images, handing the record to the store.

use crate::core_modules::adaptive::{AemcWeights, compute_aemc};
use crate::core_modules::basic_metrics::{DEFAULT_MAX_PIXEL_VALUE, compute_mse, compute_psnr};
use crate::core_modules::error::StoreError;
use crate::core_modules::gradient::{DEFAULT_FSSIM_ALPHA, compute_fssim};
use crate::core_modules::raster::RasterImage;
use crate::core_modules::ssim::compute_ssim;
use crate::record::MetricsRecord;
use crate::source::LoadedImage;
use crate::store::MetricsStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for the QualityPipeline. The defaults reproduce the reference
/// scores; other values are for experimentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Peak value used by PSNR.
    pub max_pixel_value: f64,
    /// Weight of SSIM in FSSIM; gradient similarity gets `1 - fssim_alpha`.
    pub fssim_alpha: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pixel_value: DEFAULT_MAX_PIXEL_VALUE,
            fssim_alpha: DEFAULT_FSSIM_ALPHA,
        }
    }
}

/// The output of one pairwise comparison.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub mse: Option<f64>,
    pub psnr: Option<f64>,
    pub ssim: Option<f64>,
    pub fssim: Option<f64>,
    pub aemc: Option<f64>,
    pub weights: AemcWeights,
}

impl ComparisonResult {
    pub fn is_comparable(&self) -> bool {
        self.mse.is_some()
    }
}

/// The main, top-level struct for the metrics engine.
#[derive(Debug, Clone, Default)]
pub struct QualityPipeline {
    config: PipelineConfig,
}

impl QualityPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn compare(&self, first: &RasterImage, second: &RasterImage) -> ComparisonResult {
        if !first.same_dimensions(second) {
            warn!(
                first_width = first.width(),
                first_height = first.height(),
                second_width = second.width(),
                second_height = second.height(),
                "dimension mismatch, metrics are undefined"
            );
            return ComparisonResult::default();
        }

        // Stage 1: Per-channel error
        let mse = compute_mse(first, second);
        let psnr = compute_psnr(mse, self.config.max_pixel_value);

        // Stage 2: Structural similarity
        let ssim = compute_ssim(first, second);

        // Stage 3: Gradient-augmented similarity
        let fssim = compute_fssim(first, second, self.config.fssim_alpha);

        // Stage 4: Distortion-weighted combination
        let aemc = compute_aemc(first, second, psnr, ssim, fssim);

        let result = ComparisonResult {
            mse,
            psnr,
            ssim,
            fssim,
            aemc: aemc.map(|outcome| outcome.result),
            weights: aemc.map(|outcome| outcome.weights).unwrap_or_default(),
        };
        debug!(?result, "comparison finished");
        result
    }
}

/// Which of the two images a session slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

/// Two image slots wired to a pipeline and a metrics store.
pub struct ComparisonSession<S: MetricsStore> {
    pipeline: QualityPipeline,
    store: S,
    slots: [Option<LoadedImage>; 2],
    last_result: Option<ComparisonResult>,
}

impl<S: MetricsStore> ComparisonSession<S> {
    pub fn new(pipeline: QualityPipeline, store: S) -> Self {
        Self {
            pipeline,
            store,
            slots: [None, None],
            last_result: None,
        }
    }

    /// Places an image in a slot and, if the pair is now ready, compares it and
    /// appends the record. Returns the new result when a comparison ran.
    pub fn set_image(
        &mut self,
        slot: Slot,
        image: LoadedImage,
    ) -> Result<Option<ComparisonResult>, StoreError> {
        let index = match slot {
            Slot::First => 0,
            Slot::Second => 1,
        };
        self.slots[index] = Some(image);

        let (Some(first), Some(second)) = (&self.slots[0], &self.slots[1]) else {
            return Ok(None);
        };
        if !first.raster.same_dimensions(&second.raster) {
            warn!(first = %first.name, second = %second.name, "images differ in size, not comparing");
            return Ok(None);
        }

        let result = self.pipeline.compare(&first.raster, &second.raster);
        let record = MetricsRecord::build(&first.name, &second.name, &result);
        self.store.append(record)?;
        self.last_result = Some(result);
        Ok(Some(result))
    }

    pub fn image(&self, slot: Slot) -> Option<&LoadedImage> {
        match slot {
            Slot::First => self.slots[0].as_ref(),
            Slot::Second => self.slots[1].as_ref(),
        }
    }

    pub fn last_result(&self) -> Option<&ComparisonResult> {
        self.last_result.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
