// THEORY:
// This file is the main entry point for the `fidelity_vision` library crate.
// It exports the `QualityPipeline` and its associated data structures
// (`PipelineConfig`, `ComparisonResult`, `ComparisonSession`) as the high-level
// interface for the metrics engine, plus the two boundary collaborators the
// engine talks to: the image `source` (decoding files into RGBA rasters) and the
// metrics `store` (an append-only history of comparison records).
//
// The numerical building blocks live in `core_modules` and are public so that
// individual metrics can be computed and tested in isolation, but a normal
// consumer only needs `pipeline` and, for many pairs at once, `parallel_pipeline`.

pub mod core_modules;
pub mod parallel_pipeline;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod store;

pub use core_modules::error::{RasterError, SourceError, StoreError};
pub use core_modules::raster::RasterImage;
pub use pipeline::{ComparisonResult, ComparisonSession, PipelineConfig, QualityPipeline};
pub use record::MetricsRecord;
