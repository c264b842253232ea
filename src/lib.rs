// THEORY:
// This file is the entry point for the `sky_vision` library crate. It exposes
// the engine that turns up to four directional sky photos into a weather
// estimate and a celestial-navigation advisory.
//
// The public surface is small on purpose: `SkyPipeline` for synchronous use,
// `ParallelSkyPipeline` when running inside a tokio runtime, `AnalysisConfig`
// for every threshold, and `SkyError` for failures. The per-stage analysers
// live in `core_modules` and are public so that callers can run a single stage
// (e.g. only the validator) on their own grids.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::AnalysisConfig;
pub use core_modules::direction::Direction;
pub use core_modules::pixel::Pixel;
pub use core_modules::pixel_grid::PixelGrid;
pub use error::{Result, SkyError};
pub use parallel_pipeline::ParallelSkyPipeline;
pub use pipeline::{SkyPipeline, SkyReport};
