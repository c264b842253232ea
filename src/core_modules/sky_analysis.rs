// THEORY:
// `SkyAnalysisResult` is the per-photo output of the engine and the unit the
// fusion stage works with. It is a value type: built once from the stage
// outputs of a single grid and never modified afterwards.
//
// Field names serialise in camelCase so the JSON matches what the surrounding
// application stores for each weather reading.

use crate::core_modules::direction::Direction;
use crate::core_modules::sky_classifier::SkyType;
use crate::core_modules::weather_conditions::WeatherConditions;
use serde::{Deserialize, Serialize};

/// Diagnostics explaining the open-sky verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    pub sky_pixel_ratio: f64,
    pub horizon_detected: bool,
    pub artificial_objects_detected: bool,
    pub indoor_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkyAnalysisResult {
    /// When false, fusion must leave this result out of every aggregate.
    pub is_valid_sky: bool,
    /// In [0, 1].
    pub confidence: f64,
    pub sky_type: SkyType,
    /// Percent in [0, 100].
    pub cloud_coverage: f64,
    /// Kilometres in [1, 25] with the default visibility range.
    pub visibility: f64,
    pub weather_conditions: WeatherConditions,
    pub validation_details: ValidationDetails,
}

/// A result tagged with the direction it was captured in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalAnalysis {
    pub direction: Direction,
    pub result: SkyAnalysisResult,
}

impl DirectionalAnalysis {
    pub fn new(direction: Direction, result: SkyAnalysisResult) -> Self {
        Self { direction, result }
    }

    pub fn is_valid_sky(&self) -> bool {
        self.result.is_valid_sky
    }
}
