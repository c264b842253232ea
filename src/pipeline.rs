// THEORY:
// The `pipeline` module is the top-level, synchronous API of the sky engine.
// It wires the stages together in their fixed order:
//
//     Sampler -> Validator -> {Coverage, Conditions, Visibility} -> Classifier
//             -> (per-direction result) -> Predictor (cross-direction fusion)
//
// Every stage is a pure function of its input, so a `SkyPipeline` holds only
// configuration and the decoder. It can be cloned freely and shared between
// threads; the parallel pipeline hands one clone to each worker.

use crate::config::AnalysisConfig;
use crate::core_modules::cloud_coverage::CloudCoverageEstimator;
use crate::core_modules::direction::Direction;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::sampler::{FrameDecoder, ImageCrateDecoder, PixelSampler};
use crate::core_modules::sky_classifier::SkyClassifier;
use crate::core_modules::sky_validator::SkyValidator;
use crate::core_modules::visibility::VisibilityEstimator;
use crate::core_modules::weather_conditions::WeatherConditionDetector;
use crate::core_modules::weather_predictor::WeatherPredictor;
use crate::error::{Result, SkyError};
use image::RgbImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

// Re-export key data structures for the public API.
pub use crate::core_modules::sky_analysis::{
    DirectionalAnalysis, SkyAnalysisResult, ValidationDetails,
};
pub use crate::core_modules::sky_classifier::SkyType;
pub use crate::core_modules::weather_conditions::WeatherConditions;
pub use crate::core_modules::weather_predictor::{
    ConditionsSource, EstimatedConditions, Forecast, NavigationAdvice, NavigationQuality,
    SkyAggregate, Trend, WeatherPrediction,
};

/// A capture that never reached analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedCapture {
    pub direction: Direction,
    pub reason: String,
}

/// The complete output for one multi-direction capture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkyReport {
    /// Every analysed direction, valid or not, in input order.
    pub analyses: Vec<DirectionalAnalysis>,
    /// Directions dropped before analysis (undecodable payloads).
    pub rejected: Vec<RejectedCapture>,
    pub prediction: WeatherPrediction,
}

/// The main, top-level struct for the sky engine.
#[derive(Clone)]
pub struct SkyPipeline {
    config: Arc<AnalysisConfig>,
    sampler: PixelSampler,
    decoder: Arc<dyn FrameDecoder>,
}

impl SkyPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_decoder(config, Arc::new(ImageCrateDecoder))
    }

    /// Uses a caller-supplied decoder for encoded payloads.
    pub fn with_decoder(config: AnalysisConfig, decoder: Arc<dyn FrameDecoder>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sampler: PixelSampler::new(&config.sampler),
            config: Arc::new(config),
            decoder,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn sampler(&self) -> &PixelSampler {
        &self.sampler
    }

    /// Runs every per-photo stage over a canonical grid.
    pub fn analyze_grid(&self, grid: &PixelGrid) -> Result<SkyAnalysisResult> {
        let (width, height) = self.sampler.canonical_size();
        if grid.width() != width || grid.height() != height {
            return Err(SkyError::GridDimensionMismatch {
                expected_width: width,
                expected_height: height,
                actual_width: grid.width(),
                actual_height: grid.height(),
            });
        }

        let config = &*self.config;
        let validation = SkyValidator::new(&config.validator).validate(grid);
        let coverage = CloudCoverageEstimator::new(&config.coverage).estimate(grid);
        let conditions = WeatherConditionDetector::new(&config.conditions).detect(grid);
        let visibility = VisibilityEstimator::new(&config.visibility).estimate(grid);
        let sky_type =
            SkyClassifier::new(&config.classifier).classify(coverage.coverage, &conditions);

        debug!(
            "sky ratio {:.3}, brightness {:.1}, coverage {:.1}% ({} cloud / {} clear), \
             visibility {:.1} km, {:?}",
            validation.sky_pixel_ratio,
            validation.avg_brightness,
            coverage.coverage,
            coverage.cloud_pixels,
            coverage.clear_sky_pixels,
            visibility,
            sky_type
        );

        Ok(SkyAnalysisResult {
            is_valid_sky: validation.is_valid_sky,
            confidence: validation.confidence,
            sky_type,
            cloud_coverage: coverage.coverage,
            visibility,
            weather_conditions: conditions,
            validation_details: ValidationDetails {
                sky_pixel_ratio: validation.sky_pixel_ratio,
                horizon_detected: validation.horizon_detected,
                artificial_objects_detected: validation.artificial_objects_detected,
                indoor_detected: validation.indoor_detected,
            },
        })
    }

    pub fn analyze_image(&self, image: &RgbImage) -> Result<SkyAnalysisResult> {
        let grid = self.sampler.sample(image)?;
        self.analyze_grid(&grid)
    }

    /// Decodes an encoded photo onto the canonical grid.
    pub fn sample_payload(&self, payload: &[u8]) -> Result<PixelGrid> {
        self.sampler.sample_payload(self.decoder.as_ref(), payload)
    }

    /// Decodes, samples and analyses one encoded photo.
    pub fn analyze_payload(&self, payload: &[u8]) -> Result<SkyAnalysisResult> {
        let grid = self.sample_payload(payload)?;
        self.analyze_grid(&grid)
    }

    /// Tags a result with its direction and logs a rejected sky.
    pub fn analyze_direction(
        &self,
        direction: Direction,
        grid: &PixelGrid,
    ) -> Result<DirectionalAnalysis> {
        let result = self.analyze_grid(grid)?;
        if !result.is_valid_sky {
            warn!(
                "{direction} capture does not look like open sky (ratio {:.2}, indoor {})",
                result.validation_details.sky_pixel_ratio, result.validation_details.indoor_detected
            );
        }
        Ok(DirectionalAnalysis::new(direction, result))
    }

    /// Analyses every direction and fuses the results.
    pub fn run(&self, captures: Vec<(Direction, PixelGrid)>) -> Result<SkyReport> {
        check_directions(captures.iter().map(|(d, _)| *d))?;

        let analyses = captures
            .iter()
            .map(|(direction, grid)| self.analyze_direction(*direction, grid))
            .collect::<Result<Vec<_>>>()?;

        self.fuse(analyses, Vec::new())
    }

    /// Runs the predictor over finished analyses.
    pub fn fuse(
        &self,
        analyses: Vec<DirectionalAnalysis>,
        rejected: Vec<RejectedCapture>,
    ) -> Result<SkyReport> {
        let predictor = WeatherPredictor::new(&self.config.predictor, self.config.noise.as_ref());
        let prediction = predictor.predict(&analyses)?;
        Ok(SkyReport {
            analyses,
            rejected,
            prediction,
        })
    }
}

/// One capture per compass direction, so never more than four.
pub fn check_directions(directions: impl Iterator<Item = Direction>) -> Result<()> {
    let mut seen = HashSet::new();
    for direction in directions {
        if !seen.insert(direction) {
            return Err(SkyError::DuplicateDirection(direction));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplerConfig;
    use crate::core_modules::pixel::Pixel;

    const SIZE: u32 = 48;

    fn pipeline() -> SkyPipeline {
        let config = AnalysisConfig {
            sampler: SamplerConfig {
                width: SIZE,
                height: SIZE,
            },
            ..Default::default()
        };
        SkyPipeline::new(config).unwrap()
    }

    fn blue_sky() -> PixelGrid {
        PixelGrid::filled(SIZE, SIZE, Pixel::new(160, 190, 240))
    }

    #[test]
    fn uniform_bright_blue_is_clear_valid_sky() {
        let result = pipeline().analyze_grid(&blue_sky()).unwrap();
        assert!(result.is_valid_sky);
        assert_eq!(result.sky_type, SkyType::Clear);
        assert!(result.cloud_coverage < 10.0);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.visibility, 1.0);
    }

    #[test]
    fn uniform_dark_gray_is_rejected() {
        let grid = PixelGrid::filled(SIZE, SIZE, Pixel::new(40, 40, 40));
        let result = pipeline().analyze_grid(&grid).unwrap();
        assert!(!result.is_valid_sky);
        assert!(result.validation_details.indoor_detected);
        assert!(result.weather_conditions.fog);
    }

    #[test]
    fn wrong_grid_size_is_rejected() {
        let grid = PixelGrid::filled(SIZE + 1, SIZE, Pixel::new(160, 190, 240));
        assert!(matches!(
            pipeline().analyze_grid(&grid),
            Err(SkyError::GridDimensionMismatch { .. })
        ));
    }

    #[test]
    fn run_fuses_valid_directions_only() {
        let dark = PixelGrid::filled(SIZE, SIZE, Pixel::new(40, 40, 40));
        let report = pipeline()
            .run(vec![(Direction::North, blue_sky()), (Direction::East, dark)])
            .unwrap();
        assert_eq!(report.analyses.len(), 2);
        assert!(!report.analyses[1].is_valid_sky());
        assert_eq!(report.prediction.aggregate.directions, vec![Direction::North]);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn run_with_only_invalid_sky_fails() {
        let dark = PixelGrid::filled(SIZE, SIZE, Pixel::new(40, 40, 40));
        let err = pipeline().run(vec![(Direction::West, dark)]).unwrap_err();
        assert!(matches!(err, SkyError::NoValidSkyData));
    }

    #[test]
    fn run_with_nothing_fails() {
        assert!(matches!(pipeline().run(Vec::new()), Err(SkyError::NoValidSkyData)));
    }

    #[test]
    fn duplicate_direction_is_rejected() {
        let err = pipeline()
            .run(vec![(Direction::North, blue_sky()), (Direction::North, blue_sky())])
            .unwrap_err();
        assert!(matches!(err, SkyError::DuplicateDirection(Direction::North)));
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut config = AnalysisConfig::default();
        config.visibility.min_km = 30.0;
        assert!(matches!(SkyPipeline::new(config), Err(SkyError::InvalidConfig(_))));
    }

    #[test]
    fn exposes_validated_config_and_sampler() {
        let p = pipeline();
        assert_eq!(p.config().sampler.width, SIZE);
        assert_eq!(p.config().predictor.trend_margin, 20.0);
        assert_eq!(p.sampler().canonical_size(), (SIZE, SIZE));
    }

    #[test]
    fn payload_path_matches_grid_path() {
        let p = pipeline();
        let image = RgbImage::from_pixel(SIZE * 2, SIZE * 2, image::Rgb([160, 190, 240]));
        let from_image = p.analyze_image(&image).unwrap();
        let from_grid = p.analyze_grid(&blue_sky()).unwrap();
        assert_eq!(from_image, from_grid);
    }
}
