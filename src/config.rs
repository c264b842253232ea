// THEORY:
// Every cutoff the sky heuristics use lives here, grouped by the stage that
// reads it. The defaults are the calibrated values the engine has always
// shipped with; changing one changes observable classifications, so they are
// meant to be tuned only against new calibration photos.
//
// Configurations are plain serde structs. A JSON file only needs to name the
// fields it overrides; everything else falls back to the defaults below.

use crate::error::{Result, SkyError};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Complete configuration for one analysis engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sampler: SamplerConfig,
    pub validator: ValidatorThresholds,
    pub coverage: CoverageThresholds,
    pub conditions: ConditionThresholds,
    pub visibility: VisibilityConfig,
    pub classifier: ClassifierThresholds,
    pub predictor: PredictorConfig,
    /// Simulated sensor noise for the estimated conditions. `None` keeps the
    /// estimates a pure function of the sky statistics.
    pub noise: Option<NoiseConfig>,
}

/// Canonical analysis resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            width: 224,
            height: 224,
        }
    }
}

/// Thresholds for the open-sky gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorThresholds {
    /// A pixel brighter than this counts as sky-like.
    pub sky_brightness: f64,
    /// Channel tolerance for the near-gray (overcast) sky-like test.
    pub gray_tolerance: u8,
    /// `is_valid_sky` needs a sky-pixel ratio strictly above this.
    pub min_sky_pixel_ratio: f64,
    /// `is_valid_sky` needs an average brightness strictly above this.
    pub min_avg_brightness: f64,
    /// Vertical brightness step that counts as a horizon edge.
    pub horizon_delta: f64,
    /// Horizon edges must exceed this fraction of the image width.
    pub horizon_width_fraction: f64,
    /// Horizontal brightness step that counts as a hard edge.
    pub edge_delta: f64,
    /// Hard edges must exceed this fraction of horizontal pixel pairs.
    pub edge_pair_fraction: f64,
    pub indoor_max_brightness: f64,
    pub indoor_max_blue: f64,
}

impl Default for ValidatorThresholds {
    fn default() -> Self {
        Self {
            sky_brightness: 100.0,
            gray_tolerance: 30,
            min_sky_pixel_ratio: 0.4,
            min_avg_brightness: 50.0,
            horizon_delta: 30.0,
            horizon_width_fraction: 0.1,
            edge_delta: 50.0,
            edge_pair_fraction: 0.01,
            indoor_max_brightness: 80.0,
            indoor_max_blue: 100.0,
        }
    }
}

/// Cloud versus clear-sky pixel classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageThresholds {
    pub cloud_min_brightness: f64,
    pub cloud_channel_tolerance: u8,
    pub clear_blue_over_red: i16,
    pub clear_blue_over_green: i16,
    pub clear_max_brightness: f64,
}

impl Default for CoverageThresholds {
    fn default() -> Self {
        Self {
            cloud_min_brightness: 150.0,
            cloud_channel_tolerance: 40,
            clear_blue_over_red: 30,
            clear_blue_over_green: 10,
            clear_max_brightness: 200.0,
        }
    }
}

/// Brightness-distribution cutoffs for the adverse-condition flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionThresholds {
    pub dark_brightness: f64,
    pub precipitation_dark_fraction: f64,
    /// Divisor in `uniformity = 1 / (1 + variance / variance_scale)`.
    pub variance_scale: f64,
    pub fog_min_uniformity: f64,
    pub fog_max_brightness: f64,
    pub haze_min_uniformity: f64,
    pub haze_min_brightness: f64,
    pub haze_max_brightness: f64,
    pub storm_dark_fraction: f64,
    pub storm_min_variance: f64,
}

impl Default for ConditionThresholds {
    fn default() -> Self {
        Self {
            dark_brightness: 60.0,
            precipitation_dark_fraction: 0.3,
            variance_scale: 1000.0,
            fog_min_uniformity: 0.7,
            fog_max_brightness: 120.0,
            haze_min_uniformity: 0.5,
            haze_min_brightness: 120.0,
            haze_max_brightness: 180.0,
            storm_dark_fraction: 0.5,
            storm_min_variance: 2000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Sample every n-th pixel along each axis.
    pub sample_stride: u32,
    /// Average contrast is divided by this to get kilometres.
    pub contrast_scale: f64,
    pub min_km: f64,
    pub max_km: f64,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            sample_stride: 10,
            contrast_scale: 10.0,
            min_km: 1.0,
            max_km: 25.0,
        }
    }
}

/// Coverage bucket upper bounds (exclusive) for the sky-type table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub clear_below: f64,
    pub partly_cloudy_below: f64,
    pub cloudy_below: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            clear_below: 10.0,
            partly_cloudy_below: 40.0,
            cloudy_below: 80.0,
        }
    }
}

/// Exclusive upper coverage bounds for Excellent, Good and Fair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationBands {
    pub excellent_below: f64,
    pub good_below: f64,
    pub fair_below: f64,
}

impl NavigationBands {
    pub const SOLAR: Self = Self {
        excellent_below: 30.0,
        good_below: 60.0,
        fair_below: 80.0,
    };

    pub const STAR: Self = Self {
        excellent_below: 20.0,
        good_below: 50.0,
        fair_below: 70.0,
    };

    fn overlay(self, partial: PartialBands) -> Self {
        Self {
            excellent_below: partial.excellent_below.unwrap_or(self.excellent_below),
            good_below: partial.good_below.unwrap_or(self.good_below),
            fair_below: partial.fair_below.unwrap_or(self.fair_below),
        }
    }
}

/// Band overrides as they appear in JSON; missing bounds keep their defaults.
#[derive(Deserialize)]
struct PartialBands {
    excellent_below: Option<f64>,
    good_below: Option<f64>,
    fair_below: Option<f64>,
}

fn solar_bands<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<NavigationBands, D::Error> {
    PartialBands::deserialize(d).map(|p| NavigationBands::SOLAR.overlay(p))
}

fn star_bands<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<NavigationBands, D::Error> {
    PartialBands::deserialize(d).map(|p| NavigationBands::STAR.overlay(p))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Cloudiness gap between the two compass axes that counts as a trend.
    pub trend_margin: f64,
    pub overcast_min_count: usize,
    pub clear_min_count: usize,
    #[serde(deserialize_with = "solar_bands")]
    pub solar_bands: NavigationBands,
    /// Stricter than solar: starlight is fainter.
    #[serde(deserialize_with = "star_bands")]
    pub star_bands: NavigationBands,
    pub gps_max_coverage: f64,
    pub gps_min_visibility: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            trend_margin: 20.0,
            overcast_min_count: 2,
            clear_min_count: 3,
            solar_bands: NavigationBands::SOLAR,
            star_bands: NavigationBands::STAR,
            gps_max_coverage: 70.0,
            gps_min_visibility: 5.0,
        }
    }
}

/// Seeded jitter applied to the estimated conditions. Amplitudes are the
/// half-width of a uniform distribution around the deterministic estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub seed: u64,
    pub temperature: f64,
    pub pressure: f64,
    pub wind_speed: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            temperature: 15.0,
            pressure: 5.0,
            wind_speed: 2.5,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Every floating-point setting, named as it appears in JSON.
    fn float_settings(&self) -> Vec<(&'static str, f64)> {
        let (v, c, w) = (&self.validator, &self.coverage, &self.conditions);
        let (vis, cls, p) = (&self.visibility, &self.classifier, &self.predictor);
        let mut settings = vec![
            ("validator.sky_brightness", v.sky_brightness),
            ("validator.min_sky_pixel_ratio", v.min_sky_pixel_ratio),
            ("validator.min_avg_brightness", v.min_avg_brightness),
            ("validator.horizon_delta", v.horizon_delta),
            ("validator.horizon_width_fraction", v.horizon_width_fraction),
            ("validator.edge_delta", v.edge_delta),
            ("validator.edge_pair_fraction", v.edge_pair_fraction),
            ("validator.indoor_max_brightness", v.indoor_max_brightness),
            ("validator.indoor_max_blue", v.indoor_max_blue),
            ("coverage.cloud_min_brightness", c.cloud_min_brightness),
            ("coverage.clear_max_brightness", c.clear_max_brightness),
            ("conditions.dark_brightness", w.dark_brightness),
            ("conditions.precipitation_dark_fraction", w.precipitation_dark_fraction),
            ("conditions.variance_scale", w.variance_scale),
            ("conditions.fog_min_uniformity", w.fog_min_uniformity),
            ("conditions.fog_max_brightness", w.fog_max_brightness),
            ("conditions.haze_min_uniformity", w.haze_min_uniformity),
            ("conditions.haze_min_brightness", w.haze_min_brightness),
            ("conditions.haze_max_brightness", w.haze_max_brightness),
            ("conditions.storm_dark_fraction", w.storm_dark_fraction),
            ("conditions.storm_min_variance", w.storm_min_variance),
            ("visibility.contrast_scale", vis.contrast_scale),
            ("visibility.min_km", vis.min_km),
            ("visibility.max_km", vis.max_km),
            ("classifier.clear_below", cls.clear_below),
            ("classifier.partly_cloudy_below", cls.partly_cloudy_below),
            ("classifier.cloudy_below", cls.cloudy_below),
            ("predictor.trend_margin", p.trend_margin),
            ("predictor.gps_max_coverage", p.gps_max_coverage),
            ("predictor.gps_min_visibility", p.gps_min_visibility),
        ];
        for (name, bands) in [
            ("predictor.solar_bands", &p.solar_bands),
            ("predictor.star_bands", &p.star_bands),
        ] {
            settings.push((name, bands.excellent_below));
            settings.push((name, bands.good_below));
            settings.push((name, bands.fair_below));
        }
        if let Some(noise) = &self.noise {
            settings.push(("noise.temperature", noise.temperature));
            settings.push(("noise.pressure", noise.pressure));
            settings.push(("noise.wind_speed", noise.wind_speed));
        }
        settings
    }

    /// Rejects settings under which the stages cannot produce meaningful output.
    pub fn validate(&self) -> Result<()> {
        let non_finite = self.float_settings().into_iter().find(|(_, v)| !v.is_finite());
        if let Some((name, value)) = non_finite {
            return Err(SkyError::InvalidConfig(format!("{name} must be finite, got {value}")));
        }
        if self.sampler.width < 2 || self.sampler.height < 2 {
            return Err(SkyError::InvalidConfig(format!(
                "canonical grid must be at least 2x2, got {}x{}",
                self.sampler.width, self.sampler.height
            )));
        }
        if self.visibility.sample_stride == 0 {
            return Err(SkyError::InvalidConfig(
                "visibility sample stride must be non-zero".into(),
            ));
        }
        if self.visibility.contrast_scale <= 0.0 {
            return Err(SkyError::InvalidConfig(
                "visibility contrast scale must be positive".into(),
            ));
        }
        if self.visibility.min_km > self.visibility.max_km {
            return Err(SkyError::InvalidConfig(format!(
                "visibility range is inverted: [{}, {}]",
                self.visibility.min_km, self.visibility.max_km
            )));
        }
        if self.conditions.variance_scale <= 0.0 {
            return Err(SkyError::InvalidConfig("variance scale must be positive".into()));
        }

        let c = &self.classifier;
        if !(c.clear_below < c.partly_cloudy_below && c.partly_cloudy_below < c.cloudy_below) {
            return Err(SkyError::InvalidConfig(
                "classifier thresholds must be strictly increasing".into(),
            ));
        }

        for (name, bands) in [
            ("solar", &self.predictor.solar_bands),
            ("star", &self.predictor.star_bands),
        ] {
            if !(bands.excellent_below < bands.good_below && bands.good_below < bands.fair_below) {
                return Err(SkyError::InvalidConfig(format!(
                    "{name} navigation bands must be strictly increasing"
                )));
            }
        }

        if let Some(noise) = &self.noise {
            if noise.temperature < 0.0 || noise.pressure < 0.0 || noise.wind_speed < 0.0 {
                return Err(SkyError::InvalidConfig(
                    "noise amplitudes must be non-negative".into(),
                ));
            }
        }

        Ok(())
    }
}
