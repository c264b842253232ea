// THEORY:
// The `WeatherPredictor` is the cross-direction fusion layer. It is the only
// stage that sees more than one photo, and it turns up to four per-direction
// readings into a single operator-facing advisory.
//
// Key architectural principles:
// 1.  **Exclusion First**: Readings that failed the open-sky gate are removed
//     before any statistic is computed. If nothing survives, fusion fails with
//     `NoValidSkyData`; it never invents a default sky.
// 2.  **Simple Aggregates**: Coverage and visibility are plain means over the
//     surviving readings. Storm is "any reading stormy"; overcast needs at least
//     two overcast readings, clear at least three clear ones.
// 3.  **Axis Trend Heuristic**: Weather systems are assumed to advance along
//     one compass axis. When all four directions are usable, the mean
//     cloudiness of the East/West pair is compared with the North/South pair; a
//     gap of at least `trend_margin` points reads as improving (East/West
//     clearer) or deteriorating (East/West cloudier). This is a rule of thumb,
//     not a meteorological model.
// 4.  **Labelled Estimates**: Temperature, humidity, pressure and wind are
//     illustrative values derived from the visual aggregates. They carry a
//     `ConditionsSource` so no caller can mistake them for measurements.
//     Optional jitter comes from an explicitly seeded generator, never from
//     ambient randomness.
// 5.  **Navigation Bands**: Coverage maps to a four-level quality scale for
//     solar and (stricter) star sights; any storm forces both to Poor.

use crate::config::{NavigationBands, NoiseConfig, PredictorConfig};
use crate::core_modules::direction::{Axis, Direction};
use crate::core_modules::sky_analysis::DirectionalAnalysis;
use crate::core_modules::sky_classifier::SkyType;
use crate::error::{Result, SkyError};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const BASE_TEMPERATURE_C: f64 = 20.0;
const STORM_TEMPERATURE_DROP_C: f64 = 5.0;
const BASE_HUMIDITY_PCT: f64 = 30.0;
const MAX_HUMIDITY_PCT: f64 = 90.0;
const STORM_HUMIDITY_PCT: f64 = 20.0;
const SEA_LEVEL_PRESSURE_HPA: f64 = 1013.0;
const STORM_PRESSURE_DROP_HPA: f64 = 20.0;
const STORM_WIND_KMH: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Deteriorating,
    Stable,
}

/// Where the current-condition numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ConditionsSource {
    /// Deterministic function of the fused sky statistics.
    VisualEstimate,
    /// As above, plus seeded simulated sensor noise.
    VisualEstimateWithNoise { seed: u64 },
}

/// Illustrative conditions inferred from the sky. Never a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedConditions {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Hectopascals.
    pub pressure: f64,
    /// Kilometres per hour.
    pub wind_speed: f64,
    /// Compass bearing in degrees. An illustrative estimate like the rest of
    /// this struct: the bearing of the cloudiest valid sector, taken as the
    /// side weather is arriving from. Not a wind measurement.
    pub wind_direction: u16,
    pub source: ConditionsSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub trend: Trend,
    pub next_hour: String,
    pub next_6_hours: String,
    pub next_24_hours: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationAdvice {
    pub solar_navigation: NavigationQuality,
    pub star_navigation: NavigationQuality,
    pub gps_recommended: bool,
}

/// Statistics over the valid readings that fed the prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkyAggregate {
    pub avg_cloud_coverage: f64,
    pub avg_visibility: f64,
    pub has_storm: bool,
    pub is_overcast: bool,
    pub is_clear: bool,
    /// Directions that passed validation, in input order.
    pub directions: Vec<Direction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPrediction {
    pub current_conditions: EstimatedConditions,
    pub forecast: Forecast,
    pub navigation_advice: NavigationAdvice,
    pub aggregate: SkyAggregate,
}

pub struct WeatherPredictor<'a> {
    config: &'a PredictorConfig,
    noise: Option<&'a NoiseConfig>,
}

impl<'a> WeatherPredictor<'a> {
    pub fn new(config: &'a PredictorConfig, noise: Option<&'a NoiseConfig>) -> Self {
        Self { config, noise }
    }

    pub fn predict(&self, analyses: &[DirectionalAnalysis]) -> Result<WeatherPrediction> {
        let valid: Vec<&DirectionalAnalysis> =
            analyses.iter().filter(|a| a.is_valid_sky()).collect();
        if valid.is_empty() {
            return Err(SkyError::NoValidSkyData);
        }
        debug!(
            "fusing {} valid of {} directional readings",
            valid.len(),
            analyses.len()
        );

        let aggregate = self.aggregate(&valid);
        let trend = self.trend(&valid);
        let prediction = WeatherPrediction {
            current_conditions: self.estimate_conditions(&aggregate, &valid),
            forecast: forecast_for(trend),
            navigation_advice: self.navigation_advice(&aggregate),
            aggregate,
        };

        info!(
            "sky fused: coverage {:.1}%, visibility {:.1} km, storm {}, trend {:?}, gps {}",
            prediction.aggregate.avg_cloud_coverage,
            prediction.aggregate.avg_visibility,
            prediction.aggregate.has_storm,
            trend,
            prediction.navigation_advice.gps_recommended
        );
        Ok(prediction)
    }

    fn aggregate(&self, valid: &[&DirectionalAnalysis]) -> SkyAggregate {
        let n = valid.len() as f64;
        let count_of = |sky_type: SkyType| {
            valid
                .iter()
                .filter(|a| a.result.sky_type == sky_type)
                .count()
        };

        SkyAggregate {
            avg_cloud_coverage: valid.iter().map(|a| a.result.cloud_coverage).sum::<f64>() / n,
            avg_visibility: valid.iter().map(|a| a.result.visibility).sum::<f64>() / n,
            has_storm: count_of(SkyType::Stormy) > 0,
            is_overcast: count_of(SkyType::Overcast) >= self.config.overcast_min_count,
            is_clear: count_of(SkyType::Clear) >= self.config.clear_min_count,
            directions: valid.iter().map(|a| a.direction).collect(),
        }
    }

    /// Compares East/West cloudiness with North/South. Needs all four directions.
    pub fn trend(&self, valid: &[&DirectionalAnalysis]) -> Trend {
        let has_all = Direction::ALL
            .iter()
            .all(|d| valid.iter().any(|a| a.direction == *d));
        if !has_all {
            return Trend::Stable;
        }

        let axis_mean = |axis: Axis| {
            let readings: Vec<f64> = valid
                .iter()
                .filter(|a| a.direction.axis() == axis)
                .map(|a| a.result.cloud_coverage)
                .collect();
            readings.iter().sum::<f64>() / readings.len() as f64
        };
        let east_west = axis_mean(Axis::EastWest);
        let north_south = axis_mean(Axis::NorthSouth);
        let margin = self.config.trend_margin;

        if east_west <= north_south - margin {
            Trend::Improving
        } else if east_west >= north_south + margin {
            Trend::Deteriorating
        } else {
            Trend::Stable
        }
    }

    fn estimate_conditions(
        &self,
        aggregate: &SkyAggregate,
        valid: &[&DirectionalAnalysis],
    ) -> EstimatedConditions {
        let coverage = aggregate.avg_cloud_coverage;
        let storm = if aggregate.has_storm { 1.0 } else { 0.0 };

        let mut temperature =
            BASE_TEMPERATURE_C + (50.0 - coverage) * 0.1 - storm * STORM_TEMPERATURE_DROP_C;
        let humidity = (BASE_HUMIDITY_PCT + coverage * 0.6 + storm * STORM_HUMIDITY_PCT)
            .clamp(0.0, MAX_HUMIDITY_PCT);
        let mut pressure =
            SEA_LEVEL_PRESSURE_HPA - coverage * 0.3 - storm * STORM_PRESSURE_DROP_HPA;
        let mut wind_speed = (100.0 - aggregate.avg_visibility) * 0.2 + storm * STORM_WIND_KMH;

        let source = match self.noise {
            Some(noise) => {
                let mut rng = StdRng::seed_from_u64(noise.seed);
                temperature += rng.random_range(-noise.temperature..=noise.temperature);
                pressure += rng.random_range(-noise.pressure..=noise.pressure);
                wind_speed += rng.random_range(-noise.wind_speed..=noise.wind_speed);
                ConditionsSource::VisualEstimateWithNoise { seed: noise.seed }
            }
            None => ConditionsSource::VisualEstimate,
        };

        EstimatedConditions {
            temperature: round_tenths(temperature),
            humidity: humidity.round(),
            pressure: round_tenths(pressure),
            wind_speed: round_tenths(wind_speed.max(0.0)),
            wind_direction: cloudiest_direction(valid).bearing_degrees(),
            source,
        }
    }

    pub fn navigation_advice(&self, aggregate: &SkyAggregate) -> NavigationAdvice {
        let coverage = aggregate.avg_cloud_coverage;
        let rate = |bands: &NavigationBands| {
            if aggregate.has_storm {
                NavigationQuality::Poor
            } else {
                quality_for(coverage, bands)
            }
        };

        NavigationAdvice {
            solar_navigation: rate(&self.config.solar_bands),
            star_navigation: rate(&self.config.star_bands),
            gps_recommended: aggregate.has_storm
                || coverage > self.config.gps_max_coverage
                || aggregate.avg_visibility < self.config.gps_min_visibility,
        }
    }
}

fn quality_for(coverage: f64, bands: &NavigationBands) -> NavigationQuality {
    if coverage < bands.excellent_below {
        NavigationQuality::Excellent
    } else if coverage < bands.good_below {
        NavigationQuality::Good
    } else if coverage < bands.fair_below {
        NavigationQuality::Fair
    } else {
        NavigationQuality::Poor
    }
}

/// The sector with the most cloud; first in compass order on ties.
fn cloudiest_direction(valid: &[&DirectionalAnalysis]) -> Direction {
    let mut best: Option<&DirectionalAnalysis> = None;
    for direction in Direction::ALL {
        for analysis in valid.iter().copied().filter(|a| a.direction == direction) {
            let cloudier = best
                .is_none_or(|b| analysis.result.cloud_coverage > b.result.cloud_coverage);
            if cloudier {
                best = Some(analysis);
            }
        }
    }
    best.map(|a| a.direction).unwrap_or(Direction::North)
}

fn forecast_for(trend: Trend) -> Forecast {
    let (next_hour, next_6_hours, next_24_hours) = match trend {
        Trend::Improving => (
            "Conditions improving, expect clearing skies",
            "Significant improvement expected, mostly clear skies",
            "Clear weather pattern establishing",
        ),
        Trend::Deteriorating => (
            "Weather deteriorating, increasing cloud cover",
            "Conditions worsening, possible precipitation",
            "Storm system approaching",
        ),
        Trend::Stable => (
            "Conditions remain stable",
            "No major changes expected",
            "Weather pattern remains consistent",
        ),
    };

    Forecast {
        trend,
        next_hour: next_hour.to_string(),
        next_6_hours: next_6_hours.to_string(),
        next_24_hours: next_24_hours.to_string(),
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
