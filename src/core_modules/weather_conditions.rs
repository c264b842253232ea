// THEORY:
// Adverse conditions are read from the brightness distribution alone:
// - how much of the frame is dark (rain shafts, storm bases),
// - how flat the frame is, expressed as uniformity = 1 / (1 + variance / scale),
//   which is 1.0 for a perfectly flat field and falls towards 0 as contrast
//   grows.
//
// The four flags are independent. A dim, flat, mostly dark frame can be both
// foggy and precipitating; callers must not assume at most one is set.

use crate::config::ConditionThresholds;
use crate::core_modules::pixel_grid::PixelGrid;
use serde::{Deserialize, Serialize};

/// Adverse-condition flags for one photo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherConditions {
    pub precipitation: bool,
    pub fog: bool,
    pub haze: bool,
    pub storm: bool,
}

/// The statistics the flags were derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessProfile {
    pub avg_brightness: f64,
    pub variance: f64,
    pub uniformity: f64,
    pub dark_fraction: f64,
}

pub struct WeatherConditionDetector<'a> {
    thresholds: &'a ConditionThresholds,
}

impl<'a> WeatherConditionDetector<'a> {
    pub fn new(thresholds: &'a ConditionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn profile(&self, grid: &PixelGrid) -> BrightnessProfile {
        let values = grid.brightness_values();
        if values.is_empty() {
            return BrightnessProfile {
                avg_brightness: 0.0,
                variance: 0.0,
                uniformity: 1.0,
                dark_fraction: 0.0,
            };
        }

        let count = values.len() as f64;
        let avg_brightness = values.iter().sum::<f64>() / count;
        let variance = values
            .iter()
            .map(|v| (v - avg_brightness).powi(2))
            .sum::<f64>()
            / count;
        let dark = values
            .iter()
            .filter(|v| **v < self.thresholds.dark_brightness)
            .count();

        BrightnessProfile {
            avg_brightness,
            variance,
            uniformity: 1.0 / (1.0 + variance / self.thresholds.variance_scale),
            dark_fraction: dark as f64 / count,
        }
    }

    pub fn detect(&self, grid: &PixelGrid) -> WeatherConditions {
        self.flags(&self.profile(grid))
    }

    pub fn flags(&self, profile: &BrightnessProfile) -> WeatherConditions {
        let t = self.thresholds;
        let b = profile.avg_brightness;

        WeatherConditions {
            precipitation: profile.dark_fraction > t.precipitation_dark_fraction,
            fog: profile.uniformity > t.fog_min_uniformity && b < t.fog_max_brightness,
            haze: profile.uniformity > t.haze_min_uniformity
                && b >= t.haze_min_brightness
                && b < t.haze_max_brightness,
            storm: profile.dark_fraction > t.storm_dark_fraction
                && profile.variance > t.storm_min_variance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::Pixel;

    fn detector_test<T>(f: impl FnOnce(&WeatherConditionDetector) -> T) -> T {
        let thresholds = ConditionThresholds::default();
        f(&WeatherConditionDetector::new(&thresholds))
    }

    #[test]
    fn flat_dark_field_is_fog_and_precipitation() {
        let grid = PixelGrid::filled(32, 32, Pixel::new(40, 40, 40));
        let (profile, flags) = detector_test(|d| (d.profile(&grid), d.detect(&grid)));
        assert_eq!(profile.variance, 0.0);
        assert_eq!(profile.uniformity, 1.0);
        assert!(flags.fog);
        assert!(flags.precipitation);
        assert!(!flags.storm);
        assert!(!flags.haze);
    }

    #[test]
    fn flat_mid_bright_field_is_haze() {
        let grid = PixelGrid::filled(32, 32, Pixel::new(150, 150, 150));
        let flags = detector_test(|d| d.detect(&grid));
        assert!(flags.haze);
        assert!(!flags.fog);
        assert!(!flags.precipitation);
    }

    #[test]
    fn haze_lower_bound_is_inclusive() {
        let grid = PixelGrid::filled(8, 8, Pixel::new(120, 120, 120));
        let flags = detector_test(|d| d.detect(&grid));
        assert!(flags.haze);
        assert!(!flags.fog);
    }

    #[test]
    fn haze_upper_bound_is_exclusive() {
        let at_bound = PixelGrid::filled(8, 8, Pixel::new(180, 180, 180));
        let below = PixelGrid::filled(8, 8, Pixel::new(179, 179, 179));
        assert!(!detector_test(|d| d.detect(&at_bound)).haze);
        assert!(detector_test(|d| d.detect(&below)).haze);
    }

    #[test]
    fn precipitation_needs_more_than_the_dark_fraction() {
        // 10 pixels in one row; the first `dark` of them are near-black.
        let row = |dark: u32| {
            PixelGrid::from_fn(10, 1, move |x, _| {
                if x < dark {
                    Pixel::new(10, 10, 10)
                } else {
                    Pixel::new(200, 200, 200)
                }
            })
        };
        let (profile, flags) = detector_test(|d| (d.profile(&row(3)), d.detect(&row(3))));
        assert_eq!(profile.dark_fraction, 0.3);
        assert!(!flags.precipitation);
        assert!(detector_test(|d| d.detect(&row(4))).precipitation);
    }

    #[test]
    fn storm_needs_variance_above_the_minimum() {
        let profile = |variance: f64| BrightnessProfile {
            avg_brightness: 90.0,
            variance,
            uniformity: 1.0 / (1.0 + variance / 1000.0),
            dark_fraction: 0.6,
        };
        assert!(!detector_test(|d| d.flags(&profile(2000.0))).storm);
        assert!(detector_test(|d| d.flags(&profile(2000.5))).storm);
    }

    #[test]
    fn dark_contrasty_field_is_a_storm() {
        // 60% near-black, 40% bright: dark fraction 0.6 and a large variance.
        let grid = PixelGrid::from_fn(10, 10, |x, _| {
            if x < 6 {
                Pixel::new(10, 10, 10)
            } else {
                Pixel::new(230, 230, 230)
            }
        });
        let (profile, flags) = detector_test(|d| (d.profile(&grid), d.detect(&grid)));
        assert!(profile.variance > 2000.0);
        assert!(flags.storm);
        assert!(flags.precipitation);
        assert!(!flags.fog);
    }

    #[test]
    fn bright_clear_field_raises_nothing() {
        let grid = PixelGrid::filled(8, 8, Pixel::new(160, 190, 240));
        let flags = detector_test(|d| d.detect(&grid));
        assert_eq!(flags, WeatherConditions::default());
    }
}
