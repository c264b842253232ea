// THEORY:
// The classifier is a pure decision table over coverage and the storm flag,
// evaluated top to bottom, first match wins:
//
//     storm               -> Stormy
//     coverage < 10       -> Clear
//     coverage < 40       -> PartlyCloudy
//     coverage < 80       -> Cloudy
//     otherwise           -> Overcast
//
// Comparisons are strict, so a value exactly on a boundary belongs to the
// bucket that starts there (exactly 10 is PartlyCloudy). Every input maps to
// exactly one label.

use crate::config::ClassifierThresholds;
use crate::core_modules::weather_conditions::WeatherConditions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyType {
    Clear,
    PartlyCloudy,
    Cloudy,
    Overcast,
    Stormy,
}

pub struct SkyClassifier<'a> {
    thresholds: &'a ClassifierThresholds,
}

impl<'a> SkyClassifier<'a> {
    pub fn new(thresholds: &'a ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, coverage: f64, conditions: &WeatherConditions) -> SkyType {
        let t = self.thresholds;
        if conditions.storm {
            SkyType::Stormy
        } else if coverage < t.clear_below {
            SkyType::Clear
        } else if coverage < t.partly_cloudy_below {
            SkyType::PartlyCloudy
        } else if coverage < t.cloudy_below {
            SkyType::Cloudy
        } else {
            SkyType::Overcast
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(coverage: f64, storm: bool) -> SkyType {
        let thresholds = ClassifierThresholds::default();
        let conditions = WeatherConditions {
            storm,
            ..Default::default()
        };
        SkyClassifier::new(&thresholds).classify(coverage, &conditions)
    }

    #[test]
    fn storm_overrides_coverage() {
        assert_eq!(classify(0.0, true), SkyType::Stormy);
        assert_eq!(classify(100.0, true), SkyType::Stormy);
    }

    #[test]
    fn buckets_by_coverage() {
        assert_eq!(classify(0.0, false), SkyType::Clear);
        assert_eq!(classify(9.99, false), SkyType::Clear);
        assert_eq!(classify(25.0, false), SkyType::PartlyCloudy);
        assert_eq!(classify(60.0, false), SkyType::Cloudy);
        assert_eq!(classify(100.0, false), SkyType::Overcast);
    }

    #[test]
    fn boundaries_fall_into_the_next_bucket() {
        assert_eq!(classify(10.0, false), SkyType::PartlyCloudy);
        assert_eq!(classify(40.0, false), SkyType::Cloudy);
        assert_eq!(classify(80.0, false), SkyType::Overcast);
    }

    #[test]
    fn other_flags_do_not_change_the_label() {
        let thresholds = ClassifierThresholds::default();
        let conditions = WeatherConditions {
            precipitation: true,
            fog: true,
            haze: true,
            storm: false,
        };
        assert_eq!(
            SkyClassifier::new(&thresholds).classify(5.0, &conditions),
            SkyType::Clear
        );
    }
}
