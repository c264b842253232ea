// THEORY:
// Cloud coverage is measured only over pixels that clearly belong to one of two
// classes:
// - cloud:      bright and nearly colourless (white or light gray),
// - clear sky:  blue well above red, somewhat above green, and not so bright
//               that it is really a sunlit cloud edge.
// Everything else (trees, horizon, glare with a colour cast) is ignored, so the
// percentage describes the sky portion of the frame, not the frame.
//
// A frame with no pixels in either class has no measurable sky; coverage is
// reported as 0 (indeterminate-clear) instead of dividing by zero.

use crate::config::CoverageThresholds;
use crate::core_modules::pixel::Pixel;
use crate::core_modules::pixel_grid::PixelGrid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageEstimate {
    /// Percent in [0, 100].
    pub coverage: f64,
    pub cloud_pixels: usize,
    pub clear_sky_pixels: usize,
}

pub struct CloudCoverageEstimator<'a> {
    thresholds: &'a CoverageThresholds,
}

impl<'a> CloudCoverageEstimator<'a> {
    pub fn new(thresholds: &'a CoverageThresholds) -> Self {
        Self { thresholds }
    }

    pub fn estimate(&self, grid: &PixelGrid) -> CoverageEstimate {
        let mut cloud_pixels = 0usize;
        let mut clear_sky_pixels = 0usize;

        for pixel in grid.pixels() {
            if self.is_cloud(pixel) {
                cloud_pixels += 1;
            }
            if self.is_clear_sky(pixel) {
                clear_sky_pixels += 1;
            }
        }

        let classified = cloud_pixels + clear_sky_pixels;
        let coverage = if classified == 0 {
            0.0
        } else {
            (cloud_pixels as f64 / classified as f64 * 100.0).clamp(0.0, 100.0)
        };

        CoverageEstimate {
            coverage,
            cloud_pixels,
            clear_sky_pixels,
        }
    }

    pub fn is_cloud(&self, pixel: &Pixel) -> bool {
        pixel.is_bright(self.thresholds.cloud_min_brightness)
            && pixel.is_near_gray(self.thresholds.cloud_channel_tolerance)
    }

    pub fn is_clear_sky(&self, pixel: &Pixel) -> bool {
        pixel.blue_over_red() > self.thresholds.clear_blue_over_red
            && pixel.blue_over_green() > self.thresholds.clear_blue_over_green
            && pixel.brightness() < self.thresholds.clear_max_brightness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOUD: Pixel = Pixel::new(220, 220, 225);
    const BLUE: Pixel = Pixel::new(90, 140, 230);

    fn estimate(grid: &PixelGrid) -> CoverageEstimate {
        let thresholds = CoverageThresholds::default();
        CloudCoverageEstimator::new(&thresholds).estimate(grid)
    }

    #[test]
    fn pure_blue_sky_has_no_coverage() {
        let e = estimate(&PixelGrid::filled(16, 16, BLUE));
        assert_eq!(e.coverage, 0.0);
        assert_eq!(e.clear_sky_pixels, 256);
    }

    #[test]
    fn pure_white_sky_is_fully_covered() {
        let e = estimate(&PixelGrid::filled(16, 16, CLOUD));
        assert_eq!(e.coverage, 100.0);
    }

    #[test]
    fn coverage_is_share_of_classified_pixels() {
        // A quarter cloud, half blue, a quarter unclassifiable green.
        let grid = PixelGrid::from_fn(4, 4, |x, _| match x {
            0 => CLOUD,
            1 | 2 => BLUE,
            _ => Pixel::new(30, 120, 40),
        });
        let e = estimate(&grid);
        assert_eq!(e.cloud_pixels, 4);
        assert_eq!(e.clear_sky_pixels, 8);
        assert!((e.coverage - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn nothing_classified_means_zero_coverage() {
        let e = estimate(&PixelGrid::filled(8, 8, Pixel::new(20, 20, 20)));
        assert_eq!(e.cloud_pixels + e.clear_sky_pixels, 0);
        assert_eq!(e.coverage, 0.0);
    }

    #[test]
    fn very_bright_blue_is_not_clear_sky() {
        let thresholds = CoverageThresholds::default();
        let estimator = CloudCoverageEstimator::new(&thresholds);
        assert!(!estimator.is_clear_sky(&Pixel::new(170, 200, 250)));
        assert!(estimator.is_clear_sky(&BLUE));
    }
}
