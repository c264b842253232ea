// THEORY:
// Haze and fog wash out local contrast. The visibility estimator exploits that
// with a cheap proxy: on a coarse lattice (every `stride`-th pixel along each
// axis) it measures the brightness step to the immediate right-hand neighbour,
// averages those steps, and scales the result into kilometres.
//
//     visibility_km = clamp(avg_contrast / contrast_scale, min_km, max_km)
//
// This is a contrast heuristic, not a physical range measurement. A perfectly
// flat frame (no samples, or no contrast) reports the minimum.

use crate::config::VisibilityConfig;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::smart_pixel::SmartPixel;

pub struct VisibilityEstimator<'a> {
    config: &'a VisibilityConfig,
}

impl<'a> VisibilityEstimator<'a> {
    pub fn new(config: &'a VisibilityConfig) -> Self {
        Self { config }
    }

    /// Mean absolute brightness step over the sampling lattice.
    pub fn average_contrast(&self, grid: &PixelGrid) -> f64 {
        let stride = self.config.sample_stride.max(1) as usize;
        let mut contrast_sum = 0.0;
        let mut samples = 0usize;

        for y in (0..grid.height().saturating_sub(1)).step_by(stride) {
            for x in (0..grid.width().saturating_sub(1)).step_by(stride) {
                let here = SmartPixel::new(grid.at(x, y));
                let right = SmartPixel::new(grid.at(x + 1, y));
                contrast_sum += here.delta_brightness(&right);
                samples += 1;
            }
        }

        if samples == 0 {
            0.0
        } else {
            contrast_sum / samples as f64
        }
    }

    /// Approximate visibility in kilometres.
    pub fn estimate(&self, grid: &PixelGrid) -> f64 {
        let km = self.average_contrast(grid) / self.config.contrast_scale;
        km.clamp(self.config.min_km, self.config.max_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::Pixel;

    fn estimate(grid: &PixelGrid) -> f64 {
        let config = VisibilityConfig::default();
        VisibilityEstimator::new(&config).estimate(grid)
    }

    #[test]
    fn flat_frame_reports_minimum() {
        assert_eq!(estimate(&PixelGrid::filled(64, 64, Pixel::new(128, 128, 128))), 1.0);
    }

    #[test]
    fn checkerboard_saturates_at_maximum() {
        let grid = PixelGrid::from_fn(64, 64, |x, _| {
            if x % 2 == 0 {
                Pixel::new(0, 0, 0)
            } else {
                Pixel::new(255, 255, 255)
            }
        });
        assert_eq!(estimate(&grid), 25.0);
    }

    #[test]
    fn moderate_contrast_scales_linearly() {
        // Every sampled x is even, so each step is exactly 80 brightness levels.
        let grid = PixelGrid::from_fn(64, 64, |x, _| {
            if x % 2 == 0 {
                Pixel::new(100, 100, 100)
            } else {
                Pixel::new(180, 180, 180)
            }
        });
        assert!((estimate(&grid) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_width_has_no_samples() {
        let config = VisibilityConfig::default();
        let estimator = VisibilityEstimator::new(&config);
        let grid = PixelGrid::filled(1, 10, Pixel::new(0, 0, 0));
        assert_eq!(estimator.average_contrast(&grid), 0.0);
        assert_eq!(estimator.estimate(&grid), 1.0);
    }
}
