// THEORY:
// The `SkyValidator` is the gate in front of every weather estimate. Its job is
// to decide whether a photo plausibly shows open sky, so that a shot of a
// ceiling, a wall or a pocket never gets fused into the forecast.
//
// The decision is a conjunctive rule, not a learned boundary:
//     is_valid_sky = sky_pixel_ratio > min_ratio AND avg_brightness > floor
// with confidence = min(2 * sky_pixel_ratio, 1).
//
// Three diagnostic signals ride along with the verdict. They do not change it,
// but they let the caller explain a rejection ("too dark, looks indoors") or
// warn about an obstructed view:
// - horizon:    many strong vertical brightness steps in the lower half,
// - artificial: hard horizontal edges in more than a sliver of pixel pairs,
// - indoor:     dim overall AND little blue.

use crate::config::ValidatorThresholds;
use crate::core_modules::pixel::Pixel;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::smart_pixel::SmartPixel;

/// The raw outcome of validating one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyValidation {
    pub is_valid_sky: bool,
    pub confidence: f64,
    pub sky_pixel_ratio: f64,
    pub avg_brightness: f64,
    pub avg_blue: f64,
    pub horizon_detected: bool,
    pub artificial_objects_detected: bool,
    pub indoor_detected: bool,
}

pub struct SkyValidator<'a> {
    thresholds: &'a ValidatorThresholds,
}

impl<'a> SkyValidator<'a> {
    pub fn new(thresholds: &'a ValidatorThresholds) -> Self {
        Self { thresholds }
    }

    pub fn validate(&self, grid: &PixelGrid) -> SkyValidation {
        let t = self.thresholds;
        let total = grid.len();
        if total == 0 {
            return SkyValidation {
                is_valid_sky: false,
                confidence: 0.0,
                sky_pixel_ratio: 0.0,
                avg_brightness: 0.0,
                avg_blue: 0.0,
                horizon_detected: false,
                artificial_objects_detected: false,
                indoor_detected: false,
            };
        }

        let sky_pixels = grid.pixels().iter().filter(|p| self.is_sky_like(p)).count();
        let sky_pixel_ratio = sky_pixels as f64 / total as f64;

        let means = grid.channel_means();
        let avg_brightness = means.brightness;
        let avg_blue = means.blue;

        let is_valid_sky =
            sky_pixel_ratio > t.min_sky_pixel_ratio && avg_brightness > t.min_avg_brightness;
        let indoor_detected =
            avg_brightness < t.indoor_max_brightness && avg_blue < t.indoor_max_blue;

        SkyValidation {
            is_valid_sky,
            confidence: Self::confidence_for_ratio(sky_pixel_ratio),
            sky_pixel_ratio,
            avg_brightness,
            avg_blue,
            horizon_detected: self.detect_horizon(grid),
            artificial_objects_detected: self.detect_artificial_edges(grid),
            indoor_detected,
        }
    }

    /// Blue-dominant, bright, or near-gray.
    pub fn is_sky_like(&self, pixel: &Pixel) -> bool {
        pixel.is_blue_dominant()
            || pixel.is_bright(self.thresholds.sky_brightness)
            || pixel.is_near_gray(self.thresholds.gray_tolerance)
    }

    /// Monotone in the ratio and bounded to [0, 1].
    pub fn confidence_for_ratio(sky_pixel_ratio: f64) -> f64 {
        (sky_pixel_ratio * 2.0).clamp(0.0, 1.0)
    }

    /// Counts strong brightness steps between each pixel and the one below it,
    /// over the lower half of the frame.
    fn detect_horizon(&self, grid: &PixelGrid) -> bool {
        let (width, height) = (grid.width(), grid.height());
        let mut horizontal_edges = 0usize;

        for y in height / 2..height.saturating_sub(1) {
            for x in 0..width {
                let upper = SmartPixel::new(grid.at(x, y));
                let lower = SmartPixel::new(grid.at(x, y + 1));
                if upper.is_edge_to(&lower, self.thresholds.horizon_delta) {
                    horizontal_edges += 1;
                }
            }
        }

        horizontal_edges as f64 > width as f64 * self.thresholds.horizon_width_fraction
    }

    /// Hard edges between horizontal neighbours, as a fraction of all such pairs.
    fn detect_artificial_edges(&self, grid: &PixelGrid) -> bool {
        let mut pairs = 0usize;
        let mut edges = 0usize;

        for row in grid.rows() {
            let mut previous: Option<SmartPixel> = None;
            for pixel in row {
                let current = SmartPixel::new(*pixel);
                if let Some(left) = previous {
                    pairs += 1;
                    if left.is_edge_to(&current, self.thresholds.edge_delta) {
                        edges += 1;
                    }
                }
                previous = Some(current);
            }
        }

        pairs > 0 && edges as f64 > pairs as f64 * self.thresholds.edge_pair_fraction
    }
}
