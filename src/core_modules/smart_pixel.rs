// THEORY:
// The `SmartPixel` module provides the comparative capabilities of the sky
// engine. It is a "smart" wrapper around a "dumb" `Pixel`: on its own it adds
// nothing, its value is in quantifying the difference between two samples.
//
// Three stages lean on it:
// - the horizon scan (vertical neighbours in the lower half of the frame),
// - the artificial-edge scan (horizontal neighbours across the frame),
// - the visibility estimator (local contrast on a coarse lattice).
//
// Brightness is cached in the constructor so a pixel compared against both its
// right and lower neighbour only pays for the channel mean once.

pub mod smart_pixel {
    use crate::core_modules::pixel::pixel::{Brightness, Pixel};

    pub type BrightnessDelta = f64;

    /// An analytical wrapper around a `Pixel` with a cached brightness.
    #[derive(Debug, Clone, Copy)]
    pub struct SmartPixel {
        pub pixel: Pixel,
        brightness: Brightness,
    }

    impl SmartPixel {
        pub fn new(pixel: Pixel) -> Self {
            Self {
                brightness: pixel.brightness(),
                pixel,
            }
        }

        pub fn brightness(&self) -> Brightness {
            self.brightness
        }

        /// Absolute brightness difference between two samples.
        pub fn delta_brightness(&self, other: &SmartPixel) -> BrightnessDelta {
            (self.brightness - other.brightness).abs()
        }

        /// True when the brightness step to `other` is strictly above `threshold`.
        pub fn is_edge_to(&self, other: &SmartPixel, threshold: BrightnessDelta) -> bool {
            self.delta_brightness(other) > threshold
        }
    }

    impl From<Pixel> for SmartPixel {
        fn from(pixel: Pixel) -> Self {
            SmartPixel::new(pixel)
        }
    }
}

pub use smart_pixel::SmartPixel;
