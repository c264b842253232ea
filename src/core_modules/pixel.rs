// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the sky engine. It is a
// "dumb" data container for a single RGB sample plus a set of 1-dimensional
// heuristics: metrics that can be computed from this pixel alone, with no
// knowledge of its neighbours. Anything that needs another pixel (brightness
// deltas, contrast, edges) belongs in `SmartPixel`.
//
// Heuristic families (all single-pixel):
// - Brightness:  arithmetic mean of R, G, B on the 0..255 scale. Every
//                threshold in the engine is expressed on this scale.
// - Blue dominance: blue strictly above both red and green (clear sky).
// - Near-gray:   red/green and green/blue differences both below a tolerance
//                (overcast white, cloud, fog).
// - Blue margins: how far blue rises above red and above green, used to tell
//                saturated clear sky from pale haze.
//
// Alpha is accepted on input (RGBA camera buffers) but dropped immediately:
// the analysis never looks at transparency.

pub mod pixel {
    use crate::error::SkyError;

    pub type Channel = u8;
    pub type Brightness = f64;

    /// A "dumb" data container representing a single RGB sample.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Self { red, green, blue }
        }

        /// Mean channel intensity on the 0..255 scale.
        #[inline]
        pub fn brightness(&self) -> Brightness {
            (self.red as f64 + self.green as f64 + self.blue as f64) / 3.0
        }

        /// Blue strictly greater than both red and green.
        #[inline]
        pub fn is_blue_dominant(&self) -> bool {
            self.blue > self.red && self.blue > self.green
        }

        #[inline]
        pub fn is_bright(&self, threshold: Brightness) -> bool {
            self.brightness() > threshold
        }

        /// Red/green and green/blue differences are both below `tolerance`.
        #[inline]
        pub fn is_near_gray(&self, tolerance: u8) -> bool {
            self.red.abs_diff(self.green) < tolerance && self.green.abs_diff(self.blue) < tolerance
        }

        /// Signed amount by which blue exceeds red.
        #[inline]
        pub fn blue_over_red(&self) -> i16 {
            self.blue as i16 - self.red as i16
        }

        /// Signed amount by which blue exceeds green.
        #[inline]
        pub fn blue_over_green(&self) -> i16 {
            self.blue as i16 - self.green as i16
        }
    }

    impl TryFrom<&[u8]> for Pixel {
        type Error = SkyError;

        /// Accepts RGB (3 bytes) or RGBA (4 bytes, alpha discarded).
        fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
            match bytes {
                [r, g, b] | [r, g, b, _] => Ok(Pixel::new(*r, *g, *b)),
                _ => Err(SkyError::MalformedBuffer {
                    expected: 4,
                    actual: bytes.len(),
                }),
            }
        }
    }

    impl From<image::Rgb<u8>> for Pixel {
        fn from(rgb: image::Rgb<u8>) -> Self {
            let [red, green, blue] = rgb.0;
            Pixel::new(red, green, blue)
        }
    }
}

pub use pixel::Pixel;
