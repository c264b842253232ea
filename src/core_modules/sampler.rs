// THEORY:
// The `PixelSampler` is the only place raw image data enters the engine. It
// turns whatever the capture layer hands over (an encoded photo, or a raw RGBA
// frame buffer) into a `PixelGrid` at the canonical resolution.
//
// Key architectural principles:
// 1.  **Decoder at the Boundary**: Decoding is delegated to a `FrameDecoder`.
//     The default uses the `image` crate, but anything that can produce an
//     `RgbImage` (a platform codec, a GPU resize path) can be swapped in without
//     touching the analysis stages.
// 2.  **All or Nothing**: A payload either becomes a complete grid or an error.
//     There is no partially filled buffer to leak into the thresholds.
// 3.  **Resampling, Not Cropping**: The whole field of view is kept and scaled
//     with a bilinear filter, matching a canvas `drawImage` onto a fixed-size
//     surface.

use crate::config::SamplerConfig;
use crate::core_modules::pixel::Pixel;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::error::{Result, SkyError};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, RgbaImage};

const RGBA_CHANNELS: usize = 4;

/// Turns an encoded image payload into decoded RGB pixels.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<RgbImage>;
}

/// Decodes any format the `image` crate was built with (PNG, JPEG, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl FrameDecoder for ImageCrateDecoder {
    fn decode(&self, payload: &[u8]) -> Result<RgbImage> {
        let image = image::load_from_memory(payload)?;
        Ok(image.to_rgb8())
    }
}

/// Resamples decoded images onto the canonical analysis grid.
#[derive(Debug, Clone)]
pub struct PixelSampler {
    width: u32,
    height: u32,
    filter: FilterType,
}

impl PixelSampler {
    pub fn new(config: &SamplerConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            filter: FilterType::Triangle,
        }
    }

    pub fn canonical_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn sample(&self, image: &RgbImage) -> Result<PixelGrid> {
        if image.width() == 0 || image.height() == 0 {
            return Err(SkyError::EmptyImage);
        }

        let resized;
        let source = if image.dimensions() == (self.width, self.height) {
            image
        } else {
            resized = imageops::resize(image, self.width, self.height, self.filter);
            &resized
        };

        let pixels: Vec<Pixel> = source.pixels().map(|p| Pixel::from(*p)).collect();
        PixelGrid::new(self.width, self.height, pixels).ok_or(SkyError::MalformedBuffer {
            expected: self.width as usize * self.height as usize,
            actual: source.len() / 3,
        })
    }

    /// Samples a raw, tightly packed RGBA frame buffer.
    pub fn sample_rgba(&self, width: u32, height: u32, buffer: &[u8]) -> Result<PixelGrid> {
        let expected = width as usize * height as usize * RGBA_CHANNELS;
        if buffer.len() != expected {
            return Err(SkyError::MalformedBuffer {
                expected,
                actual: buffer.len(),
            });
        }
        if width == 0 || height == 0 {
            return Err(SkyError::EmptyImage);
        }

        let rgba = RgbaImage::from_raw(width, height, buffer.to_vec()).ok_or(
            SkyError::MalformedBuffer {
                expected,
                actual: buffer.len(),
            },
        )?;
        self.sample(&DynamicImage::ImageRgba8(rgba).to_rgb8())
    }

    pub fn sample_payload(&self, decoder: &dyn FrameDecoder, payload: &[u8]) -> Result<PixelGrid> {
        let image = decoder.decode(payload)?;
        self.sample(&image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageEncoder;
    use image::codecs::png::PngEncoder;

    fn sampler(width: u32, height: u32) -> PixelSampler {
        PixelSampler::new(&SamplerConfig { width, height })
    }

    fn encode_png(width: u32, height: u32, rgb: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(rgb, width, height, image::ExtendedColorType::Rgb8)
            .expect("Error encoding PNG.");
        out
    }

    #[test]
    fn resamples_to_canonical_size() {
        let image = RgbImage::from_pixel(100, 60, image::Rgb([10, 20, 30]));
        let grid = sampler(32, 32).sample(&image).unwrap();
        assert_eq!((grid.width(), grid.height()), (32, 32));
        assert_eq!(grid.len(), 32 * 32);
        assert!(grid.pixels().iter().all(|p| *p == Pixel::new(10, 20, 30)));
    }

    #[test]
    fn canonical_image_is_copied_verbatim() {
        let image = RgbImage::from_fn(4, 4, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let grid = sampler(4, 4).sample(&image).unwrap();
        assert_eq!(grid.at(3, 1), Pixel::new(3, 1, 7));
    }

    #[test]
    fn empty_image_is_rejected() {
        let image = RgbImage::new(0, 10);
        assert!(matches!(sampler(8, 8).sample(&image), Err(SkyError::EmptyImage)));
    }

    #[test]
    fn rgba_buffer_drops_alpha() {
        let buffer = [200u8, 100, 50, 0].repeat(16);
        let grid = sampler(4, 4).sample_rgba(4, 4, &buffer).unwrap();
        assert!(grid.pixels().iter().all(|p| *p == Pixel::new(200, 100, 50)));
    }

    #[test]
    fn short_rgba_buffer_is_malformed() {
        let buffer = vec![0u8; 4 * 4 * 4 - 1];
        let err = sampler(4, 4).sample_rgba(4, 4, &buffer).unwrap_err();
        assert!(matches!(
            err,
            SkyError::MalformedBuffer {
                expected: 64,
                actual: 63
            }
        ));
    }

    #[test]
    fn decodes_png_payload() {
        let rgb = [90u8, 140, 230].repeat(8 * 8);
        let png = encode_png(8, 8, &rgb);
        let grid = sampler(16, 16).sample_payload(&ImageCrateDecoder, &png).unwrap();
        assert_eq!(grid.width(), 16);
        assert!(grid.pixels().iter().all(|p| *p == Pixel::new(90, 140, 230)));
    }

    #[test]
    fn garbage_payload_is_decode_error() {
        let err = sampler(8, 8)
            .sample_payload(&ImageCrateDecoder, b"definitely not an image")
            .unwrap_err();
        assert!(matches!(err, SkyError::ImageDecode(_)));
    }
}
