// THEORY:
// The `PixelGrid` is the fixed-resolution canvas every analysis stage reads.
// Like the `Pixel` it holds, it is a "dumb" data container: it knows how to
// index itself and how to summarise its own channels, but it never decides
// what those numbers mean for the weather.
//
// Key architectural principles:
// 1.  **Canonical Resolution**: Grids are produced by the `PixelSampler` at one
//     configured size (224x224 by default). Ratio and count thresholds in the
//     later stages are only comparable across photos because of this.
// 2.  **Single Owner**: A grid is built for one capture, handed to one analysis,
//     and dropped. Nothing mutates it after construction.
// 3.  **Row-Major Layout**: `pixels[y * width + x]`, the same layout as the
//     camera frame buffers it is resampled from.

use crate::core_modules::pixel::Pixel;

/// A rectangular buffer of RGB samples at the canonical analysis resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

/// Per-channel arithmetic means over the whole grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelMeans {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub brightness: f64,
}

impl PixelGrid {
    /// Wraps an already-sampled buffer. Returns `None` when the buffer length
    /// does not match `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![pixel; width as usize * height as usize],
        }
    }

    /// Builds a grid by evaluating `f(x, y)` for every position.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Pixel) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// The sample at column `x`, row `y`. Callers stay inside the grid.
    #[inline]
    pub fn at(&self, x: u32, y: u32) -> Pixel {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    /// Brightness of every sample, in row-major order.
    pub fn brightness_values(&self) -> Vec<f64> {
        self.pixels.iter().map(Pixel::brightness).collect()
    }

    pub fn channel_means(&self) -> ChannelMeans {
        let count = self.pixels.len();
        if count == 0 {
            return ChannelMeans::default();
        }

        let mut sum_r = 0u64;
        let mut sum_g = 0u64;
        let mut sum_b = 0u64;
        for pixel in &self.pixels {
            sum_r += pixel.red as u64;
            sum_g += pixel.green as u64;
            sum_b += pixel.blue as u64;
        }

        let n = count as f64;
        let red = sum_r as f64 / n;
        let green = sum_g as f64 / n;
        let blue = sum_b as f64 / n;
        ChannelMeans {
            red,
            green,
            blue,
            brightness: (red + green + blue) / 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(PixelGrid::new(2, 2, vec![Pixel::default(); 3]).is_none());
        assert!(PixelGrid::new(2, 2, vec![Pixel::default(); 4]).is_some());
    }

    #[test]
    fn from_fn_is_row_major() {
        let grid = PixelGrid::from_fn(3, 2, |x, y| Pixel::new(x as u8, y as u8, 0));
        assert_eq!(grid.at(2, 0), Pixel::new(2, 0, 0));
        assert_eq!(grid.at(1, 1), Pixel::new(1, 1, 0));
        assert_eq!(grid.pixels()[4], Pixel::new(1, 1, 0));
        assert_eq!(grid.rows().count(), 2);
    }

    #[test]
    fn channel_means_average_every_sample() {
        let grid = PixelGrid::from_fn(2, 1, |x, _| {
            if x == 0 {
                Pixel::new(0, 100, 200)
            } else {
                Pixel::new(100, 100, 100)
            }
        });
        let means = grid.channel_means();
        assert_eq!(means.red, 50.0);
        assert_eq!(means.green, 100.0);
        assert_eq!(means.blue, 150.0);
        assert_eq!(means.brightness, 100.0);
    }
}
