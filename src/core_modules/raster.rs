// THEORY:
// `RasterImage` is the decoded input of every comparison: a width, a height and a
// flat, row-major RGBA8 buffer. The buffer length invariant
// (`width * height * 4`) is checked once, at construction, and the fields are
// private so nothing can break it afterwards. Every metric can then index the
// buffer without re-validating.
//
// Rasters are immutable for the lifetime of a comparison. The engine only ever
// borrows them.

use crate::core_modules::error::RasterError;
use crate::core_modules::luminance::LuminanceField;
use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};

/// A decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyDimensions { width, height });
        }
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(RasterError::BufferLength {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a raster where every pixel has the same RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, RasterError> {
        let count = width as usize * height as usize;
        let pixels = rgba.iter().copied().cycle().take(count * CHANNELS).collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len() / CHANNELS
    }

    pub fn same_dimensions(&self, other: &RasterImage) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// The pixel at a row-major index.
    pub fn pixel(&self, index: usize) -> Pixel {
        let start = index * CHANNELS;
        Pixel::from(&self.pixels[start..start + CHANNELS])
    }

    pub fn iter_pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.pixels.chunks_exact(CHANNELS).map(Pixel::from)
    }

    /// Per-pixel BT.709 luminance in row-major order.
    pub fn luminance_field(&self) -> LuminanceField {
        LuminanceField::new(
            self.width,
            self.iter_pixels().map(|pixel| pixel.luminance()).collect(),
        )
    }
}

impl TryFrom<image::RgbaImage> for RasterImage {
    type Error = RasterError;

    fn try_from(buffer: image::RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = buffer.dimensions();
        Self::new(width, height, buffer.into_raw())
    }
}
