// THEORY:
// The `SmartPixel` module provides the pairwise comparison capabilities for the
// engine. It follows the "separation of concerns" principle by acting as a
// "smart" wrapper around two "dumb" `Pixel` objects taken from the same position
// in the two images under comparison. Its entire purpose is to quantify how far
// apart those two pixels are.
//
// It offers two deliberately different "lenses":
// - `squared_error`: summed over all four channels, alpha included. This is the
//   per-pixel term of MSE.
// - `mean_rgb_delta`: mean absolute difference of R, G and B only. This is the
//   per-pixel term of the distortion classifier.
// The asymmetry (alpha in one, not the other) is part of the reference numbers.

pub mod smart_pixel {
    use crate::core_modules::pixel::pixel::*;

    pub type SquaredError = u32;
    pub type ChannelDelta = f64;

    /// Two co-located pixels, one from each image.
    #[derive(Debug, Clone, Copy)]
    pub struct SmartPixel {
        pub first: Pixel,
        pub second: Pixel,
    }

    impl SmartPixel {
        pub fn new(first: Pixel, second: Pixel) -> Self {
            Self { first, second }
        }

        /// Sum of squared byte differences across R, G, B and A.
        pub fn squared_error(&self) -> SquaredError {
            self.first
                .channels()
                .iter()
                .zip(self.second.channels().iter())
                .map(|(&a, &b)| {
                    let diff = a.abs_diff(b) as SquaredError;
                    diff * diff
                })
                .sum()
        }

        /// Mean absolute difference over R, G and B; alpha is excluded.
        pub fn mean_rgb_delta(&self) -> ChannelDelta {
            let delta = self.first.red.abs_diff(self.second.red) as u16
                + self.first.green.abs_diff(self.second.green) as u16
                + self.first.blue.abs_diff(self.second.blue) as u16;
            delta as ChannelDelta / 3.0
        }
    }
}
