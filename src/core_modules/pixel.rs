// THEORY (Single Pixel Samples):
// The `Pixel` module is the most fundamental unit of the metrics engine. It is a
// "dumb" data container for a single RGBA pixel plus the one heuristic every
// structural metric is built on: its perceptual luminance. Anything that needs a
// second pixel (error terms, channel deltas) belongs in `SmartPixel`, and anything
// that needs neighbors (gradients) belongs in the `LuminanceField`.
//
// Luminance here uses the ITU-R BT.709 weights (0.2126, 0.7152, 0.0722) applied
// directly to the gamma-encoded 0..255 bytes. No linearization is performed and
// alpha never contributes. The value is returned as f64 so that sums over
// millions of pixels stay stable.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Luminance = f64;

    pub const CHANNELS: usize = 4;

    const RED_WEIGHT: Luminance = 0.2126;
    const GREEN_WEIGHT: Luminance = 0.7152;
    const BLUE_WEIGHT: Luminance = 0.0722;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Perceived brightness (BT.709 weights over raw 0..255 channels).
        pub fn luminance(&self) -> Luminance {
            RED_WEIGHT * self.red as Luminance
                + GREEN_WEIGHT * self.green as Luminance
                + BLUE_WEIGHT * self.blue as Luminance
        }

        pub fn channels(&self) -> [Channel; CHANNELS] {
            [self.red, self.green, self.blue, self.alpha]
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }
}
