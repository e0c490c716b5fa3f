// THEORY:
// An `ImageProfile` is a one-image summary shown next to each uploaded image
// before any comparison runs. It is descriptive only; none of these values feed
// the comparison metrics.
//
// From the luminance field it derives brightness (mean), contrast (mean absolute
// deviation) and a noise bucket (from the standard deviation). From the raster
// size and the encoded file size it derives megapixels, a bytes-per-megapixel
// "quality" bucket and a contrast-times-megapixels "clarity" bucket.

use crate::core_modules::raster::RasterImage;
use serde::{Deserialize, Serialize};

const NOISE_HIGH_STD: f64 = 60.0;
const NOISE_MEDIUM_STD: f64 = 30.0;
const QUALITY_LOW_BYTES_PER_MP: f64 = 100.0;
const QUALITY_MEDIUM_BYTES_PER_MP: f64 = 300.0;
const CLARITY_HIGH: f64 = 300.0;
const CLARITY_MEDIUM: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

/// Descriptive statistics of a single loaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProfile {
    pub name: String,
    pub media_type: String,
    /// Encoded file size in KiB, rounded.
    pub size_kb: u64,
    pub width: u32,
    pub height: u32,
    /// Mean luminance, rounded.
    pub brightness: i64,
    /// Mean absolute luminance deviation, rounded.
    pub contrast: i64,
    /// Megapixels rounded to one decimal.
    pub megapixels: f64,
    pub quality: Level,
    pub noise: Level,
    pub clarity: Level,
}

impl ImageProfile {
    pub fn analyze(name: &str, media_type: &str, size_bytes: u64, raster: &RasterImage) -> Self {
        let field = raster.luminance_field();
        let values = field.values();
        let count = values.len() as f64;

        let mean = field.mean();
        let contrast = values.iter().map(|l| (l - mean).abs()).sum::<f64>() / count;
        let std_dev = field.variance(mean).sqrt();

        let megapixels = count / 1_000_000.0;
        let bytes_per_megapixel = size_bytes as f64 / megapixels;
        let clarity_score = contrast * megapixels;

        Self {
            name: name.to_string(),
            media_type: media_type.to_string(),
            size_kb: (size_bytes as f64 / 1024.0).round() as u64,
            width: raster.width(),
            height: raster.height(),
            brightness: mean.round() as i64,
            contrast: contrast.round() as i64,
            megapixels: (megapixels * 10.0).round() / 10.0,
            quality: if bytes_per_megapixel < QUALITY_LOW_BYTES_PER_MP {
                Level::Low
            } else if bytes_per_megapixel < QUALITY_MEDIUM_BYTES_PER_MP {
                Level::Medium
            } else {
                Level::High
            },
            noise: if std_dev > NOISE_HIGH_STD {
                Level::High
            } else if std_dev > NOISE_MEDIUM_STD {
                Level::Medium
            } else {
                Level::Low
            },
            clarity: if clarity_score > CLARITY_HIGH {
                Level::High
            } else if clarity_score > CLARITY_MEDIUM {
                Level::Medium
            } else {
                Level::Low
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_gray_image() {
        let raster = RasterImage::filled(10, 10, [128, 128, 128, 255]).unwrap();
        let profile = ImageProfile::analyze("gray.png", "image/png", 2048, &raster);
        assert_eq!(profile.brightness, 128);
        assert_eq!(profile.contrast, 0);
        assert_eq!(profile.noise, Level::Low);
        assert_eq!(profile.clarity, Level::Low);
        assert_eq!(profile.size_kb, 2);
        assert_eq!(profile.megapixels, 0.0);
        assert_eq!(profile.quality, Level::High);
    }

    #[test]
    fn checkerboard_is_noisy() {
        let mut pixels = Vec::new();
        for i in 0..64u32 {
            let value = if (i % 8 + i / 8) % 2 == 0 { 0 } else { 250 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
        let raster = RasterImage::new(8, 8, pixels).unwrap();
        let profile = ImageProfile::analyze("board.bmp", "image/bmp", 10, &raster);
        assert_eq!(profile.brightness, 125);
        assert_eq!(profile.contrast, 125);
        assert_eq!(profile.noise, Level::High);
    }

    #[test]
    fn tiny_file_for_many_pixels_is_low_quality() {
        let raster = RasterImage::filled(1000, 1000, [0, 0, 0, 255]).unwrap();
        let profile = ImageProfile::analyze("big.jpg", "image/jpeg", 50, &raster);
        assert_eq!(profile.megapixels, 1.0);
        assert_eq!(profile.quality, Level::Low);
    }
}
