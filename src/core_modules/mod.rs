pub mod adaptive;
pub mod basic_metrics;
pub mod distortion;
pub mod error;
pub mod gradient;
pub mod image_profile;
pub mod luminance;
pub mod pixel;
pub mod raster;
pub mod smart_pixel;
pub mod ssim;

/// Rounds to three decimal places the way the reference scores do: half-up,
/// toward positive infinity, rather than `f64::round`'s half-away-from-zero.
pub(crate) fn round_to_thousandths(value: f64) -> f64 {
    (value * 1000.0 + 0.5).floor() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::round_to_thousandths;

    #[test]
    fn rounds_half_up_toward_positive_infinity() {
        assert_eq!(round_to_thousandths(0.1234), 0.123);
        assert_eq!(round_to_thousandths(0.9996), 1.0);
        assert_eq!(round_to_thousandths(-0.0124), -0.012);
        assert_eq!(round_to_thousandths(-0.0126), -0.013);
    }
}
