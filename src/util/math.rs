//! Numeric helpers shared by the resize and search paths.

/// Scales a pixel length and rounds to the nearest integer.
///
/// Returns `None` when the result is non-positive or not finite.
pub fn scaled_len(len: usize, scale: f32) -> Option<usize> {
    let value = (len as f64 * scale as f64).round();
    if !value.is_finite() || value < 1.0 || value > usize::MAX as f64 {
        return None;
    }
    Some(value as usize)
}

/// Rounds and clamps an interpolated sample to the `u8` range.
#[inline]
pub(crate) fn round_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::{round_u8, scaled_len};

    #[test]
    fn scaled_len_rounds_to_nearest() {
        assert_eq!(scaled_len(50, 1.2), Some(60));
        assert_eq!(scaled_len(10, 0.25), Some(3));
        assert_eq!(scaled_len(3, 0.1), None);
        assert_eq!(scaled_len(8, f32::NAN), None);
    }

    #[test]
    fn round_u8_saturates() {
        assert_eq!(round_u8(-3.0), 0);
        assert_eq!(round_u8(254.6), 255);
        assert_eq!(round_u8(300.0), 255);
    }
}
