//! Linear pan law.

/// Left/right channel gains for a pan position in [-1, 1].
///
/// Linear, not constant-power: center passes both channels at unity and
/// a hard pan silences the opposite channel.
pub fn pan_gains(pan: f64) -> (f64, f64) {
    let left = if pan <= 0.0 { 1.0 } else { 1.0 - pan };
    let right = if pan >= 0.0 { 1.0 } else { 1.0 + pan };
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_unity() {
        assert_eq!(pan_gains(0.0), (1.0, 1.0));
    }

    #[test]
    fn hard_right_silences_left() {
        assert_eq!(pan_gains(1.0), (0.0, 1.0));
    }

    #[test]
    fn hard_left_silences_right() {
        assert_eq!(pan_gains(-1.0), (1.0, 0.0));
    }

    #[test]
    fn partial_pan_is_linear() {
        assert_eq!(pan_gains(0.5), (0.5, 1.0));
        assert_eq!(pan_gains(-0.25), (1.0, 0.75));
        // Not constant-power: the sum drops linearly with |p|.
        let (l, r) = pan_gains(0.3);
        assert!((l + r - 1.7).abs() < 1e-12);
    }
}
