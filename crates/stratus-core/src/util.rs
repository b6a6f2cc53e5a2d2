//! Small shared helpers.

/// Round to two decimal places, the precision used for all derived metrics.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005), 1.0); // 1.005 is actually 1.00499.. in binary
        assert_eq!(round2(32.004), 32.0);
        assert_eq!(round2(32.005001), 32.01);
        assert_eq!(round2(-1.2349), -1.23);
    }
}
