//! Rounding of statistics for plot legends

/// Round a value up for display
///
/// Magnitudes below one are rounded up at their first significant digit
/// (`0.12345 -> 0.13`); magnitudes of one or more are rounded up to two
/// decimals (`3.14159 -> 3.15`). Rounding is a ceiling, so negative values
/// move toward zero (`-0.0042 -> -0.0041`). Zero and non-finite values are
/// returned unchanged.
pub fn round_value(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }

    let mut value = value;
    if value.abs() < 1.0 {
        let mut scale = 1.0_f64;
        while value.abs() < 10.0 {
            value *= 10.0;
            scale *= 10.0;
        }
        value = value.ceil() / scale;
    }
    if value.abs() >= 1.0 {
        value = (value * 100.0).ceil() / 100.0;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_small_values_round_up_at_first_significant_digit() {
        assert!(close(round_value(0.12345), 0.13));
        assert!(close(round_value(0.0042), 0.0042));
        assert!(close(round_value(0.003), 0.003));
    }

    #[test]
    fn test_large_values_round_up_to_two_decimals() {
        assert!(close(round_value(3.14159), 3.15));
        assert!(close(round_value(12.3456), 12.35));
        assert!(close(round_value(1.0), 1.0));
    }

    #[test]
    fn test_value_just_below_one_carries_into_second_rule() {
        assert!(close(round_value(0.999), 1.0));
    }

    #[test]
    fn test_negative_values_use_ceiling() {
        assert!(close(round_value(-0.7), -0.7));
        assert!(close(round_value(-0.0042), -0.0041));
        assert!(close(round_value(-2.555), -2.55));
    }

    #[test]
    fn test_zero_and_non_finite_pass_through() {
        assert_eq!(round_value(0.0), 0.0);
        assert!(round_value(f64::NAN).is_nan());
        assert_eq!(round_value(f64::INFINITY), f64::INFINITY);
    }
}
