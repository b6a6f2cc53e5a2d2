//! Heat index derivation.
//!
//! Apparent temperature combining air temperature and relative humidity,
//! using the Steadman/NWS regression over Fahrenheit-converted inputs and
//! converted back to Celsius.

use crate::util::round2;

/// Compute the heat index in Celsius, rounded to two decimals.
///
/// Returns `0.0` when either input is zero or non-finite; a station that
/// has not reported temperature or humidity yet gets a neutral heat index
/// rather than a bogus extrapolation.
pub fn heat_index(temperature_c: f64, relative_humidity: f64) -> f64 {
    if !temperature_c.is_finite() || !relative_humidity.is_finite() {
        return 0.0;
    }
    if temperature_c == 0.0 || relative_humidity == 0.0 {
        return 0.0;
    }

    let t = temperature_c * 9.0 / 5.0 + 32.0;
    let rh = relative_humidity;

    let hi_f = -42.379 + 2.04901523 * t + 10.14333127 * rh
        - 0.22475541 * t * rh
        - 0.00683783 * t * t
        - 0.05481717 * rh * rh
        + 0.00122874 * t * t * rh
        + 0.00085282 * t * rh * rh
        - 0.00000199 * t * t * rh * rh;

    let hi_c = (hi_f - 32.0) * 5.0 / 9.0;
    if hi_c.is_finite() {
        round2(hi_c)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_inputs_return_zero() {
        assert_eq!(heat_index(0.0, 70.0), 0.0);
        assert_eq!(heat_index(31.0, 0.0), 0.0);
        assert_eq!(heat_index(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_non_finite_inputs_return_zero() {
        assert_eq!(heat_index(f64::NAN, 70.0), 0.0);
        assert_eq!(heat_index(31.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_reference_value() {
        // Steadman regression at 31C / 70% RH
        assert_eq!(heat_index(31.0, 70.0), 37.60);
    }

    #[test]
    fn test_typical_tropical_afternoon() {
        assert_eq!(heat_index(32.0, 65.0), 38.66);
    }

    #[test]
    fn test_result_is_rounded_to_two_decimals() {
        let hi = heat_index(29.3, 77.7);
        assert_eq!(hi, (hi * 100.0).round() / 100.0);
    }
}
