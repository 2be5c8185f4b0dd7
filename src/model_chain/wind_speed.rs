/// Share of the obstacle height that displaces the wind profile.
pub const DISPLACEMENT_FACTOR: f64 = 0.7;
/// Hellman exponent used when the roughness length is unknown.
pub const DEFAULT_HELLMAN_EXPONENT: f64 = 1.0 / 7.0;

/// Wind speed at `hub_height` from a logarithmic wind profile.
///
/// `obstacle_height` shifts the profile by 0.7 times its value; the caller checks that the
/// shifted measurement and hub heights stay positive.
pub fn logarithmic_profile(
    wind_speed: f64,
    data_height: f64,
    hub_height: f64,
    roughness_length: f64,
    obstacle_height: f64,
) -> f64 {
    let d = DISPLACEMENT_FACTOR * obstacle_height;
    wind_speed * ((hub_height - d) / roughness_length).ln()
        / ((data_height - d) / roughness_length).ln()
}

/// Wind speed at `hub_height` from the Hellman power law.
///
/// Without an explicit `exponent` it is `1 / ln(hub_height / z0)` when the roughness is
/// known, else 1/7.
pub fn hellman(
    wind_speed: f64,
    data_height: f64,
    hub_height: f64,
    roughness_length: Option<f64>,
    exponent: Option<f64>,
) -> f64 {
    let exponent = exponent.unwrap_or_else(|| match roughness_length {
        Some(z0) => 1.0 / (hub_height / z0).ln(),
        None => DEFAULT_HELLMAN_EXPONENT,
    });
    wind_speed * (hub_height / data_height).powf(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logarithmic_matches_reference_values() {
        // 5 m/s at 10 m, hub at 100 m, z0 0.15 m.
        let v = logarithmic_profile(5.0, 10.0, 100.0, 0.15, 0.0);
        assert!((v - 7.7414).abs() < 1e-3, "v = {v}");

        let same = logarithmic_profile(5.0, 100.0, 100.0, 0.15, 0.0);
        assert!((same - 5.0).abs() < 1e-12);
    }

    #[test]
    fn obstacle_shifts_the_profile() {
        let plain = logarithmic_profile(5.0, 10.0, 100.0, 0.15, 0.0);
        let shifted = logarithmic_profile(5.0, 10.0, 100.0, 0.15, 10.0);
        assert!(shifted > plain);
    }

    #[test]
    fn hellman_exponents() {
        let default = hellman(5.0, 10.0, 100.0, None, None);
        assert!((default - 5.0 * 10f64.powf(1.0 / 7.0)).abs() < 1e-12);

        let with_z0 = hellman(5.0, 10.0, 100.0, Some(0.15), None);
        let expected = 5.0 * 10f64.powf(1.0 / (100.0f64 / 0.15).ln());
        assert!((with_z0 - expected).abs() < 1e-12);

        let fixed = hellman(5.0, 10.0, 100.0, Some(0.15), Some(0.2));
        assert!((fixed - 5.0 * 10f64.powf(0.2)).abs() < 1e-12);
    }

    #[test]
    fn nan_propagates() {
        assert!(logarithmic_profile(f64::NAN, 10.0, 100.0, 0.15, 0.0).is_nan());
        assert!(hellman(f64::NAN, 10.0, 100.0, None, None).is_nan());
    }
}
