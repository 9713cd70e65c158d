const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// Great-circle distance in meters (haversine).
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Whether a point lies inside a circular geofence.
pub fn within_radius(
    latitude: f64,
    longitude: f64,
    center_latitude: f64,
    center_longitude: f64,
    radius_meters: f64,
) -> bool {
    distance_meters(latitude, longitude, center_latitude, center_longitude) <= radius_meters
}

#[cfg(test)]
mod tests {
    use super::*;

    // Monas and Bundaran HI, Jakarta: roughly 2.3 km apart.
    const MONAS: (f64, f64) = (-6.175392, 106.827153);
    const BUNDARAN_HI: (f64, f64) = (-6.194967, 106.823089);

    #[test]
    fn zero_distance_for_same_point() {
        assert!(distance_meters(MONAS.0, MONAS.1, MONAS.0, MONAS.1) < 1e-6);
    }

    #[test]
    fn known_distance_is_close() {
        let d = distance_meters(MONAS.0, MONAS.1, BUNDARAN_HI.0, BUNDARAN_HI.1);
        assert!((2_100.0..2_400.0).contains(&d), "got {d}");
    }

    #[test]
    fn geofence() {
        assert!(within_radius(-6.175400, 106.827160, MONAS.0, MONAS.1, 100.0));
        assert!(!within_radius(BUNDARAN_HI.0, BUNDARAN_HI.1, MONAS.0, MONAS.1, 500.0));
    }

    #[test]
    fn coordinate_bounds() {
        assert!(valid_coordinates(-6.2, 106.8));
        assert!(!valid_coordinates(91.0, 0.0));
        assert!(!valid_coordinates(0.0, f64::NAN));
    }
}
