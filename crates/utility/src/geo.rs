/// Mean earth radius, as used by PostGIS for spherical geography math.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

pub fn is_valid_latitude(latitude: f64) -> bool {
    latitude.is_finite() && (-90.0..=90.0).contains(&latitude)
}

pub fn is_valid_longitude(longitude: f64) -> bool {
    longitude.is_finite() && (-180.0..=180.0).contains(&longitude)
}

/// Great-circle distance between two points in meters.
pub fn haversine_distance_m(
    latitude_1: f64,
    longitude_1: f64,
    latitude_2: f64,
    longitude_2: f64,
) -> f64 {
    let lat1_rad = latitude_1.to_radians();
    let lat2_rad = latitude_2.to_radians();

    let dlat = lat2_rad - lat1_rad;
    let dlon = (longitude_2 - longitude_1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}
