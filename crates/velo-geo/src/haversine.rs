//! Great-circle distance on a spherical Earth.

use crate::coordinate::Coordinate;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates, in kilometers.
///
/// ```
/// use velo_geo::{distance, Coordinate};
///
/// let nyc = Coordinate::new(40.7128, -74.0060);
/// let la = Coordinate::new(34.0522, -118.2437);
/// let km = distance(&nyc, &la);
/// assert!(km > 3935.0 && km < 3945.0);
/// ```
#[inline]
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let (lat1, lon1) = a.to_radians();
    let (lat2, lon2) = b.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push h past 1 for near-antipodal points
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Haversine distance in meters.
#[inline]
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    distance(a, b) * 1000.0
}

/// Sum of leg distances along an ordered path, in kilometers.
///
/// Paths with fewer than two points have zero length.
pub fn path_distance(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|leg| distance(&leg[0], &leg[1]))
        .sum()
}

/// Render a distance for display.
///
/// One kilometer and above prints as `"{km:.decimals} km"`; anything
/// shorter prints whole meters, e.g. `"500 m"`.
pub fn format_distance(km: f64, decimals: usize) -> String {
    if km >= 1.0 {
        format!("{:.*} km", decimals, km)
    } else {
        // JS Math.round semantics: halves round toward +inf
        let meters = (km * 1000.0 + 0.5).floor();
        format!("{} m", meters as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NYC: Coordinate = Coordinate::new(40.7128, -74.0060);
    const LA: Coordinate = Coordinate::new(34.0522, -118.2437);
    const PHILADELPHIA: Coordinate = Coordinate::new(39.9526, -75.1652);
    const WASHINGTON: Coordinate = Coordinate::new(38.9072, -77.0369);

    #[test]
    fn test_nyc_to_la() {
        let d = distance(&NYC, &LA);
        assert!(d > 3935.0 && d < 3945.0, "NYC-LA: {}", d);
    }

    #[test]
    fn test_same_point_is_zero() {
        assert!(distance(&NYC, &NYC) < 1e-9);
    }

    #[test]
    fn test_symmetry() {
        assert!((distance(&NYC, &LA) - distance(&LA, &NYC)).abs() < 1e-9);
    }

    #[test]
    fn test_meters() {
        let km = distance(&NYC, &PHILADELPHIA);
        assert!((distance_meters(&NYC, &PHILADELPHIA) - km * 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_path_distance_sums_legs() {
        let path = [NYC, PHILADELPHIA, WASHINGTON];
        let expected = distance(&NYC, &PHILADELPHIA) + distance(&PHILADELPHIA, &WASHINGTON);
        assert!((path_distance(&path) - expected).abs() < 1e-9);
        // East coast corridor is roughly 330 km along this path
        assert!(path_distance(&path) > 300.0 && path_distance(&path) < 350.0);
    }

    #[test]
    fn test_path_distance_short_paths() {
        assert_eq!(path_distance(&[]), 0.0);
        assert_eq!(path_distance(&[NYC]), 0.0);
    }

    #[test]
    fn test_format_distance_meters() {
        assert_eq!(format_distance(0.5, 2), "500 m");
        assert_eq!(format_distance(0.0, 2), "0 m");
        assert_eq!(format_distance(0.0124, 2), "12 m");
        assert_eq!(format_distance(0.9994, 2), "999 m");
    }

    #[test]
    fn test_format_distance_kilometers() {
        assert_eq!(format_distance(1.0, 2), "1.00 km");
        assert_eq!(format_distance(2.345, 1), "2.3 km");
        assert_eq!(format_distance(12.0, 0), "12 km");
    }
}
