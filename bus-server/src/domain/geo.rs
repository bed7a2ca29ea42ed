//! Geographic coordinates.

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 latitude/longitude pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other` in kilometers (haversine formula).
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_to_self() {
        let p = Coordinates::new(11.5564, 104.9282);
        assert!(p.distance_km(&p).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(1.0, 0.0);
        // 2πR / 360
        assert!((a.distance_km(&b) - 111.195).abs() < 0.01);
    }

    #[test]
    fn symmetric() {
        let central_market = Coordinates::new(11.5697, 104.9210);
        let wat_phnom = Coordinates::new(11.5762, 104.9231);
        let there = central_market.distance_km(&wat_phnom);
        let back = wat_phnom.distance_km(&central_market);
        assert!((there - back).abs() < 1e-12);
        assert!(there > 0.5 && there < 1.0);
    }
}
