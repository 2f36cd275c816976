use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance from the park centre beyond which a visitor counts as "far away".
pub const FAR_FROM_PARK_METERS: f64 = 1_000.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeoError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("bounds are inverted: minimum corner lies north or east of the maximum")]
    InvertedBounds,
}

/// A WGS84 position. Fields are private so a constructed point always satisfies
/// the coordinate range invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

#[derive(Serialize, Deserialize)]
struct RawPoint {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.lat, raw.lon)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(point: GeoPoint) -> Self {
        RawPoint {
            lat: point.lat,
            lon: point.lon,
        }
    }
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeoError> {
        // NaN fails both range checks
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(GeoError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Builds a point from a GeoJSON `[lon, lat]` position.
    pub fn from_lon_lat(position: [f64; 2]) -> Result<Self, GeoError> {
        Self::new(position[1], position[0])
    }

    pub fn lat(self) -> f64 {
        self.lat
    }

    pub fn lon(self) -> f64 {
        self.lon
    }
}

/// Great-circle distance in meters using the haversine formula.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();

    let sin_dphi = (dphi / 2.0).sin();
    let sin_dlambda = (dlambda / 2.0).sin();

    let h = sin_dphi * sin_dphi + phi1.cos() * phi2.cos() * sin_dlambda * sin_dlambda;
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Axis-aligned park rectangle. Built through [`ParkBounds::new`] or
/// deserialization, both of which check every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds", into = "RawBounds")]
pub struct ParkBounds {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

#[derive(Serialize, Deserialize)]
struct RawBounds {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl TryFrom<RawBounds> for ParkBounds {
    type Error = GeoError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        ParkBounds::new(raw.min_lat, raw.max_lat, raw.min_lon, raw.max_lon)
    }
}

impl From<ParkBounds> for RawBounds {
    fn from(bounds: ParkBounds) -> Self {
        RawBounds {
            min_lat: bounds.min_lat,
            max_lat: bounds.max_lat,
            min_lon: bounds.min_lon,
            max_lon: bounds.max_lon,
        }
    }
}

/// Pasir Ris Park, the only park currently served.
pub const PASIR_RIS_PARK: ParkBounds = ParkBounds {
    min_lat: 1.3690,
    max_lat: 1.3890,
    min_lon: 103.9430,
    max_lon: 103.9590,
};

impl ParkBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self, GeoError> {
        let south_west = GeoPoint::new(min_lat, min_lon)?;
        let north_east = GeoPoint::new(max_lat, max_lon)?;
        if south_west.lat > north_east.lat || south_west.lon > north_east.lon {
            return Err(GeoError::InvertedBounds);
        }
        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// Inclusive on every edge.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }

    /// Midpoint of both axes; in range because both corners are.
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lat: (self.min_lat + self.max_lat) / 2.0,
            lon: (self.min_lon + self.max_lon) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FarFromPark {
    pub is_far: bool,
    pub distance_meters: f64,
}

/// Distance gate used to prompt visitors who are not yet at the park.
///
/// Outside the bounds the distance is measured to the bounds' centre, not the
/// nearest edge, so a visitor just past a corner already reads a few hundred
/// meters.
pub fn is_far_from_park(user: GeoPoint, bounds: &ParkBounds) -> FarFromPark {
    if bounds.contains(user) {
        return FarFromPark {
            is_far: false,
            distance_meters: 0.0,
        };
    }

    let distance = distance_meters(user, bounds.center());
    FarFromPark {
        is_far: distance > FAR_FROM_PARK_METERS,
        distance_meters: distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(
            GeoPoint::new(91.0, 0.0),
            Err(GeoError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            GeoPoint::new(0.0, -180.5),
            Err(GeoError::LongitudeOutOfRange(-180.5))
        );
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn deserialize_validates_range() {
        let ok: GeoPoint = serde_json::from_str(r#"{"lat": 1.379, "lon": 103.951}"#).unwrap();
        assert_eq!(ok, point(1.379, 103.951));
        assert!(serde_json::from_str::<GeoPoint>(r#"{"lat": 120.0, "lon": 0.0}"#).is_err());
    }

    #[test]
    fn from_lon_lat_swaps_axes() {
        let p = GeoPoint::from_lon_lat([103.951, 1.379]).unwrap();
        assert_eq!(p.lat(), 1.379);
        assert_eq!(p.lon(), 103.951);
    }

    #[test]
    fn test_distance_same_point() {
        let p = point(1.3790, 103.9510);
        assert_eq!(distance_meters(p, p), 0.0);
    }

    #[test]
    fn test_distance_1km_north() {
        let dist = distance_meters(point(1.0, 103.0), point(1.009, 103.0));
        assert!((dist - 1000.0).abs() < 10.0);
    }

    #[test]
    fn test_distance_known_city_pair() {
        // Paris to London, ~343 km
        let dist = distance_meters(point(48.8566, 2.3522), point(51.5074, -0.1278));
        assert!((dist - 343_000.0).abs() < 5_000.0);
    }

    #[test]
    fn inside_park_is_never_far() {
        let result = is_far_from_park(point(1.3790, 103.9510), &PASIR_RIS_PARK);
        assert_eq!(
            result,
            FarFromPark {
                is_far: false,
                distance_meters: 0.0
            }
        );
    }

    #[test]
    fn park_edges_are_inclusive() {
        let corner = point(PASIR_RIS_PARK.min_lat, PASIR_RIS_PARK.max_lon);
        assert_eq!(is_far_from_park(corner, &PASIR_RIS_PARK).distance_meters, 0.0);
    }

    #[test]
    fn bounds_reject_bad_corners() {
        assert_eq!(
            ParkBounds::new(1.3690, 95.0, 103.9430, 103.9590),
            Err(GeoError::LatitudeOutOfRange(95.0))
        );
        assert_eq!(
            ParkBounds::new(1.3890, 1.3690, 103.9430, 103.9590),
            Err(GeoError::InvertedBounds)
        );
        let bounds = ParkBounds::new(1.3690, 1.3890, 103.9430, 103.9590).unwrap();
        assert_eq!(bounds, PASIR_RIS_PARK);
    }

    #[test]
    fn deserialized_bounds_are_validated() {
        let ok: ParkBounds = serde_json::from_str(
            r#"{"min_lat": 1.369, "max_lat": 1.389, "min_lon": 103.943, "max_lon": 103.959}"#,
        )
        .unwrap();
        assert!(ok.contains(ok.center()));

        let bad = serde_json::from_str::<ParkBounds>(
            r#"{"min_lat": -100.0, "max_lat": 400.0, "min_lon": 0.0, "max_lon": 1.0}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn just_outside_park_measures_to_center() {
        // Slightly north of the park: ~1.1 km from the centre but within 1 km of the edge
        let user = point(1.3891, 103.9510);
        let result = is_far_from_park(user, &PASIR_RIS_PARK);
        assert!(result.distance_meters > 1_000.0);
        assert!(result.is_far);
    }

    #[test]
    fn far_away_user_is_flagged() {
        // Orchard Road
        let result = is_far_from_park(point(1.3048, 103.8318), &PASIR_RIS_PARK);
        assert!(result.is_far);
        assert!(result.distance_meters > 10_000.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        // Greater Singapore
        fn metro_point() -> impl Strategy<Value = GeoPoint> {
            (1.20..1.48, 103.60..104.05).prop_map(|(lat, lon)| point(lat, lon))
        }

        proptest! {
            #[test]
            fn prop_distance_symmetric(a in metro_point(), b in metro_point()) {
                prop_assert!((distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-9);
            }

            #[test]
            fn prop_distance_same_point_is_zero(a in metro_point()) {
                prop_assert_eq!(distance_meters(a, a), 0.0);
            }

            #[test]
            fn prop_distance_non_negative(a in metro_point(), b in metro_point()) {
                prop_assert!(distance_meters(a, b) >= 0.0);
            }

            #[test]
            fn prop_colinear_points_add_up(
                start in metro_point(),
                dlat in -0.01..0.01f64,
                dlon in -0.01..0.01f64,
                t in 0.0..1.0f64,
            ) {
                let end = point(start.lat() + dlat, start.lon() + dlon);
                let mid = point(start.lat() + dlat * t, start.lon() + dlon * t);
                let direct = distance_meters(start, end);
                let via = distance_meters(start, mid) + distance_meters(mid, end);
                // Flat-earth regime: a ~1.5 km segment bends by well under a meter
                prop_assert!((direct - via).abs() < 0.5);
            }

            #[test]
            fn prop_points_inside_bounds_are_not_far(
                lat in PASIR_RIS_PARK.min_lat..=PASIR_RIS_PARK.max_lat,
                lon in PASIR_RIS_PARK.min_lon..=PASIR_RIS_PARK.max_lon,
            ) {
                let result = is_far_from_park(point(lat, lon), &PASIR_RIS_PARK);
                prop_assert!(!result.is_far);
                prop_assert_eq!(result.distance_meters, 0.0);
            }
        }
    }
}
