//! Great-circle distance and the bounding-box prefilter for radius searches.

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Statute miles per degree of latitude, rounded down.
pub const MILES_PER_DEGREE: f64 = 69.0;

/// Overshoot applied to both box deltas. Must stay above 1.0: the longitude
/// extent of a radius disk grows toward the pole, and rows outside the box
/// never reach the exact distance check.
pub const BOX_MARGIN: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance between two points, in statute miles.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Axis-aligned latitude/longitude box guaranteed to contain every point
/// within the search radius of its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn around(center: GeoPoint, radius_miles: f64) -> Self {
        let lat_delta = radius_miles / MILES_PER_DEGREE * BOX_MARGIN;
        let reaches_pole =
            center.latitude + lat_delta >= 90.0 || center.latitude - lat_delta <= -90.0;
        let min_lat = (center.latitude - lat_delta).max(-90.0);
        let max_lat = (center.latitude + lat_delta).min(90.0);

        let cos_lat = center.latitude.to_radians().cos();
        // A disk over the pole covers every meridian.
        let (min_lon, max_lon) = if reaches_pole {
            (-180.0, 180.0)
        } else {
            let lon_delta = radius_miles / (MILES_PER_DEGREE * cos_lat.abs()) * BOX_MARGIN;
            let (lo, hi) = (center.longitude - lon_delta, center.longitude + lon_delta);
            // A box that wraps the antimeridian cannot be expressed as one
            // BETWEEN range; widen to the full circle instead.
            if lon_delta >= 180.0 || lo < -180.0 || hi > 180.0 {
                (-180.0, 180.0)
            } else {
                (lo, hi)
            }
        };

        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}

/// Keeps the items within `radius_miles` of `center` and orders them nearest
/// first. Equal distances keep their input order.
pub fn rank_by_distance<T>(
    center: GeoPoint,
    radius_miles: f64,
    items: impl IntoIterator<Item = (T, GeoPoint)>,
) -> Vec<(T, f64)> {
    let mut ranked: Vec<(T, f64)> = items
        .into_iter()
        .map(|(item, point)| (item, haversine_miles(center, point)))
        .filter(|(_, distance)| *distance <= radius_miles)
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CHATHAM: GeoPoint = GeoPoint::new(41.6885, -69.9511);

    #[test]
    fn test_haversine_known_distance() {
        // Boston to New York is roughly 190 statute miles.
        let boston = GeoPoint::new(42.3601, -71.0589);
        let new_york = GeoPoint::new(40.7128, -74.0060);
        let d = haversine_miles(boston, new_york);
        assert!((d - 190.0).abs() < 3.0, "got {d}");
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        assert_eq!(haversine_miles(CHATHAM, CHATHAM), 0.0);
    }

    #[test]
    fn test_box_contains_center() {
        let bbox = BoundingBox::around(CHATHAM, 50.0);
        assert!(bbox.contains(CHATHAM));
        assert!(bbox.min_lat < CHATHAM.latitude && CHATHAM.latitude < bbox.max_lat);
    }

    #[test]
    fn test_box_applies_margin() {
        let bbox = BoundingBox::around(GeoPoint::new(0.0, 0.0), 69.0);
        assert!((bbox.max_lat - 1.5).abs() < 1e-9);
        assert!((bbox.max_lon - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_box_at_pole_spans_all_longitudes() {
        let bbox = BoundingBox::around(GeoPoint::new(90.0, 10.0), 20.0);
        assert_eq!((bbox.min_lon, bbox.max_lon), (-180.0, 180.0));
        assert_eq!(bbox.max_lat, 90.0);
    }

    #[test]
    fn test_box_reaching_pole_spans_all_longitudes() {
        let center = GeoPoint::new(87.5, 0.0);
        let across_pole = GeoPoint::new(89.9, 150.0);
        let distance = haversine_miles(center, across_pole);
        assert!((distance - 178.8).abs() < 0.5, "got {distance}");

        let bbox = BoundingBox::around(center, 200.0);
        assert_eq!((bbox.min_lon, bbox.max_lon), (-180.0, 180.0));
        assert!(bbox.contains(across_pole));

        let south = BoundingBox::around(GeoPoint::new(-87.5, 0.0), 200.0);
        assert!(south.contains(GeoPoint::new(-89.9, -150.0)));
    }

    #[test]
    fn test_box_across_antimeridian_widens() {
        let bbox = BoundingBox::around(GeoPoint::new(52.0, 179.5), 50.0);
        assert_eq!((bbox.min_lon, bbox.max_lon), (-180.0, 180.0));
    }

    #[test]
    fn test_rank_filters_and_sorts() {
        let near = GeoPoint::new(41.6885, -69.8911);
        let far = GeoPoint::new(42.28, -69.95);
        let outside = GeoPoint::new(40.0, -69.0);
        let ranked = rank_by_distance(
            CHATHAM,
            50.0,
            [("far", far), ("outside", outside), ("near", near)],
        );
        let names: Vec<_> = ranked.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["near", "far"]);
        assert!((ranked[0].1 - 3.1).abs() < 0.1);
    }

    #[test]
    fn test_rank_keeps_input_order_on_ties() {
        let p = GeoPoint::new(41.7, -69.9);
        let ranked = rank_by_distance(CHATHAM, 50.0, [("a", p), ("b", p), ("c", p)]);
        let names: Vec<_> = ranked.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    proptest! {
        #[test]
        fn prop_haversine_is_symmetric(
            lat1 in -89.0f64..89.0, lon1 in -179.0f64..179.0,
            lat2 in -89.0f64..89.0, lon2 in -179.0f64..179.0,
        ) {
            let a = GeoPoint::new(lat1, lon1);
            let b = GeoPoint::new(lat2, lon2);
            prop_assert!((haversine_miles(a, b) - haversine_miles(b, a)).abs() < 1e-6);
        }

        /// Every point inside the radius disk falls inside the prefilter box.
        #[test]
        fn prop_box_covers_radius_disk(
            lat in -89.9f64..89.9,
            lon in -170.0f64..170.0,
            radius in 1.0f64..200.0,
            bearing in 0.0f64..360.0,
            fraction in 0.0f64..1.0,
        ) {
            let center = GeoPoint::new(lat, lon);
            let target = destination(center, bearing, radius * fraction);
            let bbox = BoundingBox::around(center, radius);
            prop_assert!(bbox.contains(target), "{target:?} outside {bbox:?}");
        }

        #[test]
        fn prop_rank_is_sorted_and_bounded(
            points in proptest::collection::vec((40.0f64..43.0, -72.0f64..-68.0), 0..40),
            radius in 0.0f64..150.0,
        ) {
            let items = points.iter().enumerate().map(|(i, (la, lo))| (i, GeoPoint::new(*la, *lo)));
            let ranked = rank_by_distance(CHATHAM, radius, items);
            prop_assert!(ranked.iter().all(|(_, d)| *d <= radius));
            prop_assert!(ranked.windows(2).all(|w| w[0].1 <= w[1].1));
        }
    }

    /// Point reached by travelling `distance` miles from `start` on `bearing` degrees.
    fn destination(start: GeoPoint, bearing: f64, distance: f64) -> GeoPoint {
        let delta = distance / EARTH_RADIUS_MILES;
        let theta = bearing.to_radians();
        let lat1 = start.latitude.to_radians();
        let lon1 = start.longitude.to_radians();
        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
        let lon = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
        GeoPoint::new(lat2.to_degrees(), lon)
    }
}
