use chrono::{DateTime, SecondsFormat, Utc};
use urbanpulse_schemas::camera::{CameraMeta, CameraSelection};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in metres between two WGS84 coordinates.
pub fn haversine_m(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// The set of known traffic cameras a map click can resolve to.
#[derive(Debug, Clone, Default)]
pub struct CameraCatalog {
    cameras: Vec<CameraMeta>,
}

impl CameraCatalog {
    pub fn new(cameras: Vec<CameraMeta>) -> Self {
        Self { cameras }
    }

    pub fn cameras(&self) -> &[CameraMeta] {
        &self.cameras
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// The camera closest to `(lon, lat)` and its distance in metres.
    pub fn nearest(&self, lon: f64, lat: f64) -> Option<(&CameraMeta, f64)> {
        self.cameras
            .iter()
            .map(|c| (c, haversine_m(lon, lat, c.longitude, c.latitude)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Resolves a click to a selection record for the nearest camera.
    pub fn select_nearest(&self, lon: f64, lat: f64, at: DateTime<Utc>) -> Option<CameraSelection> {
        self.nearest(lon, lat).map(|(camera, _)| {
            CameraSelection::from_meta(camera, at.to_rfc3339_opts(SecondsFormat::Secs, true))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn camera(id: &str, lon: f64, lat: f64) -> CameraMeta {
        CameraMeta {
            camera_id: id.to_string(),
            latitude: lat,
            longitude: lon,
            image_link: format!("https://images.example/{}.jpg", id),
        }
    }

    #[test]
    fn haversine_is_zero_on_same_point_and_symmetric() {
        assert_eq!(haversine_m(103.85, 1.29, 103.85, 1.29), 0.0);
        let ab = haversine_m(103.85, 1.29, 103.86, 1.30);
        let ba = haversine_m(103.86, 1.30, 103.85, 1.29);
        assert!((ab - ba).abs() < 1e-6);
        // ~0.01 degrees of both axes near the equator is about 1.57 km.
        assert!((1_500.0..1_650.0).contains(&ab), "{}", ab);
    }

    #[test]
    fn nearest_picks_closest_camera() {
        let catalog = CameraCatalog::new(vec![
            camera("1001", 103.87, 1.30),
            camera("1701", 103.85, 1.29),
            camera("4703", 103.70, 1.34),
        ]);
        let (found, distance) = catalog.nearest(103.851, 1.291).unwrap();
        assert_eq!(found.camera_id, "1701");
        assert!(distance < 200.0);
    }

    #[test]
    fn selection_carries_camera_coordinates_and_timestamp() {
        let catalog = CameraCatalog::new(vec![camera("1701", 103.85, 1.29)]);
        let at = Utc.with_ymd_and_hms(2025, 11, 15, 3, 40, 51).unwrap();
        let selection = catalog.select_nearest(103.9, 1.3, at).unwrap();
        assert_eq!(selection.camera_id, "1701");
        assert_eq!(selection.longitude, 103.85);
        assert_eq!(selection.latitude, 1.29);
        assert_eq!(selection.timestamp, "2025-11-15T03:40:51Z");
    }

    #[test]
    fn empty_catalog_selects_nothing() {
        let catalog = CameraCatalog::default();
        assert!(catalog.is_empty());
        assert!(catalog.select_nearest(103.85, 1.29, Utc::now()).is_none());
    }
}
