//! Geographic points and the named reference set storms are measured against

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{MonitorError, Result};

/// Latitude/longitude in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in decimal degrees, -90..=90
    pub latitude: f64,
    /// Longitude in decimal degrees, -180..=180
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point, rejecting coordinates outside the valid ranges
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(MonitorError::validation(format!(
                "latitude {latitude} outside -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(MonitorError::validation(format!(
                "longitude {longitude} outside -180..=180"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse the CWA `"lon,lat"` coordinate string.
    ///
    /// A malformed string is an error; callers drop the fix instead of
    /// substituting a zero coordinate.
    pub fn parse_lon_lat(text: &str) -> Result<Self> {
        let mut parts = text.split(',').map(str::trim);
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(MonitorError::parse(format!(
                "expected \"lon,lat\", got {text:?}"
            )));
        };
        let lon: f64 = lon
            .parse()
            .map_err(|_| MonitorError::parse(format!("bad longitude in {text:?}")))?;
        let lat: f64 = lat
            .parse()
            .map_err(|_| MonitorError::parse(format!("bad latitude in {text:?}")))?;
        Self::new(lat, lon).map_err(|e| MonitorError::parse(e.to_string()))
    }

    /// Format point as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A named point such as a city or a facility
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReferencePoint {
    pub name: String,
    pub position: GeoPoint,
}

impl ReferencePoint {
    #[must_use]
    pub fn new(name: impl Into<String>, position: GeoPoint) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Set of reference points with unique names. Iteration order carries no meaning.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ReferenceSet {
    points: Vec<ReferencePoint>,
}

impl ReferenceSet {
    /// Build a set, rejecting duplicate names
    pub fn new(points: Vec<ReferencePoint>) -> Result<Self> {
        let mut seen = HashSet::new();
        for point in &points {
            if !seen.insert(point.name.as_str()) {
                return Err(MonitorError::validation(format!(
                    "duplicate reference point name: {}",
                    point.name
                )));
            }
        }
        Ok(Self { points })
    }

    /// Set holding a single point
    #[must_use]
    pub fn single(point: ReferencePoint) -> Self {
        Self {
            points: vec![point],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferencePoint> {
        self.points.iter()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ReferencePoint> {
        self.points.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_rejects_out_of_range() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(90.1, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
    }

    #[test]
    fn test_parse_lon_lat() {
        let point = GeoPoint::parse_lon_lat("121.5,25.0").unwrap();
        assert_eq!(point.latitude, 25.0);
        assert_eq!(point.longitude, 121.5);

        let spaced = GeoPoint::parse_lon_lat(" 118.3 , 24.4 ").unwrap();
        assert_eq!(spaced.latitude, 24.4);
    }

    #[test]
    fn test_parse_lon_lat_malformed() {
        for text in ["", "121.5", "121.5,abc", "1,2,3", "121.5,95.0"] {
            let err = GeoPoint::parse_lon_lat(text).unwrap_err();
            assert!(matches!(err, MonitorError::Parse { .. }), "{text:?}");
        }
    }

    #[test]
    fn test_reference_set_unique_names() {
        let p = GeoPoint::new(23.0, 120.2).unwrap();
        let result = ReferenceSet::new(vec![
            ReferencePoint::new("台南", p),
            ReferencePoint::new("台南", p),
        ]);
        assert!(result.is_err());

        let set = ReferenceSet::new(vec![ReferencePoint::new("台南", p)]).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.get("台南").is_some());
        assert!(set.get("金門").is_none());
    }
}
