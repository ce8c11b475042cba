//! Storm position samples, forecast tracks and the per-storm record

use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// One observed (lead time 0) or forecast (lead time > 0) storm sample
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StormFix {
    pub position: GeoPoint,
    /// Maximum sustained wind in m/s
    pub max_wind_speed_ms: f64,
    /// Hours ahead of the bulletin issuance time
    pub lead_time_hours: f64,
    /// Radius of the 15 m/s wind circle in km, when reported
    pub storm_circle_radius_km: Option<f64>,
}

impl StormFix {
    #[must_use]
    pub fn observed(position: GeoPoint, max_wind_speed_ms: f64) -> Self {
        Self {
            position,
            max_wind_speed_ms,
            lead_time_hours: 0.0,
            storm_circle_radius_km: None,
        }
    }

    #[must_use]
    pub fn forecast(position: GeoPoint, max_wind_speed_ms: f64, lead_time_hours: f64) -> Self {
        Self {
            position,
            max_wind_speed_ms,
            lead_time_hours,
            storm_circle_radius_km: None,
        }
    }

    #[must_use]
    pub fn with_storm_circle(mut self, radius_km: f64) -> Self {
        self.storm_circle_radius_km = Some(radius_km);
        self
    }

    /// Wind speed in km/h
    #[must_use]
    pub fn max_wind_speed_kmh(&self) -> f64 {
        self.max_wind_speed_ms * 3.6
    }
}

/// Forecast samples of one storm, ordered by strictly increasing lead time
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ForecastTrack {
    fixes: Vec<StormFix>,
}

impl ForecastTrack {
    /// Build a track. Samples are sorted by lead time; non-positive lead
    /// times and repeated lead times (after the first) are dropped.
    #[must_use]
    pub fn new(mut fixes: Vec<StormFix>) -> Self {
        fixes.retain(|f| f.lead_time_hours > 0.0);
        fixes.sort_by(|a, b| a.lead_time_hours.total_cmp(&b.lead_time_hours));
        fixes.dedup_by(|later, earlier| later.lead_time_hours == earlier.lead_time_hours);
        Self { fixes }
    }

    #[must_use]
    pub fn fixes(&self) -> &[StormFix] {
        &self.fixes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}

/// A tropical cyclone as normalized from an upstream bulletin
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Storm {
    pub name: String,
    /// Observation history, oldest first
    pub history: Vec<StormFix>,
    pub forecast: ForecastTrack,
}

impl Storm {
    /// Most recent observation, if any survived parsing
    #[must_use]
    pub fn current_fix(&self) -> Option<&StormFix> {
        self.history.last()
    }
}
