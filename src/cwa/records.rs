//! Wire records for the CWA open-data datasets
//!
//! - W-C0034-005: tropical cyclone analysis and forecast tracks
//! - W-C0033-001: weather alerts per county
//! - F-C0032-001: 36-hour county forecast
//!
//! The upstream JSON is loosely typed: numbers may arrive as strings and
//! single-element lists as bare objects. Malformed entries are skipped
//! rather than failing the whole payload.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::models::{ForecastTrack, GeoPoint, Storm, StormFix};

/// A number that may be encoded as a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Numeric::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Numeric::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Numeric::Number(n) if n.fract() == 0.0 => format!("{n:.0}"),
            Numeric::Number(n) => n.to_string(),
            Numeric::Text(s) => s.trim().to_string(),
        }
    }
}

/// Accept a list, a single object or null, dropping entries that do not parse
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(error = %e, "skipping malformed record");
                None
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// W-C0034-005 typhoon tracks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TyphoonPayload {
    #[serde(default)]
    pub records: TyphoonRecords,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TyphoonRecords {
    #[serde(rename = "tropicalCyclones", default)]
    pub tropical_cyclones: TropicalCyclones,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TropicalCyclones {
    #[serde(rename = "tropicalCyclone", default, deserialize_with = "lenient_list")]
    pub tropical_cyclone: Vec<TropicalCycloneRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TropicalCycloneRecord {
    #[serde(default)]
    pub typhoon_name: Option<String>,
    #[serde(default)]
    pub cwa_typhoon_name: Option<String>,
    #[serde(default)]
    pub cwa_td_no: Option<Numeric>,
    #[serde(default)]
    pub analysis_data: FixList,
    #[serde(default)]
    pub forecast_data: FixList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixList {
    #[serde(default, deserialize_with = "lenient_list")]
    pub fix: Vec<FixRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixRecord {
    /// `"lon,lat"`
    #[serde(default)]
    pub coordinate: Option<String>,
    /// m/s
    #[serde(default)]
    pub max_wind_speed: Option<Numeric>,
    /// Forecast lead time in hours
    #[serde(default)]
    pub tau: Option<Numeric>,
    #[serde(rename = "circleOf15Ms", default)]
    pub circle_of_15_ms: Option<WindCircle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindCircle {
    /// km
    #[serde(default)]
    pub radius: Option<Numeric>,
}

fn non_empty(name: Option<&String>) -> Option<&str> {
    name.map(|n| n.trim()).filter(|n| !n.is_empty())
}

impl TropicalCycloneRecord {
    /// Display name: CWA name, then international name, then depression number
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = non_empty(self.cwa_typhoon_name.as_ref()) {
            return name.to_string();
        }
        if let Some(name) = non_empty(self.typhoon_name.as_ref()) {
            return name.to_string();
        }
        match self.cwa_td_no.as_ref().map(Numeric::as_text) {
            Some(no) if !no.is_empty() => format!("Tropical Depression {no}"),
            _ => "Unknown tropical cyclone".to_string(),
        }
    }

    /// Normalize into a typed storm. Fixes with unreadable coordinates are dropped.
    #[must_use]
    pub fn to_storm(&self) -> Storm {
        let name = self.display_name();

        let history = self
            .analysis_data
            .fix
            .iter()
            .filter_map(|fix| fix.to_fix(0.0, &name))
            .collect();

        let forecast = self
            .forecast_data
            .fix
            .iter()
            .filter_map(|fix| {
                let lead = fix.tau.as_ref().and_then(Numeric::as_f64)?;
                fix.to_fix(lead, &name)
            })
            .collect();

        Storm {
            name,
            history,
            forecast: ForecastTrack::new(forecast),
        }
    }
}

impl FixRecord {
    fn to_fix(&self, lead_time_hours: f64, storm: &str) -> Option<StormFix> {
        let coordinate = self.coordinate.as_deref()?;
        let position = match GeoPoint::parse_lon_lat(coordinate) {
            Ok(position) => position,
            Err(e) => {
                debug!(storm, error = %e, "dropping fix");
                return None;
            }
        };

        let wind = self
            .max_wind_speed
            .as_ref()
            .and_then(Numeric::as_f64)
            .unwrap_or(0.0);

        let mut fix = StormFix {
            position,
            max_wind_speed_ms: wind,
            lead_time_hours,
            storm_circle_radius_km: None,
        };
        if let Some(radius) = self
            .circle_of_15_ms
            .as_ref()
            .and_then(|c| c.radius.as_ref())
            .and_then(Numeric::as_f64)
            .filter(|r| *r > 0.0)
        {
            fix = fix.with_storm_circle(radius);
        }
        Some(fix)
    }
}

impl TyphoonPayload {
    /// All storms in the bulletin
    #[must_use]
    pub fn storms(&self) -> Vec<Storm> {
        self.records
            .tropical_cyclones
            .tropical_cyclone
            .iter()
            .map(TropicalCycloneRecord::to_storm)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// W-C0033-001 weather alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    #[serde(default)]
    pub records: AlertRecords,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertRecords {
    #[serde(default, deserialize_with = "lenient_list")]
    pub location: Vec<AlertLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertLocation {
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub hazard_conditions: HazardConditions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardConditions {
    #[serde(default, deserialize_with = "lenient_list")]
    pub hazards: Vec<Hazard>,
}

/// One hazard. Older payloads nest the text under `info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    #[serde(default)]
    pub phenomena: Option<String>,
    #[serde(default)]
    pub significance: Option<String>,
    #[serde(default)]
    pub info: Option<HazardInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardInfo {
    #[serde(default)]
    pub phenomena: Option<String>,
    #[serde(default)]
    pub significance: Option<String>,
}

impl Hazard {
    #[must_use]
    pub fn phenomena(&self) -> Option<&str> {
        non_empty(self.phenomena.as_ref())
            .or_else(|| self.info.as_ref().and_then(|i| non_empty(i.phenomena.as_ref())))
    }

    #[must_use]
    pub fn significance(&self) -> &str {
        non_empty(self.significance.as_ref())
            .or_else(|| self.info.as_ref().and_then(|i| non_empty(i.significance.as_ref())))
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// F-C0032-001 36-hour forecast
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub records: ForecastRecords,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecords {
    #[serde(default, deserialize_with = "lenient_list")]
    pub location: Vec<ForecastLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastLocation {
    #[serde(default)]
    pub location_name: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub weather_element: Vec<WeatherElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherElement {
    #[serde(default)]
    pub element_name: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub time: Vec<ForecastPeriod>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub parameter: ForecastParameter,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastParameter {
    #[serde(default)]
    pub parameter_name: String,
}
