//! Flattened warning text built from the three datasets
//!
//! Every line is plain text so the keyword classifier can grade it, and the
//! same lines go straight into the printed report.

use tracing::info;

use super::records::{AlertPayload, ForecastPayload};
use crate::models::{ReferenceSet, Storm, StormFix};
use crate::threat::{
    RiskFusionEngine, TargetEvent, ThreatBand, ThreatRadii, TimelineAnalyzer, distance_km,
    fusion::ESTIMATED_MARKER, regional,
};

/// Wind speed (km/h) above which a storm gets an intensity line
pub const INTENSITY_WARNING_KMH: f64 = 60.0;
/// Wind speed (km/h) above which the intensity line says high risk
pub const INTENSITY_HIGH_RISK_KMH: f64 = 80.0;

/// Wx phrases that make a forecast period worth reporting
const SEVERE_WEATHER_PHRASES: [&str; 4] = ["颱風", "暴風", "豪雨", "大雨"];

/// `⚠️ {location}: {phenomena} {significance}` for every hazard in a monitored county
#[must_use]
pub fn alert_warnings(payload: &AlertPayload, monitored: &[String]) -> Vec<String> {
    payload
        .records
        .location
        .iter()
        .filter(|loc| monitored.contains(&loc.location_name))
        .flat_map(|loc| {
            loc.hazard_conditions.hazards.iter().filter_map(move |hazard| {
                hazard.phenomena().map(|phenomena| {
                    format!(
                        "⚠️ {}: {} {}",
                        loc.location_name,
                        phenomena,
                        hazard.significance()
                    )
                    .trim_end()
                    .to_string()
                })
            })
        })
        .collect()
}

/// `🌧️ {location} {start}: {description}` for severe Wx periods in monitored counties
#[must_use]
pub fn forecast_warnings(payload: &ForecastPayload, monitored: &[String]) -> Vec<String> {
    let mut warnings = Vec::new();

    for location in payload
        .records
        .location
        .iter()
        .filter(|loc| monitored.contains(&loc.location_name))
    {
        for element in location.weather_element.iter().filter(|e| e.element_name == "Wx") {
            for period in &element.time {
                let description = &period.parameter.parameter_name;
                if SEVERE_WEATHER_PHRASES.iter().any(|p| description.contains(p)) {
                    warnings.push(format!(
                        "🌧️ {} {}: {}",
                        location.location_name, period.start_time, description
                    ));
                }
            }
        }
    }

    warnings
}

/// Everything the storm lines need besides the storms themselves
#[derive(Debug, Clone, Copy)]
pub struct StormWarningContext<'a> {
    pub references: &'a ReferenceSet,
    pub radii: &'a ThreatRadii,
    pub analyzer: &'a TimelineAnalyzer,
    pub engine: &'a RiskFusionEngine,
    pub targets: &'a [TargetEvent],
    /// Forecast fixes beyond this lead time get no approach line
    pub horizon_hours: f64,
}

/// Intensity, approach and impact-window lines for storms that affect the region set
#[must_use]
pub fn storm_warnings(storms: &[Storm], ctx: &StormWarningContext<'_>) -> Vec<String> {
    let mut warnings = Vec::new();

    for storm in storms {
        let current = storm
            .current_fix()
            .map(|fix| (fix, regional::classify(&fix.position, ctx.references, ctx.radii)));
        let current_band = current.as_ref().map_or(ThreatBand::None, |(_, a)| a.band);

        let forecast_threat = storm
            .forecast
            .fixes()
            .iter()
            .any(|fix| first_region_within(fix, ctx.references, ctx.radii.moderate).is_some());

        if current_band == ThreatBand::None && !forecast_threat {
            info!(storm = %storm.name, "storm does not affect monitored regions, skipping");
            continue;
        }

        if let Some((fix, assessment)) = &current {
            let kmh = fix.max_wind_speed_kmh();
            if kmh > INTENSITY_WARNING_KMH {
                let label = if assessment.band == ThreatBand::Direct || kmh > INTENSITY_HIGH_RISK_KMH {
                    "high risk"
                } else {
                    "possible impact"
                };
                let mut line = format!(
                    "🌀 Typhoon {} max wind {:.0} m/s ({kmh:.1} km/h) - {label}",
                    storm.name, fix.max_wind_speed_ms
                );
                let distance = assessment.distance_info();
                if !distance.is_empty() {
                    line.push(' ');
                    line.push_str(&distance);
                }
                warnings.push(line);
            }
        }

        for fix in storm
            .forecast
            .fixes()
            .iter()
            .filter(|f| f.lead_time_hours <= ctx.horizon_hours)
        {
            if let Some((region, distance)) = first_region_within(fix, ctx.references, ctx.radii.moderate) {
                warnings.push(format!(
                    "📍 Typhoon {} forecast to approach {region} in {:.0}h ({distance:.0} km)",
                    storm.name, fix.lead_time_hours
                ));
            }
        }

        for target in ctx.targets {
            let window = ctx
                .analyzer
                .estimate_window(&storm.forecast, &target.location, ctx.radii);
            let Some(approach) = window.approach_lead_hours else {
                continue;
            };
            let mut line = format!(
                "📊 Typhoon {} impact window for {}: approach {}",
                storm.name,
                target.location.name,
                ctx.engine.lead_label(approach)
            );
            if let Some(depart) = window.depart_lead_hours {
                line.push_str(&format!(", depart {}", ctx.engine.lead_label(depart)));
                if window.depart_is_estimated {
                    line.push(' ');
                    line.push_str(ESTIMATED_MARKER);
                }
            }
            warnings.push(line);
        }
    }

    warnings
}

/// First reference (in set order) within `radius` of `fix`, with its distance
fn first_region_within<'r>(
    fix: &StormFix,
    references: &'r ReferenceSet,
    radius: f64,
) -> Option<(&'r str, f64)> {
    references.iter().find_map(|reference| {
        let distance = distance_km(&fix.position, &reference.position);
        (distance <= radius).then_some((reference.name.as_str(), distance))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cwa::records::{AlertPayload, ForecastPayload};
    use crate::models::{ForecastTrack, GeoPoint, ReferencePoint};
    use crate::threat::{KeywordScope, TargetKind};
    use chrono::{FixedOffset, NaiveDate, TimeZone};
    use serde_json::json;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    fn monitored() -> Vec<String> {
        vec!["金門縣".to_string(), "臺南市".to_string()]
    }

    fn references() -> ReferenceSet {
        ReferenceSet::new(vec![
            ReferencePoint::new("台南", p(23.0, 120.2)),
            ReferencePoint::new("金門", p(24.4, 118.3)),
        ])
        .unwrap()
    }

    fn targets() -> Vec<TargetEvent> {
        vec![TargetEvent {
            kind: TargetKind::Appointment,
            name: "checkup".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
            location: ReferencePoint::new("台南", p(23.0, 120.2)),
            scope: KeywordScope::AnyLocation,
        }]
    }

    fn run(storms: &[Storm]) -> Vec<String> {
        let refs = references();
        let radii = ThreatRadii::default();
        let analyzer = TimelineAnalyzer::default();
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let engine = RiskFusionEngine::new(tz.with_ymd_and_hms(2025, 7, 5, 8, 0, 0).unwrap());
        let targets = targets();
        let ctx = StormWarningContext {
            references: &refs,
            radii: &radii,
            analyzer: &analyzer,
            engine: &engine,
            targets: &targets,
            horizon_hours: 72.0,
        };
        storm_warnings(storms, &ctx)
    }

    #[test]
    fn test_alert_lines_only_for_monitored_counties() {
        let payload: AlertPayload = serde_json::from_value(json!({
            "records": {"location": [
                {"locationName": "金門縣", "hazardConditions": {"hazards": [
                    {"phenomena": "陸上強風", "significance": "特報"},
                    {"phenomena": "", "significance": "特報"}
                ]}},
                {"locationName": "花蓮縣", "hazardConditions": {"hazards": [
                    {"phenomena": "豪雨", "significance": "特報"}
                ]}}
            ]}
        }))
        .unwrap();

        assert_eq!(alert_warnings(&payload, &monitored()), vec!["⚠️ 金門縣: 陸上強風 特報"]);
    }

    #[test]
    fn test_forecast_lines_only_for_severe_wx() {
        let payload: ForecastPayload = serde_json::from_value(json!({
            "records": {"location": [{
                "locationName": "臺南市",
                "weatherElement": [
                    {"elementName": "Wx", "time": [
                        {"startTime": "2025-07-06 06:00:00", "parameter": {"parameterName": "陰短暫陣雨"}},
                        {"startTime": "2025-07-06 18:00:00", "parameter": {"parameterName": "陰有豪雨"}}
                    ]},
                    {"elementName": "PoP", "time": [
                        {"startTime": "2025-07-06 18:00:00", "parameter": {"parameterName": "大雨"}}
                    ]}
                ]
            }]}
        }))
        .unwrap();

        assert_eq!(
            forecast_warnings(&payload, &monitored()),
            vec!["🌧️ 臺南市 2025-07-06 18:00:00: 陰有豪雨"]
        );
    }

    #[test]
    fn test_distant_storm_is_skipped() {
        let storm = Storm {
            name: "Far".to_string(),
            history: vec![StormFix::observed(p(15.0, 140.0), 50.0)],
            forecast: ForecastTrack::new(vec![StormFix::forecast(p(16.0, 139.0), 50.0, 24.0)]),
        };
        assert!(run(&[storm]).is_empty());
    }

    #[test]
    fn test_approaching_storm_lines() {
        let storm = Storm {
            name: "凱米".to_string(),
            // about 330 km from 台南: moderate band
            history: vec![StormFix::observed(p(21.0, 122.5), 20.0)],
            forecast: ForecastTrack::new(vec![
                StormFix::forecast(p(22.5, 121.0), 22.0, 24.0),
                StormFix::forecast(p(25.5, 117.0), 20.0, 96.0),
            ]),
        };
        let lines = run(&[storm]);

        // 20 m/s is 72 km/h, above the warning threshold but not high risk
        assert!(lines[0].starts_with("🌀 Typhoon 凱米 max wind 20 m/s (72.0 km/h) - possible impact"), "{lines:?}");
        assert!(lines[0].contains("台南"));
        assert!(lines.iter().any(|l| l.contains("forecast to approach 台南 in 24h")), "{lines:?}");
        // 96h is past the horizon
        assert!(!lines.iter().any(|l| l.contains("in 96h")), "{lines:?}");
        assert!(
            lines
                .iter()
                .any(|l| l.starts_with("📊 Typhoon 凱米 impact window for 台南: approach 07/06 08:00 (+24h)")),
            "{lines:?}"
        );
    }

    #[test]
    fn test_weak_storm_has_no_intensity_line() {
        let storm = Storm {
            name: "TD".to_string(),
            history: vec![StormFix::observed(p(23.1, 120.3), 12.0)],
            forecast: ForecastTrack::default(),
        };
        let lines = run(&[storm]);
        assert!(lines.is_empty(), "{lines:?}");
    }

    #[test]
    fn test_direct_band_is_high_risk_even_below_80kmh() {
        let storm = Storm {
            name: "近".to_string(),
            history: vec![StormFix::observed(p(23.2, 120.4), 18.0)],
            forecast: ForecastTrack::default(),
        };
        let lines = run(&[storm]);
        assert!(lines[0].contains("high risk"), "{lines:?}");
    }
}
