//! Per-target evaluation: one scheduled event at one place on one date

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::fusion::RiskFusionEngine;
use super::keywords::{KeywordClassifier, KeywordScope};
use super::regional::{self, RegionalThreatAssessment, ThreatRadii};
use super::timeline::{TimelineAnalyzer, TimelineWindow};
use crate::models::{ReferencePoint, ReferenceSet, RiskGrade, Storm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Flight,
    Appointment,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Flight => write!(f, "✈️ Flight"),
            TargetKind::Appointment => write!(f, "🏥 Appointment"),
        }
    }
}

/// A scheduled event whose risk is graded every cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEvent {
    pub kind: TargetKind,
    pub name: String,
    pub date: NaiveDate,
    pub location: ReferencePoint,
    pub scope: KeywordScope,
}

/// Inputs shared by every target in one evaluation
#[derive(Debug, Clone, Copy)]
pub struct ThreatContext<'a> {
    pub radii: &'a ThreatRadii,
    pub analyzer: &'a TimelineAnalyzer,
    pub engine: &'a RiskFusionEngine,
}

/// Graded outcome for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRisk {
    pub kind: TargetKind,
    pub name: String,
    pub date: NaiveDate,
    pub grade: RiskGrade,
    /// Storm that drove the geographic signal, if any was in range
    pub storm: Option<String>,
}

struct StormSignal<'s> {
    storm: &'s Storm,
    geographic: RegionalThreatAssessment,
    timeline: TimelineWindow,
}

/// Grade `target` from the warning list and the active storms
#[must_use]
pub fn assess_target(
    target: &TargetEvent,
    storms: &[Storm],
    warnings: &[String],
    ctx: &ThreatContext<'_>,
) -> TargetRisk {
    let basic = KeywordClassifier::new(target.scope.clone()).classify(warnings);
    let references = ReferenceSet::single(target.location.clone());

    let strongest = storms
        .iter()
        .map(|storm| StormSignal {
            storm,
            geographic: storm.current_fix().map_or_else(RegionalThreatAssessment::none, |fix| {
                regional::classify(&fix.position, &references, ctx.radii)
            }),
            timeline: ctx
                .analyzer
                .estimate_window(&storm.forecast, &target.location, ctx.radii),
        })
        // Band first, then a forecast that reaches the target, then proximity
        .max_by(|a, b| {
            a.geographic
                .band
                .cmp(&b.geographic.band)
                .then(a.timeline.is_threat().cmp(&b.timeline.is_threat()))
                .then(b.geographic.closest_distance_km.total_cmp(&a.geographic.closest_distance_km))
        });

    let grade = match &strongest {
        Some(signal) => {
            let mut grade =
                ctx.engine
                    .fuse(&basic, Some(&signal.geographic), Some(&signal.timeline));
            annotate(&mut grade, target, signal, ctx);
            grade
        }
        None => ctx.engine.fuse(&basic, None, None),
    };

    TargetRisk {
        kind: target.kind,
        name: target.name.clone(),
        date: target.date,
        grade,
        storm: strongest
            .filter(|s| s.geographic.band != regional::ThreatBand::None || s.timeline.is_threat())
            .map(|s| s.storm.name.clone()),
    }
}

fn annotate(grade: &mut RiskGrade, target: &TargetEvent, signal: &StormSignal<'_>, ctx: &ThreatContext<'_>) {
    if signal.timeline.covers_date(&ctx.engine.issued_at(), target.date) {
        grade.details.push(format!(
            "{} forecast window covers {} on {}",
            signal.storm.name,
            target.name,
            target.date.format("%m/%d")
        ));
    }

    if let Some(fix) = signal.storm.current_fix() {
        if let Some(radius) = fix.storm_circle_radius_km {
            let distance = signal.geographic.closest_distance_km;
            if distance < radius {
                grade.details.push(format!(
                    "{} is inside the {} storm circle ({distance:.0} km < {radius:.0} km)",
                    target.location.name, signal.storm.name
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForecastTrack, GeoPoint, RiskLevel, StormFix};
    use chrono::{FixedOffset, TimeZone};

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    fn appointment() -> TargetEvent {
        TargetEvent {
            kind: TargetKind::Appointment,
            name: "health checkup".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
            location: ReferencePoint::new("台南", p(23.0, 120.2)),
            scope: KeywordScope::Location(vec!["台南".to_string(), "臺南".to_string()]),
        }
    }

    fn engine() -> RiskFusionEngine {
        let taipei = FixedOffset::east_opt(8 * 3600).unwrap();
        RiskFusionEngine::new(taipei.with_ymd_and_hms(2025, 7, 5, 8, 0, 0).unwrap())
    }

    fn storm(name: &str, current: GeoPoint, forecast: Vec<StormFix>) -> Storm {
        Storm {
            name: name.to_string(),
            history: vec![StormFix::observed(current, 40.0).with_storm_circle(250.0)],
            forecast: ForecastTrack::new(forecast),
        }
    }

    fn run(storms: &[Storm], warnings: &[String]) -> TargetRisk {
        let radii = ThreatRadii::default();
        let analyzer = TimelineAnalyzer::default();
        let engine = engine();
        let ctx = ThreatContext {
            radii: &radii,
            analyzer: &analyzer,
            engine: &engine,
        };
        assess_target(&appointment(), storms, warnings, &ctx)
    }

    #[test]
    fn test_no_storms_no_warnings() {
        let risk = run(&[], &[]);
        assert_eq!(risk.grade.level, RiskLevel::Low);
        assert!(risk.storm.is_none());
    }

    #[test]
    fn test_closest_storm_drives_grade() {
        let far = storm("Far", p(15.0, 135.0), vec![]);
        let near = storm(
            "Kaemi",
            p(22.5, 121.0),
            vec![StormFix::forecast(p(23.2, 120.0), 45.0, 24.0)],
        );
        let risk = run(&[far, near], &[]);

        // Direct band plus a forecast window escalates to extreme
        assert_eq!(risk.grade.level, RiskLevel::Extreme);
        assert_eq!(risk.storm.as_deref(), Some("Kaemi"));
        assert!(risk.grade.details.iter().any(|d| d.contains("storm circle")));
        // 24h window plus 12h extrapolation ends 07/06 20:00, before the appointment
        assert!(!risk.grade.details.iter().any(|d| d.contains("covers")));
    }

    #[test]
    fn test_window_covering_target_date_is_noted() {
        let approaching = storm(
            "Kaemi",
            p(19.0, 126.0),
            vec![
                StormFix::forecast(p(21.0, 123.0), 40.0, 24.0),
                StormFix::forecast(p(22.8, 120.6), 42.0, 48.0),
            ],
        );
        let risk = run(&[approaching], &[]);
        assert!(
            risk.grade.details.iter().any(|d| d.contains("covers health checkup on 07/07")),
            "{:?}",
            risk.grade.details
        );
    }

    #[test]
    fn test_storm_without_observation_only_contributes_timeline() {
        let forecast_only = Storm {
            name: "TD 12".to_string(),
            history: vec![],
            forecast: ForecastTrack::new(vec![StormFix::forecast(p(23.1, 120.3), 20.0, 12.0)]),
        };
        let risk = run(&[forecast_only], &[]);
        assert_eq!(risk.grade.level, RiskLevel::Low);
        assert_eq!(risk.storm.as_deref(), Some("TD 12"));
    }

    #[test]
    fn test_reaching_track_wins_among_unobserved_storms() {
        let forecast_only = |name: &str, fixes: Vec<StormFix>| Storm {
            name: name.to_string(),
            history: vec![],
            forecast: ForecastTrack::new(fixes),
        };
        let reaching = forecast_only(
            "Kaemi",
            vec![
                StormFix::forecast(p(20.0, 124.0), 35.0, 24.0),
                StormFix::forecast(p(23.0, 120.4), 40.0, 48.0),
            ],
        );
        let passing = forecast_only("Bebinca", vec![StormFix::forecast(p(30.0, 130.0), 30.0, 24.0)]);

        for storms in [
            [reaching.clone(), passing.clone()],
            [passing.clone(), reaching.clone()],
        ] {
            let risk = run(&storms, &[]);
            assert_eq!(risk.storm.as_deref(), Some("Kaemi"));
            assert!(
                risk.grade.details.iter().any(|d| d.contains("covers health checkup on 07/07")),
                "{:?}",
                risk.grade.details
            );
        }
    }
}
