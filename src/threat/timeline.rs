//! Forecast-track timeline analysis
//!
//! Estimates the lead-time window during which a target point sits inside a
//! storm's influence radius (the moderate threat radius).

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::distance::distance_km;
use super::regional::ThreatRadii;
use crate::models::{ForecastTrack, ReferencePoint, StormFix};

/// Hours a storm is assumed to linger when the track ends while still inside
/// the influence radius
pub const DEFAULT_DEPARTURE_EXTRAPOLATION_HOURS: f64 = 12.0;

/// Exposure assumed for a near miss that never enters the influence radius
pub const DEFAULT_NEAR_MISS_EXPOSURE_HOURS: f64 = 6.0;

/// Lead-time window of influence over a target point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineWindow {
    pub approach_lead_hours: Option<f64>,
    pub depart_lead_hours: Option<f64>,
    /// Departure came from a heuristic rather than an outside forecast sample
    pub depart_is_estimated: bool,
}

impl TimelineWindow {
    /// Whether the storm is forecast to reach the target at all
    #[must_use]
    pub fn is_threat(&self) -> bool {
        self.approach_lead_hours.is_some()
    }

    /// Whether the window overlaps `date` (a calendar day in `issued_at`'s zone)
    #[must_use]
    pub fn covers_date<Tz: TimeZone>(&self, issued_at: &DateTime<Tz>, date: NaiveDate) -> bool {
        let Some(approach) = self.approach_lead_hours else {
            return false;
        };
        let depart = self.depart_lead_hours.unwrap_or(approach);
        let Some(start) = lead_to_datetime(issued_at, approach) else {
            return false;
        };
        // A departure past the calendar's range leaves the window open-ended
        let ends_after = lead_to_datetime(issued_at, depart)
            .is_none_or(|end| date <= end.date_naive());
        start.date_naive() <= date && ends_after
    }
}

/// Wall-clock time `lead_hours` after `issued_at`, `None` when it is not
/// representable
pub fn lead_to_datetime<Tz: TimeZone>(
    issued_at: &DateTime<Tz>,
    lead_hours: f64,
) -> Option<DateTime<Tz>> {
    let minutes = (lead_hours * 60.0).round();
    if !minutes.is_finite() {
        return None;
    }
    let delta = Duration::try_minutes(minutes as i64)?;
    issued_at.clone().checked_add_signed(delta)
}

/// Track analyzer with its two persistence heuristics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineAnalyzer {
    pub departure_extrapolation_hours: f64,
    pub near_miss_exposure_hours: f64,
}

impl Default for TimelineAnalyzer {
    fn default() -> Self {
        Self {
            departure_extrapolation_hours: DEFAULT_DEPARTURE_EXTRAPOLATION_HOURS,
            near_miss_exposure_hours: DEFAULT_NEAR_MISS_EXPOSURE_HOURS,
        }
    }
}

struct Sample {
    lead_hours: f64,
    distance_km: f64,
}

impl TimelineAnalyzer {
    /// Estimate when `target` enters and leaves the storm's influence radius
    #[must_use]
    pub fn estimate_window(
        &self,
        track: &ForecastTrack,
        target: &ReferencePoint,
        radii: &ThreatRadii,
    ) -> TimelineWindow {
        let mut samples: Vec<Sample> = track
            .fixes()
            .iter()
            .map(|fix: &StormFix| Sample {
                lead_hours: fix.lead_time_hours,
                distance_km: distance_km(&fix.position, &target.position),
            })
            .collect();
        samples.sort_by(|a, b| a.lead_hours.total_cmp(&b.lead_hours));

        let inside = |s: &Sample| s.distance_km <= radii.moderate;

        let window = match (
            samples.iter().position(inside),
            samples.iter().rposition(inside),
        ) {
            (Some(first), Some(last)) => {
                let approach = samples[first].lead_hours;
                match samples.get(last + 1) {
                    Some(next) => TimelineWindow {
                        approach_lead_hours: Some(approach),
                        depart_lead_hours: Some(next.lead_hours),
                        depart_is_estimated: false,
                    },
                    None => TimelineWindow {
                        approach_lead_hours: Some(approach),
                        depart_lead_hours: Some(
                            samples[last].lead_hours + self.departure_extrapolation_hours,
                        ),
                        depart_is_estimated: true,
                    },
                }
            }
            _ => self.near_miss_window(&samples, radii),
        };

        debug!(
            target = %target.name,
            approach = ?window.approach_lead_hours,
            depart = ?window.depart_lead_hours,
            estimated = window.depart_is_estimated,
            "estimated influence window"
        );

        window
    }

    fn near_miss_window(&self, samples: &[Sample], radii: &ThreatRadii) -> TimelineWindow {
        let closest = samples
            .iter()
            .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        match closest {
            Some(sample) if sample.distance_km <= radii.indirect => TimelineWindow {
                approach_lead_hours: Some(sample.lead_hours),
                depart_lead_hours: Some(sample.lead_hours + self.near_miss_exposure_hours),
                depart_is_estimated: true,
            },
            _ => TimelineWindow::default(),
        }
    }
}
