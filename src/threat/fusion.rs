//! Risk fusion
//!
//! Merges the keyword grade, the geographic band and the forecast timeline
//! into one grade. The higher signal always wins; nothing is averaged.

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use super::regional::{RegionalThreatAssessment, ThreatBand};
use super::timeline::{TimelineWindow, lead_to_datetime};
use crate::models::{RiskGrade, RiskLevel};

/// Marker appended to departure times that come from a heuristic
pub const ESTIMATED_MARKER: &str = "(est.)";

/// Fusion engine. `issued_at` anchors lead times to calendar labels.
#[derive(Debug, Clone, Copy)]
pub struct RiskFusionEngine {
    issued_at: DateTime<FixedOffset>,
}

impl RiskFusionEngine {
    #[must_use]
    pub fn new(issued_at: DateTime<FixedOffset>) -> Self {
        Self { issued_at }
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<FixedOffset> {
        self.issued_at
    }

    /// Fuse the three signals. Absent geography counts as `ThreatBand::None`
    /// and an absent timeline as no time threat.
    #[must_use]
    pub fn fuse(
        &self,
        basic: &RiskGrade,
        geographic: Option<&RegionalThreatAssessment>,
        timeline: Option<&TimelineWindow>,
    ) -> RiskGrade {
        let band = geographic.map_or(ThreatBand::None, |g| g.band);
        let time_threat = timeline.is_some_and(TimelineWindow::is_threat);

        let mut geo_level = band.risk_level();
        let escalated = time_threat && band >= ThreatBand::Moderate;
        if escalated {
            geo_level = geo_level.escalate();
        }

        let mut grade = if geo_level > basic.level {
            RiskGrade {
                level: geo_level,
                reason: Some(geographic_reason(band, escalated)),
                details: basic.details.clone(),
            }
        } else {
            basic.clone()
        };

        if let Some(geo) = geographic.filter(|g| g.band != ThreatBand::None) {
            grade.details.push(self.describe(geo, timeline));
        }

        debug!(
            basic = ?basic.level,
            band = ?band,
            time_threat,
            result = ?grade.level,
            "fused risk signals"
        );

        grade
    }

    /// Calendar label for a lead time, e.g. `07/06 14:00 (+18h)`
    #[must_use]
    pub fn lead_label(&self, lead_hours: f64) -> String {
        match lead_to_datetime(&self.issued_at, lead_hours) {
            Some(at) => format!("{} (+{lead_hours:.0}h)", at.format("%m/%d %H:%M")),
            None => format!("+{lead_hours:.0}h"),
        }
    }

    fn describe(&self, geo: &RegionalThreatAssessment, timeline: Option<&TimelineWindow>) -> String {
        let mut sentence = format!(
            "Typhoon {:.0} km from {} ({})",
            geo.closest_distance_km, geo.closest_reference_name, geo.band
        );

        if let Some(window) = timeline {
            if let Some(approach) = window.approach_lead_hours {
                sentence.push_str(&format!(", approach {}", self.lead_label(approach)));
            }
            if let Some(depart) = window.depart_lead_hours {
                sentence.push_str(&format!(", depart {}", self.lead_label(depart)));
                if window.depart_is_estimated {
                    sentence.push(' ');
                    sentence.push_str(ESTIMATED_MARKER);
                }
            }
        }

        sentence
    }
}

fn geographic_reason(band: ThreatBand, escalated: bool) -> String {
    let base = match band {
        ThreatBand::Direct => "typhoon within direct threat radius",
        ThreatBand::Moderate => "typhoon within moderate threat radius",
        ThreatBand::Indirect => "typhoon within indirect threat radius",
        ThreatBand::None => "no typhoon threat",
    };
    if escalated {
        format!("{base}, forecast track reaches the target")
    } else {
        base.to_string()
    }
}
