//! Regional threat classification
//!
//! Measures one storm position against every reference point and assigns a
//! distance band. Boundaries are inclusive on the tighter side, so a point
//! exactly `direct` km away is `Direct`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::distance::distance_km;
use crate::models::{GeoPoint, ReferenceSet, RiskLevel};
use crate::{MonitorError, Result};

/// Distance thresholds in km, `direct < moderate < indirect`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatRadii {
    pub direct: f64,
    pub moderate: f64,
    pub indirect: f64,
}

impl Default for ThreatRadii {
    fn default() -> Self {
        Self {
            direct: 200.0,
            moderate: 400.0,
            indirect: 600.0,
        }
    }
}

impl ThreatRadii {
    pub fn new(direct: f64, moderate: f64, indirect: f64) -> Result<Self> {
        if !(direct > 0.0 && direct < moderate && moderate < indirect) {
            return Err(MonitorError::validation(format!(
                "threat radii must satisfy 0 < direct < moderate < indirect, got {direct}/{moderate}/{indirect}"
            )));
        }
        Ok(Self {
            direct,
            moderate,
            indirect,
        })
    }

    /// Band for a single distance, tightest band first
    #[must_use]
    pub fn band_for(&self, distance_km: f64) -> ThreatBand {
        if distance_km <= self.direct {
            ThreatBand::Direct
        } else if distance_km <= self.moderate {
            ThreatBand::Moderate
        } else if distance_km <= self.indirect {
            ThreatBand::Indirect
        } else {
            ThreatBand::None
        }
    }
}

/// Proximity band, `None < Indirect < Moderate < Direct`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThreatBand {
    None,
    Indirect,
    Moderate,
    Direct,
}

impl ThreatBand {
    /// Geographic risk level carried into fusion
    #[must_use]
    pub fn risk_level(self) -> RiskLevel {
        match self {
            ThreatBand::Direct => RiskLevel::High,
            ThreatBand::Moderate => RiskLevel::Medium,
            ThreatBand::Indirect => RiskLevel::LowMedium,
            ThreatBand::None => RiskLevel::Low,
        }
    }
}

impl fmt::Display for ThreatBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatBand::None => write!(f, "no threat"),
            ThreatBand::Indirect => write!(f, "indirect threat"),
            ThreatBand::Moderate => write!(f, "moderate threat"),
            ThreatBand::Direct => write!(f, "direct threat"),
        }
    }
}

/// A reference point within the indirect radius, with its own band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedReference {
    pub name: String,
    pub band: ThreatBand,
    pub distance_km: f64,
}

/// Result of classifying one storm position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalThreatAssessment {
    pub band: ThreatBand,
    pub closest_reference_name: String,
    /// `f64::INFINITY` when the reference set is empty
    pub closest_distance_km: f64,
    pub affected_references: Vec<AffectedReference>,
}

impl RegionalThreatAssessment {
    /// Assessment used when no storm position is available
    #[must_use]
    pub fn none() -> Self {
        Self {
            band: ThreatBand::None,
            closest_reference_name: String::new(),
            closest_distance_km: f64::INFINITY,
            affected_references: Vec::new(),
        }
    }

    /// Summary such as `"(台南 150 km)"`, empty when no reference was in range
    #[must_use]
    pub fn distance_info(&self) -> String {
        if self.band == ThreatBand::None {
            return String::new();
        }
        format!(
            "({} {:.0} km)",
            self.closest_reference_name, self.closest_distance_km
        )
    }
}

/// Classify `position` against every point in `references`
#[must_use]
pub fn classify(
    position: &GeoPoint,
    references: &ReferenceSet,
    radii: &ThreatRadii,
) -> RegionalThreatAssessment {
    let mut assessment = RegionalThreatAssessment::none();

    for reference in references.iter() {
        let distance = distance_km(position, &reference.position);

        if distance < assessment.closest_distance_km {
            assessment.closest_distance_km = distance;
            assessment.closest_reference_name.clone_from(&reference.name);
        }

        let band = radii.band_for(distance);
        if band != ThreatBand::None {
            assessment.affected_references.push(AffectedReference {
                name: reference.name.clone(),
                band,
                distance_km: distance,
            });
        }
    }

    assessment.band = radii.band_for(assessment.closest_distance_km);

    debug!(
        band = ?assessment.band,
        closest = %assessment.closest_reference_name,
        distance_km = assessment.closest_distance_km,
        "classified storm position"
    );

    assessment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReferencePoint;
    use rstest::rstest;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    fn taiwan() -> ReferenceSet {
        ReferenceSet::new(vec![
            ReferencePoint::new("台北", p(25.0, 121.5)),
            ReferencePoint::new("台南", p(23.0, 120.2)),
            ReferencePoint::new("金門", p(24.4, 118.3)),
        ])
        .unwrap()
    }

    #[rstest]
    #[case(0.0, ThreatBand::Direct)]
    #[case(200.0, ThreatBand::Direct)]
    #[case(200.1, ThreatBand::Moderate)]
    #[case(400.0, ThreatBand::Moderate)]
    #[case(400.1, ThreatBand::Indirect)]
    #[case(600.0, ThreatBand::Indirect)]
    #[case(600.1, ThreatBand::None)]
    fn test_band_for_boundaries(#[case] distance: f64, #[case] expected: ThreatBand) {
        assert_eq!(ThreatRadii::default().band_for(distance), expected);
    }

    #[test]
    fn test_radii_validation() {
        assert!(ThreatRadii::new(200.0, 400.0, 600.0).is_ok());
        assert!(ThreatRadii::new(400.0, 200.0, 600.0).is_err());
        assert!(ThreatRadii::new(200.0, 400.0, 400.0).is_err());
        assert!(ThreatRadii::new(0.0, 400.0, 600.0).is_err());
    }

    #[test]
    fn test_exact_radius_is_inclusive() {
        let target = p(23.0, 120.2);
        let storm = p(24.5, 121.0);
        let d = distance_km(&storm, &target);
        let refs = ReferenceSet::single(ReferencePoint::new("台南", target));

        let at_direct = ThreatRadii::new(d, d + 100.0, d + 200.0).unwrap();
        assert_eq!(classify(&storm, &refs, &at_direct).band, ThreatBand::Direct);

        let at_moderate = ThreatRadii::new(d - 100.0, d, d + 200.0).unwrap();
        assert_eq!(classify(&storm, &refs, &at_moderate).band, ThreatBand::Moderate);
    }

    #[test]
    fn test_closest_reference_and_affected_list() {
        // Just off the Tainan coast
        let storm = p(22.8, 120.0);
        let assessment = classify(&storm, &taiwan(), &ThreatRadii::default());

        assert_eq!(assessment.band, ThreatBand::Direct);
        assert_eq!(assessment.closest_reference_name, "台南");
        assert!(assessment.closest_distance_km < 50.0);

        let bands: Vec<(&str, ThreatBand)> = assessment
            .affected_references
            .iter()
            .map(|a| (a.name.as_str(), a.band))
            .collect();
        assert!(bands.contains(&("台南", ThreatBand::Direct)));
        assert!(bands.contains(&("金門", ThreatBand::Moderate)));
        assert!(bands.contains(&("台北", ThreatBand::Moderate)));
    }

    #[test]
    fn test_far_storm_is_none() {
        let storm = p(15.0, 135.0);
        let assessment = classify(&storm, &taiwan(), &ThreatRadii::default());
        assert_eq!(assessment.band, ThreatBand::None);
        assert!(assessment.affected_references.is_empty());
        assert_eq!(assessment.distance_info(), "");
    }

    #[test]
    fn test_empty_reference_set() {
        let assessment = classify(&p(23.0, 120.0), &ReferenceSet::default(), &ThreatRadii::default());
        assert_eq!(assessment.band, ThreatBand::None);
        assert!(assessment.closest_distance_km.is_infinite());
    }

    #[test]
    fn test_moving_away_never_tightens_band() {
        let refs = taiwan();
        let radii = ThreatRadii::default();
        let mut previous = classify(&p(23.0, 121.0), &refs, &radii);
        // Step due east, away from every reference point
        for step in 1..=20 {
            let lon = 121.0 + f64::from(step) * 0.5;
            let current = classify(&p(23.0, lon), &refs, &radii);
            assert!(current.closest_distance_km >= previous.closest_distance_km);
            assert!(current.band <= previous.band);
            previous = current;
        }
    }
}
