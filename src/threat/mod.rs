//! Threat assessment engine
//!
//! Pure, synchronous functions over immutable inputs:
//! - Great-circle distance
//! - Regional threat bands against named reference points
//! - Forecast-track influence windows
//! - Keyword grading of warning text
//! - Fusion of all signals into one grade per target

pub mod distance;
pub mod fusion;
pub mod keywords;
pub mod regional;
pub mod target;
pub mod timeline;

pub use distance::distance_km;
pub use fusion::RiskFusionEngine;
pub use keywords::{KeywordClassifier, KeywordRule, KeywordScope};
pub use regional::{AffectedReference, RegionalThreatAssessment, ThreatBand, ThreatRadii};
pub use target::{TargetEvent, TargetKind, TargetRisk, ThreatContext, assess_target};
pub use timeline::{TimelineAnalyzer, TimelineWindow};
