//! Data models for the typhoon monitor
//!
//! Value types shared by the threat engine and the retrieval layer:
//! - Location: geographic points and named reference points
//! - Storm: observed/forecast fixes and forecast tracks
//! - Risk: ordered risk levels and graded results

pub mod location;
pub mod risk;
pub mod storm;

// Re-export all public types for convenient access
pub use location::{GeoPoint, ReferencePoint, ReferenceSet};
pub use risk::{RiskGrade, RiskLevel};
pub use storm::{ForecastTrack, Storm, StormFix};
