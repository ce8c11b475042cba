//! `typhoon-monitor` - Typhoon track and advisory monitoring for scheduled trips
//!
//! This library fetches tropical cyclone bulletins and weather advisories,
//! classifies storm proximity against named places, estimates when a
//! forecast track reaches them and fuses everything into one risk grade
//! per scheduled event.

pub mod cache;
pub mod config;
pub mod cwa;
pub mod error;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod threat;

// Re-export core types for public API
pub use cache::SnapshotCache;
pub use config::MonitorConfig;
pub use cwa::{CwaClient, WeatherSource};
pub use error::MonitorError;
pub use models::{ForecastTrack, GeoPoint, ReferencePoint, ReferenceSet, RiskGrade, RiskLevel, Storm, StormFix};
pub use monitor::{MonitorReport, Snapshot, Status, TyphoonMonitor};
pub use threat::{
    RegionalThreatAssessment, RiskFusionEngine, TargetEvent, TargetRisk, ThreatBand, ThreatRadii,
    TimelineAnalyzer, TimelineWindow,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
