//! Monitoring cycle
//!
//! Fetch the three datasets concurrently, fall back to the last known good
//! payload when a fetch fails, then grade both targets against one
//! immutable snapshot.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Asia::Taipei;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::cache::{ALERTS_KEY, FORECAST_KEY, SnapshotCache, TYPHOON_KEY};
use crate::config::MonitorConfig;
use crate::cwa::{
    AlertPayload, ForecastPayload, StormWarningContext, TyphoonPayload, WeatherSource,
    alert_warnings, forecast_warnings, storm_warnings,
};
use crate::models::{GeoPoint, ReferenceSet};
use crate::threat::{
    RegionalThreatAssessment, RiskFusionEngine, TargetEvent, TargetRisk, ThreatContext,
    ThreatRadii, TimelineAnalyzer, assess_target, regional,
};
use crate::{MonitorError, Result};

/// Everything one evaluation reads. Never mutated once assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Anchor for lead-time labels; the evaluation time when absent
    #[serde(default)]
    pub taken_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub typhoons: TyphoonPayload,
    #[serde(default)]
    pub alerts: AlertPayload,
    #[serde(default)]
    pub forecast: ForecastPayload,
}

impl Snapshot {
    /// Load a snapshot saved as JSON
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| MonitorError::parse(format!("snapshot {}: {e}", path.display())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Safe,
    Danger,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Safe => write!(f, "SAFE"),
            Status::Danger => write!(f, "DANGER"),
        }
    }
}

/// Current position of one storm against the full region set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormSummary {
    pub name: String,
    pub position: GeoPoint,
    pub max_wind_speed_ms: f64,
    pub assessment: RegionalThreatAssessment,
}

/// Output of one monitoring cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorReport {
    pub timestamp: DateTime<FixedOffset>,
    pub warnings: Vec<String>,
    pub status: Status,
    pub flight: TargetRisk,
    pub appointment: TargetRisk,
    pub regional: Vec<StormSummary>,
}

const RULE: &str = "============================================================";

impl fmt::Display for MonitorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status_icon = match self.status {
            Status::Danger => "🔴",
            Status::Safe => "🟢",
        };

        writeln!(f, "{RULE}")?;
        writeln!(f, "🌀 Typhoon advisory - {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "{status_icon} Status: {}", self.status)?;

        for risk in [&self.flight, &self.appointment] {
            writeln!(
                f,
                "{} ({}, {}): {} {}",
                risk.kind,
                risk.name,
                risk.date.format("%m/%d"),
                risk.grade.level.indicator(),
                risk.grade
            )?;
        }

        if !self.regional.is_empty() {
            writeln!(f, "\n🗺️ Storms:")?;
            for storm in &self.regional {
                write!(
                    f,
                    "  {} at {} - {}",
                    storm.name,
                    storm.position.format_coordinates(),
                    storm.assessment.band
                )?;
                let distance = storm.assessment.distance_info();
                if !distance.is_empty() {
                    write!(f, " {distance}")?;
                }
                writeln!(f)?;
                for affected in &storm.assessment.affected_references {
                    writeln!(
                        f,
                        "    {} {:.0} km ({})",
                        affected.name, affected.distance_km, affected.band
                    )?;
                }
            }
        }

        if self.warnings.is_empty() {
            writeln!(f, "\n✅ No active warnings")?;
        } else {
            writeln!(f, "\n⚠️ Warnings:")?;
            for (i, warning) in self.warnings.iter().enumerate() {
                writeln!(f, "  {}. {warning}", i + 1)?;
            }
        }

        write!(f, "{RULE}")
    }
}

/// Current time on the Taipei wall clock
#[must_use]
pub fn taipei_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&Taipei).fixed_offset()
}

pub struct TyphoonMonitor {
    source: Box<dyn WeatherSource>,
    cache: Option<SnapshotCache>,
    references: ReferenceSet,
    radii: ThreatRadii,
    analyzer: TimelineAnalyzer,
    flight: TargetEvent,
    appointment: TargetEvent,
    monitored_locations: Vec<String>,
    horizon_hours: f64,
    interval: Duration,
}

impl TyphoonMonitor {
    pub fn new(
        config: &MonitorConfig,
        source: Box<dyn WeatherSource>,
        cache: Option<SnapshotCache>,
    ) -> Result<Self> {
        let [flight, appointment]: [TargetEvent; 2] = config
            .targets()?
            .try_into()
            .map_err(|_| MonitorError::config("expected a flight and an appointment target"))?;

        Ok(Self {
            source,
            cache,
            references: config.reference_set()?,
            radii: config.threat_radii()?,
            analyzer: config.timeline_analyzer(),
            flight,
            appointment,
            monitored_locations: config.cwa.monitor_locations.clone(),
            horizon_hours: config.monitoring.forecast_horizon_hours,
            interval: config.check_interval(),
        })
    }

    /// Fetch all datasets concurrently. Never fails: a failed fetch is
    /// replaced by the cached payload, or an empty one.
    #[instrument(skip(self))]
    pub async fn fetch_snapshot(&self) -> Snapshot {
        let (typhoons, alerts, forecast) = futures::join!(
            self.source.fetch_typhoons(),
            self.source.fetch_alerts(),
            self.source.fetch_forecast(),
        );

        Snapshot {
            taken_at: Some(taipei_now()),
            typhoons: self.mask_failure(TYPHOON_KEY, typhoons).await,
            alerts: self.mask_failure(ALERTS_KEY, alerts).await,
            forecast: self.mask_failure(FORECAST_KEY, forecast).await,
        }
    }

    async fn mask_failure<T>(&self, key: &str, fetched: anyhow::Result<T>) -> T
    where
        T: Serialize + DeserializeOwned + Default,
    {
        match fetched {
            Ok(payload) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.put_json(key, &payload).await {
                        warn!(key, error = %e, "failed to store last known good payload");
                    }
                }
                payload
            }
            Err(e) => {
                warn!(key, error = %e, "fetch failed, falling back to last known good payload");
                let Some(cache) = &self.cache else {
                    return T::default();
                };
                match cache.get_json(key).await {
                    Ok(Some(payload)) => payload,
                    Ok(None) => {
                        warn!(key, "no cached payload available");
                        T::default()
                    }
                    Err(e) => {
                        warn!(key, error = %e, "cache read failed");
                        T::default()
                    }
                }
            }
        }
    }

    /// Grade a snapshot. Pure: equal inputs give equal reports.
    #[must_use]
    pub fn evaluate(&self, snapshot: &Snapshot, now: DateTime<FixedOffset>) -> MonitorReport {
        let engine = RiskFusionEngine::new(snapshot.taken_at.unwrap_or(now));
        let storms = snapshot.typhoons.storms();
        let targets = [self.flight.clone(), self.appointment.clone()];

        let mut warnings = alert_warnings(&snapshot.alerts, &self.monitored_locations);
        warnings.extend(storm_warnings(
            &storms,
            &StormWarningContext {
                references: &self.references,
                radii: &self.radii,
                analyzer: &self.analyzer,
                engine: &engine,
                targets: &targets,
                horizon_hours: self.horizon_hours,
            },
        ));
        warnings.extend(forecast_warnings(&snapshot.forecast, &self.monitored_locations));

        let ctx = ThreatContext {
            radii: &self.radii,
            analyzer: &self.analyzer,
            engine: &engine,
        };
        let flight = assess_target(&self.flight, &storms, &warnings, &ctx);
        let appointment = assess_target(&self.appointment, &storms, &warnings, &ctx);

        let regional = storms
            .iter()
            .filter_map(|storm| {
                storm.current_fix().map(|fix| StormSummary {
                    name: storm.name.clone(),
                    position: fix.position,
                    max_wind_speed_ms: fix.max_wind_speed_ms,
                    assessment: regional::classify(&fix.position, &self.references, &self.radii),
                })
            })
            .collect();

        let status = if warnings.is_empty() {
            Status::Safe
        } else {
            Status::Danger
        };

        info!(
            %status,
            warnings = warnings.len(),
            storms = storms.len(),
            flight = ?flight.grade.level,
            appointment = ?appointment.grade.level,
            "monitoring cycle evaluated"
        );

        MonitorReport {
            timestamp: now,
            warnings,
            status,
            flight,
            appointment,
            regional,
        }
    }

    /// One full cycle: fetch, mask failures, evaluate
    pub async fn check_all_conditions(&self) -> MonitorReport {
        let snapshot = self.fetch_snapshot().await;
        self.evaluate(&snapshot, taipei_now())
    }

    /// Repeat the cycle on the configured interval. The first cycle runs
    /// immediately; `max_cycles` of `None` runs until the task is dropped.
    pub async fn run<F>(&self, max_cycles: Option<u64>, mut on_report: F)
    where
        F: FnMut(&MonitorReport),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut completed = 0u64;

        info!(interval_seconds = self.interval.as_secs(), "starting monitoring loop");
        loop {
            ticker.tick().await;
            let report = self.check_all_conditions().await;
            on_report(&report);

            completed += 1;
            if max_cycles.is_some_and(|max| completed >= max) {
                break;
            }
        }
    }
}
