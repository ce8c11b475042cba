//! Configuration management for the typhoon monitor
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::MonitorError;
use crate::models::{GeoPoint, ReferencePoint, ReferenceSet};
use crate::threat::{KeywordScope, TargetEvent, TargetKind, ThreatRadii, TimelineAnalyzer};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the typhoon monitor
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Central Weather Administration open-data API
    pub cwa: CwaConfig,
    /// Monitoring cycle settings
    pub monitoring: MonitoringConfig,
    /// Threat radii and timeline heuristics
    pub threat: ThreatConfig,
    /// Named reference points storms are measured against
    pub regions: Vec<RegionConfig>,
    /// The two graded events
    pub targets: TargetsConfig,
    /// Last-known-good snapshot cache
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// CWA API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CwaConfig {
    /// API authorization key (falls back to `CWA_API_KEY`)
    pub api_key: Option<String>,
    /// Base URL for the open-data API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    pub max_retries: u32,
    /// Verify TLS certificates
    pub verify_ssl: bool,
    /// County names whose alerts and forecasts are monitored
    pub monitor_locations: Vec<String>,
}

/// Monitoring cycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Seconds between monitoring cycles
    pub check_interval_seconds: u64,
    /// Forecast fixes further ahead than this are not turned into warnings
    pub forecast_horizon_hours: f64,
}

/// Threat radii (km) and timeline heuristics (hours)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatConfig {
    pub direct_radius_km: f64,
    pub moderate_radius_km: f64,
    pub indirect_radius_km: f64,
    pub departure_extrapolation_hours: f64,
    pub near_miss_exposure_hours: f64,
}

/// One named reference point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Flight and appointment targets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    pub flight: TargetConfig,
    pub appointment: TargetConfig,
}

/// One graded event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub date: NaiveDate,
    /// Place name used in reports
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub scope: KeywordScope,
}

/// Snapshot cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the on-disk last-known-good cache
    pub enabled: bool,
    /// How long a stored payload may stand in for a failed fetch
    pub ttl_hours: u32,
    /// Cache directory location
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_cwa_base_url() -> String {
    "https://opendata.cwa.gov.tw/api".to_string()
}

fn default_cwa_timeout() -> u32 {
    30
}

fn default_cwa_max_retries() -> u32 {
    3
}

fn default_monitor_locations() -> Vec<String> {
    vec!["金門縣".to_string(), "臺南市".to_string()]
}

fn default_check_interval() -> u64 {
    300
}

fn default_forecast_horizon() -> f64 {
    72.0
}

fn default_regions() -> Vec<RegionConfig> {
    [
        ("台北", 25.0, 121.5),
        ("台中", 24.1, 120.7),
        ("台南", 23.0, 120.2),
        ("高雄", 22.6, 120.3),
        ("金門", 24.4, 118.3),
        ("澎湖", 23.6, 119.6),
    ]
    .into_iter()
    .map(|(name, latitude, longitude)| RegionConfig {
        name: name.to_string(),
        latitude,
        longitude,
    })
    .collect()
}

fn default_flight() -> TargetConfig {
    TargetConfig {
        name: "Kinmen flight".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 7, 6).unwrap_or_default(),
        location: "金門".to_string(),
        latitude: 24.4,
        longitude: 118.3,
        scope: KeywordScope::AnyLocation,
    }
}

fn default_appointment() -> TargetConfig {
    TargetConfig {
        name: "Tainan health checkup".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 7, 7).unwrap_or_default(),
        location: "台南".to_string(),
        latitude: 23.0,
        longitude: 120.2,
        scope: KeywordScope::Location(vec!["台南".to_string(), "臺南".to_string()]),
    }
}

fn default_cache_ttl() -> u32 {
    24
}

fn default_cache_location() -> String {
    "~/.cache/typhoon-monitor".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for CwaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_cwa_base_url(),
            timeout_seconds: default_cwa_timeout(),
            max_retries: default_cwa_max_retries(),
            verify_ssl: true,
            monitor_locations: default_monitor_locations(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: default_check_interval(),
            forecast_horizon_hours: default_forecast_horizon(),
        }
    }
}

impl Default for ThreatConfig {
    fn default() -> Self {
        let radii = ThreatRadii::default();
        let analyzer = TimelineAnalyzer::default();
        Self {
            direct_radius_km: radii.direct,
            moderate_radius_km: radii.moderate,
            indirect_radius_km: radii.indirect,
            departure_extrapolation_hours: analyzer.departure_extrapolation_hours,
            near_miss_exposure_hours: analyzer.near_miss_exposure_hours,
        }
    }
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            flight: default_flight(),
            appointment: default_appointment(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from `config_path`, else the user config dir, else
    /// `./config.toml`, then apply environment overrides
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|p| p.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. TYPHOON_CWA__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("TYPHOON")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: MonitorConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("typhoon-monitor").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.cwa.api_key.is_none() {
            self.cwa.api_key = std::env::var("CWA_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if self.cwa.base_url.is_empty() {
            self.cwa.base_url = default_cwa_base_url();
        }
        if self.cwa.timeout_seconds == 0 {
            self.cwa.timeout_seconds = default_cwa_timeout();
        }
        if self.cwa.monitor_locations.is_empty() {
            self.cwa.monitor_locations = default_monitor_locations();
        }
        if self.monitoring.check_interval_seconds == 0 {
            self.monitoring.check_interval_seconds = default_check_interval();
        }
        if self.monitoring.forecast_horizon_hours <= 0.0 {
            self.monitoring.forecast_horizon_hours = default_forecast_horizon();
        }
        if self.regions.is_empty() {
            self.regions = default_regions();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.reference_set()?;
        self.targets()?;
        Ok(())
    }

    /// Validate the API key if one is configured
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.cwa.api_key {
            if api_key.trim().is_empty() {
                return Err(MonitorError::config(
                    "CWA API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() > 100 {
                return Err(MonitorError::config(
                    "CWA API key appears to be invalid (too long). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.cwa.timeout_seconds > 300 {
            return Err(MonitorError::config("CWA API timeout cannot exceed 300 seconds").into());
        }

        if self.cwa.max_retries > 10 {
            return Err(MonitorError::config("CWA API max retries cannot exceed 10").into());
        }

        if self.monitoring.check_interval_seconds < 30 {
            return Err(
                MonitorError::config("Check interval must be at least 30 seconds").into(),
            );
        }

        if self.cache.ttl_hours > 168 {
            return Err(
                MonitorError::config("Cache TTL cannot exceed 168 hours (1 week)").into(),
            );
        }

        if self.threat.departure_extrapolation_hours < 0.0
            || self.threat.near_miss_exposure_hours < 0.0
        {
            return Err(
                MonitorError::config("Timeline heuristics cannot be negative").into(),
            );
        }

        self.threat_radii()?;

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(MonitorError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(MonitorError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.cwa.base_url.starts_with("http://") && !self.cwa.base_url.starts_with("https://") {
            return Err(
                MonitorError::config("CWA API base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        Ok(())
    }

    pub fn threat_radii(&self) -> crate::Result<ThreatRadii> {
        ThreatRadii::new(
            self.threat.direct_radius_km,
            self.threat.moderate_radius_km,
            self.threat.indirect_radius_km,
        )
        .map_err(|e| MonitorError::config(e.to_string()))
    }

    #[must_use]
    pub fn timeline_analyzer(&self) -> TimelineAnalyzer {
        TimelineAnalyzer {
            departure_extrapolation_hours: self.threat.departure_extrapolation_hours,
            near_miss_exposure_hours: self.threat.near_miss_exposure_hours,
        }
    }

    pub fn reference_set(&self) -> crate::Result<ReferenceSet> {
        let points = self
            .regions
            .iter()
            .map(|r| {
                GeoPoint::new(r.latitude, r.longitude)
                    .map(|position| ReferencePoint::new(r.name.clone(), position))
            })
            .collect::<crate::Result<Vec<_>>>()
            .map_err(|e| MonitorError::config(format!("region: {e}")))?;
        ReferenceSet::new(points).map_err(|e| MonitorError::config(e.to_string()))
    }

    /// Flight and appointment, in that order
    pub fn targets(&self) -> crate::Result<Vec<TargetEvent>> {
        [
            (TargetKind::Flight, &self.targets.flight),
            (TargetKind::Appointment, &self.targets.appointment),
        ]
        .into_iter()
        .map(|(kind, target)| {
            let position = GeoPoint::new(target.latitude, target.longitude)
                .map_err(|e| MonitorError::config(format!("{kind:?} target: {e}")))?;
            Ok(TargetEvent {
                kind,
                name: target.name.clone(),
                date: target.date,
                location: ReferencePoint::new(target.location.clone(), position),
                scope: target.scope.clone(),
            })
        })
        .collect()
    }

    /// Interval between monitoring cycles
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring.check_interval_seconds)
    }

    /// Cache directory with a leading `~` expanded
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        match self.cache.location.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(rest), |home| home.join(rest)),
            None => PathBuf::from(&self.cache.location),
        }
    }
}
