//! Central Weather Administration (CWA) data retrieval
//!
//! Wire records, the HTTP client and the flattened warning text.

pub mod client;
pub mod records;
pub mod warnings;

pub use client::{CwaClient, WeatherSource};
pub use records::{AlertPayload, ForecastPayload, TyphoonPayload};
pub use warnings::{StormWarningContext, alert_warnings, forecast_warnings, storm_warnings};
