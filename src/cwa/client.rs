//! HTTP client for the CWA open-data API

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::records::{AlertPayload, ForecastPayload, TyphoonPayload};
use crate::MonitorError;
use crate::config::CwaConfig;

pub const TYPHOON_DATASET: &str = "W-C0034-005";
pub const ALERTS_DATASET: &str = "W-C0033-001";
pub const FORECAST_DATASET: &str = "F-C0032-001";

/// Source of the three datasets one monitoring cycle needs
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_typhoons(&self) -> Result<TyphoonPayload>;

    async fn fetch_alerts(&self) -> Result<AlertPayload>;

    async fn fetch_forecast(&self) -> Result<ForecastPayload>;
}

/// CWA open-data client with transient-failure retries
pub struct CwaClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    locations: Vec<String>,
}

impl CwaClient {
    pub fn new(config: &CwaConfig) -> Result<Self> {
        if !config.verify_ssl {
            warn!("TLS certificate verification is disabled for CWA requests");
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("typhoon-monitor/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            locations: config.monitor_locations.clone(),
        })
    }

    fn dataset_url(&self, dataset: &str, with_locations: bool) -> Result<reqwest::Url> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MonitorError::config("CWA API key is not configured"))?;

        let mut params = vec![
            ("Authorization", api_key.to_string()),
            ("format", "JSON".to_string()),
        ];
        if with_locations && !self.locations.is_empty() {
            params.push(("locationName", self.locations.join(",")));
        }

        let endpoint = format!("{}/v1/rest/datastore/{dataset}", self.base_url);
        reqwest::Url::parse_with_params(&endpoint, &params)
            .with_context(|| format!("Invalid CWA endpoint {endpoint}"))
    }

    #[instrument(skip(self))]
    async fn fetch<T: DeserializeOwned>(&self, dataset: &str, with_locations: bool) -> Result<T> {
        let url = self.dataset_url(dataset, with_locations)?;
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MonitorError::api(format!("{dataset} request failed: {e}")))?;

        let status = response.status();
        debug!(%status, "CWA response received");
        if !status.is_success() {
            return Err(MonitorError::api(format!("{dataset} returned HTTP {status}")).into());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MonitorError::api(format!("{dataset} returned unreadable JSON: {e}")))?;

        if body.get("success").and_then(Value::as_str) == Some("false") {
            return Err(MonitorError::api(format!("{dataset} reported success=false")).into());
        }

        let payload = serde_json::from_value(body)
            .map_err(|e| MonitorError::parse(format!("{dataset}: {e}")))?;

        info!(
            "Fetched {} in {:.3}s",
            dataset,
            started.elapsed().as_secs_f64()
        );
        Ok(payload)
    }
}

#[async_trait]
impl WeatherSource for CwaClient {
    async fn fetch_typhoons(&self) -> Result<TyphoonPayload> {
        self.fetch(TYPHOON_DATASET, false).await
    }

    async fn fetch_alerts(&self) -> Result<AlertPayload> {
        self.fetch(ALERTS_DATASET, true).await
    }

    async fn fetch_forecast(&self) -> Result<ForecastPayload> {
        self.fetch(FORECAST_DATASET, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> CwaConfig {
        CwaConfig {
            api_key: api_key.map(str::to_string),
            ..CwaConfig::default()
        }
    }

    #[test]
    fn test_dataset_url_with_locations() {
        let client = CwaClient::new(&config(Some("CWA-TEST-KEY"))).unwrap();
        let url = client.dataset_url(ALERTS_DATASET, true).unwrap();

        assert_eq!(url.path(), "/api/v1/rest/datastore/W-C0033-001");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("Authorization".to_string(), "CWA-TEST-KEY".to_string())));
        assert!(query.contains(&("format".to_string(), "JSON".to_string())));
        assert!(query.contains(&("locationName".to_string(), "金門縣,臺南市".to_string())));
    }

    #[test]
    fn test_typhoon_url_has_no_location_filter() {
        let client = CwaClient::new(&config(Some("k"))).unwrap();
        let url = client.dataset_url(TYPHOON_DATASET, false).unwrap();
        assert!(!url.query_pairs().any(|(k, _)| k == "locationName"));
    }

    #[test]
    fn test_missing_api_key() {
        let client = CwaClient::new(&config(None)).unwrap();
        let err = client.dataset_url(TYPHOON_DATASET, false).unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}
