use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{AnalysisError, AnalysisResult};

pub const CORRELATION_METHOD_PEARSON: &str = "pearson";

/// Metric set the statistics service correlates against revenue. The service
/// owns the revenue series; callers only pick the restaurant.
pub const CORRELATION_METRICS: [&str; 5] = [
    "prep_time",
    "table_turnover",
    "order_accuracy",
    "customer_satisfaction",
    "wait_time",
];

pub const DEFAULT_FORECAST_DAYS: u32 = 30;

/// Client for the remote statistics service. One attempt per call, a hard
/// per-request timeout, and no retry; a slow or broken service degrades to
/// `ServiceUnavailable` instead of stalling the caller.
#[derive(Clone)]
pub struct StatsApiClient {
    base_url: String,
    timeout: Duration,
    http: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CorrelationApiRequest {
    restaurant_id: i32,
    metrics: Vec<String>,
    correlation_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForecastApiRequest {
    restaurant_id: i32,
    days_to_forecast: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCorrelation {
    pub metric_name: String,
    pub coefficient: f64,
    pub p_value: f64,
}

/// A response without a `correlations` array is a decode failure, not an
/// empty success.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationApiResponse {
    pub correlations: Vec<MetricCorrelation>,
    pub analysis_date: Option<String>,
    pub correlation_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub date: String,
    pub predicted_revenue: f64,
    #[serde(default)]
    pub lower_bound: f64,
    #[serde(default)]
    pub upper_bound: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastApiResponse {
    pub forecast: Vec<ForecastPoint>,
    #[serde(default = "default_confidence_interval")]
    pub confidence_interval: f64,
    pub model: Option<String>,
}

fn default_confidence_interval() -> f64 {
    0.95
}

impl StatsApiClient {
    pub fn new(base_url: String, timeout_seconds: u64, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_seconds.max(1)),
            http,
        }
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("{url} returned HTTP {status}: {body}");
        }
        response
            .json()
            .await
            .with_context(|| format!("failed to decode response from {url}"))
    }

    pub async fn fetch_correlations(
        &self,
        restaurant_id: i32,
        cancel: &CancellationToken,
    ) -> AnalysisResult<CorrelationApiResponse> {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Canceled);
        }
        let request = CorrelationApiRequest {
            restaurant_id,
            metrics: CORRELATION_METRICS.iter().map(|m| m.to_string()).collect(),
            correlation_type: CORRELATION_METHOD_PEARSON.to_string(),
        };
        let started = Instant::now();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(AnalysisError::Canceled),
            outcome = self.post_json::<_, CorrelationApiResponse>("/analytics/correlation", &request) => outcome,
        };
        match outcome {
            Ok(payload) => {
                tracing::info!(
                    restaurant_id,
                    entries = payload.correlations.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "correlation fetch complete"
                );
                Ok(payload)
            }
            Err(err) => {
                tracing::warn!(restaurant_id, "correlation fetch failed: {err:#}");
                Err(AnalysisError::service_unavailable(format!(
                    "Analytics service unavailable: {err:#}"
                )))
            }
        }
    }

    pub async fn fetch_forecast(
        &self,
        restaurant_id: i32,
        days_to_forecast: u32,
        cancel: &CancellationToken,
    ) -> AnalysisResult<ForecastApiResponse> {
        if cancel.is_cancelled() {
            return Err(AnalysisError::Canceled);
        }
        let request = ForecastApiRequest {
            restaurant_id,
            days_to_forecast,
        };
        let started = Instant::now();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(AnalysisError::Canceled),
            outcome = self.post_json::<_, ForecastApiResponse>("/analytics/forecast", &request) => outcome,
        };
        match outcome {
            Ok(payload) => {
                tracing::info!(
                    restaurant_id,
                    points = payload.forecast.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "forecast fetch complete"
                );
                Ok(payload)
            }
            Err(err) => {
                tracing::warn!(restaurant_id, "forecast fetch failed: {err:#}");
                Err(AnalysisError::service_unavailable(format!(
                    "Forecast service unavailable: {err:#}"
                )))
            }
        }
    }

    /// Liveness probe. Any transport failure reads as unhealthy rather than
    /// an error.
    pub async fn is_healthy(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).timeout(self.timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!("stats service health probe failed: {err:#}");
                false
            }
        }
    }
}
