pub mod align;
pub mod pearson;
pub mod present;
pub mod strength;

use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::error::{AnalysisError, AnalysisResult};
use crate::services::stats_api::CORRELATION_METHOD_PEARSON;
use crate::services::store;
use crate::state::AppState;

pub use pearson::MetricPairCorrelation;
pub use present::{CorrelationAnalysis, RankedCorrelation};

#[derive(Debug, Clone)]
pub struct CorrelationRequest {
    pub restaurant_id: i32,
    pub metric_names: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    pub restaurant_id: i32,
    pub restaurant_name: String,
    pub revenue_points: i64,
    pub metric_points: i64,
    pub available_metrics: Vec<String>,
    pub data_quality: &'static str,
    pub data_period: String,
}

async fn require_restaurant(
    db: &PgPool,
    restaurant_id: i32,
) -> AnalysisResult<store::Restaurant> {
    let restaurant = store::find_restaurant(db, restaurant_id)
        .await
        .map_err(crate::error::internal_error)?;
    restaurant.ok_or_else(|| {
        AnalysisError::not_found(format!("Restaurant with ID {restaurant_id} not found"))
    })
}

/// Local correlation path: loads raw samples for the requested window, aligns
/// them into hourly buckets, and correlates every pair of requested metrics.
/// Validation happens before any database work.
pub async fn analyze_metric_correlations(
    state: &AppState,
    request: &CorrelationRequest,
    cancel: &CancellationToken,
) -> AnalysisResult<Vec<MetricPairCorrelation>> {
    if request.metric_names.len() < 2 {
        return Err(AnalysisError::validation(
            "At least two metrics are required for correlation analysis.",
        ));
    }
    if cancel.is_cancelled() {
        return Err(AnalysisError::Canceled);
    }

    let started = Instant::now();
    let samples = tokio::select! {
        _ = cancel.cancelled() => return Err(AnalysisError::Canceled),
        result = store::fetch_metric_samples(
            &state.db,
            request.restaurant_id,
            &request.metric_names,
            request.start,
            request.end,
        ) => result.map_err(crate::error::internal_error)?,
    };
    tracing::debug!(
        restaurant_id = request.restaurant_id,
        phase = "fetch",
        samples = samples.len(),
        "loaded metric samples"
    );

    let aligned = align::align_hourly(&samples);
    let pairs = pearson::pairwise_correlations(&request.metric_names, &aligned);
    tracing::info!(
        restaurant_id = request.restaurant_id,
        phase = "correlate",
        metric_count = request.metric_names.len(),
        pair_count = pairs.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "pairwise correlation complete"
    );
    Ok(pairs)
}

/// Remote significance path: verifies the restaurant, asks the statistics
/// service for revenue correlations with p-values, and ranks the result for
/// display. Fails whole; there is no partial analysis.
pub async fn analyze_significant_correlations(
    state: &AppState,
    restaurant_id: i32,
    cancel: &CancellationToken,
) -> AnalysisResult<CorrelationAnalysis> {
    if cancel.is_cancelled() {
        return Err(AnalysisError::Canceled);
    }
    let restaurant = tokio::select! {
        _ = cancel.cancelled() => return Err(AnalysisError::Canceled),
        result = require_restaurant(&state.db, restaurant_id) => result?,
    };

    let payload = state
        .stats_api
        .fetch_correlations(restaurant_id, cancel)
        .await?;
    let correlations = present::rank_correlations(&payload.correlations);
    tracing::info!(
        restaurant_id,
        significant = correlations.iter().filter(|c| c.is_significant).count(),
        total = correlations.len(),
        "significant correlation analysis complete"
    );

    Ok(CorrelationAnalysis {
        restaurant_id,
        restaurant_name: restaurant.name,
        analysis_date: Utc::now(),
        correlation_type: payload
            .correlation_type
            .unwrap_or_else(|| CORRELATION_METHOD_PEARSON.to_string()),
        correlations,
    })
}

fn coverage_quality(revenue_points: i64, metric_points: i64) -> &'static str {
    if revenue_points > 30 && metric_points > 100 {
        "Good"
    } else {
        "Limited"
    }
}

/// Reports how much usable history a restaurant has in the trailing window:
/// raw revenue rows plus per-day-averaged metric points, the same reduction
/// the statistics service applies before correlating.
pub async fn summarize_data_coverage(
    state: &AppState,
    restaurant_id: i32,
    days: u32,
) -> AnalysisResult<CoverageSummary> {
    let restaurant = require_restaurant(&state.db, restaurant_id).await?;
    let since = Utc::now() - Duration::days(i64::from(days));

    let revenue_points = store::revenue_points_since(&state.db, restaurant_id, since)
        .await
        .map_err(crate::error::internal_error)?;
    let daily = store::daily_metric_points_since(&state.db, restaurant_id, since)
        .await
        .map_err(crate::error::internal_error)?;

    let metric_points = daily.len() as i64;
    let mut available_metrics: Vec<String> = daily.into_iter().map(|p| p.metric_name).collect();
    available_metrics.sort();
    available_metrics.dedup();

    Ok(CoverageSummary {
        restaurant_id,
        restaurant_name: restaurant.name,
        revenue_points,
        metric_points,
        available_metrics,
        data_quality: coverage_quality(revenue_points, metric_points),
        data_period: format!("{days} days"),
    })
}
