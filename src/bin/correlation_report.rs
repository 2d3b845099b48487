use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;

use resto_analytics::config::AnalyticsConfig;
use resto_analytics::error::{AnalysisError, AnalysisResult};
use resto_analytics::services::analysis::{self, CorrelationRequest};
use resto_analytics::services::stats_api::DEFAULT_FORECAST_DAYS;
use resto_analytics::state::AppState;

const DEFAULT_METRICS: &str = "prep_time,table_turnover,order_accuracy,customer_satisfaction,wait_time";
const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, ValueEnum)]
#[clap(rename_all = "snake_case")]
enum ReportMode {
    /// Correlate the requested metrics against each other from stored samples.
    Pairwise,
    /// Ask the statistics service for revenue correlations with p-values.
    Significance,
    /// Summarize how much usable history the restaurant has on record.
    Coverage,
    /// Fetch a revenue forecast from the statistics service.
    Forecast,
    /// Probe the database and the statistics service.
    Health,
}

#[derive(Debug, Parser)]
#[command(about = "Run restaurant correlation analyses against a live database and statistics service.")]
struct Args {
    /// Report to produce.
    #[arg(long, value_enum, default_value_t = ReportMode::Pairwise)]
    mode: ReportMode,

    /// Restaurant to analyze (required for every mode except health).
    #[arg(long)]
    restaurant_id: Option<i32>,

    /// Postgres connection string (overrides RESTO_DATABASE_URL).
    #[arg(long)]
    database_url: Option<String>,

    /// Statistics service base URL (overrides RESTO_STATS_API_BASE_URL).
    #[arg(long)]
    stats_api_base_url: Option<String>,

    /// Comma-separated metric names for the pairwise mode.
    #[arg(long, default_value = DEFAULT_METRICS)]
    metrics: String,

    /// Window start (RFC 3339) for the pairwise mode; defaults to 30 days before the end.
    #[arg(long)]
    start: Option<String>,

    /// Window end (RFC 3339) for the pairwise mode; defaults to now.
    #[arg(long)]
    end: Option<String>,

    /// Trailing window in days for the coverage mode (overrides RESTO_COVERAGE_WINDOW_DAYS).
    #[arg(long)]
    days: Option<u32>,

    /// Forecast horizon in days for the forecast mode.
    #[arg(long, default_value_t = DEFAULT_FORECAST_DAYS)]
    forecast_days: u32,

    /// Emit JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn parse_rfc3339_ts(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid RFC3339 timestamp: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn parse_metric_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Unwraps an analysis outcome, treating cancellation as a clean stop rather
/// than a failure.
fn finish<T>(outcome: AnalysisResult<T>) -> Result<Option<T>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(AnalysisError::Canceled) => {
            eprintln!("analysis canceled");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn require_restaurant_id(args: &Args) -> Result<i32> {
    args.restaurant_id
        .context("--restaurant-id is required for this mode")
}

async fn run_pairwise(state: &AppState, args: &Args, cancel: &CancellationToken) -> Result<()> {
    let restaurant_id = require_restaurant_id(args)?;
    let metric_names = parse_metric_list(&args.metrics);

    let end = match args.end.as_deref() {
        Some(raw) => parse_rfc3339_ts(raw)?,
        None => Utc::now(),
    };
    let start = match args.start.as_deref() {
        Some(raw) => parse_rfc3339_ts(raw)?,
        None => end - Duration::days(DEFAULT_WINDOW_DAYS),
    };
    if end <= start {
        bail!("--end must be after --start");
    }

    let request = CorrelationRequest {
        restaurant_id,
        metric_names,
        start,
        end,
    };
    let Some(pairs) = finish(analysis::analyze_metric_correlations(state, &request, cancel).await)?
    else {
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&pairs)?);
        return Ok(());
    }
    if pairs.is_empty() {
        println!("No metric pairs shared enough aligned history to correlate.");
        return Ok(());
    }
    println!(
        "{:<24} {:<24} {:>12} {:<12}",
        "metric a", "metric b", "coefficient", "strength"
    );
    for pair in &pairs {
        println!(
            "{:<24} {:<24} {:>12.3} {:<12}",
            pair.metric_a, pair.metric_b, pair.coefficient, pair.strength
        );
    }
    Ok(())
}

async fn run_significance(state: &AppState, args: &Args, cancel: &CancellationToken) -> Result<()> {
    let restaurant_id = require_restaurant_id(args)?;
    let Some(report) =
        finish(analysis::analyze_significant_correlations(state, restaurant_id, cancel).await)?
    else {
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "Restaurant: {} (id {})",
        report.restaurant_name, report.restaurant_id
    );
    println!(
        "Method: {}  Analyzed: {}",
        report.correlation_type,
        report.analysis_date.to_rfc3339()
    );
    println!();
    println!(
        "{:<24} {:>12} {:>10} {:>6} {:<10} {:<10}",
        "metric", "coefficient", "p-value", "sig", "strength", "direction"
    );
    for row in &report.correlations {
        println!(
            "{:<24} {:>12.3} {:>10.4} {:>6} {:<10} {:<10}",
            row.display_name,
            row.coefficient,
            row.p_value,
            if row.is_significant { "yes" } else { "no" },
            row.strength,
            row.direction
        );
    }
    println!();
    for row in &report.correlations {
        println!("- {}", row.interpretation);
    }
    Ok(())
}

async fn run_coverage(state: &AppState, args: &Args) -> Result<()> {
    let restaurant_id = require_restaurant_id(args)?;
    let days = args.days.unwrap_or(state.config.coverage_window_days);
    let summary = analysis::summarize_data_coverage(state, restaurant_id, days).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!(
        "Restaurant: {} (id {})",
        summary.restaurant_name, summary.restaurant_id
    );
    println!("Window: {}", summary.data_period);
    println!("Revenue points: {}", summary.revenue_points);
    println!("Metric points (daily): {}", summary.metric_points);
    if summary.available_metrics.is_empty() {
        println!("Metrics seen: none");
    } else {
        println!("Metrics seen: {}", summary.available_metrics.join(", "));
    }
    println!("Data quality: {}", summary.data_quality);
    Ok(())
}

async fn run_forecast(state: &AppState, args: &Args, cancel: &CancellationToken) -> Result<()> {
    let restaurant_id = require_restaurant_id(args)?;
    let Some(forecast) = finish(
        state
            .stats_api
            .fetch_forecast(restaurant_id, args.forecast_days, cancel)
            .await,
    )?
    else {
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
        return Ok(());
    }
    println!(
        "Model: {}  Confidence interval: {}",
        forecast.model.as_deref().unwrap_or("unknown"),
        forecast.confidence_interval
    );
    println!(
        "{:<12} {:>14} {:>12} {:>12}",
        "date", "predicted", "low", "high"
    );
    for point in &forecast.forecast {
        println!(
            "{:<12} {:>14.2} {:>12.2} {:>12.2}",
            point.date, point.predicted_revenue, point.lower_bound, point.upper_bound
        );
    }
    Ok(())
}

async fn run_health(state: &AppState, args: &Args) -> Result<()> {
    let db_ok = match resto_analytics::db::ping(&state.db).await {
        Ok(()) => true,
        Err(err) => {
            eprintln!("database ping failed: {err:#}");
            false
        }
    };
    let stats_ok = state.stats_api.is_healthy().await;

    if args.json {
        println!(
            "{}",
            serde_json::json!({ "database": db_ok, "statsService": stats_ok })
        );
    } else {
        println!("database:      {}", if db_ok { "ok" } else { "unreachable" });
        println!("stats service: {}", if stats_ok { "ok" } else { "unreachable" });
    }
    if !(db_ok && stats_ok) {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config =
        AnalyticsConfig::from_env(args.database_url.clone(), args.stats_api_base_url.clone())?;
    let state = AppState::new(config)?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    match args.mode {
        ReportMode::Pairwise => run_pairwise(&state, &args, &cancel).await,
        ReportMode::Significance => run_significance(&state, &args, &cancel).await,
        ReportMode::Coverage => run_coverage(&state, &args).await,
        ReportMode::Forecast => run_forecast(&state, &args, &cancel).await,
        ReportMode::Health => run_health(&state, &args).await,
    }
}
