use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Restaurant {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MetricSample {
    pub metric_name: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: Option<String>,
}

/// One metric averaged over one UTC calendar day, used by the coverage summary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyMetricPoint {
    pub metric_name: String,
    pub day: NaiveDate,
    pub value: f64,
}

pub async fn find_restaurant(db: &PgPool, restaurant_id: i32) -> Result<Option<Restaurant>> {
    let row: Option<Restaurant> = sqlx::query_as(
        r#"
        SELECT id, name
        FROM restaurants
        WHERE id = $1
        "#,
    )
    .bind(restaurant_id)
    .fetch_optional(db)
    .await
    .with_context(|| format!("failed to load restaurant {restaurant_id}"))?;
    Ok(row)
}

pub async fn fetch_metric_samples(
    db: &PgPool,
    restaurant_id: i32,
    metric_names: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<MetricSample>> {
    let rows: Vec<MetricSample> = sqlx::query_as(
        r#"
        SELECT metric_name, timestamp, value::double precision AS value, unit
        FROM metric_values
        WHERE restaurant_id = $1
          AND metric_name = ANY($2)
          AND timestamp >= $3
          AND timestamp <= $4
        "#,
    )
    .bind(restaurant_id)
    .bind(metric_names)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
    .with_context(|| format!("failed to load metric samples for restaurant {restaurant_id}"))?;
    Ok(rows)
}

pub async fn revenue_points_since(
    db: &PgPool,
    restaurant_id: i32,
    since: DateTime<Utc>,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM revenues
        WHERE restaurant_id = $1
          AND created_at >= $2
        "#,
    )
    .bind(restaurant_id)
    .bind(since)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to count revenue points for restaurant {restaurant_id}"))?;
    Ok(count)
}

pub async fn daily_metric_points_since(
    db: &PgPool,
    restaurant_id: i32,
    since: DateTime<Utc>,
) -> Result<Vec<DailyMetricPoint>> {
    let rows: Vec<DailyMetricPoint> = sqlx::query_as(
        r#"
        SELECT metric_name,
               (timestamp AT TIME ZONE 'UTC')::date AS day,
               AVG(value::double precision) AS value
        FROM metric_values
        WHERE restaurant_id = $1
          AND timestamp >= $2
        GROUP BY metric_name, (timestamp AT TIME ZONE 'UTC')::date
        ORDER BY metric_name, day
        "#,
    )
    .bind(restaurant_id)
    .bind(since)
    .fetch_all(db)
    .await
    .with_context(|| format!("failed to load daily metric points for restaurant {restaurant_id}"))?;
    Ok(rows)
}
