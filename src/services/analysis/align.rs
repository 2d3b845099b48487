use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Timelike, Utc};

use crate::services::store::MetricSample;

pub fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Buckets raw samples into hourly series per metric, averaging duplicates that
/// land in the same hour. A metric with no samples produces no entry at all;
/// a missing key means "no data", which is not the same as a zero value.
pub fn align_hourly(samples: &[MetricSample]) -> HashMap<String, BTreeMap<DateTime<Utc>, f64>> {
    let mut accum: HashMap<String, BTreeMap<DateTime<Utc>, (f64, u32)>> = HashMap::new();
    for sample in samples {
        if !sample.value.is_finite() {
            continue;
        }
        let bucket = truncate_to_hour(sample.timestamp);
        let entry = accum
            .entry(sample.metric_name.clone())
            .or_default()
            .entry(bucket)
            .or_insert((0.0, 0));
        entry.0 += sample.value;
        entry.1 += 1;
    }

    accum
        .into_iter()
        .map(|(metric, buckets)| {
            let series: BTreeMap<DateTime<Utc>, f64> = buckets
                .into_iter()
                .map(|(bucket, (sum, count))| (bucket, sum / count as f64))
                .collect();
            (metric, series)
        })
        .collect()
}
