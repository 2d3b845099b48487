use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::strength;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPairCorrelation {
    pub metric_a: String,
    pub metric_b: String,
    pub coefficient: f64,
    pub strength: &'static str,
}

/// Pearson coefficient in centered-mean form.
///
/// Zero variance in either series yields `0.0` rather than an error, so a flat
/// metric still produces a reportable (if uninformative) pair. Mismatched or
/// empty inputs also yield `0.0`.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;
    for (xv, yv) in x.iter().zip(y.iter()) {
        let dx = xv - mean_x;
        let dy = yv - mean_y;
        numerator += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }

    let denom_x = sum_sq_x.sqrt();
    let denom_y = sum_sq_y.sqrt();
    if denom_x == 0.0 || denom_y == 0.0 {
        return 0.0;
    }
    numerator / (denom_x * denom_y)
}

/// Correlates every unordered pair of requested metrics over the hour buckets
/// both sides share. Pairs with fewer than two common buckets are skipped
/// outright, as is any pair involving a metric that produced no aligned series.
pub fn pairwise_correlations(
    metric_names: &[String],
    aligned: &HashMap<String, BTreeMap<DateTime<Utc>, f64>>,
) -> Vec<MetricPairCorrelation> {
    let mut pairs = Vec::new();
    for i in 0..metric_names.len() {
        for j in (i + 1)..metric_names.len() {
            let name_a = &metric_names[i];
            let name_b = &metric_names[j];
            let Some(series_a) = aligned.get(name_a) else {
                continue;
            };
            let Some(series_b) = aligned.get(name_b) else {
                continue;
            };
            let common: Vec<DateTime<Utc>> = series_a
                .keys()
                .filter(|bucket| series_b.contains_key(*bucket))
                .copied()
                .collect();
            if common.len() < 2 {
                continue;
            }
            let xs: Vec<f64> = common.iter().map(|bucket| series_a[bucket]).collect();
            let ys: Vec<f64> = common.iter().map(|bucket| series_b[bucket]).collect();
            let coefficient = pearson(&xs, &ys);
            pairs.push(MetricPairCorrelation {
                metric_a: name_a.clone(),
                metric_b: name_b.clone(),
                coefficient,
                strength: strength::strength_detailed(coefficient.abs()),
            });
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(&str, f64)]) -> BTreeMap<DateTime<Utc>, f64> {
        points
            .iter()
            .map(|(ts, v)| (ts.parse().expect("test timestamp"), *v))
            .collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identical_series_correlate_at_one() {
        let x = [10.0, 12.0, 14.0, 11.0];
        let r = pearson(&x, &x);
        assert!((r - 1.0).abs() < 1e-12);
        assert_eq!(strength::strength_detailed(r.abs()), "Very Strong");
        assert_eq!(strength::direction(r), "Positive");
    }

    #[test]
    fn inverse_series_correlate_at_minus_one() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [4.0, 3.0, 2.0, 1.0];
        let r = pearson(&x, &y);
        assert!((r + 1.0).abs() < 1e-12);
        assert_eq!(strength::direction(r), "Negative");
    }

    #[test]
    fn pearson_is_symmetric() {
        let x = [10.0, 12.0, 14.0, 11.0];
        let y = [60.0, 65.0, 70.0, 62.0];
        assert_eq!(pearson(&x, &y), pearson(&y, &x));
    }

    #[test]
    fn coefficient_stays_in_range() {
        let x = [5.0, 9.0, 2.0, 7.0, 4.0];
        let y = [1.0, 8.0, 3.0, 6.0, 2.0];
        let r = pearson(&x, &y);
        assert!(r.abs() <= 1.0 + 1e-12);
    }

    #[test]
    fn zero_variance_yields_zero_not_error() {
        let flat = [5.0, 5.0, 5.0];
        let moving = [1.0, 2.0, 3.0];
        assert_eq!(pearson(&flat, &moving), 0.0);
        assert_eq!(pearson(&moving, &flat), 0.0);
    }

    #[test]
    fn mismatched_or_empty_inputs_yield_zero() {
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(pearson(&[], &[]), 0.0);
    }

    #[test]
    fn pairs_cover_each_unordered_combination_in_request_order() {
        let aligned = HashMap::from([
            (
                "a".to_string(),
                series(&[
                    ("2024-03-04T10:00:00Z", 1.0),
                    ("2024-03-04T11:00:00Z", 2.0),
                ]),
            ),
            (
                "b".to_string(),
                series(&[
                    ("2024-03-04T10:00:00Z", 2.0),
                    ("2024-03-04T11:00:00Z", 4.0),
                ]),
            ),
            (
                "c".to_string(),
                series(&[
                    ("2024-03-04T10:00:00Z", 9.0),
                    ("2024-03-04T11:00:00Z", 3.0),
                ]),
            ),
        ]);
        let pairs = pairwise_correlations(&names(&["a", "b", "c"]), &aligned);
        let labels: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.metric_a.as_str(), p.metric_b.as_str()))
            .collect();
        assert_eq!(labels, vec![("a", "b"), ("a", "c"), ("b", "c")]);
    }

    #[test]
    fn pair_with_fewer_than_two_common_buckets_is_omitted() {
        let aligned = HashMap::from([
            (
                "a".to_string(),
                series(&[
                    ("2024-03-04T10:00:00Z", 1.0),
                    ("2024-03-04T11:00:00Z", 2.0),
                ]),
            ),
            (
                "b".to_string(),
                series(&[
                    ("2024-03-04T11:00:00Z", 4.0),
                    ("2024-03-04T12:00:00Z", 5.0),
                ]),
            ),
        ]);
        let pairs = pairwise_correlations(&names(&["a", "b"]), &aligned);
        assert!(pairs.is_empty());
    }

    #[test]
    fn pair_with_a_missing_metric_is_omitted() {
        let aligned = HashMap::from([(
            "a".to_string(),
            series(&[
                ("2024-03-04T10:00:00Z", 1.0),
                ("2024-03-04T11:00:00Z", 2.0),
            ]),
        )]);
        let pairs = pairwise_correlations(&names(&["a", "missing"]), &aligned);
        assert!(pairs.is_empty());
    }

    #[test]
    fn flat_pair_is_emitted_with_zero_coefficient() {
        let aligned = HashMap::from([
            (
                "a".to_string(),
                series(&[
                    ("2024-03-04T10:00:00Z", 5.0),
                    ("2024-03-04T11:00:00Z", 5.0),
                ]),
            ),
            (
                "b".to_string(),
                series(&[
                    ("2024-03-04T10:00:00Z", 1.0),
                    ("2024-03-04T11:00:00Z", 2.0),
                ]),
            ),
        ]);
        let pairs = pairwise_correlations(&names(&["a", "b"]), &aligned);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].coefficient, 0.0);
        assert_eq!(pairs[0].strength, "Very Weak");
    }
}
