use chrono::{DateTime, Utc};
use serde::Serialize;

use super::strength;
use crate::services::stats_api::MetricCorrelation;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCorrelation {
    pub metric_name: String,
    pub display_name: String,
    pub coefficient: f64,
    pub p_value: f64,
    pub is_significant: bool,
    pub strength: &'static str,
    pub direction: &'static str,
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationAnalysis {
    pub restaurant_id: i32,
    pub restaurant_name: String,
    pub analysis_date: DateTime<Utc>,
    pub correlation_type: String,
    pub correlations: Vec<RankedCorrelation>,
}

/// Operator-facing name for a metric. Unknown metrics fall back to
/// title-cased words, so `avg_ticket_size` reads as `Avg Ticket Size`.
pub fn display_name(metric: &str) -> String {
    match metric {
        "prep_time" => "Kitchen Prep Time".to_string(),
        "table_turnover" => "Table Turnover Time".to_string(),
        "order_accuracy" => "Order Accuracy".to_string(),
        "customer_satisfaction" => "Customer Satisfaction".to_string(),
        "wait_time" => "Customer Wait Time".to_string(),
        other => title_case(&other.replace('_', " ")),
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn interpretation(metric_name: &str, coefficient: f64, p_value: f64) -> String {
    let verb = if coefficient > 0.0 {
        "increases"
    } else {
        "decreases"
    };
    let strength = strength::strength_coarse(coefficient.abs()).to_lowercase();
    let significance = if p_value < 0.05 {
        "significantly"
    } else {
        "not significantly"
    };
    format!(
        "Revenue {verb} with {} ({strength} correlation, {significance} correlated)",
        display_name(metric_name)
    )
}

/// Shapes service-computed correlations for display. Classification,
/// significance, and the interpretation sentence are derived from the raw
/// values; only the displayed coefficient (3 decimals) and p-value (4
/// decimals) are rounded. The result is ordered by descending magnitude of
/// the displayed coefficient, ties keeping their incoming order.
pub fn rank_correlations(raw: &[MetricCorrelation]) -> Vec<RankedCorrelation> {
    let mut ranked: Vec<RankedCorrelation> = raw
        .iter()
        .map(|c| RankedCorrelation {
            metric_name: c.metric_name.clone(),
            display_name: display_name(&c.metric_name),
            coefficient: round_to(c.coefficient, 3),
            p_value: round_to(c.p_value, 4),
            is_significant: c.p_value < 0.05,
            strength: strength::strength_coarse(c.coefficient.abs()),
            direction: strength::direction(c.coefficient),
            interpretation: interpretation(&c.metric_name, c.coefficient, c.p_value),
        })
        .collect();
    ranked.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlation(metric: &str, coefficient: f64, p_value: f64) -> MetricCorrelation {
        MetricCorrelation {
            metric_name: metric.to_string(),
            coefficient,
            p_value,
        }
    }

    #[test]
    fn known_metrics_use_the_display_map() {
        assert_eq!(display_name("prep_time"), "Kitchen Prep Time");
        assert_eq!(display_name("table_turnover"), "Table Turnover Time");
        assert_eq!(display_name("order_accuracy"), "Order Accuracy");
        assert_eq!(display_name("customer_satisfaction"), "Customer Satisfaction");
        assert_eq!(display_name("wait_time"), "Customer Wait Time");
    }

    #[test]
    fn unknown_metrics_fall_back_to_title_case() {
        assert_eq!(display_name("avg_ticket_size"), "Avg Ticket Size");
        assert_eq!(display_name("AVG_TICKET_SIZE"), "Avg Ticket Size");
    }

    #[test]
    fn displayed_values_are_rounded_to_fixed_widths() {
        let ranked = rank_correlations(&[correlation("prep_time", 0.123_456, 0.123_456_78)]);
        assert_eq!(ranked[0].coefficient, 0.123);
        assert_eq!(ranked[0].p_value, 0.1235);
    }

    #[test]
    fn significance_threshold_is_exclusive_at_p_05() {
        let ranked = rank_correlations(&[
            correlation("prep_time", 0.5, 0.05),
            correlation("wait_time", 0.5, 0.049),
        ]);
        assert!(!ranked[0].is_significant);
        assert!(ranked[1].is_significant);
    }

    #[test]
    fn significance_uses_the_raw_p_value_not_the_rounded_one() {
        let ranked = rank_correlations(&[correlation("prep_time", 0.5, 0.049_99)]);
        assert_eq!(ranked[0].p_value, 0.05);
        assert!(ranked[0].is_significant);
    }

    #[test]
    fn strength_uses_the_raw_coefficient_not_the_rounded_one() {
        let ranked = rank_correlations(&[correlation("prep_time", 0.6996, 0.01)]);
        assert_eq!(ranked[0].coefficient, 0.7);
        assert_eq!(ranked[0].strength, "Moderate");
    }

    #[test]
    fn interpretation_covers_every_direction_and_significance() {
        assert_eq!(
            interpretation("prep_time", 0.75, 0.01),
            "Revenue increases with Kitchen Prep Time (strong correlation, significantly correlated)"
        );
        assert_eq!(
            interpretation("wait_time", -0.55, 0.2),
            "Revenue decreases with Customer Wait Time (moderate correlation, not significantly correlated)"
        );
        assert_eq!(
            interpretation("order_accuracy", 0.35, 0.04),
            "Revenue increases with Order Accuracy (weak correlation, significantly correlated)"
        );
        assert_eq!(
            interpretation("table_turnover", -0.1, 0.6),
            "Revenue decreases with Table Turnover Time (very weak correlation, not significantly correlated)"
        );
    }

    #[test]
    fn ranking_orders_by_displayed_magnitude_and_keeps_ties_stable() {
        let ranked = rank_correlations(&[
            correlation("order_accuracy", 0.3, 0.2),
            correlation("prep_time", 0.5004, 0.2),
            correlation("wait_time", -0.8, 0.01),
            correlation("table_turnover", -0.5001, 0.2),
        ]);
        let order: Vec<&str> = ranked.iter().map(|r| r.metric_name.as_str()).collect();
        assert_eq!(
            order,
            vec!["wait_time", "prep_time", "table_turnover", "order_accuracy"]
        );
    }
}
