use crate::config::AnalyticsConfig;
use crate::state::AppState;

pub fn test_config() -> AnalyticsConfig {
    AnalyticsConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        stats_api_base_url: "http://127.0.0.1:8001".to_string(),
        stats_api_timeout_seconds: 5,
        coverage_window_days: 90,
    }
}

/// Builds a state whose pool is lazy and whose client never dials out on its
/// own; tests that stop before I/O can use it without a live database.
pub fn test_state() -> AppState {
    AppState::new(test_config()).expect("test state")
}
