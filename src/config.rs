use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub database_url: String,
    pub stats_api_base_url: String,
    pub stats_api_timeout_seconds: u64,
    pub coverage_window_days: u32,
}

impl AnalyticsConfig {
    /// Resolves configuration from the environment. CLI overrides, when
    /// provided, take precedence over the corresponding variables.
    pub fn from_env(
        cli_database_url: Option<String>,
        cli_stats_api_base_url: Option<String>,
    ) -> Result<Self> {
        let database_url = cli_database_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .or_else(|| env_optional_string("RESTO_DATABASE_URL"))
            .context("RESTO_DATABASE_URL must be set")?;
        let database_url = normalize_database_url(database_url);

        let stats_api_base_url = cli_stats_api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| env_string("RESTO_STATS_API_BASE_URL", "http://127.0.0.1:8001"));
        let stats_api_base_url = stats_api_base_url.trim_end_matches('/').to_string();

        let stats_api_timeout_seconds =
            env_u64("RESTO_STATS_API_TIMEOUT_SECONDS", 30).clamp(1, 300);
        let coverage_window_days = env_u32("RESTO_COVERAGE_WINDOW_DAYS", 90).clamp(1, 3650);

        Ok(Self {
            database_url,
            stats_api_base_url,
            stats_api_timeout_seconds,
            coverage_window_days,
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_optional_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_database_url(url: String) -> String {
    if let Some(stripped) = url.strip_prefix("postgresql+psycopg://") {
        return format!("postgresql://{stripped}");
    }
    if let Some(stripped) = url.strip_prefix("postgresql+asyncpg://") {
        return format!("postgresql://{stripped}");
    }
    url
}
