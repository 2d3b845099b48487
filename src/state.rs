use anyhow::Result;
use sqlx::PgPool;

use crate::config::AnalyticsConfig;
use crate::db;
use crate::services::stats_api::StatsApiClient;

#[derive(Clone)]
pub struct AppState {
    pub config: AnalyticsConfig,
    pub db: PgPool,
    pub stats_api: StatsApiClient,
}

impl AppState {
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        let db = db::connect_lazy(&config.database_url)?;
        let http = reqwest::Client::new();
        let stats_api = StatsApiClient::new(
            config.stats_api_base_url.clone(),
            config.stats_api_timeout_seconds,
            http,
        );
        Ok(Self {
            config,
            db,
            stats_api,
        })
    }
}
