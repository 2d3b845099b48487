pub mod analysis;
pub mod stats_api;
pub mod store;
