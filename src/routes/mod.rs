use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;

use crate::cache::StatsCache;
use crate::error::FetchError;
use crate::stats::DashboardStats;
use crate::Config;

mod flights;
mod health;
mod scheduled;

// ---

/// Shared application state: the configuration snapshot, one HTTP client,
/// and one cache slot per cacheable query shape.
pub struct AppState {
    // ---
    pub config: Config,
    pub http: reqwest::Client,
    pub live_cache: StatsCache<flights::LiveSnapshot>,
    pub scheduled_cache: StatsCache<DashboardStats>,
}

impl AppState {
    /// Build the state from a loaded [`Config`]. The upstream fetch timeout
    /// applies at the client level, so no fetch can hang a request forever.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        // ---
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;

        Ok(AppState {
            live_cache: StatsCache::new(Duration::from_secs(config.live_cache_ttl_secs)),
            scheduled_cache: StatsCache::new(Duration::from_secs(config.scheduled_cache_ttl_secs)),
            http,
            config,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    // ---
    Router::new()
        .merge(flights::router())
        .merge(scheduled::router())
        .merge(health::router())
        .with_state(state)
}

// ---

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Transport-error envelope used when a fetch fails with no cached
/// fallback.
fn bad_gateway(err: FetchError) -> Response {
    // ---
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}
