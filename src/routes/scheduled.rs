//! Scheduled-flight endpoint.
//!
//! `GET /api/flights/scheduled` serves the dashboard statistics for the
//! scheduled-flight provider. The provider's free plan is tightly
//! rate-limited, so the summary is cached aggressively (600 s TTL by
//! default) and the envelope tells the dashboard how it was served:
//! `cached` plus `cacheAge` in seconds, with `stale` and `error` added
//! when a refresh failed and an older summary was used instead.

use std::sync::Arc;

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::cache::CacheOutcome;
use crate::stats::{compute_dashboard_stats, DashboardStats};
use crate::upstream::aviationstack;

use super::{bad_gateway, AppState};

// ---

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new().route("/api/flights/scheduled", get(handler))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduledEnvelope {
    stats: DashboardStats,
    /// False only when this response triggered a fresh upstream fetch.
    cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stale: Option<bool>,
    /// Age of the served summary in whole seconds; 0 when fresh.
    cache_age: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // ---
    info!("GET /api/flights/scheduled");

    let outcome = state
        .scheduled_cache
        .get_or_refresh(|| async {
            let batch = aviationstack::fetch_active(&state.http, &state.config).await?;
            Ok(compute_dashboard_stats(&batch.flights, batch.total))
        })
        .await;

    let envelope = match outcome {
        Ok(CacheOutcome::Fresh(stats)) => ScheduledEnvelope {
            stats,
            cached: false,
            stale: None,
            cache_age: 0,
            error: None,
        },
        Ok(CacheOutcome::Cached { value, age }) => ScheduledEnvelope {
            stats: value,
            cached: true,
            stale: None,
            cache_age: age.as_secs(),
            error: None,
        },
        Ok(CacheOutcome::Stale { value, age, error }) => {
            warn!(
                "Serving stale dashboard stats ({}s old) after fetch failure: {}",
                age.as_secs(),
                error
            );
            ScheduledEnvelope {
                stats: value,
                cached: true,
                stale: Some(true),
                cache_age: age.as_secs(),
                error: Some(error),
            }
        }
        Err(e) => {
            error!("Scheduled fetch failed with empty cache: {}", e);
            return bad_gateway(e);
        }
    };

    (StatusCode::OK, Json(envelope)).into_response()
}
