//! Live-position endpoint.
//!
//! `GET /api/flights` serves the global snapshot from the shared cache
//! slot (10 s TTL by default). When all four bounding-box parameters are
//! present the request switches to area mode, which is always computed
//! fresh and never reads or writes the cache. A failed refresh falls back
//! to the last good snapshot, flagged `stale` with the failure message;
//! with nothing cached the failure surfaces as a 502.

use std::sync::Arc;

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::cache::CacheOutcome;
use crate::models::FlightState;
use crate::stats::{compute_global_stats, GlobalStats};
use crate::upstream::opensky::{self, BoundingBox, StateBatch};

use super::{bad_gateway, AppState};

// ---

pub fn router() -> Router<Arc<AppState>> {
    // ---
    Router::new().route("/api/flights", get(handler))
}

/// Cached value for the global query: the raw batch and its aggregate,
/// published together so a cache hit serves both without recomputing.
#[derive(Debug, Clone)]
pub struct LiveSnapshot {
    pub time: i64,
    pub flights: Vec<FlightState>,
    pub stats: GlobalStats,
}

#[derive(Debug, Deserialize)]
struct AreaQuery {
    lamin: Option<f64>,
    lomin: Option<f64>,
    lamax: Option<f64>,
    lomax: Option<f64>,
}

impl AreaQuery {
    /// All four coordinates together select area mode; any subset falls
    /// back to the global query.
    fn bounding_box(&self) -> Option<BoundingBox> {
        // ---
        match (self.lamin, self.lomin, self.lamax, self.lomax) {
            (Some(lamin), Some(lomin), Some(lamax), Some(lomax)) => Some(BoundingBox {
                lamin,
                lomin,
                lamax,
                lomax,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LiveEnvelope {
    time: i64,
    total: usize,
    stats: GlobalStats,
    flights: Vec<FlightState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn envelope(snapshot: LiveSnapshot, error: Option<String>) -> Json<LiveEnvelope> {
    // ---
    Json(LiveEnvelope {
        time: snapshot.time,
        total: snapshot.flights.len(),
        stats: snapshot.stats,
        flights: snapshot.flights,
        stale: error.is_some().then_some(true),
        error,
    })
}

fn snapshot(batch: StateBatch) -> LiveSnapshot {
    // ---
    let stats = compute_global_stats(&batch.flights);
    LiveSnapshot {
        time: batch.time,
        flights: batch.flights,
        stats,
    }
}

async fn handler(
    Query(params): Query<AreaQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // ---
    if let Some(bbox) = params.bounding_box() {
        info!("GET /api/flights - area query");
        // Area queries bypass the cache in both directions.
        return match opensky::fetch_by_area(&state.http, &state.config.opensky_url, &bbox).await {
            Ok(batch) => (StatusCode::OK, envelope(snapshot(batch), None)).into_response(),
            Err(e) => {
                error!("Area fetch failed: {}", e);
                bad_gateway(e)
            }
        };
    }

    info!("GET /api/flights - global query");

    let outcome = state
        .live_cache
        .get_or_refresh(|| async {
            let batch = opensky::fetch_all(&state.http, &state.config.opensky_url).await?;
            Ok(snapshot(batch))
        })
        .await;

    match outcome {
        Ok(CacheOutcome::Fresh(snap)) | Ok(CacheOutcome::Cached { value: snap, .. }) => {
            (StatusCode::OK, envelope(snap, None)).into_response()
        }
        Ok(CacheOutcome::Stale { value: snap, age, error }) => {
            warn!(
                "Serving stale live snapshot ({}s old) after fetch failure: {}",
                age.as_secs(),
                error
            );
            (StatusCode::OK, envelope(snap, Some(error))).into_response()
        }
        Err(e) => {
            error!("Live fetch failed with empty cache: {}", e);
            bad_gateway(e)
        }
    }
}
