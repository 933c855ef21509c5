//! Live-position API client (OpenSky state vectors).
//!
//! `GET {base}/states/all?extended=1` returns a snapshot time and an array
//! of positional state vectors. An optional bounding box restricts the
//! snapshot to an area. A null or absent `states` array is a valid empty
//! result, not an error.

use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::models::FlightState;

const PROVIDER: &str = "OpenSky";

// ---

/// Area filter in floating-point degrees.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub lamin: f64,
    pub lomin: f64,
    pub lamax: f64,
    pub lomax: f64,
}

/// One snapshot of state vectors plus the upstream snapshot time.
#[derive(Debug, Clone)]
pub struct StateBatch {
    /// Unix timestamp of the snapshot as reported by the provider.
    pub time: i64,
    pub flights: Vec<FlightState>,
}

/// Fetch the global snapshot.
pub async fn fetch_all(client: &reqwest::Client, base_url: &str) -> Result<StateBatch, FetchError> {
    // ---
    fetch(client, format!("{base_url}/states/all?extended=1")).await
}

/// Fetch a snapshot bounded to `bbox`.
pub async fn fetch_by_area(
    client: &reqwest::Client,
    base_url: &str,
    bbox: &BoundingBox,
) -> Result<StateBatch, FetchError> {
    // ---
    let url = format!(
        "{base_url}/states/all?extended=1&lamin={}&lomin={}&lamax={}&lomax={}",
        bbox.lamin, bbox.lomin, bbox.lamax, bbox.lomax
    );
    fetch(client, url).await
}

async fn fetch(client: &reqwest::Client, url: String) -> Result<StateBatch, FetchError> {
    // ---
    debug!("Fetching from: {}", url);

    let res = client.get(&url).send().await.map_err(|e| FetchError::Http {
        provider: PROVIDER,
        source: e,
    })?;

    if !res.status().is_success() {
        return Err(FetchError::Transport {
            provider: PROVIDER,
            status: res.status(),
        });
    }

    let body: Value = res.json().await.map_err(|e| FetchError::Http {
        provider: PROVIDER,
        source: e,
    })?;

    let time = body.get("time").and_then(Value::as_i64).unwrap_or(0);

    let mut flights = Vec::new();
    if let Some(states) = body.get("states").and_then(Value::as_array) {
        for (i, row) in states.iter().enumerate() {
            let Some(fields) = row.as_array() else {
                debug!("State vector {} is not an array, skipping", i);
                continue;
            };
            match FlightState::from_state_vector(fields) {
                Ok(f) => flights.push(f),
                Err(e) => debug!("Skipping state vector {}: {}", i, e),
            }
        }
    }

    tracing::info!("{}: fetched {} state vectors", PROVIDER, flights.len());
    Ok(StateBatch { time, flights })
}
