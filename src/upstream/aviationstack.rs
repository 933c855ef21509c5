//! Scheduled-flight API client (AviationStack).
//!
//! The free plan serves at most 100 results per call, so the batch is a
//! sample; `pagination.total` is the true population and travels alongside
//! the records for the aggregator's `dataScope`/`totalFlights` split.
//!
//! Failure modes, all mapped onto [`FetchError`]:
//! - no API key configured (config error, checked per fetch)
//! - non-2xx HTTP or a transport problem
//! - HTTP 200 whose body carries an `error` object (rate limiting arrives
//!   this way)

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{RawScheduledFlight, ScheduledFlight};

const PROVIDER: &str = "AviationStack";

// ---

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    pagination: Option<Pagination>,
    #[serde(default)]
    data: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// One page of normalized scheduled flights plus the true population count.
#[derive(Debug, Clone)]
pub struct ScheduledBatch {
    pub flights: Vec<ScheduledFlight>,
    pub total: u64,
}

/// Fetch the current page of active flights.
///
/// Fails with [`FetchError::Config`] when no API key is configured; the
/// caller's cache policy turns that into a stale serve or a 502 like any
/// other fetch failure.
pub async fn fetch_active(
    client: &reqwest::Client,
    config: &Config,
) -> Result<ScheduledBatch, FetchError> {
    // ---
    let key = config
        .aviationstack_key
        .as_deref()
        .ok_or(FetchError::Config("AVIATIONSTACK_API_KEY"))?;

    let url = format!(
        "{}/flights?access_key={}&flight_status=active&limit=100",
        config.aviationstack_url, key
    );
    debug!("Fetching from: {}/flights", config.aviationstack_url);

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

    let body: ApiEnvelope = res.json().await.map_err(|e| FetchError::Http {
        provider: PROVIDER,
        source: e,
    })?;

    if let Some(err) = body.error {
        let message = match (err.message, err.code) {
            (Some(m), _) => m,
            (None, Some(c)) => c,
            (None, None) => "unspecified error".to_string(),
        };
        return Err(FetchError::UpstreamApi {
            provider: PROVIDER,
            message,
        });
    }

    let mut flights = Vec::new();
    for (i, item) in body.data.unwrap_or_default().into_iter().enumerate() {
        match serde_json::from_value::<RawScheduledFlight>(item) {
            Ok(raw) => match raw.normalize() {
                Ok(f) => flights.push(f),
                Err(e) => debug!("Skipping record {}: {}", i, e),
            },
            Err(e) => debug!("Failed to parse record {}: {}", i, e),
        }
    }

    let total = body.pagination.map_or(0, |p| p.total);
    tracing::info!(
        "{}: fetched {} of {} flights",
        PROVIDER,
        flights.len(),
        total
    );

    Ok(ScheduledBatch { flights, total })
}
