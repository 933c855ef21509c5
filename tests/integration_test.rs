//! End-to-end tests driving the real router over HTTP against an
//! in-process stub of both upstream providers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::{json, Value};

use flightdash::{routes, AppState, Config};

// ---

/// Shared stub-provider state: per-provider call counters plus a failure
/// switch tests flip to simulate upstream outages.
#[derive(Default)]
struct Stub {
    opensky_calls: AtomicUsize,
    aviationstack_calls: AtomicUsize,
    fail: AtomicBool,
}

async fn opensky_states(State(stub): State<Arc<Stub>>) -> (StatusCode, Json<Value>) {
    // ---
    stub.opensky_calls.fetch_add(1, Ordering::SeqCst);
    if stub.fail.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "upstream down"})),
        );
    }

    // Three good state vectors and one with no icao24, which the parser
    // must skip without failing the batch.
    let body = json!({
        "time": 1_700_000_000,
        "states": [
            ["a1", "UAL1   ", "United States", null, 1_700_000_000,
             null, null, 10000.0, false, 240.0, null, null, null, 11000.0,
             null, false, 0, 1],
            ["a2", "DAL2", "United States", null, 1_700_000_000,
             null, null, null, true, null, null, null, null, null,
             null, false, 0, 0],
            ["a3", null, "France", null, 1_700_000_000,
             null, null, null, false, 220.0, null, null, null, null,
             null, false, 0, 0],
            [null, "GHOST", "Nowhere"]
        ]
    });
    (StatusCode::OK, Json(body))
}

async fn aviationstack_flights(State(stub): State<Arc<Stub>>) -> (StatusCode, Json<Value>) {
    // ---
    stub.aviationstack_calls.fetch_add(1, Ordering::SeqCst);
    if stub.fail.load(Ordering::SeqCst) {
        // HTTP 200 whose payload encodes the failure, as the real API does
        // when the monthly quota runs out.
        return (
            StatusCode::OK,
            Json(json!({
                "error": { "code": "usage_limit_reached", "message": "monthly usage limit reached" }
            })),
        );
    }

    let body = json!({
        "pagination": { "limit": 100, "offset": 0, "count": 3, "total": 250 },
        "data": [
            {
                "flight_status": "active",
                "airline": { "name": "United Airlines" },
                "flight": { "iata": "UA100" },
                "departure": { "airport": "San Francisco International", "iata": "SFO", "delay": 20 },
                "arrival": { "airport": "Newark Liberty", "iata": "EWR" },
                "live": { "altitude": 10000.0, "speed_horizontal": 900.0 }
            },
            {
                "flight_status": "active",
                "airline": { "name": "United Airlines" },
                "flight": { "iata": "UA200" },
                "departure": { "iata": "SFO" }
            },
            {
                "flight_status": "landed",
                "airline": { "name": "Delta Air Lines" },
                "flight": { "iata": "DL300" }
            },
            { "flight_status": "scheduled" }
        ]
    });
    (StatusCode::OK, Json(body))
}

async fn spawn(app: Router) -> Result<SocketAddr> {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok(addr)
}

/// Spin up the stub providers and the app pointed at them. Returns the
/// stub handle and the app base URL.
async fn setup(
    live_ttl: u64,
    scheduled_ttl: u64,
    api_key: Option<&str>,
) -> Result<(Arc<Stub>, String)> {
    // ---
    let stub = Arc::new(Stub::default());
    let stub_router = Router::new()
        .route("/states/all", get(opensky_states))
        .route("/v1/flights", get(aviationstack_flights))
        .with_state(stub.clone());
    let stub_addr = spawn(stub_router).await?;

    let config = Config {
        opensky_url: format!("http://{stub_addr}"),
        aviationstack_url: format!("http://{stub_addr}/v1"),
        aviationstack_key: api_key.map(String::from),
        live_cache_ttl_secs: live_ttl,
        scheduled_cache_ttl_secs: scheduled_ttl,
        fetch_timeout_secs: 5,
    };
    let app_addr = spawn(routes::router(Arc::new(AppState::new(config)?))).await?;

    Ok((stub, format!("http://{app_addr}")))
}

// ---

#[tokio::test]
async fn live_endpoint_aggregates_and_caches() -> Result<()> {
    // ---
    let (stub, base) = setup(60, 60, None).await?;
    let client = Client::new();

    let body: Value = client
        .get(format!("{base}/api/flights"))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["time"], 1_700_000_000);
    // the malformed fourth row is skipped
    assert_eq!(body["total"], 3);
    assert_eq!(body["stats"]["totalActive"], 3);
    assert_eq!(body["stats"]["airborne"], 2);
    assert_eq!(body["stats"]["onGround"], 1);
    // telemetry only from airborne aircraft that report it
    assert_eq!(body["stats"]["avgAltitude"], 11000);
    assert_eq!(body["stats"]["avgSpeed"], 230);
    assert_eq!(body["stats"]["highestAltitude"]["callsign"], "UAL1");
    assert_eq!(body["stats"]["topAirline"]["code"], "UAL");
    assert_eq!(body["stats"]["byCountry"][0]["country"], "United States");
    assert_eq!(body["stats"]["byCountry"][0]["count"], 2);
    assert!(body["stale"].is_null());
    assert_eq!(body["flights"].as_array().unwrap().len(), 3);

    // a second request inside the TTL is served from the cache
    let again: Value = client
        .get(format!("{base}/api/flights"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(stub.opensky_calls.load(Ordering::SeqCst), 1);
    assert_eq!(again["stats"], body["stats"]);

    Ok(())
}

#[tokio::test]
async fn area_queries_bypass_the_cache() -> Result<()> {
    // ---
    let (stub, base) = setup(60, 60, None).await?;
    let client = Client::new();
    let url = format!("{base}/api/flights?lamin=45.0&lomin=5.0&lamax=48.0&lomax=11.0");

    for _ in 0..2 {
        let res = client.get(&url).send().await?;
        assert_eq!(res.status(), 200);
    }
    // every area request reaches the provider
    assert_eq!(stub.opensky_calls.load(Ordering::SeqCst), 2);

    // an incomplete bounding box falls back to the cacheable global query
    let res = client
        .get(format!("{base}/api/flights?lamin=45.0&lomin=5.0"))
        .send()
        .await?;
    assert_eq!(res.status(), 200);
    assert_eq!(stub.opensky_calls.load(Ordering::SeqCst), 3);

    Ok(())
}

#[tokio::test]
async fn scheduled_endpoint_reports_cache_status() -> Result<()> {
    // ---
    let (stub, base) = setup(60, 600, Some("test-key")).await?;
    let client = Client::new();
    let url = format!("{base}/api/flights/scheduled");

    let body: Value = client.get(&url).send().await?.json().await?;

    assert_eq!(body["cached"], false);
    assert_eq!(body["cacheAge"], 0);
    assert!(body["stale"].is_null());
    assert_eq!(body["stats"]["totalFlights"], 250);
    assert_eq!(body["stats"]["dataScope"], 3); // identity-less record skipped
    assert_eq!(body["stats"]["activeFlights"], 2);
    assert_eq!(body["stats"]["landedFlights"], 1);
    assert_eq!(body["stats"]["topAirlines"][0]["name"], "United Airlines");
    assert_eq!(body["stats"]["topAirlines"][0]["count"], 2);
    assert_eq!(body["stats"]["busiestDepartures"][0]["iata"], "SFO");
    assert_eq!(
        body["stats"]["busiestDepartures"][0]["name"],
        "San Francisco International"
    );
    assert_eq!(body["stats"]["avgDepartureDelay"], 20);
    assert_eq!(body["stats"]["hasLiveData"], true);
    assert_eq!(body["stats"]["highestAltitude"]["flight"], "UA100");

    let again: Value = client.get(&url).send().await?.json().await?;
    assert_eq!(again["cached"], true);
    assert_eq!(stub.aviationstack_calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn scheduled_endpoint_serves_stale_after_upstream_failure() -> Result<()> {
    // ---
    // TTL of zero forces a refresh attempt on every request.
    let (stub, base) = setup(60, 0, Some("test-key")).await?;
    let client = Client::new();
    let url = format!("{base}/api/flights/scheduled");

    let first: Value = client.get(&url).send().await?.json().await?;
    assert_eq!(first["cached"], false);

    stub.fail.store(true, Ordering::SeqCst);

    let res = client.get(&url).send().await?;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await?;
    assert_eq!(body["cached"], true);
    assert_eq!(body["stale"], true);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("monthly usage limit reached"));
    assert_eq!(body["stats"], first["stats"]);

    Ok(())
}

#[tokio::test]
async fn live_endpoint_serves_stale_after_upstream_failure() -> Result<()> {
    // ---
    let (stub, base) = setup(0, 60, None).await?;
    let client = Client::new();
    let url = format!("{base}/api/flights");

    let first: Value = client.get(&url).send().await?.json().await?;
    assert!(first["stale"].is_null());

    stub.fail.store(true, Ordering::SeqCst);

    let res = client.get(&url).send().await?;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await?;
    assert_eq!(body["stale"], true);
    assert!(body["error"].as_str().unwrap().contains("HTTP 500"));
    assert_eq!(body["stats"], first["stats"]);

    Ok(())
}

#[tokio::test]
async fn failure_with_no_cached_fallback_is_a_502() -> Result<()> {
    // ---
    let (stub, base) = setup(60, 60, Some("test-key")).await?;
    stub.fail.store(true, Ordering::SeqCst);
    let client = Client::new();

    let res = client.get(format!("{base}/api/flights")).send().await?;
    assert_eq!(res.status(), 502);
    let body: Value = res.json().await?;
    assert!(body["error"].as_str().unwrap().contains("HTTP 500"));

    let res = client
        .get(format!("{base}/api/flights/scheduled"))
        .send()
        .await?;
    assert_eq!(res.status(), 502);
    let body: Value = res.json().await?;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("monthly usage limit reached"));

    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds_without_touching_providers() -> Result<()> {
    // ---
    let (stub, base) = setup(60, 60, None).await?;
    let client = Client::new();

    let res = client.get(format!("{base}/health")).send().await?;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(stub.opensky_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stub.aviationstack_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn missing_api_key_surfaces_as_fetch_failure() -> Result<()> {
    // ---
    let (stub, base) = setup(60, 60, None).await?;
    let client = Client::new();

    let res = client
        .get(format!("{base}/api/flights/scheduled"))
        .send()
        .await?;
    assert_eq!(res.status(), 502);
    let body: Value = res.json().await?;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("AVIATIONSTACK_API_KEY"));
    // the provider was never contacted
    assert_eq!(stub.aviationstack_calls.load(Ordering::SeqCst), 0);

    Ok(())
}
