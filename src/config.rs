//! Configuration loader for the `flightdash` backend service.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). By consolidating configuration logic
//! here, we avoid scattering `env::var` calls throughout the codebase.
//!
//! The scheduled-flight provider credential is deliberately *not* required
//! at startup: its absence surfaces as a failed fetch on the endpoint that
//! needs it, so the live-position endpoint keeps working without it.

use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Live-position API base URL.
    pub opensky_url: String,

    /// Scheduled-flight API base URL.
    pub aviationstack_url: String,

    /// Scheduled-flight API access key. `None` until configured; fetches
    /// that need it fail with a config error instead.
    pub aviationstack_key: Option<String>,

    /// TTL for the cached global live-position batch, in seconds.
    pub live_cache_ttl_secs: u64,

    /// TTL for the cached scheduled-flight stats, in seconds.
    pub scheduled_cache_ttl_secs: u64,

    /// Upper bound on any single upstream fetch, in seconds.
    pub fetch_timeout_secs: u64,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `OPENSKY_API_URL` – live-position API base (default: opensky-network.org)
/// - `AVIATIONSTACK_API_URL` – scheduled-flight API base (default: aviationstack.com)
/// - `AVIATIONSTACK_API_KEY` – scheduled-flight API access key
/// - `LIVE_CACHE_TTL_SECS` – live batch cache TTL (default: 10)
/// - `SCHEDULED_CACHE_TTL_SECS` – scheduled stats cache TTL (default: 600)
/// - `FETCH_TIMEOUT_SECS` – upstream fetch timeout (default: 30)
///
/// Returns an error if any numeric variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let opensky_url = env_or!("OPENSKY_API_URL", "https://opensky-network.org/api");
    let aviationstack_url = env_or!("AVIATIONSTACK_API_URL", "http://api.aviationstack.com/v1");
    let aviationstack_key = env::var("AVIATIONSTACK_API_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    let live_cache_ttl_secs = parse_env_u64!("LIVE_CACHE_TTL_SECS", 10);
    let scheduled_cache_ttl_secs = parse_env_u64!("SCHEDULED_CACHE_TTL_SECS", 600);
    let fetch_timeout_secs = parse_env_u64!("FETCH_TIMEOUT_SECS", 30);

    Ok(Config {
        opensky_url,
        aviationstack_url,
        aviationstack_key,
        live_cache_ttl_secs,
        scheduled_cache_ttl_secs,
        fetch_timeout_secs,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the API key while showing all configuration values that were
    /// loaded.
    pub fn log_config(&self) {
        // ---
        let masked_key = match &self.aviationstack_key {
            Some(_) => "****",
            None => "(not set)",
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  OPENSKY_API_URL          : {}", self.opensky_url);
        tracing::info!("  AVIATIONSTACK_API_URL    : {}", self.aviationstack_url);
        tracing::info!("  AVIATIONSTACK_API_KEY    : {}", masked_key);
        tracing::info!("  LIVE_CACHE_TTL_SECS      : {}", self.live_cache_ttl_secs);
        tracing::info!(
            "  SCHEDULED_CACHE_TTL_SECS : {}",
            self.scheduled_cache_ttl_secs
        );
        tracing::info!("  FETCH_TIMEOUT_SECS       : {}", self.fetch_timeout_secs);
    }
}
