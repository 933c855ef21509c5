//! Error taxonomy for the flight data pipeline.
//!
//! Upstream failures all funnel into [`FetchError`] so the cache layer can
//! make one stale-serve-or-fail decision regardless of what went wrong.
//! [`MalformedRecord`] stays local to the parsers: one bad record is skipped,
//! never aborting the rest of the batch.

use thiserror::Error;

// ---

/// A failed attempt to obtain flight data from an upstream provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A required credential is missing. Surfaced per-fetch rather than at
    /// startup so the rest of the service keeps working without it.
    #[error("{0} is not set")]
    Config(&'static str),

    /// Non-2xx HTTP status from the provider.
    #[error("{provider} HTTP {status}")]
    Transport {
        provider: &'static str,
        status: reqwest::StatusCode,
    },

    /// Network, timeout, or body-decoding failure reaching the provider.
    #[error("{provider}: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP 200 but the payload itself encodes an error (e.g. rate limit
    /// exceeded on the free plan).
    #[error("{provider} API error: {message}")]
    UpstreamApi {
        provider: &'static str,
        message: String,
    },
}

/// A raw record that cannot be normalized because required identity fields
/// are absent. Policy is skip-and-continue: callers log and move on.
#[derive(Debug, Error)]
#[error("malformed record: missing {0}")]
pub struct MalformedRecord(pub &'static str);
