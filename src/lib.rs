//! Library crate for the `flightdash` backend service.
//!
//! The pipeline has three layers, leaf first:
//! - [`models`]: raw upstream shapes and the parsers that normalize them
//! - [`stats`]: the pure aggregation pass producing immutable summaries
//! - [`cache`]: the per-query-shape cache slot with TTL and stale-on-error
//!   fallback
//!
//! [`upstream`] holds the two provider clients and [`routes`] wires
//! everything into the axum router. The binary in `main.rs` only loads
//! configuration, initializes tracing, and serves.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod stats;
pub mod upstream;

pub use config::Config;
pub use routes::AppState;
