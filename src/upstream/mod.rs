//! Upstream flight-data providers.
//!
//! Gateway module for the two API clients (EMBP pattern): each provider
//! lives in its own sibling file and exposes fetch functions that return
//! normalized records or a [`crate::error::FetchError`]. Records that fail
//! normalization are skipped with a debug log, never aborting the batch.

pub mod aviationstack;
pub mod opensky;
