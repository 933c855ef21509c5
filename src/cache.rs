//! In-process response cache with TTL and stale-on-error fallback.
//!
//! One [`StatsCache`] guards one cache slot; the service owns one per
//! cacheable query shape (global live batch, scheduled-flight batch).
//! Area-bounded queries never touch a slot and are computed fresh by the
//! routes directly.
//!
//! The slot lives behind a `tokio::sync::Mutex` that is held across the
//! refresh fetch, so concurrent requests that miss the cache collapse into
//! a single upstream call; the losers observe the winner's entry as a cache
//! hit once the lock is released.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::FetchError;

// ---

/// How a value was obtained from [`StatsCache::get_or_refresh`].
#[derive(Debug)]
pub enum CacheOutcome<T> {
    /// Freshly fetched and just published to the slot.
    Fresh(T),
    /// Served from the slot within its TTL.
    Cached { value: T, age: Duration },
    /// The refresh failed but an earlier entry (possibly expired) exists;
    /// that entry is served with the failure message alongside it.
    Stale {
        value: T,
        age: Duration,
        error: String,
    },
}

struct Slot<T> {
    value: T,
    stored_at: Instant,
}

/// A single-slot TTL cache. Entries are replaced wholesale on every
/// successful refresh and never partially mutated.
pub struct StatsCache<T> {
    ttl: Duration,
    slot: Mutex<Option<Slot<T>>>,
}

impl<T: Clone> StatsCache<T> {
    pub fn new(ttl: Duration) -> Self {
        // ---
        StatsCache {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached value while it is within the TTL; otherwise run
    /// `fetch` and publish its result.
    ///
    /// On fetch failure the previous entry is served as
    /// [`CacheOutcome::Stale`] when one exists, even if it has expired;
    /// with an empty slot the [`FetchError`] propagates unchanged.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<CacheOutcome<T>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        // ---
        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.as_ref() {
            let age = entry.stored_at.elapsed();
            if age < self.ttl {
                return Ok(CacheOutcome::Cached {
                    value: entry.value.clone(),
                    age,
                });
            }
        }

        match fetch().await {
            Ok(value) => {
                *slot = Some(Slot {
                    value: value.clone(),
                    stored_at: Instant::now(),
                });
                Ok(CacheOutcome::Fresh(value))
            }
            Err(err) => match slot.as_ref() {
                Some(entry) => Ok(CacheOutcome::Stale {
                    value: entry.value.clone(),
                    age: entry.stored_at.elapsed(),
                    error: err.to_string(),
                }),
                None => Err(err),
            },
        }
    }
}
