//! Pending authorization state
//!
//! Correlates each issued OAuth `state` with the path the user should land
//! on after login. An entry is created by `/authorize` and consumed exactly
//! once by `/callback`. Entries expire after a TTL and the store is bounded,
//! so abandoned logins can't accumulate.
//!
//! Lookup and removal happen under a single lock acquisition: two callbacks
//! racing on the same state can never both succeed.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Redirect target recorded for one in-flight authorization.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub redirect_to: String,
    created_at: Instant,
}

/// TTL-bounded map of `state -> PendingAuthorization`.
pub struct PendingAuthorizations {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, PendingAuthorization>>,
}

impl PendingAuthorizations {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record a freshly issued state.
    ///
    /// Expired entries are swept first; if the store is still full the
    /// oldest entry is evicted.
    pub async fn insert(&self, state: String, redirect_to: String) {
        let mut entries = self.entries.lock().await;

        let ttl = self.ttl;
        entries.retain(|_, entry| entry.created_at.elapsed() < ttl);

        if entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                debug!("pending authorization store full, evicted oldest state");
            }
        }

        entries.insert(
            state,
            PendingAuthorization {
                redirect_to,
                created_at: Instant::now(),
            },
        );
    }

    /// Consume a state. Returns `None` for unknown, already consumed, or
    /// expired states.
    pub async fn take(&self, state: &str) -> Option<PendingAuthorization> {
        let mut entries = self.entries.lock().await;
        let entry = entries.remove(state)?;
        if entry.created_at.elapsed() >= self.ttl {
            debug!("pending authorization expired");
            return None;
        }
        Some(entry)
    }

    /// Number of stored entries, including any not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
