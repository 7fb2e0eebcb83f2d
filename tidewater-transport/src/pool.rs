//! Round-robin connection selection with dead endpoint tracking.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use url::Url;

/// Upper bound for the resurrection backoff, as a multiple of the base timeout.
const MAX_DEAD_TIMEOUT_FACTOR: u32 = 32;

/// A single cluster endpoint.
#[derive(Debug)]
pub struct Connection {
    url: Url,
    state: Mutex<ConnectionState>,
}

#[derive(Debug, Default)]
struct ConnectionState {
    failures: u32,
    dead_since: Option<Instant>,
}

impl Connection {
    fn new(url: Url) -> Self {
        Self {
            url,
            state: Mutex::new(ConnectionState::default()),
        }
    }

    /// Base address of this endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the endpoint is currently marked dead.
    pub fn is_dead(&self) -> bool {
        self.state.lock().dead_since.is_some()
    }

    fn resurrect_at(&self, base: Duration) -> Option<Instant> {
        let state = self.state.lock();
        let since = state.dead_since?;
        let shift = state.failures.saturating_sub(1).min(5);
        let factor = (1u32 << shift).min(MAX_DEAD_TIMEOUT_FACTOR);
        Some(since + base.saturating_mul(factor))
    }
}

/// Round-robin pool over the configured addresses.
#[derive(Debug)]
pub struct ConnectionPool {
    connections: Vec<Arc<Connection>>,
    cursor: AtomicUsize,
    dead_timeout: Duration,
}

impl ConnectionPool {
    /// Create a pool. `urls` must not be empty.
    pub fn new(urls: Vec<Url>, dead_timeout: Duration) -> Self {
        Self {
            connections: urls.into_iter().map(|u| Arc::new(Connection::new(u))).collect(),
            cursor: AtomicUsize::new(0),
            dead_timeout,
        }
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the pool has no endpoints.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Pick the next endpoint.
    ///
    /// Live endpoints are used in round-robin order. Dead endpoints become
    /// eligible again once their resurrection timeout passes. When every
    /// endpoint is dead the one that died first is returned.
    pub fn next(&self) -> Option<Arc<Connection>> {
        let len = self.connections.len();
        if len == 0 {
            return None;
        }

        let now = Instant::now();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);

        for offset in 0..len {
            let conn = &self.connections[(start + offset) % len];
            match conn.resurrect_at(self.dead_timeout) {
                None => return Some(conn.clone()),
                Some(at) if at <= now => return Some(conn.clone()),
                Some(_) => {}
            }
        }

        self.connections
            .iter()
            .min_by_key(|c| c.state.lock().dead_since)
            .cloned()
    }

    /// Record a successful round trip.
    pub fn mark_alive(&self, conn: &Connection) {
        let mut state = conn.state.lock();
        state.failures = 0;
        state.dead_since = None;
    }

    /// Record a network failure.
    pub fn mark_dead(&self, conn: &Connection) {
        let mut state = conn.state.lock();
        state.failures = state.failures.saturating_add(1);
        state.dead_since = Some(Instant::now());
    }
}
