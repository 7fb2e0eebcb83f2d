//! Indexer counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of indexer counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkIndexerStats {
    /// Items accepted by workers.
    pub added: u64,
    /// Items the cluster accepted.
    pub flushed: u64,
    /// Items that failed, individually or with their flush.
    pub failed: u64,
    /// Successful `index` entries.
    pub indexed: u64,
    /// Successful `create` entries.
    pub created: u64,
    /// Successful `update` entries, including no-ops.
    pub updated: u64,
    /// Successful `delete` entries.
    pub deleted: u64,
    /// Bulk requests sent.
    pub requests: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub added: AtomicU64,
    pub flushed: AtomicU64,
    pub failed: AtomicU64,
    pub indexed: AtomicU64,
    pub created: AtomicU64,
    pub updated: AtomicU64,
    pub deleted: AtomicU64,
    pub requests: AtomicU64,
}

impl Counters {
    pub fn incr(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Count a successful entry under its response action key.
    pub fn record_success(&self, action: &str) {
        let counter = match action {
            "index" => &self.indexed,
            "create" => &self.created,
            "update" => &self.updated,
            "delete" => &self.deleted,
            _ => return,
        };
        Self::incr(counter, 1);
    }

    pub fn snapshot(&self) -> BulkIndexerStats {
        BulkIndexerStats {
            added: self.added.load(Ordering::Relaxed),
            flushed: self.flushed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            indexed: self.indexed.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
        }
    }
}
