//! Worker tasks: batching and flushing.

use crate::config::BulkIndexerConfig;
use crate::context::Context;
use crate::error::BulkError;
use crate::item::BulkIndexerItem;
use crate::meta::write_meta;
use crate::request::BulkRequest;
use crate::response::{BulkResponse, BulkResponseItem};
use crate::stats::Counters;
use bytes::Bytes;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tidewater_transport::{RequestSpec, ServerError, Transport, TransportError};
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, warn};

const META_SCRATCH_CAPACITY: usize = 512;

/// State shared by the indexer handle and its workers.
pub(crate) struct Shared {
    pub config: BulkIndexerConfig,
    pub transport: Arc<dyn Transport>,
    pub counters: Counters,
    /// Context flushes run under; never cancelled.
    pub root: Context,
}

impl Shared {
    pub fn debug_log(&self, message: &str) {
        debug!("{}", message);
        if let Some(sink) = &self.config.debug_logger {
            guard("debug_logger", || sink(message));
        }
    }

    pub fn report_error(&self, ctx: &Context, err: &BulkError) {
        if let Some(hook) = &self.config.on_error {
            guard("on_error", || hook(ctx, err));
        }
    }
}

/// Run a user callback, logging instead of propagating a panic.
fn guard(name: &str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        error!(callback = name, "Bulk indexer callback panicked");
    }
}

pub(crate) type Queue = Arc<Mutex<mpsc::Receiver<BulkIndexerItem>>>;

pub(crate) struct Worker {
    id: usize,
    shared: Arc<Shared>,
    queue: Queue,
    buf: Vec<u8>,
    meta: Vec<u8>,
    items: Vec<BulkIndexerItem>,
}

impl Worker {
    pub fn new(id: usize, shared: Arc<Shared>, queue: Queue) -> Self {
        Self {
            id,
            shared,
            queue,
            buf: Vec::new(),
            meta: Vec::with_capacity(META_SCRATCH_CAPACITY),
            items: Vec::new(),
        }
    }

    pub async fn run(mut self) {
        self.shared
            .debug_log(&format!("[worker-{:03}] Started", self.id));

        let mut ticker = ticker(self.shared.config.flush_interval);

        loop {
            tokio::select! {
                item = recv(&self.queue) => match item {
                    Some(item) => self.push(item).await,
                    None => break,
                },
                _ = tick(&mut ticker) => {
                    if !self.items.is_empty() {
                        self.shared.debug_log(&format!(
                            "[worker-{:03}] Flush interval elapsed, flushing {} items",
                            self.id,
                            self.items.len()
                        ));
                        self.flush().await;
                    }
                }
            }
        }

        if !self.items.is_empty() {
            self.flush().await;
        }

        self.shared
            .debug_log(&format!("[worker-{:03}] Stopped", self.id));
    }

    async fn push(&mut self, item: BulkIndexerItem) {
        Counters::incr(&self.shared.counters.added, 1);

        if let Err(err) = write_meta(&mut self.meta, &item, self.shared.config.index.as_deref()) {
            warn!(worker = self.id, error = %err, "Failed to encode bulk metadata");
            Counters::incr(&self.shared.counters.failed, 1);
            if let Some(on_failure) = &item.on_failure {
                let response = BulkResponseItem::default();
                guard("on_failure", || {
                    on_failure(&self.shared.root, &item, &response, Some(&err))
                });
            }
            return;
        }

        self.buf.extend_from_slice(&self.meta);
        self.buf.push(b'\n');

        if item.action.has_body() {
            if let Some(body) = &item.body {
                self.buf.extend_from_slice(body);
                self.buf.push(b'\n');
            }
        }

        self.items.push(item);

        if self.buf.len() >= self.shared.config.flush_bytes {
            self.shared.debug_log(&format!(
                "[worker-{:03}] Flush threshold reached at {} bytes",
                self.id,
                self.buf.len()
            ));
            self.flush().await;
        }
    }

    async fn flush(&mut self) {
        let shared = Arc::clone(&self.shared);
        let ctx = match &shared.config.on_flush_start {
            Some(hook) => match catch_unwind(AssertUnwindSafe(|| hook(&shared.root))) {
                Ok(ctx) => ctx,
                Err(_) => {
                    error!(callback = "on_flush_start", "Bulk indexer callback panicked");
                    shared.root.clone()
                }
            },
            None => shared.root.clone(),
        };

        let items = std::mem::take(&mut self.items);
        let body = Bytes::from(std::mem::take(&mut self.buf));

        shared.debug_log(&format!(
            "[worker-{:03}] Flushing {} items ({} bytes)",
            self.id,
            items.len(),
            body.len()
        ));

        Counters::incr(&shared.counters.requests, 1);

        match self.send(body).await {
            Ok(response) => self.dispatch(&ctx, &items, response),
            Err(err) => {
                warn!(worker = self.id, items = items.len(), error = %err, "Bulk flush failed");
                Counters::incr(&shared.counters.failed, items.len() as u64);
                let response = BulkResponseItem::default();
                for item in &items {
                    if let Some(on_failure) = &item.on_failure {
                        guard("on_failure", || on_failure(&ctx, item, &response, Some(&err)));
                    }
                }
                shared.report_error(&ctx, &err);
            }
        }

        if let Some(hook) = &shared.config.on_flush_end {
            guard("on_flush_end", || hook(&ctx));
        }
    }

    async fn send(&self, body: Bytes) -> Result<BulkResponse, BulkError> {
        let config = &self.shared.config;
        let request = BulkRequest {
            index: config.index.as_deref(),
            body,
            params: &config.params,
        }
        .to_request()?;

        let response = self.shared.transport.perform(request).await?;
        if response.is_error() {
            return Err(TransportError::Server(ServerError::from_response(&response)).into());
        }

        Ok(serde_json::from_slice(response.body())?)
    }

    fn dispatch(&self, ctx: &Context, items: &[BulkIndexerItem], response: BulkResponse) {
        let counters = &self.shared.counters;

        if response.items.len() > items.len() {
            warn!(
                worker = self.id,
                expected = items.len(),
                actual = response.items.len(),
                "Ignoring extra bulk response items"
            );
        }

        for (item, result) in items.iter().zip(&response.items) {
            let info = result.item();
            if info.status < 300 {
                counters.record_success(result.action());
                Counters::incr(&counters.flushed, 1);
                if let Some(on_success) = &item.on_success {
                    guard("on_success", || on_success(ctx, item, info));
                }
            } else {
                Counters::incr(&counters.failed, 1);
                if let Some(on_failure) = &item.on_failure {
                    guard("on_failure", || on_failure(ctx, item, info, None));
                }
            }
        }

        if response.items.len() < items.len() {
            let err = BulkError::ResponseShape {
                expected: items.len(),
                actual: response.items.len(),
            };
            warn!(worker = self.id, error = %err, "Bulk response is missing items");

            let missing = &items[response.items.len()..];
            Counters::incr(&counters.failed, missing.len() as u64);
            let empty = BulkResponseItem::default();
            for item in missing {
                if let Some(on_failure) = &item.on_failure {
                    guard("on_failure", || on_failure(ctx, item, &empty, Some(&err)));
                }
            }
            self.shared.report_error(ctx, &err);
        }
    }
}

async fn recv(queue: &Queue) -> Option<BulkIndexerItem> {
    queue.lock().await.recv().await
}

fn ticker(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
