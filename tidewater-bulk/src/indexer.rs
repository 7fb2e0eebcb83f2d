//! The bulk indexer handle.

use crate::config::BulkIndexerConfig;
use crate::context::Context;
use crate::error::{BulkError, Result};
use crate::item::BulkIndexerItem;
use crate::stats::{BulkIndexerStats, Counters};
use crate::worker::{Shared, Worker};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::task::TaskTracker;
use tracing::info;

/// Multi-worker bulk indexer.
///
/// Items passed to [`add`](Self::add) are spread over the workers; each
/// worker batches the items it receives into NDJSON and flushes the batch
/// when it reaches `flush_bytes`, when `flush_interval` elapses, or when the
/// indexer is closed.
///
/// The handle is cheap to clone; all clones drive the same workers.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tidewater_bulk::{BulkIndexer, BulkIndexerConfig, BulkIndexerItem, Context};
/// use tidewater_transport::{HttpTransport, TransportConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new(TransportConfig::from_env())?;
/// let indexer = BulkIndexer::new(
///     BulkIndexerConfig::builder()
///         .transport(Arc::new(transport))
///         .index("articles")
///         .num_workers(4)
///         .build(),
/// )?;
///
/// let ctx = Context::background();
/// indexer
///     .add(&ctx, BulkIndexerItem::index().id("1").body(r#"{"title":"foo"}"#))
///     .await?;
/// indexer.close(&ctx).await?;
///
/// println!("{:?}", indexer.stats());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BulkIndexer {
    inner: Arc<Inner>,
}

struct Inner {
    shared: Arc<Shared>,
    sender: RwLock<Option<mpsc::Sender<BulkIndexerItem>>>,
    tracker: TaskTracker,
}

impl BulkIndexer {
    /// Create an indexer and start its workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: BulkIndexerConfig) -> Result<Self> {
        let (config, transport) = config.validate()?;
        let num_workers = config.num_workers;

        let shared = Arc::new(Shared {
            config,
            transport,
            counters: Counters::default(),
            root: Context::background(),
        });

        let (tx, rx) = mpsc::channel(num_workers);
        let queue = Arc::new(Mutex::new(rx));
        let tracker = TaskTracker::new();

        for id in 1..=num_workers {
            let worker = Worker::new(id, Arc::clone(&shared), Arc::clone(&queue));
            tracker.spawn(worker.run());
        }

        info!(
            workers = num_workers,
            flush_bytes = shared.config.flush_bytes,
            flush_interval = ?shared.config.flush_interval,
            "Bulk indexer started"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                shared,
                sender: RwLock::new(Some(tx)),
                tracker,
            }),
        })
    }

    /// Hand `item` to a worker.
    ///
    /// Waits until a worker has room for it or `ctx` is done, in which case
    /// the context error is returned and the item is dropped.
    pub async fn add(&self, ctx: &Context, item: BulkIndexerItem) -> Result<()> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let sender = self.inner.sender.read().clone().ok_or(BulkError::Closed)?;

        tokio::select! {
            biased;
            err = ctx.done() => Err(err),
            sent = sender.send(item) => sent.map_err(|_| BulkError::Closed),
        }
    }

    /// Stop accepting items and wait for the workers to flush and exit.
    ///
    /// If `ctx` is done first its error is returned; workers keep draining in
    /// the background and a later `close` can wait for them again.
    pub async fn close(&self, ctx: &Context) -> Result<()> {
        if self.inner.sender.write().take().is_some() {
            self.inner.shared.debug_log("Closing bulk indexer");
        }
        self.inner.tracker.close();

        tokio::select! {
            biased;
            err = ctx.done() => {
                self.inner.shared.report_error(ctx, &err);
                Err(err)
            }
            _ = self.inner.tracker.wait() => {
                info!(stats = ?self.stats(), "Bulk indexer closed");
                Ok(())
            }
        }
    }

    /// Current counter values.
    pub fn stats(&self) -> BulkIndexerStats {
        self.inner.shared.counters.snapshot()
    }

    /// The configuration in effect.
    pub fn config(&self) -> &BulkIndexerConfig {
        &self.inner.shared.config
    }
}

impl fmt::Debug for BulkIndexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkIndexer")
            .field("config", &self.inner.shared.config)
            .field("stats", &self.stats())
            .field("closed", &self.inner.sender.read().is_none())
            .finish()
    }
}
