//! Bulk indexer configuration.

use crate::context::Context;
use crate::error::{BulkError, Result};
use crate::request::{BulkParams, Refresh};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tidewater_transport::Transport;

/// Flush threshold used when none is configured.
pub const DEFAULT_FLUSH_BYTES: usize = 5 * 1024 * 1024;

/// Flush interval used when none is configured.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// Hook run before each flush. The returned context is used for the flush.
pub type OnFlushStart = Arc<dyn Fn(&Context) -> Context + Send + Sync>;

/// Hook run after each flush.
pub type OnFlushEnd = Arc<dyn Fn(&Context) + Send + Sync>;

/// Hook run for indexer-level errors.
pub type OnError = Arc<dyn Fn(&Context, &BulkError) + Send + Sync>;

/// Sink for indexer debug messages.
pub type DebugLogger = Arc<dyn Fn(&str) + Send + Sync>;

/// Bulk indexer configuration.
#[derive(Clone)]
pub struct BulkIndexerConfig {
    /// Number of workers.
    pub num_workers: usize,
    /// Flush once a worker's buffer reaches this many bytes.
    pub flush_bytes: usize,
    /// Flush every worker at this period; zero disables periodic flushes.
    pub flush_interval: Duration,
    /// Default index name.
    pub index: Option<String>,
    /// Transport used for flushes.
    pub transport: Option<Arc<dyn Transport>>,
    /// Called before each flush.
    pub on_flush_start: Option<OnFlushStart>,
    /// Called after each flush.
    pub on_flush_end: Option<OnFlushEnd>,
    /// Called for flush and close errors.
    pub on_error: Option<OnError>,
    /// Debug message sink.
    pub debug_logger: Option<DebugLogger>,
    /// Parameters applied to every bulk request.
    pub params: BulkParams,
}

impl Default for BulkIndexerConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            flush_bytes: DEFAULT_FLUSH_BYTES,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            index: None,
            transport: None,
            on_flush_start: None,
            on_flush_end: None,
            on_error: None,
            debug_logger: None,
            params: BulkParams::default(),
        }
    }
}

impl fmt::Debug for BulkIndexerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkIndexerConfig")
            .field("num_workers", &self.num_workers)
            .field("flush_bytes", &self.flush_bytes)
            .field("flush_interval", &self.flush_interval)
            .field("index", &self.index)
            .field("transport", &self.transport.is_some())
            .field("on_flush_start", &self.on_flush_start.is_some())
            .field("on_flush_end", &self.on_flush_end.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("debug_logger", &self.debug_logger.is_some())
            .field("params", &self.params)
            .finish()
    }
}

impl BulkIndexerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> BulkIndexerConfigBuilder {
        BulkIndexerConfigBuilder::default()
    }

    /// Check the configuration and fill in defaults.
    pub(crate) fn validate(mut self) -> Result<(Self, Arc<dyn Transport>)> {
        if self.num_workers == 0 {
            return Err(BulkError::Config(
                "num_workers must be greater than zero".to_string(),
            ));
        }
        let transport = self
            .transport
            .clone()
            .ok_or_else(|| BulkError::Config("transport is required".to_string()))?;
        if self.flush_bytes == 0 {
            self.flush_bytes = DEFAULT_FLUSH_BYTES;
        }
        Ok((self, transport))
    }
}

/// Builder for bulk indexer configuration.
#[derive(Debug, Default)]
pub struct BulkIndexerConfigBuilder {
    config: BulkIndexerConfig,
}

impl BulkIndexerConfigBuilder {
    /// Set the number of workers.
    pub fn num_workers(mut self, n: usize) -> Self {
        self.config.num_workers = n;
        self
    }

    /// Set the flush threshold in bytes.
    pub fn flush_bytes(mut self, bytes: usize) -> Self {
        self.config.flush_bytes = bytes;
        self
    }

    /// Set the flush interval. `Duration::ZERO` disables periodic flushes.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// Set the default index.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.config.index = Some(index.into());
        self
    }

    /// Set the transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    /// Set the flush start hook.
    pub fn on_flush_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> Context + Send + Sync + 'static,
    {
        self.config.on_flush_start = Some(Arc::new(f));
        self
    }

    /// Set the flush end hook.
    pub fn on_flush_end<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) + Send + Sync + 'static,
    {
        self.config.on_flush_end = Some(Arc::new(f));
        self
    }

    /// Set the error hook.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context, &BulkError) + Send + Sync + 'static,
    {
        self.config.on_error = Some(Arc::new(f));
        self
    }

    /// Set the debug message sink.
    pub fn debug_logger<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.config.debug_logger = Some(Arc::new(f));
        self
    }

    /// Set the refresh policy.
    pub fn refresh(mut self, refresh: Refresh) -> Self {
        self.config.params.refresh = Some(refresh);
        self
    }

    /// Set the ingest pipeline.
    pub fn pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.config.params.pipeline = Some(pipeline.into());
        self
    }

    /// Set the routing value.
    pub fn routing(mut self, routing: impl Into<String>) -> Self {
        self.config.params.routing = Some(routing.into());
        self
    }

    /// Set all pass-through parameters.
    pub fn params(mut self, params: BulkParams) -> Self {
        self.config.params = params;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> BulkIndexerConfig {
        self.config
    }
}
