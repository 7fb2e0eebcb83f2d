//! Multi-worker bulk indexer for OpenSearch-compatible clusters.
//!
//! Callers hand individual document operations to a [`BulkIndexer`]; a pool
//! of workers batches them into NDJSON bulk requests, flushes on a size
//! threshold or a timer, and reports each item's outcome through callbacks
//! and aggregate counters.
//!
//! - Size and interval based flushing per worker
//! - Per-item success and failure callbacks, isolated from panics
//! - Flush start/end hooks and a global error hook
//! - Pass-through bulk parameters (refresh, pipeline, routing, ...)
//! - Lock-free counters via [`BulkIndexer::stats`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tidewater_bulk::prelude::*;
//! use tidewater_transport::{HttpTransport, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new(TransportConfig::from_env())?;
//!     let indexer = BulkIndexer::new(
//!         BulkIndexerConfig::builder()
//!             .transport(Arc::new(transport))
//!             .index("articles")
//!             .flush_interval(Duration::from_secs(5))
//!             .build(),
//!     )?;
//!
//!     let ctx = Context::background();
//!     for i in 0..100 {
//!         let item = BulkIndexerItem::index()
//!             .id(i.to_string())
//!             .json(&serde_json::json!({"title": format!("Article {}", i)}))?
//!             .on_failure(|_, item, res, err| {
//!                 eprintln!("{:?}: {:?} {:?}", item.document_id, res.error, err);
//!             });
//!         indexer.add(&ctx, item).await?;
//!     }
//!
//!     indexer.close(&ctx).await?;
//!     let stats = indexer.stats();
//!     println!("indexed {} of {}", stats.indexed, stats.added);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod context;
mod error;
mod indexer;
mod item;
mod meta;
mod request;
mod response;
mod stats;
mod worker;

pub use config::{
    BulkIndexerConfig, BulkIndexerConfigBuilder, DEFAULT_FLUSH_BYTES, DEFAULT_FLUSH_INTERVAL,
    DebugLogger, OnError, OnFlushEnd, OnFlushStart,
};
pub use context::Context;
pub use error::{BulkError, Result};
pub use indexer::BulkIndexer;
pub use item::{ActiveShards, BulkAction, BulkIndexerItem, OnFailure, OnSuccess, VersionType};
pub use request::{BulkParams, BulkRequest, Refresh};
pub use response::{BulkItemResult, BulkResponse, BulkResponseItem, ShardStats};
pub use stats::BulkIndexerStats;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        BulkAction, BulkError, BulkIndexer, BulkIndexerConfig, BulkIndexerItem, BulkIndexerStats,
        BulkResponseItem, Context, Result,
    };
}
