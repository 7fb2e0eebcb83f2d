// Tidewater - bulk indexing for OpenSearch-compatible clusters
//
// This library bundles the HTTP transport and the multi-worker bulk indexer
// behind a single dependency.

// Re-export the member crates
pub use tidewater_bulk as bulk;
pub use tidewater_transport as transport;

// Re-export the types most programs touch
pub use tidewater_bulk::{
    BulkError, BulkIndexer, BulkIndexerConfig, BulkIndexerItem, BulkIndexerStats, Context,
};
pub use tidewater_transport::{HttpTransport, RetryConfig, TransportConfig, TransportError};

// Prelude for common imports
pub mod prelude {
    pub use crate::bulk::{
        BulkAction, BulkError, BulkIndexer, BulkIndexerConfig, BulkIndexerItem, BulkIndexerStats,
        BulkResponseItem, Context,
    };
    pub use crate::transport::{
        Credentials, HttpTransport, Request, RequestSpec, Response, RetryConfig, ServerError,
        Transport, TransportConfig, TransportError,
    };
}
