//! # Tidewater Transport
//!
//! The HTTP layer underneath the Tidewater bulk indexer: it performs prepared
//! requests against an OpenSearch-compatible cluster, retries on configured
//! statuses with bounded backoff, and classifies server error bodies.
//!
//! ## Features
//!
//! - **Retry with Backoff**: retry-on-status set, network error retry, custom backoff
//! - **Endpoint Pool**: round-robin across healthy addresses
//! - **Credentials**: basic or bearer credentials plus a pluggable signer
//! - **Compression**: optional gzip request bodies
//! - **Error Decoding**: the five server error shapes as distinct variants
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tidewater_transport::{HttpTransport, Request, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new(
//!         TransportConfig::builder()
//!             .address("http://localhost:9200")
//!             .basic_auth("admin", "admin")
//!             .build(),
//!     )?;
//!
//!     let (response, health): (_, serde_json::Value) = transport
//!         .execute_json(&Request::get("/_cluster/health"))
//!         .await?;
//!
//!     println!("{} {}", response.status_line(), health["status"]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod logger;
mod pool;
mod request;
mod response;
mod retry;
mod server_error;
mod transport;

pub use auth::{Credentials, Signer};
pub use config::{
    ADDRESS_ENV_VAR, DEFAULT_ADDRESS, TransportConfig, TransportConfigBuilder, addresses_from_env,
};
pub use error::{Result, TransportError};
pub use logger::{RoundTripLogger, TracingLogger};
pub use pool::{Connection, ConnectionPool};
pub use request::{Request, RequestSpec};
pub use response::Response;
pub use retry::{BackoffFn, BackoffStrategy, DEFAULT_RETRY_ON_STATUS, RetryConfig};
pub use server_error::{
    ErrorCause, FlatError, MessageError, ReasonError, ServerError, StringError, StructError,
};
pub use transport::{HttpTransport, Transport};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use url::Url;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Credentials, HttpTransport, Request, RequestSpec, Response, Result, RetryConfig,
        ServerError, Transport, TransportConfig, TransportError,
    };
}
