//! Round-trip logging hooks.

use crate::{Request, Response, Result, TransportError};
use bytes::Bytes;
use std::borrow::Cow;
use std::time::{Duration, SystemTime};

/// Observer invoked once per HTTP attempt.
pub trait RoundTripLogger: Send + Sync {
    /// Called after every attempt, successful or not.
    fn log_round_trip(
        &self,
        request: &Request,
        response: Option<&Response>,
        error: Option<&TransportError>,
        started: SystemTime,
        duration: Duration,
    );

    /// Whether the logger wants to see request bodies.
    fn request_body_enabled(&self) -> bool {
        false
    }

    /// Whether the logger wants to see response bodies.
    fn response_body_enabled(&self) -> bool {
        false
    }
}

/// Hand one attempt to `logger`, hiding bodies it has not asked for.
pub(crate) fn log_attempt(
    logger: &dyn RoundTripLogger,
    request: &Request,
    result: &Result<Response>,
    started: SystemTime,
    duration: Duration,
) {
    let request = if request.body.is_some() && !logger.request_body_enabled() {
        Cow::Owned(Request {
            body: None,
            ..request.clone()
        })
    } else {
        Cow::Borrowed(request)
    };

    let response = match result {
        Ok(response) if !response.body().is_empty() && !logger.response_body_enabled() => Some(
            Cow::Owned(Response::new(response.status(), response.headers().clone(), Bytes::new())),
        ),
        Ok(response) => Some(Cow::Borrowed(response)),
        Err(_) => None,
    };

    logger.log_round_trip(
        &request,
        response.as_deref(),
        result.as_ref().err(),
        started,
        duration,
    );
}

/// Logger that emits one `tracing` event per round trip.
#[derive(Debug, Default, Clone)]
pub struct TracingLogger {
    log_body: bool,
}

impl TracingLogger {
    /// Create a new logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include request and response bodies in events.
    pub fn with_body(mut self) -> Self {
        self.log_body = true;
        self
    }
}

impl RoundTripLogger for TracingLogger {
    fn log_round_trip(
        &self,
        request: &Request,
        response: Option<&Response>,
        error: Option<&TransportError>,
        _started: SystemTime,
        duration: Duration,
    ) {
        let elapsed_ms = duration.as_millis() as u64;

        match (response, error) {
            (_, Some(error)) => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    elapsed_ms,
                    error = %error,
                    "HTTP round trip failed"
                );
            }
            (Some(response), None) => {
                tracing::debug!(
                    method = %request.method,
                    path = %request.path,
                    status = %response.status(),
                    elapsed_ms,
                    "HTTP round trip"
                );
                if self.log_body {
                    if let Some(body) = &request.body {
                        tracing::trace!(body = %String::from_utf8_lossy(body), "Request body");
                    }
                    tracing::trace!(body = %response.text(), "Response body");
                }
            }
            (None, None) => {}
        }
    }

    fn request_body_enabled(&self) -> bool {
        self.log_body
    }

    fn response_body_enabled(&self) -> bool {
        self.log_body
    }
}
