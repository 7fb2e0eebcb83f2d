//! The bulk endpoint request.

use crate::item::ActiveShards;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;
use tidewater_transport::{HeaderMap, Request, RequestSpec};

/// Refresh policy for a bulk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Refresh the affected shards immediately.
    True,
    /// Do not refresh.
    False,
    /// Wait for the next scheduled refresh.
    WaitFor,
}

impl fmt::Display for Refresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::True => "true",
            Self::False => "false",
            Self::WaitFor => "wait_for",
        })
    }
}

/// Query parameters and headers applied to every bulk request.
#[derive(Debug, Clone, Default)]
pub struct BulkParams {
    /// Refresh policy.
    pub refresh: Option<Refresh>,
    /// Ingest pipeline.
    pub pipeline: Option<String>,
    /// Routing value.
    pub routing: Option<String>,
    /// Server-side timeout.
    pub timeout: Option<Duration>,
    /// `_source` value, e.g. `true` or a field list.
    pub source: Vec<String>,
    /// `_source_includes` fields.
    pub source_includes: Vec<String>,
    /// `_source_excludes` fields.
    pub source_excludes: Vec<String>,
    /// Active shards to wait for.
    pub wait_for_active_shards: Option<ActiveShards>,
    /// Pretty-print the response.
    pub pretty: bool,
    /// Human readable values in the response.
    pub human: bool,
    /// Include stack traces in errors.
    pub error_trace: bool,
    /// Response filter paths.
    pub filter_path: Vec<String>,
    /// Extra headers.
    pub headers: HeaderMap,
}

impl BulkParams {
    fn apply(&self, mut request: Request) -> Request {
        if let Some(refresh) = self.refresh {
            request = request.query("refresh", refresh.to_string());
        }
        if let Some(pipeline) = &self.pipeline {
            request = request.query("pipeline", pipeline);
        }
        if let Some(routing) = &self.routing {
            request = request.query("routing", routing);
        }
        if let Some(timeout) = self.timeout {
            request = request.query("timeout", format_duration(timeout));
        }
        if !self.source.is_empty() {
            request = request.query("_source", self.source.join(","));
        }
        if !self.source_includes.is_empty() {
            request = request.query("_source_includes", self.source_includes.join(","));
        }
        if !self.source_excludes.is_empty() {
            request = request.query("_source_excludes", self.source_excludes.join(","));
        }
        if let Some(shards) = self.wait_for_active_shards {
            request = request.query("wait_for_active_shards", shards.to_string());
        }
        if self.pretty {
            request = request.query("pretty", "true");
        }
        if self.human {
            request = request.query("human", "true");
        }
        if self.error_trace {
            request = request.query("error_trace", "true");
        }
        if !self.filter_path.is_empty() {
            request = request.query("filter_path", self.filter_path.join(","));
        }
        request
    }
}

/// Format a duration the way the cluster parses time units.
pub(crate) fn format_duration(d: Duration) -> String {
    if d < Duration::from_millis(1) {
        format!("{}nanos", d.as_nanos())
    } else {
        format!("{}ms", d.as_millis())
    }
}

/// A single `POST /_bulk` request.
#[derive(Debug, Clone)]
pub struct BulkRequest<'a> {
    /// Default index; goes into the path.
    pub index: Option<&'a str>,
    /// NDJSON payload.
    pub body: Bytes,
    /// Pass-through parameters.
    pub params: &'a BulkParams,
}

impl RequestSpec for BulkRequest<'_> {
    fn to_request(&self) -> tidewater_transport::Result<Request> {
        let path = match self.index {
            Some(index) if !index.is_empty() => format!("/{}/_bulk", index),
            _ => "/_bulk".to_string(),
        };

        let request = Request::post(path)
            .header("Content-Type", "application/x-ndjson")
            .header("Accept", "application/json")
            .headers(self.params.headers.clone())
            .body(self.body.clone());

        Ok(self.params.apply(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidewater_transport::Method;

    fn query_value<'r>(request: &'r Request, key: &str) -> Option<&'r str> {
        request
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_path_and_headers() {
        let params = BulkParams::default();
        let request = BulkRequest {
            index: None,
            body: Bytes::from_static(b"{\"index\":{}}\n{}\n"),
            params: &params,
        }
        .to_request()
        .unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/_bulk");
        assert_eq!(request.content_type(), Some("application/x-ndjson"));
        assert!(request.query.is_empty());
        assert_eq!(request.body.as_deref(), Some(&b"{\"index\":{}}\n{}\n"[..]));
    }

    #[test]
    fn test_default_index_in_path() {
        let params = BulkParams::default();
        let request = BulkRequest {
            index: Some("logs"),
            body: Bytes::new(),
            params: &params,
        }
        .to_request()
        .unwrap();

        assert_eq!(request.path, "/logs/_bulk");
    }

    #[test]
    fn test_pass_through_params() {
        let mut params = BulkParams {
            refresh: Some(Refresh::WaitFor),
            pipeline: Some("geoip".to_string()),
            timeout: Some(Duration::from_secs(2)),
            source_excludes: vec!["a".to_string(), "b".to_string()],
            wait_for_active_shards: Some(ActiveShards::All),
            error_trace: true,
            filter_path: vec!["items.*.error".to_string(), "took".to_string()],
            ..Default::default()
        };
        params
            .headers
            .insert("x-opaque-id", "bulk-1".parse().unwrap());

        let request = BulkRequest {
            index: None,
            body: Bytes::new(),
            params: &params,
        }
        .to_request()
        .unwrap();

        assert_eq!(query_value(&request, "refresh"), Some("wait_for"));
        assert_eq!(query_value(&request, "pipeline"), Some("geoip"));
        assert_eq!(query_value(&request, "timeout"), Some("2000ms"));
        assert_eq!(query_value(&request, "_source_excludes"), Some("a,b"));
        assert_eq!(query_value(&request, "wait_for_active_shards"), Some("all"));
        assert_eq!(query_value(&request, "error_trace"), Some("true"));
        assert_eq!(query_value(&request, "filter_path"), Some("items.*.error,took"));
        assert_eq!(query_value(&request, "pretty"), None);
        assert_eq!(request.headers.get("x-opaque-id").unwrap(), "bulk-1");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format_duration(Duration::from_micros(250)), "250000nanos");
        assert_eq!(format_duration(Duration::ZERO), "0nanos");
    }
}
