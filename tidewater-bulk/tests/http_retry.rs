//! Bulk indexer over the HTTP transport against a mock cluster.

use std::sync::Arc;
use std::time::Duration;
use tidewater_bulk::*;
use tidewater_transport::{HttpTransport, RetryConfig, TransportConfig};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOTH_INDEXED: &str = r#"{"took":3,"errors":false,"items":[
    {"index":{"_index":"test","_id":"1","_version":1,"result":"created","status":201}},
    {"index":{"_index":"test","_id":"2","_version":1,"result":"created","status":201}}
]}"#;

fn transport_for(server: &MockServer, retry: RetryConfig) -> Arc<HttpTransport> {
    Arc::new(
        HttpTransport::new(
            TransportConfig::builder()
                .address(server.uri())
                .retry(retry)
                .build(),
        )
        .unwrap(),
    )
}

fn item(id: &str) -> BulkIndexerItem {
    BulkIndexerItem::index()
        .id(id)
        .body(format!(r#"{{"title":"foo-{}"}}"#, id))
}

#[tokio::test]
async fn test_retries_429_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(4)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(header("content-type", "application/x-ndjson"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BOTH_INDEXED))
        .mount(&server)
        .await;

    let retry = RetryConfig {
        max_retries: 5,
        ..RetryConfig::default()
    }
    .with_status_codes(vec![429, 502, 503, 504])
    .with_backoff_fn(|attempt| Duration::from_millis(100 * attempt as u64));

    let bi = BulkIndexer::new(
        BulkIndexerConfig::builder()
            .num_workers(1)
            .flush_bytes(50)
            .flush_interval(Duration::ZERO)
            .transport(transport_for(&server, retry))
            .build(),
    )
    .unwrap();

    let ctx = Context::background();
    bi.add(&ctx, item("1")).await.unwrap();
    bi.add(&ctx, item("2")).await.unwrap();
    bi.close(&ctx).await.unwrap();

    let stats = bi.stats();
    assert_eq!(stats.added, 2);
    assert_eq!(stats.flushed, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.indexed, 2);
    assert_eq!(stats.requests, 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 5);
    assert!(requests.iter().all(|r| r.body == requests[0].body));
}

#[tokio::test]
async fn test_exhausted_429_fails_every_item() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/logs/_bulk"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_string(r#"{"error":"rejected execution","status":429}"#),
        )
        .mount(&server)
        .await;

    let bi = BulkIndexer::new(
        BulkIndexerConfig::builder()
            .num_workers(1)
            .flush_interval(Duration::ZERO)
            .index("logs")
            .transport(transport_for(&server, RetryConfig::immediate(2)))
            .build(),
    )
    .unwrap();

    let failures = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let ctx = Context::background();
    for id in ["1", "2", "3"] {
        let failures = failures.clone();
        let item = item(id).on_failure(move |_, item, _, err| {
            if let Some(BulkError::Transport(e)) = err {
                failures
                    .lock()
                    .push((item.document_id.clone(), e.status_code()));
            }
        });
        bi.add(&ctx, item).await.unwrap();
    }
    bi.close(&ctx).await.unwrap();

    let failures = failures.lock();
    assert_eq!(failures.len(), 3);
    assert!(failures.iter().all(|(_, status)| *status == Some(429)));

    let stats = bi.stats();
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.requests, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
