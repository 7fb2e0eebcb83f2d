//! Integration tests for common Tidewater workflows.
//!
//! These tests drive the facade crate end to end against a mock cluster.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tidewater::prelude::*;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, Request as MockRequest, Respond, ResponseTemplate};

#[derive(Serialize)]
struct Article {
    title: String,
    views: u32,
}

/// Answers a bulk request by accepting every operation in it.
struct AcceptAll;

impl Respond for AcceptAll {
    fn respond(&self, request: &MockRequest) -> ResponseTemplate {
        let text = String::from_utf8_lossy(&request.body).into_owned();
        let mut lines = text.lines();
        let mut items = Vec::new();

        while let Some(line) = lines.next() {
            let meta: serde_json::Value = serde_json::from_str(line).unwrap();
            let (action, fields) = meta.as_object().unwrap().iter().next().unwrap();
            if action != "delete" {
                lines.next();
            }
            let id = fields["_id"].clone();
            let status = match action.as_str() {
                "index" | "create" => 201,
                _ => 200,
            };
            let mut entry = serde_json::Map::new();
            entry.insert(
                action.clone(),
                serde_json::json!({
                    "_index": "articles",
                    "_id": id,
                    "status": status,
                    "result": "ok",
                }),
            );
            items.push(serde_json::Value::Object(entry));
        }

        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({"took": 1, "errors": false, "items": items}))
    }
}

// =============================================================================
// Indexing workflow
// =============================================================================

#[tokio::test]
async fn test_index_documents_through_facade() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/articles/_bulk"))
        .and(basic_auth("admin", "secret"))
        .and(query_param("refresh", "wait_for"))
        .respond_with(AcceptAll)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(
        TransportConfig::builder()
            .address(server.uri())
            .basic_auth("admin", "secret")
            .retry(RetryConfig::disabled())
            .build(),
    )
    .unwrap();

    let indexer = BulkIndexer::new(
        BulkIndexerConfig::builder()
            .transport(Arc::new(transport))
            .index("articles")
            .num_workers(2)
            .flush_bytes(256)
            .flush_interval(Duration::from_millis(50))
            .refresh(tidewater::bulk::Refresh::WaitFor)
            .build(),
    )
    .unwrap();

    let succeeded = Arc::new(AtomicUsize::new(0));
    let ctx = Context::background();

    for i in 0..20 {
        let succeeded = succeeded.clone();
        let item = BulkIndexerItem::index()
            .id(format!("article-{}", i))
            .json(&Article {
                title: format!("Article {}", i),
                views: i,
            })
            .unwrap()
            .on_success(move |_, _, res| {
                if res.status == 201 {
                    succeeded.fetch_add(1, Ordering::SeqCst);
                }
            });
        indexer.add(&ctx, item).await.unwrap();
    }

    indexer
        .add(&ctx, BulkIndexerItem::delete("article-0"))
        .await
        .unwrap();
    indexer.close(&ctx).await.unwrap();

    let stats = indexer.stats();
    assert_eq!(stats.added, 21);
    assert_eq!(stats.flushed, 21);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.indexed, 20);
    assert_eq!(stats.deleted, 1);
    assert_eq!(succeeded.load(Ordering::SeqCst), 20);
    assert!(stats.requests > 1);
}

#[tokio::test]
async fn test_cluster_rejection_is_reported_per_item() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            r#"{"error":{"root_cause":[{"type":"security_exception","reason":"no permissions"}],"type":"security_exception","reason":"no permissions"},"status":403}"#,
        ))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(TransportConfig::builder().address(server.uri()).build())
        .unwrap();

    let errors = Arc::new(AtomicUsize::new(0));
    let seen = errors.clone();
    let indexer = BulkIndexer::new(
        BulkIndexerConfig::builder()
            .transport(Arc::new(transport))
            .num_workers(1)
            .flush_interval(Duration::ZERO)
            .on_error(move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
    )
    .unwrap();

    let kinds = Arc::new(Mutex::new(Vec::new()));
    let ctx = Context::background();
    for i in 0..3 {
        let kinds = kinds.clone();
        let item = BulkIndexerItem::create()
            .id(i.to_string())
            .body(r#"{"title":"x"}"#)
            .on_failure(move |_, _, _, err| {
                if let Some(BulkError::Transport(TransportError::Server(ServerError::Struct(e)))) =
                    err
                {
                    kinds.lock().unwrap().push(e.error.kind.clone());
                }
            });
        indexer.add(&ctx, item).await.unwrap();
    }
    indexer.close(&ctx).await.unwrap();

    assert_eq!(*kinds.lock().unwrap(), vec!["security_exception"; 3]);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(indexer.stats().failed, 3);
}
