//! Bulk response bodies.

use serde::{Deserialize, Serialize};
use tidewater_transport::ErrorCause;

/// Bulk API response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkResponse {
    /// Time taken in milliseconds.
    #[serde(default)]
    pub took: u64,
    /// Whether any item failed.
    #[serde(default)]
    pub errors: bool,
    /// One entry per submitted item, in order.
    #[serde(default)]
    pub items: Vec<BulkItemResult>,
}

/// Response entry keyed by the action the cluster performed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkItemResult {
    /// Index result.
    Index(BulkResponseItem),
    /// Create result.
    Create(BulkResponseItem),
    /// Update result.
    Update(BulkResponseItem),
    /// Delete result.
    Delete(BulkResponseItem),
}

impl BulkItemResult {
    /// The action key of this entry.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Index(_) => "index",
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }

    /// The entry body.
    pub fn item(&self) -> &BulkResponseItem {
        match self {
            Self::Index(item) | Self::Create(item) | Self::Update(item) | Self::Delete(item) => {
                item
            }
        }
    }
}

/// Outcome of a single item.
///
/// Whole-flush failures hand callbacks an empty (default) value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkResponseItem {
    /// Index name.
    #[serde(rename = "_index", default)]
    pub index: String,
    /// Document ID.
    #[serde(rename = "_id", default)]
    pub document_id: String,
    /// Document version.
    #[serde(rename = "_version", default)]
    pub version: i64,
    /// Result, e.g. `created`, `updated`, `noop`.
    #[serde(default)]
    pub result: String,
    /// HTTP status for this item.
    #[serde(default)]
    pub status: u16,
    /// Sequence number.
    #[serde(rename = "_seq_no", default)]
    pub seq_no: i64,
    /// Primary term.
    #[serde(rename = "_primary_term", default)]
    pub primary_term: i64,
    /// Shard summary.
    #[serde(rename = "_shards", default)]
    pub shards: ShardStats,
    /// Error details when the item failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCause>,
}

impl BulkResponseItem {
    /// Check if the operation was successful.
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Shard counts for an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardStats {
    /// Shards involved.
    #[serde(default)]
    pub total: u32,
    /// Shards that succeeded.
    #[serde(default)]
    pub successful: u32,
    /// Shards that failed.
    #[serde(default)]
    pub failed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_response() {
        let body = r#"{
            "took": 30,
            "errors": true,
            "items": [
                {"index": {"_index": "test", "_id": "1", "_version": 1, "result": "created", "status": 201,
                    "_shards": {"total": 2, "successful": 1, "failed": 0}, "_seq_no": 0, "_primary_term": 1}},
                {"create": {"_index": "test", "_id": "2", "status": 409,
                    "error": {"type": "version_conflict_engine_exception", "reason": "[2]: version conflict, document already exists"}}}
            ]
        }"#;

        let response: BulkResponse = serde_json::from_str(body).unwrap();
        assert!(response.errors);
        assert_eq!(response.items.len(), 2);

        assert_eq!(response.items[0].action(), "index");
        let first = response.items[0].item();
        assert!(first.is_success());
        assert_eq!(first.shards.total, 2);

        let second = response.items[1].item();
        assert!(!second.is_success());
        assert_eq!(
            second.error.as_ref().unwrap().kind,
            "version_conflict_engine_exception"
        );
    }

    #[test]
    fn test_empty_item_is_default() {
        let item = BulkResponseItem::default();
        assert_eq!(item.status, 0);
        assert!(item.error.is_none());
        assert!(!item.is_success());
    }
}
