//! Items submitted to the bulk indexer.

use crate::context::Context;
use crate::error::{BulkError, Result};
use crate::response::BulkResponseItem;
use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Bulk action verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    /// Index a document, replacing any existing one.
    Index,
    /// Create a document, failing if it exists.
    Create,
    /// Partially update a document.
    Update,
    /// Delete a document.
    Delete,
}

impl BulkAction {
    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether a source line follows the metadata line.
    pub fn has_body(&self) -> bool {
        !matches!(self, Self::Delete)
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version type for optimistic concurrency control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    /// Internal versioning.
    Internal,
    /// External version, must be greater than the stored one.
    External,
    /// External version, must be greater than or equal to the stored one.
    ExternalGte,
}

/// Active shard count to wait for: an integer or `all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveShards {
    /// Wait for all shard copies.
    All,
    /// Wait for this many shard copies.
    Count(u32),
}

impl fmt::Display for ActiveShards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Count(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for ActiveShards {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Count(n) => serializer.serialize_u32(*n),
        }
    }
}

/// Success callback: runs on a worker once the item's response entry is in.
pub type OnSuccess = Arc<dyn Fn(&Context, &BulkIndexerItem, &BulkResponseItem) + Send + Sync>;

/// Failure callback.
///
/// `error` is set when the whole flush failed; it is `None` when the cluster
/// rejected just this item, in which case the response entry carries the
/// error.
pub type OnFailure = Arc<
    dyn Fn(&Context, &BulkIndexerItem, &BulkResponseItem, Option<&BulkError>) + Send + Sync,
>;

/// One logical bulk operation.
///
/// Once handed to [`BulkIndexer::add`](crate::BulkIndexer::add) the item is
/// owned by the indexer; callbacks only ever see it by shared reference.
///
/// Callbacks run on worker tasks and delay the worker's next flush while they
/// run. They must not call `add` on the same indexer.
#[derive(Clone)]
pub struct BulkIndexerItem {
    /// Action verb.
    pub action: BulkAction,
    /// Target index; falls back to the indexer default.
    pub index: Option<String>,
    /// Document id.
    pub document_id: Option<String>,
    /// Source payload; not sent for deletes.
    pub body: Option<Bytes>,
    /// Only apply if the document has this sequence number.
    pub if_seq_no: Option<i64>,
    /// Only apply if the document has this primary term.
    pub if_primary_term: Option<i64>,
    /// Explicit document version.
    pub version: Option<i64>,
    /// Version type.
    pub version_type: Option<VersionType>,
    /// Conflict retries; update only.
    pub retry_on_conflict: Option<u32>,
    /// Active shards to wait for.
    pub wait_for_active_shards: Option<ActiveShards>,
    /// Success callback.
    pub on_success: Option<OnSuccess>,
    /// Failure callback.
    pub on_failure: Option<OnFailure>,
    /// Caller supplied context for callbacks.
    pub metadata: Option<Arc<dyn Any + Send + Sync>>,
}

impl BulkIndexerItem {
    /// Create an item with the given action.
    pub fn new(action: BulkAction) -> Self {
        Self {
            action,
            index: None,
            document_id: None,
            body: None,
            if_seq_no: None,
            if_primary_term: None,
            version: None,
            version_type: None,
            retry_on_conflict: None,
            wait_for_active_shards: None,
            on_success: None,
            on_failure: None,
            metadata: None,
        }
    }

    /// `index` action.
    pub fn index() -> Self {
        Self::new(BulkAction::Index)
    }

    /// `create` action.
    pub fn create() -> Self {
        Self::new(BulkAction::Create)
    }

    /// `update` action. The body is the update request, e.g. `{"doc":{...}}`.
    pub fn update() -> Self {
        Self::new(BulkAction::Update)
    }

    /// `delete` action.
    pub fn delete(id: impl Into<String>) -> Self {
        Self::new(BulkAction::Delete).id(id)
    }

    /// Set the document id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    /// Set the target index.
    pub fn target_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Set the raw source payload. Must be a single line of JSON.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the source payload.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = Some(Bytes::from(serde_json::to_vec(value)?));
        Ok(self)
    }

    /// Only apply if the document has this sequence number.
    pub fn if_seq_no(mut self, seq_no: i64) -> Self {
        self.if_seq_no = Some(seq_no);
        self
    }

    /// Only apply if the document has this primary term.
    pub fn if_primary_term(mut self, primary_term: i64) -> Self {
        self.if_primary_term = Some(primary_term);
        self
    }

    /// Set an explicit version.
    pub fn version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the version type. Only sent together with a document id.
    pub fn version_type(mut self, version_type: VersionType) -> Self {
        self.version_type = Some(version_type);
        self
    }

    /// Set the retry-on-conflict count (update only).
    pub fn retry_on_conflict(mut self, retries: u32) -> Self {
        self.retry_on_conflict = Some(retries);
        self
    }

    /// Set the active shards to wait for.
    pub fn wait_for_active_shards(mut self, shards: ActiveShards) -> Self {
        self.wait_for_active_shards = Some(shards);
        self
    }

    /// Set the success callback.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context, &BulkIndexerItem, &BulkResponseItem) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Set the failure callback.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context, &BulkIndexerItem, &BulkResponseItem, Option<&BulkError>)
            + Send
            + Sync
            + 'static,
    {
        self.on_failure = Some(Arc::new(f));
        self
    }

    /// Attach caller metadata.
    pub fn metadata<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.metadata = Some(Arc::new(value));
        self
    }

    /// Downcast the attached metadata.
    pub fn metadata_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.metadata.as_ref().and_then(|m| m.downcast_ref::<T>())
    }
}

impl fmt::Debug for BulkIndexerItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkIndexerItem")
            .field("action", &self.action)
            .field("index", &self.index)
            .field("document_id", &self.document_id)
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .field("if_seq_no", &self.if_seq_no)
            .field("if_primary_term", &self.if_primary_term)
            .field("version", &self.version)
            .field("version_type", &self.version_type)
            .field("retry_on_conflict", &self.retry_on_conflict)
            .field("wait_for_active_shards", &self.wait_for_active_shards)
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let item = BulkIndexerItem::update()
            .id("42")
            .target_index("logs")
            .body(r#"{"doc":{"level":"warn"}}"#)
            .retry_on_conflict(3);

        assert_eq!(item.action, BulkAction::Update);
        assert_eq!(item.document_id.as_deref(), Some("42"));
        assert_eq!(item.index.as_deref(), Some("logs"));
        assert_eq!(item.retry_on_conflict, Some(3));
    }

    #[test]
    fn test_json_body() {
        let item = BulkIndexerItem::index()
            .json(&serde_json::json!({"title": "foo"}))
            .unwrap();
        assert_eq!(item.body.as_deref(), Some(&br#"{"title":"foo"}"#[..]));
    }

    #[test]
    fn test_metadata_downcast() {
        let item = BulkIndexerItem::delete("1").metadata(17_u32);
        assert_eq!(item.metadata_ref::<u32>(), Some(&17));
        assert_eq!(item.metadata_ref::<String>(), None);
    }

    #[test]
    fn test_active_shards_serialization() {
        assert_eq!(serde_json::to_string(&ActiveShards::All).unwrap(), r#""all""#);
        assert_eq!(serde_json::to_string(&ActiveShards::Count(2)).unwrap(), "2");
        assert_eq!(ActiveShards::Count(2).to_string(), "2");
    }

    #[test]
    fn test_delete_has_no_body() {
        assert!(!BulkAction::Delete.has_body());
        assert!(BulkAction::Create.has_body());
        assert_eq!(BulkAction::Update.to_string(), "update");
    }
}
