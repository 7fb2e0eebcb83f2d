//! Action/metadata line encoding.

use crate::error::Result;
use crate::item::{ActiveShards, BulkAction, BulkIndexerItem, VersionType};
use serde::Serialize;

#[derive(Serialize)]
struct Metadata<'a> {
    #[serde(rename = "_index", skip_serializing_if = "Option::is_none")]
    index: Option<&'a str>,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    if_seq_no: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    if_primary_term: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_type: Option<VersionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_on_conflict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_for_active_shards: Option<ActiveShards>,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum ActionLine<'a> {
    Index(Metadata<'a>),
    Create(Metadata<'a>),
    Update(Metadata<'a>),
    Delete(Metadata<'a>),
}

/// Write the metadata line for `item` (without the trailing newline) into `out`.
///
/// `out` is cleared first so that workers can reuse one scratch buffer.
pub(crate) fn write_meta(
    out: &mut Vec<u8>,
    item: &BulkIndexerItem,
    default_index: Option<&str>,
) -> Result<()> {
    out.clear();

    let id = item.document_id.as_deref();
    let meta = Metadata {
        index: item.index.as_deref().or(default_index),
        id,
        if_seq_no: item.if_seq_no,
        if_primary_term: item.if_primary_term,
        version: id.and(item.version),
        version_type: id.and(item.version_type),
        retry_on_conflict: match item.action {
            BulkAction::Update => item.retry_on_conflict,
            _ => None,
        },
        wait_for_active_shards: item.wait_for_active_shards,
    };

    let line = match item.action {
        BulkAction::Index => ActionLine::Index(meta),
        BulkAction::Create => ActionLine::Create(meta),
        BulkAction::Update => ActionLine::Update(meta),
        BulkAction::Delete => ActionLine::Delete(meta),
    };

    serde_json::to_writer(&mut *out, &line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(item: &BulkIndexerItem, default_index: Option<&str>) -> String {
        let mut out = Vec::new();
        write_meta(&mut out, item, default_index).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_bare_action() {
        assert_eq!(meta(&BulkIndexerItem::index(), None), r#"{"index":{}}"#);
        assert_eq!(meta(&BulkIndexerItem::create(), None), r#"{"create":{}}"#);
    }

    #[test]
    fn test_index_and_id() {
        let item = BulkIndexerItem::index().target_index("test").id("42");
        assert_eq!(meta(&item, None), r#"{"index":{"_index":"test","_id":"42"}}"#);
    }

    #[test]
    fn test_default_index_applies() {
        let item = BulkIndexerItem::delete("1");
        assert_eq!(
            meta(&item, Some("logs")),
            r#"{"delete":{"_index":"logs","_id":"1"}}"#
        );

        let item = BulkIndexerItem::delete("1").target_index("other");
        assert_eq!(
            meta(&item, Some("logs")),
            r#"{"delete":{"_index":"other","_id":"1"}}"#
        );
    }

    #[test]
    fn test_full_field_order() {
        let item = BulkIndexerItem::update()
            .target_index("test")
            .id("7")
            .if_seq_no(3)
            .if_primary_term(1)
            .version(5)
            .version_type(VersionType::ExternalGte)
            .retry_on_conflict(2)
            .wait_for_active_shards(ActiveShards::All);

        assert_eq!(
            meta(&item, None),
            r#"{"update":{"_index":"test","_id":"7","if_seq_no":3,"if_primary_term":1,"version":5,"version_type":"external_gte","retry_on_conflict":2,"wait_for_active_shards":"all"}}"#
        );
    }

    #[test]
    fn test_retry_on_conflict_only_for_update() {
        let item = BulkIndexerItem::index().id("1").retry_on_conflict(3);
        assert_eq!(meta(&item, None), r#"{"index":{"_id":"1"}}"#);
    }

    #[test]
    fn test_version_needs_id() {
        let item = BulkIndexerItem::index()
            .version(2)
            .version_type(VersionType::External);
        assert_eq!(meta(&item, None), r#"{"index":{}}"#);

        let item = BulkIndexerItem::index().version(2);
        assert_eq!(meta(&item, None), r#"{"index":{}}"#);

        let item = BulkIndexerItem::index().id("1").version(2);
        assert_eq!(meta(&item, None), r#"{"index":{"_id":"1","version":2}}"#);
    }

    #[test]
    fn test_numeric_active_shards() {
        let item = BulkIndexerItem::create()
            .id("9")
            .wait_for_active_shards(ActiveShards::Count(2));
        assert_eq!(
            meta(&item, None),
            r#"{"create":{"_id":"9","wait_for_active_shards":2}}"#
        );
    }

    #[test]
    fn test_scratch_is_reused() {
        let mut out = Vec::with_capacity(512);
        write_meta(&mut out, &BulkIndexerItem::index().id("1"), None).unwrap();
        write_meta(&mut out, &BulkIndexerItem::delete("2"), None).unwrap();
        assert_eq!(out, br#"{"delete":{"_id":"2"}}"#);
    }
}
