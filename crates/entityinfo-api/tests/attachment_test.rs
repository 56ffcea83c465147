//! Attachment workflow against the in-memory collaborators.

mod common;

use std::collections::BTreeMap;

use serde_json::json;

use common::{file_json, folder_json, test_state, MemoryStore};
use entityinfo_core::{
    AttachErrorType, AttributeType, Error, NodeLabel, OperationStatus, SubmittedAttributes,
};
use entityinfo_upstream::mock::{GraphCall, MockGraphStore, MockSearchIndex};

fn submit(pairs: &[(&str, &str)]) -> SubmittedAttributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.to_string())))
        .collect()
}

fn severity_manifest(store: &MemoryStore) -> i64 {
    store.seed_manifest(
        "proj",
        "Imaging",
        &[
            ("severity", AttributeType::MultipleChoice, Some("low,med,high"), false),
            ("notes", AttributeType::Text, None, true),
        ],
    )
}

fn targets(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_attach_single_file_succeeds() {
    let store = MemoryStore::new();
    let manifest_id = severity_manifest(&store);
    let graph = MockGraphStore::new().with_node(file_json(10, "x"));
    let index = MockSearchIndex::new();
    let state = test_state(&store, &graph, &index);

    let results = state
        .coordinator
        .attach(manifest_id, &submit(&[("severity", "high")]), &targets(&["x"]))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].operation_status, OperationStatus::Succeed);
    assert_eq!(results[0].geid, "x");
    assert_eq!(results[0].name, "x.txt");

    let patches: Vec<_> = graph
        .get_calls()
        .into_iter()
        .filter_map(|c| match c {
            GraphCall::UpdateNode { label, id, patch } => Some((label, id, patch)),
            _ => None,
        })
        .collect();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].0, NodeLabel::File);
    assert_eq!(patches[0].1, 10);
    assert_eq!(patches[0].2, json!({"manifest_id": manifest_id, "attr_severity": "high"}));

    let updates = index.get_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].global_entity_id, "x");
    let attrs = &updates[0].updated_fields.attributes;
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs[0].attribute_name, "severity");
    assert_eq!(attrs[0].name, "Imaging");
    assert_eq!(attrs[0].value, json!(["high"]));
    assert!(updates[0].updated_fields.time_lastmodified > 0.0);
}

#[tokio::test]
async fn test_second_attach_is_duplicate_without_writes() {
    let store = MemoryStore::new();
    let manifest_id = severity_manifest(&store);
    let graph = MockGraphStore::new().with_node(file_json(10, "x"));
    let index = MockSearchIndex::new();
    let state = test_state(&store, &graph, &index);
    let attrs = submit(&[("severity", "low")]);

    state
        .coordinator
        .attach(manifest_id, &attrs, &targets(&["x"]))
        .await
        .unwrap();
    let second = state
        .coordinator
        .attach(manifest_id, &attrs, &targets(&["x"]))
        .await
        .unwrap();

    assert_eq!(second.len(), 1);
    assert_eq!(second[0].operation_status, OperationStatus::Terminated);
    assert_eq!(second[0].error_type, Some(AttachErrorType::AttributesDuplicate));
    assert_eq!(graph.update_call_count(), 1);
    assert_eq!(index.update_call_count(), 1);
}

#[tokio::test]
async fn test_folder_cascade_yields_one_result_per_file() {
    let store = MemoryStore::new();
    let manifest_id = severity_manifest(&store);
    let graph = MockGraphStore::new()
        .with_node(folder_json(1, "root"))
        .with_child("root", file_json(2, "a"))
        .with_child("root", folder_json(3, "sub"))
        .with_child("sub", file_json(4, "b"))
        .with_child("root", file_json(5, "c"));
    let index = MockSearchIndex::new();
    let state = test_state(&store, &graph, &index);

    let results = state
        .coordinator
        .attach(manifest_id, &submit(&[("severity", "med")]), &targets(&["root"]))
        .await
        .unwrap();

    let geids: Vec<&str> = results.iter().map(|r| r.geid.as_str()).collect();
    assert_eq!(geids, vec!["a", "b", "c"]);
    assert!(results.iter().all(|r| r.is_success()));
    assert_eq!(graph.node("b").unwrap().manifest_id, Some(manifest_id));
    assert_eq!(index.update_call_count(), 3);
}

#[tokio::test]
async fn test_unknown_and_empty_targets_are_skipped() {
    let store = MemoryStore::new();
    let manifest_id = severity_manifest(&store);
    let graph = MockGraphStore::new()
        .with_node(folder_json(1, "empty"))
        .with_node(file_json(2, "x"));
    let index = MockSearchIndex::new();
    let state = test_state(&store, &graph, &index);

    let results = state
        .coordinator
        .attach(
            manifest_id,
            &submit(&[("severity", "med")]),
            &targets(&["nothing", "empty", "x"]),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].geid, "x");
}

#[tokio::test]
async fn test_mixed_batch_reports_each_file() {
    let store = MemoryStore::new();
    let manifest_id = severity_manifest(&store);
    let graph = MockGraphStore::new()
        .with_node(file_json(1, "fresh"))
        .with_node(json!({"id": 2, "labels": ["File"], "global_entity_id": "taken", "name": "taken.txt", "manifest_id": 99}))
        .with_node(file_json(3, "broken"))
        .with_update_failure(3);
    let index = MockSearchIndex::new();
    let state = test_state(&store, &graph, &index);

    let results = state
        .coordinator
        .attach(
            manifest_id,
            &submit(&[("severity", "low")]),
            &targets(&["fresh", "taken", "broken"]),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].is_success());
    assert_eq!(results[1].error_type, Some(AttachErrorType::AttributesDuplicate));
    assert_eq!(results[2].error_type, Some(AttachErrorType::InternalError));
    assert!(!results[2].index_stale);
    // No index write after a failed graph write.
    assert_eq!(index.update_call_count(), 1);
}

#[tokio::test]
async fn test_index_failure_marks_result_stale() {
    let store = MemoryStore::new();
    let manifest_id = severity_manifest(&store);
    let graph = MockGraphStore::new().with_node(file_json(10, "x"));
    let index = MockSearchIndex::new().with_failure_for("x");
    let state = test_state(&store, &graph, &index);

    let results = state
        .coordinator
        .attach(manifest_id, &submit(&[("severity", "high")]), &targets(&["x"]))
        .await
        .unwrap();

    assert_eq!(results[0].operation_status, OperationStatus::Terminated);
    assert_eq!(results[0].error_type, Some(AttachErrorType::InternalError));
    assert!(results[0].index_stale);
    // The graph write is not rolled back.
    assert_eq!(graph.node("x").unwrap().manifest_id, Some(manifest_id));

    let body = serde_json::to_value(&results[0]).unwrap();
    assert_eq!(body["index_stale"], json!(true));
}

#[tokio::test]
async fn test_missing_manifest_fails_before_resolution() {
    let store = MemoryStore::new();
    let graph = MockGraphStore::new().with_node(file_json(10, "x"));
    let index = MockSearchIndex::new();
    let state = test_state(&store, &graph, &index);

    let err = state
        .coordinator
        .attach(404, &BTreeMap::new(), &targets(&["x"]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ManifestNotFound(404)));
    assert!(graph.get_calls().is_empty());
}

#[tokio::test]
async fn test_rule_violation_fails_whole_batch() {
    let store = MemoryStore::new();
    let manifest_id = severity_manifest(&store);
    let graph = MockGraphStore::new().with_node(file_json(10, "x"));
    let index = MockSearchIndex::new();
    let state = test_state(&store, &graph, &index);

    let err = state
        .coordinator
        .attach(manifest_id, &submit(&[("severity", "urgent")]), &targets(&["x"]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid input: Invalid choice field");

    let err = state
        .coordinator
        .attach(manifest_id, &BTreeMap::new(), &targets(&["x"]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid input: Missing required attribute");

    assert!(graph.get_calls().is_empty());
    assert_eq!(index.update_call_count(), 0);
}

#[tokio::test]
async fn test_edit_replaces_values_on_attached_file() {
    let store = MemoryStore::new();
    let manifest_id = severity_manifest(&store);
    let graph = MockGraphStore::new().with_node(json!({
        "id": 7, "labels": ["File", "Core"], "global_entity_id": "x", "name": "x.txt",
        "archived": false, "manifest_id": manifest_id, "attr_severity": "low"
    }));
    let index = MockSearchIndex::new();
    let state = test_state(&store, &graph, &index);

    let node = state
        .coordinator
        .edit("x", &submit(&[("severity", "high"), ("notes", "checked")]))
        .await
        .unwrap();

    assert_eq!(node["attr_severity"], json!("high"));
    assert_eq!(node["attr_notes"], json!("checked"));
    assert_eq!(index.get_updates()[0].updated_fields.attributes.len(), 2);
}

#[tokio::test]
async fn test_edit_rejects_undeclared_key_and_unattached_file() {
    let store = MemoryStore::new();
    let manifest_id = severity_manifest(&store);
    let graph = MockGraphStore::new()
        .with_node(json!({
            "id": 7, "labels": ["File"], "global_entity_id": "x", "name": "x.txt",
            "archived": false, "manifest_id": manifest_id
        }))
        .with_node(file_json(8, "plain"));
    let index = MockSearchIndex::new();
    let state = test_state(&store, &graph, &index);

    let err = state
        .coordinator
        .edit("x", &submit(&[("severity", "low"), ("colour", "red")]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid input: Not a valid attribute");

    let err = state
        .coordinator
        .edit("plain", &submit(&[("severity", "low")]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = state
        .coordinator
        .edit("missing", &submit(&[]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not found: File not found");
    assert_eq!(graph.update_call_count(), 0);
}

#[tokio::test]
async fn test_edit_index_failure_is_internal_error() {
    let store = MemoryStore::new();
    let manifest_id = severity_manifest(&store);
    let graph = MockGraphStore::new().with_node(json!({
        "id": 7, "labels": ["File"], "global_entity_id": "x", "name": "x.txt",
        "archived": false, "manifest_id": manifest_id
    }));
    let index = MockSearchIndex::new().with_failure_for("x");
    let state = test_state(&store, &graph, &index);

    let err = state
        .coordinator
        .edit("x", &submit(&[("severity", "med")]))
        .await
        .unwrap_err();
    match err {
        Error::Internal(msg) => assert_eq!(msg, "Elastic Search Error: {}"),
        other => panic!("unexpected error: {other:?}"),
    }
}
