//! Attachment scenarios over HTTP against wiremock collaborators.

mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::MemoryStore;
use entityinfo_api::AppState;
use entityinfo_core::{AttachErrorType, AttributeType, OperationStatus, SubmittedAttributes};
use entityinfo_upstream::{HttpGraphStore, HttpSearchIndex, UpstreamConfig};

fn http_state(store: &MemoryStore, server: &MockServer) -> AppState {
    let config = UpstreamConfig::with_base_url(server.uri());
    AppState::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(HttpGraphStore::new(&config).expect("graph client")),
        Arc::new(HttpSearchIndex::new(&config).expect("index client")),
    )
}

fn severity(value: &str) -> SubmittedAttributes {
    [("severity".to_string(), Some(value.to_string()))]
        .into_iter()
        .collect()
}

fn seed(store: &MemoryStore) -> i64 {
    store.seed_manifest(
        "proj",
        "Imaging",
        &[("severity", AttributeType::MultipleChoice, Some("low,med,high"), false)],
    )
}

#[tokio::test]
async fn test_attach_patches_node_and_index_once() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    let manifest_id = seed(&store);

    Mock::given(method("POST"))
        .and(path("/v1/neo4j/nodes/File/query"))
        .and(body_json(json!({"global_entity_id": "x", "archived": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 10, "labels": ["File", "Greenroom"], "global_entity_id": "x",
            "name": "x.txt", "archived": false
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/neo4j/nodes/File/node/10"))
        .and(body_json(json!({"manifest_id": manifest_id, "attr_severity": "high"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 10}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/entity/file"))
        .and(body_partial_json(json!({
            "global_entity_id": "x",
            "updated_fields": {
                "attributes": [{"attribute_name": "severity", "name": "Imaging", "value": ["high"]}]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let results = http_state(&store, &server)
        .coordinator
        .attach(manifest_id, &severity("high"), &["x".to_string()])
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].operation_status, OperationStatus::Succeed);
}

#[tokio::test]
async fn test_attached_file_gets_no_writes() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    let manifest_id = seed(&store);

    Mock::given(method("POST"))
        .and(path("/v1/neo4j/nodes/File/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 10, "labels": ["File", "Greenroom"], "global_entity_id": "x",
            "name": "x.txt", "archived": false, "manifest_id": manifest_id,
            "attr_severity": "high"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let results = http_state(&store, &server)
        .coordinator
        .attach(manifest_id, &severity("low"), &["x".to_string()])
        .await
        .unwrap();

    assert_eq!(results[0].operation_status, OperationStatus::Terminated);
    assert_eq!(results[0].error_type, Some(AttachErrorType::AttributesDuplicate));
}

#[tokio::test]
async fn test_folder_target_walks_relations() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    let manifest_id = seed(&store);

    Mock::given(method("POST"))
        .and(path("/v1/neo4j/nodes/File/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/neo4j/nodes/Folder/query"))
        .and(body_json(json!({"global_entity_id": "root", "archived": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1, "labels": ["Folder"], "global_entity_id": "root", "name": "raw"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/neo4j/relations/query"))
        .and(body_partial_json(json!({"query": {"start_params": {"global_entity_id": "root"}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": 2, "labels": ["File", "Core"], "global_entity_id": "a", "name": "a.txt"},
                {"id": 3, "labels": ["File", "Core"], "global_entity_id": "b", "name": "b.txt"}
            ],
            "total": 2
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/v1/neo4j/nodes/File/node/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{}])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/entity/file"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let results = http_state(&store, &server)
        .coordinator
        .attach(manifest_id, &severity("med"), &["root".to_string()])
        .await
        .unwrap();

    let geids: Vec<&str> = results.iter().map(|r| r.geid.as_str()).collect();
    assert_eq!(geids, vec!["a", "b"]);
    assert!(results.iter().all(|r| r.is_success()));
}

#[tokio::test]
async fn test_index_rejection_leaves_result_stale() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    let manifest_id = seed(&store);

    Mock::given(method("POST"))
        .and(path("/v1/neo4j/nodes/File/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 10, "labels": ["File"], "global_entity_id": "x", "name": "x.txt"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/neo4j/nodes/File/node/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 10}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/entity/file"))
        .respond_with(ResponseTemplate::new(503).set_body_string("index down"))
        .expect(1)
        .mount(&server)
        .await;

    let results = http_state(&store, &server)
        .coordinator
        .attach(manifest_id, &severity("high"), &["x".to_string()])
        .await
        .unwrap();

    assert_eq!(results[0].error_type, Some(AttachErrorType::InternalError));
    assert!(results[0].index_stale);
}
