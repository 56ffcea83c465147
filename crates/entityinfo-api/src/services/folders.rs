//! Folder registration.
//!
//! A folder below the top level is mirrored to the search index before its
//! graph node is written. Top-level folders stay out of the index.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use entityinfo_core::{
    BatchCreateFoldersRequest, CreateFolderRequest, Error, GraphNode, GraphStore, NodeLabel,
    OwnRelation, Result, SearchIndex, Zone,
};

const INDEX_FAILURE: &str = "Error while creating folder node in elastic search";

fn folder_zone(raw: &str) -> Result<Zone> {
    raw.parse()
        .map_err(|_| Error::InvalidInput("Invalid zone parameter".to_string()))
}

fn folder_geid(req: &CreateFolderRequest) -> String {
    req.global_entity_id
        .clone()
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

/// Creates and lists Folder nodes.
#[derive(Clone)]
pub struct FolderService {
    graph: Arc<dyn GraphStore>,
    index: Arc<dyn SearchIndex>,
}

impl FolderService {
    pub fn new(graph: Arc<dyn GraphStore>, index: Arc<dyn SearchIndex>) -> Self {
        Self { graph, index }
    }

    async fn index_folder(&self, req: &CreateFolderRequest, geid: &str, zone: Zone) -> Result<()> {
        let doc = req.index_document(geid, zone, Utc::now());
        self.index.create_folder_entry(&doc).await.map_err(|e| {
            warn!(subsystem = "api", component = "folders", geid, error = %e, "Folder index write failed");
            Error::Internal(INDEX_FAILURE.to_string())
        })
    }

    /// Node that will own the new folder: its parent folder, or the project
    /// container for top-level and trash-bin root folders.
    async fn owner(&self, req: &CreateFolderRequest) -> Result<GraphNode> {
        let under_parent =
            !req.is_top_level() && !req.folder_parent_geid.is_empty() && !req.is_trashbin_root();
        let (label, filters, missing) = if under_parent {
            (
                NodeLabel::Folder,
                json!({ "global_entity_id": req.folder_parent_geid }),
                "Parent folder not found",
            )
        } else {
            (
                NodeLabel::Container,
                json!({ "code": req.project_code }),
                "Project not found",
            )
        };
        self.graph
            .query_nodes(label, filters)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(missing.to_string()))
    }

    /// Create one folder and link it to its owner.
    #[instrument(skip(self, req), fields(subsystem = "api", component = "folders", op = "create", project_code = %req.project_code))]
    pub async fn create(&self, req: &CreateFolderRequest) -> Result<GraphNode> {
        let zone = folder_zone(&req.zone)?;
        let geid = folder_geid(req);
        let owner = self.owner(req).await?;

        if !req.is_top_level() {
            self.index_folder(req, &geid, zone).await?;
        }

        let mut properties = req.node_properties(&geid);
        let mut labels = vec![zone.label().to_string()];
        labels.extend(req.extra_labels.iter().cloned());
        properties.insert("extra_labels".into(), labels.into());

        let node = self
            .graph
            .create_node(NodeLabel::Folder, JsonValue::Object(properties))
            .await?;
        self.graph.link(owner.id, node.id).await?;

        info!(geid = %node.global_entity_id, owner_id = owner.id, "Folder created");
        Ok(node)
    }

    /// Create many folders in one zone.
    ///
    /// With `link_container` every folder is linked to its project
    /// container. Without it, nested folders are indexed and no edges are
    /// written.
    #[instrument(skip(self, req), fields(subsystem = "api", component = "folders", op = "create_batch", folder_count = req.payload.len()))]
    pub async fn create_batch(&self, req: &BatchCreateFoldersRequest) -> Result<JsonValue> {
        let zone = folder_zone(&req.zone)?;
        let mut nodes = Vec::with_capacity(req.payload.len());
        let mut relations = Vec::new();

        for item in &req.payload {
            let geid = folder_geid(item);
            if req.link_container {
                relations.push(OwnRelation {
                    start_params: json!({ "code": item.project_code }),
                    end_params: json!({
                        "project_code": item.project_code,
                        "global_entity_id": geid,
                    }),
                });
            } else if !item.is_top_level() {
                self.index_folder(item, &geid, zone).await?;
            }
            nodes.push(JsonValue::Object(item.node_properties(&geid)));
        }

        self.graph
            .create_nodes(NodeLabel::Folder, nodes, &[zone.label().to_string()])
            .await
            .map_err(|e| {
                warn!(error = %e, "Batch folder create failed");
                Error::Internal("failed to create folders".to_string())
            })?;

        if !relations.is_empty() {
            self.graph
                .link_batch(NodeLabel::Container, NodeLabel::Folder, &relations)
                .await
                .map_err(|e| {
                    warn!(error = %e, "Batch folder link failed");
                    Error::Internal("failed to link projects with folders".to_string())
                })?;
        }

        debug!(relation_count = relations.len(), "Folders created");
        Ok(json!({ "result": "success" }))
    }

    /// Folders of a project in one zone, optionally narrowed by path and uploader.
    pub async fn list(
        &self,
        zone: &str,
        project_code: &str,
        folder_relative_path: Option<&str>,
        uploader: Option<&str>,
    ) -> Result<Vec<GraphNode>> {
        let zone = folder_zone(zone)?;
        let mut filters = json!({ "project_code": project_code });
        if let Some(path) = folder_relative_path.filter(|p| !p.is_empty()) {
            filters["folder_relative_path"] = path.into();
        }
        if let Some(uploader) = uploader.filter(|u| !u.is_empty()) {
            filters["uploader"] = uploader.into();
        }

        let folders = self.graph.query_nodes(NodeLabel::Folder, filters).await?;
        Ok(folders
            .into_iter()
            .filter(|n| n.labels.iter().any(|l| l == zone.label()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entityinfo_upstream::mock::{GraphCall, MockGraphStore, MockSearchIndex};

    fn project() -> JsonValue {
        json!({"id": 1, "labels": ["Container"], "global_entity_id": "proj-geid", "code": "proj"})
    }

    fn request(geid: &str, relative_path: &str, parent: &str) -> CreateFolderRequest {
        serde_json::from_value(json!({
            "global_entity_id": geid,
            "folder_name": geid,
            "folder_level": if relative_path.is_empty() { 0 } else { 1 },
            "folder_parent_geid": parent,
            "uploader": "alice",
            "folder_relative_path": relative_path,
            "zone": "greenroom",
            "project_code": "proj",
        }))
        .unwrap()
    }

    fn service(graph: &MockGraphStore, index: &MockSearchIndex) -> FolderService {
        FolderService::new(Arc::new(graph.clone()), Arc::new(index.clone()))
    }

    #[tokio::test]
    async fn test_top_level_folder_links_to_project_without_indexing() {
        let graph = MockGraphStore::new().with_node(project());
        let index = MockSearchIndex::new();

        let node = service(&graph, &index)
            .create(&request("alice", "", ""))
            .await
            .unwrap();

        assert_eq!(node.labels, vec!["Folder", "Greenroom"]);
        assert_eq!(graph.parent_geid("alice").as_deref(), Some("proj-geid"));
        assert!(index.get_folder_entries().is_empty());
    }

    #[tokio::test]
    async fn test_nested_folder_indexed_and_linked_to_parent() {
        let graph = MockGraphStore::new()
            .with_node(project())
            .with_node(json!({"id": 2, "labels": ["Folder", "Greenroom"], "global_entity_id": "alice"}));
        let index = MockSearchIndex::new();

        service(&graph, &index)
            .create(&request("scans", "alice", "alice"))
            .await
            .unwrap();

        assert_eq!(graph.parent_geid("scans").as_deref(), Some("alice"));
        let entries = index.get_folder_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_path, "alice/scans");
        assert_eq!(entries[0].zone, "greenroom");
    }

    #[tokio::test]
    async fn test_missing_parent_creates_nothing() {
        let graph = MockGraphStore::new().with_node(project());
        let index = MockSearchIndex::new();

        let err = service(&graph, &index)
            .create(&request("scans", "alice", "ghost"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(ref m) if m == "Parent folder not found"));
        assert!(graph.node("scans").is_none());
        assert!(index.get_folder_entries().is_empty());
    }

    #[tokio::test]
    async fn test_index_failure_stops_before_graph_write() {
        let graph = MockGraphStore::new()
            .with_node(project())
            .with_node(json!({"id": 2, "labels": ["Folder"], "global_entity_id": "alice"}));
        let index = MockSearchIndex::new().with_failure_for("scans");

        let err = service(&graph, &index)
            .create(&request("scans", "alice", "alice"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Internal(ref m) if m == INDEX_FAILURE));
        assert!(!graph
            .get_calls()
            .iter()
            .any(|c| matches!(c, GraphCall::CreateNode { .. })));
    }

    #[tokio::test]
    async fn test_generated_geid_when_absent() {
        let graph = MockGraphStore::new().with_node(project());
        let index = MockSearchIndex::new();
        let mut req = request("", "", "");
        req.global_entity_id = None;
        req.folder_name = "bob".to_string();

        let node = service(&graph, &index).create(&req).await.unwrap();
        assert!(Uuid::parse_str(&node.global_entity_id).is_ok());
    }

    #[tokio::test]
    async fn test_batch_links_every_folder_to_its_project() {
        let graph = MockGraphStore::new().with_node(project());
        let index = MockSearchIndex::new();
        let batch = BatchCreateFoldersRequest {
            payload: vec![request("a", "", ""), request("b", "", "")],
            zone: "core".to_string(),
            link_container: true,
        };

        let result = service(&graph, &index).create_batch(&batch).await.unwrap();

        assert_eq!(result, json!({"result": "success"}));
        assert_eq!(graph.node("a").unwrap().labels, vec!["Folder", "Core"]);
        assert_eq!(graph.parent_geid("b").as_deref(), Some("proj-geid"));
        assert!(index.get_folder_entries().is_empty());
    }

    #[tokio::test]
    async fn test_batch_without_container_indexes_nested_folders() {
        let graph = MockGraphStore::new().with_node(project());
        let index = MockSearchIndex::new();
        let batch = BatchCreateFoldersRequest {
            payload: vec![request("a", "", ""), request("b", "alice", "x")],
            zone: "greenroom".to_string(),
            link_container: false,
        };

        service(&graph, &index).create_batch(&batch).await.unwrap();

        let entries = index.get_folder_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].global_entity_id, "b");
        assert!(!graph
            .get_calls()
            .iter()
            .any(|c| matches!(c, GraphCall::LinkBatch { .. })));
    }

    #[tokio::test]
    async fn test_batch_failures_are_internal_errors() {
        let batch = BatchCreateFoldersRequest {
            payload: vec![request("a", "", "")],
            zone: "greenroom".to_string(),
            link_container: true,
        };
        let index = MockSearchIndex::new();

        let graph = MockGraphStore::new().with_node(project()).with_create_failure();
        let err = service(&graph, &index).create_batch(&batch).await.unwrap_err();
        assert!(matches!(err, Error::Internal(ref m) if m == "failed to create folders"));

        let graph = MockGraphStore::new().with_node(project()).with_link_failure();
        let err = service(&graph, &index).create_batch(&batch).await.unwrap_err();
        assert!(matches!(err, Error::Internal(ref m) if m == "failed to link projects with folders"));
    }

    #[tokio::test]
    async fn test_list_filters_by_zone() {
        let graph = MockGraphStore::new()
            .with_node(json!({"id": 1, "labels": ["Folder", "Greenroom"], "global_entity_id": "g", "project_code": "proj", "uploader": "alice"}))
            .with_node(json!({"id": 2, "labels": ["Folder", "Core"], "global_entity_id": "c", "project_code": "proj", "uploader": "alice"}));
        let svc = service(&graph, &MockSearchIndex::new());

        let greenroom = svc.list("greenroom", "proj", None, Some("alice")).await.unwrap();
        assert_eq!(greenroom.len(), 1);
        assert_eq!(greenroom[0].global_entity_id, "g");

        let err = svc.list("archive", "proj", None, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m == "Invalid zone parameter"));
    }
}
