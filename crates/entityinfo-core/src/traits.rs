//! Core traits for EntityInfo abstractions.
//!
//! Repositories cover the relational store. [`GraphStore`] and
//! [`SearchIndex`] cover the two HTTP collaborators so the attachment
//! workflow can run against mocks in tests.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// RELATIONAL REPOSITORIES
// =============================================================================

/// Repository for manifest rows.
#[async_trait]
pub trait ManifestRepository: Send + Sync {
    /// List manifests of a project ordered by id.
    async fn list_by_project(&self, project_code: &str) -> Result<Vec<Manifest>>;

    /// Count manifests of a project.
    async fn count_by_project(&self, project_code: &str) -> Result<i64>;

    /// Fetch a manifest, or `None` if absent.
    async fn get(&self, id: i64) -> Result<Option<Manifest>>;

    /// Fetch a manifest with its attribute definitions.
    async fn get_detail(&self, id: i64) -> Result<Option<ManifestDetail>>;

    /// Find a manifest by name within a project.
    async fn get_by_name(&self, project_code: &str, name: &str) -> Result<Option<Manifest>>;

    /// Insert a manifest.
    async fn create(&self, req: CreateManifestRequest) -> Result<Manifest>;

    /// Apply a partial update. Returns `None` if the manifest is absent.
    async fn update(&self, id: i64, req: UpdateManifestRequest) -> Result<Option<Manifest>>;

    /// Delete a manifest and its attributes in one transaction.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Insert a manifest and all its attributes in one transaction.
    async fn import(&self, req: ImportManifestRequest) -> Result<ManifestDetail>;
}

/// Repository for attribute definition rows.
#[async_trait]
pub trait AttributeRepository: Send + Sync {
    /// Definitions of a manifest in creation order.
    async fn list_for_manifest(&self, manifest_id: i64) -> Result<Vec<AttributeDefinition>>;

    async fn get(&self, id: i64) -> Result<Option<AttributeDefinition>>;

    /// Insert every definition or none.
    async fn create_bulk(
        &self,
        reqs: Vec<CreateAttributeRequest>,
    ) -> Result<Vec<AttributeDefinition>>;

    /// Apply a partial update. Returns `None` if the attribute is absent.
    async fn update(
        &self,
        id: i64,
        req: UpdateAttributeRequest,
    ) -> Result<Option<AttributeDefinition>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Repository for workbench bookings.
#[async_trait]
pub trait WorkbenchRepository: Send + Sync {
    /// Bookings of a project container, by geid.
    async fn list_for_project(&self, geid: &str) -> Result<Vec<WorkbenchEntry>>;

    /// True if the resource is already booked for the project.
    async fn exists(&self, geid: &str, resource: WorkbenchResource) -> Result<bool>;

    /// Insert a booking; `deployed_date` is set only when deployed.
    async fn create(&self, entry: NewWorkbenchEntry) -> Result<WorkbenchEntry>;

    /// Delete a booking of the project. Returns false if no row matched.
    async fn delete(&self, geid: &str, id: i64) -> Result<bool>;
}

// =============================================================================
// COLLABORATOR SERVICES
// =============================================================================

/// Node and relationship access on the graph-store proxy.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Nodes with `label` matching every filter. Empty when none match.
    async fn query_nodes(&self, label: NodeLabel, filters: JsonValue) -> Result<Vec<GraphNode>>;

    /// Merge `patch` into the node's properties. Returns the proxy's response body.
    async fn update_node(&self, label: NodeLabel, id: i64, patch: JsonValue) -> Result<JsonValue>;

    /// Non-archived File and Folder nodes directly contained by a folder.
    async fn folder_children(&self, folder_geid: &str) -> Result<Vec<GraphNode>>;

    /// Number of `label` nodes matching every filter.
    async fn count_nodes(&self, label: NodeLabel, filters: JsonValue) -> Result<i64>;

    /// Any node by geid, whatever its label.
    async fn get_by_geid(&self, geid: &str) -> Result<Option<GraphNode>>;

    /// Nodes for each known geid. Unknown geids are skipped.
    async fn query_by_geids(&self, geids: &[String]) -> Result<Vec<GraphNode>>;

    /// One page of nodes contained by the start node.
    async fn query_relations(&self, query: &RelationQuery) -> Result<RelationPage>;

    /// Ancestors of a node, root first.
    async fn connected(&self, geid: &str) -> Result<Vec<GraphNode>>;

    /// Create a node. `extra_labels` in `properties` become additional labels.
    async fn create_node(&self, label: NodeLabel, properties: JsonValue) -> Result<GraphNode>;

    /// Create many nodes with the same labels.
    async fn create_nodes(
        &self,
        label: NodeLabel,
        payload: Vec<JsonValue>,
        extra_labels: &[String],
    ) -> Result<Vec<GraphNode>>;

    /// Add an ownership edge between two node ids.
    async fn link(&self, start_id: i64, end_id: i64) -> Result<()>;

    /// Add ownership edges addressed by property match.
    async fn link_batch(
        &self,
        start_label: NodeLabel,
        end_label: NodeLabel,
        relations: &[OwnRelation],
    ) -> Result<()>;

    /// Live files of a project in one zone, optionally under one uploader's path.
    async fn file_count(&self, project_code: &str, zone: Zone, uploader: Option<&str>)
        -> Result<i64>;
}

/// Attribute mirror and audit log on the search index.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Replace the attributes of a file's index document.
    async fn update_file_attributes(&self, update: &FileAttributesUpdate) -> Result<()>;

    /// Add a folder entry.
    async fn create_folder_entry(&self, doc: &FolderIndexDocument) -> Result<()>;

    /// Number of audit-log records matching the query.
    async fn operation_log_total(&self, query: &AuditLogQuery) -> Result<i64>;
}
