//! Entity resolution against the graph store.
//!
//! Maps an opaque entity id to a File node, or for a Folder id to the
//! flattened list of descendant files. Also serves entity lookups by geid
//! and the paged contents of a container with its route from the root.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, instrument, trace};

use entityinfo_core::{
    FileNode, GraphNode, GraphStore, ListingParams, NodeLabel, RelationPage, Result, Zone,
};

/// One page of a container's contents.
#[derive(Debug, Clone)]
pub struct ContentsPage {
    pub page: RelationPage,
    /// Ancestors of the container, root first, ending with the container.
    pub routing: Vec<GraphNode>,
}

/// Resolves entity ids to File nodes.
#[derive(Clone)]
pub struct EntityResolver {
    graph: Arc<dyn GraphStore>,
}

impl EntityResolver {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    /// The non-archived File node with this id, if any.
    pub async fn resolve(&self, geid: &str) -> Result<Option<FileNode>> {
        Ok(self
            .live_node(NodeLabel::File, geid)
            .await?
            .map(FileNode::from))
    }

    /// The File node with this id, falling back to the trash.
    pub async fn resolve_including_trash(&self, geid: &str) -> Result<Option<FileNode>> {
        if let Some(file) = self.resolve(geid).await? {
            return Ok(Some(file));
        }
        let trashed = self
            .graph
            .query_nodes(NodeLabel::TrashFile, json!({ "global_entity_id": geid }))
            .await?;
        Ok(trashed.into_iter().next().map(FileNode::from))
    }

    /// Descendant files of a non-archived folder, depth first in graph order.
    ///
    /// Empty when the id names no folder. Each node is visited at most once.
    #[instrument(skip(self), fields(subsystem = "api", component = "resolver", op = "expand_folder"))]
    pub async fn expand_folder(&self, geid: &str) -> Result<Vec<FileNode>> {
        if self.live_node(NodeLabel::Folder, geid).await?.is_none() {
            debug!("No folder with this id");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut visited = HashSet::from([geid.to_string()]);
        let mut stack = vec![self.graph.folder_children(geid).await?.into_iter()];

        while let Some(level) = stack.last_mut() {
            let Some(node) = level.next() else {
                stack.pop();
                continue;
            };
            if !visited.insert(node.global_entity_id.clone()) {
                trace!(geid = %node.global_entity_id, "Skipping visited node");
                continue;
            }
            if node.is_file() {
                files.push(FileNode::from(node));
            } else if node.is_folder() {
                let children = self.graph.folder_children(&node.global_entity_id).await?;
                stack.push(children.into_iter());
            }
        }

        debug!(file_count = files.len(), "Folder expanded");
        Ok(files)
    }

    /// One file for a file id, the descendants for a folder id, otherwise nothing.
    pub async fn resolve_targets(&self, geid: &str) -> Result<Vec<FileNode>> {
        match self.resolve(geid).await? {
            Some(file) => Ok(vec![file]),
            None => self.expand_folder(geid).await,
        }
    }

    /// A non-archived file at `display_path` in a project zone.
    pub async fn find_in_zone(
        &self,
        project_code: &str,
        display_path: &str,
        zone: Zone,
    ) -> Result<Option<GraphNode>> {
        let nodes = self
            .graph
            .query_nodes(
                NodeLabel::File,
                json!({
                    "project_code": project_code,
                    "display_path": display_path,
                    "archived": false,
                }),
            )
            .await?;
        Ok(nodes
            .into_iter()
            .find(|n| Zone::from_labels(&n.labels) == zone))
    }

    /// Any node by geid.
    pub async fn entity(&self, geid: &str) -> Result<Option<GraphNode>> {
        self.graph.get_by_geid(geid).await
    }

    /// Nodes for the known geids, skipping unknown ones.
    pub async fn entities(&self, geids: &[String]) -> Result<Vec<GraphNode>> {
        self.graph.query_by_geids(geids).await
    }

    /// Route from the root to the entity, including the entity itself.
    pub async fn routing(&self, geid: &str) -> Result<Vec<GraphNode>> {
        let mut route = self.graph.connected(geid).await?;
        if !route.iter().any(|n| n.global_entity_id == geid) {
            if let Some(node) = self.graph.get_by_geid(geid).await? {
                route.push(node);
            }
        }
        Ok(route)
    }

    /// One page of the files and folders under a container.
    #[instrument(skip(self, params), fields(subsystem = "api", component = "resolver", op = "list_contents"))]
    pub async fn list_contents(&self, geid: &str, params: &ListingParams) -> Result<ContentsPage> {
        let query = params.relation_query(geid)?;
        let page = self.graph.query_relations(&query).await?;
        let routing = self.routing(geid).await?;
        debug!(
            result_count = page.results.len(),
            total = page.total,
            "Contents listed"
        );
        Ok(ContentsPage { page, routing })
    }

    async fn live_node(&self, label: NodeLabel, geid: &str) -> Result<Option<GraphNode>> {
        let nodes = self
            .graph
            .query_nodes(label, json!({ "global_entity_id": geid, "archived": false }))
            .await?;
        Ok(nodes.into_iter().next())
    }
}
