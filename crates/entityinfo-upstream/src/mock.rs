//! In-memory collaborators for deterministic testing.
//!
//! ## Usage
//!
//! ```rust
//! use entityinfo_upstream::mock::{MockGraphStore, MockSearchIndex};
//! use serde_json::json;
//!
//! let graph = MockGraphStore::new()
//!     .with_node(json!({"id": 1, "labels": ["Folder"], "global_entity_id": "f1", "name": "raw"}))
//!     .with_child("f1", json!({"id": 2, "labels": ["File", "Greenroom"], "global_entity_id": "a", "name": "a.txt"}));
//! let index = MockSearchIndex::new().with_failure_for("a");
//! assert_eq!(graph.node_count(), 2);
//! # let _ = index;
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use entityinfo_core::{
    AuditLogQuery, Error, FileAttributesUpdate, FolderIndexDocument, GraphNode, GraphStore,
    NodeLabel, OwnRelation, RelationPage, RelationQuery, Result, SearchIndex, Zone,
};

/// A call made against [`MockGraphStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphCall {
    QueryNodes { label: NodeLabel, filters: JsonValue },
    UpdateNode { label: NodeLabel, id: i64, patch: JsonValue },
    FolderChildren { geid: String },
    CountNodes { label: NodeLabel, filters: JsonValue },
    GetByGeid { geid: String },
    QueryByGeids { geids: Vec<String> },
    QueryRelations { query: RelationQuery },
    Connected { geid: String },
    CreateNode { label: NodeLabel, properties: JsonValue },
    CreateNodes { label: NodeLabel, payload: Vec<JsonValue>, extra_labels: Vec<String> },
    Link { start_id: i64, end_id: i64 },
    LinkBatch { start_label: NodeLabel, end_label: NodeLabel, relations: Vec<OwnRelation> },
    FileCount { project_code: String, zone: Zone, uploader: Option<String> },
}

#[derive(Default)]
struct GraphState {
    nodes: Vec<GraphNode>,
    /// Folder geid → child geids, in insertion order.
    contains: HashMap<String, Vec<String>>,
    failing_updates: HashSet<i64>,
    failing_queries: HashSet<String>,
    failing_creates: bool,
    failing_links: bool,
}

impl GraphState {
    fn by_geid(&self, geid: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.global_entity_id == geid)
    }

    fn parent_of(&self, geid: &str) -> Option<&str> {
        self.contains
            .iter()
            .find(|(_, children)| children.iter().any(|c| c == geid))
            .map(|(parent, _)| parent.as_str())
    }

    fn insert(&mut self, label: NodeLabel, mut properties: Map<String, JsonValue>, extra_labels: &[String]) -> Result<GraphNode> {
        let id = self.nodes.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        let mut labels = vec![label.as_str().to_string()];
        labels.extend(extra_labels.iter().cloned());
        properties.insert("id".into(), id.into());
        properties.insert("labels".into(), labels.into());
        let node: GraphNode = serde_json::from_value(JsonValue::Object(properties))?;
        self.nodes.push(node.clone());
        Ok(node)
    }

    fn add_edge(&mut self, parent: &str, child: &str) {
        self.contains
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
    }
}

/// Equality on plain keys; substring on keys listed in `partial`; prefix on
/// keys listed in `startswith`.
fn matches_end_filter(node: &GraphNode, filter: Option<&JsonValue>) -> bool {
    let Some(JsonValue::Object(filter)) = filter else {
        return true;
    };
    let listed = |list: &str, key: &str| {
        filter
            .get(list)
            .and_then(JsonValue::as_array)
            .is_some_and(|keys| keys.iter().any(|k| k == key))
    };
    let Ok(JsonValue::Object(props)) = serde_json::to_value(node) else {
        return false;
    };
    filter
        .iter()
        .filter(|(key, _)| key.as_str() != "partial" && key.as_str() != "startswith")
        .all(|(key, want)| {
            let have = props.get(key);
            if listed("partial", key) || listed("startswith", key) {
                let (Some(have), Some(want)) = (have.and_then(JsonValue::as_str), want.as_str())
                else {
                    return false;
                };
                if listed("startswith", key) {
                    have.starts_with(want)
                } else {
                    have.contains(want)
                }
            } else {
                // An unset flag reads as false.
                have.unwrap_or(&JsonValue::Bool(false)) == want
            }
        })
}

/// Graph store backed by a node list.
#[derive(Clone, Default)]
pub struct MockGraphStore {
    state: Arc<Mutex<GraphState>>,
    call_log: Arc<Mutex<Vec<GraphCall>>>,
}

fn node_from_json(raw: JsonValue) -> GraphNode {
    serde_json::from_value(raw).unwrap()
}

/// Every filter key equals the node's serialized property.
fn matches_filters(node: &GraphNode, filters: &JsonValue) -> bool {
    let Ok(JsonValue::Object(props)) = serde_json::to_value(node) else {
        return false;
    };
    match filters {
        JsonValue::Object(filters) => filters.iter().all(|(k, v)| props.get(k) == Some(v)),
        _ => true,
    }
}

impl MockGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node from its JSON form.
    pub fn with_node(self, raw: JsonValue) -> Self {
        self.state.lock().unwrap().nodes.push(node_from_json(raw));
        self
    }

    /// Add a node contained by the folder with `folder_geid`.
    pub fn with_child(self, folder_geid: &str, raw: JsonValue) -> Self {
        let node = node_from_json(raw);
        {
            let mut state = self.state.lock().unwrap();
            state
                .contains
                .entry(folder_geid.to_string())
                .or_default()
                .push(node.global_entity_id.clone());
            state.nodes.push(node);
        }
        self
    }

    /// Record an extra containment edge between existing nodes.
    pub fn with_edge(self, folder_geid: &str, child_geid: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .contains
            .entry(folder_geid.to_string())
            .or_default()
            .push(child_geid.to_string());
        self
    }

    /// Make updates of the node with `id` answer 500.
    pub fn with_update_failure(self, id: i64) -> Self {
        self.state.lock().unwrap().failing_updates.insert(id);
        self
    }

    /// Make queries for `label` answer 500.
    pub fn with_query_failure(self, label: NodeLabel) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_queries
            .insert(label.as_str().to_string());
        self
    }

    /// Make node creation answer 500.
    pub fn with_create_failure(self) -> Self {
        self.state.lock().unwrap().failing_creates = true;
        self
    }

    /// Make relation writes answer 500.
    pub fn with_link_failure(self) -> Self {
        self.state.lock().unwrap().failing_links = true;
        self
    }

    /// Geid of the node containing `geid`, if any.
    pub fn parent_geid(&self, geid: &str) -> Option<String> {
        self.state.lock().unwrap().parent_of(geid).map(str::to_string)
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<GraphCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of update calls made.
    pub fn update_call_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, GraphCall::UpdateNode { .. }))
            .count()
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().unwrap().nodes.len()
    }

    /// Current state of a node by geid.
    pub fn node(&self, geid: &str) -> Option<GraphNode> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .iter()
            .find(|n| n.global_entity_id == geid)
            .cloned()
    }

    fn log(&self, call: GraphCall) {
        self.call_log.lock().unwrap().push(call);
    }

    fn injected_failure(message: &str) -> Error {
        Error::Upstream {
            service: "graph store",
            status: 500,
            body: message.to_string(),
        }
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn query_nodes(&self, label: NodeLabel, filters: JsonValue) -> Result<Vec<GraphNode>> {
        self.log(GraphCall::QueryNodes {
            label,
            filters: filters.clone(),
        });
        let state = self.state.lock().unwrap();
        if state.failing_queries.contains(label.as_str()) {
            return Err(Self::injected_failure("query failed"));
        }
        Ok(state
            .nodes
            .iter()
            .filter(|n| n.has_label(label) && matches_filters(n, &filters))
            .cloned()
            .collect())
    }

    async fn update_node(&self, label: NodeLabel, id: i64, patch: JsonValue) -> Result<JsonValue> {
        self.log(GraphCall::UpdateNode {
            label,
            id,
            patch: patch.clone(),
        });
        let mut state = self.state.lock().unwrap();
        if state.failing_updates.contains(&id) {
            return Err(Self::injected_failure("update failed"));
        }
        let node = state
            .nodes
            .iter_mut()
            .find(|n| n.id == id && n.has_label(label))
            .ok_or_else(|| Self::injected_failure("node not found"))?;

        let mut merged: Map<String, JsonValue> = match serde_json::to_value(&*node)? {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        if let JsonValue::Object(patch) = patch {
            merged.extend(patch);
        }
        let updated = JsonValue::Object(merged);
        *node = serde_json::from_value(updated.clone())?;
        Ok(JsonValue::Array(vec![updated]))
    }

    async fn folder_children(&self, folder_geid: &str) -> Result<Vec<GraphNode>> {
        self.log(GraphCall::FolderChildren {
            geid: folder_geid.to_string(),
        });
        let state = self.state.lock().unwrap();
        let Some(children) = state.contains.get(folder_geid) else {
            return Ok(Vec::new());
        };
        Ok(children
            .iter()
            .filter_map(|geid| state.nodes.iter().find(|n| &n.global_entity_id == geid))
            .filter(|n| !n.archived && (n.is_file() || n.is_folder()))
            .cloned()
            .collect())
    }

    async fn count_nodes(&self, label: NodeLabel, filters: JsonValue) -> Result<i64> {
        self.log(GraphCall::CountNodes {
            label,
            filters: filters.clone(),
        });
        let state = self.state.lock().unwrap();
        Ok(state
            .nodes
            .iter()
            .filter(|n| n.has_label(label) && matches_filters(n, &filters))
            .count() as i64)
    }

    async fn get_by_geid(&self, geid: &str) -> Result<Option<GraphNode>> {
        self.log(GraphCall::GetByGeid {
            geid: geid.to_string(),
        });
        Ok(self.state.lock().unwrap().by_geid(geid).cloned())
    }

    async fn query_by_geids(&self, geids: &[String]) -> Result<Vec<GraphNode>> {
        self.log(GraphCall::QueryByGeids {
            geids: geids.to_vec(),
        });
        let state = self.state.lock().unwrap();
        Ok(geids
            .iter()
            .filter_map(|geid| state.by_geid(geid).cloned())
            .collect())
    }

    async fn query_relations(&self, query: &RelationQuery) -> Result<RelationPage> {
        self.log(GraphCall::QueryRelations {
            query: query.clone(),
        });
        let state = self.state.lock().unwrap();
        if state.failing_queries.contains(query.start_label.as_str()) {
            return Err(Self::injected_failure("relation query failed"));
        }
        let start_geid = query
            .query
            .start_params
            .get("global_entity_id")
            .and_then(JsonValue::as_str)
            .unwrap_or_default();
        let start_exists = state
            .by_geid(start_geid)
            .is_some_and(|n| n.labels.iter().any(|l| l == &query.start_label));
        let children = match state.contains.get(start_geid) {
            Some(children) if start_exists => children,
            _ => return Ok(RelationPage::default()),
        };

        let matched: Vec<GraphNode> = children
            .iter()
            .filter_map(|geid| state.by_geid(geid))
            .filter(|node| {
                query.end_labels.iter().any(|label| {
                    node.matches_labels(label)
                        && matches_end_filter(node, query.query.end_params.get(label))
                })
            })
            .cloned()
            .collect();
        let total = matched.len() as i64;
        let results = matched
            .into_iter()
            .skip(query.skip.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();
        Ok(RelationPage { results, total })
    }

    async fn connected(&self, geid: &str) -> Result<Vec<GraphNode>> {
        self.log(GraphCall::Connected {
            geid: geid.to_string(),
        });
        let state = self.state.lock().unwrap();
        let mut ancestors = Vec::new();
        let mut seen = HashSet::new();
        let mut current = geid;
        while let Some(parent) = state.parent_of(current) {
            if !seen.insert(parent) {
                break;
            }
            if let Some(node) = state.by_geid(parent) {
                ancestors.push(node.clone());
            }
            current = parent;
        }
        ancestors.reverse();
        Ok(ancestors)
    }

    async fn create_node(&self, label: NodeLabel, properties: JsonValue) -> Result<GraphNode> {
        self.log(GraphCall::CreateNode {
            label,
            properties: properties.clone(),
        });
        let mut state = self.state.lock().unwrap();
        if state.failing_creates {
            return Err(Self::injected_failure("create failed"));
        }
        let JsonValue::Object(mut properties) = properties else {
            return Err(Self::injected_failure("properties must be an object"));
        };
        let extra_labels: Vec<String> = properties
            .remove("extra_labels")
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();
        state.insert(label, properties, &extra_labels)
    }

    async fn create_nodes(
        &self,
        label: NodeLabel,
        payload: Vec<JsonValue>,
        extra_labels: &[String],
    ) -> Result<Vec<GraphNode>> {
        self.log(GraphCall::CreateNodes {
            label,
            payload: payload.clone(),
            extra_labels: extra_labels.to_vec(),
        });
        let mut state = self.state.lock().unwrap();
        if state.failing_creates {
            return Err(Self::injected_failure("batch create failed"));
        }
        payload
            .into_iter()
            .map(|raw| match raw {
                JsonValue::Object(properties) => state.insert(label, properties, extra_labels),
                _ => Err(Self::injected_failure("properties must be an object")),
            })
            .collect()
    }

    async fn link(&self, start_id: i64, end_id: i64) -> Result<()> {
        self.log(GraphCall::Link { start_id, end_id });
        let mut state = self.state.lock().unwrap();
        if state.failing_links {
            return Err(Self::injected_failure("link failed"));
        }
        let geid_of = |id: i64| {
            state
                .nodes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.global_entity_id.clone())
        };
        let (Some(parent), Some(child)) = (geid_of(start_id), geid_of(end_id)) else {
            return Err(Self::injected_failure("node not found"));
        };
        state.add_edge(&parent, &child);
        Ok(())
    }

    async fn link_batch(
        &self,
        start_label: NodeLabel,
        end_label: NodeLabel,
        relations: &[OwnRelation],
    ) -> Result<()> {
        self.log(GraphCall::LinkBatch {
            start_label,
            end_label,
            relations: relations.to_vec(),
        });
        let mut state = self.state.lock().unwrap();
        if state.failing_links {
            return Err(Self::injected_failure("batch link failed"));
        }
        let mut edges = Vec::with_capacity(relations.len());
        for relation in relations {
            let find = |label: NodeLabel, params: &JsonValue| {
                state
                    .nodes
                    .iter()
                    .find(|n| n.has_label(label) && matches_filters(n, params))
                    .map(|n| n.global_entity_id.clone())
            };
            let (Some(parent), Some(child)) = (
                find(start_label, &relation.start_params),
                find(end_label, &relation.end_params),
            ) else {
                return Err(Self::injected_failure("relation endpoint not found"));
            };
            edges.push((parent, child));
        }
        for (parent, child) in edges {
            state.add_edge(&parent, &child);
        }
        Ok(())
    }

    async fn file_count(
        &self,
        project_code: &str,
        zone: Zone,
        uploader: Option<&str>,
    ) -> Result<i64> {
        self.log(GraphCall::FileCount {
            project_code: project_code.to_string(),
            zone,
            uploader: uploader.map(str::to_string),
        });
        let state = self.state.lock().unwrap();
        Ok(state
            .nodes
            .iter()
            .filter(|n| n.is_file() && !n.archived)
            .filter(|n| n.labels.iter().any(|l| l == zone.label()))
            .filter(|n| n.str_property("project_code") == Some(project_code))
            .filter(|n| {
                uploader.map_or(true, |u| {
                    n.str_property("display_path")
                        .is_some_and(|p| p.starts_with(u))
                })
            })
            .count() as i64)
    }
}

/// Search index that records every document it receives.
#[derive(Clone, Default)]
pub struct MockSearchIndex {
    updates: Arc<Mutex<Vec<FileAttributesUpdate>>>,
    folder_entries: Arc<Mutex<Vec<FolderIndexDocument>>>,
    audit_queries: Arc<Mutex<Vec<AuditLogQuery>>>,
    audit_totals: Arc<Mutex<HashMap<String, i64>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MockSearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make updates for `geid` answer 500.
    pub fn with_failure_for(self, geid: &str) -> Self {
        self.failing.lock().unwrap().insert(geid.to_string());
        self
    }

    /// Documents received, including rejected ones.
    pub fn get_updates(&self) -> Vec<FileAttributesUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Answer `total` for audit-log queries of `action`. Others answer 0.
    pub fn with_audit_total(self, action: &str, total: i64) -> Self {
        self.audit_totals
            .lock()
            .unwrap()
            .insert(action.to_string(), total);
        self
    }

    /// Folder entries received, including rejected ones.
    pub fn get_folder_entries(&self) -> Vec<FolderIndexDocument> {
        self.folder_entries.lock().unwrap().clone()
    }

    pub fn get_audit_queries(&self) -> Vec<AuditLogQuery> {
        self.audit_queries.lock().unwrap().clone()
    }

    fn check_failure(&self, geid: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(geid) {
            return Err(Error::Upstream {
                service: "search index",
                status: 500,
                body: "{}".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for MockSearchIndex {
    async fn update_file_attributes(&self, update: &FileAttributesUpdate) -> Result<()> {
        self.updates.lock().unwrap().push(update.clone());
        self.check_failure(&update.global_entity_id)
    }

    async fn create_folder_entry(&self, doc: &FolderIndexDocument) -> Result<()> {
        self.folder_entries.lock().unwrap().push(doc.clone());
        self.check_failure(&doc.global_entity_id)
    }

    async fn operation_log_total(&self, query: &AuditLogQuery) -> Result<i64> {
        self.audit_queries.lock().unwrap().push(query.clone());
        Ok(self
            .audit_totals
            .lock()
            .unwrap()
            .get(query.action.as_str())
            .copied()
            .unwrap_or(0))
    }
}
