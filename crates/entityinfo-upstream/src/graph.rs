//! Graph-store proxy client.
//!
//! Node reads and writes go to the v1 API. Relation pages go to v2.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, instrument, warn};

use entityinfo_core::defaults::UPSTREAM_SLOW_THRESHOLD_MS;
use entityinfo_core::{
    Error, GraphNode, GraphStore, NodeLabel, OwnRelation, RelationPage, RelationQuery, Result, Zone,
};

use crate::{build_client, ensure_success, UpstreamConfig};

const SERVICE: &str = "graph store";

#[derive(Debug, Deserialize)]
struct RelationsResponse {
    #[serde(default)]
    results: Vec<GraphNode>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct ResultCount {
    result: i64,
}

#[derive(Debug, Deserialize)]
struct ConnectedResponse {
    #[serde(default)]
    result: Vec<GraphNode>,
}

/// The geid lookup answers either a bare list or a `{"result": [...]}` body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NodeListBody {
    Bare(Vec<GraphNode>),
    Wrapped { result: Vec<GraphNode> },
}

impl NodeListBody {
    fn into_nodes(self) -> Vec<GraphNode> {
        match self {
            Self::Bare(nodes) | Self::Wrapped { result: nodes } => nodes,
        }
    }
}

/// HTTP client for the graph-store proxy.
pub struct HttpGraphStore {
    client: Client,
    v1: String,
    v2: String,
}

impl HttpGraphStore {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            v1: config.graph_v1(),
            v2: config.graph_v2(),
        })
    }

    async fn node_list(response: reqwest::Response, what: &str) -> Result<Vec<GraphNode>> {
        let response = ensure_success(SERVICE, response).await?;
        response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse {}: {}", what, e)))
    }

    fn log_slow(op: &'static str, start: Instant) {
        let elapsed = start.elapsed().as_millis();
        if elapsed > UPSTREAM_SLOW_THRESHOLD_MS {
            warn!(
                subsystem = "upstream",
                component = "graph",
                op,
                duration_ms = elapsed as u64,
                slow = true,
                "Slow graph-store call"
            );
        }
    }
}

#[async_trait]
impl GraphStore for HttpGraphStore {
    #[instrument(skip(self, filters), fields(subsystem = "upstream", component = "graph", op = "query_nodes", label = %label))]
    async fn query_nodes(&self, label: NodeLabel, filters: JsonValue) -> Result<Vec<GraphNode>> {
        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/nodes/{}/query", self.v1, label))
            .json(&filters)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let nodes: Vec<GraphNode> = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse node list: {}", e)))?;

        debug!(result_count = nodes.len(), "Node query complete");
        Self::log_slow("query_nodes", start);
        Ok(nodes)
    }

    #[instrument(skip(self, patch), fields(subsystem = "upstream", component = "graph", op = "update_node", label = %label, node_id = id))]
    async fn update_node(&self, label: NodeLabel, id: i64, patch: JsonValue) -> Result<JsonValue> {
        let start = Instant::now();
        let response = self
            .client
            .put(format!("{}/nodes/{}/node/{}", self.v1, label, id))
            .json(&patch)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: JsonValue = response.json().await.unwrap_or(JsonValue::Null);

        Self::log_slow("update_node", start);
        Ok(body)
    }

    #[instrument(skip(self), fields(subsystem = "upstream", component = "graph", op = "folder_children", geid = %folder_geid))]
    async fn folder_children(&self, folder_geid: &str) -> Result<Vec<GraphNode>> {
        let start = Instant::now();
        let payload = json!({
            "start_label": "Folder",
            "end_labels": ["File", "Folder"],
            "query": {
                "start_params": { "global_entity_id": folder_geid },
                "end_params": {
                    "Folder": { "archived": false },
                    "File": { "archived": false },
                },
            },
        });
        let response = self
            .client
            .post(format!("{}/relations/query", self.v2))
            .json(&payload)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: RelationsResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse relations: {}", e)))?;

        debug!(result_count = body.results.len(), "Folder children fetched");
        Self::log_slow("folder_children", start);
        Ok(body.results)
    }

    #[instrument(skip(self, filters), fields(subsystem = "upstream", component = "graph", op = "count_nodes", label = %label))]
    async fn count_nodes(&self, label: NodeLabel, filters: JsonValue) -> Result<i64> {
        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/nodes/{}/query/count", self.v1, label))
            .json(&filters)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: CountResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse count: {}", e)))?;

        Self::log_slow("count_nodes", start);
        Ok(body.count)
    }

    #[instrument(skip(self), fields(subsystem = "upstream", component = "graph", op = "get_by_geid", geid = %geid))]
    async fn get_by_geid(&self, geid: &str) -> Result<Option<GraphNode>> {
        let start = Instant::now();
        let response = self
            .client
            .get(format!("{}/nodes/geid/{}", self.v1, geid))
            .send()
            .await?;
        let nodes = Self::node_list(response, "node list").await?;

        Self::log_slow("get_by_geid", start);
        Ok(nodes.into_iter().next())
    }

    #[instrument(skip(self, geids), fields(subsystem = "upstream", component = "graph", op = "query_by_geids", geid_count = geids.len()))]
    async fn query_by_geids(&self, geids: &[String]) -> Result<Vec<GraphNode>> {
        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/nodes/query/geids", self.v1))
            .json(&json!({ "geids": geids }))
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: NodeListBody = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse node list: {}", e)))?;
        let nodes = body.into_nodes();

        debug!(result_count = nodes.len(), "Geid query complete");
        Self::log_slow("query_by_geids", start);
        Ok(nodes)
    }

    #[instrument(skip(self, query), fields(subsystem = "upstream", component = "graph", op = "query_relations", start_label = %query.start_label))]
    async fn query_relations(&self, query: &RelationQuery) -> Result<RelationPage> {
        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/relations/query", self.v2))
            .json(query)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let page: RelationPage = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse relations: {}", e)))?;

        debug!(result_count = page.results.len(), total = page.total, "Relation page fetched");
        Self::log_slow("query_relations", start);
        Ok(page)
    }

    #[instrument(skip(self), fields(subsystem = "upstream", component = "graph", op = "connected", geid = %geid))]
    async fn connected(&self, geid: &str) -> Result<Vec<GraphNode>> {
        let start = Instant::now();
        let response = self
            .client
            .get(format!("{}/relations/connected/{}", self.v1, geid))
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: ConnectedResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse connections: {}", e)))?;

        Self::log_slow("connected", start);
        Ok(body.result)
    }

    #[instrument(skip(self, properties), fields(subsystem = "upstream", component = "graph", op = "create_node", label = %label))]
    async fn create_node(&self, label: NodeLabel, properties: JsonValue) -> Result<GraphNode> {
        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/nodes/{}", self.v1, label))
            .json(&properties)
            .send()
            .await?;
        let nodes = Self::node_list(response, "created node").await?;

        Self::log_slow("create_node", start);
        nodes
            .into_iter()
            .next()
            .ok_or_else(|| Error::Serialization("Create returned an empty node list".to_string()))
    }

    #[instrument(skip(self, payload, extra_labels), fields(subsystem = "upstream", component = "graph", op = "create_nodes", label = %label, node_count = payload.len()))]
    async fn create_nodes(
        &self,
        label: NodeLabel,
        payload: Vec<JsonValue>,
        extra_labels: &[String],
    ) -> Result<Vec<GraphNode>> {
        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/nodes/{}/batch", self.v1, label))
            .json(&json!({ "payload": payload, "extra_labels": extra_labels }))
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        // The batch endpoint answers with a summary, not always the nodes.
        let nodes = response
            .json::<NodeListBody>()
            .await
            .map(NodeListBody::into_nodes)
            .unwrap_or_default();

        Self::log_slow("create_nodes", start);
        Ok(nodes)
    }

    #[instrument(skip(self), fields(subsystem = "upstream", component = "graph", op = "link"))]
    async fn link(&self, start_id: i64, end_id: i64) -> Result<()> {
        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/relations/own", self.v1))
            .json(&json!({ "start_id": start_id, "end_id": end_id }))
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;

        Self::log_slow("link", start);
        Ok(())
    }

    #[instrument(skip(self, relations), fields(subsystem = "upstream", component = "graph", op = "link_batch", relation_count = relations.len()))]
    async fn link_batch(
        &self,
        start_label: NodeLabel,
        end_label: NodeLabel,
        relations: &[OwnRelation],
    ) -> Result<()> {
        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}/relations/own/batch", self.v1))
            .json(&json!({
                "payload": relations,
                "params_location": ["start", "end"],
                "start_label": start_label.as_str(),
                "end_label": end_label.as_str(),
            }))
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;

        Self::log_slow("link_batch", start);
        Ok(())
    }

    #[instrument(skip(self), fields(subsystem = "upstream", component = "graph", op = "file_count", project_code = %project_code, zone = zone.label()))]
    async fn file_count(
        &self,
        project_code: &str,
        zone: Zone,
        uploader: Option<&str>,
    ) -> Result<i64> {
        let start = Instant::now();
        let labels = format!("{}:{}", zone.label(), NodeLabel::File);
        let mut params = vec![
            ("labels", labels.as_str()),
            ("project_code", project_code),
            ("archived", "[bool]False"),
        ];
        if let Some(uploader) = uploader {
            params.push(("display_path", uploader));
            params.push(("startwith", "display_path"));
        }
        let response = self
            .client
            .get(format!("{}/file/quick/count", self.v1))
            .query(&params)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: ResultCount = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse file count: {}", e)))?;

        Self::log_slow("file_count", start);
        Ok(body.result)
    }
}
