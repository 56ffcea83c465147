//! Attachment coordination.
//!
//! Attaching a manifest to a file writes the graph node first and the
//! search-index document second. The two stores are not transactional; a
//! file whose graph write succeeded but whose index write failed is
//! reported with `index_stale` so a caller can retry the index side.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, instrument, warn};

use entityinfo_core::{
    attribute_property, graph_value_of, rules, AttachErrorType, AttachmentResult, Error,
    FileAttributesUpdate, FileNode, GraphStore, ManifestDetail, ManifestRepository, NodeLabel,
    Result, SearchIndex, SubmittedAttributes, TypedAttributes,
};

use super::EntityResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WritePhase {
    Graph,
    Index,
}

#[derive(Debug)]
struct WriteFailure {
    phase: WritePhase,
    error: Error,
}

/// Runs bulk attach and single-file attribute edits.
#[derive(Clone)]
pub struct AttachmentCoordinator {
    manifests: Arc<dyn ManifestRepository>,
    resolver: EntityResolver,
    graph: Arc<dyn GraphStore>,
    index: Arc<dyn SearchIndex>,
}

impl AttachmentCoordinator {
    pub fn new(
        manifests: Arc<dyn ManifestRepository>,
        resolver: EntityResolver,
        graph: Arc<dyn GraphStore>,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            manifests,
            resolver,
            graph,
            index,
        }
    }

    /// Attach `manifest_id` with `submitted` values to every file the targets resolve to.
    ///
    /// The manifest lookup and rule check run once, before any write. A
    /// target that resolves to nothing contributes no result.
    #[instrument(skip(self, submitted, targets), fields(subsystem = "api", component = "attachment", op = "attach", target_count = targets.len()))]
    pub async fn attach(
        &self,
        manifest_id: i64,
        submitted: &SubmittedAttributes,
        targets: &[String],
    ) -> Result<Vec<AttachmentResult>> {
        let manifest = self
            .manifests
            .get_detail(manifest_id)
            .await?
            .ok_or(Error::ManifestNotFound(manifest_id))?;
        rules::validate(&manifest.attributes, submitted)?;
        let values = rules::typed_values(&manifest.attributes, submitted);

        let mut results = Vec::new();
        for geid in targets {
            let files = self.resolver.resolve_targets(geid).await?;
            if files.is_empty() {
                debug!(geid = %geid, "Target resolved to no files");
                continue;
            }
            for file in files {
                results.push(self.attach_file(&manifest, &values, &file).await);
            }
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let stale = results.iter().filter(|r| r.index_stale).count();
        info!(
            file_count = results.len(),
            succeeded,
            index_stale = stale,
            "Attach batch complete"
        );
        Ok(results)
    }

    async fn attach_file(
        &self,
        manifest: &ManifestDetail,
        values: &TypedAttributes,
        file: &FileNode,
    ) -> AttachmentResult {
        if file.is_attached() {
            debug!(geid = %file.global_entity_id, "File already carries a manifest");
            return AttachmentResult::terminated(file, AttachErrorType::AttributesDuplicate);
        }

        match self.write_both(manifest, values, file).await {
            Ok(_) => AttachmentResult::succeed(file),
            Err(WriteFailure {
                phase: WritePhase::Graph,
                error,
            }) => {
                warn!(geid = %file.global_entity_id, error = %error, "Graph write failed");
                AttachmentResult::terminated(file, AttachErrorType::InternalError)
            }
            Err(WriteFailure {
                phase: WritePhase::Index,
                error,
            }) => {
                warn!(
                    geid = %file.global_entity_id,
                    index_stale = true,
                    error = %error,
                    "Index write failed after graph write"
                );
                AttachmentResult::index_stale(file)
            }
        }
    }

    /// Graph patch, then index document. Returns the graph response body.
    async fn write_both(
        &self,
        manifest: &ManifestDetail,
        values: &TypedAttributes,
        file: &FileNode,
    ) -> std::result::Result<JsonValue, WriteFailure> {
        let mut patch = Map::new();
        patch.insert("manifest_id".to_string(), manifest.manifest.id.into());
        for (name, value) in values {
            patch.insert(attribute_property(name), graph_value_of(value.as_ref()));
        }

        let body = self
            .graph
            .update_node(NodeLabel::File, file.id, JsonValue::Object(patch))
            .await
            .map_err(|error| WriteFailure {
                phase: WritePhase::Graph,
                error,
            })?;

        let document =
            FileAttributesUpdate::new(&file.global_entity_id, manifest, values, Utc::now());
        self.index
            .update_file_attributes(&document)
            .await
            .map_err(|error| WriteFailure {
                phase: WritePhase::Index,
                error,
            })?;
        Ok(body)
    }

    /// Replace the attribute values of an attached file.
    ///
    /// Returns the updated graph node.
    #[instrument(skip(self, submitted), fields(subsystem = "api", component = "attachment", op = "edit"))]
    pub async fn edit(&self, geid: &str, submitted: &SubmittedAttributes) -> Result<JsonValue> {
        let file = self
            .resolver
            .resolve(geid)
            .await?
            .ok_or_else(|| Error::NotFound("File not found".to_string()))?;
        let manifest_id = file
            .manifest_id
            .ok_or_else(|| Error::NotFound("Manifest not found".to_string()))?;
        let manifest = self
            .manifests
            .get_detail(manifest_id)
            .await?
            .ok_or(Error::ManifestNotFound(manifest_id))?;

        if rules::unknown_key(&manifest.attributes, submitted).is_some() {
            return Err(Error::InvalidInput("Not a valid attribute".to_string()));
        }
        rules::validate(&manifest.attributes, submitted)?;
        let values = rules::typed_values(&manifest.attributes, submitted);

        match self.write_both(&manifest, &values, &file).await {
            Ok(body) => {
                info!(geid = %geid, manifest_id, "File attributes updated");
                Ok(first_node(body))
            }
            Err(WriteFailure {
                phase: WritePhase::Graph,
                error,
            }) => Err(error),
            Err(WriteFailure {
                phase: WritePhase::Index,
                error,
            }) => {
                warn!(geid = %geid, index_stale = true, error = %error, "Index write failed after graph write");
                let detail = match error {
                    Error::Upstream { body, .. } => body,
                    other => other.to_string(),
                };
                Err(Error::Internal(format!("Elastic Search Error: {}", detail)))
            }
        }
    }
}

/// The graph proxy answers node updates with a one-element list.
fn first_node(body: JsonValue) -> JsonValue {
    match body {
        JsonValue::Array(mut nodes) if !nodes.is_empty() => nodes.swap_remove(0),
        other => other,
    }
}
