//! Manifest management handlers.
//!
//! A manifest is a project-scoped schema of attribute definitions. Projects
//! hold at most ten; a manifest referenced by any file cannot be deleted.

use std::collections::{BTreeMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    Json,
};
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::info;

use entityinfo_core::defaults::MAX_MANIFESTS_PER_PROJECT;
use entityinfo_core::{
    rules, AttributeSpec, CreateManifestRequest, Error, FileManifestAttribute,
    ImportManifestRequest, Manifest, ManifestDetail, ManifestExport, NodeLabel,
    UpdateManifestRequest,
};

use crate::{ApiError, ApiResponse, AppState};

// =============================================================================
// REQUEST TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub project_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub manifest_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct FileManifestQuery {
    #[serde(default)]
    pub geid_list: Vec<String>,
}

// =============================================================================
// SHARED CHECKS
// =============================================================================

async fn ensure_capacity(state: &AppState, project_code: &str) -> Result<(), ApiError> {
    let count = state.manifests.count_by_project(project_code).await?;
    if count >= MAX_MANIFESTS_PER_PROJECT {
        return Err(ApiError::Forbidden("Manifest limit reached".to_string()));
    }
    Ok(())
}

async fn ensure_unique_name(
    state: &AppState,
    project_code: &str,
    name: &str,
) -> Result<(), ApiError> {
    if state
        .manifests
        .get_by_name(project_code, name)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("duplicate manifest name".to_string()));
    }
    Ok(())
}

/// True if any File node references the manifest.
pub(crate) async fn is_attached(state: &AppState, manifest_id: i64) -> Result<bool, ApiError> {
    let count = state
        .graph
        .count_nodes(NodeLabel::File, json!({ "manifest_id": manifest_id }))
        .await?;
    Ok(count > 0)
}

fn required_field(body: &JsonValue, field: &str) -> Result<String, ApiError> {
    body.get(field)
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest(format!("Missing required field {}", field)))
}

// =============================================================================
// HANDLERS
// =============================================================================

/// List the manifests of a project with their attributes.
///
/// # Returns
/// - 200 OK with the manifests; `total` is their count
pub async fn list_manifests(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<ApiResponse<Vec<ManifestDetail>>, ApiError> {
    let manifests = state.manifests.list_by_project(&query.project_code).await?;
    let details = try_join_all(manifests.iter().map(|m| state.manifests.get_detail(m.id))).await?;
    let details: Vec<ManifestDetail> = details.into_iter().flatten().collect();
    let total = details.len() as i64;
    Ok(ApiResponse::ok(details).with_total(total))
}

/// Create an empty manifest.
///
/// # Returns
/// - 200 OK with the created manifest
/// - 403 Forbidden when the project already holds the maximum
/// - 409 Conflict when the name is taken in the project
pub async fn create_manifest(
    State(state): State<AppState>,
    Json(body): Json<CreateManifestRequest>,
) -> Result<ApiResponse<Manifest>, ApiError> {
    ensure_capacity(&state, &body.project_code).await?;
    ensure_unique_name(&state, &body.project_code, &body.name).await?;

    let manifest = state.manifests.create(body).await?;
    info!(
        subsystem = "api",
        component = "manifests",
        op = "create",
        manifest_id = manifest.id,
        project_code = %manifest.project_code,
        "Manifest created"
    );
    Ok(ApiResponse::ok(manifest))
}

/// Get a manifest with its attributes.
pub async fn get_manifest(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<ManifestDetail>, ApiError> {
    let detail = state
        .manifests
        .get_detail(id)
        .await?
        .ok_or(Error::ManifestNotFound(id))?;
    Ok(ApiResponse::ok(detail))
}

/// Rename a manifest or move it to another project.
pub async fn update_manifest(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateManifestRequest>,
) -> Result<ApiResponse<Manifest>, ApiError> {
    let manifest = state
        .manifests
        .update(id, body)
        .await?
        .ok_or(Error::ManifestNotFound(id))?;
    Ok(ApiResponse::ok(manifest))
}

/// Delete a manifest and its attributes.
///
/// # Returns
/// - 200 OK with "Success"
/// - 403 Forbidden when files reference the manifest
/// - 404 Not Found when the manifest does not exist
pub async fn delete_manifest(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<&'static str>, ApiError> {
    state
        .manifests
        .get(id)
        .await?
        .ok_or(Error::ManifestNotFound(id))?;
    if is_attached(&state, id).await? {
        return Err(ApiError::Forbidden(
            "Can't delete manifest attached to files".to_string(),
        ));
    }
    state.manifests.delete(id).await?;
    info!(subsystem = "api", component = "manifests", op = "delete", manifest_id = id, "Manifest deleted");
    Ok(ApiResponse::ok("Success"))
}

/// Create a manifest and all of its attributes in one step.
///
/// Every attribute is checked before anything is written.
///
/// # Returns
/// - 200 OK with the created manifest and attributes
/// - 400 Bad Request for a missing field, a duplicate attribute, or a rule violation
/// - 403 Forbidden when the project already holds the maximum
/// - 409 Conflict when the name is taken in the project
pub async fn import_manifest(
    State(state): State<AppState>,
    Json(body): Json<JsonValue>,
) -> Result<ApiResponse<ManifestDetail>, ApiError> {
    let name = required_field(&body, "name")?;
    let project_code = required_field(&body, "project_code")?;
    let items = match body.get("attributes") {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(items)) => items.clone(),
        Some(_) => return Err(ApiError::BadRequest("attributes must be a list".to_string())),
    };

    ensure_capacity(&state, &project_code).await?;
    ensure_unique_name(&state, &project_code, &name).await?;

    let mut seen = HashSet::new();
    let mut attributes = Vec::with_capacity(items.len());
    for item in &items {
        let spec = AttributeSpec::from_json(item)?;
        if !seen.insert(spec.name.clone()) {
            return Err(ApiError::BadRequest("duplicate attribute".to_string()));
        }
        rules::validate_definition(&spec.name, spec.attr_type, spec.value.as_deref())
            .map_err(Error::from)?;
        attributes.push(spec);
    }

    let detail = state
        .manifests
        .import(ImportManifestRequest {
            name,
            project_code,
            attributes,
        })
        .await?;
    info!(
        subsystem = "api",
        component = "manifests",
        op = "import",
        manifest_id = detail.manifest.id,
        attribute_count = detail.attributes.len(),
        "Manifest imported"
    );
    Ok(ApiResponse::ok(detail))
}

/// Export a manifest in its portable form.
pub async fn export_manifest(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<ApiResponse<ManifestExport>, ApiError> {
    let detail = state
        .manifests
        .get_detail(query.manifest_id)
        .await?
        .ok_or(Error::ManifestNotFound(query.manifest_id))?;
    Ok(ApiResponse::ok(detail.export()))
}

/// Attribute definitions and current values for each listed file.
///
/// Files are looked up among live files first, then in the trash. A file
/// without a manifest maps to an empty object.
pub async fn query_file_manifests(
    State(state): State<AppState>,
    Json(body): Json<FileManifestQuery>,
) -> Result<ApiResponse<BTreeMap<String, JsonValue>>, ApiError> {
    let mut result = BTreeMap::new();
    for geid in &body.geid_list {
        let file = state
            .resolver
            .resolve_including_trash(geid)
            .await?
            .ok_or_else(|| Error::NotFound("File not found".to_string()))?;

        let entry = match file.manifest_id {
            Some(manifest_id) => match state.manifests.get_detail(manifest_id).await? {
                Some(manifest) => {
                    serde_json::to_value(FileManifestAttribute::for_file(&manifest, &file))
                        .map_err(Error::from)?
                }
                None => json!({}),
            },
            None => json!({}),
        };
        result.insert(geid.clone(), entry);
    }
    Ok(ApiResponse::ok(result))
}
