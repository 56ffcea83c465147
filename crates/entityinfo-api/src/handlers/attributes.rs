//! Attribute definition handlers.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::info;

use entityinfo_core::{
    rules, AttributeDefinition, AttributeType, CreateAttributeRequest, Error,
    UpdateAttributeRequest,
};

use super::manifests::is_attached;
use crate::{ApiError, ApiResponse, AppState};

const REQUIRED_ON_ATTACHED: &str = "Can't add required attributes to manifest attached to files";

#[derive(Debug, Deserialize)]
pub struct BulkAttributesRequest {
    #[serde(default)]
    pub attributes: Vec<JsonValue>,
}

/// Create attribute definitions in bulk.
///
/// All items are checked before any row is inserted; the insert is one
/// transaction.
///
/// # Returns
/// - 200 OK with the created definitions
/// - 400 Bad Request for a missing field, an unknown type, or a rule violation
/// - 403 Forbidden when a required attribute targets a manifest already attached to files
/// - 404 Not Found when a manifest does not exist
pub async fn create_attributes(
    State(state): State<AppState>,
    Json(body): Json<BulkAttributesRequest>,
) -> Result<ApiResponse<Vec<AttributeDefinition>>, ApiError> {
    let mut attached: HashMap<i64, bool> = HashMap::new();
    let mut requests = Vec::with_capacity(body.attributes.len());

    for item in &body.attributes {
        let req = CreateAttributeRequest::from_json(item)?;
        rules::validate_definition(&req.name, req.attr_type, req.value.as_deref())
            .map_err(Error::from)?;

        if !attached.contains_key(&req.manifest_id) {
            state
                .manifests
                .get(req.manifest_id)
                .await?
                .ok_or(Error::ManifestNotFound(req.manifest_id))?;
            let referenced = is_attached(&state, req.manifest_id).await?;
            attached.insert(req.manifest_id, referenced);
        }
        if !req.optional && attached.get(&req.manifest_id).copied().unwrap_or(false) {
            return Err(ApiError::Forbidden(REQUIRED_ON_ATTACHED.to_string()));
        }
        requests.push(req);
    }

    let created = state.attributes.create_bulk(requests).await?;
    info!(
        subsystem = "api",
        component = "attributes",
        op = "create_bulk",
        result_count = created.len(),
        "Attributes created"
    );
    let total = created.len() as i64;
    Ok(ApiResponse::ok(created).with_total(total))
}

/// Partially update an attribute definition.
///
/// # Returns
/// - 200 OK with the updated definition
/// - 400 Bad Request "Invalid type" for an unknown type
/// - 403 Forbidden when marking required an attribute of a manifest attached to files
/// - 404 Not Found "Attribute not found"
pub async fn update_attribute(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateAttributeRequest>,
) -> Result<ApiResponse<AttributeDefinition>, ApiError> {
    if let Some(raw) = body.attr_type.as_deref() {
        raw.parse::<AttributeType>()
            .map_err(|_| ApiError::BadRequest("Invalid type".to_string()))?;
    }
    if body.optional == Some(false) {
        let existing = state
            .attributes
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Attribute not found".to_string()))?;
        if is_attached(&state, existing.manifest_id).await? {
            return Err(ApiError::Forbidden(REQUIRED_ON_ATTACHED.to_string()));
        }
    }
    let attribute = state
        .attributes
        .update(id, body)
        .await?
        .ok_or_else(|| ApiError::NotFound("Attribute not found".to_string()))?;
    Ok(ApiResponse::ok(attribute))
}

/// Delete an attribute definition.
pub async fn delete_attribute(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<&'static str>, ApiError> {
    if !state.attributes.delete(id).await? {
        return Err(ApiError::NotFound("Attribute not found".to_string()));
    }
    info!(subsystem = "api", component = "attributes", op = "delete", attribute_id = id, "Attribute deleted");
    Ok(ApiResponse::ok("Success"))
}
