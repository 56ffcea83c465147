//! File attribute handlers: attach, edit and dry-run validation.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

use entityinfo_core::{parse_submitted_attributes, rules, AttachmentResult, Error};

use crate::{ApiError, ApiResponse, AppState};

/// Accept a manifest id given as a number or a numeric string.
fn manifest_id_from_any<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("Invalid manifest_id")),
        JsonValue::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom("Invalid manifest_id")),
        _ => Err(serde::de::Error::custom("Invalid manifest_id")),
    }
}

#[derive(Debug, Deserialize)]
pub struct AttachRequest {
    #[serde(deserialize_with = "manifest_id_from_any")]
    pub manifest_id: i64,
    #[serde(default)]
    pub global_entity_id: Vec<String>,
    #[serde(default)]
    pub attributes: Map<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub manifest_name: String,
    pub project_code: String,
    #[serde(default)]
    pub attributes: Map<String, JsonValue>,
}

/// Attach a manifest and attribute values to files and folder contents.
///
/// Per-file failures do not fail the request; each result carries its own
/// status.
///
/// # Returns
/// - 200 OK with one result per file; `total` is their count
/// - 400 Bad Request when a value is not a string or null, or the
///   attributes break a manifest rule
/// - 404 Not Found when the manifest does not exist
pub async fn attach_attributes(
    State(state): State<AppState>,
    Json(body): Json<AttachRequest>,
) -> Result<ApiResponse<Vec<AttachmentResult>>, ApiError> {
    let submitted = parse_submitted_attributes(&body.attributes)?;
    let results = state
        .coordinator
        .attach(body.manifest_id, &submitted, &body.global_entity_id)
        .await?;
    let total = results.len() as i64;
    Ok(ApiResponse::ok(results).with_total(total))
}

/// Replace attribute values on a file that already carries a manifest.
///
/// # Returns
/// - 200 OK with the updated graph node
/// - 400 Bad Request for an undeclared key or a rule violation
/// - 404 Not Found when the file is missing or has no manifest
/// - 500 when either store rejects the write
pub async fn edit_file_manifest(
    State(state): State<AppState>,
    Path(geid): Path<String>,
    Json(body): Json<Map<String, JsonValue>>,
) -> Result<ApiResponse<JsonValue>, ApiError> {
    let submitted = parse_submitted_attributes(&body)?;
    let node = state.coordinator.edit(&geid, &submitted).await?;
    Ok(ApiResponse::ok(node))
}

/// Check attributes against a manifest without writing anything.
///
/// # Returns
/// - 200 OK with "Success"
/// - 400 Bad Request for an undeclared key, a bad name, or a rule violation
/// - 404 Not Found when no manifest has that name in the project
pub async fn validate_manifest(
    State(state): State<AppState>,
    Json(body): Json<ValidateRequest>,
) -> Result<ApiResponse<&'static str>, ApiError> {
    let manifest = state
        .manifests
        .get_by_name(&body.project_code, &body.manifest_name)
        .await?
        .ok_or_else(|| ApiError::NotFound("Manifest not found".to_string()))?;
    let definitions = state.attributes.list_for_manifest(manifest.id).await?;
    let submitted = parse_submitted_attributes(&body.attributes)?;

    if rules::unknown_key(&definitions, &submitted).is_some() {
        return Err(ApiError::BadRequest("Invalid attribute".to_string()));
    }
    for key in submitted.keys() {
        rules::validate_attribute_name(key).map_err(Error::from)?;
    }
    rules::validate(&definitions, &submitted).map_err(Error::from)?;
    Ok(ApiResponse::ok("Success"))
}
