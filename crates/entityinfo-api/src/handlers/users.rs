//! User node handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value as JsonValue};

use entityinfo_core::{GraphNode, NodeLabel};

use crate::{ApiError, ApiResponse, AppState};

async fn find_user(state: &AppState, username: &str) -> Result<GraphNode, ApiError> {
    state
        .graph
        .query_nodes(NodeLabel::User, json!({ "name": username }))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Get a user node by name.
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<ApiResponse<GraphNode>, ApiError> {
    Ok(ApiResponse::ok(find_user(&state, &username).await?))
}

/// Merge the body into a user node's properties.
///
/// Returns the graph store's response unchanged.
pub async fn update_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(patch): Json<JsonValue>,
) -> Result<ApiResponse<JsonValue>, ApiError> {
    if !patch.is_object() {
        return Err(ApiError::BadRequest("Body must be an object".to_string()));
    }
    let user = find_user(&state, &username).await?;
    let updated = state
        .graph
        .update_node(NodeLabel::User, user.id, patch)
        .await?;
    Ok(ApiResponse::ok(updated))
}
