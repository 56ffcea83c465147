//! Folder node handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use entityinfo_core::{BatchCreateFoldersRequest, CreateFolderRequest, GraphNode};

use crate::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    pub zone: String,
    pub project_code: String,
    pub folder_relative_path: Option<String>,
    pub uploader: Option<String>,
}

/// Create a folder and link it under its parent folder or project.
///
/// # Returns
/// - 200 OK with the created node
/// - 400 Bad Request "Invalid zone parameter"
/// - 404 Not Found "Parent folder not found" / "Project not found"
/// - 500 when the index or graph write fails
pub async fn create_folder(
    State(state): State<AppState>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<ApiResponse<GraphNode>, ApiError> {
    Ok(ApiResponse::ok(state.folders.create(&req).await?))
}

/// Create many folders in one zone.
pub async fn create_folders_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchCreateFoldersRequest>,
) -> Result<ApiResponse<JsonValue>, ApiError> {
    Ok(ApiResponse::ok(state.folders.create_batch(&req).await?))
}

/// Folders of a project in one zone.
pub async fn list_folders(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> Result<ApiResponse<Vec<GraphNode>>, ApiError> {
    let folders = state
        .folders
        .list(
            &query.zone,
            &query.project_code,
            query.folder_relative_path.as_deref(),
            query.uploader.as_deref(),
        )
        .await?;
    let total = folders.len() as i64;
    Ok(ApiResponse::ok(folders).with_total(total))
}
