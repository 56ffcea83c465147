//! File and folder lookups by geid, and paged container listings.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use entityinfo_core::{GraphNode, ListingParams};

use crate::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct BulkDetailRequest {
    #[serde(default)]
    pub geids: Vec<String>,
}

/// Nodes for a list of geids. Unknown geids are left out.
///
/// # Returns
/// - 200 OK with the nodes found
/// - 400 Bad Request "geids is required"
pub async fn bulk_detail(
    State(state): State<AppState>,
    Json(req): Json<BulkDetailRequest>,
) -> Result<ApiResponse<Vec<GraphNode>>, ApiError> {
    if req.geids.is_empty() {
        return Err(ApiError::BadRequest("geids is required".to_string()));
    }
    let nodes = state.resolver.entities(&req.geids).await?;
    let total = nodes.len() as i64;
    Ok(ApiResponse::ok(nodes).with_total(total))
}

/// A single node by geid.
///
/// # Returns
/// - 200 OK with the node
/// - 404 Not Found "File not found"
pub async fn file_detail(
    State(state): State<AppState>,
    Path(geid): Path<String>,
) -> Result<ApiResponse<GraphNode>, ApiError> {
    let node = state
        .resolver
        .entity(&geid)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;
    Ok(ApiResponse::ok(node))
}

/// One page of the files and folders under a project, folder, collection
/// or trash bin, with the route from the root to the container.
///
/// # Returns
/// - 200 OK with `{data, routing}` and the paging fields set
/// - 400 Bad Request for an invalid `source_type`, `zone`, `order_type`,
///   `order_by`, `page_size`, `query` or `partial`
pub async fn file_meta(
    State(state): State<AppState>,
    Path(geid): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<ApiResponse<JsonValue>, ApiError> {
    let contents = state.resolver.list_contents(&geid, &params).await?;
    let total = contents.page.total;
    let result = json!({
        "data": contents.page.results,
        "routing": contents.routing,
    });
    Ok(ApiResponse::ok(result).with_page(params.page, total, params.num_of_pages(total)))
}
