//! Project file lookup and file statistics.

use axum::extract::{Path, Query, State};
use futures::future::{try_join, try_join_all};
use serde::Deserialize;
use serde_json::json;

use entityinfo_core::{AuditAction, AuditLogQuery, FileStatistics, GraphNode, NodeLabel, Zone};

use crate::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub struct FileExistQuery {
    pub zone: String,
    pub file_relative_path: String,
}

/// Find a live file by its path in one zone of a project.
///
/// # Returns
/// - 200 OK with the file node
/// - 400 Bad Request "Invalid zone"
/// - 404 Not Found "File not found"
pub async fn file_exists(
    State(state): State<AppState>,
    Path(project_code): Path<String>,
    Query(query): Query<FileExistQuery>,
) -> Result<ApiResponse<GraphNode>, ApiError> {
    let zone: Zone = query.zone.parse().map_err(ApiError::BadRequest)?;
    let node = state
        .resolver
        .find_in_zone(&project_code, &query.file_relative_path, zone)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;
    Ok(ApiResponse::ok(node))
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    pub start_date: i64,
    pub end_date: i64,
    /// Restrict counts to one user's files.
    pub operator: Option<String>,
}

/// Uploads, downloads and approvals in a period, with the live file count of each zone.
///
/// # Returns
/// - 200 OK with the statistics and the project node
/// - 404 Not Found "Project not found"
pub async fn file_statistics(
    State(state): State<AppState>,
    Path(project_geid): Path<String>,
    Query(query): Query<StatisticsQuery>,
) -> Result<ApiResponse<FileStatistics>, ApiError> {
    let project = state
        .graph
        .query_nodes(NodeLabel::Container, json!({ "global_entity_id": project_geid }))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    let code = project
        .str_property("code")
        .ok_or_else(|| ApiError::Internal("Project node has no code".to_string()))?
        .to_string();
    let operator = query.operator.as_deref().filter(|o| !o.is_empty());

    let audit_queries: Vec<AuditLogQuery> = AuditAction::ALL
        .iter()
        .map(|&action| {
            AuditLogQuery::file_operations(&code, action, query.start_date, query.end_date, operator)
        })
        .collect();
    let (totals, counts) = try_join(
        try_join_all(audit_queries.iter().map(|q| state.index.operation_log_total(q))),
        try_join_all(
            [Zone::Intake, Zone::Curated]
                .into_iter()
                .map(|zone| state.graph.file_count(&code, zone, operator)),
        ),
    )
    .await?;

    Ok(ApiResponse::ok(FileStatistics {
        uploaded: totals[0],
        downloaded: totals[1],
        approved: totals[2],
        greenroom: counts[0],
        core: counts[1],
        project_info: project,
    }))
}
