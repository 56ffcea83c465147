//! Workbench booking handlers.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use entityinfo_core::{
    CreateWorkbenchRequest, NewWorkbenchEntry, NodeLabel, WorkbenchEntry, WorkbenchResource,
};

use crate::{ApiError, ApiResponse, AppState};

/// One booking as listed per resource.
#[derive(Debug, Serialize)]
pub struct WorkbenchStatus {
    pub deployed: bool,
    pub deployed_date: Option<DateTime<Utc>>,
    pub deployed_by: String,
    pub id: i64,
}

impl From<WorkbenchEntry> for WorkbenchStatus {
    fn from(entry: WorkbenchEntry) -> Self {
        Self {
            deployed: entry.deployed,
            deployed_date: entry.deployed_date,
            deployed_by: entry.deployed_by,
            id: entry.id,
        }
    }
}

/// Bookings of a project keyed by resource.
pub async fn list_workbench(
    State(state): State<AppState>,
    Path(project_geid): Path<String>,
) -> Result<ApiResponse<BTreeMap<String, WorkbenchStatus>>, ApiError> {
    let entries = state.workbench.list_for_project(&project_geid).await?;
    let total = entries.len() as i64;
    let result = entries
        .into_iter()
        .map(|e| (e.workbench_resource.clone(), WorkbenchStatus::from(e)))
        .collect();
    Ok(ApiResponse::ok(result).with_total(total))
}

/// Book a workbench resource for a project.
///
/// # Returns
/// - 200 OK with the created booking
/// - 400 Bad Request "Invalid workbench resource"
/// - 404 Not Found when the project container does not exist
/// - 409 Conflict when the resource is already booked
pub async fn create_workbench(
    State(state): State<AppState>,
    Path(project_geid): Path<String>,
    Json(body): Json<CreateWorkbenchRequest>,
) -> Result<ApiResponse<WorkbenchEntry>, ApiError> {
    let resource: WorkbenchResource = body
        .workbench_resource
        .parse()
        .map_err(ApiError::BadRequest)?;

    if state.workbench.exists(&project_geid, resource).await? {
        return Err(ApiError::Conflict(format!(
            "{} is already booked for this project",
            resource
        )));
    }

    let containers = state
        .graph
        .query_nodes(NodeLabel::Container, json!({ "global_entity_id": project_geid }))
        .await?;
    let project_code = containers
        .first()
        .and_then(|node| node.properties.get("code"))
        .and_then(|code| code.as_str())
        .map(str::to_string)
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    let entry = state
        .workbench
        .create(NewWorkbenchEntry {
            geid: project_geid,
            project_code,
            resource,
            deployed: body.deployed,
            deployed_by: body.deployed_by,
        })
        .await?;
    info!(
        subsystem = "api",
        component = "workbench",
        op = "create",
        project_code = %entry.project_code,
        resource = %resource,
        "Workbench resource booked"
    );
    Ok(ApiResponse::ok(entry))
}

/// Remove a booking.
pub async fn delete_workbench(
    State(state): State<AppState>,
    Path((project_geid, id)): Path<(String, i64)>,
) -> Result<ApiResponse<&'static str>, ApiError> {
    if !state.workbench.delete(&project_geid, id).await? {
        return Err(ApiError::NotFound("Entry not found".to_string()));
    }
    Ok(ApiResponse::ok("Success"))
}
