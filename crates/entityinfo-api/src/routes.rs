//! Route table and HTTP middleware.

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use entityinfo_core::defaults;

use crate::handlers::{
    attributes, files, folders, health, manifests, meta, projects, users, workbench,
};
use crate::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Parse the CORS whitelist from `ALLOWED_ORIGINS` (comma separated).
///
/// Unparseable entries are skipped with a warning.
pub fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| defaults::ALLOWED_ORIGINS.to_string());
    origins_from_list(&origins)
}

fn origins_from_list(list: &str) -> Vec<HeaderValue> {
    list.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(health::health))
        // Manifests
        .route(
            "/v1/manifests",
            get(manifests::list_manifests).post(manifests::create_manifest),
        )
        .route(
            "/v1/manifest/:id",
            get(manifests::get_manifest)
                .put(manifests::update_manifest)
                .delete(manifests::delete_manifest),
        )
        .route("/v1/manifest/file/import", post(manifests::import_manifest))
        .route("/v1/manifest/file/export", get(manifests::export_manifest))
        .route("/v1/manifest/query", post(manifests::query_file_manifests))
        // Attributes
        .route("/v1/attributes", post(attributes::create_attributes))
        .route(
            "/v1/attribute/:id",
            put(attributes::update_attribute).delete(attributes::delete_attribute),
        )
        // File attributes
        .route("/v1/files/attributes/attach", post(files::attach_attributes))
        .route("/v1/files/manifest/validate", post(files::validate_manifest))
        .route("/v1/files/:geid/manifest", put(files::edit_file_manifest))
        // File and folder lookups
        .route("/v1/files/bulk/detail", post(meta::bulk_detail))
        .route("/v1/files/detail/:geid", get(meta::file_detail))
        .route("/v1/files/meta/:geid", get(meta::file_meta))
        // Folders
        .route(
            "/v1/folders",
            get(folders::list_folders).post(folders::create_folder),
        )
        .route("/v1/folders/batch", post(folders::create_folders_batch))
        // Workbench
        .route(
            "/v1/:project_geid/workbench",
            get(workbench::list_workbench).post(workbench::create_workbench),
        )
        .route(
            "/v1/:project_geid/workbench/:id",
            axum::routing::delete(workbench::delete_workbench),
        )
        // Users and projects
        .route(
            "/v1/users/:username",
            get(users::get_user).put(users::update_user),
        )
        .route("/v1/project/:project/file/exist", get(projects::file_exists))
        .route(
            "/v1/project/:project/files/statistics",
            get(projects::file_statistics),
        )
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(defaults::REQUEST_BODY_LIMIT_BYTES))
        .with_state(state)
}
