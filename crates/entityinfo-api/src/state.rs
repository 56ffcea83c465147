//! Shared handler state.

use std::sync::Arc;

use sqlx::PgPool;

use entityinfo_core::{
    AttributeRepository, GraphStore, ManifestRepository, SearchIndex, WorkbenchRepository,
};
use entityinfo_db::Database;

use crate::services::{AttachmentCoordinator, EntityResolver, FolderService};

#[derive(Clone)]
pub struct AppState {
    pub manifests: Arc<dyn ManifestRepository>,
    pub attributes: Arc<dyn AttributeRepository>,
    pub workbench: Arc<dyn WorkbenchRepository>,
    pub graph: Arc<dyn GraphStore>,
    pub index: Arc<dyn SearchIndex>,
    pub resolver: EntityResolver,
    pub coordinator: AttachmentCoordinator,
    pub folders: FolderService,
    /// Present when backed by PostgreSQL; used for pool metrics.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Wire the services around the given repositories and collaborators.
    pub fn new(
        manifests: Arc<dyn ManifestRepository>,
        attributes: Arc<dyn AttributeRepository>,
        workbench: Arc<dyn WorkbenchRepository>,
        graph: Arc<dyn GraphStore>,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        let resolver = EntityResolver::new(graph.clone());
        let coordinator = AttachmentCoordinator::new(
            manifests.clone(),
            resolver.clone(),
            graph.clone(),
            index.clone(),
        );
        let folders = FolderService::new(graph.clone(), index.clone());
        Self {
            manifests,
            attributes,
            workbench,
            graph,
            index,
            resolver,
            coordinator,
            folders,
            pool: None,
        }
    }

    pub fn from_database(
        db: &Database,
        graph: Arc<dyn GraphStore>,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        let mut state = Self::new(
            Arc::new(db.manifests.clone()),
            Arc::new(db.attributes.clone()),
            Arc::new(db.workbench.clone()),
            graph,
            index,
        );
        state.pool = Some(db.pool().clone());
        state
    }
}
