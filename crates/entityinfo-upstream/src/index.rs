//! Search-index client.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use entityinfo_core::defaults::UPSTREAM_SLOW_THRESHOLD_MS;
use serde::Deserialize;

use entityinfo_core::{
    AuditLogQuery, Error, FileAttributesUpdate, FolderIndexDocument, Result, SearchIndex,
};

use crate::{build_client, ensure_success, UpstreamConfig};

const SERVICE: &str = "search index";

#[derive(Debug, Deserialize)]
struct TotalResponse {
    total: i64,
}

/// HTTP client for the search/audit index.
pub struct HttpSearchIndex {
    client: Client,
    v1: String,
}

impl HttpSearchIndex {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            v1: config.index_v1(),
        })
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    #[instrument(skip(self, update), fields(subsystem = "upstream", component = "index", op = "update_file_attributes", geid = %update.global_entity_id))]
    async fn update_file_attributes(&self, update: &FileAttributesUpdate) -> Result<()> {
        let start = Instant::now();
        let response = self
            .client
            .put(format!("{}/entity/file", self.v1))
            .json(update)
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;

        let elapsed = start.elapsed().as_millis();
        debug!(
            attribute_count = update.updated_fields.attributes.len(),
            duration_ms = elapsed as u64,
            "Index document updated"
        );
        if elapsed > UPSTREAM_SLOW_THRESHOLD_MS {
            warn!(duration_ms = elapsed as u64, slow = true, "Slow index update");
        }
        Ok(())
    }

    #[instrument(skip(self, doc), fields(subsystem = "upstream", component = "index", op = "create_folder_entry", geid = %doc.global_entity_id))]
    async fn create_folder_entry(&self, doc: &FolderIndexDocument) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/entity/file", self.v1))
            .json(doc)
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        debug!(zone = %doc.zone, "Folder entry indexed");
        Ok(())
    }

    #[instrument(skip(self, query), fields(subsystem = "upstream", component = "index", op = "operation_log_total", project_code = %query.project_code, action = query.action.as_str()))]
    async fn operation_log_total(&self, query: &AuditLogQuery) -> Result<i64> {
        let response = self
            .client
            .get(format!("{}/audit-logs", self.v1))
            .query(query)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: TotalResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse audit total: {}", e)))?;
        Ok(body.total)
    }
}
