//! Workbench booking repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use entityinfo_core::{
    Error, NewWorkbenchEntry, Result, WorkbenchEntry, WorkbenchRepository, WorkbenchResource,
};

const WORKBENCH_COLUMNS: &str =
    "id, geid, project_code, workbench_resource, deployed, deployed_date, deployed_by";

fn entry_from_row(r: &PgRow) -> WorkbenchEntry {
    WorkbenchEntry {
        id: r.get("id"),
        geid: r.get("geid"),
        project_code: r.get("project_code"),
        workbench_resource: r.get("workbench_resource"),
        deployed: r.get("deployed"),
        deployed_date: r.get("deployed_date"),
        deployed_by: r.get("deployed_by"),
    }
}

/// PostgreSQL implementation of WorkbenchRepository.
#[derive(Clone)]
pub struct PgWorkbenchRepository {
    pool: Pool<Postgres>,
}

impl PgWorkbenchRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkbenchRepository for PgWorkbenchRepository {
    async fn list_for_project(&self, geid: &str) -> Result<Vec<WorkbenchEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {WORKBENCH_COLUMNS} FROM workbench_resource WHERE geid = $1 ORDER BY id"
        ))
        .bind(geid)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(entry_from_row).collect())
    }

    async fn exists(&self, geid: &str, resource: WorkbenchResource) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM workbench_resource WHERE geid = $1 AND workbench_resource = $2)",
        )
        .bind(geid)
        .bind(resource.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn create(&self, entry: NewWorkbenchEntry) -> Result<WorkbenchEntry> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO workbench_resource (geid, project_code, workbench_resource, deployed, deployed_date, deployed_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {WORKBENCH_COLUMNS}
            "#
        ))
        .bind(&entry.geid)
        .bind(&entry.project_code)
        .bind(entry.resource.as_str())
        .bind(entry.deployed)
        .bind(entry.deployed.then(Utc::now))
        .bind(&entry.deployed_by)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(entry_from_row(&row))
    }

    async fn delete(&self, geid: &str, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workbench_resource WHERE geid = $1 AND id = $2")
            .bind(geid)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
