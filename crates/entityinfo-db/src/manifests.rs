//! Manifest repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use entityinfo_core::{
    CreateManifestRequest, Error, ImportManifestRequest, Manifest, ManifestDetail,
    ManifestRepository, Result, UpdateManifestRequest,
};

use crate::attributes::{attribute_from_row, insert_attribute_tx, ATTRIBUTE_COLUMNS};

fn manifest_from_row(r: &PgRow) -> Manifest {
    Manifest {
        id: r.get("id"),
        name: r.get("name"),
        project_code: r.get("project_code"),
    }
}

/// PostgreSQL implementation of ManifestRepository.
#[derive(Clone)]
pub struct PgManifestRepository {
    pool: Pool<Postgres>,
}

impl PgManifestRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ManifestRepository for PgManifestRepository {
    async fn list_by_project(&self, project_code: &str) -> Result<Vec<Manifest>> {
        let rows = sqlx::query(
            "SELECT id, name, project_code FROM data_manifest WHERE project_code = $1 ORDER BY id",
        )
        .bind(project_code)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(manifest_from_row).collect())
    }

    async fn count_by_project(&self, project_code: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM data_manifest WHERE project_code = $1")
                .bind(project_code)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(count)
    }

    async fn get(&self, id: i64) -> Result<Option<Manifest>> {
        let row = sqlx::query("SELECT id, name, project_code FROM data_manifest WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(manifest_from_row))
    }

    async fn get_detail(&self, id: i64) -> Result<Option<ManifestDetail>> {
        let Some(manifest) = self.get(id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query(&format!(
            "SELECT {ATTRIBUTE_COLUMNS} FROM data_attribute WHERE manifest_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let attributes = rows
            .iter()
            .map(attribute_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(ManifestDetail {
            manifest,
            attributes,
        }))
    }

    async fn get_by_name(&self, project_code: &str, name: &str) -> Result<Option<Manifest>> {
        let row = sqlx::query(
            "SELECT id, name, project_code FROM data_manifest WHERE project_code = $1 AND name = $2",
        )
        .bind(project_code)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(manifest_from_row))
    }

    async fn create(&self, req: CreateManifestRequest) -> Result<Manifest> {
        let row = sqlx::query(
            r#"
            INSERT INTO data_manifest (name, project_code)
            VALUES ($1, $2)
            RETURNING id, name, project_code
            "#,
        )
        .bind(&req.name)
        .bind(&req.project_code)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(manifest_from_row(&row))
    }

    async fn update(&self, id: i64, req: UpdateManifestRequest) -> Result<Option<Manifest>> {
        let row = sqlx::query(
            r#"
            UPDATE data_manifest SET
                name = COALESCE($2, name),
                project_code = COALESCE($3, project_code)
            WHERE id = $1
            RETURNING id, name, project_code
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.project_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(manifest_from_row))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let attributes = sqlx::query("DELETE FROM data_attribute WHERE manifest_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let manifests = sqlx::query("DELETE FROM data_manifest WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "manifests",
            op = "delete",
            manifest_id = id,
            attributes_deleted = attributes.rows_affected(),
            "Manifest deleted"
        );
        Ok(manifests.rows_affected() > 0)
    }

    async fn import(&self, req: ImportManifestRequest) -> Result<ManifestDetail> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(
            r#"
            INSERT INTO data_manifest (name, project_code)
            VALUES ($1, $2)
            RETURNING id, name, project_code
            "#,
        )
        .bind(&req.name)
        .bind(&req.project_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let manifest = manifest_from_row(&row);

        let mut attributes = Vec::with_capacity(req.attributes.len());
        for spec in &req.attributes {
            let def = insert_attribute_tx(
                &mut tx,
                manifest.id,
                &spec.name,
                spec.attr_type,
                spec.value.as_deref(),
                &manifest.project_code,
                spec.optional,
            )
            .await?;
            attributes.push(def);
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(ManifestDetail {
            manifest,
            attributes,
        })
    }
}
