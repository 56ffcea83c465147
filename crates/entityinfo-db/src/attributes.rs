//! Attribute definition repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};

use entityinfo_core::{
    AttributeDefinition, AttributeRepository, AttributeType, CreateAttributeRequest, Error,
    Result, UpdateAttributeRequest,
};

pub(crate) const ATTRIBUTE_COLUMNS: &str =
    "id, manifest_id, name, type, value, project_code, optional";

/// Map a `data_attribute` row.
pub(crate) fn attribute_from_row(r: &PgRow) -> Result<AttributeDefinition> {
    let raw_type: String = r.get("type");
    let attr_type = raw_type.parse::<AttributeType>().map_err(Error::Internal)?;
    Ok(AttributeDefinition {
        id: r.get("id"),
        manifest_id: r.get("manifest_id"),
        name: r.get("name"),
        attr_type,
        value: r.get("value"),
        project_code: r.get("project_code"),
        optional: r.get("optional"),
    })
}

/// Insert one definition inside an open transaction.
pub(crate) async fn insert_attribute_tx(
    tx: &mut Transaction<'_, Postgres>,
    manifest_id: i64,
    name: &str,
    attr_type: AttributeType,
    value: Option<&str>,
    project_code: &str,
    optional: bool,
) -> Result<AttributeDefinition> {
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO data_attribute (manifest_id, name, type, value, project_code, optional)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {ATTRIBUTE_COLUMNS}
        "#
    ))
    .bind(manifest_id)
    .bind(name)
    .bind(attr_type.as_str())
    .bind(value)
    .bind(project_code)
    .bind(optional)
    .fetch_one(&mut **tx)
    .await
    .map_err(Error::Database)?;

    attribute_from_row(&row)
}

/// PostgreSQL implementation of AttributeRepository.
#[derive(Clone)]
pub struct PgAttributeRepository {
    pool: Pool<Postgres>,
}

impl PgAttributeRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttributeRepository for PgAttributeRepository {
    async fn list_for_manifest(&self, manifest_id: i64) -> Result<Vec<AttributeDefinition>> {
        let rows = sqlx::query(&format!(
            "SELECT {ATTRIBUTE_COLUMNS} FROM data_attribute WHERE manifest_id = $1 ORDER BY id"
        ))
        .bind(manifest_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(attribute_from_row).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<AttributeDefinition>> {
        let row = sqlx::query(&format!(
            "SELECT {ATTRIBUTE_COLUMNS} FROM data_attribute WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(attribute_from_row).transpose()
    }

    async fn create_bulk(
        &self,
        reqs: Vec<CreateAttributeRequest>,
    ) -> Result<Vec<AttributeDefinition>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let mut created = Vec::with_capacity(reqs.len());

        for req in &reqs {
            let def = insert_attribute_tx(
                &mut tx,
                req.manifest_id,
                &req.name,
                req.attr_type,
                req.value.as_deref(),
                &req.project_code,
                req.optional,
            )
            .await?;
            created.push(def);
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(created)
    }

    async fn update(
        &self,
        id: i64,
        req: UpdateAttributeRequest,
    ) -> Result<Option<AttributeDefinition>> {
        let attr_type = req
            .attr_type
            .as_deref()
            .map(str::parse::<AttributeType>)
            .transpose()
            .map_err(|_| Error::InvalidInput("Invalid type".to_string()))?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE data_attribute SET
                name = COALESCE($2, name),
                value = COALESCE($3, value),
                optional = COALESCE($4, optional),
                project_code = COALESCE($5, project_code),
                type = COALESCE($6, type)
            WHERE id = $1
            RETURNING {ATTRIBUTE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.name)
        .bind(&req.value)
        .bind(req.optional)
        .bind(&req.project_code)
        .bind(attr_type.map(|t| t.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(attribute_from_row).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM data_attribute WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
