//! # entityinfo-db
//!
//! PostgreSQL layer for EntityInfo.
//!
//! This crate provides:
//! - Connection pool management
//! - Repositories for manifests, attribute definitions, and workbench bookings
//! - Embedded schema migrations (feature `migrations`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use entityinfo_db::{Database, ManifestRepository, CreateManifestRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/entityinfo").await?;
//!
//!     let manifest = db.manifests.create(CreateManifestRequest {
//!         name: "Imaging".to_string(),
//!         project_code: "neuro01".to_string(),
//!     }).await?;
//!
//!     println!("Created manifest: {}", manifest.id);
//!     Ok(())
//! }
//! ```
pub mod attributes;
pub mod manifests;
pub mod pool;
pub mod workbench;

// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use entityinfo_core::*;

pub use attributes::PgAttributeRepository;
pub use manifests::PgManifestRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use workbench::PgWorkbenchRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub manifests: PgManifestRepository,
    pub attributes: PgAttributeRepository,
    pub workbench: PgWorkbenchRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            manifests: PgManifestRepository::new(pool.clone()),
            attributes: PgAttributeRepository::new(pool.clone()),
            workbench: PgWorkbenchRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect with default pool configuration.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
