// Database connection management
use crate::error::{DatabaseError, DatabaseResult};
use config_engine::DatabaseSettings;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Database connection pool wrapper
#[derive(Clone, Debug)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Create a new pool from settings
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::ConnectionFailed`] when the server is unreachable.
    pub async fn connect(settings: &DatabaseSettings) -> DatabaseResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&settings.url)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = settings.max_connections,
            "Database connection pool created successfully"
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool (integration tests)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying PgPool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::MigrationError`] if a migration fails.
    pub async fn migrate(&self) -> DatabaseResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Begin a new transaction
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::QueryFailed`] if no connection could be acquired.
    pub async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        debug!("Beginning transaction");
        self.pool
            .begin()
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Failed to begin transaction: {e}")))
    }

    /// Check if the pool is healthy
    pub async fn is_healthy(&self) -> bool {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Database health check failed: {}", e);
                false
            }
        }
    }

    /// Close the pool
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}
