//! # Database layer
//!
//! A shared SQLite pool plus one repository per aggregate. Writes that span
//! several tables go through [`Database::begin`], whose transaction is the
//! unit of work: dropped without `commit` it rolls back.

mod book_repository;
mod cart_repository;
mod catalog_repository;
mod order_repository;
mod photo_repository;
mod repository;
mod stats_repository;
mod user_repository;

pub use book_repository::*;
pub use cart_repository::*;
pub use catalog_repository::*;
pub use order_repository::*;
pub use photo_repository::*;
pub use repository::*;
pub use stats_repository::*;
pub use user_repository::*;

use std::{str::FromStr, sync::Arc, time::Duration};

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Sqlite, Transaction,
};
use tracing::debug;

use crate::error::Result;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Transaction handle passed to repository methods that take part in a unit of work.
pub type Tx<'a> = Transaction<'a, Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    /// Open a pool for `database_url`, creating the parent directory of a
    /// file-backed database if needed.
    ///
    /// # Errors
    /// Fails when the directory cannot be created or the pool cannot connect.
    pub async fn connect(database_url: impl AsRef<str>) -> Result<Self> {
        let url = database_url.as_ref();
        if let Some(path) = url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(options)
            .await?;

        debug!(url = %url, "Database pool opened");

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Fresh migrated in-memory database. The pool holds exactly one
    /// connection that is never recycled, since closing it drops the data.
    ///
    /// # Errors
    /// Fails when the connection or the migrations fail.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self {
            pool: Arc::new(pool),
        };
        db.migrate().await?;
        Ok(db)
    }

    /// # Errors
    /// Fails when a migration cannot be applied.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&*self.pool).await?;
        Ok(())
    }

    /// Underlying sqlx pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// # Errors
    /// Fails when the database does not answer a trivial query.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&*self.pool).await?;
        Ok(())
    }

    /// Start a unit of work.
    ///
    /// ```rust,ignore
    /// let mut tx = db.begin().await?;
    /// orders.insert(&mut tx, &order).await?;
    /// carts.clear_items(&mut tx, &cart_id).await?;
    /// tx.commit().await?;
    /// ```
    ///
    /// # Errors
    /// Fails when no connection is available.
    pub async fn begin(&self) -> Result<Tx<'static>> {
        Ok(self.pool.begin().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_is_migrated() {
        let db = Database::in_memory().await.unwrap();
        db.health_check().await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('books', 'orders', 'users')",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, 3);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = Database::in_memory().await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_uncommitted_transaction_rolls_back() {
        let db = Database::in_memory().await.unwrap();
        {
            let mut tx = db.begin().await.unwrap();
            sqlx::query(
                "INSERT INTO categories (id, name, created_at, updated_at) VALUES ('c1', 'Poetry', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            )
            .execute(&mut *tx)
            .await
            .unwrap();
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
