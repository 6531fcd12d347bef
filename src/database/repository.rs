//! # Repository pattern
//!
//! Services talk to storage only through repositories. The [`Repository`]
//! trait covers the operations every catalogue table shares; aggregate
//! specific queries live on the concrete types.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait Repository: Send + Sync {
    type Entity: Send + Sync;

    async fn find_by_id(&self, id: &str) -> Result<Option<Self::Entity>>;

    /// Returns `false` when no row had that id.
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

/// Total row count for a paged query, as returned by SQLite.
pub(crate) fn total_items(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}
