//! # Dashboard aggregates

use super::Database;
use crate::{
    error::Result,
    models::{DashboardStats, OrderStatus, StatusCount},
};

#[derive(Debug, Clone)]
pub struct StatsRepository {
    db: Database,
}

impl StatsRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Counts and revenue for the admin dashboard.
    ///
    /// Revenue sums non-cancelled orders only.
    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let pool = self.db.pool();

        let total_books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE is_deleted = 0")
            .fetch_one(pool)
            .await?;
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        let total_orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(pool)
            .await?;
        let revenue_cents: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(total_cents), 0) FROM orders WHERE status != ?")
                .bind(OrderStatus::Cancelled)
                .fetch_one(pool)
                .await?;

        let counts: Vec<(OrderStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(pool)
                .await?;

        // Every status is reported, zero counts included, in lifecycle order.
        let orders_by_status = OrderStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: *status,
                count: counts
                    .iter()
                    .find(|(s, _)| s == status)
                    .map_or(0, |(_, c)| *c),
            })
            .collect();

        Ok(DashboardStats {
            total_books,
            total_users,
            total_orders,
            revenue_cents,
            orders_by_status,
        })
    }
}
