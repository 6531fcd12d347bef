//! # Admin statistics

use tracing::instrument;

use crate::{database::StatsRepository, error::Result, models::DashboardStats};

use super::Service;

/// Admin dashboard figures.
#[derive(Debug, Clone)]
pub struct StatsService {
    repo: StatsRepository,
}

impl Service for StatsService {}

impl StatsService {
    #[must_use]
    pub fn new(repo: StatsRepository) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardStats> {
        self.repo.dashboard().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{Database, UserRepository},
        models::{CreateUser, OrderStatus, Role},
    };

    #[tokio::test]
    async fn test_dashboard_on_fresh_database() {
        let db = Database::in_memory().await.unwrap();
        UserRepository::new(db.clone())
            .create(CreateUser::new("a@example.com", "password123", None, Role::Admin).unwrap())
            .await
            .unwrap();

        let stats = StatsService::new(StatsRepository::new(db)).dashboard().await.unwrap();

        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_books, 0);
        assert_eq!(stats.revenue_cents, 0);
        assert_eq!(stats.orders_by_status.len(), OrderStatus::ALL.len());
        assert!(stats.orders_by_status.iter().all(|s| s.count == 0));
    }
}
