//! # User repository

use async_trait::async_trait;
use chrono::Utc;

use super::{repository::total_items, Database, Repository};
use crate::{
    error::Result,
    models::{CreateUser, PaginatedResult, Pagination, Role, User, UserFilter},
    utils::like_pattern,
};

const USER_COLUMNS: &str =
    "id, email, password_hash, name, role, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a user built by [`CreateUser::new`], returning the stored row.
    pub async fn create(&self, user: CreateUser) -> Result<User> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(User {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Lookup is case-insensitive; emails are stored lower-cased.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    /// Case-insensitive check on the normalized email.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    /// Persist name, role and active flag.
    pub async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            "UPDATE users SET name = ?, role = ?, is_active = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.name)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.updated_at)
        .bind(&user.id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Store a new argon2 hash.
    pub async fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Users matching `filter`, newest first.
    pub async fn list_paged(
        &self,
        filter: &UserFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<User>> {
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE (?1 IS NULL OR email LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR role = ?2)
            ORDER BY created_at DESC, id ASC
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(&pattern)
        .bind(filter.role)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE (?1 IS NULL OR email LIKE ?1 ESCAPE '\' OR name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR role = ?2)
            "#,
        )
        .bind(&pattern)
        .bind(filter.role)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(rows, pagination, total_items(total)))
    }
}

#[async_trait]
impl Repository for UserRepository {
    type Entity = User;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    /// Users with orders cannot be removed; the foreign key surfaces as a conflict.
    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> UserRepository {
        UserRepository::new(Database::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_and_find_by_email() {
        let repo = repo().await;
        let user = CreateUser::new("Reader@Example.com", "password123", None, Role::Customer).unwrap();
        let created = repo.create(user).await.unwrap();

        assert_eq!(created.email, "reader@example.com");
        let found = repo.find_by_email("READER@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, Role::Customer);
        assert!(found.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = repo().await;
        let first = CreateUser::new("dup@example.com", "password123", None, Role::Customer).unwrap();
        let second = CreateUser::new("dup@example.com", "password123", None, Role::Customer).unwrap();
        repo.create(first).await.unwrap();

        let err = repo.create(second).await.unwrap_err();
        assert!(matches!(err, crate::error::AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_role() {
        let repo = repo().await;
        for (email, role) in [
            ("a@example.com", Role::Admin),
            ("b@example.com", Role::Customer),
            ("c@example.com", Role::Customer),
        ] {
            repo.create(CreateUser::new(email, "password123", None, role).unwrap())
                .await
                .unwrap();
        }

        let filter = UserFilter {
            search: None,
            role: Some(Role::Customer),
        };
        let page = repo.list_paged(&filter, &Pagination::default()).await.unwrap();
        assert_eq!(page.pagination.total_items, 2);
    }
}
