//! Categories, authors and publishers.

use async_trait::async_trait;

use super::{repository::total_items, Database, Repository};
use crate::{
    error::Result,
    models::{Author, Category, PaginatedResult, Pagination, Publisher},
    utils::like_pattern,
};

// =====================================
// Categories
// =====================================
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: Database,
}

impl CategoryRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a category; a duplicate name surfaces as a conflict.
    pub async fn insert(&self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn update(&self, category: &Category) -> Result<()> {
        sqlx::query("UPDATE categories SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&category.name)
            .bind(&category.description)
            .bind(category.updated_at)
            .bind(&category.id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Case-insensitive lookup, used for the unique-name rule.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at, updated_at FROM categories WHERE name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(category)
    }

    /// Categories ordered by name, optionally filtered by a name substring.
    pub async fn list_paged(
        &self,
        search: Option<&str>,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Category>> {
        let pattern = search.map(like_pattern);

        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')
            ORDER BY name ASC, id ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM categories WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')"#,
        )
        .bind(&pattern)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(rows, pagination, total_items(total)))
    }

    /// Books pointing at this category, soft-deleted ones included.
    pub async fn count_books(&self, id: &str) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE category_id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl Repository for CategoryRepository {
    type Entity = Category;

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at, updated_at FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(category)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

// =====================================
// Authors
// =====================================
#[derive(Debug, Clone)]
pub struct AuthorRepository {
    db: Database,
}

impl AuthorRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, author: &Author) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO authors (id, name, bio, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&author.id)
        .bind(&author.name)
        .bind(&author.bio)
        .bind(author.created_at)
        .bind(author.updated_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn update(&self, author: &Author) -> Result<()> {
        sqlx::query("UPDATE authors SET name = ?, bio = ?, updated_at = ? WHERE id = ?")
            .bind(&author.name)
            .bind(&author.bio)
            .bind(author.updated_at)
            .bind(&author.id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Authors ordered by name, optionally filtered by a name substring.
    pub async fn list_paged(
        &self,
        search: Option<&str>,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Author>> {
        let pattern = search.map(like_pattern);

        let rows = sqlx::query_as::<_, Author>(
            r#"
            SELECT id, name, bio, created_at, updated_at
            FROM authors
            WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')
            ORDER BY name ASC, id ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM authors WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')"#,
        )
        .bind(&pattern)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(rows, pagination, total_items(total)))
    }

    /// Books referencing this author, soft-deleted ones included.
    pub async fn count_books(&self, id: &str) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl Repository for AuthorRepository {
    type Entity = Author;

    async fn find_by_id(&self, id: &str) -> Result<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, name, bio, created_at, updated_at FROM authors WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(author)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

// =====================================
// Publishers
// =====================================
#[derive(Debug, Clone)]
pub struct PublisherRepository {
    db: Database,
}

impl PublisherRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, publisher: &Publisher) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO publishers (id, name, address, website, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&publisher.id)
        .bind(&publisher.name)
        .bind(&publisher.address)
        .bind(&publisher.website)
        .bind(publisher.created_at)
        .bind(publisher.updated_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    pub async fn update(&self, publisher: &Publisher) -> Result<()> {
        sqlx::query(
            "UPDATE publishers SET name = ?, address = ?, website = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&publisher.name)
        .bind(&publisher.address)
        .bind(&publisher.website)
        .bind(publisher.updated_at)
        .bind(&publisher.id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Case-insensitive lookup used to keep names unique.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Publisher>> {
        let publisher = sqlx::query_as::<_, Publisher>(
            r#"
            SELECT id, name, address, website, created_at, updated_at
            FROM publishers
            WHERE name = ? COLLATE NOCASE
            "#,
        )
        .bind(name)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(publisher)
    }

    /// Publishers ordered by name, optionally filtered by a name substring.
    pub async fn list_paged(
        &self,
        search: Option<&str>,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Publisher>> {
        let pattern = search.map(like_pattern);

        let rows = sqlx::query_as::<_, Publisher>(
            r#"
            SELECT id, name, address, website, created_at, updated_at
            FROM publishers
            WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')
            ORDER BY name ASC, id ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM publishers WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\')"#,
        )
        .bind(&pattern)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(rows, pagination, total_items(total)))
    }

    /// Books referencing this publisher, soft-deleted ones included.
    pub async fn count_books(&self, id: &str) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE publisher_id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl Repository for PublisherRepository {
    type Entity = Publisher;

    async fn find_by_id(&self, id: &str) -> Result<Option<Publisher>> {
        let publisher = sqlx::query_as::<_, Publisher>(
            "SELECT id, name, address, website, created_at, updated_at FROM publishers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(publisher)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM publishers WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM publishers")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}
