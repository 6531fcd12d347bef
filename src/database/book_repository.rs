//! # Book repository
//!
//! Soft-deleted books stay in the table; `find_active` and the listing
//! skip them.

use sqlx::{QueryBuilder, Sqlite};

use super::{repository::total_items, Database, Tx};
use crate::{
    error::Result,
    models::{Book, BookFilter, BookSummary, PaginatedResult, Pagination},
    utils::like_pattern,
};

const BOOK_COLUMNS: &str = r#"
    id, title, pages, description, sku, price_cents, stock,
    author_id, publisher_id, category_id, is_deleted, created_at, updated_at
"#;

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.title, b.sku, b.pages, b.price_cents, b.stock,
           b.author_id, a.name AS author_name,
           b.publisher_id, p.name AS publisher_name,
           b.category_id, c.name AS category_name,
           (SELECT ph.url FROM book_photos ph
             WHERE ph.book_id = b.id AND ph.is_main = 1
             LIMIT 1) AS main_photo_url,
           b.created_at
    FROM books b
    JOIN authors a ON a.id = b.author_id
    JOIN publishers p ON p.id = b.publisher_id
    JOIN categories c ON c.id = b.category_id
"#;

/// Resolved reference names for a single book.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookNames {
    pub author_name: String,
    pub publisher_name: String,
    pub category_name: String,
}

#[derive(Debug, Clone)]
pub struct BookRepository {
    db: Database,
}

impl BookRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new book row.
    pub async fn insert(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, pages, description, sku, price_cents, stock,
                author_id, publisher_id, category_id, is_deleted, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(book.pages)
        .bind(&book.description)
        .bind(&book.sku)
        .bind(book.price_cents)
        .bind(book.stock)
        .bind(&book.author_id)
        .bind(&book.publisher_id)
        .bind(&book.category_id)
        .bind(book.is_deleted)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Overwrite every mutable column of `book` and its `updated_at`.
    pub async fn update(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE books
            SET title = ?, pages = ?, description = ?, sku = ?, price_cents = ?, stock = ?,
                author_id = ?, publisher_id = ?, category_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.title)
        .bind(book.pages)
        .bind(&book.description)
        .bind(&book.sku)
        .bind(book.price_cents)
        .bind(book.stock)
        .bind(&book.author_id)
        .bind(&book.publisher_id)
        .bind(&book.category_id)
        .bind(book.updated_at)
        .bind(&book.id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Any book with this id, soft-deleted or not.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(book)
    }

    /// A book that is still for sale.
    pub async fn find_active(&self, id: &str) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ? AND is_deleted = 0"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(book)
    }

    /// Author, publisher and category names for a book's references.
    ///
    /// All three rows must exist, which the foreign keys guarantee for a stored book.
    pub async fn names(&self, book: &Book) -> Result<BookNames> {
        let names = sqlx::query_as::<_, BookNames>(
            r#"
            SELECT a.name AS author_name, p.name AS publisher_name, c.name AS category_name
            FROM authors a, publishers p, categories c
            WHERE a.id = ? AND p.id = ? AND c.id = ?
            "#,
        )
        .bind(&book.author_id)
        .bind(&book.publisher_id)
        .bind(&book.category_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(names)
    }

    /// Whether another book already uses `sku`.
    pub async fn sku_exists(&self, sku: &str, exclude_id: Option<&str>) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE sku = ?1 AND (?2 IS NULL OR id != ?2)",
        )
        .bind(sku)
        .bind(exclude_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count > 0)
    }

    /// Hide a book from the catalogue. Returns `false` when it was not active.
    pub async fn soft_delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE books SET is_deleted = 1, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Paged, filtered and sorted catalogue listing of active books.
    pub async fn list_paged(
        &self,
        filter: &BookFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<BookSummary>> {
        let mut query = QueryBuilder::<Sqlite>::new(SUMMARY_SELECT);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY ")
            .push(filter.sort_by.as_sql())
            .push(" ")
            .push(filter.order.as_sql())
            .push(", b.id ASC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<BookSummary>()
            .fetch_all(self.db.pool())
            .await?;

        let mut count = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT COUNT(*)
            FROM books b
            JOIN authors a ON a.id = b.author_id
            JOIN publishers p ON p.id = b.publisher_id
            JOIN categories c ON c.id = b.category_id
            "#,
        );
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.db.pool())
            .await?;

        Ok(PaginatedResult::new(rows, pagination, total_items(total)))
    }

    // =====================================
    // Stock (unit of work)
    // =====================================
    /// Take `quantity` copies out of stock. Returns `false` when fewer remain.
    pub async fn decrement_stock(tx: &mut Tx<'_>, id: &str, quantity: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET stock = stock - ?1, updated_at = ?2
            WHERE id = ?3 AND is_deleted = 0 AND stock >= ?1
            "#,
        )
        .bind(quantity)
        .bind(chrono::Utc::now())
        .bind(id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Put copies back, soft-deleted books included.
    pub async fn increment_stock(tx: &mut Tx<'_>, id: &str, quantity: i64) -> Result<()> {
        sqlx::query("UPDATE books SET stock = stock + ?, updated_at = ? WHERE id = ?")
            .bind(quantity)
            .bind(chrono::Utc::now())
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &BookFilter) {
    query.push(" WHERE b.is_deleted = 0");

    if let Some(term) = filter.search_term() {
        let pattern = like_pattern(term);
        query
            .push(r" AND (b.title LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR b.sku LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR b.description LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR a.name LIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\')");
    }
    if let Some(id) = &filter.category_id {
        query.push(" AND b.category_id = ").push_bind(id.clone());
    }
    if let Some(id) = &filter.author_id {
        query.push(" AND b.author_id = ").push_bind(id.clone());
    }
    if let Some(id) = &filter.publisher_id {
        query.push(" AND b.publisher_id = ").push_bind(id.clone());
    }
    if let Some(min) = filter.min_price {
        query.push(" AND b.price_cents >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query.push(" AND b.price_cents <= ").push_bind(max);
    }
    match filter.in_stock {
        Some(true) => {
            query.push(" AND b.stock > 0");
        }
        Some(false) => {
            query.push(" AND b.stock = 0");
        }
        None => {}
    }
}
