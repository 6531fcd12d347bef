//! # Book photos

use super::{Database, Tx};
use crate::{error::Result, models::BookPhoto};

#[derive(Debug, Clone)]
pub struct PhotoRepository {
    db: Database,
}

impl PhotoRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn insert(&self, photo: &BookPhoto) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO book_photos (id, book_id, url, public_id, is_main, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&photo.id)
        .bind(&photo.book_id)
        .bind(&photo.url)
        .bind(&photo.public_id)
        .bind(photo.is_main)
        .bind(photo.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Photos of a book, main photo first, then oldest first.
    pub async fn list_for_book(&self, book_id: &str) -> Result<Vec<BookPhoto>> {
        let photos = sqlx::query_as::<_, BookPhoto>(
            r#"
            SELECT id, book_id, url, public_id, is_main, created_at
            FROM book_photos
            WHERE book_id = ?
            ORDER BY is_main DESC, created_at ASC, id ASC
            "#,
        )
        .bind(book_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(photos)
    }

    /// Photo by id, only if it belongs to `book_id`.
    pub async fn find(&self, book_id: &str, photo_id: &str) -> Result<Option<BookPhoto>> {
        let photo = sqlx::query_as::<_, BookPhoto>(
            r#"
            SELECT id, book_id, url, public_id, is_main, created_at
            FROM book_photos
            WHERE id = ? AND book_id = ?
            "#,
        )
        .bind(photo_id)
        .bind(book_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(photo)
    }

    pub async fn count_for_book(&self, book_id: &str) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM book_photos WHERE book_id = ?")
            .bind(book_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }

    /// Make `photo_id` the only main photo of its book.
    pub async fn set_main(tx: &mut Tx<'_>, book_id: &str, photo_id: &str) -> Result<()> {
        sqlx::query("UPDATE book_photos SET is_main = (id = ?) WHERE book_id = ?")
            .bind(photo_id)
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Oldest remaining photo of a book, if any.
    pub async fn oldest(tx: &mut Tx<'_>, book_id: &str) -> Result<Option<String>> {
        let id = sqlx::query_scalar(
            r#"
            SELECT id FROM book_photos
            WHERE book_id = ?
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(id)
    }

    /// Delete one photo row. Main-photo reassignment is up to the caller.
    pub async fn delete(tx: &mut Tx<'_>, photo_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM book_photos WHERE id = ?")
            .bind(photo_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
