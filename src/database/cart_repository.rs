//! # Cart repository
//!
//! One cart per user, holding at most one line per book. Reads and the
//! final clear also come in `_in_tx` flavours for checkout.

use chrono::Utc;
use sqlx::{Executor, Sqlite};

use super::{Database, Tx};
use crate::{
    error::Result,
    models::{new_id, Cart, CartLine},
};

#[derive(Debug, Clone)]
pub struct CartRepository {
    db: Database,
}

impl CartRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The user's cart, created on first access.
    pub async fn get_or_create(&self, user_id: &str) -> Result<Cart> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(cart)
    }

    /// Cart contents joined with current book title and price.
    pub async fn lines(&self, cart_id: &str) -> Result<Vec<CartLine>> {
        lines_with(self.db.pool(), cart_id).await
    }

    /// Same as [`lines`](Self::lines), inside a checkout transaction.
    pub async fn lines_in_tx(tx: &mut Tx<'_>, cart_id: &str) -> Result<Vec<CartLine>> {
        lines_with(&mut **tx, cart_id).await
    }

    /// Quantity of `book_id` in the cart, 0 if absent.
    pub async fn quantity_of(&self, cart_id: &str, book_id: &str) -> Result<i64> {
        let quantity: Option<i64> =
            sqlx::query_scalar("SELECT quantity FROM cart_items WHERE cart_id = ? AND book_id = ?")
                .bind(cart_id)
                .bind(book_id)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Insert the line or overwrite its quantity.
    pub async fn set_quantity(&self, cart_id: &str, book_id: &str, quantity: i64) -> Result<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, book_id, quantity, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (cart_id, book_id) DO UPDATE SET quantity = excluded.quantity
            "#,
        )
        .bind(new_id())
        .bind(cart_id)
        .bind(book_id)
        .bind(quantity)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        self.touch(cart_id).await
    }

    /// Returns `false` when the book was not in the cart.
    pub async fn remove_item(&self, cart_id: &str, book_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ? AND book_id = ?")
            .bind(cart_id)
            .bind(book_id)
            .execute(self.db.pool())
            .await?;

        self.touch(cart_id).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every line from the cart.
    pub async fn clear(&self, cart_id: &str) -> Result<()> {
        clear_with(self.db.pool(), cart_id).await
    }

    pub async fn clear_in_tx(tx: &mut Tx<'_>, cart_id: &str) -> Result<()> {
        clear_with(&mut **tx, cart_id).await
    }

    async fn touch(&self, cart_id: &str) -> Result<()> {
        sqlx::query("UPDATE carts SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(cart_id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

/// Lines of books that are still for sale, oldest first.
async fn lines_with<'e, E>(executor: E, cart_id: &str) -> Result<Vec<CartLine>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let lines = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT ci.book_id, b.title, b.sku, b.price_cents AS unit_price_cents,
               ci.quantity, b.stock
        FROM cart_items ci
        JOIN books b ON b.id = ci.book_id
        WHERE ci.cart_id = ? AND b.is_deleted = 0
        ORDER BY ci.created_at ASC, ci.id ASC
        "#,
    )
    .bind(cart_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

async fn clear_with<'e, E>(executor: E, cart_id: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
        .bind(cart_id)
        .execute(executor)
        .await?;

    Ok(())
}
