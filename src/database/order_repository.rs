//! # Order repository
//!
//! Writes happen only inside a transaction handed in by the caller.

use chrono::Utc;
use sqlx::{Executor, Sqlite};

use super::{repository::total_items, Database, Tx};
use crate::{
    error::Result,
    models::{Order, OrderFilter, OrderItem, OrderStatus, PaginatedResult, Pagination},
};

const ORDER_COLUMNS: &str =
    "id, order_number, user_id, status, total_cents, shipping_address, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: Database,
}

impl OrderRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // =====================================
    // Unit of work
    // =====================================
    /// Insert the order header. Items follow through [`insert_item`](Self::insert_item).
    pub async fn insert(tx: &mut Tx<'_>, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, user_id, status, total_cents, shipping_address, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(&order.shipping_address)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn insert_item(tx: &mut Tx<'_>, item: &OrderItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, book_id, title, unit_price_cents, quantity)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.book_id)
        .bind(&item.title)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Order by id, read inside a transaction so a status change sees its own writes.
    pub async fn find_in_tx(tx: &mut Tx<'_>, id: &str) -> Result<Option<Order>> {
        find_with(&mut **tx, id).await
    }

    pub async fn items_in_tx(tx: &mut Tx<'_>, order_id: &str) -> Result<Vec<OrderItem>> {
        items_with(&mut **tx, order_id).await
    }

    /// Set the status and bump `updated_at`.
    pub async fn update_status(tx: &mut Tx<'_>, id: &str, status: OrderStatus) -> Result<()> {
        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    // =====================================
    // Reads
    // =====================================
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Order>> {
        find_with(self.db.pool(), id).await
    }

    /// Lines of an order in insertion order.
    pub async fn items(&self, order_id: &str) -> Result<Vec<OrderItem>> {
        items_with(self.db.pool(), order_id).await
    }

    /// Newest first. `user_id` of `None` lists every customer's orders.
    pub async fn list_paged(
        &self,
        user_id: Option<&str>,
        filter: &OrderFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Order>> {
        let rows = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE (?1 IS NULL OR user_id = ?1)
              AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC, id ASC
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(user_id)
        .bind(filter.status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.db.pool())
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM orders
            WHERE (?1 IS NULL OR user_id = ?1)
              AND (?2 IS NULL OR status = ?2)
            "#,
        )
        .bind(user_id)
        .bind(filter.status)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PaginatedResult::new(rows, pagination, total_items(total)))
    }
}

async fn find_with<'e, E>(executor: E, id: &str) -> Result<Option<Order>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(order)
}

async fn items_with<'e, E>(executor: E, order_id: &str) -> Result<Vec<OrderItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, book_id, title, unit_price_cents, quantity
        FROM order_items
        WHERE order_id = ?
        ORDER BY rowid ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(items)
}
