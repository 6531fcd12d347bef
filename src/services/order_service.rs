//! # Orders
//!
//! Checkout turns the cart into an order inside one transaction: stock is
//! reserved, prices and titles are copied into the order items and the cart
//! is emptied. Cancelling puts the stock back the same way.

use chrono::Utc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    database::{BookRepository, CartRepository, Database, OrderRepository, Repository, Tx, UserRepository},
    error::{AppError, OptionExt, Result},
    models::{
        new_id, CartLine, CheckoutRequest, Order, OrderDetails, OrderFilter, OrderItem, OrderStatus,
        PaginatedResult, Pagination,
    },
    utils::generate_order_number,
};

use super::{Notifier, Service};

#[derive(Clone)]
pub struct OrderService {
    db: Database,
    orders: OrderRepository,
    carts: CartRepository,
    users: UserRepository,
    notifier: Notifier,
}

impl Service for OrderService {}

impl OrderService {
    #[must_use]
    pub fn new(db: Database, notifier: Notifier) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            carts: CartRepository::new(db.clone()),
            users: UserRepository::new(db.clone()),
            db,
            notifier,
        }
    }

    /// Turn the caller's cart into a pending order.
    ///
    /// Runs in one transaction: the cart is read, every line's stock is
    /// decremented, the order and its items are written with the current title
    /// and price, and the cart is emptied. Any failure rolls all of it back. The
    /// confirmation email is sent after commit.
    ///
    /// # Errors
    /// - [`AppError::BadRequest`] for an empty cart or a total too large to store
    /// - [`AppError::Conflict`] when a book has less stock than requested
    #[instrument(skip(self, request))]
    pub async fn checkout(&self, user_id: &str, request: CheckoutRequest) -> Result<OrderDetails> {
        request.validate()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;
        let cart = self.carts.get_or_create(user_id).await?;

        let mut tx = self.db.begin().await?;

        let lines = CartRepository::lines_in_tx(&mut tx, &cart.id).await?;
        if lines.is_empty() {
            return Err(AppError::BadRequest("Cart is empty".to_string()));
        }
        let total_cents = CartLine::total_cents(&lines)?;

        for line in &lines {
            if !BookRepository::decrement_stock(&mut tx, &line.book_id, line.quantity).await? {
                warn!(book_id = %line.book_id, wanted = line.quantity, stock = line.stock, "Insufficient stock");
                return Err(AppError::Conflict(format!(
                    "Not enough stock for '{}': {} requested, {} available",
                    line.title, line.quantity, line.stock
                )));
            }
        }

        let now = Utc::now();
        let order = Order {
            id: new_id(),
            order_number: generate_order_number(),
            user_id: user_id.to_string(),
            status: OrderStatus::Pending,
            total_cents,
            shipping_address: request.shipping_address.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        OrderRepository::insert(&mut tx, &order).await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let item = OrderItem {
                id: new_id(),
                order_id: order.id.clone(),
                book_id: line.book_id,
                title: line.title,
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
            };
            OrderRepository::insert_item(&mut tx, &item).await?;
            items.push(item);
        }

        CartRepository::clear_in_tx(&mut tx, &cart.id).await?;
        tx.commit().await?;

        let details = OrderDetails { order, items };
        info!(
            order_id = %details.order.id,
            order_number = %details.order.order_number,
            total_cents = details.order.total_cents,
            "Order placed"
        );
        self.notifier.order_confirmation(&user, &details);

        Ok(details)
    }

    /// Customers only see their own orders; someone else's order is reported
    /// as missing.
    pub async fn get(&self, user_id: &str, is_admin: bool, order_id: &str) -> Result<OrderDetails> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .filter(|o| is_admin || o.user_id == user_id)
            .ok_or_not_found(format!("Order '{}' not found", order_id))?;
        let items = self.orders.items(&order.id).await?;

        Ok(OrderDetails { order, items })
    }

    /// The caller's orders, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        filter: &OrderFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Order>> {
        self.orders.list_paged(Some(user_id), filter, pagination).await
    }

    /// Every order, for admins.
    pub async fn list_all(
        &self,
        filter: &OrderFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Order>> {
        self.orders.list_paged(None, filter, pagination).await
    }

    /// Cancel a pending or confirmed order and return its stock.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: &str, is_admin: bool, order_id: &str) -> Result<OrderDetails> {
        let mut tx = self.db.begin().await?;

        let order = OrderRepository::find_in_tx(&mut tx, order_id)
            .await?
            .filter(|o| is_admin || o.user_id == user_id)
            .ok_or_not_found(format!("Order '{}' not found", order_id))?;

        if !order.status.is_cancellable() {
            return Err(AppError::BadRequest(format!(
                "A {} order can no longer be cancelled",
                order.status
            )));
        }

        let details = Self::transition(&mut tx, order, OrderStatus::Cancelled).await?;
        tx.commit().await?;

        info!(order_id = %order_id, "Order cancelled");
        Ok(details)
    }

    /// Admin status change along the fulfilment lifecycle.
    #[instrument(skip(self))]
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<OrderDetails> {
        let mut tx = self.db.begin().await?;

        let order = OrderRepository::find_in_tx(&mut tx, order_id)
            .await?
            .ok_or_not_found(format!("Order '{}' not found", order_id))?;

        if !order.status.can_transition_to(status) {
            return Err(AppError::BadRequest(format!(
                "Cannot move an order from {} to {}",
                order.status, status
            )));
        }

        let from = order.status;
        let details = Self::transition(&mut tx, order, status).await?;
        tx.commit().await?;

        info!(order_id = %order_id, from = %from, to = %status, "Order status changed");
        Ok(details)
    }

    async fn transition(tx: &mut Tx<'_>, mut order: Order, status: OrderStatus) -> Result<OrderDetails> {
        let items = OrderRepository::items_in_tx(tx, &order.id).await?;

        if status == OrderStatus::Cancelled {
            for item in &items {
                BookRepository::increment_stock(tx, &item.book_id, item.quantity).await?;
            }
        }

        OrderRepository::update_status(tx, &order.id, status).await?;
        order.status = status;
        order.updated_at = Utc::now();

        Ok(OrderDetails { order, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{new_id, AddCartItemRequest, Book, CreateUser, Role},
        services::{CartService, LogMailer},
    };
    use std::sync::Arc;

    struct Fixture {
        db: Database,
        orders: OrderService,
        carts: CartService,
        books: BookRepository,
        customer: String,
        other: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::in_memory().await.unwrap();
        let users = UserRepository::new(db.clone());
        let customer = users
            .create(CreateUser::new("c@example.com", "password123", None, Role::Customer).unwrap())
            .await
            .unwrap();
        let other = users
            .create(CreateUser::new("o@example.com", "password123", None, Role::Customer).unwrap())
            .await
            .unwrap();

        let now = Utc::now();
        for table in ["authors", "publishers", "categories"] {
            sqlx::query(&format!(
                "INSERT INTO {table} (id, name, created_at, updated_at) VALUES ('r1', 'Ref', ?, ?)"
            ))
            .bind(now)
            .bind(now)
            .execute(db.pool())
            .await
            .unwrap();
        }

        let books = BookRepository::new(db.clone());
        let notifier = Notifier::new(Arc::new(LogMailer), "http://localhost");

        Fixture {
            orders: OrderService::new(db.clone(), notifier),
            carts: CartService::new(CartRepository::new(db.clone()), books.clone()),
            books,
            db,
            customer: customer.id,
            other: other.id,
        }
    }

    async fn book(f: &Fixture, sku: &str, price_cents: i64, stock: i64) -> String {
        let now = Utc::now();
        let book = Book {
            id: new_id(),
            title: format!("Title {}", sku),
            pages: 120,
            description: None,
            sku: sku.into(),
            price_cents,
            stock,
            author_id: "r1".into(),
            publisher_id: "r1".into(),
            category_id: "r1".into(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        f.books.insert(&book).await.unwrap();
        book.id
    }

    async fn stock_of(f: &Fixture, id: &str) -> i64 {
        f.books.find_by_id(id).await.unwrap().unwrap().stock
    }

    async fn add(f: &Fixture, book_id: &str, quantity: i64) {
        f.carts
            .add_item(
                &f.customer,
                AddCartItemRequest {
                    book_id: book_id.into(),
                    quantity,
                },
            )
            .await
            .unwrap();
    }

    fn checkout() -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: "1 Library Lane, Springfield".into(),
        }
    }

    #[tokio::test]
    async fn test_checkout_refuses_overflowing_total() {
        let f = fixture().await;
        let a = book(&f, "BIG-001", i64::MAX / 2, 5).await;
        let b = book(&f, "BIG-002", i64::MAX / 2, 5).await;
        let c = book(&f, "BIG-003", 10, 5).await;

        let carts = CartRepository::new(f.db.clone());
        let cart = carts.get_or_create(&f.customer).await.unwrap();
        for id in [&a, &b, &c] {
            carts.set_quantity(&cart.id, id, 1).await.unwrap();
        }

        let err = f.orders.checkout(&f.customer, checkout()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(stock_of(&f, &a).await, 5);
        assert_eq!(carts.lines(&cart.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_checkout_snapshots_and_clears_cart() {
        let f = fixture().await;
        let a = book(&f, "A-001", 1000, 5).await;
        let b = book(&f, "B-001", 250, 5).await;
        add(&f, &a, 2).await;
        add(&f, &b, 3).await;

        let order = f.orders.checkout(&f.customer, checkout()).await.unwrap();

        assert_eq!(order.order.status, OrderStatus::Pending);
        assert_eq!(order.order.total_cents, 2 * 1000 + 3 * 250);
        assert_eq!(order.items.len(), 2);
        assert_eq!(stock_of(&f, &a).await, 3);
        assert_eq!(stock_of(&f, &b).await, 2);
        assert!(f.carts.get_cart(&f.customer).await.unwrap().items.is_empty());

        // later price changes do not touch the order
        sqlx::query("UPDATE books SET price_cents = 1 WHERE id = ?")
            .bind(&a)
            .execute(f.db.pool())
            .await
            .unwrap();
        let stored = f.orders.get(&f.customer, false, &order.order.id).await.unwrap();
        assert_eq!(stored.order.total_cents, 2750);
        assert!(stored.items.iter().any(|i| i.unit_price_cents == 1000));
    }

    #[tokio::test]
    async fn test_empty_cart_is_bad_request() {
        let f = fixture().await;
        let err = f.orders.checkout(&f.customer, checkout()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_shortage_conflicts_and_rolls_back() {
        let f = fixture().await;
        let plenty = book(&f, "P-001", 100, 10).await;
        let scarce = book(&f, "S-001", 100, 1).await;
        add(&f, &plenty, 4).await;
        add(&f, &scarce, 2).await;

        let err = f.orders.checkout(&f.customer, checkout()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert_eq!(stock_of(&f, &plenty).await, 10);
        assert_eq!(stock_of(&f, &scarce).await, 1);
        assert_eq!(f.carts.get_cart(&f.customer).await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_once() {
        let f = fixture().await;
        let a = book(&f, "A-001", 1000, 5).await;
        add(&f, &a, 2).await;
        let order = f.orders.checkout(&f.customer, checkout()).await.unwrap();

        let cancelled = f.orders.cancel(&f.customer, false, &order.order.id).await.unwrap();
        assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&f, &a).await, 5);

        let err = f.orders.cancel(&f.customer, false, &order.order.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(stock_of(&f, &a).await, 5);
    }

    #[tokio::test]
    async fn test_other_customers_cannot_see_or_cancel() {
        let f = fixture().await;
        let a = book(&f, "A-001", 1000, 5).await;
        add(&f, &a, 1).await;
        let order = f.orders.checkout(&f.customer, checkout()).await.unwrap();

        assert!(matches!(
            f.orders.get(&f.other, false, &order.order.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.orders.cancel(&f.other, false, &order.order.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(f.orders.get(&f.other, true, &order.order.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let f = fixture().await;
        let a = book(&f, "A-001", 1000, 5).await;
        add(&f, &a, 1).await;
        let id = f.orders.checkout(&f.customer, checkout()).await.unwrap().order.id;

        assert!(matches!(
            f.orders.update_status(&id, OrderStatus::Shipped).await,
            Err(AppError::BadRequest(_))
        ));

        for status in [OrderStatus::Confirmed, OrderStatus::Shipped, OrderStatus::Delivered] {
            let order = f.orders.update_status(&id, status).await.unwrap();
            assert_eq!(order.order.status, status);
        }

        assert!(matches!(
            f.orders.update_status(&id, OrderStatus::Cancelled).await,
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(stock_of(&f, &a).await, 4);
    }

    #[tokio::test]
    async fn test_listing_is_scoped_to_customer() {
        let f = fixture().await;
        let a = book(&f, "A-001", 1000, 5).await;
        add(&f, &a, 1).await;
        f.orders.checkout(&f.customer, checkout()).await.unwrap();

        let filter = OrderFilter::default();
        let mine = f.orders.list_for_user(&f.customer, &filter, &Pagination::default()).await.unwrap();
        let theirs = f.orders.list_for_user(&f.other, &filter, &Pagination::default()).await.unwrap();
        let all = f.orders.list_all(&filter, &Pagination::default()).await.unwrap();

        assert_eq!(mine.pagination.total_items, 1);
        assert_eq!(theirs.pagination.total_items, 0);
        assert_eq!(all.pagination.total_items, 1);
    }
}
