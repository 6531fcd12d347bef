//! # Shopping cart
//!
//! The cart reserves nothing. Stock is only checked, and taken, by checkout
//! under its transaction.

use tracing::{debug, instrument};
use validator::Validate;

use crate::{
    database::{BookRepository, CartRepository},
    error::{AppError, Result},
    models::{AddCartItemRequest, CartView, UpdateCartItemRequest, MAX_LINE_QUANTITY},
};

use super::Service;

/// One cart per user, created on first use.
#[derive(Debug, Clone)]
pub struct CartService {
    carts: CartRepository,
    books: BookRepository,
}

impl Service for CartService {}

impl CartService {
    #[must_use]
    pub fn new(carts: CartRepository, books: BookRepository) -> Self {
        Self { carts, books }
    }

    /// The caller's cart, created empty on first access.
    pub async fn get_cart(&self, user_id: &str) -> Result<CartView> {
        let cart = self.carts.get_or_create(user_id).await?;
        let lines = self.carts.lines(&cart.id).await?;
        CartView::new(cart.id, lines)
    }

    /// Add copies of a book; an existing line is incremented.
    #[instrument(skip(self, request), fields(book_id = %request.book_id, quantity = request.quantity))]
    pub async fn add_item(&self, user_id: &str, request: AddCartItemRequest) -> Result<CartView> {
        request.validate()?;

        let book = self
            .books
            .find_active(&request.book_id)
            .await?
            .ok_or_else(|| AppError::not_found("Book", &request.book_id))?;

        let cart = self.carts.get_or_create(user_id).await?;
        let current = self.carts.quantity_of(&cart.id, &request.book_id).await?;
        let quantity = current + request.quantity;
        if quantity > MAX_LINE_QUANTITY {
            return Err(AppError::BadRequest(format!(
                "At most {} copies of a book per order",
                MAX_LINE_QUANTITY
            )));
        }

        check_line_total(book.price_cents, quantity)?;

        self.carts.set_quantity(&cart.id, &request.book_id, quantity).await?;
        debug!(cart_id = %cart.id, quantity, "Cart line set");

        self.get_cart(user_id).await
    }

    /// Overwrite a line's quantity; 0 removes it.
    #[instrument(skip(self, request))]
    pub async fn update_item(
        &self,
        user_id: &str,
        book_id: &str,
        request: UpdateCartItemRequest,
    ) -> Result<CartView> {
        request.validate()?;

        if request.quantity == 0 {
            return self.remove_item(user_id, book_id).await;
        }

        let cart = self.carts.get_or_create(user_id).await?;
        if self.carts.quantity_of(&cart.id, book_id).await? == 0 {
            return Err(AppError::NotFound(format!("Book '{}' is not in the cart", book_id)));
        }

        if let Some(book) = self.books.find_active(book_id).await? {
            check_line_total(book.price_cents, request.quantity)?;
        }

        self.carts.set_quantity(&cart.id, book_id, request.quantity).await?;
        self.get_cart(user_id).await
    }

    /// # Errors
    /// [`AppError::NotFound`] when the book is not in the cart.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: &str, book_id: &str) -> Result<CartView> {
        let cart = self.carts.get_or_create(user_id).await?;

        if !self.carts.remove_item(&cart.id, book_id).await? {
            return Err(AppError::NotFound(format!("Book '{}' is not in the cart", book_id)));
        }

        self.get_cart(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: &str) -> Result<CartView> {
        let cart = self.carts.get_or_create(user_id).await?;
        self.carts.clear(&cart.id).await?;
        CartView::new(cart.id, Vec::new())
    }
}

/// Refuse a line whose total would not fit in an `i64` before it is stored.
fn check_line_total(price_cents: i64, quantity: i64) -> Result<()> {
    price_cents
        .checked_mul(quantity)
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest("Cart line amount is too large".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{Database, UserRepository},
        models::{new_id, Book, CreateUser, Role},
    };
    use chrono::Utc;

    struct Fixture {
        db: Database,
        service: CartService,
        books: BookRepository,
        user_id: String,
        book_id: String,
    }

    async fn insert_book(db: &Database, books: &BookRepository, sku: &str, price_cents: i64) -> String {
        let now = Utc::now();
        for (table, id) in [("authors", "a1"), ("publishers", "p1"), ("categories", "c1")] {
            sqlx::query(&format!(
                "INSERT OR IGNORE INTO {table} (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)"
            ))
            .bind(id)
            .bind(id)
            .bind(now)
            .bind(now)
            .execute(db.pool())
            .await
            .unwrap();
        }

        let book = Book {
            id: new_id(),
            title: format!("Book {}", sku),
            pages: 100,
            description: None,
            sku: sku.into(),
            price_cents,
            stock: 10,
            author_id: "a1".into(),
            publisher_id: "p1".into(),
            category_id: "c1".into(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        books.insert(&book).await.unwrap();
        book.id
    }

    async fn fixture() -> Fixture {
        let db = Database::in_memory().await.unwrap();
        let books = BookRepository::new(db.clone());
        let user = UserRepository::new(db.clone())
            .create(CreateUser::new("c@example.com", "password123", None, Role::Customer).unwrap())
            .await
            .unwrap();
        let book_id = insert_book(&db, &books, "SKU-1", 1250).await;

        Fixture {
            service: CartService::new(CartRepository::new(db.clone()), books.clone()),
            db,
            books,
            user_id: user.id,
            book_id,
        }
    }

    fn add(book_id: &str, quantity: i64) -> AddCartItemRequest {
        AddCartItemRequest {
            book_id: book_id.into(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_empty_cart_created_lazily() {
        let f = fixture().await;
        let cart = f.service.get_cart(&f.user_id).await.unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_cents, 0);
        // same cart on the next read
        assert_eq!(f.service.get_cart(&f.user_id).await.unwrap().cart_id, cart.cart_id);
    }

    #[tokio::test]
    async fn test_add_increments_existing_line() {
        let f = fixture().await;
        f.service.add_item(&f.user_id, add(&f.book_id, 2)).await.unwrap();
        let cart = f.service.add_item(&f.user_id, add(&f.book_id, 3)).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total_items, 5);
        assert_eq!(cart.total_cents, 5 * 1250);
    }

    #[tokio::test]
    async fn test_line_quantity_is_capped() {
        let f = fixture().await;
        f.service.add_item(&f.user_id, add(&f.book_id, 90)).await.unwrap();
        let err = f.service.add_item(&f.user_id, add(&f.book_id, 10)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let f = fixture().await;
        f.service.add_item(&f.user_id, add(&f.book_id, 2)).await.unwrap();

        let cart = f
            .service
            .update_item(&f.user_id, &f.book_id, UpdateCartItemRequest { quantity: 0 })
            .await
            .unwrap();
        assert!(cart.items.is_empty());

        let err = f.service.remove_item(&f.user_id, &f.book_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_deleted_books_drop_out_of_cart() {
        let f = fixture().await;
        f.service.add_item(&f.user_id, add(&f.book_id, 1)).await.unwrap();
        f.books.soft_delete(&f.book_id).await.unwrap();

        assert!(f.service.get_cart(&f.user_id).await.unwrap().items.is_empty());
        let err = f.service.add_item(&f.user_id, add(&f.book_id, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_overflowing_line_total_is_a_bad_request() {
        let f = fixture().await;
        let pricey = insert_book(&f.db, &f.books, "SKU-BIG", i64::MAX / 2 + 1).await;

        let err = f.service.add_item(&f.user_id, add(&pricey, 2)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        // nothing was stored, so the cart still renders
        let cart = f.service.add_item(&f.user_id, add(&pricey, 1)).await.unwrap();
        assert_eq!(cart.total_cents, i64::MAX / 2 + 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let f = fixture().await;
        f.service.add_item(&f.user_id, add(&f.book_id, 2)).await.unwrap();
        f.service.clear(&f.user_id).await.unwrap();
        assert_eq!(f.service.get_cart(&f.user_id).await.unwrap().total_items, 0);
    }
}
