//! Shopping cart: one cart per user, one line per book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::{AppError, Result};

/// Upper bound on a single cart line.
pub const MAX_LINE_QUANTITY: i64 = 99;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart line joined with the current book data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CartLine {
    pub book_id: String,
    pub title: String,
    pub sku: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub stock: i64,
}

impl CartLine {
    /// `unit_price_cents * quantity`.
    ///
    /// # Errors
    /// [`AppError::BadRequest`] when the product does not fit in an `i64`.
    pub fn line_total_cents(&self) -> Result<i64> {
        self.unit_price_cents
            .checked_mul(self.quantity)
            .ok_or_else(|| amount_too_large(&self.title))
    }

    /// Sum of every line total, with the same overflow rule.
    ///
    /// # Errors
    /// See [`CartLine::line_total_cents`].
    pub fn total_cents(lines: &[CartLine]) -> Result<i64> {
        lines.iter().try_fold(0i64, |total, line| {
            total
                .checked_add(line.line_total_cents()?)
                .ok_or_else(|| amount_too_large(&line.title))
        })
    }
}

fn amount_too_large(title: &str) -> AppError {
    AppError::BadRequest(format!("Order amount for '{}' is too large", title))
}

/// What `GET /api/cart` returns: live lines plus their totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub cart_id: String,
    pub items: Vec<CartLine>,
    pub total_items: i64,
    pub total_cents: i64,
}

impl CartView {
    /// # Errors
    /// [`AppError::BadRequest`] when the cart total overflows.
    pub fn new(cart_id: String, items: Vec<CartLine>) -> Result<Self> {
        let total_items = items.iter().map(|l| l.quantity).sum();
        let total_cents = CartLine::total_cents(&items)?;

        Ok(Self {
            cart_id,
            items,
            total_items,
            total_cents,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddCartItemRequest {
    #[validate(length(min = 1, message = "Book is required"))]
    pub book_id: String,

    #[validate(range(min = 1, max = 99, message = "Quantity must be between 1 and 99"))]
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Quantity 0 removes the line.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 0, max = 99, message = "Quantity must be between 0 and 99"))]
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: i64) -> CartLine {
        CartLine {
            book_id: crate::models::new_id(),
            title: "t".into(),
            sku: "SKU-1".into(),
            unit_price_cents: price,
            quantity,
            stock: 10,
        }
    }

    #[test]
    fn test_cart_totals() {
        let view = CartView::new("c".into(), vec![line(1000, 2), line(250, 3)]).unwrap();
        assert_eq!(view.total_items, 5);
        assert_eq!(view.total_cents, 2750);
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let view = CartView::new("c".into(), Vec::new()).unwrap();
        assert_eq!(view.total_items, 0);
        assert_eq!(view.total_cents, 0);
    }

    #[test]
    fn test_huge_prices_are_rejected_not_wrapped() {
        let err = line(i64::MAX / 2 + 1, 2).line_total_cents().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = CartView::new("c".into(), vec![line(i64::MAX / 2, 1), line(i64::MAX / 2, 1), line(5, 1)])
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_quantity_defaults_to_one() {
        let request: AddCartItemRequest = serde_json::from_str(r#"{"book_id":"b"}"#).unwrap();
        assert_eq!(request.quantity, 1);
        assert!(request.validate().is_ok());
    }
}
