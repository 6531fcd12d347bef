//! # Book model
//!
//! The `books` row, the joined read models returned by the API, photo rows,
//! and the list filter behind the paged catalogue endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::SortOrder;
use crate::utils::clean_text;

// =====================================
// Book Entity
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub pages: i64,
    pub description: Option<String>,
    pub sku: String,

    /// Price in minor currency units
    pub price_cents: i64,
    pub stock: i64,

    pub author_id: String,
    pub publisher_id: String,
    pub category_id: String,

    /// Soft-delete flag; deleted books are hidden but keep order history valid
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the paged catalogue listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub sku: String,
    pub pages: i64,
    pub price_cents: i64,
    pub stock: i64,
    pub author_id: String,
    pub author_name: String,
    pub publisher_id: String,
    pub publisher_name: String,
    pub category_id: String,
    pub category_name: String,
    pub main_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full book view with resolved references and photos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub author_name: String,
    pub publisher_name: String,
    pub category_name: String,
    pub photos: Vec<BookPhoto>,
}

// =====================================
// Photos
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookPhoto {
    pub id: String,
    pub book_id: String,
    pub url: String,

    /// Storage handle used to remove the file again
    pub public_id: String,
    pub is_main: bool,
    pub created_at: DateTime<Utc>,
}

// =====================================
// Requests
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: String,

    #[validate(range(min = 1, max = 100000, message = "Pages must be between 1 and 100000"))]
    pub pages: i64,

    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: Option<String>,

    #[validate(regex(path = *crate::utils::VALID_SKU, message = "SKU must be 3-32 letters, digits or '-'"))]
    pub sku: String,

    #[validate(range(min = 0, max = 100_000_000, message = "Price must be between 0 and 100000000 cents"))]
    pub price_cents: i64,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[serde(default)]
    pub stock: i64,

    #[validate(length(min = 1, message = "Author is required"))]
    pub author_id: String,

    #[validate(length(min = 1, message = "Publisher is required"))]
    pub publisher_id: String,

    #[validate(length(min = 1, message = "Category is required"))]
    pub category_id: String,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: Option<String>,

    #[validate(range(min = 1, max = 100000, message = "Pages must be between 1 and 100000"))]
    pub pages: Option<i64>,

    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: Option<String>,

    #[validate(regex(path = *crate::utils::VALID_SKU, message = "SKU must be 3-32 letters, digits or '-'"))]
    pub sku: Option<String>,

    #[validate(range(min = 0, max = 100_000_000, message = "Price must be between 0 and 100000000 cents"))]
    pub price_cents: Option<i64>,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i64>,

    pub author_id: Option<String>,
    pub publisher_id: Option<String>,
    pub category_id: Option<String>,
}

impl UpdateBookRequest {
    /// Apply the present fields onto a stored book. A blank description
    /// clears it.
    pub fn apply_to(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(pages) = self.pages {
            book.pages = pages;
        }
        if self.description.is_some() {
            book.description = clean_text(self.description);
        }
        if let Some(sku) = self.sku {
            book.sku = sku;
        }
        if let Some(price) = self.price_cents {
            book.price_cents = price;
        }
        if let Some(stock) = self.stock {
            book.stock = stock;
        }
        if let Some(author_id) = self.author_id {
            book.author_id = author_id;
        }
        if let Some(publisher_id) = self.publisher_id {
            book.publisher_id = publisher_id;
        }
        if let Some(category_id) = self.category_id {
            book.category_id = category_id;
        }
    }
}

// =====================================
// Filtering
// =====================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookSortField {
    Title,
    Price,
    Pages,
    #[default]
    CreatedAt,
}

impl BookSortField {
    /// Column expression for `ORDER BY`; never built from user text.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Title => "b.title",
            Self::Price => "b.price_cents",
            Self::Pages => "b.pages",
            Self::CreatedAt => "b.created_at",
        }
    }
}

/// Query-string filter for the catalogue listing. All criteria are ANDed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookFilter {
    /// Matches title, SKU or description
    #[serde(default)]
    pub search: Option<String>,

    #[serde(default)]
    pub category_id: Option<String>,

    #[serde(default)]
    pub author_id: Option<String>,

    #[serde(default)]
    pub publisher_id: Option<String>,

    #[serde(default)]
    pub min_price: Option<i64>,

    #[serde(default)]
    pub max_price: Option<i64>,

    #[serde(default)]
    pub in_stock: Option<bool>,

    #[serde(default)]
    pub sort_by: BookSortField,

    #[serde(default)]
    pub order: SortOrder,
}

impl BookFilter {
    /// Trimmed search text, `None` when blank.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> CreateBookRequest {
        CreateBookRequest {
            title: "Dune".into(),
            pages: 412,
            description: None,
            sku: "DUNE-001".into(),
            price_cents: 1999,
            stock: 3,
            author_id: "a".into(),
            publisher_id: "p".into(),
            category_id: "c".into(),
        }
    }

    fn sample_book() -> Book {
        let now = chrono::Utc::now();
        Book {
            id: "b1".into(),
            title: "Dune".into(),
            pages: 412,
            description: None,
            sku: "DUNE-001".into(),
            price_cents: 1999,
            stock: 3,
            author_id: "a".into(),
            publisher_id: "p".into(),
            category_id: "c".into(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn test_bad_sku_and_price_rejected() {
        let request = CreateBookRequest {
            sku: "bad sku!".into(),
            ..sample_request()
        };
        assert!(request.validate().is_err());

        let request = CreateBookRequest {
            price_cents: -1,
            ..sample_request()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_price_has_an_upper_bound() {
        let request = CreateBookRequest {
            price_cents: i64::MAX / 2 + 1,
            ..sample_request()
        };
        assert!(request.validate().is_err());

        let update = UpdateBookRequest {
            price_cents: Some(i64::MAX),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = UpdateBookRequest {
            price_cents: Some(100_000_000),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_blank_description_clears_it() {
        let mut book = sample_book();
        book.description = Some("Old blurb".into());

        UpdateBookRequest {
            description: Some("   ".into()),
            ..Default::default()
        }
        .apply_to(&mut book);
        assert_eq!(book.description, None);

        UpdateBookRequest {
            description: Some("  New blurb ".into()),
            ..Default::default()
        }
        .apply_to(&mut book);
        assert_eq!(book.description.as_deref(), Some("New blurb"));

        UpdateBookRequest::default().apply_to(&mut book);
        assert_eq!(book.description.as_deref(), Some("New blurb"));
    }

    #[test]
    fn test_filter_defaults_from_empty_query() {
        let filter: BookFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.sort_by, BookSortField::CreatedAt);
        assert_eq!(filter.order, SortOrder::Asc);
        assert!(filter.search_term().is_none());
    }

    #[test]
    fn test_sort_field_from_snake_case() {
        let field: BookSortField = serde_json::from_str("\"created_at\"").unwrap();
        assert_eq!(field.as_sql(), "b.created_at");
    }
}
