//! Categories, authors and publishers: the reference data every book points at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// =====================================
// Category
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: Option<String>,
}

// =====================================
// Author
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAuthorRequest {
    #[validate(length(min = 1, max = 150, message = "Name must be 1-150 characters"))]
    pub name: String,

    #[validate(length(max = 5000, message = "Bio is too long"))]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAuthorRequest {
    #[validate(length(min = 1, max = 150, message = "Name must be 1-150 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 5000, message = "Bio is too long"))]
    pub bio: Option<String>,
}

// =====================================
// Publisher
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Publisher {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePublisherRequest {
    #[validate(length(min = 1, max = 150, message = "Name must be 1-150 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Address is too long"))]
    pub address: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePublisherRequest {
    #[validate(length(min = 1, max = 150, message = "Name must be 1-150 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Address is too long"))]
    pub address: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
}

/// `?search=` filter shared by the catalogue list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameSearch {
    #[serde(default)]
    pub search: Option<String>,
}

impl NameSearch {
    /// The trimmed search term, if any was given.
    #[must_use]
    pub fn term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_website_must_be_url() {
        let request = CreatePublisherRequest {
            name: "Penguin".into(),
            address: None,
            website: Some("not a url".into()),
        };
        assert!(request.validate().is_err());

        let request = CreatePublisherRequest {
            website: Some("https://penguin.example".into()),
            ..request
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_category_name_rejected() {
        let request = CreateCategoryRequest {
            name: String::new(),
            description: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let search = NameSearch {
            search: Some("   ".into()),
        };
        assert_eq!(search.term(), None);

        let search = NameSearch {
            search: Some(" tolkien ".into()),
        };
        assert_eq!(search.term(), Some("tolkien"));
    }
}
