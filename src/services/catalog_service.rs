//! # Catalogue reference data
//!
//! Categories, authors and publishers. Rows still referenced by a book,
//! soft-deleted books included, cannot be deleted.

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    database::{AuthorRepository, CategoryRepository, PublisherRepository, Repository},
    error::{AppError, OptionExt, Result},
    models::{
        new_id, Author, Category, CreateAuthorRequest, CreateCategoryRequest,
        CreatePublisherRequest, PaginatedResult, Pagination, Publisher, UpdateAuthorRequest,
        UpdateCategoryRequest, UpdatePublisherRequest,
    },
    utils::clean_text,
};

use super::Service;

fn in_use(kind: &str, books: i64) -> AppError {
    AppError::Conflict(format!(
        "{} is used by {} book(s) and cannot be deleted",
        kind, books
    ))
}

// =====================================
// Categories
// =====================================
#[derive(Debug, Clone)]
pub struct CategoryService {
    repo: CategoryRepository,
}

impl Service for CategoryService {}

impl CategoryService {
    #[must_use]
    pub fn new(repo: CategoryRepository) -> Self {
        Self { repo }
    }

    /// Create a category with a trimmed, case-insensitively unique name.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateCategoryRequest) -> Result<Category> {
        request.validate()?;
        let name = request.name.trim().to_string();

        if self.repo.find_by_name(&name).await?.is_some() {
            return Err(AppError::Conflict(format!("Category '{}' already exists", name)));
        }

        let now = Utc::now();
        let category = Category {
            id: new_id(),
            name,
            description: clean_text(request.description),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(&category).await?;

        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// # Errors
    /// [`AppError::NotFound`] for an unknown id.
    pub async fn get(&self, id: &str) -> Result<Category> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_not_found(format!("Category '{}' not found", id))
    }

    /// Apply the present fields; a blank description clears it.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: UpdateCategoryRequest) -> Result<Category> {
        request.validate()?;
        let mut category = self.get(id).await?;

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if let Some(other) = self.repo.find_by_name(&name).await? {
                if other.id != category.id {
                    return Err(AppError::Conflict(format!("Category '{}' already exists", name)));
                }
            }
            category.name = name;
        }
        if request.description.is_some() {
            category.description = clean_text(request.description);
        }
        category.updated_at = Utc::now();

        self.repo.update(&category).await?;
        Ok(category)
    }

    /// Delete a category no book refers to.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.get(id).await?;

        let books = self.repo.count_books(id).await?;
        if books > 0 {
            return Err(in_use("Category", books));
        }

        self.repo.delete(id).await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    pub async fn list_paged(
        &self,
        search: Option<&str>,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Category>> {
        self.repo.list_paged(search, pagination).await
    }
}

// =====================================
// Authors
// =====================================
#[derive(Debug, Clone)]
pub struct AuthorService {
    repo: AuthorRepository,
}

impl Service for AuthorService {}

impl AuthorService {
    #[must_use]
    pub fn new(repo: AuthorRepository) -> Self {
        Self { repo }
    }

    /// Author names need not be unique.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateAuthorRequest) -> Result<Author> {
        request.validate()?;

        let now = Utc::now();
        let author = Author {
            id: new_id(),
            name: request.name.trim().to_string(),
            bio: clean_text(request.bio),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(&author).await?;

        info!(author_id = %author.id, "Author created");
        Ok(author)
    }

    pub async fn get(&self, id: &str) -> Result<Author> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_not_found(format!("Author '{}' not found", id))
    }

    /// Apply the present fields; a blank bio clears it.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: UpdateAuthorRequest) -> Result<Author> {
        request.validate()?;
        let mut author = self.get(id).await?;

        if let Some(name) = request.name {
            author.name = name.trim().to_string();
        }
        if request.bio.is_some() {
            author.bio = clean_text(request.bio);
        }
        author.updated_at = Utc::now();

        self.repo.update(&author).await?;
        Ok(author)
    }

    /// # Errors
    /// [`AppError::Conflict`] while any book, hidden ones included, names this author.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.get(id).await?;

        let books = self.repo.count_books(id).await?;
        if books > 0 {
            return Err(in_use("Author", books));
        }

        self.repo.delete(id).await?;
        info!(author_id = %id, "Author deleted");
        Ok(())
    }

    /// Authors by name, optionally filtered by `search`.
    pub async fn list_paged(
        &self,
        search: Option<&str>,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Author>> {
        self.repo.list_paged(search, pagination).await
    }
}

// =====================================
// Publishers
// =====================================
#[derive(Debug, Clone)]
pub struct PublisherService {
    repo: PublisherRepository,
}

impl Service for PublisherService {}

impl PublisherService {
    #[must_use]
    pub fn new(repo: PublisherRepository) -> Self {
        Self { repo }
    }

    /// Create a publisher.
    ///
    /// # Errors
    /// [`AppError::Conflict`] when another publisher has the same name, ignoring case.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreatePublisherRequest) -> Result<Publisher> {
        request.validate()?;
        let name = request.name.trim().to_string();

        if self.repo.find_by_name(&name).await?.is_some() {
            return Err(AppError::Conflict(format!("Publisher '{}' already exists", name)));
        }

        let now = Utc::now();
        let publisher = Publisher {
            id: new_id(),
            name,
            address: clean_text(request.address),
            website: clean_text(request.website),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(&publisher).await?;

        info!(publisher_id = %publisher.id, "Publisher created");
        Ok(publisher)
    }

    pub async fn get(&self, id: &str) -> Result<Publisher> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_not_found(format!("Publisher '{}' not found", id))
    }

    /// Apply the present fields, keeping the name unique.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: UpdatePublisherRequest) -> Result<Publisher> {
        request.validate()?;
        let mut publisher = self.get(id).await?;

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if let Some(other) = self.repo.find_by_name(&name).await? {
                if other.id != publisher.id {
                    return Err(AppError::Conflict(format!("Publisher '{}' already exists", name)));
                }
            }
            publisher.name = name;
        }
        if request.address.is_some() {
            publisher.address = clean_text(request.address);
        }
        if request.website.is_some() {
            publisher.website = clean_text(request.website);
        }
        publisher.updated_at = Utc::now();

        self.repo.update(&publisher).await?;
        Ok(publisher)
    }

    /// Delete a publisher no book refers to.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.get(id).await?;

        let books = self.repo.count_books(id).await?;
        if books > 0 {
            return Err(in_use("Publisher", books));
        }

        self.repo.delete(id).await?;
        info!(publisher_id = %id, "Publisher deleted");
        Ok(())
    }

    pub async fn list_paged(
        &self,
        search: Option<&str>,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Publisher>> {
        self.repo.list_paged(search, pagination).await
    }
}
