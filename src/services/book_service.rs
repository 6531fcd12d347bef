//! # Books
//!
//! Catalogue CRUD, the filtered listing and photo management. Deleting a
//! book only hides it so existing orders keep a valid reference.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    database::{
        AuthorRepository, BookRepository, CategoryRepository, Database, PhotoRepository,
        PublisherRepository, Repository,
    },
    error::{AppError, Result},
    models::{
        new_id, Book, BookDetails, BookFilter, BookPhoto, BookSummary, CreateBookRequest,
        PaginatedResult, Pagination, UpdateBookRequest,
    },
    utils::{clean_text, normalize_sku},
};

use super::{PhotoStorage, PhotoUpload, Service};

#[derive(Clone)]
pub struct BookService {
    db: Database,
    books: BookRepository,
    photos: PhotoRepository,
    authors: AuthorRepository,
    publishers: PublisherRepository,
    categories: CategoryRepository,
    storage: Arc<dyn PhotoStorage>,
}

impl Service for BookService {}

impl BookService {
    #[must_use]
    pub fn new(db: Database, storage: Arc<dyn PhotoStorage>) -> Self {
        Self {
            books: BookRepository::new(db.clone()),
            photos: PhotoRepository::new(db.clone()),
            authors: AuthorRepository::new(db.clone()),
            publishers: PublisherRepository::new(db.clone()),
            categories: CategoryRepository::new(db.clone()),
            db,
            storage,
        }
    }

    /// Create a book after normalizing its SKU.
    ///
    /// # Errors
    /// - [`AppError::Conflict`] when the SKU is already in use
    /// - [`AppError::BadRequest`] when the author, publisher or category is missing
    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create(&self, mut request: CreateBookRequest) -> Result<BookDetails> {
        request.sku = normalize_sku(&request.sku);
        request.validate()?;

        if self.books.sku_exists(&request.sku, None).await? {
            return Err(AppError::Conflict(format!("SKU '{}' is already in use", request.sku)));
        }
        self.check_references(&request.author_id, &request.publisher_id, &request.category_id)
            .await?;

        let now = Utc::now();
        let book = Book {
            id: new_id(),
            title: request.title.trim().to_string(),
            pages: request.pages,
            description: clean_text(request.description),
            sku: request.sku,
            price_cents: request.price_cents,
            stock: request.stock,
            author_id: request.author_id,
            publisher_id: request.publisher_id,
            category_id: request.category_id,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.books.insert(&book).await?;

        info!(book_id = %book.id, "Book created");
        self.details(book).await
    }

    /// Active book with its reference names and photos.
    pub async fn get(&self, id: &str) -> Result<BookDetails> {
        let book = self.find_active(id).await?;
        self.details(book).await
    }

    /// Apply the present fields of `request` to an active book.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, mut request: UpdateBookRequest) -> Result<BookDetails> {
        request.sku = request.sku.as_deref().map(normalize_sku);
        request.validate()?;

        let mut book = self.find_active(id).await?;

        if let Some(sku) = &request.sku {
            if *sku != book.sku && self.books.sku_exists(sku, Some(id)).await? {
                return Err(AppError::Conflict(format!("SKU '{}' is already in use", sku)));
            }
        }

        request.apply_to(&mut book);
        self.check_references(&book.author_id, &book.publisher_id, &book.category_id)
            .await?;
        book.updated_at = Utc::now();
        self.books.update(&book).await?;

        info!(book_id = %id, "Book updated");
        self.details(book).await
    }

    /// Soft delete: the book disappears from the catalogue and carts.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.books.soft_delete(id).await? {
            return Err(AppError::not_found("Book", id));
        }

        info!(book_id = %id, "Book deleted");
        Ok(())
    }

    pub async fn list_paged(
        &self,
        filter: &BookFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<BookSummary>> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(AppError::BadRequest(
                    "min_price cannot be greater than max_price".to_string(),
                ));
            }
        }

        self.books.list_paged(filter, pagination).await
    }

    // =====================================
    // Photos
    // =====================================
    /// Store an uploaded photo. The first photo of a book becomes its main photo.
    #[instrument(skip(self, upload), fields(content_type = %upload.content_type, bytes = upload.bytes.len()))]
    pub async fn add_photo(&self, book_id: &str, upload: PhotoUpload) -> Result<BookPhoto> {
        self.find_active(book_id).await?;

        let stored = self.storage.store(upload).await?;
        let photo = BookPhoto {
            id: new_id(),
            book_id: book_id.to_string(),
            url: stored.url,
            public_id: stored.public_id,
            is_main: self.photos.count_for_book(book_id).await? == 0,
            created_at: Utc::now(),
        };

        if let Err(e) = self.photos.insert(&photo).await {
            self.discard_file(&photo.public_id).await;
            return Err(e);
        }

        info!(book_id = %book_id, photo_id = %photo.id, main = photo.is_main, "Photo added");
        Ok(photo)
    }

    /// Remove a photo. When it was the main one the oldest remaining photo
    /// takes over.
    #[instrument(skip(self))]
    pub async fn delete_photo(&self, book_id: &str, photo_id: &str) -> Result<()> {
        let photo = self.find_photo(book_id, photo_id).await?;

        let mut tx = self.db.begin().await?;
        PhotoRepository::delete(&mut tx, &photo.id).await?;
        if photo.is_main {
            if let Some(next) = PhotoRepository::oldest(&mut tx, book_id).await? {
                PhotoRepository::set_main(&mut tx, book_id, &next).await?;
            }
        }
        tx.commit().await?;

        self.discard_file(&photo.public_id).await;
        info!(book_id = %book_id, photo_id = %photo_id, "Photo deleted");
        Ok(())
    }

    /// Make `photo_id` the main photo and return the reordered gallery.
    #[instrument(skip(self))]
    pub async fn set_main_photo(&self, book_id: &str, photo_id: &str) -> Result<Vec<BookPhoto>> {
        self.find_photo(book_id, photo_id).await?;

        let mut tx = self.db.begin().await?;
        PhotoRepository::set_main(&mut tx, book_id, photo_id).await?;
        tx.commit().await?;

        self.photos.list_for_book(book_id).await
    }

    // =====================================
    // Helpers
    // =====================================
    async fn find_active(&self, id: &str) -> Result<Book> {
        self.books
            .find_active(id)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    async fn find_photo(&self, book_id: &str, photo_id: &str) -> Result<BookPhoto> {
        self.find_active(book_id).await?;
        self.photos
            .find(book_id, photo_id)
            .await?
            .ok_or_else(|| AppError::not_found("Photo", photo_id))
    }

    async fn details(&self, book: Book) -> Result<BookDetails> {
        let names = self.books.names(&book).await?;
        let photos = self.photos.list_for_book(&book.id).await?;

        Ok(BookDetails {
            book,
            author_name: names.author_name,
            publisher_name: names.publisher_name,
            category_name: names.category_name,
            photos,
        })
    }

    async fn check_references(
        &self,
        author_id: &str,
        publisher_id: &str,
        category_id: &str,
    ) -> Result<()> {
        if !self.authors.exists(author_id).await? {
            return Err(AppError::BadRequest(format!("Author '{}' does not exist", author_id)));
        }
        if !self.publishers.exists(publisher_id).await? {
            return Err(AppError::BadRequest(format!(
                "Publisher '{}' does not exist",
                publisher_id
            )));
        }
        if !self.categories.exists(category_id).await? {
            return Err(AppError::BadRequest(format!(
                "Category '{}' does not exist",
                category_id
            )));
        }
        Ok(())
    }

    async fn discard_file(&self, public_id: &str) {
        if let Err(e) = self.storage.remove(public_id).await {
            warn!(error = %e, public_id = %public_id, "Could not remove photo file");
        }
    }
}
