//! # Services (business logic)
//!
//! ```text
//! ┌─────────────────┐
//! │    API Layer    │  <-- HTTP handlers (axum)
//! ├─────────────────┤
//! │  Service Layer  │  <-- business rules
//! ├─────────────────┤
//! │ Repository Layer│  <-- sqlx queries
//! ├─────────────────┤
//! │     SQLite      │
//! └─────────────────┘
//! ```
//!
//! Everything is wired once in [`AppState::new`] and shared behind `Arc`.

mod auth_service;
mod book_service;
mod cart_service;
mod catalog_service;
mod notifications;
mod order_service;
mod photo_storage;
mod rate_limit;
mod stats_service;
mod user_service;

pub use auth_service::*;
pub use book_service::*;
pub use cart_service::*;
pub use catalog_service::*;
pub use notifications::*;
pub use order_service::*;
pub use photo_storage::*;
pub use rate_limit::*;
pub use stats_service::*;
pub use user_service::*;

use std::sync::Arc;

use crate::{
    config::Config,
    database::{
        AuthorRepository, BookRepository, CartRepository, CategoryRepository, Database,
        PublisherRepository, StatsRepository, UserRepository,
    },
    error::Result,
};

// =====================================
// Application State
// =====================================
/// Shared by every handler; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,

    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub book_service: Arc<BookService>,
    pub category_service: Arc<CategoryService>,
    pub author_service: Arc<AuthorService>,
    pub publisher_service: Arc<PublisherService>,
    pub cart_service: Arc<CartService>,
    pub order_service: Arc<OrderService>,
    pub stats_service: Arc<StatsService>,

    pub login_limiter: Arc<LoginRateLimiter>,
}

impl AppState {
    /// Mail goes through SMTP when configured and photos to the local
    /// upload directory.
    ///
    /// # Errors
    /// Fails when the SMTP transport cannot be built.
    pub fn new(db: Database, config: Config) -> Result<Self> {
        let mailer = mailer_from_config(&config.smtp)?;
        let storage = Arc::new(LocalPhotoStorage::new(&config.upload));
        Ok(Self::with_components(db, config, mailer, storage))
    }

    /// Build the state around explicit mail and photo backends.
    #[must_use]
    pub fn with_components(
        db: Database,
        config: Config,
        mailer: Arc<dyn Mailer>,
        storage: Arc<dyn PhotoStorage>,
    ) -> Self {
        let config = Arc::new(config);
        let notifier = Notifier::new(mailer, config.base_url.clone());

        let auth_service = Arc::new(AuthService::new(
            UserRepository::new(db.clone()),
            config.clone(),
            notifier.clone(),
        ));
        let user_service = Arc::new(UserService::new(UserRepository::new(db.clone())));
        let book_service = Arc::new(BookService::new(db.clone(), storage));
        let category_service = Arc::new(CategoryService::new(CategoryRepository::new(db.clone())));
        let author_service = Arc::new(AuthorService::new(AuthorRepository::new(db.clone())));
        let publisher_service =
            Arc::new(PublisherService::new(PublisherRepository::new(db.clone())));
        let cart_service = Arc::new(CartService::new(
            CartRepository::new(db.clone()),
            BookRepository::new(db.clone()),
        ));
        let order_service = Arc::new(OrderService::new(db.clone(), notifier));
        let stats_service = Arc::new(StatsService::new(StatsRepository::new(db.clone())));
        let login_limiter = Arc::new(LoginRateLimiter::new(&config.rate_limit));

        Self {
            config,
            db,
            auth_service,
            user_service,
            book_service,
            category_service,
            author_service,
            publisher_service,
            cart_service,
            order_service,
            stats_service,
            login_limiter,
        }
    }

    /// Loaded settings.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Marker for the service layer; services are shared across request tasks.
pub trait Service: Send + Sync {}
