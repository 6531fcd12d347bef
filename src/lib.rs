//! # Bookstore
//!
//! Book store management API: catalogue (books, categories, authors,
//! publishers), shopping carts, orders and user accounts.
//!
//! ```text
//! src/
//! ├── lib.rs          # library root
//! ├── main.rs         # server binary
//! ├── config/         # settings
//! ├── error/          # AppError and its HTTP mapping
//! ├── database/       # SQLite pool and repositories
//! ├── models/         # entities and DTOs
//! ├── services/       # business rules
//! ├── api/            # axum router, extractors, handlers
//! └── utils/          # small helpers
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bookstore::{api::create_router, config::Config, database::Database, services::AppState};
//!
//! #[tokio::main]
//! async fn main() -> bookstore::Result<()> {
//!     let config = Config::load()?;
//!     let db = Database::connect(&config.database_url).await?;
//!     db.migrate().await?;
//!     let _app = create_router(AppState::new(db, config)?);
//!     Ok(())
//! }
//! ```

pub mod config;

pub mod error;

pub mod database;

pub mod models;

pub mod services;

pub mod api;

pub mod utils;

pub use error::Result;

pub use error::AppError;

/// Common imports.
///
/// ```rust
/// use bookstore::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::database::Database;
    pub use crate::error::{AppError, Result};
    pub use crate::models::*;
    pub use crate::services::*;
}
