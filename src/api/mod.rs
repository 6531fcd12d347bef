//! # HTTP API
//!
//! ```text
//! /health
//! /uploads/*                      stored book photos
//! /api/auth/...                   register, login, refresh, change-password
//! /api/me                         own profile
//! /api/books, /api/categories,
//! /api/authors, /api/publishers   catalogue (public reads, admin writes)
//! /api/cart, /api/orders          signed-in customers
//! /api/admin/...                  orders, users, stats
//! ```

mod extractors;
mod handlers;
mod middleware;

pub use extractors::*;
pub use handlers::*;
pub use middleware::*;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::services::AppState;

/// Multipart framing allowance on top of the photo size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the application router around a ready [`AppState`].
pub fn create_router(state: AppState) -> Router {
    let upload_dir = state.config.upload.dir.clone();
    let photo_limit = state.config.upload.max_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api_routes(photo_limit))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(request_id))
                .layer(axum_middleware::from_fn(request_timing))
                .layer(axum_middleware::from_fn(security_headers))
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

fn api_routes(photo_limit: usize) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route(
            "/me",
            get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .nest("/books", book_routes(photo_limit))
        .nest("/categories", category_routes())
        .nest("/authors", author_routes())
        .nest("/publishers", publisher_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh_token))
        .route("/change-password", post(handlers::auth::change_password))
}

fn book_routes(photo_limit: usize) -> Router<AppState> {
    use handlers::books::*;

    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/:id", get(get_book).put(update_book).delete(delete_book))
        .route(
            "/:id/photos",
            post(upload_photo)
                .layer::<_, std::convert::Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(photo_limit)),
        )
        .route("/:id/photos/:photo_id", axum::routing::delete(delete_photo))
        .route("/:id/photos/:photo_id/main", put(set_main_photo))
}

fn category_routes() -> Router<AppState> {
    use handlers::catalog::*;

    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

fn author_routes() -> Router<AppState> {
    use handlers::catalog::*;

    Router::new()
        .route("/", get(list_authors).post(create_author))
        .route("/:id", get(get_author).put(update_author).delete(delete_author))
}

fn publisher_routes() -> Router<AppState> {
    use handlers::catalog::*;

    Router::new()
        .route("/", get(list_publishers).post(create_publisher))
        .route(
            "/:id",
            get(get_publisher).put(update_publisher).delete(delete_publisher),
        )
}

fn cart_routes() -> Router<AppState> {
    use handlers::cart::*;

    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/:book_id", put(update_item).delete(remove_item))
}

fn order_routes() -> Router<AppState> {
    use handlers::orders::*;

    Router::new()
        .route("/", get(list_my_orders).post(checkout))
        .route("/:id", get(get_order))
        .route("/:id/cancel", post(cancel_order))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(handlers::orders::list_all_orders))
        .route("/orders/:id/status", put(handlers::orders::update_order_status))
        .route("/users", get(handlers::user::list_users))
        .route(
            "/users/:id",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .route("/stats", get(handlers::stats::get_stats))
}
