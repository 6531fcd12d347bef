//! # Cart handlers
//!
//! Every route acts on the authenticated caller's own cart.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::extractors::{AuthUser, ValidatedJson},
    error::Result,
    models::{AddCartItemRequest, ApiResponse, CartView, UpdateCartItemRequest},
    services::AppState,
};

/// GET /api/cart
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<CartView>>> {
    let cart = state.cart_service.get_cart(&user.id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// POST /api/cart/items
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<AddCartItemRequest>,
) -> Result<Json<ApiResponse<CartView>>> {
    let cart = state.cart_service.add_item(&user.id, request).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// PUT /api/cart/items/:book_id
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(book_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateCartItemRequest>,
) -> Result<Json<ApiResponse<CartView>>> {
    let cart = state.cart_service.update_item(&user.id, &book_id, request).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// DELETE /api/cart/items/:book_id
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(book_id): Path<String>,
) -> Result<Json<ApiResponse<CartView>>> {
    let cart = state.cart_service.remove_item(&user.id, &book_id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// DELETE /api/cart
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<CartView>>> {
    let cart = state.cart_service.clear(&user.id).await?;
    Ok(Json(ApiResponse::success(cart)))
}
