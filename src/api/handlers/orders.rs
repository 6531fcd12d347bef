//! # Order handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    api::extractors::{AdminUser, AuthUser, Query, ValidatedJson},
    error::Result,
    models::{
        ApiResponse, CheckoutRequest, Order, OrderDetails, OrderFilter, PaginatedResult,
        Pagination, UpdateOrderStatusRequest,
    },
    services::AppState,
};

/// POST /api/orders: check out the caller's cart.
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let order = state.order_service.checkout(&user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(order).with_message("Order placed")),
    ))
}

/// GET /api/orders?status=&page=&per_page=
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<OrderFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PaginatedResult<Order>>>> {
    let orders = state
        .order_service
        .list_for_user(&user.id, &filter, &pagination)
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// GET /api/orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<OrderDetails>>> {
    let order = state.order_service.get(&user.id, user.is_admin(), &id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/orders/:id/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<OrderDetails>>> {
    let order = state
        .order_service
        .cancel(&user.id, user.is_admin(), &id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

// =====================================
// Administration
// =====================================
/// GET /api/admin/orders?status=&page=&per_page=
pub async fn list_all_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<OrderFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PaginatedResult<Order>>>> {
    let orders = state.order_service.list_all(&filter, &pagination).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// PUT /api/admin/orders/:id/status
pub async fn update_order_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderDetails>>> {
    let order = state.order_service.update_status(&id, request.status).await?;
    Ok(Json(ApiResponse::success(order)))
}
