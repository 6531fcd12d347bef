//! # User handlers
//!
//! The caller's own profile plus admin user management.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::extractors::{AdminUser, AuthUser, Query, ValidatedJson},
    error::Result,
    models::{
        AdminUpdateUserRequest, ApiResponse, EmptyResponse, PaginatedResult, Pagination,
        UpdateProfileRequest, UserFilter, UserResponse,
    },
    services::AppState,
};

// =====================================
// Own profile
// =====================================
/// GET /api/me
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let profile = state.user_service.get(&user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /api/me
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let profile = state.user_service.update_profile(&user.id, request).await?;
    Ok(Json(ApiResponse::success(profile)))
}

// =====================================
// Administration
// =====================================
/// GET /api/admin/users?search=&role=&page=&per_page=
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(filter): Query<UserFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiResponse<PaginatedResult<UserResponse>>>> {
    let users = state.user_service.list_paged(&filter, &pagination).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// GET /api/admin/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = state.user_service.get(&id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /api/admin/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<AdminUpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let user = state.user_service.admin_update(&admin.id, &id, request).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /api/admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<EmptyResponse>> {
    state.user_service.delete(&admin.id, &id).await?;
    Ok(Json(EmptyResponse::ok("User deleted")))
}
