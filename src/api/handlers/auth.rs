//! # Auth handlers
//!
//! Registration, login, token refresh and password change.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    api::extractors::{AuthUser, BearerToken, ClientIp, ValidatedJson},
    error::Result,
    models::{
        ApiResponse, ChangePasswordRequest, EmptyResponse, LoginRequest, LoginResponse,
        RegisterRequest,
    },
    services::AppState,
};

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service.register(request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

/// POST /api/auth/login, throttled per client address.
pub async fn login(
    State(state): State<AppState>,
    client: ClientIp,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    state.login_limiter.check(client.key())?;

    let response = state.auth_service.login(request).await?;

    Ok(Json(ApiResponse::success(response)))
}

/// POST /api/auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let response = state.auth_service.refresh_token(&token).await?;

    Ok(Json(ApiResponse::success(response)))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<EmptyResponse>> {
    state.auth_service.change_password(&user.id, request).await?;

    Ok(Json(EmptyResponse::ok("Password changed")))
}
