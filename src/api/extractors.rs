//! # Custom extractors
//!
//! Authentication and request metadata pulled out of request parts, plus
//! JSON body and query string extractors whose rejections are [`AppError`]s.

use std::net::SocketAddr;

use axum::{
    async_trait,
    body::Body,
    extract::{ConnectInfo, FromRequest, FromRequestParts},
    http::{header, request::Parts, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    error::AppError,
    models::Role,
    services::{extract_token_from_header, AppState},
};

// =====================================
// Bearer Token
// =====================================
/// Raw token from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = extract_token_from_header(auth_header).ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        Ok(BearerToken(token.to_string()))
    }
}

// =====================================
// Authenticated User
// =====================================
/// Caller identity from a verified JWT.
///
/// ```rust,ignore
/// async fn handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}", user.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Shorthand for `self.role.is_admin()`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let claims = state.auth_service.verify_token(&token)?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// An [`AuthUser`] whose token carries the admin role; everyone else gets 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser(user))
    }
}

// =====================================
// Client IP
// =====================================
/// Client address used to key login throttling.
///
/// The socket peer by default. With `rate_limit.trust_proxy_headers` set,
/// `X-Forwarded-For` and then `X-Real-IP` take precedence, since a proxy in
/// front of the service is the only peer the socket ever sees.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    /// Key used for per-client throttling.
    #[must_use]
    pub fn key(&self) -> &str {
        self.0.as_deref().unwrap_or("unknown")
    }

    fn forwarded(parts: &Parts) -> Option<String> {
        parts
            .headers
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                parts
                    .headers
                    .get("X-Real-IP")
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
    }

    fn peer(parts: &Parts) -> Option<String> {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ip = if state.config().rate_limit.trust_proxy_headers {
            Self::forwarded(parts).or_else(|| Self::peer(parts))
        } else {
            Self::peer(parts)
        };

        Ok(ClientIp(ip))
    }
}

// =====================================
// Query String
// =====================================
/// `axum::extract::Query` whose rejection is a JSON [`AppError`] body.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

// =====================================
// Validated JSON
// =====================================
/// JSON body that has passed its `validator` rules.
///
/// ```rust,ignore
/// async fn create(ValidatedJson(req): ValidatedJson<CreateBookRequest>) { /* ... */ }
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data): Json<T> = Json::from_request(req, state).await?;

        data.validate()?;

        Ok(ValidatedJson(data))
    }
}
