//! # User model
//!
//! Entity, password hashing, auth DTOs and JWT claims.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::{AppError, Result};

// =====================================
// Role
// =====================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Customer,
}

impl Role {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

// =====================================
// User Entity
// =====================================
/// Never serialized directly: responses go through [`UserResponse`] so the
/// password hash cannot leak.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// # Errors
    /// Fails only when the stored hash is not a valid PHC string.
    pub fn verify_password(&self, password: &str) -> Result<bool> {
        let parsed_hash =
            PasswordHash::new(&self.password_hash).map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// Argon2id hash with a fresh random salt, in PHC string format.
///
/// # Errors
/// Propagates hasher failures as [`AppError::Internal`].
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .to_string())
}

/// Insert payload for the users table.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
}

impl CreateUser {
    /// # Errors
    /// See [`hash_password`].
    pub fn new(
        email: impl Into<String>,
        password: &str,
        name: Option<String>,
        role: Role,
    ) -> Result<Self> {
        Ok(Self {
            id: super::new_id(),
            email: email.into().trim().to_lowercase(),
            password_hash: hash_password(password)?,
            name,
            role,
        })
    }
}

// =====================================
// Requests
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    pub new_password: String,
}

/// Admin-side account changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    pub role: Option<Role>,
    pub is_active: Option<bool>,

    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    /// Matches email or name
    #[serde(default)]
    pub search: Option<String>,

    #[serde(default)]
    pub role: Option<Role>,
}

// =====================================
// Responses
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub message: String,
}

// =====================================
// JWT Claims
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Claims for `user` valid for `expiration_hours` from now.
    #[must_use]
    pub fn new(user: &User, expiration_hours: u64) -> Self {
        let now = Utc::now();
        let hours = i64::try_from(expiration_hours).unwrap_or(i64::MAX / 3600);
        let exp = now + chrono::Duration::hours(hours);

        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

#[cfg(test)]
pub(crate) fn test_user(role: Role) -> User {
    let now = Utc::now();
    User {
        id: super::new_id(),
        email: "reader@example.com".into(),
        password_hash: hash_password("correct horse").unwrap(),
        name: Some("Reader".into()),
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies() {
        let user = test_user(Role::Customer);
        assert!(user.verify_password("correct horse").unwrap());
        assert!(!user.verify_password("wrong horse").unwrap());
    }

    #[test]
    fn test_create_user_normalizes_email() {
        let create = CreateUser::new("  Reader@Example.COM ", "password1", None, Role::Customer).unwrap();
        assert_eq!(create.email, "reader@example.com");
        assert_ne!(create.password_hash, "password1");
    }

    #[test]
    fn test_claims_carry_role_and_expire() {
        let user = test_user(Role::Admin);
        let claims = Claims::new(&user, 1);
        assert!(claims.role.is_admin());
        assert!(!claims.is_expired());

        let expired = Claims {
            exp: Utc::now().timestamp() - 60,
            ..claims
        };
        assert!(expired.is_expired());
    }

    #[test]
    fn test_response_hides_hash() {
        let json = serde_json::to_value(UserResponse::from(test_user(Role::Customer))).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "customer");
    }
}
