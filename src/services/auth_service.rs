//! # Authentication
//!
//! Registration, login, JWT issue/verification and password changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    config::Config,
    database::{Repository, UserRepository},
    error::{AppError, OptionExt, Result},
    models::{
        hash_password, ChangePasswordRequest, Claims, CreateUser, LoginRequest, LoginResponse,
        RegisterRequest, RegisterResponse, Role, User,
    },
    utils::mask_email,
};

use super::{Notifier, Service};

#[derive(Clone)]
pub struct AuthService {
    repo: UserRepository,
    config: Arc<Config>,
    notifier: Notifier,
}

impl Service for AuthService {}

impl AuthService {
    #[must_use]
    pub fn new(repo: UserRepository, config: Arc<Config>, notifier: Notifier) -> Self {
        Self {
            repo,
            config,
            notifier,
        }
    }

    /// New customer account. A welcome email goes out in the background.
    #[instrument(skip(self, request), fields(email = %mask_email(&request.email)))]
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse> {
        request.validate()?;

        if self.repo.email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let create_user = CreateUser::new(
            &request.email,
            &request.password,
            request.name,
            Role::Customer,
        )?;
        let user = self.repo.create(create_user).await?;

        info!(user_id = %user.id, "New user registered");
        self.notifier.welcome(&user);

        Ok(RegisterResponse {
            user: user.into(),
            message: "Registration successful".to_string(),
        })
    }

    /// Check credentials and issue a token.
    ///
    /// # Errors
    /// - [`AppError::Unauthorized`] for an unknown email or a wrong password, with
    ///   the same message for both
    /// - [`AppError::Forbidden`] for a deactivated account
    #[instrument(skip(self, request), fields(email = %mask_email(&request.email)))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        request.validate()?;

        // Same message for unknown email and wrong password.
        let user = self
            .repo
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        if !user.verify_password(&request.password)? {
            warn!("Failed login attempt");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        info!(user_id = %user.id, "User logged in");
        self.issue(user)
    }

    /// Decode and check an HS256 bearer token.
    ///
    /// # Errors
    /// `Unauthorized` for bad signatures, malformed or expired tokens.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            warn!(error = %e, "Token verification failed");
            AppError::Unauthorized("Invalid token".to_string())
        })?;

        if token_data.claims.is_expired() {
            return Err(AppError::Unauthorized("Token expired".to_string()));
        }

        Ok(token_data.claims)
    }

    /// Fresh token for a still valid one. The account is re-read so role
    /// changes and deactivation take effect.
    #[instrument(skip(self, token))]
    pub async fn refresh_token(&self, token: &str) -> Result<LoginResponse> {
        let claims = self.verify_token(token)?;

        let user = self
            .repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        self.issue(user)
    }

    /// # Errors
    /// [`AppError::Unauthorized`] when `current_password` does not match.
    #[instrument(skip(self, request))]
    pub async fn change_password(&self, user_id: &str, request: ChangePasswordRequest) -> Result<()> {
        request.validate()?;

        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User not found")?;

        if !user.verify_password(&request.current_password)? {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let hash = hash_password(&request.new_password)?;
        self.repo.update_password(&user.id, &hash).await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Create the configured admin account unless the email is already taken.
    /// An existing account with that email is left untouched.
    #[instrument(skip(self, password), fields(email = %mask_email(email)))]
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<()> {
        if self.repo.email_exists(email).await? {
            info!("Admin account already present");
            return Ok(());
        }

        let user = self
            .repo
            .create(CreateUser::new(email, password, Some("Administrator".into()), Role::Admin)?)
            .await?;

        info!(user_id = %user.id, "Admin account created");
        Ok(())
    }

    fn issue(&self, user: User) -> Result<LoginResponse> {
        let claims = Claims::new(&user, self.config.jwt_expiration_hours);
        let encoding_key = EncodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let token = encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)?;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AppError::Internal("Token expiry out of range".to_string()))?;

        Ok(LoginResponse {
            user: user.into(),
            token,
            expires_at,
        })
    }
}

// =====================================
// Token Utilities
// =====================================
/// Token part of an `Authorization: Bearer <token>` header.
#[must_use]
pub fn extract_token_from_header(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ConfigBuilder,
        database::Database,
        services::{LogMailer, Notifier},
    };

    async fn service() -> AuthService {
        let db = Database::in_memory().await.unwrap();
        let config = Arc::new(ConfigBuilder::new().jwt_secret("test-secret").build());
        AuthService::new(
            UserRepository::new(db),
            config,
            Notifier::new(Arc::new(LogMailer), "http://localhost"),
        )
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: "password123".into(),
            name: Some("Reader".into()),
        }
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token_from_header("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_token_from_header("Basic abc123"), None);
        assert_eq!(extract_token_from_header("Bearer "), None);
        assert_eq!(extract_token_from_header("abc123"), None);
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service().await;
        let registered = auth.register(register_request("new@example.com")).await.unwrap();
        assert_eq!(registered.user.role, Role::Customer);

        let login = auth
            .login(LoginRequest {
                email: "NEW@example.com".into(),
                password: "password123".into(),
            })
            .await
            .unwrap();

        let claims = auth.verify_token(&login.token).unwrap();
        assert_eq!(claims.sub, registered.user.id);
        assert_eq!(claims.role, Role::Customer);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let auth = service().await;
        auth.register(register_request("dup@example.com")).await.unwrap();
        let err = auth.register(register_request("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_alike() {
        let auth = service().await;
        auth.register(register_request("a@example.com")).await.unwrap();

        let wrong = auth
            .login(LoginRequest {
                email: "a@example.com".into(),
                password: "nope-nope".into(),
            })
            .await
            .unwrap_err();
        let unknown = auth
            .login(LoginRequest {
                email: "b@example.com".into(),
                password: "nope-nope".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_change_password_is_persisted() {
        let auth = service().await;
        let user = auth.register(register_request("c@example.com")).await.unwrap().user;

        auth.change_password(
            &user.id,
            ChangePasswordRequest {
                current_password: "password123".into(),
                new_password: "brand-new-pass".into(),
            },
        )
        .await
        .unwrap();

        let login = auth
            .login(LoginRequest {
                email: "c@example.com".into(),
                password: "brand-new-pass".into(),
            })
            .await;
        assert!(login.is_ok());
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let auth = service().await;
        auth.register(register_request("t@example.com")).await.unwrap();
        let login = auth
            .login(LoginRequest {
                email: "t@example.com".into(),
                password: "password123".into(),
            })
            .await
            .unwrap();

        let mut token = login.token;
        token.push('x');
        assert!(matches!(auth.verify_token(&token), Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let auth = service().await;
        auth.ensure_admin("admin@example.com", "admin-pass-1").await.unwrap();
        auth.ensure_admin("admin@example.com", "other-pass-2").await.unwrap();

        let user = auth.repo.find_by_email("admin@example.com").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(user.verify_password("admin-pass-1").unwrap());
    }
}
