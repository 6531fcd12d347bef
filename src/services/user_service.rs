//! Profiles for signed-in users and account administration.

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    database::{Repository, UserRepository},
    error::{AppError, OptionExt, Result},
    models::{
        AdminUpdateUserRequest, PaginatedResult, Pagination, Role, UpdateProfileRequest,
        UserFilter, UserResponse,
    },
};

use super::Service;

#[derive(Debug, Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl Service for UserService {}

impl UserService {
    #[must_use]
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Public view of a user, without the password hash.
    pub async fn get(&self, id: &str) -> Result<UserResponse> {
        let user = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_not_found(format!("User '{}' not found", id))?;

        Ok(user.into())
    }

    /// Change the caller's display name.
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse> {
        request.validate()?;

        let mut user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User not found")?;

        if let Some(name) = request.name {
            user.name = Some(name.trim().to_string());
        }
        user.updated_at = Utc::now();
        self.repo.update(&user).await?;

        Ok(user.into())
    }

    /// Users filtered by search text and role.
    pub async fn list_paged(
        &self,
        filter: &UserFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<UserResponse>> {
        let page = self.repo.list_paged(filter, pagination).await?;
        Ok(page.map(UserResponse::from))
    }

    /// Admin change of role, active flag or name. Admins cannot demote or
    /// deactivate their own account.
    #[instrument(skip(self, request), fields(actor = %actor_id))]
    pub async fn admin_update(
        &self,
        actor_id: &str,
        id: &str,
        request: AdminUpdateUserRequest,
    ) -> Result<UserResponse> {
        request.validate()?;

        if actor_id == id {
            if matches!(request.role, Some(role) if role != Role::Admin) {
                return Err(AppError::BadRequest("You cannot remove your own admin role".into()));
            }
            if request.is_active == Some(false) {
                return Err(AppError::BadRequest("You cannot deactivate your own account".into()));
            }
        }

        let mut user = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_not_found(format!("User '{}' not found", id))?;

        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(active) = request.is_active {
            user.is_active = active;
        }
        if let Some(name) = request.name {
            user.name = Some(name.trim().to_string());
        }
        user.updated_at = Utc::now();
        self.repo.update(&user).await?;

        info!(user_id = %id, role = ?user.role, active = user.is_active, "User updated by admin");
        Ok(user.into())
    }

    /// Accounts that placed orders are kept; deleting them is a conflict.
    #[instrument(skip(self), fields(actor = %actor_id))]
    pub async fn delete(&self, actor_id: &str, id: &str) -> Result<()> {
        if actor_id == id {
            return Err(AppError::BadRequest("You cannot delete your own account".into()));
        }

        if !self.repo.delete(id).await? {
            return Err(AppError::not_found("User", id));
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}
