use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::types::{ProfileResponse, UpdateProfileRequest};
use crate::session::password::PasswordHasher;
use crate::session::types::UserResponse;
use crate::shared::AppError;
use crate::store::repository::CredentialStore;

/// Reads, updates, and deletes the authenticated user's own record. Identity
/// comes from claims the session authority already checked; every operation
/// here resolves the user id fresh, so a deleted account surfaces as
/// `NotFound` even while its token is still structurally valid.
pub struct ProfileService {
    store: Arc<dyn CredentialStore + Send + Sync>,
    hasher: PasswordHasher,
}

impl ProfileService {
    pub fn new(store: Arc<dyn CredentialStore + Send + Sync>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: &str) -> Result<ProfileResponse, AppError> {
        debug!(user_id = %user_id, "Fetching profile");

        self.store
            .find_user_by_id(user_id)
            .await?
            .map(ProfileResponse::from)
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    /// Merges the supplied fields into the current record and persists it.
    /// Empty or omitted fields keep their existing values; a supplied
    /// password is re-hashed, the rest pass through untransformed.
    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        user_id: &str,
        changes: UpdateProfileRequest,
    ) -> Result<UserResponse, AppError> {
        let mut user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        if let Some(name) = supplied(changes.name) {
            user.name = name;
        }
        if let Some(email) = supplied(changes.email) {
            user.email = email;
        }
        if let Some(username) = supplied(changes.username) {
            user.username = username;
        }
        if let Some(password) = supplied(changes.password) {
            user.password_hash = self.hasher.hash(&password)?;
        }
        user.updated_at = Utc::now();

        let updated = self
            .store
            .update_user(&user)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        info!(user_id = %updated.id, "Profile updated");
        Ok(updated.into())
    }

    /// Removes the user record. Outstanding session tokens are not revoked;
    /// they keep verifying but every profile read afterwards is `NotFound`.
    #[instrument(skip(self))]
    pub async fn delete_profile(&self, user_id: &str) -> Result<UserResponse, AppError> {
        let deleted = self
            .store
            .delete_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        info!(user_id = %deleted.id, "Profile deleted");
        Ok(deleted.into())
    }
}

/// An empty string counts as "not supplied" and preserves the current value
fn supplied(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}
