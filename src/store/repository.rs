use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Trait for the credential store backing the session authority and profile
/// manager. The store is the single serialization point: username/email
/// uniqueness is enforced here atomically, never by a check-then-insert
/// sequence in the callers.
#[async_trait]
pub trait CredentialStore {
    /// Persists a new user. Fails with `Conflict` if the username or email
    /// is already taken.
    async fn insert_user(&self, user: &UserModel) -> Result<UserModel, AppError>;
    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<UserModel>, AppError>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserModel>, AppError>;
    /// Persists an already-merged user record. Returns `None` if the row no
    /// longer exists; fails with `Conflict` if the new username or email
    /// collides with another user.
    async fn update_user(&self, user: &UserModel) -> Result<Option<UserModel>, AppError>;
    /// Removes a user, returning the deleted row, or `None` if absent.
    async fn delete_user(&self, id: &str) -> Result<Option<UserModel>, AppError>;
    /// Adds a token to the revocation set. Idempotent: recording the same
    /// token twice succeeds both times.
    async fn record_revocation(&self, token: &str) -> Result<(), AppError>;
    async fn is_revoked(&self, token: &str) -> Result<bool, AppError>;
}

/// In-memory implementation of CredentialStore for development and testing
///
/// This provides a realistic implementation that can be used in development
/// without requiring a real database connection. Data is stored in memory
/// and will be lost when the application restarts.
pub struct InMemoryCredentialStore {
    users: Mutex<HashMap<String, UserModel>>,
    revoked_tokens: Mutex<HashSet<String>>,
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCredentialStore {
    /// Creates a new empty in-memory store
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            revoked_tokens: Mutex::new(HashSet::new()),
        }
    }

    /// Creates an in-memory store with pre-populated users
    pub fn with_users(users: Vec<UserModel>) -> Self {
        let mut user_map = HashMap::new();
        for user in users {
            user_map.insert(user.id.clone(), user);
        }

        Self {
            users: Mutex::new(user_map),
            revoked_tokens: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the current number of users in the store
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Returns the current size of the revocation set
    pub fn revoked_count(&self) -> usize {
        self.revoked_tokens.lock().unwrap().len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    #[instrument(skip(self, user))]
    async fn insert_user(&self, user: &UserModel) -> Result<UserModel, AppError> {
        debug!(user_id = %user.id, username = %user.username, "Inserting user in memory");

        // Uniqueness check and insert happen under one lock, mirroring the
        // unique-index atomicity of the SQL backend.
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            warn!(username = %user.username, "Username or email already taken");
            return Err(AppError::Conflict(
                "username or email already taken".to_string(),
            ));
        }
        users.insert(user.id.clone(), user.clone());

        debug!(user_id = %user.id, "User inserted successfully in memory");
        Ok(user.clone())
    }

    #[instrument(skip(self))]
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserModel>, AppError> {
        debug!(username = %username, "Fetching user by username from memory");

        let users = self.users.lock().unwrap();
        let user = users.values().find(|u| u.username == username).cloned();

        match &user {
            Some(u) => debug!(user_id = %u.id, "User found in memory"),
            None => debug!(username = %username, "User not found in memory"),
        }

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = %id, "Fetching user by id from memory");

        let users = self.users.lock().unwrap();
        Ok(users.get(id).cloned())
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = %user.id, "Updating user in memory");

        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.id != user.id && (u.username == user.username || u.email == user.email))
        {
            warn!(user_id = %user.id, "Update collides with another user's username or email");
            return Err(AppError::Conflict(
                "username or email already taken".to_string(),
            ));
        }

        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                debug!(user_id = %user.id, "User updated successfully in memory");
                Ok(Some(user.clone()))
            }
            None => {
                debug!(user_id = %user.id, "User not found for update in memory");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: &str) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = %id, "Deleting user from memory");

        let mut users = self.users.lock().unwrap();
        let removed = users.remove(id);

        match &removed {
            Some(_) => debug!(user_id = %id, "User deleted successfully from memory"),
            None => debug!(user_id = %id, "User not found for deletion in memory"),
        }

        Ok(removed)
    }

    #[instrument(skip(self, token))]
    async fn record_revocation(&self, token: &str) -> Result<(), AppError> {
        debug!("Recording token revocation in memory");

        let mut revoked = self.revoked_tokens.lock().unwrap();
        revoked.insert(token.to_string());

        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn is_revoked(&self, token: &str) -> Result<bool, AppError> {
        let revoked = self.revoked_tokens.lock().unwrap();
        Ok(revoked.contains(token))
    }
}

/// PostgreSQL implementation of the credential store.
///
/// Expects a `users` table matching [`UserModel`] with unique indexes on
/// `username` and `email`, and a `revoked_tokens (token TEXT PRIMARY KEY,
/// revoked_at TIMESTAMPTZ)` table.
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Maps a write failure, surfacing unique-index violations as `Conflict`
    /// so callers never have to race a separate existence check.
    fn map_write_error(e: sqlx::Error) -> AppError {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("username or email already taken".to_string())
            }
            _ => AppError::Infrastructure(e.to_string()),
        }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self, user))]
    async fn insert_user(&self, user: &UserModel) -> Result<UserModel, AppError> {
        debug!(user_id = %user.id, username = %user.username, "Inserting user in database");

        let inserted = sqlx::query_as::<_, UserModel>(
            "INSERT INTO users (id, name, email, username, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, name, email, username, password_hash, created_at, updated_at",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to insert user in database");
            Self::map_write_error(e)
        })?;

        debug!(user_id = %inserted.id, "User inserted successfully in database");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserModel>, AppError> {
        debug!(username = %username, "Fetching user by username from database");

        sqlx::query_as::<_, UserModel>(
            "SELECT id, name, email, username, password_hash, created_at, updated_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, username = %username, "Failed to fetch user from database");
            AppError::Infrastructure(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn find_user_by_id(&self, id: &str) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = %id, "Fetching user by id from database");

        sqlx::query_as::<_, UserModel>(
            "SELECT id, name, email, username, password_hash, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %id, "Failed to fetch user from database");
            AppError::Infrastructure(e.to_string())
        })
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, user: &UserModel) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = %user.id, "Updating user in database");

        let updated = sqlx::query_as::<_, UserModel>(
            "UPDATE users SET name = $2, email = $3, username = $4, password_hash = $5, \
             updated_at = $6 WHERE id = $1 \
             RETURNING id, name, email, username, password_hash, created_at, updated_at",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user.id, "Failed to update user in database");
            Self::map_write_error(e)
        })?;

        match &updated {
            Some(_) => debug!(user_id = %user.id, "User updated successfully in database"),
            None => debug!(user_id = %user.id, "User not found for update in database"),
        }

        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: &str) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = %id, "Deleting user from database");

        let deleted = sqlx::query_as::<_, UserModel>(
            "DELETE FROM users WHERE id = $1 \
             RETURNING id, name, email, username, password_hash, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %id, "Failed to delete user from database");
            AppError::Infrastructure(e.to_string())
        })?;

        match &deleted {
            Some(_) => debug!(user_id = %id, "User deleted successfully from database"),
            None => debug!(user_id = %id, "User not found for deletion in database"),
        }

        Ok(deleted)
    }

    #[instrument(skip(self, token))]
    async fn record_revocation(&self, token: &str) -> Result<(), AppError> {
        debug!("Recording token revocation in database");

        // ON CONFLICT DO NOTHING keeps logout idempotent: revoking an
        // already-revoked token is a success, not an error.
        sqlx::query(
            "INSERT INTO revoked_tokens (token, revoked_at) VALUES ($1, $2) \
             ON CONFLICT (token) DO NOTHING",
        )
        .bind(token)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to record token revocation");
            AppError::Infrastructure(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn is_revoked(&self, token: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to check revocation set");
            AppError::Infrastructure(e.to_string())
        })
    }
}
