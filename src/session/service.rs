use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    password::PasswordHasher,
    token::TokenConfig,
    types::{AuthResponse, RegisterRequest, SessionClaims, UserResponse},
};
use crate::shared::{AppError, DeniedReason};
use crate::store::models::UserModel;
use crate::store::repository::CredentialStore;

/// The session authority: registers accounts, authenticates credentials,
/// issues tokens, and tracks revocation. Holds no state of its own beyond
/// the injected store; tokens are stateless and only the revocation set is
/// persisted.
pub struct SessionService {
    store: Arc<dyn CredentialStore + Send + Sync>,
    token_config: TokenConfig,
    hasher: PasswordHasher,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn CredentialStore + Send + Sync>,
        token_config: TokenConfig,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            store,
            token_config,
            hasher,
        }
    }

    /// Registers a new user. The store enforces username/email uniqueness
    /// atomically, so two concurrent registrations cannot both win.
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        let password_hash = self.hasher.hash(&request.password)?;
        let user = UserModel::new(request.name, request.email, request.username, password_hash);

        let stored = self.store.insert_user(&user).await?;

        info!(user_id = %stored.id, username = %stored.username, "User registered");
        Ok(stored.into())
    }

    /// Verifies a username/password pair and issues a session token.
    ///
    /// Returns `NotFound` for an unknown username and `InvalidCredentials`
    /// for a wrong password; the transport collapses the two before they
    /// reach a client.
    #[instrument(skip(self, username, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthResponse, AppError> {
        let user = match self.store.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                // Burn a hash so an unknown username costs the same as a
                // wrong password
                let _ = self.hasher.hash(password);
                debug!("Login attempt for unknown username");
                return Err(AppError::NotFound("no user with that username".to_string()));
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            warn!(user_id = %user.id, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.token_config.issue(&user.id)?;

        info!(user_id = %user.id, "Login succeeded, session token issued");
        Ok(AuthResponse {
            user: user.into(),
            token,
        })
    }

    /// Adds the token to the revocation set. Idempotent: logging out a
    /// token that is already revoked succeeds again.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.store.record_revocation(token).await?;

        info!("Session token revoked");
        Ok(())
    }

    /// Decides whether a presented token grants access, returning its claims.
    ///
    /// The checks run in a fixed order: token presence, then the revocation
    /// set, then signature/expiry. Revocation is consulted before the
    /// cryptographic check so a logged-out token stays dead even while its
    /// signature and expiry are still valid; a store failure surfaces as an
    /// infrastructure error, never as "not revoked".
    #[instrument(skip(self, token))]
    pub async fn check_access(&self, token: Option<&str>) -> Result<SessionClaims, AppError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => {
                debug!("No token presented");
                return Err(AppError::Denied(DeniedReason::MissingToken));
            }
        };

        if self.store.is_revoked(token).await? {
            warn!("Rejected revoked token");
            return Err(AppError::Denied(DeniedReason::Revoked));
        }

        match self.token_config.verify(token) {
            Ok(claims) => {
                debug!(user_id = %claims.sub, "Token verified");
                Ok(claims)
            }
            Err(kind) => {
                // The exact failure kind stays in the logs; the caller only
                // sees an opaque denial
                warn!(kind = ?kind, "Token failed verification");
                Err(AppError::Denied(DeniedReason::InvalidToken))
            }
        }
    }
}
