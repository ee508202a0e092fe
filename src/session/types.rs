use serde::{Deserialize, Serialize};

use crate::store::models::UserModel;

/// JWT claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub sub: String, // User id the token is bound to
    pub exp: usize,  // Expiration timestamp (standard JWT claim)
    pub iat: usize,  // Issued at timestamp (standard JWT claim)
}

/// Raw bearer token pulled from the Authorization header, passed to handlers
/// that need the token string itself rather than its claims (logout).
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Request payload for registering a new user
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Request payload for logging in
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// A user as exposed over the API. Deliberately has no password hash field,
/// so the hash cannot leak through any response path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            username: user.username,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response for a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Response for a successful logout
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_has_no_password_hash() {
        let user = UserModel::new(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "alice".to_string(),
            "$2b$12$super-secret-digest".to_string(),
        );

        let response = UserResponse::from(user);
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("alice@example.com"));
        assert!(!json.contains("password"));
        assert!(!json.contains("super-secret-digest"));
    }

    #[test]
    fn test_session_claims_serialization() {
        let claims = SessionClaims {
            sub: "user-id".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("user-id"));

        let deserialized: SessionClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }
}
