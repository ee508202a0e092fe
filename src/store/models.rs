use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new user model with a generated ID and fresh timestamps.
    /// The caller supplies an already-hashed password, never the plaintext.
    pub fn new(name: String, email: String, username: String, password_hash: String) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            username,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}
