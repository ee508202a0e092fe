use serde::{Deserialize, Serialize};

use crate::store::models::UserModel;

/// Response for a profile read: the caller's own public record
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProfileResponse {
    pub name: String,
    pub email: String,
    pub username: String,
}

impl From<UserModel> for ProfileResponse {
    fn from(user: UserModel) -> Self {
        Self {
            name: user.name,
            email: user.email,
            username: user.username,
        }
    }
}

/// Request payload for a partial profile update. Omitted or empty fields
/// keep their current values; a supplied password is re-hashed.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
