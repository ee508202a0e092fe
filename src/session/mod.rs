// Public API - what other modules can use
pub use handlers::{login, logout, register};
pub use middleware::{bearer_auth, require_token};
pub use types::{AuthResponse, BearerToken, RegisterRequest, SessionClaims, UserResponse};

// Internal modules
mod handlers;
mod middleware;
pub mod password;
pub mod service;
pub mod token;
pub mod types;
