// Library crate for the gatehouse credential service
// This file exposes the public API for integration tests

pub mod account;
pub mod routes;
pub mod session;
pub mod shared;
pub mod store;

// Re-export commonly used types for easier access in tests
pub use session::{AuthResponse, RegisterRequest, SessionClaims, UserResponse};
pub use shared::{AppError, AppState, DeniedReason};
pub use store::{CredentialStore, InMemoryCredentialStore, PostgresCredentialStore, UserModel};
