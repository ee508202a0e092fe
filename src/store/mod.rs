// Public API - what other modules can use
pub use models::UserModel;
pub use repository::{CredentialStore, InMemoryCredentialStore, PostgresCredentialStore};

// Internal modules
pub mod models;
pub mod repository;
