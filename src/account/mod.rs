// Public API - what other modules can use
pub use handlers::{delete_profile, get_profile, update_profile};
pub use types::{ProfileResponse, UpdateProfileRequest};

// Internal modules
mod handlers;
pub mod service;
pub mod types;
