use tracing::debug;

use crate::shared::AppError;

/// Lowest work factor the hasher will accept
const MIN_COST: u32 = 10;
/// Default bcrypt work factor
const DEFAULT_COST: u32 = 12;

/// One-way salted password hashing with a configurable bcrypt work factor
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new() -> Self {
        // Allow configuring the work factor via env var, default to 12
        let cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_COST);

        Self::with_cost(cost)
    }

    /// Creates a hasher with an explicit work factor, clamped to the range
    /// bcrypt supports and never below the configured floor.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, 31),
        }
    }

    /// Hashes a plaintext password with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| {
            debug!(error = %e, "Password hashing failed");
            AppError::Infrastructure(format!("password hashing failed: {e}"))
        })
    }

    /// Verifies a plaintext password against a stored digest. A malformed
    /// digest verifies as `false`, never as an error.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::with_cost(MIN_COST);
        let digest = hasher.hash("pw123").unwrap();

        assert_ne!(digest, "pw123");
        assert!(digest.starts_with("$2"));
        assert!(hasher.verify("pw123", &digest));
        assert!(!hasher.verify("wrong", &digest));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let hasher = PasswordHasher::with_cost(MIN_COST);

        // Random salts: two hashes of the same input must differ
        let a = hasher.hash("pw123").unwrap();
        let b = hasher.hash("pw123").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("pw123", &a));
        assert!(hasher.verify("pw123", &b));
    }

    #[test]
    fn test_malformed_digest_verifies_false() {
        let hasher = PasswordHasher::with_cost(MIN_COST);

        assert!(!hasher.verify("pw123", "not-a-bcrypt-digest"));
        assert!(!hasher.verify("pw123", ""));
    }

    #[test]
    fn test_cost_is_clamped_to_floor() {
        let hasher = PasswordHasher::with_cost(4);
        assert_eq!(hasher.cost, MIN_COST);

        let hasher = PasswordHasher::with_cost(99);
        assert_eq!(hasher.cost, 31);
    }
}
