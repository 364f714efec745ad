use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::errors::ServiceError;

/// Argon2id password hashing with configurable cost.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Custom cost: memory in KiB, iterations, lanes.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, ServiceError> {
        let params = Params::new(m_cost, t_cost, p_cost, None).map_err(|e| ServiceError::Hash(e.to_string()))?;
        Ok(Self { argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) })
    }

    /// Hash into a PHC string with a fresh random salt.
    pub fn hash(&self, plain: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| ServiceError::Hash(e.to_string()))?
            .to_string())
    }

    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, ServiceError> {
        let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::Hash(e.to_string()))?;
        Ok(self.argon2.verify_password(plain.as_bytes(), &parsed).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_and_is_salted() {
        let hasher = PasswordHasher::with_params(8, 1, 1).unwrap();
        let a = hasher.hash("Secret123").unwrap();
        let b = hasher.hash("Secret123").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(hasher.verify("Secret123", &a).unwrap());
        assert!(!hasher.verify("secret123", &a).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(PasswordHasher::default().verify("x", "not-a-phc"), Err(ServiceError::Hash(_))));
    }
}
