//! Password hashing using Argon2id
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...`), so verification reads
//! the parameters back from the hash itself.
//!
//! # Example
//!
//! ```rust
//! use travel_service::config::PasswordConfig;
//! use travel_service::password::PasswordHasher;
//!
//! let hasher = PasswordHasher::new(&PasswordConfig {
//!     memory_cost_kib: 1024,
//!     time_cost: 1,
//!     parallelism: 1,
//!     min_password_length: 8,
//! })
//! .unwrap();
//!
//! let hash = hasher.hash("bismillah123").unwrap();
//! assert!(hasher.verify("bismillah123", &hash).unwrap());
//! ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

use crate::config::PasswordConfig;

/// Password hashing failure
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid Argon2 parameters: {0}")]
    Params(argon2::Error),

    #[error("password must be at least {0} characters")]
    TooShort(usize),

    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("invalid password hash format: {0}")]
    Format(argon2::password_hash::Error),
}

/// Argon2id hasher configured from [`PasswordConfig`]
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    min_password_length: usize,
}

impl PasswordHasher {
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(PasswordError::Params)?;

        Ok(Self {
            params,
            min_password_length: config.min_password_length,
        })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.chars().count() < self.min_password_length {
            return Err(PasswordError::TooShort(self.min_password_length));
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(PasswordError::Hash)
    }

    /// Verify a password against a stored hash in constant time
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(PasswordError::Format)?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Format(e)),
        }
    }

    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
}
