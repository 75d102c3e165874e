use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{Error, Result};

/// Argon2id hasher for account passwords. Hashes are stored as PHC strings.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Hash(format!("failed to hash password: {e}")))?;
        Ok(hash.to_string())
    }

    /// Returns `Ok(false)` on a mismatch and an error only for a malformed stored hash.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        verify_phc(&self.argon2, password, hash)
    }
}

pub(super) fn verify_phc(argon2: &Argon2<'_>, raw: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| Error::Hash(format!("invalid hash format: {e}")))?;

    match argon2.verify_password(raw.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Hash(format!("failed to verify hash: {e}"))),
    }
}
