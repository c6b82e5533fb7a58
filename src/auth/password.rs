use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::{auth::error::AuthError, config::HashConfig};

/// Argon2id hash/compare primitive with a configurable cost.
///
/// `hash` always draws a fresh salt from the OS RNG. `verify` reads algorithm, cost and
/// salt back out of the PHC string, so hashes written under an older cost still verify.
/// The digest comparison inside `verify_password` is constant-time.
#[derive(Debug, Clone)]
pub struct Hasher {
    params: Params,
}

impl Hasher {
    pub fn new(cfg: HashConfig) -> Result<Self, AuthError> {
        let params = Params::new(cfg.m_cost, cfg.t_cost, cfg.p_cost, None).map_err(|e| {
            error!(error = %e, "invalid argon2 params");
            AuthError::Hashing(e.to_string())
        })?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AuthError::Hashing(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// `Ok(false)` on a wrong password; `Err` only when the stored hash itself is unusable.
    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            AuthError::Hashing(e.to_string())
        })?;
        match self.argon2().verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(AuthError::Hashing(e.to_string()))
            }
        }
    }

    /// Runs [`Hasher::hash`] on the blocking pool so it never stalls the async workers.
    pub async fn hash_blocking(&self, plain: String) -> Result<String, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    pub async fn verify_blocking(&self, plain: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }
}

/// Cheap parameters so tests do not spend seconds inside Argon2.
#[cfg(test)]
pub(crate) fn test_hasher() -> Hasher {
    Hasher::new(HashConfig {
        m_cost: 1024,
        t_cost: 1,
        p_cost: 1,
    })
    .expect("test params are valid")
}
