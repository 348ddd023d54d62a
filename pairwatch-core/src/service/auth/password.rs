use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use tokio::task;

use crate::{config::PasswordHashConfig, Error, Result};

/// Argon2id hashing with configurable cost
///
/// Hashing and verification are CPU-intensive and run on a blocking thread.
#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    cost: PasswordHashConfig,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(PasswordHashConfig::default())
    }
}

impl PasswordService {
    #[must_use]
    pub const fn new(cost: PasswordHashConfig) -> Self {
        Self { cost }
    }

    fn argon2(cost: PasswordHashConfig) -> Result<Argon2<'static>> {
        let params = ParamsBuilder::new()
            .m_cost(cost.memory_kib)
            .t_cost(cost.iterations)
            .p_cost(cost.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build Argon2 params: {e}")))?;

        Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a password into a PHC string
    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.cost;

        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            let hash = Self::argon2(cost)?
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| Error::Internal(format!("Failed to hash password: {e}")))?
                .to_string();
            Ok(hash)
        })
        .await
        .map_err(|e| Error::Internal(format!("Password hashing task failed: {e}")))?
    }

    /// Verify a password against a stored PHC string
    ///
    /// The cost parameters are read from the hash itself.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();

        task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&hash)
                .map_err(|e| Error::Internal(format!("Invalid password hash format: {e}")))?;

            match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(Error::Internal(format!("Password verification failed: {e}"))),
            }
        })
        .await
        .map_err(|e| Error::Internal(format!("Password verification task failed: {e}")))?
    }
}

#[cfg(test)]
pub(crate) fn cheap_password_service() -> PasswordService {
    PasswordService::new(PasswordHashConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
}
