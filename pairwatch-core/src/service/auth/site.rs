use super::PasswordService;
use crate::Result;

/// Shared password guarding the whole site
#[derive(Debug, Clone)]
pub struct SiteGate {
    password_hash: String,
    passwords: PasswordService,
}

impl SiteGate {
    /// Hash the site password once so the plain text is not kept around
    pub async fn new(password: &str, passwords: PasswordService) -> Result<Self> {
        Ok(Self {
            password_hash: passwords.hash(password).await?,
            passwords,
        })
    }

    pub async fn verify(&self, password: &str) -> Result<bool> {
        self.passwords.verify(password, &self.password_hash).await
    }
}
