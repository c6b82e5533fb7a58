use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info, instrument};

use crate::auth::{
    error::AuthError,
    password::Hasher,
    repo::UserRepo,
    repo_types::{NewUser, User},
    validate::is_valid_email,
};

/// How emails are compared and stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailPolicy {
    pub case_sensitive: bool,
}

impl EmailPolicy {
    pub fn normalize(&self, email: &str) -> String {
        let trimmed = email.trim();
        if self.case_sensitive {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        }
    }
}

/// Registration input. Dropped as soon as the password has been hashed.
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub second_name: String,
}

/// Owns email → user records and guarantees passwords are only ever stored hashed.
#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn UserRepo>,
    hasher: Hasher,
    policy: EmailPolicy,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn UserRepo>, hasher: Hasher, policy: EmailPolicy) -> Self {
        Self {
            repo,
            hasher,
            policy,
        }
    }

    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    #[cfg(test)]
    pub(crate) fn repo_for_tests(&self) -> &Arc<dyn UserRepo> {
        &self.repo
    }

    /// A miss is `Ok(None)`, never an error.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let email = self.policy.normalize(email);
        Ok(self.repo.find_by_email(&email).await?)
    }

    #[instrument(skip_all)]
    pub async fn create(&self, account: NewAccount) -> Result<User, AuthError> {
        let NewAccount {
            email,
            password,
            first_name,
            second_name,
        } = account;
        let email = self.policy.normalize(&email);
        if !is_valid_email(&email) {
            return Err(AuthError::InputInvalid("Not valid email"));
        }
        if self.repo.find_by_email(&email).await?.is_some() {
            debug!(email = %email, "email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash_blocking(password).await?;
        let user = self
            .repo
            .insert(NewUser {
                email,
                password_hash,
                first_name: first_name.trim().to_string(),
                second_name: second_name.trim().to_string(),
            })
            .await?;
        info!(user_id = %user.id(), email = %user.email, "user created");
        Ok(user)
    }

    #[instrument(skip_all, fields(user_id = %user.id()))]
    pub async fn update_password(&self, user: &User, new_password: String) -> Result<User, AuthError> {
        let password_hash = self.hasher.hash_blocking(new_password).await?;
        let updated = self.repo.set_password_hash(user.id(), &password_hash).await?;
        info!("password updated");
        Ok(updated)
    }

    pub async fn record_login(&self, user: &User) -> Result<User, AuthError> {
        self.repo
            .record_login(user.id(), OffsetDateTime::now_utc())
            .await
    }

    #[instrument(skip_all, fields(user_id = %user.id(), active = active))]
    pub async fn set_active(&self, user: &User, active: bool) -> Result<User, AuthError> {
        let updated = self.repo.set_active(user.id(), active).await?;
        info!("account activity changed");
        Ok(updated)
    }
}
