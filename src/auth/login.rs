use tracing::{info, instrument, warn};

use crate::auth::{
    error::AuthError,
    repo_types::{PublicUser, User},
    services::CredentialStore,
    validate::{validate, LOGIN_RULES},
};

/// Maps a submitted `(email, password)` pair to an authentication outcome.
///
/// "No such user" and "wrong password" are reported as different errors. That lets a
/// caller probe which emails are registered; see DESIGN.md before unifying them.
#[derive(Clone)]
pub struct LoginVerifier {
    store: CredentialStore,
}

impl LoginVerifier {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    /// Checks the credentials without any write.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        validate(LOGIN_RULES, &[("email", email), ("password", password)])?;

        let Some(user) = self.store.find_by_email(email).await? else {
            warn!(email = %email.trim(), "login unknown email");
            return Err(AuthError::UserNotFound);
        };

        let ok = self
            .store
            .hasher()
            .verify_blocking(password.to_owned(), user.password_hash.clone())
            .await?;
        if !ok {
            warn!(user_id = %user.id(), "login invalid password");
            return Err(AuthError::PasswordMismatch);
        }
        Ok(user)
    }

    /// Full login: on success `last_login` moves forward and the sanitized record is
    /// returned. Nothing is written on any failure path.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<PublicUser, AuthError> {
        let user = self.authenticate(email, password).await?;
        if !user.is_active {
            warn!(user_id = %user.id(), "login on disabled account");
            return Err(AuthError::AccountDisabled);
        }
        let user = self.store.record_login(&user).await?;
        info!(user_id = %user.id(), name = %user.name(), "user logged in");
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        repo::UserRepo,
        services::tests::{account, memory_store},
    };

    async fn verifier_with(email: &str, password: &str) -> (LoginVerifier, CredentialStore) {
        let store = memory_store(false);
        store.create(account(email, password)).await.unwrap();
        (LoginVerifier::new(store.clone()), store)
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_lookup() {
        let (verifier, _) = verifier_with("ada@example.com", "password-1").await;
        for (email, password) in [
            ("", "password-1"),
            ("not-an-email", "password-1"),
            ("ada@example.com", ""),
        ] {
            let err = verifier.login(email, password).await.unwrap_err();
            assert!(matches!(err, AuthError::InputInvalid(_)), "{email:?}/{password:?}");
        }
    }

    #[tokio::test]
    async fn unknown_email_is_user_not_found() {
        let (verifier, _) = verifier_with("ada@example.com", "password-1").await;
        let err = verifier.login("missing@x.com", "anything").await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn wrong_password_leaves_last_login_untouched() {
        let (verifier, store) = verifier_with("ada@example.com", "password-1").await;
        verifier.login("ada@example.com", "password-1").await.unwrap();
        let before = store
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap()
            .last_login;

        let err = verifier.login("ada@example.com", "password-2").await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));

        let after = store
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap()
            .last_login;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn success_moves_last_login_forward() {
        let (verifier, store) = verifier_with("ada@example.com", "password-1").await;
        let initial = store
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(initial.last_login.is_none());

        let first = verifier.login("ada@example.com", "password-1").await.unwrap();
        let first_at = first.last_login.expect("set on login");
        assert_eq!(first.email, "ada@example.com");

        let second = verifier.login("ADA@example.com ", "password-1").await.unwrap();
        assert!(second.last_login.expect("set on login") >= first_at);
    }

    #[tokio::test]
    async fn disabled_account_cannot_log_in() {
        let (verifier, store) = verifier_with("ada@example.com", "password-1").await;
        let user = store.find_by_email("ada@example.com").await.unwrap().unwrap();
        store.set_active(&user, false).await.unwrap();

        let err = verifier.login("ada@example.com", "password-1").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountDisabled));
        let user = store.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert!(user.last_login.is_none());
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_a_hashing_failure() {
        let (verifier, store) = verifier_with("ada@example.com", "password-1").await;
        let user = store.find_by_email("ada@example.com").await.unwrap().unwrap();
        // Write a broken hash straight through the repo port.
        store
            .repo_for_tests()
            .set_password_hash(user.id(), "garbage")
            .await
            .unwrap();

        let err = verifier.login("ada@example.com", "password-1").await.unwrap_err();
        assert!(matches!(err, AuthError::Hashing(_)));
    }

    #[tokio::test]
    async fn authenticate_does_not_write() {
        let (verifier, store) = verifier_with("ada@example.com", "password-1").await;
        let user = verifier
            .authenticate("ada@example.com", "password-1")
            .await
            .unwrap();
        assert!(user.last_login.is_none());
        let stored = store.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert!(stored.last_login.is_none());
    }
}
